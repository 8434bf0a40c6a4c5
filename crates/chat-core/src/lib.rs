pub mod ports;
pub mod ids;
pub mod event_bus;
pub mod store;
pub mod merge;
pub mod repository;
pub mod submit;
