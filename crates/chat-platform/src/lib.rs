//! Browser adapters for the chat-core ports.
//!
//! Everything here touches `web_sys`, `gloo` or the JS event loop; the
//! logic they serve lives in `chat-core`.

pub mod storage;
pub mod gateway;
pub mod refresh;

pub use gateway::HttpGateway;
pub use refresh::RefreshTask;
