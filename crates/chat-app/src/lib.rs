//! Chat App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the platform adapters and exposes them to the JavaScript
//! host as a single `ChatClient` class.

mod client;
mod notify;

#[cfg(test)]
mod tests;

pub use client::ChatClient;

use wasm_bindgen::prelude::*;

/// WASM entry point: runs once when the module is instantiated
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Chat client WASM starting...");
}
