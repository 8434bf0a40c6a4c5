//! Pick the storage backend named by the config.
//!
//! Priority for `Auto`: localStorage → Memory (fallback)

use std::rc::Rc;

use chat_core::ports::StoragePort;
use chat_types::config::StorageBackendType;

use super::{LocalStorage, MemoryStorage};

/// Returns a trait object so callers are backend-agnostic. Never fails:
/// an unavailable localStorage degrades to memory with a warning.
pub fn auto_detect_storage(backend: &StorageBackendType) -> Rc<dyn StoragePort> {
    if *backend == StorageBackendType::Memory {
        log::info!("Storage backend: memory (configured)");
        return Rc::new(MemoryStorage::new());
    }

    match LocalStorage::open() {
        Ok(local) => {
            log::info!("Storage backend: localStorage");
            Rc::new(local)
        }
        Err(e) => {
            log::warn!("localStorage unavailable ({}), falling back to memory", e);
            Rc::new(MemoryStorage::new())
        }
    }
}
