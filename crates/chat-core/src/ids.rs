//! Local identifiers for conversations and messages created before the
//! backend assigns its own.
//!
//! With entropy available an id is `[prefix-]{unix_millis}-{random}-{seq}`.
//! Without it (pre-render, non-interactive contexts) ids fall back to
//! `{prefix}-{n}` with one counter per prefix. Randomness is drawn on every
//! call; the first failure switches the generator to counters for good.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use chrono::Utc;
use uuid::Builder;

const FALLBACK_PREFIX: &str = "temp";
const RANDOM_LEN: usize = 8;

/// Fills the buffer with random bytes, or fails when the host has none.
pub type RandomSource = fn(&mut [u8]) -> Result<(), getrandom::Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entropy {
    Available,
    Unavailable,
}

pub struct IdGenerator {
    source: RandomSource,
    entropy: Cell<Entropy>,
    sequence: Cell<u64>,
    counters: RefCell<HashMap<String, u64>>,
}

impl IdGenerator {
    /// Generator backed by the platform's random source (`crypto` in the
    /// browser).
    pub fn new() -> Self {
        Self::with_source(getrandom::getrandom)
    }

    pub fn with_source(source: RandomSource) -> Self {
        Self {
            source,
            entropy: Cell::new(Entropy::Available),
            sequence: Cell::new(0),
            counters: RefCell::new(HashMap::new()),
        }
    }

    /// Counter-only generator, for contexts known to lack a random source.
    pub fn deterministic() -> Self {
        let ids = Self::new();
        ids.entropy.set(Entropy::Unavailable);
        ids
    }

    pub fn entropy(&self) -> Entropy {
        self.entropy.get()
    }

    pub fn new_id(&self, prefix: Option<&str>) -> String {
        if self.entropy.get() == Entropy::Available {
            match self.random_part() {
                Some(random) => {
                    let seq = self.sequence.get() + 1;
                    self.sequence.set(seq);
                    let body = format!("{}-{}-{:x}", Utc::now().timestamp_millis(), random, seq);
                    return match prefix {
                        Some(p) => format!("{}-{}", p, body),
                        None => body,
                    };
                }
                None => self.entropy.set(Entropy::Unavailable),
            }
        }

        let prefix = prefix.unwrap_or(FALLBACK_PREFIX);
        let mut counters = self.counters.borrow_mut();
        let n = counters.entry(prefix.to_string()).or_insert(0);
        *n += 1;
        format!("{}-{}", prefix, n)
    }

    fn random_part(&self) -> Option<String> {
        let mut bytes = [0u8; 16];
        if let Err(e) = (self.source)(&mut bytes) {
            log::warn!("No random source ({}), falling back to counter ids", e);
            return None;
        }
        let random = Builder::from_random_bytes(bytes).into_uuid().simple().to_string();
        Some(random[..RANDOM_LEN].to_string())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
