//! Periodic background `load_all`.
//!
//! One load runs immediately, then one per interval tick on the JS event
//! loop. A tick is skipped while a load is still awaiting the backend.
//! Dropping the task or calling `cancel()` stops the timer; a load
//! already awaiting the backend still completes.

use std::rc::Rc;

use gloo_timers::callback::Interval;

use chat_core::ports::GatewayPort;
use chat_core::repository::ConversationRepository;

/// `setInterval` takes a signed 32-bit delay; larger values wrap.
pub const MAX_PERIOD_MILLIS: u32 = i32::MAX as u32;

/// Timer period for a refresh interval in seconds, clamped to what
/// `setInterval` accepts.
pub fn period_millis(interval_secs: u32) -> u32 {
    interval_secs.saturating_mul(1000).min(MAX_PERIOD_MILLIS)
}

pub struct RefreshTask {
    interval: Option<Interval>,
}

impl RefreshTask {
    /// `on_done` runs after every load, with its success flag. An
    /// `interval_secs` of zero performs only the immediate load.
    pub fn start(
        repository: ConversationRepository,
        gateway: Rc<dyn GatewayPort>,
        interval_secs: u32,
        on_done: Rc<dyn Fn(bool)>,
    ) -> Self {
        if interval_secs > 0 {
            log::info!("Refreshing conversations every {}s", interval_secs);
        }
        Self::with_period(repository, gateway, period_millis(interval_secs), on_done)
    }

    /// Like `start`, with the period given in milliseconds.
    pub fn with_period(
        repository: ConversationRepository,
        gateway: Rc<dyn GatewayPort>,
        period_ms: u32,
        on_done: Rc<dyn Fn(bool)>,
    ) -> Self {
        spawn_load(repository.clone(), gateway.clone(), on_done.clone());

        let interval = (period_ms > 0).then(|| {
            Interval::new(period_ms.min(MAX_PERIOD_MILLIS), move || {
                spawn_load(repository.clone(), gateway.clone(), on_done.clone());
            })
        });

        Self { interval }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn cancel(&mut self) {
        // Dropping an Interval clears it
        if self.interval.take().is_some() {
            log::info!("Conversation refresh stopped");
        }
    }
}

fn spawn_load(
    repository: ConversationRepository,
    gateway: Rc<dyn GatewayPort>,
    on_done: Rc<dyn Fn(bool)>,
) {
    wasm_bindgen_futures::spawn_local(async move {
        if repository.is_loading() {
            log::debug!("Skipping refresh, a load is already in flight");
            return;
        }
        let ok = repository.load_all(gateway.as_ref()).await;
        on_done(ok);
    });
}
