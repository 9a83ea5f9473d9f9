//! Cooperative cancellation
//!
//! The crawl loop does not rely on asynchronous signal delivery.
//! Instead it checks an explicit token between page fetches; on
//! cancellation it performs the ordered shutdown sequence (stop
//! probing, flush, final checkpoint save, release the probe).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag checked between probes
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; idempotent
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Cancels the token on the first interrupt signal.
///
/// Spawned once per process; subsequent signals are left to the
/// default handler so a stuck shutdown can still be killed.
pub fn cancel_on_ctrl_c(token: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current page and saving checkpoint");
            token.cancel();
        }
    });
}
