use std::sync::atomic::{AtomicBool, Ordering};

pub const LICENSING_NOTICE: &str = "[Velocity BPA Licensing Notice] \
This PlanetScale connector is licensed under the Business Source License 1.1 (BSL 1.1). \
Use by for-profit organizations in production environments requires a commercial license \
from Velocity BPA. For licensing information, visit https://velobpa.com/licensing \
or contact licensing@velobpa.com.";

/// A message that is logged at most once for the lifetime of its owner.
#[derive(Debug)]
pub struct NoticeOnce {
    message: &'static str,
    emitted: AtomicBool,
}

impl NoticeOnce {
    pub const fn new(message: &'static str) -> Self {
        Self {
            message,
            emitted: AtomicBool::new(false),
        }
    }

    pub fn licensing() -> Self {
        Self::new(LICENSING_NOTICE)
    }

    /// Logs the message on the first call. Returns whether this call emitted it.
    pub fn emit(&self) -> bool {
        if self.emitted.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::warn!(notice = %self.message, "Licensing notice");
        true
    }

    pub fn was_emitted(&self) -> bool {
        self.emitted.load(Ordering::Acquire)
    }
}
