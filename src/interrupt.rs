//! Ctrl+C handling
//!
//! The handler only raises a flag. Runners check it between steps, so an
//! interrupted run still unmounts and removes its scratch space.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::error::{HarnessError, Result};

/// Shared interruption flag
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    /// A flag that is only raised by `trigger`
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the process-wide Ctrl+C handler and return its flag
    pub fn install() -> Result<Self> {
        let interrupt = Self::new();
        let flag = interrupt.flag.clone();
        ctrlc::set_handler(move || {
            info!("Received interrupt, stopping after the current step");
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(|e| HarnessError::InvalidArgument(format!("cannot install signal handler: {}", e)))?;
        Ok(interrupt)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once the flag is raised
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            Err(HarnessError::Interrupted)
        } else {
            Ok(())
        }
    }
}
