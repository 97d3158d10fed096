//! Fail-fast error reporting shared by all pipeline stages.
//!
//! The first stage to fail trips the flag and deposits its error in a
//! single-slot channel that the orchestrator waits on. Later failures are
//! logged and dropped. Stages poll [`FailFast::is_tripped`] before each unit
//! of work so that no new file is hashed or deleted once a failure is known.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};

use super::PipelineError;

/// First-error-wins failure signal.
#[derive(Debug)]
pub struct FailFast {
    tripped: AtomicBool,
    sender: Sender<PipelineError>,
    receiver: Receiver<PipelineError>,
}

impl Default for FailFast {
    fn default() -> Self {
        Self::new()
    }
}

impl FailFast {
    /// Create an untripped signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1);
        Self {
            tripped: AtomicBool::new(false),
            sender,
            receiver,
        }
    }

    /// Report a fatal error.
    ///
    /// Returns `true` if this was the first report. Only the first error is
    /// kept; it is always queued right after the flag flips.
    pub fn signal(&self, error: PipelineError) -> bool {
        if self.tripped.swap(true, Ordering::SeqCst) {
            log::debug!("Dropping error after pipeline already failed: {}", error);
            return false;
        }
        log::info!("Stopping all stages after {} failure: {}", error.category(), error);
        // The slot is empty: only the first caller ever sends.
        if let Err(e) = self.sender.try_send(error) {
            log::debug!("Failure slot unavailable: {}", e.into_inner());
        }
        true
    }

    /// Whether a failure has been reported.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Receiving end of the error slot, for `select!`.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<PipelineError> {
        &self.receiver
    }

    /// Block until the reported error is available.
    ///
    /// Returns [`PipelineError::Aborted`] right away if nothing was reported.
    /// Once tripped, the error is queued by the same call that flipped the
    /// flag, so this returns as soon as that call completes. Must not be used
    /// after the error was taken through [`receiver`](Self::receiver).
    pub fn wait(&self) -> PipelineError {
        match self.receiver.try_recv() {
            Ok(error) => error,
            Err(_) if self.is_tripped() => {
                self.receiver.recv().unwrap_or(PipelineError::Aborted)
            }
            Err(_) => PipelineError::Aborted,
        }
    }
}
