//! Cancel, suspend and resume for an in-flight request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::NwError;

/// Desired state of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlState {
    /// Running, or allowed to run.
    #[default]
    Resumed,
    /// Paused between body chunks, or held back before sending.
    Suspended,
    /// Aborted. Terminal.
    Cancelled,
}

/// Handle for steering a request from outside the call that performs it.
///
/// Calls made before the transfer exists are recorded and take effect as
/// soon as it starts: a request cancelled early never reaches the network,
/// and one suspended early waits for [`RequestControl::resume`].
#[derive(Debug, Clone)]
pub struct RequestControl {
    state: Arc<watch::Sender<ControlState>>,
    attached: Arc<AtomicBool>,
}

impl RequestControl {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ControlState::Resumed);
        Self {
            state: Arc::new(sender),
            attached: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Abort the request.
    pub fn cancel(&self) {
        self.set(ControlState::Cancelled);
    }

    /// Pause the request.
    pub fn suspend(&self) {
        self.set(ControlState::Suspended);
    }

    /// Continue a suspended request.
    pub fn resume(&self) {
        self.set(ControlState::Resumed);
    }

    /// The current desired state.
    pub fn state(&self) -> ControlState {
        *self.state.borrow()
    }

    /// Whether a transfer has picked this handle up.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn set(&self, desired: ControlState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == ControlState::Cancelled || *state == desired {
                return false;
            }
            *state = desired;
            true
        });
        if changed {
            tracing::trace!(state = ?desired, attached = self.is_attached(), "request control changed");
        }
    }

    /// Called by the transfer once it exists.
    pub(crate) fn attach(&self) -> ControlWatcher {
        self.attached.store(true, Ordering::SeqCst);
        ControlWatcher {
            receiver: self.state.subscribe(),
        }
    }
}

impl Default for RequestControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Transfer-side view of a [`RequestControl`].
pub(crate) struct ControlWatcher {
    receiver: watch::Receiver<ControlState>,
}

impl ControlWatcher {
    /// Return once the request may proceed; wait while suspended.
    pub(crate) async fn checkpoint(&mut self) -> Result<(), NwError> {
        loop {
            let state = *self.receiver.borrow_and_update();
            match state {
                ControlState::Resumed => return Ok(()),
                ControlState::Cancelled => return Err(NwError::cancelled()),
                ControlState::Suspended => {
                    if self.receiver.changed().await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Resolve once the request is cancelled; never resolves otherwise.
    pub(crate) async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() == ControlState::Cancelled {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
