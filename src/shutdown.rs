use tokio::sync::watch;
use tracing::{info, warn};

/// Ctrl-C handling for a running operation.
///
/// The coordinator owns the sending side; the orchestrator holds a
/// `ShutdownSignal` and races it against the operation it dispatches.
pub struct ShutdownCoordinator {
    sender: watch::Sender<bool>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Request shutdown; every outstanding signal resolves
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Install a SIGINT handler that triggers shutdown. Must be called inside a runtime.
    pub fn install_signal_handlers(self) -> ShutdownSignal {
        let signal = self.signal();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    self.trigger();
                }
                Err(err) => warn!("Failed to listen for Ctrl-C: {}", err),
            }
        });
        signal
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    /// Resolves once shutdown has been requested. Pends forever if the
    /// coordinator was dropped without triggering.
    pub async fn triggered(&mut self) {
        if self.receiver.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
