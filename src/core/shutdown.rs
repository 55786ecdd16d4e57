//! Shutdown Coordination
//!
//! A shared "shutdown requested" flag plus a broadcast channel, and a
//! signal watcher that turns SIGINT/SIGTERM into a shutdown request.
//!
//! Signals are observed on a dedicated thread running a small tokio runtime,
//! so the reaction to a signal (removing the input queue, waking the listen
//! loop) runs as ordinary code rather than inside an async signal handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::broadcast;

/// Progress of a shutdown, as broadcast to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownEvent {
    /// Shutdown was requested; buffered work is still draining
    Requested,
    /// Draining finished; nothing is left to force
    Completed,
}

/// Coordinates shutdown across the listen loop, the workers and the signal watcher
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<ShutdownEvent>,
    shutdown_requested: Arc<AtomicBool>,
    shutdown_completed: Arc<AtomicBool>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        // Each coordinator broadcasts at most two events
        let (shutdown_tx, _) = broadcast::channel(4);

        Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            shutdown_completed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to shutdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownEvent> {
        self.shutdown_tx.subscribe()
    }

    /// Request shutdown
    ///
    /// Returns `true` for the call that actually flipped the flag, so callers
    /// can run once-only teardown. Only that call broadcasts.
    pub fn trigger_shutdown(&self) -> bool {
        let first = !self.shutdown_requested.swap(true, Ordering::AcqRel);
        if first {
            let _ = self.shutdown_tx.send(ShutdownEvent::Requested);
        }
        first
    }

    /// Mark the shutdown as finished, which stops the signal watcher
    pub fn complete(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        if !self.shutdown_completed.swap(true, Ordering::AcqRel) {
            let _ = self.shutdown_tx.send(ShutdownEvent::Completed);
        }
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    pub fn is_completed(&self) -> bool {
        self.shutdown_completed.load(Ordering::Acquire)
    }

    /// Watch SIGINT and SIGTERM on a dedicated thread
    ///
    /// The first signal triggers shutdown and then runs `on_shutdown`, unless
    /// shutdown was already requested some other way. A signal arriving while
    /// shutdown is requested but not yet [`complete`](Self::complete) forces
    /// the process to exit with 130. The thread returns once the shutdown is
    /// complete, so a later manager in the same process owns the signals.
    ///
    /// Signal handlers and the event subscription are registered before this
    /// function returns, so nothing delivered afterwards is missed.
    pub fn spawn_signal_watcher<F>(&self, on_shutdown: F) -> std::io::Result<JoinHandle<()>>
    where
        F: Fn() + Send + 'static,
    {
        use tokio::signal::unix::{signal, SignalKind};

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (mut sigint, mut sigterm) = {
            let _guard = runtime.enter();
            (
                signal(SignalKind::interrupt())?,
                signal(SignalKind::terminate())?,
            )
        };

        let mut events = self.subscribe();
        let coordinator = self.clone();

        std::thread::Builder::new()
            .name("signal-watcher".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    while !coordinator.is_completed() {
                        let name = tokio::select! {
                            // Completion wins over a signal that raced with it
                            biased;

                            event = events.recv() => match event {
                                Ok(ShutdownEvent::Requested)
                                | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                                Ok(ShutdownEvent::Completed)
                                | Err(broadcast::error::RecvError::Closed) => break,
                            },
                            received = sigint.recv() => received.map(|_| "SIGINT"),
                            received = sigterm.recv() => received.map(|_| "SIGTERM"),
                        };
                        let Some(name) = name else {
                            log::debug!("Signal streams closed, watcher exiting");
                            return;
                        };

                        if coordinator.trigger_shutdown() {
                            log::info!("Caught {}, shutting down", name);
                            on_shutdown();
                        } else if !coordinator.is_completed() {
                            log::warn!("Caught {} during shutdown; exiting", name);
                            std::process::exit(130);
                        }
                    }
                    log::debug!("Shutdown complete, signal watcher exiting");
                });
            })
    }
}
