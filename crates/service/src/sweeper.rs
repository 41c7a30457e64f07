//! Background expiry of unused derived sources.

use crate::service::ViewService;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::io;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// A thread that calls [`ViewService::sweep`] every configured interval.
///
/// The thread holds only a weak reference to the service and exits once
/// the service is dropped. Dropping the sweeper stops it without joining.
pub struct Sweeper {
    stop: Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Starts sweeping `service` on a thread named `vista-sweeper`.
    pub fn spawn<T: Send + Sync + 'static>(service: &Arc<ViewService<T>>) -> io::Result<Self> {
        let interval = service.config().sweep_interval();
        let service: Weak<ViewService<T>> = Arc::downgrade(service);
        let (stop, signal) = bounded::<()>(1);

        let handle = thread::Builder::new().name("vista-sweeper".into()).spawn(move || {
            loop {
                match signal.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(service) = service.upgrade() else {
                            break;
                        };
                        let destroyed = service.sweep();
                        if destroyed > 0 {
                            debug!(target: "vista_service::sweeper", destroyed, "swept derived sources");
                        } else {
                            trace!(target: "vista_service::sweeper", "nothing to sweep");
                        }
                    }
                    // Stop requested or sweeper dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!(target: "vista_service::sweeper", "sweeper stopped");
        })?;

        Ok(Self {
            stop,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Requests the thread to stop. Idempotent.
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }

    /// Stops the thread and waits for it. Returns false if it panicked or
    /// was already joined.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        match self.handle.lock().take() {
            Some(handle) => handle.join().is_ok(),
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("running", &self.is_running())
            .finish()
    }
}
