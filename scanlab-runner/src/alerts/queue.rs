//! Bounded alert queue in front of a slow sink.
//!
//! The scan loop hands alerts to the queue and moves on; a dedicated thread
//! drains the channel into the wrapped sink. When the queue is full `deliver`
//! blocks until the dispatcher catches up.

use crossbeam_channel::{bounded, Sender};
use scanlab_core::alert::{Alert, AlertError, AlertSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error};

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
}

pub struct QueuedAlertSink {
    name: String,
    sender: Mutex<Option<Sender<Alert>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl QueuedAlertSink {
    /// Spawn the dispatcher thread draining into `inner`.
    pub fn spawn(inner: Box<dyn AlertSink>, capacity: usize) -> std::io::Result<Self> {
        let (tx, rx) = bounded::<Alert>(capacity.max(1));
        let counters = Arc::new(Counters::default());
        let name = format!("queued({})", inner.name());

        let worker_counters = Arc::clone(&counters);
        let worker = std::thread::Builder::new()
            .name("alert-dispatch".into())
            .spawn(move || {
                for alert in rx.iter() {
                    let symbol = alert.symbol.clone();
                    match inner.deliver(alert) {
                        Ok(()) => {
                            worker_counters.delivered.fetch_add(1, Ordering::Relaxed);
                            debug!(symbol = %symbol, sink = inner.name(), "alert delivered");
                        }
                        Err(e) => {
                            worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                            error!(symbol = %symbol, sink = inner.name(), error = %e, "alert delivery failed");
                        }
                    }
                }
                debug!("alert dispatcher stopped");
            })?;

        Ok(Self {
            name,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            counters,
        })
    }

    pub fn delivered(&self) -> u64 {
        self.counters.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for pending alerts to drain. Idempotent.
    pub fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = worker {
            if handle.join().is_err() {
                error!("alert dispatcher panicked");
            }
        }
    }
}

impl AlertSink for QueuedAlertSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, alert: Alert) -> Result<(), AlertError> {
        let sender = match self.sender.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let sender = sender.ok_or(AlertError::Disconnected)?;
        sender.send(alert).map_err(|_| AlertError::Disconnected)
    }
}

impl Drop for QueuedAlertSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}
