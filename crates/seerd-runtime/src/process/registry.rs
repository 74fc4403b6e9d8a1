//! Process registry: the multiplexer of supervised processes.
//!
//! The table maps a logical name to a slot holding the process behind its
//! own async mutex, plus a lock-free handle to its status. Lifecycle commands
//! for one name are serialized by that mutex; commands for different names
//! never wait on each other. The table lock itself is only held for
//! insert/remove/lookup, never across an await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use async_trait::async_trait;
use futures_util::future::join_all;
use seerd_core::{ProcessRecord, ProcessSpec, ProcessState, ProcessSupervisor, SupervisorError};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::broadcaster::StatusBroadcaster;
use super::monitor::RestartRequest;
use super::status::StatusCell;
use super::supervised::{SupervisedProcess, SupervisorOptions};

/// One table entry.
struct ProcessSlot {
    /// Registration order, used to sort bulk queries.
    seq: u64,
    status: Arc<StatusCell>,
    process: Arc<Mutex<SupervisedProcess>>,
    /// Set under the process lock once the slot has been stopped and removed.
    /// A command that was waiting on the lock sees it and treats the name as absent.
    retired: AtomicBool,
}

impl ProcessSlot {
    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

struct RegistryInner {
    table: RwLock<HashMap<String, Arc<ProcessSlot>>>,
    next_seq: AtomicU64,
    events: Arc<StatusBroadcaster>,
    options: SupervisorOptions,
    restart_tx: mpsc::UnboundedSender<RestartRequest>,
    closed: AtomicBool,
}

impl RegistryInner {
    fn read_table(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ProcessSlot>>> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ProcessSlot>>> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, name: &str) -> Option<Arc<ProcessSlot>> {
        self.read_table().get(name).cloned()
    }

    /// Remove `slot` if it is still the entry for `name`.
    fn remove_slot(&self, name: &str, slot: &Arc<ProcessSlot>) {
        let mut table = self.write_table();
        if table.get(name).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            table.remove(name);
        }
    }
}

/// Registry of supervised processes keyed by logical name.
///
/// Must be created inside a Tokio runtime: it spawns the auto-restart
/// dispatcher on construction.
pub struct ProcessRegistry {
    inner: Arc<RegistryInner>,
    dispatcher: JoinHandle<()>,
}

impl ProcessRegistry {
    pub fn new(options: SupervisorOptions) -> Self {
        let (restart_tx, restart_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(RegistryInner {
            table: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            events: Arc::new(StatusBroadcaster::new()),
            options,
            restart_tx,
            closed: AtomicBool::new(false),
        });
        let dispatcher = tokio::spawn(dispatch_restarts(Arc::downgrade(&inner), restart_rx));
        Self { inner, dispatcher }
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.inner.options
    }

    /// Call `callback` with every published transition until the registry
    /// is dropped or the returned task is aborted.
    ///
    /// The callback runs on its own task: a slow or panicking callback only
    /// affects itself.
    pub fn on_status_changed<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(ProcessRecord) + Send + 'static,
    {
        let mut rx = self.inner.events.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(record) => callback(record),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Status subscriber lagged, records dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Watch every mutation of one record, including resource samples.
    pub fn watch(&self, name: &str) -> Option<watch::Receiver<ProcessRecord>> {
        self.inner.slot(name).map(|slot| slot.status.watch())
    }

    /// Start every spec in order.
    ///
    /// Never stops at the first failure; returns the specs that failed.
    pub async fn start_all(&self, specs: Vec<ProcessSpec>) -> Vec<(String, SupervisorError)> {
        let mut failures = Vec::new();
        for spec in specs {
            let name = spec.name.clone();
            if let Err(e) = self.start_monitoring(spec).await {
                warn!(name = %name, error = %e, "Failed to start process");
                failures.push((name, e));
            }
        }
        failures
    }

    /// Stop and remove every process concurrently.
    pub async fn stop_all(&self) {
        let names: Vec<String> = self.inner.read_table().keys().cloned().collect();
        if names.is_empty() {
            return;
        }
        info!(count = names.len(), "Stopping all processes");
        join_all(names.iter().map(|name| self.stop_monitoring(name))).await;
    }

    /// Stop everything and refuse further auto-restarts.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.stop_all().await;
        self.dispatcher.abort();
        info!("Process registry shut down");
    }
}

impl Drop for ProcessRegistry {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

#[async_trait]
impl ProcessSupervisor for ProcessRegistry {
    async fn start_monitoring(&self, spec: ProcessSpec) -> Result<(), SupervisorError> {
        spec.validate()?;
        let name = spec.name.clone();

        // Insert before spawning so a concurrent duplicate is rejected here
        let mut process = {
            let mut table = self.inner.write_table();
            if table.contains_key(&name) {
                return Err(SupervisorError::AlreadyMonitored(name));
            }

            let process = SupervisedProcess::new(
                spec,
                self.inner.options.clone(),
                Arc::clone(&self.inner.events),
                Some(self.inner.restart_tx.clone()),
            );
            let slot = Arc::new(ProcessSlot {
                seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
                status: process.status_cell(),
                process: Arc::new(Mutex::new(process)),
                retired: AtomicBool::new(false),
            });
            let guard = Arc::clone(&slot.process)
                .try_lock_owned()
                .map_err(|e| SupervisorError::Internal(e.to_string()))?;
            table.insert(name.clone(), slot);
            guard
        };

        debug!(name = %name, "Registered process");
        process.start().await
    }

    async fn stop_monitoring(&self, name: &str) {
        let Some(slot) = self.inner.slot(name) else {
            debug!(name = %name, "Stop requested for unknown process");
            return;
        };

        let mut process = slot.process.lock().await;
        if slot.is_retired() {
            return;
        }
        process.stop().await;

        // Removed while still holding the process lock: no one can observe
        // the entry after its process is gone
        slot.retired.store(true, Ordering::Release);
        self.inner.remove_slot(name, &slot);
        info!(name = %name, "Process removed from registry");
    }

    async fn send_command(&self, name: &str, text: &str) {
        let Some(slot) = self.inner.slot(name) else {
            debug!(name = %name, "Command for unknown process dropped");
            return;
        };
        let process = slot.process.lock().await;
        if !slot.is_retired() {
            process.send_command(text);
        }
    }

    async fn restart(&self, name: &str) -> Result<(), SupervisorError> {
        let slot = self
            .inner
            .slot(name)
            .ok_or_else(|| SupervisorError::NotMonitored(name.to_string()))?;
        let mut process = slot.process.lock().await;
        if slot.is_retired() {
            return Err(SupervisorError::NotMonitored(name.to_string()));
        }
        process.restart().await
    }

    fn get_info(&self, name: &str) -> Option<ProcessRecord> {
        self.inner.slot(name).map(|slot| slot.status.snapshot())
    }

    fn get_all(&self) -> Vec<ProcessRecord> {
        let mut slots: Vec<Arc<ProcessSlot>> = self.inner.read_table().values().cloned().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.iter().map(|slot| slot.status.snapshot()).collect()
    }

    fn subscribe(&self) -> broadcast::Receiver<ProcessRecord> {
        self.inner.events.subscribe()
    }
}

async fn dispatch_restarts(
    inner: Weak<RegistryInner>,
    mut rx: mpsc::UnboundedReceiver<RestartRequest>,
) {
    while let Some(request) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if inner.closed.load(Ordering::Acquire) {
            debug!(name = %request.name, "Registry closed, ignoring restart request");
            continue;
        }
        tokio::spawn(handle_restart(inner, request));
    }
    debug!("Restart dispatcher exiting");
}

/// Restart a process after an unexpected exit, unless something else
/// happened to it since.
async fn handle_restart(inner: Arc<RegistryInner>, request: RestartRequest) {
    let delay = inner.options.restart_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let Some(slot) = inner.slot(&request.name) else {
        return;
    };
    let mut process = slot.process.lock().await;
    if slot.is_retired() || inner.closed.load(Ordering::Acquire) {
        return;
    }

    let record = process.snapshot();
    if record.state != ProcessState::Failed || record.launches != request.run {
        debug!(
            name = %request.name,
            run = request.run,
            state = %record.state,
            "Dropping stale restart request"
        );
        return;
    }

    info!(name = %request.name, restarts = record.launches, "Auto-restarting process");
    if let Err(e) = process.start().await {
        warn!(name = %request.name, error = %e, "Auto-restart failed");
    }
}
