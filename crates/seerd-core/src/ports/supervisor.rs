//! Process supervisor trait definition.
//!
//! This port is the narrow interface the presentation layer and service host
//! consume. Implementations own every OS handle; callers only see
//! [`ProcessRecord`] snapshots.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::SupervisorError;
use crate::domain::{ProcessRecord, ProcessSpec};

/// Multiplexer of supervised processes keyed by logical name.
///
/// # Ordering
///
/// Commands for one name are totally ordered. Commands for different names
/// run concurrently.
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    /// Register and launch a process.
    ///
    /// Fails with [`SupervisorError::AlreadyMonitored`] if the name is taken,
    /// or [`SupervisorError::Launch`] if the spawn fails (the entry then stays
    /// registered in `Failed`).
    async fn start_monitoring(&self, spec: ProcessSpec) -> Result<(), SupervisorError>;

    /// Stop a process and remove it. A no-op for absent names.
    async fn stop_monitoring(&self, name: &str);

    /// Write a line to the process's stdin. Silently dropped unless running.
    async fn send_command(&self, name: &str, text: &str);

    /// Stop then start the process, reusing its spec.
    async fn restart(&self, name: &str) -> Result<(), SupervisorError>;

    /// Snapshot of one process, or `None` if absent.
    fn get_info(&self, name: &str) -> Option<ProcessRecord>;

    /// Snapshot of all processes, in registration order.
    fn get_all(&self) -> Vec<ProcessRecord>;

    /// Receive every state transition from now on.
    fn subscribe(&self) -> broadcast::Receiver<ProcessRecord>;
}
