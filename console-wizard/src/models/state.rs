// Wizard session state (in-memory)
//
// NOTE: This is NOT persisted. One session belongs to exactly one wizard run and is dropped when
// the wizard closes, whether the run was committed or abandoned.

use super::descriptor::{
    ConnectorDescriptor, ConnectorFacts, MappingRef, OperationType, SyncConfigRef, SystemEntity,
};
use super::kind::ConnectorKind;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Mutable state shared by every step of one wizard run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub entity: Option<SystemEntity>,
    pub mapping: Option<MappingRef>,
    pub sync_config: Option<SyncConfigRef>,
    pub connector_descriptor: Option<ConnectorDescriptor>,
    pub facts: ConnectorFacts,
    pub active_step_pointer: Option<String>,
    pub active_index: usize,
}

impl SessionContext {
    pub fn is_synchronization(&self) -> bool {
        self.mapping
            .as_ref()
            .map(|m| m.operation_type == OperationType::Synchronization)
            .unwrap_or(false)
    }

    pub fn pointer_is(&self, id: &str) -> bool {
        self.active_step_pointer.as_deref() == Some(id)
    }

    pub fn reopened(&self) -> bool {
        self.connector_descriptor
            .as_ref()
            .map(|d| d.reopened)
            .unwrap_or(false)
    }
}

/// Session cell owned by the host controller.
///
/// Holds the context behind an async mutex, plus the in-flight guard and the
/// closed flag the step protocol consults around each executor call.
#[derive(Debug)]
pub struct WizardSession {
    id: Uuid,
    kind: ConnectorKind,
    supplied: ConnectorDescriptor,
    inner: Mutex<SessionContext>,
    in_flight: AtomicBool,
    closed: AtomicBool,
}

impl WizardSession {
    pub fn new(kind: ConnectorKind, supplied: ConnectorDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            supplied,
            inner: Mutex::new(SessionContext::default()),
            in_flight: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_context(
        kind: ConnectorKind,
        supplied: ConnectorDescriptor,
        context: SessionContext,
    ) -> Self {
        let session = Self::new(kind, supplied);
        Self {
            inner: Mutex::new(context),
            ..session
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }

    /// Descriptor handed to the wizard when it was opened.
    pub fn supplied_descriptor(&self) -> &ConnectorDescriptor {
        &self.supplied
    }

    pub async fn snapshot(&self) -> SessionContext {
        self.inner.lock().await.clone()
    }

    /// Replace the step data of the context with a reduced one.
    ///
    /// Pointer fields stay owned by the controller.
    pub async fn commit(&self, next: SessionContext) {
        let mut inner = self.inner.lock().await;
        let pointer = inner.active_step_pointer.take();
        let index = inner.active_index;
        *inner = SessionContext {
            active_step_pointer: pointer,
            active_index: index,
            ..next
        };
    }

    pub async fn set_pointer(&self, id: Option<String>, index: usize) {
        let mut inner = self.inner.lock().await;
        inner.active_step_pointer = id;
        inner.active_index = index;
    }

    /// Claim the session for one executor round trip. `None` while another
    /// round trip is outstanding.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { session: self })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Mark the hosting UI as gone. Responses that resolve afterwards are dropped.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Releases the in-flight flag on drop, including on error paths.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    session: &'a WizardSession,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.session.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> WizardSession {
        WizardSession::new(
            ConnectorKind::Universal,
            ConnectorDescriptor::new(ConnectorKind::Universal.as_str()),
        )
    }

    #[test]
    fn in_flight_guard_is_exclusive_and_released_on_drop() {
        let s = session();
        let guard = s.try_begin();
        assert!(guard.is_some());
        assert!(s.is_busy());
        assert!(s.try_begin().is_none());
        drop(guard);
        assert!(!s.is_busy());
        assert!(s.try_begin().is_some());
    }

    #[tokio::test]
    async fn commit_keeps_controller_pointer() {
        let s = session();
        s.set_pointer(Some("connector".to_string()), 1).await;

        let next = SessionContext {
            active_step_pointer: Some("bogus".to_string()),
            active_index: 9,
            entity: Some(SystemEntity {
                id: Uuid::new_v4(),
                code: "hr".to_string(),
                description: None,
                connector_key: None,
            }),
            ..SessionContext::default()
        };
        s.commit(next).await;

        let snap = s.snapshot().await;
        assert_eq!(snap.active_step_pointer.as_deref(), Some("connector"));
        assert_eq!(snap.active_index, 1);
        assert_eq!(snap.entity.map(|e| e.code), Some("hr".to_string()));
    }

    #[test]
    fn close_is_sticky() {
        let s = session();
        assert!(!s.is_closed());
        s.close();
        assert!(s.is_closed());
    }
}
