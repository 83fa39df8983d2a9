// Host wizard controller
//
// Owns the active step pointer. Asks the builder for a fresh graph on every render and every
// navigation, hands "next" to the step protocol, and receives the protocol's host callbacks.

use super::builder::build_steps;
use super::graph::StepGraph;
use super::protocol::{self, AdvanceOutcome, HostCallbacks};
use super::step::{StepDescriptor, StepUi};
use crate::error::{Result, WizardError};
use crate::executor::ConnectorExecutor;
use crate::forms::form::StepForm;
use crate::models::descriptor::{keys, ConnectorDescriptor};
use crate::models::kind::ConnectorKind;
use crate::models::state::{SessionContext, WizardSession};
use crate::wizard::step::absorb_response;
use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// One entry of the step list shown beside the active form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    pub id: &'static str,
    pub label: &'static str,
    pub done: bool,
    pub locked: bool,
    pub skippable: bool,
    pub terminal: bool,
}

impl From<&StepDescriptor> for StepSummary {
    fn from(step: &StepDescriptor) -> Self {
        Self {
            id: step.id,
            label: step.label,
            done: step.flags.done,
            locked: step.is_locked(),
            skippable: step.flags.skippable,
            terminal: step.flags.terminal,
        }
    }
}

/// Everything needed to draw the wizard once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardFrame {
    pub steps: Vec<StepSummary>,
    pub active_index: usize,
    pub active_id: &'static str,
    pub help: &'static str,
    /// `None` while the active step is locked.
    pub form: Option<StepForm>,
    pub locked_reason: Option<&'static str>,
    pub hides_finish: bool,
}

pub struct WizardController {
    session: Arc<WizardSession>,
    executor: Arc<dyn ConnectorExecutor>,
    finished: AtomicBool,
}

/// Context with the pointer on the first step of the kind's graph.
fn pointed_at_first_step(kind: ConnectorKind, ctx: SessionContext) -> SessionContext {
    let first = build_steps(kind, &ctx).get(0).map(|s| s.id.to_string());
    SessionContext {
        active_step_pointer: first,
        active_index: 0,
        ..ctx
    }
}

/// Index of the active step: the pointer when the graph still lists it,
/// otherwise the last known index clamped to the graph.
fn resolve_active(graph: &StepGraph, ctx: &SessionContext) -> usize {
    ctx.active_step_pointer
        .as_deref()
        .and_then(|id| graph.position(id))
        .unwrap_or_else(|| ctx.active_index.min(graph.len().saturating_sub(1)))
}

impl WizardController {
    pub fn new(
        kind: ConnectorKind,
        supplied: ConnectorDescriptor,
        executor: Arc<dyn ConnectorExecutor>,
    ) -> Self {
        let ctx = pointed_at_first_step(kind, SessionContext::default());
        let session = WizardSession::with_context(kind, supplied, ctx);
        Self::from_session(Arc::new(session), executor)
    }

    pub fn from_session(session: Arc<WizardSession>, executor: Arc<dyn ConnectorExecutor>) -> Self {
        Self {
            session,
            executor,
            finished: AtomicBool::new(false),
        }
    }

    /// Open the wizard on an existing system: its descriptor is loaded from the
    /// executor and the run is marked as reopened.
    pub async fn reopen(
        kind: ConnectorKind,
        system_id: Uuid,
        executor: Arc<dyn ConnectorExecutor>,
    ) -> Result<Self> {
        let mut request = ConnectorDescriptor::new(kind.as_str());
        request.reopened = true;
        request.set_meta(keys::SYSTEM_ID, system_id.to_string());

        let loaded = executor.load(request.clone()).await?;
        if loaded.embedded.system.is_none() {
            return Err(WizardError::malformed("load", "reply carries no system record"));
        }
        let ctx = absorb_response(SessionContext::default(), &loaded, &request)?;
        let ctx = pointed_at_first_step(kind, ctx);
        info!(
            "[PHASE: wizard] [STEP: load] reopened system {} ({})",
            system_id, kind
        );
        let session = WizardSession::with_context(kind, request, ctx);
        Ok(Self::from_session(Arc::new(session), executor))
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn kind(&self) -> ConnectorKind {
        self.session.kind()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub async fn context(&self) -> SessionContext {
        self.session.snapshot().await
    }

    /// Current graph, rebuilt from the session context.
    pub async fn steps(&self) -> StepGraph {
        build_steps(self.kind(), &self.session.snapshot().await)
    }

    async fn active(&self) -> (SessionContext, StepGraph, usize) {
        let ctx = self.session.snapshot().await;
        let graph = build_steps(self.kind(), &ctx);
        let index = resolve_active(&graph, &ctx);
        (ctx, graph, index)
    }

    pub async fn render(&self) -> Result<WizardFrame> {
        let (ctx, graph, index) = self.active().await;
        let step = graph
            .get(index)
            .ok_or_else(|| WizardError::UnknownStep {
                step: ctx.active_step_pointer.clone().unwrap_or_default(),
            })?;
        let locked_reason = match step.ui {
            StepUi::Locked(pre) => Some(pre.describe()),
            StepUi::Ready(_) => None,
        };
        Ok(WizardFrame {
            steps: graph.steps().iter().map(StepSummary::from).collect(),
            active_index: index,
            active_id: step.id,
            help: step.help,
            form: step.build_form(&ctx),
            locked_reason,
            hides_finish: step.flags.hides_finish,
        })
    }

    /// "Next" on the active step with the user's filled-in form.
    pub async fn next(&self, form: &StepForm) -> Result<AdvanceOutcome> {
        if self.session.is_closed() {
            return Err(WizardError::SessionClosed {
                session_id: self.session.id().to_string(),
            });
        }
        let (_, graph, index) = self.active().await;
        let step = graph.get(index).cloned().ok_or_else(|| WizardError::UnknownStep {
            step: index.to_string(),
        })?;
        protocol::advance(&step, form, &self.session, self.executor.as_ref(), self).await
    }

    async fn move_to(&self, graph: &StepGraph, index: usize) {
        let id = graph.get(index).map(|s| s.id.to_string());
        debug!(
            "[PHASE: wizard] [STEP: {}] active (index {})",
            id.as_deref().unwrap_or("-"),
            index
        );
        self.session.set_pointer(id, index).await;
    }

    /// Step back one position. Refused while a call is in flight.
    pub async fn back(&self) -> bool {
        if self.session.is_busy() {
            return false;
        }
        let (_, graph, index) = self.active().await;
        if index == 0 {
            return false;
        }
        self.move_to(&graph, index - 1).await;
        true
    }

    /// Move past a skippable step without executing it.
    pub async fn skip(&self) -> bool {
        if self.session.is_busy() {
            return false;
        }
        let (_, graph, index) = self.active().await;
        let skippable = graph.get(index).map(|s| s.flags.skippable).unwrap_or(false);
        if !skippable || index + 1 >= graph.len() {
            return false;
        }
        info!(
            "[PHASE: wizard] [STEP: {}] skipped",
            graph.get(index).map(|s| s.id).unwrap_or_default()
        );
        self.move_to(&graph, index + 1).await;
        true
    }

    /// User navigation to a step of the current graph (e.g. a schema sub-step).
    /// `Ok(false)` while a call is in flight.
    pub async fn open_step(&self, id: &str) -> Result<bool> {
        if self.session.is_busy() {
            return Ok(false);
        }
        self.point_at(id).await?;
        Ok(true)
    }

    /// Sub-steps are picked by the pointer, so the graph is built with the
    /// pointer already moved before the target is looked up.
    async fn point_at(&self, id: &str) -> Result<()> {
        let ctx = self.session.snapshot().await;
        let probe = SessionContext {
            active_step_pointer: Some(id.to_string()),
            ..ctx
        };
        let graph = build_steps(self.kind(), &probe);
        let index = graph.position(id).ok_or_else(|| WizardError::UnknownStep {
            step: id.to_string(),
        })?;
        self.move_to(&graph, index).await;
        Ok(())
    }

    /// Close the wizard; late responses are discarded.
    pub fn close(&self) {
        info!("[PHASE: wizard] [STEP: close] session {} closed", self.session.id());
        self.session.close();
    }
}

#[async_trait]
impl HostCallbacks for WizardController {
    async fn advance(&self) -> Result<()> {
        let (_, graph, index) = self.active().await;
        if graph.get(index).map(|s| s.flags.terminal).unwrap_or(false) {
            return Ok(());
        }
        let next = (index + 1).min(graph.len().saturating_sub(1));
        self.move_to(&graph, next).await;
        Ok(())
    }

    async fn finish(&self) -> Result<()> {
        self.finished.store(true, Ordering::Release);
        self.close();
        Ok(())
    }

    async fn jump_to(&self, step_id: &'static str) -> Result<()> {
        self.point_at(step_id).await
    }
}
