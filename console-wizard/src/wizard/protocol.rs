// Step execution protocol ("next")
//
// validate form -> gate -> compile request -> one executor call -> reduce -> commit -> move host.
// The request is compiled on a copy and the session context is only replaced once the whole
// sequence succeeded; on any failure the context and the host pointer stay where they were.

use super::step::{CustomExecution, StepDescriptor, StepUi, Transition};
use crate::error::Result;
use crate::executor::ConnectorExecutor;
use crate::forms::form::FormView;
use crate::models::descriptor::{ConnectorDescriptor, ConnectorFacts};
use crate::models::state::{SessionContext, WizardSession};
use crate::utils::logging::mask_metadata;
use async_trait::async_trait;
use log::{debug, info, warn};

/// Navigation the protocol triggers on the hosting wizard after a commit.
#[async_trait]
pub trait HostCallbacks: Send + Sync {
    async fn advance(&self) -> Result<()>;
    async fn finish(&self) -> Result<()>;
    async fn jump_to(&self, step_id: &'static str) -> Result<()>;
}

/// What a "next" request ended in. Executor failures are returned as `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced,
    Finished,
    JumpedTo(&'static str),
    FormInvalid,
    GateBlocked { warning: &'static str },
    Locked { reason: &'static str },
    /// Another round trip for this session is outstanding.
    Busy,
    /// The step ends the run; "next" is not offered.
    Terminal,
    /// The wizard was closed while the call was outstanding; the response was dropped.
    Discarded,
}

impl AdvanceOutcome {
    pub fn committed(&self) -> bool {
        matches!(
            self,
            AdvanceOutcome::Advanced | AdvanceOutcome::Finished | AdvanceOutcome::JumpedTo(_)
        )
    }
}

/// Pure reducer: run the step's `apply_result` and enforce the context invariants.
pub fn apply_step_result(
    ctx: SessionContext,
    step: &StepDescriptor,
    response: &ConnectorDescriptor,
    original: &ConnectorDescriptor,
) -> Result<SessionContext> {
    let next = (step.apply_result)(ctx.clone(), response, original)?;
    Ok(settle(&ctx, next))
}

/// The entity is never unset once present, facts always mirror the latest
/// descriptor, and pointer fields belong to the controller.
fn settle(previous: &SessionContext, mut next: SessionContext) -> SessionContext {
    if next.entity.is_none() {
        next.entity = previous.entity.clone();
    }
    if let Some(descriptor) = &next.connector_descriptor {
        next.facts = ConnectorFacts::ingest(&descriptor.metadata);
    }
    next.active_step_pointer = previous.active_step_pointer.clone();
    next.active_index = previous.active_index;
    next
}

/// Request the descriptor a step compiles into: the session-held one, else the
/// one supplied when the wizard was opened.
pub fn effective_descriptor(ctx: &SessionContext, session: &WizardSession) -> ConnectorDescriptor {
    ctx.connector_descriptor
        .clone()
        .unwrap_or_else(|| session.supplied_descriptor().clone())
}

async fn execute_once(
    step: &StepDescriptor,
    ctx: &SessionContext,
    request: ConnectorDescriptor,
    executor: &dyn ConnectorExecutor,
) -> Result<SessionContext> {
    let response = executor.execute(request.clone()).await?;
    apply_step_result(ctx.clone(), step, &response, &request)
}

/// Run "next" for `step` against the session.
pub async fn advance<F>(
    step: &StepDescriptor,
    form: &F,
    session: &WizardSession,
    executor: &dyn ConnectorExecutor,
    host: &dyn HostCallbacks,
) -> Result<AdvanceOutcome>
where
    F: FormView + ?Sized,
{
    let Some(_guard) = session.try_begin() else {
        debug!("[PHASE: wizard] [STEP: {}] ignored, call in flight", step.id);
        return Ok(AdvanceOutcome::Busy);
    };
    if step.flags.terminal {
        return Ok(AdvanceOutcome::Terminal);
    }
    if let StepUi::Locked(pre) = step.ui {
        return Ok(AdvanceOutcome::Locked {
            reason: pre.describe(),
        });
    }
    if !form.is_form_valid() {
        debug!("[PHASE: wizard] [STEP: {}] form invalid", step.id);
        return Ok(AdvanceOutcome::FormInvalid);
    }

    let ctx = session.snapshot().await;
    if let Some(gate) = step.gate {
        if !(gate.check)(&ctx) {
            warn!("[PHASE: wizard] [STEP: {}] blocked: {}", step.id, gate.warning);
            return Ok(AdvanceOutcome::GateBlocked {
                warning: gate.warning,
            });
        }
    }

    let form_data = form.form_data();
    let mut request = effective_descriptor(&ctx, session);
    request.current_step_name = Some(step.id.to_string());
    (step.compile)(&mut request, &form_data, ctx.entity.as_ref());
    info!(
        "[PHASE: wizard] [STEP: {}] executing (connector={}, metadata={:?})",
        step.id,
        request.id,
        mask_metadata(&request.metadata)
    );

    let reduced = match step.custom_execute {
        Some(custom) => {
            custom(CustomExecution {
                step,
                context: &ctx,
                descriptor: request,
                form: form_data,
                executor,
            })
            .await
        }
        None => execute_once(step, &ctx, request, executor).await,
    };
    let next = match reduced {
        Ok(next) => settle(&ctx, next),
        Err(e) => {
            warn!("[PHASE: wizard] [STEP: {}] failed: {}", step.id, e);
            return Err(e);
        }
    };

    if session.is_closed() {
        info!(
            "[PHASE: wizard] [STEP: {}] response discarded, session {} closed",
            step.id,
            session.id()
        );
        return Ok(AdvanceOutcome::Discarded);
    }
    session.commit(next).await;
    info!("[PHASE: wizard] [STEP: {}] committed", step.id);

    match step.transition {
        Transition::Advance => {
            host.advance().await?;
            Ok(AdvanceOutcome::Advanced)
        }
        Transition::JumpTo(target) => {
            host.jump_to(target).await?;
            Ok(AdvanceOutcome::JumpedTo(target))
        }
        Transition::Finish => {
            host.finish().await?;
            Ok(AdvanceOutcome::Finished)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutorError, WizardError};
    use crate::forms::form::{FormData, FormField, StepForm};
    use crate::models::descriptor::{keys, MappingRef, OperationType, SyncConfigRef, SystemEntity};
    use crate::models::kind::ConnectorKind;
    use crate::wizard::step::{Precondition, Slot};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    type Respond = Box<dyn Fn(ConnectorDescriptor) -> std::result::Result<ConnectorDescriptor, ExecutorError> + Send + Sync>;

    struct StubExecutor {
        calls: AtomicU32,
        respond: Respond,
        close_on_call: Option<Arc<WizardSession>>,
    }

    impl StubExecutor {
        fn new(respond: Respond) -> Self {
            Self {
                calls: AtomicU32::new(0),
                respond,
                close_on_call: None,
            }
        }

        fn echo() -> Self {
            Self::new(Box::new(|d| Ok(d)))
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectorExecutor for StubExecutor {
        async fn execute(
            &self,
            descriptor: ConnectorDescriptor,
        ) -> std::result::Result<ConnectorDescriptor, ExecutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(session) = &self.close_on_call {
                session.close();
            }
            (self.respond)(descriptor)
        }

        async fn load(
            &self,
            descriptor: ConnectorDescriptor,
        ) -> std::result::Result<ConnectorDescriptor, ExecutorError> {
            Ok(descriptor)
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        advances: AtomicU32,
        finishes: AtomicU32,
        jumps: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl HostCallbacks for RecordingHost {
        async fn advance(&self) -> Result<()> {
            self.advances.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn finish(&self) -> Result<()> {
            self.finishes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn jump_to(&self, step_id: &'static str) -> Result<()> {
            self.jumps.lock().unwrap().push(step_id);
            Ok(())
        }
    }

    fn entity() -> SystemEntity {
        SystemEntity {
            id: Uuid::new_v4(),
            code: "hr".to_string(),
            description: None,
            connector_key: Some("csv:default".to_string()),
        }
    }

    fn seeded_context() -> SessionContext {
        SessionContext {
            entity: Some(entity()),
            mapping: Some(MappingRef {
                id: Uuid::new_v4(),
                operation_type: OperationType::Synchronization,
                entity_type: None,
            }),
            sync_config: Some(SyncConfigRef {
                id: Uuid::new_v4(),
                name: "hr-sync".to_string(),
            }),
            connector_descriptor: Some(ConnectorDescriptor::new("universal-system")),
            ..SessionContext::default()
        }
    }

    fn session(ctx: SessionContext) -> WizardSession {
        WizardSession::with_context(
            ConnectorKind::Universal,
            ConnectorDescriptor::new(ConnectorKind::Universal.as_str()),
            ctx,
        )
    }

    fn compile_host(d: &mut ConnectorDescriptor, form: &FormData, _e: Option<&SystemEntity>) {
        d.set_meta_opt(keys::HOST, form.get("host"));
    }

    fn host_step() -> StepDescriptor {
        fn form(_ctx: &SessionContext) -> StepForm {
            StepForm::new(vec![FormField::text("host", "Host").required()])
        }
        StepDescriptor::new("hostStep", "Host", Slot::Bespoke)
            .form(form)
            .compile(compile_host)
    }

    fn filled(step: &StepDescriptor, ctx: &SessionContext, host: &str) -> StepForm {
        let mut form = step.build_form(ctx).unwrap();
        form.set("host", host);
        form
    }

    #[tokio::test]
    async fn invalid_form_makes_no_call() {
        let s = session(SessionContext::default());
        let exec = StubExecutor::echo();
        let host = RecordingHost::default();
        let step = host_step();
        let form = step.build_form(&SessionContext::default()).unwrap();

        let outcome = advance(&step, &form, &s, &exec, &host).await.unwrap();

        assert_eq!(outcome, AdvanceOutcome::FormInvalid);
        assert_eq!(exec.calls(), 0);
        assert_eq!(host.advances.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejection_leaves_context_untouched_and_host_unmoved() {
        let ctx = seeded_context();
        let s = session(ctx.clone());
        let exec = StubExecutor::new(Box::new(|_| {
            Err(ExecutorError::Rejected {
                status: 500,
                message: "boom".to_string(),
            })
        }));
        let host = RecordingHost::default();
        let step = host_step();
        let form = filled(&step, &ctx, "ldap.local");

        let err = advance(&step, &form, &s, &exec, &host).await.unwrap_err();

        assert!(matches!(err, WizardError::Executor(_)));
        assert_eq!(exec.calls(), 1);
        assert_eq!(host.advances.load(Ordering::SeqCst), 0);
        assert_eq!(s.snapshot().await, ctx);
        assert!(!s.is_busy());
    }

    #[tokio::test]
    async fn success_commits_compiled_request_and_advances() {
        let s = session(SessionContext::default());
        let exec = StubExecutor::echo();
        let host = RecordingHost::default();
        let step = host_step();
        let form = filled(&step, &SessionContext::default(), "ldap.local");

        let outcome = advance(&step, &form, &s, &exec, &host).await.unwrap();

        assert_eq!(outcome, AdvanceOutcome::Advanced);
        assert_eq!(exec.calls(), 1);
        assert_eq!(host.advances.load(Ordering::SeqCst), 1);
        let snap = s.snapshot().await;
        let d = snap.connector_descriptor.unwrap();
        assert_eq!(d.meta(keys::HOST), Some("ldap.local"));
        assert_eq!(d.current_step_name.as_deref(), Some("hostStep"));
        assert_eq!(d.id, "universal-system");
    }

    #[tokio::test]
    async fn second_next_while_in_flight_is_busy() {
        let s = session(SessionContext::default());
        let exec = StubExecutor::echo();
        let host = RecordingHost::default();
        let step = host_step();
        let form = filled(&step, &SessionContext::default(), "ldap.local");

        let _outstanding = s.try_begin();
        let outcome = advance(&step, &form, &s, &exec, &host).await.unwrap();

        assert_eq!(outcome, AdvanceOutcome::Busy);
        assert_eq!(exec.calls(), 0);
    }

    #[tokio::test]
    async fn response_after_close_is_discarded() {
        let ctx = seeded_context();
        let s = Arc::new(session(ctx.clone()));
        let mut exec = StubExecutor::echo();
        exec.close_on_call = Some(Arc::clone(&s));
        let host = RecordingHost::default();
        let step = host_step();
        let form = filled(&step, &ctx, "ldap.local");

        let outcome = advance(&step, &form, &s, &exec, &host).await.unwrap();

        assert_eq!(outcome, AdvanceOutcome::Discarded);
        assert_eq!(s.snapshot().await, ctx);
        assert_eq!(host.advances.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn gate_blocks_before_any_call() {
        fn has_key(ctx: &SessionContext) -> bool {
            ctx.entity.as_ref().and_then(|e| e.connector_key.as_ref()).is_some()
        }
        let s = session(SessionContext::default());
        let exec = StubExecutor::echo();
        let host = RecordingHost::default();
        let step = StepDescriptor::new("schema", "Schema", Slot::Schema).gate(has_key, "no key");

        let outcome = advance(&step, &StepForm::empty(), &s, &exec, &host)
            .await
            .unwrap();

        assert_eq!(outcome, AdvanceOutcome::GateBlocked { warning: "no key" });
        assert_eq!(exec.calls(), 0);
    }

    #[tokio::test]
    async fn terminal_and_locked_steps_do_not_execute() {
        let s = session(SessionContext::default());
        let exec = StubExecutor::echo();
        let host = RecordingHost::default();

        let terminal = StepDescriptor::new("cert", "Cert", Slot::Bespoke).terminal(true);
        let outcome = advance(&terminal, &StepForm::empty(), &s, &exec, &host)
            .await
            .unwrap();
        assert_eq!(outcome, AdvanceOutcome::Terminal);

        let locked = StepDescriptor::new("mapping", "Mapping", Slot::Mapping).form_when(
            &SessionContext::default(),
            Precondition::SystemCreated,
            crate::wizard::step::empty_form,
        );
        let outcome = advance(&locked, &StepForm::empty(), &s, &exec, &host)
            .await
            .unwrap();
        assert!(matches!(outcome, AdvanceOutcome::Locked { .. }));
        assert_eq!(exec.calls(), 0);
    }

    #[tokio::test]
    async fn transitions_drive_the_matching_host_callback() {
        let s = session(SessionContext::default());
        let exec = StubExecutor::echo();
        let host = RecordingHost::default();

        let jump = StepDescriptor::new("schemaNew", "New", Slot::Schema)
            .then(Transition::JumpTo("schemaDetail"));
        let outcome = advance(&jump, &StepForm::empty(), &s, &exec, &host)
            .await
            .unwrap();
        assert_eq!(outcome, AdvanceOutcome::JumpedTo("schemaDetail"));
        assert_eq!(*host.jumps.lock().unwrap(), vec!["schemaDetail"]);

        let finish = StepDescriptor::new("summary", "Summary", Slot::Summary).then(Transition::Finish);
        let outcome = advance(&finish, &StepForm::empty(), &s, &exec, &host)
            .await
            .unwrap();
        assert_eq!(outcome, AdvanceOutcome::Finished);
        assert_eq!(host.finishes.load(Ordering::SeqCst), 1);
        assert_eq!(host.advances.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reducer_never_unsets_entity_and_rebuilds_facts() {
        fn wipe(
            _ctx: SessionContext,
            response: &ConnectorDescriptor,
            _o: &ConnectorDescriptor,
        ) -> Result<SessionContext> {
            Ok(SessionContext {
                connector_descriptor: Some(response.clone()),
                ..SessionContext::default()
            })
        }
        let ctx = seeded_context();
        let step = StepDescriptor::new("x", "X", Slot::Bespoke).apply(wipe);
        let mut response = ConnectorDescriptor::new("universal-system");
        response.set_flag(keys::SSL, true);

        let next = apply_step_result(ctx.clone(), &step, &response, &response).unwrap();

        assert_eq!(next.entity, ctx.entity);
        assert!(next.facts.ssl);
    }
}
