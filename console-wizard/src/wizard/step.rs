// Step descriptor record
//
// A step is plain data plus named functions: the builder assembles these records per render and
// the protocol calls the functions. No per-step types or trait objects.

use crate::error::Result;
use crate::executor::ConnectorExecutor;
use crate::forms::form::{FormData, StepForm};
use crate::models::descriptor::{ConnectorDescriptor, ConnectorFacts, SystemEntity};
use crate::models::state::SessionContext;
use futures::future::BoxFuture;

/// Produces the step's form, pre-filled from the context.
pub type UiFactory = fn(&SessionContext) -> StepForm;

/// Writes the outbound request into a copy of the descriptor.
pub type CompileFn = fn(&mut ConnectorDescriptor, &FormData, Option<&SystemEntity>);

/// Reduces the executor response into a new context:
/// `(context, response, original request) -> context`.
pub type ApplyResultFn =
    fn(SessionContext, &ConnectorDescriptor, &ConnectorDescriptor) -> Result<SessionContext>;

/// Replaces the default single-call commit.
pub type CustomExecuteFn = for<'a> fn(CustomExecution<'a>) -> BoxFuture<'a, Result<SessionContext>>;

/// Inputs of a custom commit.
pub struct CustomExecution<'a> {
    pub step: &'a StepDescriptor,
    pub context: &'a SessionContext,
    pub descriptor: ConnectorDescriptor,
    pub form: FormData,
    pub executor: &'a dyn ConnectorExecutor,
}

/// Base-graph slot a step fills; graph transforms address slots, not indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    System,
    Connector,
    Schema,
    Mapping,
    MappingAttributes,
    Sync,
    Summary,
    Bespoke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    SystemCreated,
    MappingCreated,
}

impl Precondition {
    pub fn holds(&self, ctx: &SessionContext) -> bool {
        match self {
            Precondition::SystemCreated => ctx.entity.is_some(),
            Precondition::MappingCreated => ctx.entity.is_some() && ctx.mapping.is_some(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Precondition::SystemCreated => "Available once the system has been created.",
            Precondition::MappingCreated => "Available once the mapping has been created.",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StepUi {
    Ready(UiFactory),
    /// Listed in the graph but its form cannot be built yet.
    Locked(Precondition),
}

/// Context check evaluated before "next", independent of the form.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    pub check: fn(&SessionContext) -> bool,
    pub warning: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to the next step of the recomputed graph.
    Advance,
    /// Move to a sibling sub-step sharing the same slot.
    JumpTo(&'static str),
    /// Close the wizard.
    Finish,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepFlags {
    pub skippable: bool,
    pub done: bool,
    pub terminal: bool,
    pub hides_finish: bool,
}

#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub help: &'static str,
    pub slot: Slot,
    pub flags: StepFlags,
    pub ui: StepUi,
    pub gate: Option<Gate>,
    pub compile: CompileFn,
    pub apply_result: ApplyResultFn,
    pub custom_execute: Option<CustomExecuteFn>,
    pub transition: Transition,
}

impl StepDescriptor {
    pub fn new(id: &'static str, label: &'static str, slot: Slot) -> Self {
        Self {
            id,
            label,
            help: "",
            slot,
            flags: StepFlags::default(),
            ui: StepUi::Ready(empty_form),
            gate: None,
            compile: compile_nothing,
            apply_result: absorb_response,
            custom_execute: None,
            transition: Transition::Advance,
        }
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub fn form(mut self, factory: UiFactory) -> Self {
        self.ui = StepUi::Ready(factory);
        self
    }

    /// Use `factory` when `pre` holds in `ctx`, otherwise list the step as locked.
    pub fn form_when(mut self, ctx: &SessionContext, pre: Precondition, factory: UiFactory) -> Self {
        self.ui = if pre.holds(ctx) {
            StepUi::Ready(factory)
        } else {
            StepUi::Locked(pre)
        };
        self
    }

    pub fn gate(mut self, check: fn(&SessionContext) -> bool, warning: &'static str) -> Self {
        self.gate = Some(Gate { check, warning });
        self
    }

    pub fn compile(mut self, compile: CompileFn) -> Self {
        self.compile = compile;
        self
    }

    pub fn apply(mut self, apply: ApplyResultFn) -> Self {
        self.apply_result = apply;
        self
    }

    pub fn custom(mut self, execute: CustomExecuteFn) -> Self {
        self.custom_execute = Some(execute);
        self
    }

    pub fn then(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    pub fn skippable(mut self) -> Self {
        self.flags.skippable = true;
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.flags.done = done;
        self
    }

    /// Terminal steps also hide the finish control.
    pub fn terminal(mut self, terminal: bool) -> Self {
        self.flags.terminal = terminal;
        self.flags.hides_finish = self.flags.hides_finish || terminal;
        self
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.ui, StepUi::Locked(_))
    }

    /// Build the step's form, or `None` while the step is locked.
    pub fn build_form(&self, ctx: &SessionContext) -> Option<StepForm> {
        match self.ui {
            StepUi::Ready(factory) => Some(factory(ctx)),
            StepUi::Locked(_) => None,
        }
    }
}

pub fn empty_form(_ctx: &SessionContext) -> StepForm {
    StepForm::empty()
}

pub fn compile_nothing(
    _descriptor: &mut ConnectorDescriptor,
    _form: &FormData,
    _entity: Option<&SystemEntity>,
) {
}

/// Default reducer: take the response as the new descriptor, re-derive the
/// typed facts and pick up any embedded records the response carries.
pub fn absorb_response(
    ctx: SessionContext,
    response: &ConnectorDescriptor,
    _original: &ConnectorDescriptor,
) -> Result<SessionContext> {
    let embedded = &response.embedded;
    Ok(SessionContext {
        entity: embedded.system.clone().or(ctx.entity),
        mapping: embedded.mapping.clone().or(ctx.mapping),
        sync_config: embedded.sync.clone().or(ctx.sync_config),
        facts: ConnectorFacts::ingest(&response.metadata),
        connector_descriptor: Some(response.clone()),
        ..ctx
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::descriptor::SyncConfigRef;
    use uuid::Uuid;

    #[test]
    fn absorb_keeps_existing_records_when_response_omits_them() {
        let sync = SyncConfigRef {
            id: Uuid::new_v4(),
            name: "s".to_string(),
        };
        let ctx = SessionContext {
            sync_config: Some(sync.clone()),
            ..SessionContext::default()
        };
        let mut response = ConnectorDescriptor::new("universal-system");
        response.set_flag("ssl", true);

        let next = absorb_response(ctx, &response, &ConnectorDescriptor::default()).unwrap();

        assert_eq!(next.sync_config, Some(sync));
        assert!(next.facts.ssl);
        assert_eq!(next.connector_descriptor, Some(response));
    }

    #[test]
    fn terminal_implies_hidden_finish() {
        let step = StepDescriptor::new("x", "X", Slot::Bespoke).terminal(true);
        assert!(step.flags.terminal);
        assert!(step.flags.hides_finish);
        let step = StepDescriptor::new("x", "X", Slot::Bespoke).terminal(false);
        assert!(!step.flags.hides_finish);
    }

    #[test]
    fn locked_step_has_no_form() {
        let ctx = SessionContext::default();
        let step = StepDescriptor::new("x", "X", Slot::Mapping).form_when(
            &ctx,
            Precondition::SystemCreated,
            empty_form,
        );
        assert!(step.is_locked());
        assert!(step.build_form(&ctx).is_none());
    }
}
