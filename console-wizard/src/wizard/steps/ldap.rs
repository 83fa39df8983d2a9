// LDAP / Active Directory wizard steps
//
// Shared by the user wizard (connection, certificate, containers, test user) and the group wizard
// (connection, certificate, containers, membership). Step ids differ per wizard; forms and compile
// functions are shared where the two agree.

use super::ids::*;
use super::{
    apply_created_mapping, apply_created_system, bind_system, meta, reset_primary_attribute,
};
use crate::error::{Result, WizardError};
use crate::forms::form::{FormData, FormField, StepForm};
use crate::forms::validation::{validate_code, validate_dn, validate_host, validate_port, validate_uuid};
use crate::models::descriptor::{keys, parse_wire_bool, ConnectorDescriptor, SystemEntity};
use crate::models::state::SessionContext;
use crate::wizard::protocol::apply_step_result;
use crate::wizard::step::{CustomExecution, Precondition, Slot, StepDescriptor};
use futures::future::BoxFuture;
use log::info;

pub const DEFAULT_PORT: &str = "389";

pub const UNTRUSTED_CERTIFICATE_HELP: &str =
    "The server certificate is not signed by a trusted authority and the connection is not \
     encrypted. Go back and enable SSL to continue.";

// =========================
// Connection
// =========================

fn connection_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![
        FormField::text(keys::SYSTEM_NAME, "Code")
            .required()
            .validated(validate_code)
            .prefilled(ctx.entity.as_ref().map(|e| e.code.as_str())),
        FormField::text(keys::HOST, "Host")
            .required()
            .validated(validate_host)
            .prefilled(meta(ctx, keys::HOST)),
        FormField::number(keys::PORT, "Port")
            .required()
            .validated(validate_port)
            .prefilled(meta(ctx, keys::PORT).or(Some(DEFAULT_PORT))),
        FormField::toggle(keys::SSL, "Use SSL", false).prefilled(meta(ctx, keys::SSL)),
        FormField::text(keys::USER, "Bind DN")
            .required()
            .validated(validate_dn)
            .prefilled(meta(ctx, keys::USER)),
        FormField::secret(keys::PASSWORD, "Password").required(),
    ])
}

fn compile_connection(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    reset_primary_attribute(d);
    bind_system(d, entity);
    for key in [keys::SYSTEM_NAME, keys::HOST, keys::PORT, keys::USER, keys::PASSWORD] {
        d.set_meta_opt(key, form.get(key));
    }
    let ssl = parse_wire_bool(form.get(keys::SSL).map(String::as_str)).unwrap_or(false);
    d.set_flag(keys::SSL, ssl);
}

fn connection_step(id: &'static str, ctx: &SessionContext) -> StepDescriptor {
    StepDescriptor::new(id, "Connection", Slot::Bespoke)
        .help("Directory server and the account the connector binds with.")
        .form(connection_form)
        .compile(compile_connection)
        .apply(apply_created_system)
        .done(ctx.entity.is_some() && !ctx.pointer_is(id))
}

// =========================
// Certificate
// =========================

fn certificate_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![
        FormField::text(keys::CERTIFICATE_FINGERPRINT, "Certificate fingerprint")
            .prefilled(meta(ctx, keys::CERTIFICATE_FINGERPRINT)),
        FormField::toggle(keys::CERTIFICATE_ACCEPTED, "Trust this certificate", false)
            .prefilled(meta(ctx, keys::CERTIFICATE_ACCEPTED)),
    ])
}

fn compile_certificate(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    let accepted =
        parse_wire_bool(form.get(keys::CERTIFICATE_ACCEPTED).map(String::as_str)).unwrap_or(false);
    d.set_flag(keys::CERTIFICATE_ACCEPTED, accepted);
}

/// Terminal while the server's certificate is untrusted and SSL is off;
/// re-evaluated on every build.
fn certificate_step(id: &'static str, ctx: &SessionContext) -> StepDescriptor {
    let blocked = ctx.facts.blocks_on_certificate();
    StepDescriptor::new(id, "Certificate", Slot::Bespoke)
        .help(if blocked {
            UNTRUSTED_CERTIFICATE_HELP
        } else {
            "Certificate the directory server presented."
        })
        .form_when(ctx, Precondition::SystemCreated, certificate_form)
        .compile(compile_certificate)
        .terminal(blocked)
}

// =========================
// Containers
// =========================

fn user_containers_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![
        FormField::text(keys::USER_CONTAINER, "User container")
            .required()
            .validated(validate_dn)
            .prefilled(meta(ctx, keys::USER_CONTAINER)),
        FormField::text(keys::DELETED_USER_CONTAINER, "Deleted user container")
            .validated(validate_dn)
            .prefilled(meta(ctx, keys::DELETED_USER_CONTAINER)),
    ])
}

fn group_containers_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![FormField::text(keys::GROUP_CONTAINER, "Group container")
        .required()
        .validated(validate_dn)
        .prefilled(meta(ctx, keys::GROUP_CONTAINER))])
}

fn compile_containers(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    for key in [
        keys::USER_CONTAINER,
        keys::DELETED_USER_CONTAINER,
        keys::GROUP_CONTAINER,
    ] {
        d.set_meta_opt(key, form.get(key));
    }
}

// =========================
// Test user (two executor calls)
// =========================

async fn run_test_user(run: CustomExecution<'_>) -> Result<SessionContext> {
    let mut create = run.descriptor;
    create.set_meta(keys::TEST_USER_OPERATION, "create");
    let created = run.executor.execute(create).await?;
    let dn = created
        .meta(keys::TEST_USER_DN)
        .map(str::to_string)
        .ok_or_else(|| WizardError::malformed(run.step.id, "test user was not created"))?;
    info!(
        "[PHASE: wizard] [STEP: {}] test user created: {}",
        run.step.id, dn
    );

    let mut delete = created;
    delete.set_meta(keys::TEST_USER_OPERATION, "delete");
    let mut deleted = run.executor.execute(delete.clone()).await?;
    deleted.clear_meta(keys::TEST_USER_OPERATION);
    info!("[PHASE: wizard] [STEP: {}] test user removed", run.step.id);

    apply_step_result(run.context.clone(), run.step, &deleted, &delete)
}

fn test_user(run: CustomExecution<'_>) -> BoxFuture<'_, Result<SessionContext>> {
    Box::pin(run_test_user(run))
}

// =========================
// Group membership
// =========================

fn membership_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![FormField::text(keys::MEMBER_SYSTEM_ID, "Member system")
        .required()
        .validated(validate_uuid)
        .prefilled(meta(ctx, keys::MEMBER_SYSTEM_ID))])
}

fn compile_membership(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    d.set_meta_opt(keys::MEMBER_SYSTEM_ID, form.get(keys::MEMBER_SYSTEM_ID));
}

// =========================
// Wizards
// =========================

/// Steps replacing the system and connector slots of the user wizard.
pub fn user_steps(ctx: &SessionContext) -> Vec<StepDescriptor> {
    vec![
        connection_step(LDAP_CONNECTION, ctx),
        certificate_step(LDAP_CERTIFICATE, ctx),
        StepDescriptor::new(LDAP_CONTAINERS, "Containers", Slot::Bespoke)
            .form_when(ctx, Precondition::SystemCreated, user_containers_form)
            .compile(compile_containers),
        StepDescriptor::new(LDAP_TEST_USER, "Test user", Slot::Bespoke)
            .help("Create and remove a throwaway account to prove write access.")
            .form_when(ctx, Precondition::SystemCreated, crate::wizard::step::empty_form)
            .custom(test_user)
            .skippable(),
    ]
}

/// Steps opening the group wizard, in place of the first four base steps.
pub fn group_steps(ctx: &SessionContext) -> Vec<StepDescriptor> {
    vec![
        connection_step(GROUP_CONNECTION, ctx),
        certificate_step(GROUP_CERTIFICATE, ctx),
        StepDescriptor::new(GROUP_CONTAINERS, "Containers", Slot::Bespoke)
            .form_when(ctx, Precondition::SystemCreated, group_containers_form)
            .compile(compile_containers),
        StepDescriptor::new(GROUP_MEMBERSHIP, "Membership", Slot::Bespoke)
            .help("System whose accounts are members of the synchronized groups.")
            .form_when(ctx, Precondition::SystemCreated, membership_form)
            .compile(compile_membership)
            .apply(apply_created_mapping),
    ]
}
