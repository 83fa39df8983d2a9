// Universal system wizard steps
//
// System -> connector -> schema (four sub-steps on one slot) -> mapping -> mapping attributes ->
// synchronization -> summary. Connector wizards reuse everything from the mapping on.

use super::ids::*;
use super::{apply_created_mapping, apply_created_system, bind_system, meta, reset_primary_attribute};
use crate::forms::form::{FormData, FormField, StepForm};
use crate::forms::validation::{validate_code, validate_operation_type};
use crate::models::descriptor::{keys, ConnectorDescriptor, OperationType, SystemEntity};
use crate::models::state::SessionContext;
use crate::wizard::step::{Precondition, Slot, StepDescriptor, Transition};

pub const NO_CONNECTOR_KEY_WARNING: &str = "Target system has no connector selected yet.";

// =========================
// System
// =========================

fn system_form(ctx: &SessionContext) -> StepForm {
    let entity = ctx.entity.as_ref();
    StepForm::new(vec![
        FormField::text(keys::SYSTEM_NAME, "Code")
            .required()
            .validated(validate_code)
            .prefilled(entity.map(|e| e.code.as_str())),
        FormField::text(keys::DESCRIPTION, "Description")
            .prefilled(entity.and_then(|e| e.description.as_deref())),
    ])
}

fn compile_system_new(d: &mut ConnectorDescriptor, form: &FormData, _entity: Option<&SystemEntity>) {
    reset_primary_attribute(d);
    d.set_meta_opt(keys::SYSTEM_NAME, form.get(keys::SYSTEM_NAME));
    d.set_meta_opt(keys::DESCRIPTION, form.get(keys::DESCRIPTION));
}

fn compile_system_detail(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    d.set_meta_opt(keys::SYSTEM_NAME, form.get(keys::SYSTEM_NAME));
    d.clear_meta(keys::DESCRIPTION);
    d.set_meta_opt(keys::DESCRIPTION, form.get(keys::DESCRIPTION));
}

/// `systemNew` until the system exists, then `systemDetail`.
///
/// `systemDetail` is done while the pointer still names `systemNew` (the create
/// just committed) and whenever the user is on another step; reopening it
/// clears the mark.
pub fn system_step(ctx: &SessionContext) -> StepDescriptor {
    match ctx.entity {
        None => StepDescriptor::new(SYSTEM_NEW, "System", Slot::System)
            .help("Create the target system the connector will manage.")
            .form(system_form)
            .compile(compile_system_new)
            .apply(apply_created_system),
        Some(_) => StepDescriptor::new(SYSTEM_DETAIL, "System", Slot::System)
            .help("Basic information about the target system.")
            .form(system_form)
            .compile(compile_system_detail)
            .apply(apply_created_system)
            .done(ctx.pointer_is(SYSTEM_NEW) || !ctx.pointer_is(SYSTEM_DETAIL)),
    }
}

// =========================
// Connector
// =========================

fn connector_form(ctx: &SessionContext) -> StepForm {
    let current = ctx.entity.as_ref().and_then(|e| e.connector_key.as_deref());
    StepForm::new(vec![FormField::text(keys::CONNECTOR_KEY, "Connector")
        .required()
        .prefilled(current.or_else(|| meta(ctx, keys::CONNECTOR_KEY)))])
}

fn compile_connector(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    d.set_meta_opt(keys::CONNECTOR_KEY, form.get(keys::CONNECTOR_KEY));
}

pub fn connector_step(ctx: &SessionContext) -> StepDescriptor {
    StepDescriptor::new(CONNECTOR, "Connector", Slot::Connector)
        .help("Pick the connector implementation and its configuration.")
        .form_when(ctx, Precondition::SystemCreated, connector_form)
        .compile(compile_connector)
        .apply(apply_created_system)
}

// =========================
// Schema (one slot, four sub-steps)
// =========================

fn has_connector_key(ctx: &SessionContext) -> bool {
    ctx.entity
        .as_ref()
        .and_then(|e| e.connector_key.as_ref())
        .is_some()
}

fn object_class_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![FormField::text(keys::OBJECT_CLASS_NAME, "Object class")
        .required()
        .prefilled(meta(ctx, keys::OBJECT_CLASS_NAME))])
}

fn attribute_form(_ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![
        FormField::text(keys::ATTRIBUTE_NAME, "Attribute").required(),
        FormField::text(keys::ATTRIBUTE_TYPE, "Class type").prefilled(Some("java.lang.String")),
    ])
}

fn compile_schema(d: &mut ConnectorDescriptor, _form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
}

fn compile_object_class(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    d.set_meta_opt(keys::OBJECT_CLASS_NAME, form.get(keys::OBJECT_CLASS_NAME));
}

fn compile_attribute(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    d.set_meta_opt(keys::ATTRIBUTE_NAME, form.get(keys::ATTRIBUTE_NAME));
    d.set_meta_opt(keys::ATTRIBUTE_TYPE, form.get(keys::ATTRIBUTE_TYPE));
}

/// The sub-step the schema slot shows, chosen by the active pointer.
pub fn schema_step(ctx: &SessionContext) -> StepDescriptor {
    let pointer = ctx.active_step_pointer.as_deref();
    let step = match pointer {
        Some(SCHEMA_NEW) => StepDescriptor::new(SCHEMA_NEW, "New object class", Slot::Schema)
            .form_when(ctx, Precondition::SystemCreated, object_class_form)
            .compile(compile_object_class)
            .then(Transition::JumpTo(SCHEMA_DETAIL)),
        Some(SCHEMA_DETAIL) => StepDescriptor::new(SCHEMA_DETAIL, "Object class", Slot::Schema)
            .form_when(ctx, Precondition::SystemCreated, object_class_form)
            .compile(compile_object_class)
            .then(Transition::JumpTo(SCHEMA)),
        Some(SCHEMA_ATTRIBUTE) => {
            StepDescriptor::new(SCHEMA_ATTRIBUTE, "Schema attribute", Slot::Schema)
                .form_when(ctx, Precondition::SystemCreated, attribute_form)
                .compile(compile_attribute)
                .then(Transition::JumpTo(SCHEMA_DETAIL))
        }
        _ => StepDescriptor::new(SCHEMA, "Schema", Slot::Schema)
            .help("Object classes and attributes the connector reads from the system.")
            .form_when(ctx, Precondition::SystemCreated, crate::wizard::step::empty_form)
            .compile(compile_schema),
    };
    step.gate(has_connector_key, NO_CONNECTOR_KEY_WARNING)
}

// =========================
// Mapping
// =========================

fn mapping_form(ctx: &SessionContext) -> StepForm {
    let current = ctx.mapping.as_ref();
    StepForm::new(vec![
        FormField::text(keys::MAPPING_OPERATION_TYPE, "Operation type")
            .required()
            .validated(validate_operation_type)
            .prefilled(Some(
                current
                    .map(|m| m.operation_type)
                    .unwrap_or(OperationType::Provisioning)
                    .as_str(),
            )),
        FormField::text(keys::MAPPING_ENTITY_TYPE, "Entity type").prefilled(Some(
            current
                .and_then(|m| m.entity_type.as_deref())
                .unwrap_or("IDENTITY"),
        )),
    ])
}

fn compile_mapping(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    if let Some(op) = form
        .get(keys::MAPPING_OPERATION_TYPE)
        .and_then(|v| OperationType::parse(v))
    {
        d.set_meta(keys::MAPPING_OPERATION_TYPE, op.as_str());
    }
    d.set_meta_opt(keys::MAPPING_ENTITY_TYPE, form.get(keys::MAPPING_ENTITY_TYPE));
}

pub fn mapping_step(ctx: &SessionContext) -> StepDescriptor {
    StepDescriptor::new(MAPPING, "Mapping", Slot::Mapping)
        .help("Direction of the data flow between the platform and the system.")
        .form_when(ctx, Precondition::SystemCreated, mapping_form)
        .compile(compile_mapping)
        .apply(apply_created_mapping)
}

fn mapping_attributes_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![FormField::text(
        keys::PRIMARY_ATTRIBUTE_ID,
        "Identifier attribute",
    )
    .prefilled(meta(ctx, keys::PRIMARY_ATTRIBUTE_ID))])
}

fn compile_mapping_attributes(
    d: &mut ConnectorDescriptor,
    form: &FormData,
    entity: Option<&SystemEntity>,
) {
    bind_system(d, entity);
    d.set_meta_opt(keys::PRIMARY_ATTRIBUTE_ID, form.get(keys::PRIMARY_ATTRIBUTE_ID));
}

pub fn mapping_attributes_step(ctx: &SessionContext) -> StepDescriptor {
    StepDescriptor::new(MAPPING_ATTRIBUTES, "Mapped attributes", Slot::MappingAttributes)
        .form_when(ctx, Precondition::MappingCreated, mapping_attributes_form)
        .compile(compile_mapping_attributes)
        .skippable()
}

// =========================
// Synchronization
// =========================

fn sync_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![FormField::text(keys::SYNC_NAME, "Synchronization name")
        .required()
        .validated(validate_code)
        .prefilled(ctx.sync_config.as_ref().map(|s| s.name.as_str()))])
}

fn compile_sync(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    bind_system(d, entity);
    d.set_meta_opt(keys::SYNC_NAME, form.get(keys::SYNC_NAME));
}

fn apply_sync(
    ctx: SessionContext,
    response: &ConnectorDescriptor,
    original: &ConnectorDescriptor,
) -> crate::error::Result<SessionContext> {
    if response.embedded.sync.is_none() && ctx.sync_config.is_none() {
        return Err(crate::error::WizardError::malformed(
            original.current_step_name.as_deref().unwrap_or_default(),
            "reply carries no synchronization record",
        ));
    }
    crate::wizard::step::absorb_response(ctx, response, original)
}

/// Present only for synchronization mappings: `syncNew` until a sync config
/// exists, then `syncDetail` in the same position.
pub fn sync_step(ctx: &SessionContext) -> Option<StepDescriptor> {
    if !ctx.is_synchronization() {
        return None;
    }
    let step = match ctx.sync_config {
        None => StepDescriptor::new(SYNC_NEW, "Synchronization", Slot::Sync).skippable(),
        Some(_) => StepDescriptor::new(SYNC_DETAIL, "Synchronization", Slot::Sync),
    };
    Some(
        step.form_when(ctx, Precondition::MappingCreated, sync_form)
            .compile(compile_sync)
            .apply(apply_sync),
    )
}

// =========================
// Summary
// =========================

pub fn summary_step(ctx: &SessionContext) -> StepDescriptor {
    StepDescriptor::new(SUMMARY, "Summary", Slot::Summary)
        .help("Review the configured system and close the wizard.")
        .form_when(ctx, Precondition::SystemCreated, crate::wizard::step::empty_form)
        .compile(compile_schema)
        .then(Transition::Finish)
}
