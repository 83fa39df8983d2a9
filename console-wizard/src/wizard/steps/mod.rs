// Step catalog
//
// Form factories, compile functions and reducers of every step, grouped by the wizards that use
// them. The builder wires these named functions into `StepDescriptor` records.

pub mod csv;
pub mod ids;
pub mod jdbc;
pub mod ldap;
pub mod universal;

use crate::error::{Result, WizardError};
use crate::models::descriptor::{keys, ConnectorDescriptor, SystemEntity};
use crate::models::state::SessionContext;
use crate::wizard::step::absorb_response;

/// Metadata value held in the session's descriptor.
pub(crate) fn meta<'a>(ctx: &'a SessionContext, key: &str) -> Option<&'a str> {
    ctx.connector_descriptor.as_ref().and_then(|d| d.meta(key))
}

/// Bind the request to the created system.
pub(crate) fn bind_system(d: &mut ConnectorDescriptor, entity: Option<&SystemEntity>) {
    if let Some(e) = entity {
        d.set_meta(keys::SYSTEM_ID, e.id.to_string());
        d.embedded.system = Some(e.clone());
    }
}

/// A fresh run must not inherit the primary attribute of an earlier one.
pub(crate) fn reset_primary_attribute(d: &mut ConnectorDescriptor) {
    if !d.reopened {
        d.clear_meta(keys::PRIMARY_ATTRIBUTE_ID);
    }
}

/// Reducer of the steps that create the system: the reply must embed it.
pub fn apply_created_system(
    ctx: SessionContext,
    response: &ConnectorDescriptor,
    original: &ConnectorDescriptor,
) -> Result<SessionContext> {
    if response.embedded.system.is_none() {
        return Err(WizardError::malformed(
            original.current_step_name.as_deref().unwrap_or_default(),
            "reply carries no system record",
        ));
    }
    absorb_response(ctx, response, original)
}

/// Reducer of the steps that create a mapping.
pub fn apply_created_mapping(
    ctx: SessionContext,
    response: &ConnectorDescriptor,
    original: &ConnectorDescriptor,
) -> Result<SessionContext> {
    if response.embedded.mapping.is_none() {
        return Err(WizardError::malformed(
            original.current_step_name.as_deref().unwrap_or_default(),
            "reply carries no mapping record",
        ));
    }
    absorb_response(ctx, response, original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn created_system_reply_must_embed_the_system() {
        let mut original = ConnectorDescriptor::new("universal-system");
        original.current_step_name = Some(ids::SYSTEM_NEW.to_string());

        let err = apply_created_system(SessionContext::default(), &original, &original);
        assert!(matches!(err, Err(WizardError::MalformedResponse { .. })));

        let mut response = original.clone();
        response.embedded.system = Some(SystemEntity {
            id: Uuid::new_v4(),
            code: "hr".to_string(),
            description: None,
            connector_key: None,
        });
        let ctx = apply_created_system(SessionContext::default(), &response, &original).unwrap();
        assert_eq!(ctx.entity.map(|e| e.code), Some("hr".to_string()));
    }

    #[test]
    fn primary_attribute_survives_only_reopened_runs() {
        let mut d = ConnectorDescriptor::new("universal-system");
        d.set_meta(keys::PRIMARY_ATTRIBUTE_ID, "attr-1");
        d.reopened = true;
        reset_primary_attribute(&mut d);
        assert_eq!(d.meta(keys::PRIMARY_ATTRIBUTE_ID), Some("attr-1"));

        d.reopened = false;
        reset_primary_attribute(&mut d);
        assert_eq!(d.meta(keys::PRIMARY_ATTRIBUTE_ID), None);
    }
}
