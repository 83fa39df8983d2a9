// Connector-specific wizards
//
// Each connector wizard is the universal graph run through a few declarative transforms.

use super::graph::StepGraph;
use super::step::Slot;
use super::steps::{csv, jdbc, ldap};
use crate::models::kind::ConnectorKind;
use crate::models::state::SessionContext;

/// Number of base steps the group wizard replaces: system, connector, schema, mapping.
pub const GROUP_REPLACED_BASE_STEPS: usize = 4;

/// One CSV connection step instead of system + connector; no schema.
pub fn csv_graph(base: StepGraph, ctx: &SessionContext) -> StepGraph {
    base.replace_slots(Slot::System, Slot::Connector, vec![csv::connection_step(ctx)])
        .remove_slot(Slot::Schema)
}

/// One database connection step instead of system + connector; no schema.
pub fn jdbc_graph(kind: ConnectorKind, base: StepGraph, ctx: &SessionContext) -> StepGraph {
    base.replace_slots(
        Slot::System,
        Slot::Connector,
        vec![jdbc::connection_step(kind, ctx)],
    )
    .remove_slot(Slot::Schema)
}

/// Connection, certificate, containers and test user instead of system + connector; no schema.
pub fn ldap_graph(base: StepGraph, ctx: &SessionContext) -> StepGraph {
    base.replace_slots(Slot::System, Slot::Connector, ldap::user_steps(ctx))
        .remove_slot(Slot::Schema)
}

/// The first four base steps give way to the group steps; the rest is re-appended.
pub fn ldap_group_graph(base: StepGraph, ctx: &SessionContext) -> StepGraph {
    base.replace_at(0, GROUP_REPLACED_BASE_STEPS, ldap::group_steps(ctx))
}
