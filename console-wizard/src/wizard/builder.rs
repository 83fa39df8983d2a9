// Step graph builder
//
// `build_steps` is a pure function of the connector kind and the session context. The host calls
// it on every render; nothing caches or edits a previously built graph.

use super::connectors;
use super::graph::StepGraph;
use super::steps::universal;
use crate::models::kind::ConnectorKind;
use crate::models::state::SessionContext;

/// `[system, connector, schema, mapping, mappingAttributes, sync?, summary]`
pub fn universal_graph(ctx: &SessionContext) -> StepGraph {
    let mut steps = vec![
        universal::system_step(ctx),
        universal::connector_step(ctx),
        universal::schema_step(ctx),
        universal::mapping_step(ctx),
        universal::mapping_attributes_step(ctx),
    ];
    steps.extend(universal::sync_step(ctx));
    steps.push(universal::summary_step(ctx));
    StepGraph::new(steps)
}

pub fn build_steps(kind: ConnectorKind, ctx: &SessionContext) -> StepGraph {
    let base = universal_graph(ctx);
    match kind {
        ConnectorKind::Universal => base,
        ConnectorKind::Csv => connectors::csv_graph(base, ctx),
        ConnectorKind::Postgresql | ConnectorKind::Mssql => connectors::jdbc_graph(kind, base, ctx),
        ConnectorKind::Ldap => connectors::ldap_graph(base, ctx),
        ConnectorKind::LdapGroup => connectors::ldap_group_graph(base, ctx),
    }
}
