// JDBC connector wizard steps (PostgreSQL, MSSQL)

use super::ids::JDBC_CONNECTION;
use super::{apply_created_system, bind_system, meta, reset_primary_attribute};
use crate::forms::form::{FormData, FormField, StepForm};
use crate::forms::validation::{validate_code, validate_host, validate_port, validate_sql_identifier};
use crate::models::descriptor::{keys, ConnectorDescriptor, SystemEntity};
use crate::models::kind::ConnectorKind;
use crate::models::state::SessionContext;
use crate::wizard::step::{Slot, StepDescriptor, UiFactory};

const FIELDS: [&str; 8] = [
    keys::SYSTEM_NAME,
    keys::HOST,
    keys::PORT,
    keys::JDBC_DATABASE,
    keys::JDBC_TABLE,
    keys::JDBC_KEY_COLUMN,
    keys::USER,
    keys::PASSWORD,
];

fn connection_form(ctx: &SessionContext, default_port: u16) -> StepForm {
    let port = default_port.to_string();
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
            .prefilled(meta(ctx, keys::PORT).or(Some(port.as_str()))),
        FormField::text(keys::JDBC_DATABASE, "Database")
            .required()
            .validated(validate_code)
            .prefilled(meta(ctx, keys::JDBC_DATABASE)),
        FormField::text(keys::JDBC_TABLE, "Table")
            .required()
            .validated(validate_sql_identifier)
            .prefilled(meta(ctx, keys::JDBC_TABLE)),
        FormField::text(keys::JDBC_KEY_COLUMN, "Key column")
            .required()
            .validated(validate_sql_identifier)
            .prefilled(meta(ctx, keys::JDBC_KEY_COLUMN)),
        FormField::text(keys::USER, "User")
            .required()
            .prefilled(meta(ctx, keys::USER)),
        FormField::secret(keys::PASSWORD, "Password").required(),
    ])
}

fn postgresql_form(ctx: &SessionContext) -> StepForm {
    connection_form(ctx, ConnectorKind::Postgresql.default_port().unwrap_or(5432))
}

fn mssql_form(ctx: &SessionContext) -> StepForm {
    connection_form(ctx, ConnectorKind::Mssql.default_port().unwrap_or(1433))
}

fn compile_connection(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    reset_primary_attribute(d);
    bind_system(d, entity);
    for key in FIELDS {
        d.set_meta_opt(key, form.get(key));
    }
}

pub fn connection_step(kind: ConnectorKind, ctx: &SessionContext) -> StepDescriptor {
    let form: UiFactory = match kind {
        ConnectorKind::Mssql => mssql_form,
        _ => postgresql_form,
    };
    StepDescriptor::new(JDBC_CONNECTION, "Database", Slot::Bespoke)
        .help("Database table the system reads its records from.")
        .form(form)
        .compile(compile_connection)
        .apply(apply_created_system)
        .done(ctx.entity.is_some() && !ctx.pointer_is(JDBC_CONNECTION))
}
