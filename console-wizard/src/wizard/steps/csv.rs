// CSV connector wizard steps

use super::ids::CSV_CONNECTION;
use super::{apply_created_system, bind_system, meta, reset_primary_attribute};
use crate::forms::form::{FormData, FormField, StepForm};
use crate::forms::validation::{validate_code, validate_csv_path, validate_separator};
use crate::models::descriptor::{keys, ConnectorDescriptor, SystemEntity};
use crate::models::state::SessionContext;
use crate::wizard::step::{Slot, StepDescriptor};

fn connection_form(ctx: &SessionContext) -> StepForm {
    StepForm::new(vec![
        FormField::text(keys::SYSTEM_NAME, "Code")
            .required()
            .validated(validate_code)
            .prefilled(ctx.entity.as_ref().map(|e| e.code.as_str())),
        FormField::text(keys::CSV_PATH, "File path")
            .required()
            .validated(validate_csv_path)
            .prefilled(meta(ctx, keys::CSV_PATH)),
        FormField::text(keys::CSV_SEPARATOR, "Separator")
            .required()
            .validated(validate_separator)
            .prefilled(meta(ctx, keys::CSV_SEPARATOR).or(Some(","))),
        FormField::text(keys::CSV_IDENTIFIER, "Identifier column")
            .required()
            .prefilled(meta(ctx, keys::CSV_IDENTIFIER)),
    ])
}

fn compile_connection(d: &mut ConnectorDescriptor, form: &FormData, entity: Option<&SystemEntity>) {
    reset_primary_attribute(d);
    bind_system(d, entity);
    for key in [
        keys::SYSTEM_NAME,
        keys::CSV_PATH,
        keys::CSV_SEPARATOR,
        keys::CSV_IDENTIFIER,
    ] {
        d.set_meta_opt(key, form.get(key));
    }
}

/// Creates the system, its connector configuration and the schema in one call.
pub fn connection_step(ctx: &SessionContext) -> StepDescriptor {
    StepDescriptor::new(CSV_CONNECTION, "CSV file", Slot::Bespoke)
        .help("Location and shape of the CSV export the system is read from.")
        .form(connection_form)
        .compile(compile_connection)
        .apply(apply_created_system)
        .done(ctx.entity.is_some() && !ctx.pointer_is(CSV_CONNECTION))
}
