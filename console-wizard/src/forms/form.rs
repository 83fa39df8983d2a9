// Headless step form model
//
// A `StepForm` is what a step's UI factory produces: an ordered list of fields with their current
// values. The console renders it, the user edits values, the protocol asks it for validity and data.

use super::validation::FieldValidator;
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat form payload handed to a step's `compile`.
pub type FormData = BTreeMap<String, String>;

/// What the step protocol needs from a rendered form.
pub trait FormView {
    fn is_form_valid(&self) -> bool;
    fn form_data(&self) -> FormData;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Secret,
    Toggle,
    Number,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: Option<String>,
    #[serde(skip)]
    pub validator: Option<FieldValidator>,
}

impl FormField {
    pub fn text(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            required: false,
            value: None,
            validator: None,
        }
    }

    pub fn secret(name: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::Secret,
            ..Self::text(name, label)
        }
    }

    pub fn toggle(name: &str, label: &str, default: bool) -> Self {
        Self {
            kind: FieldKind::Toggle,
            value: Some(default.to_string()),
            validator: Some(super::validation::validate_toggle),
            ..Self::text(name, label)
        }
    }

    pub fn number(name: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::Number,
            ..Self::text(name, label)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn validated(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Pre-fill from a known value (e.g. metadata of a reopened run).
    pub fn prefilled(mut self, value: Option<&str>) -> Self {
        if let Some(v) = value {
            self.value = Some(v.to_string());
        }
        self
    }

    fn present_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Error text for this field, if any.
    pub fn error(&self) -> Option<String> {
        match (self.present_value(), self.required) {
            (None, true) => Some(format!("{} is required", self.label)),
            (None, false) => None,
            (Some(v), _) => self
                .validator
                .and_then(|validate| validate(v).err())
                .map(|e| e.to_string()),
        }
    }

    /// Value for display; secrets are masked.
    pub fn display(&self) -> String {
        match (&self.kind, &self.value) {
            (FieldKind::Secret, Some(v)) => "*".repeat(v.chars().count()),
            (_, Some(v)) => v.clone(),
            (_, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepForm {
    pub fields: Vec<FormField>,
}

impl StepForm {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    /// Form for steps that only confirm (summary, schema list).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a field value. Returns false when the form has no such field.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = Some(value.into());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_deref())
    }

    /// Apply a batch of values; unknown names are ignored.
    pub fn fill(&mut self, values: &FormData) {
        for (name, value) in values {
            self.set(name, value.clone());
        }
    }

    /// Field name -> error text, in field order.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|f| f.error().map(|e| (f.name.clone(), e)))
            .collect()
    }
}

impl FormView for StepForm {
    fn is_form_valid(&self) -> bool {
        self.fields.iter().all(|f| f.error().is_none())
    }

    fn form_data(&self) -> FormData {
        self.fields
            .iter()
            .filter_map(|f| f.present_value().map(|v| (f.name.clone(), v.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::validation::validate_port;

    fn connection_form() -> StepForm {
        StepForm::new(vec![
            FormField::text("host", "Host").required(),
            FormField::number("port", "Port")
                .required()
                .validated(validate_port),
            FormField::secret("password", "Password"),
        ])
    }

    #[test]
    fn required_fields_gate_validity() {
        let mut form = connection_form();
        assert!(!form.is_form_valid());
        assert_eq!(form.errors().len(), 2);

        form.set("host", "ldap.local");
        form.set("port", "389");
        assert!(form.is_form_valid());
    }

    #[test]
    fn validator_runs_on_present_values_only() {
        let mut form = connection_form();
        form.set("host", "ldap.local");
        form.set("port", "not-a-port");
        let errors = form.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "port");
    }

    #[test]
    fn form_data_skips_blank_and_trims() {
        let mut form = connection_form();
        form.set("host", "  ldap.local ");
        form.set("port", "389");
        form.set("password", "   ");
        let data = form.form_data();
        assert_eq!(data.get("host").map(String::as_str), Some("ldap.local"));
        assert!(!data.contains_key("password"));
    }

    #[test]
    fn secrets_are_masked_for_display() {
        let mut form = connection_form();
        form.set("password", "hunter2");
        let field = form.fields.iter().find(|f| f.name == "password").unwrap();
        assert_eq!(field.display(), "*******");
        assert!(!form.set("nope", "x"));
    }
}
