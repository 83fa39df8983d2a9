// Ordered sub-form validation gate
//
// Detail screens built from several independently scoped sub-forms (tabs) validate them in a fixed
// priority order before a single save request goes out. The first invalid tab takes focus and the
// save is abandoned.

use super::form::{FormData, FormField, FormView, StepForm};
use super::validation::validate_code;
use crate::error::Result;
use crate::executor::DetailSaveClient;
use crate::models::descriptor::SyncConfigRef;
use log::{debug, info};

#[derive(Debug, Clone)]
pub struct GateTab<F = StepForm> {
    pub key: String,
    pub label: String,
    pub form: F,
}

impl<F> GateTab<F> {
    pub fn new(key: &str, label: &str, form: F) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            form,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Tab at `index` failed validation and now has focus; nothing was sent.
    Blocked { index: usize, key: String },
    /// All tabs valid; the merged payload was saved and this is the server echo.
    Saved(FormData),
}

#[derive(Debug, Clone)]
pub struct OrderedFormGate<F = StepForm> {
    resource: String,
    tabs: Vec<GateTab<F>>,
    active: usize,
}

impl<F: FormView> OrderedFormGate<F> {
    /// `tabs` are validated in the given order.
    pub fn new(resource: impl Into<String>, tabs: Vec<GateTab<F>>) -> Self {
        Self {
            resource: resource.into(),
            tabs,
            active: 0,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn tabs(&self) -> &[GateTab<F>] {
        &self.tabs
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_tab(&self) -> Option<&GateTab<F>> {
        self.tabs.get(self.active)
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.tabs.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    pub fn form_mut(&mut self, key: &str) -> Option<&mut F> {
        self.tabs
            .iter_mut()
            .find(|t| t.key == key)
            .map(|t| &mut t.form)
    }

    pub fn first_invalid(&self) -> Option<usize> {
        self.tabs.iter().position(|t| !t.form.is_form_valid())
    }

    /// Data of all tabs in priority order; a later tab overrides an earlier key.
    pub fn merged_payload(&self) -> FormData {
        let mut merged = FormData::new();
        for tab in &self.tabs {
            for (k, v) in tab.form.form_data() {
                if merged.insert(k.clone(), v).is_some() {
                    debug!(
                        "[PHASE: detail] [STEP: merge] Tab '{}' overrides key '{}'",
                        tab.key, k
                    );
                }
            }
        }
        merged
    }

    /// Validate every tab in order, then issue exactly one save request.
    pub async fn save(&mut self, client: &dyn DetailSaveClient) -> Result<GateOutcome> {
        if let Some(index) = self.first_invalid() {
            self.active = index;
            let key = self.tabs[index].key.clone();
            info!(
                "[PHASE: detail] [STEP: validate] Tab '{}' is invalid; save blocked (resource={})",
                key, self.resource
            );
            return Ok(GateOutcome::Blocked { index, key });
        }

        let payload = self.merged_payload();
        let saved = client.save(&self.resource, payload).await?;
        info!(
            "[PHASE: detail] [STEP: save] Saved {} ({} fields)",
            self.resource,
            saved.len()
        );
        Ok(GateOutcome::Saved(saved))
    }
}

/// Detail screen of a synchronization configuration: basic, type-specific and
/// filter tabs, validated in that order.
pub fn sync_config_gate(sync: &SyncConfigRef) -> OrderedFormGate {
    let basic = StepForm::new(vec![
        FormField::text("name", "Name")
            .required()
            .validated(validate_code)
            .prefilled(Some(sync.name.as_str())),
        FormField::toggle("enabled", "Enabled", true),
        FormField::toggle("reconciliation", "Reconciliation", false),
    ]);
    let specific = StepForm::new(vec![
        FormField::text("correlationAttribute", "Correlation attribute").required(),
        FormField::text("defaultRole", "Default role"),
        FormField::toggle("inactiveOwnerBehavior", "Link inactive owners", false),
    ]);
    let filter = StepForm::new(vec![
        FormField::text("filterAttribute", "Filter attribute"),
        FormField::text("tokenAttribute", "Token attribute"),
        FormField::toggle("customFilter", "Custom filter", false),
    ]);

    OrderedFormGate::new(
        format!("system-synchronization-configs/{}", sync.id),
        vec![
            GateTab::new("basic", "Basic configuration", basic),
            GateTab::new("specific", "Type-specific configuration", specific),
            GateTab::new("filter", "Filter configuration", filter),
        ],
    )
}
