// Deterministic wizard smoke runner
//
// Drives one scripted wizard run per connector kind through a real controller and writes
// `wizard_smoke_<kind>_transcript.log` into the log folder.

use crate::executor::ConnectorExecutor;
use crate::forms::form::FormView;
use crate::models::descriptor::{keys, ConnectorDescriptor};
use crate::models::kind::ConnectorKind;
use crate::wizard::steps::ids;
use crate::wizard::{AdvanceOutcome, WizardController};
use anyhow::Result;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound on scripted actions; a run that needs more is looping.
const MAX_ACTIONS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    pub kind: ConnectorKind,
    pub finished: bool,
    pub visited: Vec<String>,
    pub transcript_path: PathBuf,
}

pub fn transcript_file_name(kind: ConnectorKind) -> String {
    format!("wizard_smoke_{}_transcript.log", kind.short_name())
}

/// Values the script types into each step's form.
fn scripted_values(kind: ConnectorKind, step_id: &str) -> Vec<(&'static str, String)> {
    let v = |k: &'static str, s: &str| (k, s.to_string());
    match step_id {
        ids::SYSTEM_NEW
        | ids::CSV_CONNECTION
        | ids::JDBC_CONNECTION
        | ids::LDAP_CONNECTION
        | ids::GROUP_CONNECTION => {
            let mut values = vec![(keys::SYSTEM_NAME, format!("smoke-{}", kind.short_name()))];
            match step_id {
                ids::CSV_CONNECTION => {
                    values.push(v(keys::CSV_PATH, "/srv/exports/identities.csv"));
                    values.push(v(keys::CSV_IDENTIFIER, "employee_id"));
                }
                ids::JDBC_CONNECTION => {
                    values.push(v(keys::HOST, "db.smoke.local"));
                    values.push(v(keys::JDBC_DATABASE, "idm"));
                    values.push(v(keys::JDBC_TABLE, "public.identities"));
                    values.push(v(keys::JDBC_KEY_COLUMN, "id"));
                    values.push(v(keys::USER, "idm_reader"));
                    values.push(v(keys::PASSWORD, "smoke-password"));
                }
                ids::LDAP_CONNECTION | ids::GROUP_CONNECTION => {
                    values.push(v(keys::HOST, "dc01.smoke.local"));
                    values.push(v(keys::USER, "CN=svc-idm,OU=Service,DC=smoke,DC=local"));
                    values.push(v(keys::PASSWORD, "smoke-password"));
                }
                _ => {}
            }
            values
        }
        ids::CONNECTOR => vec![v(keys::CONNECTOR_KEY, "net.tirasa.connid.bundles.db.table:2.2")],
        ids::SCHEMA_NEW => vec![v(keys::OBJECT_CLASS_NAME, "__ACCOUNT__")],
        ids::SCHEMA_ATTRIBUTE => vec![v(keys::ATTRIBUTE_NAME, "__NAME__")],
        ids::LDAP_CERTIFICATE | ids::GROUP_CERTIFICATE => {
            vec![v(keys::CERTIFICATE_ACCEPTED, "true")]
        }
        ids::LDAP_CONTAINERS => vec![v(keys::USER_CONTAINER, "OU=Users,DC=smoke,DC=local")],
        ids::GROUP_CONTAINERS => vec![v(keys::GROUP_CONTAINER, "OU=Groups,DC=smoke,DC=local")],
        ids::GROUP_MEMBERSHIP => vec![(keys::MEMBER_SYSTEM_ID, Uuid::new_v4().to_string())],
        ids::MAPPING => vec![v(keys::MAPPING_OPERATION_TYPE, "SYNCHRONIZATION")],
        ids::SYNC_NEW => vec![v(keys::SYNC_NAME, "smoke-sync")],
        _ => Vec::new(),
    }
}

/// Run the scripted wizard for `kind` and write its transcript under `log_dir`.
pub async fn wizard_smoke(
    kind: ConnectorKind,
    executor: Arc<dyn ConnectorExecutor>,
    log_dir: &Path,
) -> Result<SmokeReport> {
    let transcript_path = log_dir.join(transcript_file_name(kind));
    let mut transcript = String::new();
    let mut push = |line: String| {
        info!("[PHASE: smoke] {}", line);
        transcript.push_str(&line);
        transcript.push('\n');
    };

    push(format!("WIZARD_SMOKE begin kind={}", kind));
    let controller = WizardController::new(kind, ConnectorDescriptor::new(kind.as_str()), executor);
    let mut visited = Vec::new();
    let mut schema_opened = false;
    let mut failure = None;

    for _ in 0..MAX_ACTIONS {
        if controller.is_finished() {
            break;
        }
        let frame = match controller.render().await {
            Ok(frame) => frame,
            Err(e) => {
                failure = Some(format!("render failed: {}", e));
                break;
            }
        };
        let id = frame.active_id;
        visited.push(id.to_string());

        if id == ids::SCHEMA && !schema_opened {
            schema_opened = true;
            match controller.open_step(ids::SCHEMA_NEW).await {
                Ok(opened) => {
                    push(format!("STEP {} open={} opened={}", id, ids::SCHEMA_NEW, opened));
                    continue;
                }
                Err(e) => {
                    push(format!("STEP {} open={} error={}", id, ids::SCHEMA_NEW, e));
                    failure = Some(e.user_message());
                    break;
                }
            }
        }
        if id == ids::MAPPING_ATTRIBUTES {
            let skipped = controller.skip().await;
            push(format!("STEP {} skipped={}", id, skipped));
            if skipped {
                continue;
            }
        }

        let Some(mut form) = frame.form else {
            failure = Some(format!(
                "step {} is locked: {}",
                id,
                frame.locked_reason.unwrap_or_default()
            ));
            break;
        };
        for (name, value) in scripted_values(kind, id) {
            form.set(name, value);
        }
        if !form.is_form_valid() {
            failure = Some(format!("step {} form invalid: {:?}", id, form.errors()));
            break;
        }

        match controller.next(&form).await {
            Ok(outcome) => {
                push(format!("STEP {} outcome={:?}", id, outcome));
                if !outcome.committed() {
                    failure = Some(format!("step {} did not commit: {:?}", id, outcome));
                    break;
                }
                if outcome == AdvanceOutcome::Finished {
                    break;
                }
            }
            Err(e) => {
                push(format!("STEP {} error={}", id, e));
                failure = Some(e.user_message());
                break;
            }
        }
    }

    let finished = controller.is_finished();
    let ctx = controller.context().await;
    push(format!(
        "WIZARD_SMOKE end kind={} finished={} system={} mapping={} sync={}",
        kind,
        finished,
        ctx.entity.as_ref().map(|e| e.code.as_str()).unwrap_or("-"),
        ctx.mapping
            .as_ref()
            .map(|m| m.operation_type.as_str())
            .unwrap_or("-"),
        ctx.sync_config.as_ref().map(|s| s.name.as_str()).unwrap_or("-"),
    ));
    tokio::fs::write(&transcript_path, transcript).await?;

    if let Some(reason) = failure {
        error!("[PHASE: smoke] [STEP: {}] {}", kind.short_name(), reason);
        return Err(anyhow::anyhow!("Wizard smoke for {} failed: {}", kind, reason));
    }
    if !finished {
        return Err(anyhow::anyhow!(
            "Wizard smoke for {} did not finish within {} actions",
            kind,
            MAX_ACTIONS
        ));
    }

    Ok(SmokeReport {
        kind,
        finished,
        visited,
        transcript_path,
    })
}
