// End-to-end wizard runs against the loopback executor.

use console_wizard::executor::LoopbackExecutor;
use console_wizard::forms::form::FormView;
use console_wizard::models::descriptor::{keys, ConnectorDescriptor, OperationType};
use console_wizard::models::kind::ConnectorKind;
use console_wizard::wizard::steps::ids;
use console_wizard::wizard::{AdvanceOutcome, WizardController};
use std::sync::Arc;

fn wizard(kind: ConnectorKind) -> (WizardController, Arc<LoopbackExecutor>) {
    let exec = Arc::new(LoopbackExecutor::new());
    let c = WizardController::new(kind, ConnectorDescriptor::new(kind.as_str()), exec.clone());
    (c, exec)
}

async fn submit(c: &WizardController, values: &[(&str, &str)]) -> AdvanceOutcome {
    let mut form = c
        .render()
        .await
        .unwrap()
        .form
        .expect("active step should be unlocked");
    for (name, value) in values {
        assert!(form.set(name, *value), "form has no field {name}");
    }
    c.next(&form).await.unwrap()
}

async fn active(c: &WizardController) -> &'static str {
    c.render().await.unwrap().active_id
}

const LDAP_CONNECTION_VALUES: [(&str, &str); 3] = [
    (keys::SYSTEM_NAME, "corp-ad"),
    (keys::HOST, "dc01.corp.selfsigned"),
    (keys::USER, "CN=svc-idm,OU=Service,DC=corp,DC=local"),
];

#[tokio::test]
async fn universal_wizard_runs_to_summary_with_synchronization() {
    let (c, _) = wizard(ConnectorKind::Universal);

    assert_eq!(submit(&c, &[(keys::SYSTEM_NAME, "hr")]).await, AdvanceOutcome::Advanced);
    assert_eq!(
        submit(&c, &[(keys::CONNECTOR_KEY, "net.tirasa.connid.bundles.csv:0.8")]).await,
        AdvanceOutcome::Advanced
    );
    assert_eq!(active(&c).await, ids::SCHEMA);
    assert_eq!(submit(&c, &[]).await, AdvanceOutcome::Advanced);
    assert_eq!(active(&c).await, ids::MAPPING);

    let outcome = submit(&c, &[(keys::MAPPING_OPERATION_TYPE, "SYNCHRONIZATION")]).await;
    assert_eq!(outcome, AdvanceOutcome::Advanced);
    assert!(c.context().await.is_synchronization());

    assert_eq!(active(&c).await, ids::MAPPING_ATTRIBUTES);
    assert!(c.skip().await);
    assert_eq!(active(&c).await, ids::SYNC_NEW);
    assert_eq!(submit(&c, &[(keys::SYNC_NAME, "hr-nightly")]).await, AdvanceOutcome::Advanced);

    assert_eq!(active(&c).await, ids::SUMMARY);
    assert_eq!(submit(&c, &[]).await, AdvanceOutcome::Finished);
    assert!(c.is_finished());
    assert!(c.session().is_closed());

    let ctx = c.context().await;
    assert_eq!(ctx.entity.map(|e| e.code), Some("hr".to_string()));
    assert_eq!(ctx.sync_config.map(|s| s.name), Some("hr-nightly".to_string()));
}

#[tokio::test]
async fn untrusted_certificate_over_plaintext_blocks_until_ssl_is_enabled() {
    let (c, _) = wizard(ConnectorKind::Ldap);

    let mut values = LDAP_CONNECTION_VALUES.to_vec();
    values.push((keys::PASSWORD, "bind-password"));
    assert_eq!(submit(&c, &values).await, AdvanceOutcome::Advanced);

    let frame = c.render().await.unwrap();
    assert_eq!(frame.active_id, ids::LDAP_CERTIFICATE);
    assert!(frame.steps[frame.active_index].terminal);
    assert!(frame.hides_finish);
    assert_eq!(submit(&c, &[]).await, AdvanceOutcome::Terminal);

    // Back to the connection step, switch to SSL and commit again.
    assert!(c.back().await);
    assert_eq!(active(&c).await, ids::LDAP_CONNECTION);
    let system_id = c.context().await.entity.map(|e| e.id);
    assert_eq!(
        submit(
            &c,
            &[
                (keys::SSL, "true"),
                (keys::PORT, "636"),
                (keys::PASSWORD, "bind-password")
            ]
        )
        .await,
        AdvanceOutcome::Advanced
    );
    assert_eq!(c.context().await.entity.map(|e| e.id), system_id);

    let frame = c.render().await.unwrap();
    assert_eq!(frame.active_id, ids::LDAP_CERTIFICATE);
    assert!(!frame.steps[frame.active_index].terminal);
    assert_eq!(
        submit(&c, &[(keys::CERTIFICATE_ACCEPTED, "true")]).await,
        AdvanceOutcome::Advanced
    );
    assert_eq!(active(&c).await, ids::LDAP_CONTAINERS);
}

#[tokio::test]
async fn ldap_test_user_makes_two_executor_calls() {
    let (c, exec) = wizard(ConnectorKind::Ldap);

    let mut values = LDAP_CONNECTION_VALUES.to_vec();
    values[1] = (keys::HOST, "dc01.corp.local");
    values.push((keys::PASSWORD, "bind-password"));
    submit(&c, &values).await;
    submit(&c, &[]).await;
    submit(&c, &[(keys::USER_CONTAINER, "OU=Users,DC=corp,DC=local")]).await;
    assert_eq!(active(&c).await, ids::LDAP_TEST_USER);

    let before = exec.calls();
    assert_eq!(submit(&c, &[]).await, AdvanceOutcome::Advanced);
    assert_eq!(exec.calls(), before + 2);
    assert_eq!(active(&c).await, ids::MAPPING);

    let ctx = c.context().await;
    let descriptor = ctx.connector_descriptor.unwrap();
    assert!(descriptor.meta(keys::TEST_USER_OPERATION).is_none());
}

#[tokio::test]
async fn csv_wizard_skips_schema_and_sync() {
    let (c, _) = wizard(ConnectorKind::Csv);
    let frame = c.render().await.unwrap();
    let step_ids: Vec<&str> = frame.steps.iter().map(|s| s.id).collect();
    assert_eq!(
        step_ids,
        vec![
            ids::CSV_CONNECTION,
            ids::MAPPING,
            ids::MAPPING_ATTRIBUTES,
            ids::SUMMARY
        ]
    );
    let form = frame.form.unwrap();
    assert_eq!(form.get(keys::CSV_SEPARATOR), Some(","));
    assert!(!form.is_form_valid());

    submit(
        &c,
        &[
            (keys::SYSTEM_NAME, "hr-export"),
            (keys::CSV_PATH, "/srv/exports/hr.csv"),
            (keys::CSV_IDENTIFIER, "employee_id"),
        ],
    )
    .await;
    assert_eq!(submit(&c, &[]).await, AdvanceOutcome::Advanced);
    let mapping = c.context().await.mapping.unwrap();
    assert_eq!(mapping.operation_type, OperationType::Provisioning);

    assert_eq!(submit(&c, &[]).await, AdvanceOutcome::Advanced);
    assert_eq!(active(&c).await, ids::SUMMARY);
    assert_eq!(submit(&c, &[]).await, AdvanceOutcome::Finished);
}

#[tokio::test]
async fn rejected_step_leaves_the_session_untouched() {
    let exec = Arc::new(LoopbackExecutor::failing_on(ids::MAPPING));
    let c = WizardController::new(
        ConnectorKind::Csv,
        ConnectorDescriptor::new(ConnectorKind::Csv.as_str()),
        exec.clone(),
    );
    submit(
        &c,
        &[
            (keys::SYSTEM_NAME, "hr-export"),
            (keys::CSV_PATH, "/srv/exports/hr.csv"),
            (keys::CSV_IDENTIFIER, "employee_id"),
        ],
    )
    .await;
    let before = c.context().await;

    let form = c.render().await.unwrap().form.unwrap();
    let err = c.next(&form).await.unwrap_err();
    assert!(err.user_message().contains("failed on the server"));
    assert_eq!(c.context().await, before);
    assert_eq!(active(&c).await, ids::MAPPING);
    assert!(!c.session().is_busy());
}

#[tokio::test]
async fn reopened_wizard_keeps_created_records() {
    let (c, exec) = wizard(ConnectorKind::Universal);
    submit(&c, &[(keys::SYSTEM_NAME, "hr")]).await;
    let id = c.context().await.entity.unwrap().id;
    c.close();

    let reopened = WizardController::reopen(ConnectorKind::Universal, id, exec)
        .await
        .unwrap();
    let frame = reopened.render().await.unwrap();
    assert_eq!(frame.active_id, ids::SYSTEM_DETAIL);
    assert_eq!(
        frame.form.unwrap().get(keys::SYSTEM_NAME),
        Some("hr"),
        "detail form is prefilled from the loaded system"
    );
}
