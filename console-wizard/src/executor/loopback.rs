// Loopback executor
//
// Deterministic in-process stand-in for the connector-type executor. Used by the smoke runner
// (`--wizard-smoke`) and integration tests, so a full wizard run can be proven without a server.

use super::{ConnectorExecutor, DetailSaveClient};
use crate::error::ExecutorError;
use crate::forms::form::FormData;
use crate::models::descriptor::{
    keys, parse_wire_bool, ConnectorDescriptor, MappingRef, OperationType, SyncConfigRef,
    SystemEntity,
};
use crate::wizard::steps::ids;
use async_trait::async_trait;
use log::info;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Host name suffix the loopback treats as presenting a self-signed certificate.
pub const SELF_SIGNED_SUFFIX: &str = ".selfsigned";

#[derive(Debug, Clone)]
struct StoredSystem {
    entity: SystemEntity,
    mapping: Option<MappingRef>,
    sync: Option<SyncConfigRef>,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct LoopbackExecutor {
    systems: Mutex<HashMap<Uuid, StoredSystem>>,
    failing_steps: HashSet<String>,
    calls: AtomicU32,
}

impl LoopbackExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loopback that rejects every call for the given step.
    pub fn failing_on(step: &str) -> Self {
        let mut failing_steps = HashSet::new();
        failing_steps.insert(step.to_string());
        Self {
            failing_steps,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn reject(message: impl Into<String>) -> ExecutorError {
        ExecutorError::Rejected {
            status: 400,
            message: message.into(),
        }
    }

    fn require_system(d: &ConnectorDescriptor) -> Result<SystemEntity, ExecutorError> {
        d.embedded
            .system
            .clone()
            .ok_or_else(|| Self::reject("System has not been created yet"))
    }

    async fn remember(&self, d: &ConnectorDescriptor) {
        if let Some(system) = &d.embedded.system {
            self.systems.lock().await.insert(
                system.id,
                StoredSystem {
                    entity: system.clone(),
                    mapping: d.embedded.mapping.clone(),
                    sync: d.embedded.sync.clone(),
                    metadata: d.metadata.clone(),
                },
            );
        }
    }
}

/// Stable pseudo fingerprint of a host's certificate.
fn fingerprint(host: &str) -> String {
    let mut acc: u64 = 0xcbf2_9ce4_8422_2325;
    for b in host.bytes() {
        acc ^= u64::from(b);
        acc = acc.wrapping_mul(0x0100_0000_01b3);
    }
    let hex = format!("{:016X}", acc);
    hex.as_bytes()
        .chunks(2)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

fn probe_certificate(d: &mut ConnectorDescriptor) {
    let Some(host) = d.meta(keys::HOST).map(str::to_string) else {
        return;
    };
    let accepted = parse_wire_bool(d.meta(keys::CERTIFICATE_ACCEPTED)).unwrap_or(false);
    let trusted = accepted || !host.ends_with(SELF_SIGNED_SUFFIX);
    d.set_flag(keys::CERTIFICATE_FOUND, true);
    d.set_flag(keys::CERTIFICATE_TRUSTED_CA, trusted);
    d.set_meta(keys::CERTIFICATE_FINGERPRINT, fingerprint(&host));
}

fn connector_key_for(kind_id: &str) -> String {
    format!("{}:default", kind_id)
}

#[async_trait]
impl ConnectorExecutor for LoopbackExecutor {
    async fn execute(
        &self,
        descriptor: ConnectorDescriptor,
    ) -> Result<ConnectorDescriptor, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = descriptor.current_step_name.clone().unwrap_or_default();
        if self.failing_steps.contains(&step) {
            return Err(ExecutorError::Rejected {
                status: 500,
                message: format!("Step '{}' failed on the server", step),
            });
        }

        let mut d = descriptor;
        match step.as_str() {
            s if ids::CONNECTION_STEPS.contains(&s) => {
                let code = d
                    .meta(keys::SYSTEM_NAME)
                    .map(str::to_string)
                    .ok_or_else(|| Self::reject("System name is required"))?;
                let existing = d.embedded.system.clone();
                let bespoke = s != ids::SYSTEM_NEW;
                let entity = SystemEntity {
                    id: existing.as_ref().map(|e| e.id).unwrap_or_else(Uuid::new_v4),
                    code,
                    description: d.meta(keys::DESCRIPTION).map(str::to_string),
                    connector_key: if bespoke {
                        Some(connector_key_for(&d.id))
                    } else {
                        existing.and_then(|e| e.connector_key)
                    },
                };
                d.set_meta(keys::SYSTEM_ID, entity.id.to_string());
                d.embedded.system = Some(entity);
                probe_certificate(&mut d);
            }
            ids::SYSTEM_DETAIL => {
                let mut entity = Self::require_system(&d)?;
                if let Some(code) = d.meta(keys::SYSTEM_NAME) {
                    entity.code = code.to_string();
                }
                entity.description = d.meta(keys::DESCRIPTION).map(str::to_string);
                d.embedded.system = Some(entity);
            }
            ids::CONNECTOR => {
                let mut entity = Self::require_system(&d)?;
                let key = d
                    .meta(keys::CONNECTOR_KEY)
                    .map(str::to_string)
                    .ok_or_else(|| Self::reject("Connector key is required"))?;
                entity.connector_key = Some(key);
                d.embedded.system = Some(entity);
            }
            ids::SCHEMA | ids::SCHEMA_DETAIL | ids::SCHEMA_ATTRIBUTE => {
                Self::require_system(&d)?;
            }
            ids::SCHEMA_NEW => {
                Self::require_system(&d)?;
                d.set_meta(keys::OBJECT_CLASS_ID, Uuid::new_v4().to_string());
            }
            ids::LDAP_CERTIFICATE | ids::GROUP_CERTIFICATE => {
                Self::require_system(&d)?;
                probe_certificate(&mut d);
            }
            ids::LDAP_CONTAINERS | ids::GROUP_CONTAINERS => {
                Self::require_system(&d)?;
            }
            ids::LDAP_TEST_USER => {
                Self::require_system(&d)?;
                match d.meta(keys::TEST_USER_OPERATION).map(str::to_string).as_deref() {
                    Some("create") => {
                        let container = d
                            .meta(keys::USER_CONTAINER)
                            .map(str::to_string)
                            .ok_or_else(|| Self::reject("User container is not configured"))?;
                        d.set_meta(keys::TEST_USER_DN, format!("CN=idm-test-user,{}", container));
                    }
                    Some("delete") => {
                        if d.meta(keys::TEST_USER_DN).is_none() {
                            return Err(Self::reject("No test user to delete"));
                        }
                    }
                    _ => return Err(Self::reject("Unknown test user operation")),
                }
            }
            ids::MAPPING => {
                Self::require_system(&d)?;
                let operation_type = d
                    .meta(keys::MAPPING_OPERATION_TYPE)
                    .and_then(OperationType::parse)
                    .ok_or_else(|| Self::reject("Operation type is required"))?;
                let id = d.embedded.mapping.as_ref().map(|m| m.id).unwrap_or_else(Uuid::new_v4);
                d.embedded.mapping = Some(MappingRef {
                    id,
                    operation_type,
                    entity_type: d.meta(keys::MAPPING_ENTITY_TYPE).map(str::to_string),
                });
            }
            ids::GROUP_MEMBERSHIP => {
                Self::require_system(&d)?;
                if d.meta(keys::MEMBER_SYSTEM_ID).is_none() {
                    return Err(Self::reject("Member system is required"));
                }
                d.embedded.mapping = Some(MappingRef {
                    id: Uuid::new_v4(),
                    operation_type: OperationType::Synchronization,
                    entity_type: Some("ROLE".to_string()),
                });
            }
            ids::MAPPING_ATTRIBUTES => {
                Self::require_system(&d)?;
                if d.embedded.mapping.is_none() {
                    return Err(Self::reject("Mapping has not been created yet"));
                }
            }
            ids::SYNC_NEW | ids::SYNC_DETAIL => {
                Self::require_system(&d)?;
                let name = d
                    .meta(keys::SYNC_NAME)
                    .map(str::to_string)
                    .ok_or_else(|| Self::reject("Synchronization name is required"))?;
                let id = d.embedded.sync.as_ref().map(|s| s.id).unwrap_or_else(Uuid::new_v4);
                d.set_meta(keys::SYNC_ID, id.to_string());
                d.embedded.sync = Some(SyncConfigRef { id, name });
            }
            ids::SUMMARY => {
                Self::require_system(&d)?;
            }
            other => return Err(Self::reject(format!("Unknown wizard step '{}'", other))),
        }

        self.remember(&d).await;
        info!(
            "[PHASE: loopback] [STEP: {}] executed (descriptor={})",
            step, d.id
        );
        Ok(d)
    }

    async fn load(
        &self,
        descriptor: ConnectorDescriptor,
    ) -> Result<ConnectorDescriptor, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = descriptor
            .meta(keys::SYSTEM_ID)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| Self::reject("System id is required"))?;

        let systems = self.systems.lock().await;
        let stored = systems.get(&id).ok_or(ExecutorError::Rejected {
            status: 404,
            message: format!("System {} not found", id),
        })?;

        let mut d = descriptor;
        d.reopened = true;
        for (k, v) in &stored.metadata {
            d.metadata.entry(k.clone()).or_insert_with(|| v.clone());
        }
        d.embedded.system = Some(stored.entity.clone());
        d.embedded.mapping = stored.mapping.clone();
        d.embedded.sync = stored.sync.clone();
        Ok(d)
    }
}

#[async_trait]
impl DetailSaveClient for LoopbackExecutor {
    async fn save(&self, _resource: &str, payload: FormData) -> Result<FormData, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(kind: &str, step: &str) -> ConnectorDescriptor {
        let mut d = ConnectorDescriptor::new(kind);
        d.current_step_name = Some(step.to_string());
        d
    }

    #[tokio::test]
    async fn connection_step_creates_system_and_probes_certificate() {
        let exec = LoopbackExecutor::new();
        let mut d = step("ad-connector-type", ids::LDAP_CONNECTION);
        d.set_meta(keys::SYSTEM_NAME, "corp-ad");
        d.set_meta(keys::HOST, "dc01.corp.selfsigned");

        let out = exec.execute(d).await.unwrap();

        let system = out.embedded.system.clone().unwrap();
        assert_eq!(system.code, "corp-ad");
        assert_eq!(system.connector_key.as_deref(), Some("ad-connector-type:default"));
        assert_eq!(out.meta(keys::CERTIFICATE_TRUSTED_CA), Some("false"));
        assert_eq!(out.meta(keys::CERTIFICATE_FINGERPRINT).unwrap().len(), 23);
        assert_eq!(exec.calls(), 1);
    }

    #[tokio::test]
    async fn steps_after_connection_require_a_system() {
        let exec = LoopbackExecutor::new();
        let err = exec.execute(step("universal-system", ids::MAPPING)).await;
        assert!(matches!(err, Err(ExecutorError::Rejected { status: 400, .. })));
    }

    #[tokio::test]
    async fn load_returns_remembered_system_as_reopened() {
        let exec = LoopbackExecutor::new();
        let mut d = step("universal-system", ids::SYSTEM_NEW);
        d.set_meta(keys::SYSTEM_NAME, "hr");
        let created = exec.execute(d).await.unwrap();
        let id = created.embedded.system.as_ref().unwrap().id;

        let mut request = ConnectorDescriptor::new("universal-system");
        request.set_meta(keys::SYSTEM_ID, id.to_string());
        let loaded = exec.load(request).await.unwrap();

        assert!(loaded.reopened);
        assert_eq!(loaded.embedded.system.unwrap().code, "hr");
    }

    #[tokio::test]
    async fn failing_step_is_rejected() {
        let exec = LoopbackExecutor::failing_on(ids::SYSTEM_NEW);
        let mut d = step("universal-system", ids::SYSTEM_NEW);
        d.set_meta(keys::SYSTEM_NAME, "hr");
        assert!(exec.execute(d).await.is_err());
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint("ldap.local"), fingerprint("ldap.local"));
        assert_ne!(fingerprint("ldap.local"), fingerprint("ldap.remote"));
    }
}
