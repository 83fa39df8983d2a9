// Connector descriptor models
// Request/response payload exchanged with the connector-type executor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// =========================
// Metadata keys
// =========================

/// Keys of the string-typed metadata bag shared with the executor.
pub mod keys {
    pub const SYSTEM_ID: &str = "systemId";
    pub const SYSTEM_NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const CONNECTOR_KEY: &str = "connectorKey";
    pub const HOST: &str = "host";
    pub const PORT: &str = "port";
    pub const SSL: &str = "ssl";
    pub const USER: &str = "user";
    pub const PASSWORD: &str = "password";
    pub const CERTIFICATE_FOUND: &str = "certificateFound";
    pub const CERTIFICATE_TRUSTED_CA: &str = "hasTrustedCa";
    pub const CERTIFICATE_FINGERPRINT: &str = "certificateFingerprint";
    pub const CERTIFICATE_ACCEPTED: &str = "certificateAccepted";
    pub const PRIMARY_ATTRIBUTE_ID: &str = "primarySchemaAttributeId";
    pub const OBJECT_CLASS_ID: &str = "objectClassId";
    pub const OBJECT_CLASS_NAME: &str = "objectClassName";
    pub const ATTRIBUTE_NAME: &str = "attributeName";
    pub const ATTRIBUTE_TYPE: &str = "attributeType";
    pub const MAPPING_OPERATION_TYPE: &str = "operationType";
    pub const MAPPING_ENTITY_TYPE: &str = "entityType";
    pub const SYNC_NAME: &str = "syncName";
    pub const SYNC_ID: &str = "syncConfigId";
    pub const USER_CONTAINER: &str = "userContainer";
    pub const DELETED_USER_CONTAINER: &str = "deletedUserContainer";
    pub const GROUP_CONTAINER: &str = "groupContainer";
    pub const MEMBER_SYSTEM_ID: &str = "memberSystemId";
    pub const TEST_USER_OPERATION: &str = "testUserOperation";
    pub const TEST_USER_DN: &str = "testUserDn";
    pub const CSV_PATH: &str = "csvPath";
    pub const CSV_SEPARATOR: &str = "separator";
    pub const CSV_IDENTIFIER: &str = "identifierAttribute";
    pub const JDBC_DATABASE: &str = "database";
    pub const JDBC_TABLE: &str = "table";
    pub const JDBC_KEY_COLUMN: &str = "keyColumn";
}

// =========================
// Embedded records
// =========================

/// Target system being provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemEntity {
    pub id: Uuid,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub connector_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Provisioning,
    Synchronization,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Provisioning => "PROVISIONING",
            OperationType::Synchronization => "SYNCHRONIZATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROVISIONING" => Some(OperationType::Provisioning),
            "SYNCHRONIZATION" => Some(OperationType::Synchronization),
            _ => None,
        }
    }
}

/// Attribute mapping of the system (provisioning or synchronization direction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRef {
    pub id: Uuid,
    pub operation_type: OperationType,
    #[serde(default)]
    pub entity_type: Option<String>,
}

/// Synchronization configuration bound to a synchronization mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfigRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedRecords {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncConfigRef>,
}

// =========================
// Descriptor
// =========================

/// Accumulating request/response payload of one wizard run.
///
/// `metadata` is an additive bag: steps add or overwrite keys, and only
/// explicitly reset the ones they own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDescriptor {
    pub id: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, rename = "wizardStepName")]
    pub current_step_name: Option<String>,
    #[serde(default)]
    pub reopened: bool,
    #[serde(default, rename = "_embedded")]
    pub embedded: EmbeddedRecords,
}

impl ConnectorDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Copy a form value into the bag when present and non-blank.
    pub fn set_meta_opt(&mut self, key: &str, value: Option<&String>) {
        if let Some(v) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
            self.metadata.insert(key.to_string(), v.to_string());
        }
    }

    pub fn clear_meta(&mut self, key: &str) {
        self.metadata.remove(key);
    }

    /// Booleans travel as "true"/"false" on the wire.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.set_meta(key, if value { "true" } else { "false" });
    }
}

/// Parse a wire boolean. Anything other than a case-insensitive
/// "true"/"false" is treated as absent.
pub fn parse_wire_bool(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" => Some(true),
        Some(v) if v == "false" => Some(false),
        _ => None,
    }
}

// =========================
// Typed facts
// =========================

/// Booleans derived from the metadata bag at ingestion time.
///
/// The builder reads these instead of string-comparing metadata values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorFacts {
    pub ssl: bool,
    pub certificate_found: bool,
    pub trusted_ca: Option<bool>,
    pub certificate_accepted: bool,
}

impl ConnectorFacts {
    pub fn ingest(metadata: &BTreeMap<String, String>) -> Self {
        let flag = |key: &str| parse_wire_bool(metadata.get(key).map(String::as_str));
        Self {
            ssl: flag(keys::SSL).unwrap_or(false),
            certificate_found: flag(keys::CERTIFICATE_FOUND).unwrap_or(false),
            trusted_ca: flag(keys::CERTIFICATE_TRUSTED_CA),
            certificate_accepted: flag(keys::CERTIFICATE_ACCEPTED).unwrap_or(false),
        }
    }

    /// Plaintext connection towards a server whose certificate no trusted
    /// authority vouches for: the run cannot continue.
    pub fn blocks_on_certificate(&self) -> bool {
        self.trusted_ca == Some(false) && !self.ssl
    }
}
