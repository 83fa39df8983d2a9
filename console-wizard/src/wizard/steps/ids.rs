// Step identifiers, unique within each connector kind's graph.

pub const SYSTEM_NEW: &str = "systemNew";
pub const SYSTEM_DETAIL: &str = "systemDetail";
pub const CONNECTOR: &str = "connector";
pub const SCHEMA: &str = "schema";
pub const SCHEMA_NEW: &str = "schemaNew";
pub const SCHEMA_DETAIL: &str = "schemaDetail";
pub const SCHEMA_ATTRIBUTE: &str = "schemaAttribute";
pub const MAPPING: &str = "mapping";
pub const MAPPING_ATTRIBUTES: &str = "mappingAttributes";
pub const SYNC_NEW: &str = "syncNew";
pub const SYNC_DETAIL: &str = "syncDetail";
pub const SUMMARY: &str = "summary";

pub const CSV_CONNECTION: &str = "csvConnection";
pub const JDBC_CONNECTION: &str = "jdbcConnection";

pub const LDAP_CONNECTION: &str = "ldapConnection";
pub const LDAP_CERTIFICATE: &str = "ldapCertificate";
pub const LDAP_CONTAINERS: &str = "ldapContainers";
pub const LDAP_TEST_USER: &str = "ldapTestUser";

pub const GROUP_CONNECTION: &str = "groupConnection";
pub const GROUP_CERTIFICATE: &str = "groupCertificate";
pub const GROUP_CONTAINERS: &str = "groupContainers";
pub const GROUP_MEMBERSHIP: &str = "groupMembership";

/// Steps whose commit creates the system record.
pub const CONNECTION_STEPS: [&str; 5] = [
    SYSTEM_NEW,
    CSV_CONNECTION,
    JDBC_CONNECTION,
    LDAP_CONNECTION,
    GROUP_CONNECTION,
];
