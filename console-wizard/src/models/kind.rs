// Connector kinds offered by the "new system" wizard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorKind {
    /// Any connector; the administrator configures every step by hand.
    #[serde(rename = "universal-system")]
    Universal,
    #[serde(rename = "csv-connector-type")]
    Csv,
    #[serde(rename = "postgresql-connector-type")]
    Postgresql,
    #[serde(rename = "mssql-connector-type")]
    Mssql,
    /// LDAP / Active Directory users.
    #[serde(rename = "ad-connector-type")]
    Ldap,
    /// LDAP / Active Directory groups, wired to an existing user system.
    #[serde(rename = "ad-group-connector-type")]
    LdapGroup,
}

impl ConnectorKind {
    pub fn all() -> &'static [ConnectorKind] {
        &[
            ConnectorKind::Universal,
            ConnectorKind::Csv,
            ConnectorKind::Postgresql,
            ConnectorKind::Mssql,
            ConnectorKind::Ldap,
            ConnectorKind::LdapGroup,
        ]
    }

    /// Identifier the executor uses as the descriptor id.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::Universal => "universal-system",
            ConnectorKind::Csv => "csv-connector-type",
            ConnectorKind::Postgresql => "postgresql-connector-type",
            ConnectorKind::Mssql => "mssql-connector-type",
            ConnectorKind::Ldap => "ad-connector-type",
            ConnectorKind::LdapGroup => "ad-group-connector-type",
        }
    }

    /// Short name used on the command line.
    pub fn short_name(&self) -> &'static str {
        match self {
            ConnectorKind::Universal => "universal",
            ConnectorKind::Csv => "csv",
            ConnectorKind::Postgresql => "postgresql",
            ConnectorKind::Mssql => "mssql",
            ConnectorKind::Ldap => "ldap",
            ConnectorKind::LdapGroup => "ldap-group",
        }
    }

    pub fn default_port(&self) -> Option<u16> {
        match self {
            ConnectorKind::Postgresql => Some(5432),
            ConnectorKind::Mssql => Some(1433),
            ConnectorKind::Ldap | ConnectorKind::LdapGroup => Some(389),
            ConnectorKind::Universal | ConnectorKind::Csv => None,
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConnectorKind {
    type Err = ParseConnectorKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ConnectorKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == needle || k.short_name() == needle)
            .ok_or_else(|| ParseConnectorKindError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConnectorKindError(String);

impl fmt::Display for ParseConnectorKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown connector kind '{}', expected one of: universal, csv, postgresql, mssql, ldap, ldap-group",
            self.0
        )
    }
}

impl std::error::Error for ParseConnectorKindError {}
