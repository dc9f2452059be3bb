//! The certificate directory the resolver queries.
//!
//! Transport, authentication and response parsing belong to the implementor;
//! this module owns only the filter expressions sent through it.

use std::fmt;

use crate::record::CertificateRecord;

/// Inventory fields the resolver filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    Id,
    Thumbprint,
    SerialNumber,
    IssuedDN,
    IssuedCN,
}

impl QueryField {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryField::Id => "Id",
            QueryField::Thumbprint => "Thumbprint",
            QueryField::SerialNumber => "SerialNumber",
            QueryField::IssuedDN => "IssuedDN",
            QueryField::IssuedCN => "IssuedCN",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of an equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    String(String),
    Int(i64),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl fmt::Display for FilterValue {
    /// Strings are quoted with `"` and `\` escaped; integers are bare.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(value) => write!(f, "{value}"),
            FilterValue::String(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
        }
    }
}

/// An equality filter, rendered as `Field -eq value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub field: QueryField,
    pub value: FilterValue,
}

impl QueryFilter {
    pub fn new(field: QueryField, value: impl Into<FilterValue>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// The filter in the inventory's query language.
    pub fn expression(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -eq {}", self.field, self.value)
    }
}

/// A failed remote call, with the status reported by the remote system when
/// there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Runs equality-filter queries against the certificate inventory.
///
/// An empty result means nothing matched; `Err` is reserved for transport or
/// remote failures.
pub trait CertificateDirectory {
    fn query(&self, filter: &QueryFilter) -> Result<Vec<CertificateRecord>, RemoteFailure>;
}

impl<T: CertificateDirectory + ?Sized> CertificateDirectory for &T {
    fn query(&self, filter: &QueryFilter) -> Result<Vec<CertificateRecord>, RemoteFailure> {
        (**self).query(filter)
    }
}
