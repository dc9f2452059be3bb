use std::collections::BTreeMap;
use std::fmt;

use bon::Builder;
use time::OffsetDateTime;

use crate::cert::extensions::SanSet;
use crate::error::{KfCertError, Result};

/// Length of a SHA-1 thumbprint in hex characters.
const THUMBPRINT_LEN: usize = 40;

/// Metadata of a certificate held in the remote inventory.
///
/// Records are built fresh from each directory response and never mutated.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct CertificateRecord {
    pub id: i64,
    #[builder(default, into)]
    pub thumbprint: String,
    #[builder(default, into)]
    pub serial_number: String,
    #[builder(default, into)]
    pub issuer_dn: String,
    #[builder(default, into)]
    pub issued_dn: String,
    #[builder(default, into)]
    pub issued_cn: String,
    pub import_date: Option<OffsetDateTime>,
    /// DER encoding of the certificate.
    #[builder(default)]
    pub content: Vec<u8>,
    #[builder(default)]
    pub key_recoverable: bool,
    #[builder(default)]
    pub metadata: BTreeMap<String, String>,
}

impl CertificateRecord {
    /// SANs of the stored certificate; empty when the record carries no
    /// certificate content.
    pub fn subject_alt_names(&self) -> Result<SanSet> {
        if self.content.is_empty() {
            return Ok(SanSet::default());
        }
        SanSet::from_der(&self.content)
    }
}

/// The single way a lookup identifies a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CertificateIdentifier {
    NumericId(i64),
    Thumbprint(String),
    SerialAndIssuer { serial: String, issuer_dn: String },
    CommonName(String),
}

impl fmt::Display for CertificateIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateIdentifier::NumericId(id) => write!(f, "id {id}"),
            CertificateIdentifier::Thumbprint(t) => write!(f, "thumbprint {t}"),
            CertificateIdentifier::SerialAndIssuer { serial, issuer_dn } => {
                write!(f, "serial {serial} issued by '{issuer_dn}'")
            }
            CertificateIdentifier::CommonName(cn) => write!(f, "common name '{cn}'"),
        }
    }
}

/// Loosely-typed lookup input as it arrives from configuration.
#[derive(Clone, Debug, Default, Builder, PartialEq, Eq)]
pub struct IdentifierInput {
    #[builder(into)]
    pub value: Option<String>,
    #[builder(into)]
    pub serial_number: Option<String>,
    #[builder(into)]
    pub issuer_dn: Option<String>,
}

impl IdentifierInput {
    /// Shorthand for an input carrying only a value.
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Determines which identifier variant this input denotes.
    ///
    /// A 40-character value is a thumbprint. A base-10 integer value is an
    /// id unless a serial number or issuer is also given. Otherwise a serial
    /// number plus issuer DN wins, and any remaining value is a common name.
    pub fn classify(&self) -> Result<CertificateIdentifier> {
        let value = non_empty(&self.value);
        let serial = non_empty(&self.serial_number);
        let issuer = non_empty(&self.issuer_dn);

        if let Some(value) = value {
            if value.chars().count() == THUMBPRINT_LEN {
                return Ok(CertificateIdentifier::Thumbprint(value.to_string()));
            }
            if serial.is_none() && issuer.is_none() {
                if let Ok(id) = value.parse::<i64>() {
                    return Ok(CertificateIdentifier::NumericId(id));
                }
            }
        }

        match (serial, issuer, value) {
            (Some(serial), Some(issuer_dn), _) => Ok(CertificateIdentifier::SerialAndIssuer {
                serial: serial.to_string(),
                issuer_dn: issuer_dn.to_string(),
            }),
            (_, _, Some(value)) => Ok(CertificateIdentifier::CommonName(value.to_string())),
            _ => Err(KfCertError::InvalidRequest(
                "an id, thumbprint, common name, or serial number with issuer DN is required"
                    .to_string(),
            )),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
