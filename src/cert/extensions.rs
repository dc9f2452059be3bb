use std::net::{Ipv4Addr, Ipv6Addr};

use const_oid::{AssociatedOid, ObjectIdentifier};
use der::Decode;
use x509_cert::certificate::CertificateInner;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::ext::pkix::name::GeneralName;

use crate::error::{KfCertError, Result};

/// OtherName type id of a Microsoft user principal name.
pub const MS_NT_PRINCIPAL_NAME: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.2.3");
/// OtherName type id of a Microsoft NTDS replication GUID.
pub const MS_NTDS_REPLICATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.25.1");

/// Subject alternative name categories and their numeric type codes.
///
/// Codes 0 to 8 are the `GeneralName` choice tags; 100 and 101 are the
/// inventory's codes for the two Microsoft OtherName forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum SanType {
    Other = 0,
    Rfc822 = 1,
    Dns = 2,
    X400 = 3,
    Directory = 4,
    EdiParty = 5,
    Uri = 6,
    Ip = 7,
    RegisteredId = 8,
    MsNtPrincipalName = 100,
    MsNtdsReplication = 101,
}

impl SanType {
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => SanType::Other,
            1 => SanType::Rfc822,
            2 => SanType::Dns,
            3 => SanType::X400,
            4 => SanType::Directory,
            5 => SanType::EdiParty,
            6 => SanType::Uri,
            7 => SanType::Ip,
            8 => SanType::RegisteredId,
            100 => SanType::MsNtPrincipalName,
            101 => SanType::MsNtdsReplication,
            _ => return None,
        })
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

/// One subject alternative name with its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanEntry {
    pub kind: SanType,
    pub value: String,
}

impl SanEntry {
    /// Classifies a `GeneralName`.
    ///
    /// Fails only for an IP address entry that is neither 4 nor 16 bytes long.
    pub fn from_general_name(name: &GeneralName) -> Result<Self> {
        let (kind, value) = match name {
            GeneralName::OtherName(other) => {
                let kind = match other.type_id {
                    MS_NT_PRINCIPAL_NAME => SanType::MsNtPrincipalName,
                    MS_NTDS_REPLICATION => SanType::MsNtdsReplication,
                    _ => SanType::Other,
                };
                (kind, other.type_id.to_string())
            }
            GeneralName::Rfc822Name(email) => (SanType::Rfc822, email.to_string()),
            GeneralName::DnsName(dns) => (SanType::Dns, dns.to_string()),
            GeneralName::DirectoryName(dn) => (SanType::Directory, dn.to_string()),
            GeneralName::EdiPartyName(_) => (SanType::EdiParty, String::new()),
            GeneralName::UniformResourceIdentifier(uri) => (SanType::Uri, uri.to_string()),
            GeneralName::IpAddress(octets) => (SanType::Ip, ip_to_string(octets.as_bytes())?),
            GeneralName::RegisteredId(oid) => (SanType::RegisteredId, oid.to_string()),
        };
        Ok(Self { kind, value })
    }
}

fn ip_to_string(octets: &[u8]) -> Result<String> {
    if let Ok(v4) = <[u8; 4]>::try_from(octets) {
        return Ok(Ipv4Addr::from(v4).to_string());
    }
    if let Ok(v6) = <[u8; 16]>::try_from(octets) {
        return Ok(Ipv6Addr::from(v6).to_string());
    }
    Err(KfCertError::DecodingError(format!(
        "cannot parse IP address of length {}",
        octets.len()
    )))
}

/// DNS, IP and URI subject alternative names, each sorted ascending.
///
/// IP addresses are sorted by their string form. Every other SAN category is
/// left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanSet {
    pub dns: Vec<String>,
    pub ip: Vec<String>,
    pub uri: Vec<String>,
}

impl SanSet {
    /// Buckets already-classified entries.
    pub fn from_entries(entries: impl IntoIterator<Item = SanEntry>) -> Self {
        let mut set = SanSet::default();
        for entry in entries {
            match entry.kind {
                SanType::Dns => set.dns.push(entry.value),
                SanType::Ip => set.ip.push(entry.value),
                SanType::Uri => set.uri.push(entry.value),
                _ => {}
            }
        }
        set.dns.sort();
        set.ip.sort();
        set.uri.sort();
        set
    }

    pub fn from_general_names(names: &[GeneralName]) -> Result<Self> {
        let entries = names
            .iter()
            .map(SanEntry::from_general_name)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_entries(entries))
    }

    /// Reads every SAN extension of the certificate.
    pub fn from_certificate(cert: &CertificateInner) -> Result<Self> {
        Ok(Self::from_entries(classify(cert)?))
    }

    /// Decodes a DER certificate and extracts its SANs.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_certificate(&CertificateInner::from_der(der)?)
    }

    /// Decodes a `CERTIFICATE` PEM block and extracts its SANs.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = crate::pem_utils::pem_to_der(pem, super::CERTIFICATE_LABEL)?;
        Self::from_der(&der)
    }

    pub fn is_empty(&self) -> bool {
        self.dns.is_empty() && self.ip.is_empty() && self.uri.is_empty()
    }
}

/// Every subject alternative name of the certificate in extension order,
/// including the categories `SanSet` drops.
pub fn classify(cert: &CertificateInner) -> Result<Vec<SanEntry>> {
    let mut entries = Vec::new();
    let extensions = cert.tbs_certificate.extensions.as_deref().unwrap_or_default();
    for ext in extensions.iter().filter(|ext| ext.extn_id == SubjectAltName::OID) {
        let san = SubjectAltName::from_der(ext.extn_value.as_bytes())?;
        for name in &san.0 {
            entries.push(SanEntry::from_general_name(name)?);
        }
    }
    Ok(entries)
}
