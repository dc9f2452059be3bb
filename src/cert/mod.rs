pub mod extensions;

use der::{Decode, Encode, EncodePem};
use extensions::SanSet;
use sha1::{Digest, Sha1};
use x509_cert::certificate::CertificateInner;

use crate::error::{KfCertError, Result};

/// PEM label for X.509 certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Represents a decoded X.509 certificate.
///
/// This struct provides methods to move the certificate between DER and PEM
/// and to read the pieces the resolution engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Decodes a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der)?,
        })
    }

    /// Decodes a single `CERTIFICATE` PEM block.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = crate::pem_utils::pem_to_der(pem, CERTIFICATE_LABEL)?;
        Self::from_der(&der)
    }

    /// Encodes the certificate into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded certificate.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| KfCertError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    ///
    /// # Returns
    /// A string containing the PEM-encoded certificate.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| KfCertError::EncodingError(e.to_string()))
    }

    /// Upper-case hex SHA-1 digest of the DER encoding, the thumbprint format
    /// used by the certificate inventory.
    pub fn thumbprint(&self) -> Result<String> {
        let digest = Sha1::digest(self.to_der()?);
        Ok(digest.iter().map(|b| format!("{b:02X}")).collect())
    }

    /// The DNS, IP and URI subject alternative names of this certificate.
    pub fn subject_alt_names(&self) -> Result<SanSet> {
        SanSet::from_certificate(&self.inner)
    }
}
