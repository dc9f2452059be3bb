//! Private key recovery through the inventory's PKCS#12 export.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bon::Builder;
use openssl::pkcs12::{ParsedPkcs12_2, Pkcs12};
use tracing::{debug, warn};

use crate::cert::Certificate;
use crate::directory::RemoteFailure;
use crate::error::{KfCertError, Result};
use crate::key::RecoveredKey;
use crate::password::{self, PasswordPolicy};
use crate::record::CertificateRecord;

/// Identifies the certificate whose key is recovered. Every field that is
/// set is sent to the remote system.
#[derive(Clone, Debug, Default, Builder, PartialEq, Eq)]
pub struct CertificateRef {
    pub id: Option<i64>,
    #[builder(into)]
    pub thumbprint: Option<String>,
    #[builder(into)]
    pub serial_number: Option<String>,
    #[builder(into)]
    pub issuer_dn: Option<String>,
}

impl CertificateRef {
    pub fn from_record(record: &CertificateRecord) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        Self {
            id: (record.id > 0).then_some(record.id),
            thumbprint: non_empty(&record.thumbprint),
            serial_number: non_empty(&record.serial_number),
            issuer_dn: non_empty(&record.issuer_dn),
        }
    }

    /// Requires an id, a thumbprint, or a serial number together with an
    /// issuer DN.
    pub fn validate(&self) -> Result<()> {
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if self.id.is_some()
            || has(&self.thumbprint)
            || (has(&self.serial_number) && has(&self.issuer_dn))
        {
            Ok(())
        } else {
            Err(KfCertError::InvalidRequest(
                "recovery needs a certificate id, thumbprint, or serial number with issuer DN"
                    .to_string(),
            ))
        }
    }
}

/// A request for the password-protected PKCS#12 export of a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryRequest {
    pub certificate: CertificateRef,
    pub password: String,
    pub include_chain: bool,
}

/// Exports certificates with their private keys as PKCS#12 bundles.
pub trait CertificateRecovery {
    /// Returns the base64-encoded PKCS#12 bundle protected by
    /// `request.password`.
    fn recover_pfx(&self, request: &RecoveryRequest) -> std::result::Result<String, RemoteFailure>;
}

impl<T: CertificateRecovery + ?Sized> CertificateRecovery for &T {
    fn recover_pfx(&self, request: &RecoveryRequest) -> std::result::Result<String, RemoteFailure> {
        (**self).recover_pfx(request)
    }
}

/// Settings for [`recover`].
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct RecoveryOptions {
    /// Policy for the password generated when the caller supplies none.
    #[builder(default)]
    pub password_policy: PasswordPolicy,
    #[builder(default = true)]
    pub include_chain: bool,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The leaf, chain and private key unpacked from a PKCS#12 bundle.
#[derive(Clone, Debug)]
pub struct RecoveredKeyMaterial {
    /// PEM text of the key, empty when the key is absent or unsupported.
    pub private_key_pem: String,
    pub key: RecoveredKey,
    pub leaf: Certificate,
    /// Chain certificates in bundle order.
    pub chain: Vec<Certificate>,
}

impl RecoveredKeyMaterial {
    pub fn has_private_key(&self) -> bool {
        !self.private_key_pem.is_empty()
    }

    pub fn certificate_pem(&self) -> Result<String> {
        self.leaf.to_pem()
    }

    /// The chain certificates as concatenated PEM blocks.
    pub fn chain_pem(&self) -> Result<String> {
        self.chain
            .iter()
            .map(Certificate::to_pem)
            .collect::<Result<Vec<_>>>()
            .map(|blocks| blocks.concat())
    }
}

/// Exports `certificate` from the remote system and unpacks the bundle.
///
/// An empty or missing `password` is replaced with one generated from
/// `options.password_policy`. Remote failures become `RecoveryError`; a bundle
/// that does not decode or decrypt is a `DecodingError`.
pub fn recover<R>(
    certificate: &CertificateRef,
    password: Option<&str>,
    options: &RecoveryOptions,
    recovery: &R,
) -> Result<RecoveredKeyMaterial>
where
    R: CertificateRecovery + ?Sized,
{
    certificate.validate()?;

    let password = match password.filter(|p| !p.is_empty()) {
        Some(password) => password.to_string(),
        None => password::generate(&options.password_policy),
    };

    let request = RecoveryRequest {
        certificate: certificate.clone(),
        password,
        include_chain: options.include_chain,
    };
    debug!(
        id = ?request.certificate.id,
        thumbprint = ?request.certificate.thumbprint,
        include_chain = request.include_chain,
        "requesting PKCS#12 export"
    );

    let payload = recovery
        .recover_pfx(&request)
        .map_err(|failure| KfCertError::RecoveryError {
            status: failure.status,
            message: failure.message,
        })?;

    let der = STANDARD.decode(payload.trim())?;
    open_pfx(&der, &request.password)
}

/// Decrypts a DER-encoded PKCS#12 bundle and splits it into leaf, chain and
/// key.
pub fn open_pfx(der: &[u8], password: &str) -> Result<RecoveredKeyMaterial> {
    let ParsedPkcs12_2 { pkey, cert, ca } = Pkcs12::from_der(der)?.parse2(password)?;

    let leaf = cert.ok_or_else(|| {
        KfCertError::DecodingError("PKCS#12 bundle contains no certificate".to_string())
    })?;
    let leaf = Certificate::from_der(&leaf.to_der()?)?;

    let mut chain = Vec::new();
    if let Some(ca) = &ca {
        for x509 in ca.iter() {
            chain.push(Certificate::from_der(&x509.to_der()?)?);
        }
    }

    let key = match pkey.map(|pkey| pkey.private_key_to_pkcs8()) {
        Some(Ok(pkcs8)) => RecoveredKey::from_pkcs8_der(&pkcs8),
        Some(Err(err)) => {
            warn!(error = %err, "private key could not be exported as PKCS#8");
            RecoveredKey::Unsupported { algorithm: None }
        }
        None => RecoveredKey::Unsupported { algorithm: None },
    };

    Ok(RecoveredKeyMaterial {
        private_key_pem: key.to_pem(),
        key,
        leaf,
        chain,
    })
}
