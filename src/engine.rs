use bon::Builder;
use tracing::{debug, warn};

use crate::cert::extensions::SanSet;
use crate::directory::CertificateDirectory;
use crate::error::{KfCertError, Result};
use crate::record::{CertificateRecord, IdentifierInput};
use crate::recovery::{self, CertificateRecovery, CertificateRef, RecoveredKeyMaterial, RecoveryOptions};
use crate::resolver::{self, Resolution};

/// Resolves certificates and optionally recovers their private keys.
///
/// The engine keeps no state between calls beyond its collaborators and
/// settings.
#[derive(Builder)]
pub struct CertificateEngine<D, R> {
    directory: D,
    recovery: R,
    #[builder(default)]
    options: RecoveryOptions,
}

/// What a caller wants read.
#[derive(Clone, Debug, Builder)]
pub struct ReadRequest {
    pub identifier: IdentifierInput,
    #[builder(default)]
    pub include_private_key: bool,
    #[builder(into)]
    pub password: Option<String>,
}

/// Everything read for one certificate.
#[derive(Clone, Debug)]
pub struct CertificateReadout {
    pub record: CertificateRecord,
    pub sans: SanSet,
    pub key_material: Option<RecoveredKeyMaterial>,
}

impl<D, R> CertificateEngine<D, R>
where
    D: CertificateDirectory,
    R: CertificateRecovery,
{
    pub fn resolve(&self, identifier: &IdentifierInput) -> Result<Resolution> {
        resolver::resolve_input(identifier, &self.directory)
    }

    /// Recovers the key of an already resolved certificate.
    ///
    /// Fails with `InvalidRequest` before any remote call when the record's
    /// key is not recoverable or the record carries nothing to select it by.
    pub fn recover(
        &self,
        record: &CertificateRecord,
        password: Option<&str>,
    ) -> Result<RecoveredKeyMaterial> {
        if !record.key_recoverable {
            return Err(KfCertError::InvalidRequest(format!(
                "private key of certificate {} is not recoverable",
                record.id
            )));
        }
        let certificate = CertificateRef::from_record(record);
        let material = recovery::recover(&certificate, password, &self.options, &self.recovery)?;

        match material.leaf.thumbprint() {
            Ok(thumbprint)
                if !record.thumbprint.is_empty()
                    && !thumbprint.eq_ignore_ascii_case(&record.thumbprint) =>
            {
                warn!(
                    id = record.id,
                    expected = %record.thumbprint,
                    recovered = %thumbprint,
                    "recovered certificate does not match the resolved record"
                );
            }
            _ => {}
        }
        Ok(material)
    }

    /// Resolves the requested certificate, extracts its SANs and, when asked
    /// for and the inventory marks the key recoverable, recovers its private
    /// key.
    ///
    /// A certificate that cannot be found is reported as
    /// `KfCertError::NotFound`. An unrecoverable key leaves `key_material`
    /// empty without failing the read.
    pub fn read(&self, request: &ReadRequest) -> Result<CertificateReadout> {
        let record = self.resolve(&request.identifier)?.into_record()?;
        let sans = record.subject_alt_names()?;

        let key_material = match (request.include_private_key, record.key_recoverable) {
            (true, true) => Some(self.recover(&record, request.password.as_deref())?),
            (true, false) => {
                debug!(id = record.id, "private key is not recoverable, skipping recovery");
                None
            }
            (false, _) => None,
        };
        debug!(
            id = record.id,
            dns = sans.dns.len(),
            ip = sans.ip.len(),
            uri = sans.uri.len(),
            key = key_material.as_ref().is_some_and(RecoveredKeyMaterial::has_private_key),
            "read certificate"
        );

        Ok(CertificateReadout {
            record,
            sans,
            key_material,
        })
    }
}
