use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{
    ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1,
};
use pkcs8::{DecodePrivateKey, PrivateKeyInfo};
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use tracing::warn;

use crate::pem_utils::der_to_pem;

/// PEM label for PKCS#1 RSA private keys.
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
/// PEM label for SEC1 elliptic-curve private keys.
pub const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";

/// Elliptic-curve private keys on the supported NIST curves.
#[derive(Clone, Debug)]
pub enum EcKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl EcKey {
    /// Serializes the key as a SEC1 `ECPrivateKey` structure.
    pub fn to_sec1_der(&self) -> der::Result<Vec<u8>> {
        match self {
            EcKey::P256(key) => key.to_sec1_der().map(|d| d.to_vec()),
            EcKey::P384(key) => key.to_sec1_der().map(|d| d.to_vec()),
            EcKey::P521(key) => key.to_sec1_der().map(|d| d.to_vec()),
        }
    }
}

/// A private key recovered from an export bundle.
///
/// Only RSA and EC keys can be re-encoded. Anything else is kept as
/// `Unsupported` so callers can still report the algorithm.
#[derive(Clone, Debug)]
pub enum RecoveredKey {
    Rsa(Box<RsaPrivateKey>),
    Ec(EcKey),
    Unsupported { algorithm: Option<ObjectIdentifier> },
}

impl RecoveredKey {
    /// Decodes a PKCS#8 `PrivateKeyInfo`.
    ///
    /// Never fails: keys of an unknown algorithm, unknown curve, or keys that do
    /// not decode become `Unsupported`.
    pub fn from_pkcs8_der(der: &[u8]) -> Self {
        let info = match PrivateKeyInfo::try_from(der) {
            Ok(info) => info,
            Err(err) => {
                warn!(error = %err, "private key is not a PKCS#8 structure");
                return RecoveredKey::Unsupported { algorithm: None };
            }
        };
        let algorithm = info.algorithm.oid;

        let decoded = match algorithm {
            RSA_ENCRYPTION => RsaPrivateKey::from_pkcs8_der(der)
                .ok()
                .map(|key| RecoveredKey::Rsa(Box::new(key))),
            ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid() {
                Ok(SECP_256_R_1) => p256::SecretKey::from_pkcs8_der(der).ok().map(EcKey::P256),
                Ok(SECP_384_R_1) => p384::SecretKey::from_pkcs8_der(der).ok().map(EcKey::P384),
                Ok(SECP_521_R_1) => p521::SecretKey::from_pkcs8_der(der).ok().map(EcKey::P521),
                _ => None,
            }
            .map(RecoveredKey::Ec),
            _ => None,
        };

        decoded.unwrap_or_else(|| {
            warn!(%algorithm, "dropping private key of unsupported algorithm");
            RecoveredKey::Unsupported {
                algorithm: Some(algorithm),
            }
        })
    }

    /// The PEM label this key is written under, if it can be written at all.
    pub fn pem_label(&self) -> Option<&'static str> {
        match self {
            RecoveredKey::Rsa(_) => Some(RSA_PRIVATE_KEY_LABEL),
            RecoveredKey::Ec(_) => Some(EC_PRIVATE_KEY_LABEL),
            RecoveredKey::Unsupported { .. } => None,
        }
    }

    /// Encodes the key as PEM: PKCS#1 for RSA, SEC1 for EC.
    ///
    /// Returns an empty string for unsupported keys and for any encoding
    /// failure, including an encoding that yields zero bytes.
    pub fn to_pem(&self) -> String {
        let der = match self {
            RecoveredKey::Rsa(key) => key.to_pkcs1_der().ok().map(|d| d.as_bytes().to_vec()),
            RecoveredKey::Ec(key) => key.to_sec1_der().ok(),
            RecoveredKey::Unsupported { .. } => None,
        };

        match (der, self.pem_label()) {
            (Some(der), Some(label)) if !der.is_empty() => der_to_pem(&der, label),
            _ => String::new(),
        }
    }
}
