//! # kfcert - Certificate Resolution and Key Recovery
//!
//! kfcert turns a loosely-typed certificate identifier into exactly one record of a
//! Keyfactor Command certificate inventory and, when asked, recovers that certificate's
//! private key from the inventory's password-protected PKCS#12 export.
//!
//! The crate does not talk HTTP. Callers plug in two collaborators:
//! - [`directory::CertificateDirectory`]: runs `Field -eq value` queries against the inventory
//! - [`recovery::CertificateRecovery`]: returns the base64 PKCS#12 export of one certificate
//!
//! ## Identifier Resolution
//!
//! An identifier is classified structurally:
//! - **Thumbprint**: exactly 40 characters
//! - **Numeric id**: a base-10 integer with no serial number or issuer alongside
//! - **Serial number + issuer DN**: both supplied
//! - **Common name**: anything else
//!
//! Numeric ids fall back to a serial number search and are then re-read through a
//! detailed query whose result is only trusted when it carries the same id. Every other
//! identifier is one query; when it matches several certificates the most recently
//! imported one wins.
//!
//! ## Key Recovery
//!
//! RSA keys come back as PKCS#1 (`RSA PRIVATE KEY`), EC keys on P-256, P-384 and P-521 as
//! SEC1 (`EC PRIVATE KEY`). Any other key yields an empty PEM string rather than an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kfcert::{
//!     directory::{CertificateDirectory, QueryFilter, RemoteFailure},
//!     engine::{CertificateEngine, ReadRequest},
//!     record::{CertificateRecord, IdentifierInput},
//!     recovery::{CertificateRecovery, RecoveryRequest},
//! };
//!
//! struct Api;
//!
//! impl CertificateDirectory for Api {
//!     fn query(&self, filter: &QueryFilter) -> Result<Vec<CertificateRecord>, RemoteFailure> {
//!         // GET /Certificates?QueryString={filter}
//!         # let _ = filter;
//!         Ok(vec![])
//!     }
//! }
//!
//! impl CertificateRecovery for Api {
//!     fn recover_pfx(&self, request: &RecoveryRequest) -> Result<String, RemoteFailure> {
//!         // POST /Certificates/Recover
//!         # let _ = request;
//!         Err(RemoteFailure::new(Some(501), "not wired up"))
//!     }
//! }
//!
//! # fn main() -> Result<(), kfcert::error::KfCertError> {
//! let engine = CertificateEngine::builder()
//!     .directory(Api)
//!     .recovery(Api)
//!     .build();
//!
//! let request = ReadRequest::builder()
//!     .identifier(IdentifierInput::value("087AE0E5473781574AAC84ADD178B759A977DFB2"))
//!     .include_private_key(true)
//!     .build();
//!
//! let readout = engine.read(&request)?;
//! println!("DNS names: {:?}", readout.sans.dns);
//! if let Some(material) = readout.key_material {
//!     println!("{}", material.private_key_pem);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use kfcert::{error::KfCertError, record::IdentifierInput};
//!
//! match IdentifierInput::default().classify() {
//!     Ok(identifier) => println!("Resolving {}", identifier),
//!     Err(KfCertError::InvalidRequest(msg)) => println!("Bad input: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`record`]: Inventory records and identifier classification
//! - [`directory`]: Query filters and the directory collaborator
//! - [`resolver`]: Lookup fallback chain and disambiguation
//! - [`recovery`]: PKCS#12 export and unpacking
//! - [`key`]: Private key re-encoding
//! - [`cert`]: Certificate decoding and SAN extraction
//! - [`password`]: Export password generation
//! - [`engine`]: The facade tying it together
//! - [`error`]: Error types

pub mod cert;
pub mod directory;
pub mod engine;
pub mod error;
pub mod key;
pub mod password;
pub mod pem_utils;
pub mod record;
pub mod recovery;
pub mod resolver;
