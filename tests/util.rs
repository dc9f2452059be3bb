#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::SystemTime;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use const_oid::AssociatedOid;
use der::Encode;
use der::asn1::{BitString, OctetString, UtcTime};
use kfcert::directory::{CertificateDirectory, QueryFilter, RemoteFailure};
use kfcert::record::CertificateRecord;
use kfcert::recovery::{CertificateRecovery, RecoveryRequest};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509, X509NameBuilder};
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};

/// Directory answering from a table keyed by filter expression.
#[derive(Default)]
pub struct MockDirectory {
    responses: HashMap<String, Vec<CertificateRecord>>,
    failures: HashMap<String, RemoteFailure>,
    pub seen: RefCell<Vec<String>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, expression: &str, records: Vec<CertificateRecord>) -> Self {
        self.responses.insert(expression.to_string(), records);
        self
    }

    pub fn fail(mut self, expression: &str, failure: RemoteFailure) -> Self {
        self.failures.insert(expression.to_string(), failure);
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }
}

impl CertificateDirectory for MockDirectory {
    fn query(&self, filter: &QueryFilter) -> Result<Vec<CertificateRecord>, RemoteFailure> {
        let expression = filter.expression();
        self.seen.borrow_mut().push(expression.clone());
        if let Some(failure) = self.failures.get(&expression) {
            return Err(failure.clone());
        }
        Ok(self.responses.get(&expression).cloned().unwrap_or_default())
    }
}

/// How the mock recovery endpoint answers.
pub enum RecoveryBehavior {
    /// Builds the bundle with the requested password.
    Bundle {
        key: PKey<Private>,
        leaf: X509,
        chain: Vec<X509>,
    },
    /// Builds the bundle with a fixed password regardless of the request.
    BundleWithPassword {
        key: PKey<Private>,
        leaf: X509,
        password: String,
    },
    Raw(String),
    Fail(RemoteFailure),
}

pub struct MockRecovery {
    behavior: RecoveryBehavior,
    pub requests: RefCell<Vec<RecoveryRequest>>,
}

impl MockRecovery {
    pub fn new(behavior: RecoveryBehavior) -> Self {
        Self {
            behavior,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecoveryRequest> {
        self.requests.borrow().clone()
    }
}

impl CertificateRecovery for MockRecovery {
    fn recover_pfx(&self, request: &RecoveryRequest) -> Result<String, RemoteFailure> {
        self.requests.borrow_mut().push(request.clone());
        match &self.behavior {
            RecoveryBehavior::Bundle { key, leaf, chain } => {
                let chain: &[X509] = if request.include_chain { chain } else { &[] };
                Ok(pfx_base64(key, leaf, chain, &request.password))
            }
            RecoveryBehavior::BundleWithPassword {
                key,
                leaf,
                password,
            } => Ok(pfx_base64(key, leaf, &[], password)),
            RecoveryBehavior::Raw(payload) => Ok(payload.clone()),
            RecoveryBehavior::Fail(failure) => Err(failure.clone()),
        }
    }
}

pub fn pfx_base64(key: &PKey<Private>, leaf: &X509, chain: &[X509], password: &str) -> String {
    let mut builder = Pkcs12::builder();
    builder.name("recovered").pkey(key).cert(leaf);
    if !chain.is_empty() {
        let mut stack = Stack::new().unwrap();
        for cert in chain {
            stack.push(cert.clone()).unwrap();
        }
        builder.ca(stack);
    }
    let pkcs12 = builder.build2(password).unwrap();
    STANDARD.encode(pkcs12.to_der().unwrap())
}

pub fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

pub fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// Subject alternative names for openssl-built certificates.
#[derive(Default)]
pub struct Sans<'a> {
    pub dns: &'a [&'a str],
    pub ip: &'a [&'a str],
    pub uri: &'a [&'a str],
    pub email: &'a [&'a str],
}

/// Issues a certificate for `key`, self-signed when `issuer` is `None`.
pub fn issue(
    cn: &str,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    sans: &Sans<'_>,
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(rand_serial()).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();

    if issuer.is_none() {
        let constraints = BasicConstraints::new().critical().ca().build().unwrap();
        builder.append_extension(constraints).unwrap();
    }

    let has_sans =
        !(sans.dns.is_empty() && sans.ip.is_empty() && sans.uri.is_empty() && sans.email.is_empty());
    if has_sans {
        let mut san = SubjectAlternativeName::new();
        for dns in sans.dns {
            san.dns(dns);
        }
        for ip in sans.ip {
            san.ip(ip);
        }
        for uri in sans.uri {
            san.uri(uri);
        }
        for email in sans.email {
            san.email(email);
        }
        let ext = match issuer {
            Some((issuer_cert, _)) => san
                .build(&builder.x509v3_context(Some(&**issuer_cert), None))
                .unwrap(),
            None => san.build(&builder.x509v3_context(None, None)).unwrap(),
        };
        builder.append_extension(ext).unwrap();
    }

    let signer = issuer.map(|(_, issuer_key)| issuer_key).unwrap_or(key);
    builder.sign(signer, MessageDigest::sha256()).unwrap();
    builder.build()
}

fn rand_serial() -> u32 {
    use rand::Rng;
    rand::rng().random_range(1..u32::MAX)
}

/// Upper-case hex SHA-1 of the certificate, as the inventory reports it.
pub fn thumbprint(cert: &X509) -> String {
    cert.digest(MessageDigest::sha1())
        .unwrap()
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}

/// An unsigned certificate carrying arbitrary SAN entries. Good enough for
/// anything that only decodes certificates.
pub fn cert_with_general_names(names: Vec<GeneralName>) -> Vec<u8> {
    let san = SubjectAltName(names).to_der().unwrap();
    let name = Name::from_str("CN=san.example.com").unwrap();
    let now = Time::UtcTime(UtcTime::from_system_time(SystemTime::now()).unwrap());
    let algorithm = AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
        parameters: None,
    };

    let tbs_certificate: TbsCertificateInner = TbsCertificateInner {
        version: x509_cert::Version::V3,
        serial_number: SerialNumber::new(&[1]).unwrap(),
        signature: algorithm.clone(),
        issuer: name.clone(),
        validity: Validity {
            not_before: now,
            not_after: now,
        },
        subject: name,
        subject_public_key_info: SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ID_EC_PUBLIC_KEY,
                parameters: None,
            },
            subject_public_key: BitString::from_bytes(&[4u8; 65]).unwrap(),
        },
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: Some(vec![Extension {
            extn_id: SubjectAltName::OID,
            critical: false,
            extn_value: OctetString::new(san).unwrap(),
        }]),
    };

    CertificateInner {
        tbs_certificate,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&[0u8; 64]).unwrap(),
    }
    .to_der()
    .unwrap()
}
