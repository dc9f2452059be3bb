//! Resolves a certificate identifier to exactly one inventory record.

use tracing::{debug, warn};

use crate::directory::{CertificateDirectory, QueryField, QueryFilter};
use crate::error::{KfCertError, Result};
use crate::record::{CertificateIdentifier, CertificateRecord, IdentifierInput};

/// Outcome of a lookup. Not finding anything is an answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(CertificateRecord),
    NotFound(CertificateIdentifier),
}

impl Resolution {
    pub fn record(&self) -> Option<&CertificateRecord> {
        match self {
            Resolution::Found(record) => Some(record),
            Resolution::NotFound(_) => None,
        }
    }

    /// Escalates `NotFound` into `KfCertError::NotFound`.
    pub fn into_record(self) -> Result<CertificateRecord> {
        match self {
            Resolution::Found(record) => Ok(record),
            Resolution::NotFound(identifier) => Err(KfCertError::NotFound(identifier.to_string())),
        }
    }
}

/// Outcome of re-reading a record through a more detailed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The detailed query found the same certificate; this is its record.
    Verified(CertificateRecord),
    /// The detailed query found nothing or a different certificate; this is
    /// the original record.
    Unverified(CertificateRecord),
}

impl Reconciled {
    pub fn is_verified(&self) -> bool {
        matches!(self, Reconciled::Verified(_))
    }

    pub fn into_record(self) -> CertificateRecord {
        match self {
            Reconciled::Verified(record) | Reconciled::Unverified(record) => record,
        }
    }
}

/// Picks the most recently imported candidate.
///
/// The first candidate is taken unconditionally. A later candidate replaces
/// the current pick only if it has an import date and the pick has none or
/// an earlier one. Returns `None` only for an empty input.
pub fn pick_best<I>(candidates: I) -> Option<CertificateRecord>
where
    I: IntoIterator<Item = CertificateRecord>,
{
    let mut candidates = candidates.into_iter();
    let mut best = candidates.next()?;
    for candidate in candidates {
        let Some(imported) = candidate.import_date else {
            continue;
        };
        if best.import_date.is_none_or(|current| imported > current) {
            best = candidate;
        }
    }
    Some(best)
}

/// Classifies `input` and resolves it.
pub fn resolve_input<D>(input: &IdentifierInput, directory: &D) -> Result<Resolution>
where
    D: CertificateDirectory + ?Sized,
{
    let identifier = input.classify()?;
    debug!(%identifier, "classified certificate identifier");
    resolve(&identifier, directory)
}

/// Resolves `identifier` against `directory`.
///
/// Numeric ids go through [`resolve_id`]; every other identifier is a single
/// query whose matches are narrowed with [`pick_best`]. Query failures are
/// returned as `QueryError` and never retried.
pub fn resolve<D>(identifier: &CertificateIdentifier, directory: &D) -> Result<Resolution>
where
    D: CertificateDirectory + ?Sized,
{
    let found = match identifier {
        CertificateIdentifier::NumericId(id) => resolve_id(*id, directory)?,
        CertificateIdentifier::Thumbprint(thumbprint) => pick_best(query(
            directory,
            QueryFilter::new(QueryField::Thumbprint, thumbprint.as_str()),
        )?),
        CertificateIdentifier::SerialAndIssuer { serial, issuer_dn } => {
            by_serial(directory, serial, issuer_dn)?
        }
        CertificateIdentifier::CommonName(cn) => pick_best(query(
            directory,
            QueryFilter::new(QueryField::IssuedCN, cn.as_str()),
        )?),
    };

    Ok(match found {
        Some(record) => Resolution::Found(record),
        None => Resolution::NotFound(identifier.clone()),
    })
}

/// Looks a certificate up by id, falling back to a serial number search with
/// the same literal, then re-reads it through [`reconcile`].
pub fn resolve_id<D>(id: i64, directory: &D) -> Result<Option<CertificateRecord>>
where
    D: CertificateDirectory + ?Sized,
{
    let original = match pick_best(query(directory, QueryFilter::new(QueryField::Id, id))?) {
        Some(record) => record,
        None => {
            debug!(id, "no certificate with this id, searching serial numbers");
            match pick_best(query(
                directory,
                QueryFilter::new(QueryField::SerialNumber, id.to_string()),
            )?) {
                Some(record) => record,
                None => return Ok(None),
            }
        }
    };

    Ok(Some(reconcile(original, directory)?.into_record()))
}

/// Re-reads `original` by thumbprint, else serial number and issuer, else
/// issued DN, and keeps the detailed record only if it has the same id.
pub fn reconcile<D>(original: CertificateRecord, directory: &D) -> Result<Reconciled>
where
    D: CertificateDirectory + ?Sized,
{
    let detailed = if !original.thumbprint.is_empty() {
        pick_best(query(
            directory,
            QueryFilter::new(QueryField::Thumbprint, original.thumbprint.as_str()),
        )?)
    } else if !original.serial_number.is_empty() {
        by_serial(directory, &original.serial_number, &original.issuer_dn)?
    } else if !original.issued_dn.is_empty() {
        pick_best(query(
            directory,
            QueryFilter::new(QueryField::IssuedDN, original.issued_dn.as_str()),
        )?)
    } else {
        None
    };

    Ok(match detailed {
        Some(detailed) if detailed.id == original.id => Reconciled::Verified(detailed),
        Some(detailed) => {
            warn!(
                id = original.id,
                other_id = detailed.id,
                "detail query matched a different certificate, keeping the original record"
            );
            Reconciled::Unverified(original)
        }
        None => Reconciled::Unverified(original),
    })
}

/// Serial number search narrowed to `issuer_dn` when one is given.
fn by_serial<D>(directory: &D, serial: &str, issuer_dn: &str) -> Result<Option<CertificateRecord>>
where
    D: CertificateDirectory + ?Sized,
{
    let records = query(directory, QueryFilter::new(QueryField::SerialNumber, serial))?;
    let wanted = normalize_dn(issuer_dn);
    Ok(pick_best(records.into_iter().filter(|record| {
        wanted.is_empty() || normalize_dn(&record.issuer_dn) == wanted
    })))
}

/// Lower-cases a DN and drops whitespace around `,` and `=`.
pub fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| {
            rdn.split('=')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("=")
        })
        .collect::<Vec<_>>()
        .join(",")
        .to_lowercase()
}

fn query<D>(directory: &D, filter: QueryFilter) -> Result<Vec<CertificateRecord>>
where
    D: CertificateDirectory + ?Sized,
{
    debug!(field = %filter.field, filter = %filter, "querying certificate directory");
    directory
        .query(&filter)
        .map_err(|failure| KfCertError::QueryError {
            status: failure.status,
            message: failure.message,
        })
}
