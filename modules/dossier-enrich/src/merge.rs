use chrono::{DateTime, SecondsFormat, Utc};

use dossier_common::{Card, DossierError, EnrichmentRecord, Result, Store};
use urlscan_client::ScanSummary;

use crate::gaps::Gap;

/// What an enrichment source found for one domain. Absent fields are empty / false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub uuid: String,
    pub screenshot: String,
    pub ip: String,
    pub country: String,
    pub title: String,
    pub malicious: bool,
}

impl From<ScanSummary> for EnrichmentResult {
    fn from(s: ScanSummary) -> Self {
        Self {
            uuid: s.uuid,
            screenshot: s.screenshot,
            ip: s.ip,
            country: s.country,
            title: s.title,
            malicious: s.malicious,
        }
    }
}

/// Write `result` into both the `urlscan` map and the domain card of the gap's person.
pub fn apply(store: &mut Store, gap: &Gap, result: &EnrichmentResult) -> Result<()> {
    apply_at(store, gap, result, Utc::now())
}

/// [`apply`] with an explicit scan time. Re-applying the same result leaves the store
/// unchanged apart from `scanned_at`.
pub fn apply_at(
    store: &mut Store,
    gap: &Gap,
    result: &EnrichmentResult,
    scanned_at: DateTime<Utc>,
) -> Result<()> {
    let person = store
        .person_mut(gap.person_id)
        .ok_or(DossierError::UnknownPerson(gap.person_id))?;

    person.urlscan.insert(
        gap.domain.clone(),
        EnrichmentRecord {
            found: true,
            scan_id: result.uuid.clone(),
            screenshot: result.screenshot.clone(),
            ip: result.ip.clone(),
            country: result.country.clone(),
            title: result.title.clone(),
            malicious: result.malicious,
            scanned_at: scanned_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            extra: Default::default(),
        },
    );

    match person.card_mut(&gap.domain) {
        Some(card) => {
            card.screenshot = result.screenshot.clone();
            card.ip = result.ip.clone();
            card.country = result.country.clone();
        }
        None => person.domain_cards.push(Card {
            domain: gap.domain.clone(),
            screenshot: result.screenshot.clone(),
            ip: result.ip.clone(),
            country: result.country.clone(),
            extra: Default::default(),
        }),
    }

    Ok(())
}
