//! The record store: people, the domains tied to them, and what has been learned
//! about each domain so far.
//!
//! The on-disk document is shared with other tools, so every struct keeps the keys it
//! does not know about in `extra` and writes them back untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    #[serde(default, deserialize_with = "null_as_default")]
    pub emails: Vec<Person>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Store {
    pub fn person(&self, id: Uuid) -> Option<&Person> {
        self.emails.iter().find(|p| p.id == id)
    }

    pub fn person_mut(&mut self, id: Uuid) -> Option<&mut Person> {
        self.emails.iter_mut().find(|p| p.id == id)
    }
}

/// One tracked email address and its domains.
///
/// `id` is assigned the first time a record without one is loaded and is persisted from
/// then on, so later lookups do not depend on the person's position in `emails`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Order matters and duplicates are kept as-is.
    #[serde(default, deserialize_with = "null_as_default")]
    pub domains: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub urlscan: BTreeMap<String, EnrichmentRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain_cards: Vec<Card>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    pub fn new(email: impl Into<String>, domains: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            domains,
            urlscan: BTreeMap::new(),
            domain_cards: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn card(&self, domain: &str) -> Option<&Card> {
        self.domain_cards.iter().find(|c| c.domain == domain)
    }

    pub fn card_mut(&mut self, domain: &str) -> Option<&mut Card> {
        self.domain_cards.iter_mut().find(|c| c.domain == domain)
    }

    /// A domain counts as enriched when either map already holds a screenshot for it.
    pub fn is_enriched(&self, domain: &str) -> bool {
        let scanned = self
            .urlscan
            .get(domain)
            .is_some_and(EnrichmentRecord::has_screenshot);
        let carded = self.card(domain).is_some_and(|c| !c.screenshot.is_empty());
        scanned || carded
    }
}

/// Screenshot and metadata for one domain. Replaced as a whole on every enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub found: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scan_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub screenshot: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub malicious: bool,
    /// RFC 3339 when written by this tool; older records may carry other ISO-8601 forms.
    #[serde(default, deserialize_with = "null_as_default")]
    pub scanned_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnrichmentRecord {
    pub fn has_screenshot(&self) -> bool {
        self.found && !self.screenshot.is_empty()
    }
}

/// Display card for a domain. At most one per domain per person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub screenshot: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_fields_default() {
        let store: Store = serde_json::from_value(json!({
            "emails": [
                { "email": "a@x.com", "domains": ["bad.com"], "urlscan": null },
                { "domains": null }
            ]
        }))
        .unwrap();

        assert_eq!(store.emails.len(), 2);
        assert!(store.emails[0].urlscan.is_empty());
        assert!(store.emails[0].domain_cards.is_empty());
        assert!(store.emails[1].domains.is_empty());
        assert_eq!(store.emails[1].email, "");
    }

    #[test]
    fn unknown_keys_round_trip() {
        let raw = json!({
            "emails": [{
                "email": "a@x.com",
                "domains": [],
                "notes": "keep me",
                "domain_cards": [{ "domain": "bad.com", "registrar": "Reg" }]
            }],
            "generated": "2024-01-01"
        });
        let store: Store = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&store).unwrap();

        assert_eq!(back["generated"], "2024-01-01");
        assert_eq!(back["emails"][0]["notes"], "keep me");
        assert_eq!(back["emails"][0]["domain_cards"][0]["registrar"], "Reg");
    }

    #[test]
    fn missing_id_is_assigned_and_existing_id_kept() {
        let id = Uuid::new_v4();
        let store: Store = serde_json::from_value(json!({
            "emails": [{ "email": "a@x.com" }, { "id": id, "email": "b@x.com" }]
        }))
        .unwrap();

        assert!(!store.emails[0].id.is_nil());
        assert_eq!(store.emails[1].id, id);
        assert_eq!(store.person(id).map(|p| p.email.as_str()), Some("b@x.com"));
    }

    #[test]
    fn enriched_via_urlscan_requires_found_and_screenshot() {
        let mut person = Person::new("a@x.com", vec!["bad.com".into()]);
        person.urlscan.insert(
            "bad.com".into(),
            EnrichmentRecord {
                found: false,
                screenshot: "http://s/1.png".into(),
                ..Default::default()
            },
        );
        assert!(!person.is_enriched("bad.com"));

        person.urlscan.get_mut("bad.com").unwrap().found = true;
        assert!(person.is_enriched("bad.com"));
    }

    #[test]
    fn enriched_via_card_screenshot() {
        let mut person = Person::new("a@x.com", vec!["bad.com".into()]);
        person.domain_cards.push(Card {
            domain: "bad.com".into(),
            ip: "1.1.1.1".into(),
            ..Default::default()
        });
        assert!(!person.is_enriched("bad.com"));

        person.card_mut("bad.com").unwrap().screenshot = "http://s/1.png".into();
        assert!(person.is_enriched("bad.com"));
    }
}
