use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a reverse WHOIS query matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverseKind {
    Email,
    Name,
    Company,
}

impl ReverseKind {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
            Self::Company => "company",
        }
    }
}

impl fmt::Display for ReverseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registrar {
    pub registrar_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub email_address: Option<String>,
    pub country_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A WHOIS record, either from a direct lookup or as a reverse-search row.
/// Unknown fields are carried through so saved output matches the API response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhoisRecord {
    pub domain_name: Option<String>,
    pub create_date: Option<String>,
    pub update_date: Option<String>,
    pub expiry_date: Option<String>,
    pub domain_registrar: Option<Registrar>,
    #[serde(default)]
    pub name_servers: Vec<String>,
    pub registrant_contact: Option<Contact>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WhoisRecord {
    pub fn registrar_name(&self) -> Option<&str> {
        self.domain_registrar
            .as_ref()
            .and_then(|r| r.registrar_name.as_deref())
    }

    pub fn summary(&self) -> WhoisSummary {
        let contact = self.registrant_contact.clone().unwrap_or_default();
        WhoisSummary {
            domain: self.domain_name.clone(),
            registrar: self.registrar_name().map(String::from),
            created: self.create_date.clone(),
            updated: self.update_date.clone(),
            expires: self.expiry_date.clone(),
            nameservers: self.name_servers.clone(),
            registrant: RegistrantSummary {
                name: contact.full_name,
                company: contact.company_name,
                email: contact.email_address,
                country: contact.country_name,
            },
        }
    }
}

/// The handful of WHOIS fields worth printing.
#[derive(Debug, Clone, Serialize)]
pub struct WhoisSummary {
    pub domain: Option<String>,
    pub registrar: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub expires: Option<String>,
    pub nameservers: Vec<String>,
    pub registrant: RegistrantSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrantSummary {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
}

/// One page of reverse WHOIS results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversePage {
    #[serde(default)]
    pub total_results: u64,
    pub total_pages: Option<u64>,
    pub current_page: Option<u64>,
    #[serde(default)]
    pub search_result: Vec<WhoisRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_pulls_nested_registrant_fields() {
        let record: WhoisRecord = serde_json::from_value(json!({
            "status": 1,
            "domain_name": "bad.com",
            "create_date": "2024-01-02",
            "domain_registrar": { "registrar_name": "NameCheap, Inc.", "iana_id": 1068 },
            "name_servers": ["ns1.bad.com"],
            "registrant_contact": { "full_name": "J. Doe", "email_address": "j@x.com" }
        }))
        .unwrap();

        let summary = record.summary();
        assert_eq!(summary.domain.as_deref(), Some("bad.com"));
        assert_eq!(summary.registrar.as_deref(), Some("NameCheap, Inc."));
        assert_eq!(summary.registrant.email.as_deref(), Some("j@x.com"));
        assert!(summary.registrant.company.is_none());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({ "domain_name": "bad.com", "num": 7, "domain_registrar": { "iana_id": 1 } });
        let record: WhoisRecord = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&record).unwrap();

        assert_eq!(back["num"], 7);
        assert_eq!(back["domain_registrar"]["iana_id"], 1);
    }
}
