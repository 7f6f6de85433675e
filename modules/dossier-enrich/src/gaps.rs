use serde::Serialize;
use uuid::Uuid;

use dossier_common::Store;

/// A (person, domain) pair with no screenshot yet.
///
/// `person_index` is the person's position in the store the gap was found in and is
/// only meaningful for that exact store. Merging resolves the person by `person_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gap {
    pub domain: String,
    pub email: String,
    pub person_index: usize,
    pub person_id: Uuid,
}

/// Every domain lacking enrichment, in person order then domain-list order.
/// A domain listed twice for one person yields two gaps.
pub fn find_gaps(store: &Store) -> Vec<Gap> {
    store
        .emails
        .iter()
        .enumerate()
        .flat_map(|(person_index, person)| {
            let email = if person.email.is_empty() {
                "unknown".to_string()
            } else {
                person.email.clone()
            };
            person
                .domains
                .iter()
                .filter(move |domain| !person.is_enriched(domain))
                .map(move |domain| Gap {
                    domain: domain.clone(),
                    email: email.clone(),
                    person_index,
                    person_id: person.id,
                })
        })
        .collect()
}
