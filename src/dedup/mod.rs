//! Duplicate detection for contacts.
//!
//! Existing contacts are indexed by normalized email, phone and full name.
//! Candidates are matched by exact lookups first, then by name containment
//! and Jaro-Winkler similarity.

use std::collections::HashMap;

use crate::models::{Contact, CreateContactRequest, DuplicateMatch, MatchReason};

/// Digits compared from the end of a phone number; strips country/trunk prefixes.
const PHONE_SUFFIX_DIGITS: usize = 9;
/// Phone numbers shorter than this are too ambiguous to match on.
const MIN_PHONE_DIGITS: usize = 6;
/// Shorter names are not considered for containment matches.
const MIN_CONTAINED_NAME_LEN: usize = 4;

const SCORE_EMAIL: f64 = 1.0;
const SCORE_PHONE: f64 = 0.95;
const SCORE_NAME: f64 = 0.9;
const SCORE_CONTAINED: f64 = 0.8;

pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return None;
    }
    let start = digits.len().saturating_sub(PHONE_SUFFIX_DIGITS);
    Some(digits[start..].to_string())
}

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn normalize_name(first: &str, last: &str) -> Option<String> {
    let raw = format!("{} {}", first, last).to_lowercase();
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (!normalized.is_empty()).then_some(normalized)
}

/// Normalized keys of one record.
#[derive(Debug, Clone)]
struct Keys {
    email: Option<String>,
    phone: Option<String>,
    name: Option<String>,
}

impl Keys {
    fn of_request(request: &CreateContactRequest) -> Self {
        Self {
            email: request.email.as_deref().and_then(normalize_email),
            phone: request.phone.as_deref().and_then(normalize_phone),
            name: normalize_name(&request.first_name, &request.last_name),
        }
    }

    fn of_contact(contact: &Contact) -> Self {
        Self {
            email: contact.email.as_deref().and_then(normalize_email),
            phone: contact.phone.as_deref().and_then(normalize_phone),
            name: normalize_name(&contact.first_name, &contact.last_name),
        }
    }
}

/// Where an indexed record lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Origin {
    Existing(String),
    Batch(usize),
}

#[derive(Debug, Clone)]
struct Entry {
    origin: Origin,
    display_name: String,
    name: Option<String>,
}

/// Lookup structure over known contacts, extendable with records of a running import.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    entries: Vec<Entry>,
    by_email: HashMap<String, Vec<usize>>,
    by_phone: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
    threshold: f64,
}

impl DuplicateIndex {
    pub fn new(contacts: &[Contact], threshold: f64) -> Self {
        let mut index = Self {
            threshold,
            ..Default::default()
        };
        for contact in contacts {
            index.insert(
                Origin::Existing(contact.id.clone()),
                contact.display_name(),
                Keys::of_contact(contact),
            );
        }
        index
    }

    /// Register an accepted import record so later records of the same batch match against it.
    pub fn add_batch_record(&mut self, batch_index: usize, request: &CreateContactRequest) {
        let display_name = format!("{} {}", request.first_name.trim(), request.last_name.trim())
            .trim()
            .to_string();
        self.insert(
            Origin::Batch(batch_index),
            display_name,
            Keys::of_request(request),
        );
    }

    fn insert(&mut self, origin: Origin, display_name: String, keys: Keys) {
        let slot = self.entries.len();
        if let Some(email) = keys.email {
            self.by_email.entry(email).or_default().push(slot);
        }
        if let Some(phone) = keys.phone {
            self.by_phone.entry(phone).or_default().push(slot);
        }
        if let Some(name) = &keys.name {
            self.by_name.entry(name.clone()).or_default().push(slot);
        }
        self.entries.push(Entry {
            origin,
            display_name,
            name: keys.name,
        });
    }

    /// All plausible duplicates of a candidate, best first.
    pub fn find(&self, candidate: &CreateContactRequest) -> Vec<DuplicateMatch> {
        let keys = Keys::of_request(candidate);
        let mut found: HashMap<usize, (f64, Vec<MatchReason>)> = HashMap::new();
        let mut record = |slot: usize, reason: MatchReason, score: f64| {
            let entry = found.entry(slot).or_insert((0.0, Vec::new()));
            entry.0 = entry.0.max(score);
            if !entry.1.contains(&reason) {
                entry.1.push(reason);
            }
        };

        if let Some(slots) = keys.email.as_ref().and_then(|e| self.by_email.get(e)) {
            for &slot in slots {
                record(slot, MatchReason::SameEmail, SCORE_EMAIL);
            }
        }
        if let Some(slots) = keys.phone.as_ref().and_then(|p| self.by_phone.get(p)) {
            for &slot in slots {
                record(slot, MatchReason::SamePhone, SCORE_PHONE);
            }
        }
        if let Some(name) = &keys.name {
            if let Some(slots) = self.by_name.get(name) {
                for &slot in slots {
                    record(slot, MatchReason::SameName, SCORE_NAME);
                }
            }
            for (slot, entry) in self.entries.iter().enumerate() {
                let Some(other) = entry.name.as_deref() else {
                    continue;
                };
                if other == name {
                    continue;
                }
                if is_contained(name, other) {
                    record(slot, MatchReason::NameContained, SCORE_CONTAINED);
                }
                let similarity = strsim::jaro_winkler(name, other);
                if similarity >= self.threshold {
                    record(slot, MatchReason::SimilarName, similarity);
                }
            }
        }

        let mut matches: Vec<DuplicateMatch> = found
            .into_iter()
            .map(|(slot, (score, reasons))| {
                let entry = &self.entries[slot];
                let (contact_id, batch_index) = match &entry.origin {
                    Origin::Existing(id) => (Some(id.clone()), None),
                    Origin::Batch(index) => (None, Some(*index)),
                };
                DuplicateMatch {
                    contact_id,
                    batch_index,
                    display_name: entry.display_name.clone(),
                    score,
                    reasons,
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        matches
    }

    /// The single best duplicate of a candidate, if any.
    pub fn best(&self, candidate: &CreateContactRequest) -> Option<DuplicateMatch> {
        self.find(candidate).into_iter().next()
    }
}

/// One normalized name is a substring of the other.
fn is_contained(a: &str, b: &str) -> bool {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    short.chars().count() >= MIN_CONTAINED_NAME_LEN && long.contains(short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactSource;

    fn contact(id: &str, first: &str, last: &str, email: Option<&str>, phone: Option<&str>) -> Contact {
        Contact {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.map(String::from),
            phone: phone.map(String::from),
            organization: None,
            street: None,
            postal_code: None,
            city: None,
            country: None,
            notes: None,
            tags: vec![],
            source: ContactSource::Manual,
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        }
    }

    fn candidate(first: &str, last: &str, email: Option<&str>, phone: Option<&str>) -> CreateContactRequest {
        CreateContactRequest {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.map(String::from),
            phone: phone.map(String::from),
            ..Default::default()
        }
    }

    fn existing() -> Vec<Contact> {
        vec![
            contact("c1", "Margaret", "O'Neill", Some("Maggie@Example.org"), None),
            contact("c2", "Thomas", "Berger", None, Some("+41 79 555 12 34")),
            contact("c3", "Ann", "Li", None, None),
        ]
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(normalize_email("  A@B.org "), Some("a@b.org".into()));
        assert_eq!(normalize_email("   "), None);
        assert_eq!(normalize_phone("+41 (79) 555-12-34"), Some("795551234".into()));
        assert_eq!(normalize_phone("079 555 12 34"), Some("795551234".into()));
        assert_eq!(normalize_phone("12-34"), None);
        assert_eq!(
            normalize_name(" Margaret ", "O'Neill"),
            Some("margaret o neill".into())
        );
        assert_eq!(normalize_name("", " "), None);
    }

    #[test]
    fn test_email_match_ignores_case() {
        let index = DuplicateIndex::new(&existing(), 0.88);
        let best = index
            .best(&candidate("Someone", "Else", Some("maggie@example.ORG"), None))
            .unwrap();
        assert_eq!(best.contact_id.as_deref(), Some("c1"));
        assert_eq!(best.score, 1.0);
        assert_eq!(best.reasons, vec![MatchReason::SameEmail]);
    }

    #[test]
    fn test_phone_match_with_country_prefix() {
        let index = DuplicateIndex::new(&existing(), 0.88);
        let best = index
            .best(&candidate("T.", "B.", None, Some("079 555 12 34")))
            .unwrap();
        assert_eq!(best.contact_id.as_deref(), Some("c2"));
        assert!(best.reasons.contains(&MatchReason::SamePhone));
    }

    #[test]
    fn test_name_containment() {
        let index = DuplicateIndex::new(&existing(), 0.99);
        let best = index
            .best(&candidate("Thomas", "Berger-Huber", None, None))
            .unwrap();
        assert_eq!(best.contact_id.as_deref(), Some("c2"));
        assert!(best.reasons.contains(&MatchReason::NameContained));
        assert_eq!(best.score, 0.8);
    }

    #[test]
    fn test_containment_is_substring_based() {
        assert!(is_contained("thomas berger", "thomas berger huber"));
        assert!(is_contained("thomas berg", "thomas bergmann"));
        assert!(is_contained("annabelle meier", "anna"));
        assert!(!is_contained("li", "ann li"));
        // Four characters, eight bytes.
        assert!(is_contained("åsaö", "åsaö lind"));
        assert!(!is_contained("åsa", "åsa lind"));
    }

    #[test]
    fn test_partial_surname_is_flagged() {
        let contacts = vec![contact("c4", "Thomas", "Bergmann", None, None)];
        let index = DuplicateIndex::new(&contacts, 0.99);
        let best = index
            .best(&candidate("Thomas", "Berg", None, None))
            .unwrap();
        assert_eq!(best.contact_id.as_deref(), Some("c4"));
        assert!(best.reasons.contains(&MatchReason::NameContained));
        assert_eq!(best.score, 0.8);
    }

    #[test]
    fn test_similar_name_uses_threshold() {
        let index = DuplicateIndex::new(&existing(), 0.9);
        let best = index
            .best(&candidate("Margret", "O'Neil", None, None))
            .unwrap();
        assert_eq!(best.contact_id.as_deref(), Some("c1"));
        assert!(best.reasons.contains(&MatchReason::SimilarName));
        assert!(best.score >= 0.9 && best.score < 1.0);

        let strict = DuplicateIndex::new(&existing(), 0.999);
        assert!(strict.best(&candidate("Margret", "O'Neil", None, None)).is_none());
    }

    #[test]
    fn test_unrelated_candidate_has_no_match() {
        let index = DuplicateIndex::new(&existing(), 0.88);
        assert!(index
            .find(&candidate("Zoe", "Quartermain", Some("zq@example.org"), None))
            .is_empty());
    }

    #[test]
    fn test_batch_records_match_later_records() {
        let mut index = DuplicateIndex::new(&[], 0.88);
        let first = candidate("Lena", "Vogt", Some("lena@example.org"), None);
        assert!(index.best(&first).is_none());
        index.add_batch_record(0, &first);

        let again = candidate("Lena", "Vogt", None, None);
        let best = index.best(&again).unwrap();
        assert_eq!(best.batch_index, Some(0));
        assert_eq!(best.contact_id, None);
        assert_eq!(best.reasons, vec![MatchReason::SameName]);
    }

    #[test]
    fn test_reasons_accumulate_and_score_is_max() {
        let contacts = vec![contact("c9", "Ida", "Kern", Some("ida@example.org"), None)];
        let index = DuplicateIndex::new(&contacts, 0.88);
        let best = index
            .best(&candidate("Ida", "Kern", Some("IDA@example.org"), None))
            .unwrap();
        assert_eq!(best.score, 1.0);
        assert!(best.reasons.contains(&MatchReason::SameEmail));
        assert!(best.reasons.contains(&MatchReason::SameName));
    }
}
