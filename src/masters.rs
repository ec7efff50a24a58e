//! Coffee-master registry.
//!
//! A single JSON file (`assets/centralisator.json` by default) lists
//! districts, their stores, each store's leader and its coffee masters with
//! certification dates:
//!
//! ```json
//! {"districts": [{"id": "north", "name": "North", "code": "N1", "stores": [
//!   {"id": "s1", "name": "Harbor", "code": "S-001", "address": "1 Quay St",
//!    "storeLeader": {"name": "Ada Stone", "role": "Store Leader", "isCertified": true,
//!                    "employmentDate": "2019-04-01", "certificationDate": "2021-06-15",
//!                    "certificationExpiry": "2025-06-15"},
//!    "masters": [{"name": "Ben Cole", "isCertified": false}]}]}]}
//! ```
//!
//! Everyone counts once toward the statistics: the leader plus every master.

use crate::source::{ContentSource, SourceError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MastersError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub districts: Vec<District>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub stores: Vec<Store>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub address: String,
    pub store_leader: Person,
    #[serde(default)]
    pub masters: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_certified: bool,
    #[serde(default)]
    pub employment_date: Option<String>,
    #[serde(default)]
    pub certification_date: Option<String>,
    #[serde(default)]
    pub certification_expiry: Option<String>,
}

impl Store {
    /// Leader first, then masters.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        std::iter::once(&self.store_leader).chain(&self.masters)
    }

    /// Head count shown on the store tab.
    pub fn head_count(&self) -> usize {
        1 + self.masters.len()
    }
}

impl District {
    pub fn store(&self, id: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == id)
    }
}

impl Registry {
    pub fn district(&self, id: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.id == id)
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub masters: usize,
    pub certified: usize,
    pub to_be_certified: usize,
}

impl Tally {
    fn add(&mut self, person: &Person) {
        self.masters += 1;
        if person.is_certified {
            self.certified += 1;
        } else {
            self.to_be_certified += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictStats {
    pub name: String,
    pub code: String,
    pub stores: usize,
    pub tally: Tally,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub districts: usize,
    pub stores: usize,
    pub tally: Tally,
    pub per_district: Vec<DistrictStats>,
}

/// `n / d`, or zero for an empty denominator.
fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 { 0.0 } else { n as f64 / d as f64 }
}

impl Statistics {
    pub fn compute(registry: &Registry) -> Self {
        let mut stats = Statistics {
            districts: registry.districts.len(),
            ..Statistics::default()
        };
        for district in &registry.districts {
            let mut tally = Tally::default();
            for person in district.stores.iter().flat_map(Store::people) {
                tally.add(person);
                stats.tally.add(person);
            }
            stats.stores += district.stores.len();
            stats.per_district.push(DistrictStats {
                name: district.name.clone(),
                code: district.code.clone(),
                stores: district.stores.len(),
                tally,
            });
        }
        stats
    }

    pub fn avg_per_store(&self) -> f64 {
        ratio(self.tally.masters, self.stores)
    }

    pub fn avg_per_district(&self) -> f64 {
        ratio(self.tally.masters, self.districts)
    }

    /// Certified share of everyone, in percent.
    pub fn certification_rate(&self) -> f64 {
        ratio(self.tally.certified, self.tally.masters) * 100.0
    }
}

impl DistrictStats {
    pub fn avg_per_store(&self) -> f64 {
        ratio(self.tally.masters, self.stores)
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// `2021-06-15` → `Jun 15, 2021`. Missing dates are `N/A`; anything that is
/// not an ISO date is shown as written.
pub fn format_date(date: Option<&str>) -> String {
    let Some(raw) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return "N/A".to_string();
    };
    let day = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Up to two uppercase initials: `ana maria ruiz` → `AM`.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// File-name-safe form of a registry id.
pub fn slug(id: &str) -> String {
    let slug: String = id
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if slug.is_empty() { "-".to_string() } else { slug }
}

// ============================================================================
// Loading
// ============================================================================

pub fn parse_registry(path: &str, text: &str) -> Result<Registry, MastersError> {
    serde_json::from_str(text).map_err(|source| MastersError::Json {
        path: path.to_string(),
        source,
    })
}

pub fn load_registry<S: ContentSource + ?Sized>(
    source: &S,
    path: &str,
) -> Result<Registry, MastersError> {
    let text = source.fetch_text(path)?;
    let registry = parse_registry(path, &text)?;
    log::info!(
        "{path}: {} district(s), {} store(s)",
        registry.districts.len(),
        registry.districts.iter().map(|d| d.stores.len()).sum::<usize>()
    );
    Ok(registry)
}
