//! Brazilian macro-regions and the state lookup table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::CanonicalRecord;
use crate::schema::fold_accents;

/// One of the five IBGE macro-regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    Norte,
    Nordeste,
    #[serde(rename = "Centro-Oeste")]
    CentroOeste,
    Sudeste,
    Sul,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Norte,
        Region::Nordeste,
        Region::CentroOeste,
        Region::Sudeste,
        Region::Sul,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Norte => "Norte",
            Region::Nordeste => "Nordeste",
            Region::CentroOeste => "Centro-Oeste",
            Region::Sudeste => "Sudeste",
            Region::Sul => "Sul",
        }
    }

    /// Canonicalize a region name that came from the source data.
    ///
    /// Only case, accents, surrounding whitespace and the separator of
    /// "Centro-Oeste" are normalized; anything else is not a region.
    pub fn canonicalize(value: &str) -> Option<Region> {
        let key = region_key(value);
        if key.is_empty() {
            return None;
        }
        Region::ALL.into_iter().find(|r| region_key(r.as_str()) == key)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::canonicalize(s).ok_or_else(|| {
            format!("unknown region '{s}'. Valid regions: Norte, Nordeste, Centro-Oeste, Sudeste, Sul")
        })
    }
}

/// Lowercase, accent-free, separator-free form used to compare region names.
fn region_key(value: &str) -> String {
    fold_accents(value.trim())
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// A row of the state lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub region: Region,
}

const fn state(code: &'static str, name: &'static str, region: Region) -> StateEntry {
    StateEntry { code, name, region }
}

/// The 26 states and the Federal District, grouped by region.
pub const STATES: [StateEntry; 27] = [
    // Sudeste
    state("SP", "São Paulo", Region::Sudeste),
    state("RJ", "Rio de Janeiro", Region::Sudeste),
    state("MG", "Minas Gerais", Region::Sudeste),
    state("ES", "Espírito Santo", Region::Sudeste),
    // Sul
    state("PR", "Paraná", Region::Sul),
    state("RS", "Rio Grande do Sul", Region::Sul),
    state("SC", "Santa Catarina", Region::Sul),
    // Nordeste
    state("BA", "Bahia", Region::Nordeste),
    state("PE", "Pernambuco", Region::Nordeste),
    state("CE", "Ceará", Region::Nordeste),
    state("RN", "Rio Grande do Norte", Region::Nordeste),
    state("PB", "Paraíba", Region::Nordeste),
    state("AL", "Alagoas", Region::Nordeste),
    state("SE", "Sergipe", Region::Nordeste),
    state("MA", "Maranhão", Region::Nordeste),
    state("PI", "Piauí", Region::Nordeste),
    // Norte
    state("AM", "Amazonas", Region::Norte),
    state("PA", "Pará", Region::Norte),
    state("AP", "Amapá", Region::Norte),
    state("RO", "Rondônia", Region::Norte),
    state("RR", "Roraima", Region::Norte),
    state("TO", "Tocantins", Region::Norte),
    state("AC", "Acre", Region::Norte),
    // Centro-Oeste
    state("DF", "Distrito Federal", Region::CentroOeste),
    state("GO", "Goiás", Region::CentroOeste),
    state("MT", "Mato Grosso", Region::CentroOeste),
    state("MS", "Mato Grosso do Sul", Region::CentroOeste),
];

/// Exact lookup of a two-letter state code (case-insensitive).
pub fn lookup_code(code: &str) -> Option<&'static StateEntry> {
    let code = code.trim();
    STATES.iter().find(|s| s.code.eq_ignore_ascii_case(code))
}

/// Find the state a free-text value refers to.
///
/// Tries, in order: an exact two-letter code; the longest full state name
/// contained in the value ("Mato Grosso do Sul" beats "Mato Grosso"); a
/// state code appearing as a whole word ("Sao Paulo - SP"), in table order.
pub fn find_state(value: &str) -> Option<&'static StateEntry> {
    let upper = value.trim().to_uppercase();
    if upper.chars().count() == 2 {
        if let Some(entry) = lookup_code(&upper) {
            return Some(entry);
        }
    }

    let folded = fold_accents(&upper);
    let by_name = STATES
        .iter()
        .filter(|s| folded.contains(&fold_accents(&s.name.to_uppercase())))
        .max_by_key(|s| s.name.chars().count());
    if by_name.is_some() {
        return by_name;
    }

    let words: Vec<&str> = folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    STATES.iter().find(|s| words.contains(&s.code))
}

/// The two-letter code of a state given as code or full name.
pub fn state_code(value: &str) -> Option<&'static str> {
    find_state(value).map(|entry| entry.code)
}

/// Resolve a state value (code or name) to its macro-region.
///
/// Falls back to region names contained in the value (longest first) when no
/// state matches. Unresolvable input is `None`.
pub fn resolve_state(value: &str) -> Option<Region> {
    if let Some(entry) = find_state(value) {
        return Some(entry.region);
    }

    let key = region_key(value);
    if key.is_empty() {
        return None;
    }
    let mut regions = Region::ALL;
    regions.sort_by_key(|r| std::cmp::Reverse(region_key(r.as_str()).len()));
    regions
        .into_iter()
        .find(|r| key.contains(&region_key(r.as_str())))
}

/// Fill in `region` from `state`.
///
/// A region column from the source is kept as is (already canonicalized by
/// the normalizer) and never remapped through the state table.
pub fn assign_regions(records: &mut [CanonicalRecord], source_has_region: bool) {
    if source_has_region {
        return;
    }
    for record in records.iter_mut() {
        record.region = record.state.as_deref().and_then(resolve_state);
    }
}
