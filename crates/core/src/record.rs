//! Canonical records and datasets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::age::AgeGroup;
use crate::region::Region;

/// Label used for null values in summaries and reports.
pub const NOT_INFORMED: &str = "Não informado";

/// The canonical attribute set shared by every source layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Gender,
    Race,
    Age,
    AgeGroup,
    State,
    City,
    Region,
    YearsActive,
    PracticeArea,
    IncomeBracket,
}

impl Attribute {
    pub const ALL: [Attribute; 10] = [
        Attribute::Gender,
        Attribute::Race,
        Attribute::Age,
        Attribute::AgeGroup,
        Attribute::State,
        Attribute::City,
        Attribute::Region,
        Attribute::YearsActive,
        Attribute::PracticeArea,
        Attribute::IncomeBracket,
    ];

    /// Stable snake_case key, used as the column name on export.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Gender => "gender",
            Attribute::Race => "race",
            Attribute::Age => "age",
            Attribute::AgeGroup => "age_group",
            Attribute::State => "state",
            Attribute::City => "city",
            Attribute::Region => "region",
            Attribute::YearsActive => "years_active",
            Attribute::PracticeArea => "practice_area",
            Attribute::IncomeBracket => "income_bracket",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Attribute::Gender => "Sexo",
            Attribute::Race => "Raça/Cor",
            Attribute::Age => "Idade",
            Attribute::AgeGroup => "Faixa etária",
            Attribute::State => "UF",
            Attribute::City => "Município",
            Attribute::Region => "Região",
            Attribute::YearsActive => "Tempo de atuação (anos)",
            Attribute::PracticeArea => "Área de atuação",
            Attribute::IncomeBracket => "Faixa de renda",
        }
    }

    pub fn from_key(key: &str) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|a| a.key() == key)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::from_key(s.trim()).ok_or_else(|| {
            let keys: Vec<&str> = Attribute::ALL.iter().map(|a| a.key()).collect();
            format!("Unknown attribute: {}. Valid: {}", s, keys.join(", "))
        })
    }
}

/// A column of a normalized dataset: either a canonical attribute or a
/// pass-through column kept under its normalized header token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Canonical(Attribute),
    PassThrough(String),
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Canonical(attribute) => attribute.key(),
            Column::PassThrough(token) => token,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A normalized survey row. Attributes absent from the source stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub gender: Option<String>,
    pub race: Option<String>,
    pub age: Option<f64>,
    pub age_group: Option<AgeGroup>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub region: Option<Region>,
    pub years_active: Option<f64>,
    pub practice_area: Option<String>,
    pub income_bracket: Option<String>,
    /// Pass-through columns, keyed by normalized header token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl CanonicalRecord {
    /// Text rendering of an attribute value, `None` when unset.
    pub fn text(&self, attribute: Attribute) -> Option<String> {
        match attribute {
            Attribute::Gender => self.gender.clone(),
            Attribute::Race => self.race.clone(),
            Attribute::Age => self.age.map(format_number),
            Attribute::AgeGroup => self.age_group.map(|g| g.label().to_string()),
            Attribute::State => self.state.clone(),
            Attribute::City => self.city.clone(),
            Attribute::Region => self.region.map(|r| r.as_str().to_string()),
            Attribute::YearsActive => self.years_active.map(format_number),
            Attribute::PracticeArea => self.practice_area.clone(),
            Attribute::IncomeBracket => self.income_bracket.clone(),
        }
    }

    /// Text rendering of any column, canonical or pass-through.
    pub fn column_text(&self, column: &Column) -> Option<String> {
        match column {
            Column::Canonical(attribute) => self.text(*attribute),
            Column::PassThrough(token) => self.extra.get(token).cloned(),
        }
    }
}

/// Render a number without a trailing `.0` when it is integral.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Whether a raw cell should be read as "no value".
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || ["na", "n/a", "nan", "null", "none", "-"]
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// A normalized dataset: the records plus the columns the source provided
/// (and those derived from them), in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<Column>,
    pub records: Vec<CanonicalRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has(&self, attribute: Attribute) -> bool {
        self.columns.contains(&Column::Canonical(attribute))
    }

    /// Pass-through column tokens, in column order.
    pub fn pass_through(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match c {
            Column::PassThrough(token) => Some(token.as_str()),
            Column::Canonical(_) => None,
        })
    }

    /// Derive a dataset with the same columns and a subset of the records.
    pub fn with_records(&self, records: Vec<CanonicalRecord>) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            records,
        }
    }
}
