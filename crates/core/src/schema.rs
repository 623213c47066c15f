//! Schema normalizer: maps free-form source headers onto the canonical
//! attribute set and builds typed [`CanonicalRecord`]s from a [`RawTable`].
//!
//! Header resolution runs in three steps:
//!
//! 1. **Normalize** the header (trim, lowercase, whitespace runs → `_`).
//! 2. **Exact match** of the accent-folded token against [`SYNONYMS`].
//! 3. **Substring rules** from [`SUBSTRING_RULES`], in priority order
//!    (gender, age, race, state/region, city, years active, income, practice
//!    area). The first rule that fires wins, which settles headers that
//!    mention two attributes (`idade_cor` is an age column).
//!
//! Headers nothing recognizes are kept as pass-through columns under their
//! normalized token.

use std::collections::HashMap;

use log::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::age::{assign_age_groups, parse_number, AgeGroup};
use crate::raw::RawTable;
use crate::record::{is_missing, Attribute, CanonicalRecord, Column, Dataset};
use crate::region::{assign_regions, state_code, Region};

/// Exact header synonyms, keyed by the folded lookup token.
///
/// Every canonical key maps to itself so that normalizing an already
/// normalized dataset is a no-op.
pub const SYNONYMS: &[(&str, Attribute)] = &[
    // gender
    ("gender", Attribute::Gender),
    ("sexo", Attribute::Gender),
    ("genero", Attribute::Gender),
    ("sex", Attribute::Gender),
    ("sexo_genero", Attribute::Gender),
    ("genero_sexo", Attribute::Gender),
    // race
    ("race", Attribute::Race),
    ("cor_raca", Attribute::Race),
    ("raca_cor", Attribute::Race),
    ("raca", Attribute::Race),
    ("cor", Attribute::Race),
    ("etnia", Attribute::Race),
    ("ethnicity", Attribute::Race),
    ("race_color", Attribute::Race),
    // age
    ("age", Attribute::Age),
    ("idade", Attribute::Age),
    ("idade_anos", Attribute::Age),
    ("age_years", Attribute::Age),
    // age group
    ("age_group", Attribute::AgeGroup),
    ("faixa_etaria", Attribute::AgeGroup),
    ("faixa_de_idade", Attribute::AgeGroup),
    ("age_range", Attribute::AgeGroup),
    // state
    ("state", Attribute::State),
    ("uf", Attribute::State),
    ("estado", Attribute::State),
    ("sigla", Attribute::State),
    ("sigla_uf", Attribute::State),
    ("uf_inscricao", Attribute::State),
    // city
    ("city", Attribute::City),
    ("municipio", Attribute::City),
    ("cidade", Attribute::City),
    // region
    ("region", Attribute::Region),
    ("regiao", Attribute::Region),
    // years active
    ("years_active", Attribute::YearsActive),
    ("tempo_atuacao_anos", Attribute::YearsActive),
    ("tempo_de_atuacao", Attribute::YearsActive),
    ("anos_de_atuacao", Attribute::YearsActive),
    ("years_of_practice", Attribute::YearsActive),
    // practice area
    ("practice_area", Attribute::PracticeArea),
    ("area_atuacao", Attribute::PracticeArea),
    ("area_de_atuacao", Attribute::PracticeArea),
    ("area", Attribute::PracticeArea),
    // income
    ("income_bracket", Attribute::IncomeBracket),
    ("renda", Attribute::IncomeBracket),
    ("faixa_renda", Attribute::IncomeBracket),
    ("faixa_de_renda", Attribute::IncomeBracket),
    ("income", Attribute::IncomeBracket),
];

/// How a substring rule inspects the lookup token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// The token contains the text anywhere.
    Contains(&'static str),
    /// One of the `_`-separated segments equals the text.
    Segment(&'static str),
    /// The token contains every one of the texts.
    All(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, token: &str) -> bool {
        match self {
            Matcher::Contains(needle) => token.contains(needle),
            Matcher::Segment(needle) => token.split('_').any(|segment| segment == *needle),
            Matcher::All(needles) => needles.iter().all(|needle| token.contains(needle)),
        }
    }
}

/// A fallback rule: fires when any matcher matches and no exclusion does.
#[derive(Debug, Clone, Copy)]
pub struct SubstringRule {
    pub attribute: Attribute,
    pub any: &'static [Matcher],
    pub unless: &'static [&'static str],
}

/// Fallback rules in priority order; the first rule that fires wins.
pub const SUBSTRING_RULES: &[SubstringRule] = &[
    SubstringRule {
        attribute: Attribute::Gender,
        any: &[
            Matcher::Contains("sexo"),
            Matcher::Contains("genero"),
            Matcher::Contains("gender"),
            Matcher::Segment("sex"),
        ],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::AgeGroup,
        any: &[
            Matcher::Contains("etaria"),
            Matcher::All(&["faixa", "idade"]),
            Matcher::Contains("age_group"),
            Matcher::Contains("age_range"),
            Matcher::Contains("age_bracket"),
        ],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::Age,
        any: &[Matcher::Contains("idade"), Matcher::Segment("age")],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::Race,
        any: &[
            Matcher::Contains("raca"),
            Matcher::Segment("cor"),
            Matcher::Segment("race"),
            Matcher::Contains("etnia"),
            Matcher::Contains("ethnic"),
        ],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::Region,
        any: &[Matcher::Contains("regiao"), Matcher::Contains("region")],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::State,
        any: &[
            Matcher::Segment("uf"),
            Matcher::Contains("estado"),
            Matcher::Segment("state"),
            Matcher::Segment("sigla"),
        ],
        unless: &["civil"],
    },
    SubstringRule {
        attribute: Attribute::City,
        any: &[
            Matcher::Contains("municipio"),
            Matcher::Contains("cidade"),
            Matcher::Segment("city"),
        ],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::YearsActive,
        any: &[
            Matcher::All(&["tempo", "atua"]),
            Matcher::All(&["anos", "atua"]),
            Matcher::All(&["tempo", "inscricao"]),
            Matcher::Contains("experiencia"),
            Matcher::Contains("experience"),
            Matcher::All(&["years", "practice"]),
        ],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::IncomeBracket,
        any: &[
            Matcher::Contains("renda"),
            Matcher::Contains("rendimento"),
            Matcher::Contains("salario"),
            Matcher::Contains("income"),
            Matcher::Contains("salary"),
        ],
        unless: &[],
    },
    SubstringRule {
        attribute: Attribute::PracticeArea,
        any: &[
            Matcher::Contains("area"),
            Matcher::Contains("especialidade"),
            Matcher::Contains("practice"),
            Matcher::Segment("ramo"),
        ],
        unless: &[],
    },
];

impl SubstringRule {
    fn fires(&self, token: &str) -> bool {
        self.any.iter().any(|m| m.matches(token))
            && !self.unless.iter().any(|excluded| token.contains(excluded))
    }
}

/// Trim, lowercase and collapse internal whitespace runs to `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Strip diacritics: `raça` → `raca`, `Região` → `Regiao`.
pub fn fold_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Token used for synonym lookup: the normalized header with accents folded
/// and punctuation separators (`/`, `-`, `.`, parentheses) turned into `_`.
fn lookup_token(normalized: &str) -> String {
    let folded: String = fold_accents(normalized)
        .chars()
        .map(|c| match c {
            '/' | '-' | '.' | '(' | ')' | ':' => '_',
            other => other,
        })
        .collect();
    folded
        .split('_')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Map one source header to its column.
pub fn canonicalize(header: &str) -> Column {
    let normalized = normalize_header(header);
    let token = lookup_token(&normalized);

    if let Some((_, attribute)) = SYNONYMS.iter().find(|(synonym, _)| *synonym == token) {
        return Column::Canonical(*attribute);
    }

    if let Some(rule) = SUBSTRING_RULES.iter().find(|rule| rule.fires(&token)) {
        debug!("header {:?} matched the {} rule", header, rule.attribute);
        return Column::Canonical(rule.attribute);
    }

    Column::PassThrough(normalized)
}

/// Normalize a raw table into a typed dataset. Never fails.
///
/// When several headers map to the same column, the later one in source
/// order provides the values. Age groups and regions are derived afterwards.
pub fn normalize_table(raw: &RawTable) -> Dataset {
    let mapped: Vec<Column> = raw.headers.iter().map(|h| canonicalize(h)).collect();

    let mut columns: Vec<Column> = Vec::new();
    let mut source_index: HashMap<Column, usize> = HashMap::new();
    for (idx, column) in mapped.into_iter().enumerate() {
        if let Some(previous) = source_index.insert(column.clone(), idx) {
            debug!(
                "column {} appears more than once; {:?} overrides {:?}",
                column, raw.headers[idx], raw.headers[previous]
            );
        } else {
            columns.push(column);
        }
    }

    let mut records: Vec<CanonicalRecord> = raw
        .rows
        .iter()
        .map(|row| {
            let mut record = CanonicalRecord::default();
            for column in &columns {
                let Some(value) = source_index.get(column).and_then(|&idx| row.get(idx)) else {
                    continue;
                };
                if is_missing(value) {
                    continue;
                }
                set_column(&mut record, column, value);
            }
            record
        })
        .collect();

    let has = |columns: &[Column], attribute: Attribute| {
        columns.contains(&Column::Canonical(attribute))
    };
    let (has_age, has_age_group) = (
        has(&columns, Attribute::Age),
        has(&columns, Attribute::AgeGroup),
    );
    let (has_state, has_region) = (
        has(&columns, Attribute::State),
        has(&columns, Attribute::Region),
    );

    if has_age || has_age_group {
        assign_age_groups(&mut records, has_age_group);
        if !has_age_group {
            columns.push(Column::Canonical(Attribute::AgeGroup));
        }
    }

    if has_state || has_region {
        assign_regions(&mut records, has_region);
        if !has_region {
            columns.push(Column::Canonical(Attribute::Region));
        }
    }

    Dataset { columns, records }
}

fn set_column(record: &mut CanonicalRecord, column: &Column, value: &str) {
    let text = value.trim().to_string();
    match column {
        Column::PassThrough(token) => {
            record.extra.insert(token.clone(), text);
        }
        Column::Canonical(attribute) => match attribute {
            Attribute::Gender => record.gender = Some(text),
            Attribute::Race => record.race = Some(text),
            Attribute::City => record.city = Some(text),
            Attribute::PracticeArea => record.practice_area = Some(text),
            Attribute::IncomeBracket => record.income_bracket = Some(text),
            Attribute::Age => record.age = parse_number(&text),
            Attribute::YearsActive => record.years_active = parse_number(&text),
            Attribute::AgeGroup => record.age_group = AgeGroup::parse_label(&text),
            Attribute::Region => record.region = Region::canonicalize(&text),
            Attribute::State => {
                record.state = Some(
                    state_code(&text)
                        .map(str::to_string)
                        .unwrap_or_else(|| text.to_uppercase()),
                )
            }
        },
    }
}
