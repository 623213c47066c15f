//! Summary Builder: totals, per-attribute shares and the plain-text report.
//!
//! The summary is an ordered list of `(metric, value)` pairs. The first
//! entry is always the respondent total; then, for gender, race, age group
//! and region (in that order, when the dataset has the column), one entry per
//! value with its share of all rows.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::age::AgeGroup;
use crate::record::{Attribute, Dataset, NOT_INFORMED};

/// Metric name of the first summary entry.
pub const TOTAL_METRIC: &str = "Total de respondentes";

/// Attributes broken down by the summary, in output order.
pub const SUMMARY_ATTRIBUTES: [Attribute; 4] = [
    Attribute::Gender,
    Attribute::Race,
    Attribute::AgeGroup,
    Attribute::Region,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub metric: String,
    pub value: String,
}

impl SummaryEntry {
    fn new(metric: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            value: value.into(),
        }
    }
}

/// Headline numbers shown above the breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub total: usize,
    /// Mean age truncated to an integer; `None` when no record has an age.
    pub mean_age: Option<u32>,
    /// Distinct non-null regions.
    pub regions: usize,
}

pub fn headline_metrics(dataset: &Dataset) -> Headline {
    let ages: Vec<f64> = dataset.records.iter().filter_map(|r| r.age).collect();
    let mean_age = if ages.is_empty() {
        None
    } else {
        Some((ages.iter().sum::<f64>() / ages.len() as f64).max(0.0) as u32)
    };
    let regions = dataset
        .records
        .iter()
        .filter_map(|r| r.region)
        .collect::<BTreeSet<_>>()
        .len();

    Headline {
        total: dataset.len(),
        mean_age,
        regions,
    }
}

/// Value counts of an attribute, nulls counted under [`NOT_INFORMED`].
///
/// Age groups follow bucket order with [`NOT_INFORMED`] last; every other
/// attribute is ordered by descending count, ties by value.
pub fn distribution(dataset: &Dataset, attribute: Attribute) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in &dataset.records {
        let value = record
            .text(attribute)
            .unwrap_or_else(|| NOT_INFORMED.to_string());
        *counts.entry(value).or_default() += 1;
    }

    if attribute == Attribute::AgeGroup {
        let mut ordered: Vec<(String, usize)> = AgeGroup::ALL
            .iter()
            .filter_map(|group| {
                counts
                    .remove(group.label())
                    .map(|count| (group.label().to_string(), count))
            })
            .collect();
        if let Some(count) = counts.remove(NOT_INFORMED) {
            ordered.push((NOT_INFORMED.to_string(), count));
        }
        return ordered;
    }

    let mut ordered: Vec<(String, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ordered
}

fn percentage(count: usize, total: usize) -> String {
    format!("{:.2}%", count as f64 * 100.0 / total as f64)
}

/// Build the ordered summary of a dataset.
pub fn build_summary(dataset: &Dataset) -> Vec<SummaryEntry> {
    let total = dataset.len();
    let mut entries = vec![SummaryEntry::new(TOTAL_METRIC, total.to_string())];
    if total == 0 {
        return entries;
    }

    for attribute in SUMMARY_ATTRIBUTES {
        if !dataset.has(attribute) {
            continue;
        }
        entries.extend(
            distribution(dataset, attribute)
                .into_iter()
                .map(|(value, count)| {
                    SummaryEntry::new(
                        format!("{}: {}", attribute.label(), value),
                        percentage(count, total),
                    )
                }),
        );
    }

    entries
}

/// Plain-text "Resumo estatístico": the total followed by counts per gender,
/// race and age group.
pub fn render_text_report(dataset: &Dataset) -> String {
    let mut lines = vec![format!("Total respondentes: {}", dataset.len())];

    let sections = [
        (Attribute::Gender, "Distribuição por sexo:"),
        (Attribute::Race, "Distribuição por raça/cor:"),
        (Attribute::AgeGroup, "Faixas etárias:"),
    ];
    for (attribute, title) in sections {
        if !dataset.has(attribute) {
            continue;
        }
        lines.push(String::new());
        lines.push(title.to_string());
        lines.extend(
            distribution(dataset, attribute)
                .into_iter()
                .map(|(value, count)| format!(" - {value}: {count}")),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CanonicalRecord, Column};
    use crate::region::Region;

    fn person(gender: Option<&str>, age: Option<f64>, region: Option<Region>) -> CanonicalRecord {
        CanonicalRecord {
            gender: gender.map(str::to_string),
            age,
            age_group: age.and_then(AgeGroup::from_age),
            region,
            ..Default::default()
        }
    }

    fn fixture() -> Dataset {
        Dataset {
            columns: vec![
                Column::Canonical(Attribute::Gender),
                Column::Canonical(Attribute::Age),
                Column::Canonical(Attribute::AgeGroup),
                Column::Canonical(Attribute::Region),
            ],
            records: vec![
                person(Some("Feminino"), Some(30.0), Some(Region::Sudeste)),
                person(Some("Masculino"), Some(70.0), Some(Region::Nordeste)),
                person(Some("Feminino"), None, Some(Region::Sudeste)),
            ],
        }
    }

    fn value_of<'a>(entries: &'a [SummaryEntry], metric: &str) -> Option<&'a str> {
        entries
            .iter()
            .find(|e| e.metric == metric)
            .map(|e| e.value.as_str())
    }

    #[test]
    fn test_total_comes_first() {
        let summary = build_summary(&fixture());
        assert_eq!(summary[0], SummaryEntry::new(TOTAL_METRIC, "3"));
    }

    #[test]
    fn test_empty_dataset_only_has_total() {
        let dataset = fixture().with_records(Vec::new());
        assert_eq!(build_summary(&dataset), vec![SummaryEntry::new(TOTAL_METRIC, "0")]);
    }

    #[test]
    fn test_percentages_and_order() {
        let summary = build_summary(&fixture());
        let metrics: Vec<&str> = summary.iter().map(|e| e.metric.as_str()).collect();
        assert_eq!(
            metrics,
            vec![
                "Total de respondentes",
                "Sexo: Feminino",
                "Sexo: Masculino",
                "Faixa etária: 25-34",
                "Faixa etária: 65+",
                "Faixa etária: Não informado",
                "Região: Sudeste",
                "Região: Nordeste",
            ]
        );
        assert_eq!(value_of(&summary, "Sexo: Feminino"), Some("66.67%"));
        assert_eq!(value_of(&summary, "Sexo: Masculino"), Some("33.33%"));
        assert_eq!(value_of(&summary, "Faixa etária: Não informado"), Some("33.33%"));
    }

    #[test]
    fn test_attributes_without_column_are_skipped() {
        let summary = build_summary(&fixture());
        assert!(summary.iter().all(|e| !e.metric.starts_with("Raça/Cor")));
    }

    #[test]
    fn test_percentages_sum_to_one_hundred() {
        let mut dataset = fixture();
        dataset.records.push(person(None, Some(45.0), None));
        dataset.records.push(person(Some("Não binário"), Some(22.0), Some(Region::Sul)));
        dataset.records.push(person(Some("Masculino"), Some(150.0), Some(Region::Norte)));
        let summary = build_summary(&dataset);

        for attribute in SUMMARY_ATTRIBUTES {
            let prefix = format!("{}: ", attribute.label());
            let shares: Vec<f64> = summary
                .iter()
                .filter(|e| e.metric.starts_with(&prefix))
                .map(|e| {
                    e.value
                        .trim_end_matches('%')
                        .parse::<f64>()
                        .expect("percentage value")
                })
                .collect();
            if shares.is_empty() {
                continue;
            }
            let sum: f64 = shares.iter().sum();
            assert!((sum - 100.0).abs() <= 0.02, "{attribute}: {sum}");
        }
    }

    #[test]
    fn test_distribution_ties_break_by_value() {
        let dataset = Dataset {
            columns: vec![Column::Canonical(Attribute::Gender)],
            records: vec![
                person(Some("Masculino"), None, None),
                person(Some("Feminino"), None, None),
            ],
        };
        assert_eq!(
            distribution(&dataset, Attribute::Gender),
            vec![("Feminino".to_string(), 1), ("Masculino".to_string(), 1)]
        );
    }

    #[test]
    fn test_headline_metrics() {
        let headline = headline_metrics(&fixture());
        assert_eq!(headline.total, 3);
        assert_eq!(headline.mean_age, Some(50));
        assert_eq!(headline.regions, 2);

        let no_ages = Dataset {
            columns: vec![],
            records: vec![CanonicalRecord::default()],
        };
        let headline = headline_metrics(&no_ages);
        assert_eq!(headline.mean_age, None);
        assert_eq!(headline.regions, 0);
    }

    #[test]
    fn test_mean_age_is_truncated() {
        let dataset = Dataset {
            columns: vec![Column::Canonical(Attribute::Age)],
            records: vec![person(None, Some(30.0), None), person(None, Some(31.0), None)],
        };
        assert_eq!(headline_metrics(&dataset).mean_age, Some(30));
    }

    #[test]
    fn test_render_text_report() {
        let report = render_text_report(&fixture());
        assert_eq!(
            report,
            "Total respondentes: 3\n\
             \n\
             Distribuição por sexo:\n \
             - Feminino: 2\n \
             - Masculino: 1\n\
             \n\
             Faixas etárias:\n \
             - 25-34: 1\n \
             - 65+: 1\n \
             - Não informado: 1"
        );
    }
}
