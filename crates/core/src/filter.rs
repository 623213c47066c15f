//! Record filtering and filter option lists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::{Attribute, CanonicalRecord, Dataset};

/// Selection on gender, race and region.
///
/// `None` leaves the attribute unconstrained. `Some(set)` keeps only records
/// whose value is present and contained in the set, so null values drop out
/// as soon as a constraint is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub gender: Option<BTreeSet<String>>,
    pub race: Option<BTreeSet<String>>,
    pub region: Option<BTreeSet<String>>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none() && self.race.is_none() && self.region.is_none()
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        [
            (Attribute::Gender, &self.gender),
            (Attribute::Race, &self.race),
            (Attribute::Region, &self.region),
        ]
        .into_iter()
        .all(|(attribute, allowed)| match allowed {
            None => true,
            Some(allowed) => record
                .text(attribute)
                .is_some_and(|value| allowed.contains(&value)),
        })
    }

    /// A new dataset holding the matching records. The input is untouched.
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        if self.is_empty() {
            return dataset.clone();
        }
        let records = dataset
            .records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();
        dataset.with_records(records)
    }
}

/// Sorted distinct non-null values of an attribute.
pub fn options(dataset: &Dataset, attribute: Attribute) -> Vec<String> {
    dataset
        .records
        .iter()
        .filter_map(|record| record.text(attribute))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use crate::record::Column;

    fn record(gender: Option<&str>, race: Option<&str>, region: Option<Region>) -> CanonicalRecord {
        CanonicalRecord {
            gender: gender.map(str::to_string),
            race: race.map(str::to_string),
            region,
            ..Default::default()
        }
    }

    fn fixture() -> Dataset {
        Dataset {
            columns: vec![
                Column::Canonical(Attribute::Gender),
                Column::Canonical(Attribute::Race),
                Column::Canonical(Attribute::Region),
            ],
            records: vec![
                record(Some("Feminino"), Some("Parda"), Some(Region::Sudeste)),
                record(Some("Masculino"), Some("Branca"), Some(Region::Nordeste)),
                record(Some("Feminino"), Some("Preta"), Some(Region::CentroOeste)),
                record(None, Some("Branca"), None),
            ],
        }
    }

    fn set(values: &[&str]) -> Option<BTreeSet<String>> {
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let dataset = fixture();
        let filtered = Filter::default().apply(&dataset);
        assert_eq!(filtered, dataset);
    }

    #[test]
    fn test_filter_by_gender() {
        let filter = Filter {
            gender: set(&["Feminino"]),
            ..Default::default()
        };
        let filtered = filter.apply(&fixture());
        assert_eq!(filtered.len(), 2);
        assert!(filtered
            .records
            .iter()
            .all(|r| r.gender.as_deref() == Some("Feminino")));
        assert_eq!(filtered.columns, fixture().columns);
    }

    #[test]
    fn test_null_values_drop_once_constrained() {
        let filter = Filter {
            race: set(&["Branca"]),
            ..Default::default()
        };
        assert_eq!(filter.apply(&fixture()).len(), 2);

        let filter = Filter {
            race: set(&["Branca"]),
            gender: set(&["Feminino", "Masculino"]),
            ..Default::default()
        };
        assert_eq!(filter.apply(&fixture()).len(), 1);
    }

    #[test]
    fn test_filter_by_region_uses_display_names() {
        let filter = Filter {
            region: set(&["Centro-Oeste", "Nordeste"]),
            ..Default::default()
        };
        assert_eq!(filter.apply(&fixture()).len(), 2);
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let dataset = fixture();
        let filter = Filter {
            gender: set(&["Nobody"]),
            ..Default::default()
        };
        let filtered = filter.apply(&dataset);
        assert!(filtered.is_empty());
        assert_eq!(dataset.len(), 4);
    }

    #[test]
    fn test_options_sorted_distinct() {
        let dataset = fixture();
        assert_eq!(options(&dataset, Attribute::Gender), vec!["Feminino", "Masculino"]);
        assert_eq!(
            options(&dataset, Attribute::Race),
            vec!["Branca", "Parda", "Preta"]
        );
        assert_eq!(
            options(&dataset, Attribute::Region),
            vec!["Centro-Oeste", "Nordeste", "Sudeste"]
        );
        assert!(options(&dataset, Attribute::City).is_empty());
    }
}
