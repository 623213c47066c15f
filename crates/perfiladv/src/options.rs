use std::collections::BTreeMap;

use colored::Colorize;
use perfiladv_core::filter::options;
use perfiladv_core::record::{Attribute, Dataset};

use crate::prelude::{println, *};

/// Attributes that can be filtered on, in display order.
const FILTER_ATTRIBUTES: [Attribute; 3] = [Attribute::Gender, Attribute::Race, Attribute::Region];

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct OptionsOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(options: OptionsOptions, global: crate::Global) -> Result<()> {
    let loaded = crate::dataset::load(&global)?;
    let lists = filter_options(&loaded.dataset);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&lists)?);
        return Ok(());
    }

    for (key, values) in &lists {
        let label = Attribute::from_key(key)
            .map(|attribute| attribute.label())
            .unwrap_or(*key);
        println!("{} (--{})", label.bright_white().bold(), key);
        if values.is_empty() {
            println!("  {}", "no values".dimmed());
        }
        for value in values {
            println!("  - {value}");
        }
    }

    Ok(())
}

/// Option list per filterable attribute present in the dataset, keyed by
/// attribute key.
fn filter_options(dataset: &Dataset) -> BTreeMap<&'static str, Vec<String>> {
    FILTER_ATTRIBUTES
        .into_iter()
        .filter(|attribute| dataset.has(*attribute))
        .map(|attribute| (attribute.key(), options(dataset, attribute)))
        .collect()
}
