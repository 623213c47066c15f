use colored::Colorize;
use perfiladv_core::record::{Column, Dataset, NOT_INFORMED};
use perfiladv_core::summary::{headline_metrics, Headline};

use crate::dataset::FilterArgs;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct LoadOptions {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Show at most this many records
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, serde::Serialize)]
struct LoadOutput<'a> {
    headline: Headline,
    dataset: &'a Dataset,
}

pub fn run(options: LoadOptions, global: crate::Global) -> Result<()> {
    let loaded = crate::dataset::load(&global)?;
    let filtered = options.filter.to_filter().apply(&loaded.dataset);
    let headline = headline_metrics(&filtered);

    if options.json {
        let output = LoadOutput {
            headline,
            dataset: &filtered,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", format_headline(&headline));
    println!();

    if filtered.is_empty() {
        println!("{}", "No records match the current filters.".yellow());
        return Ok(());
    }

    let shown = options.limit.unwrap_or(filtered.len()).min(filtered.len());
    let mut table = new_table();
    table.add_row(prettytable::Row::new(
        filtered
            .columns
            .iter()
            .map(|column| prettytable::Cell::new(&column_title(column)).style_spec("b"))
            .collect(),
    ));
    for record in filtered.records.iter().take(shown) {
        table.add_row(prettytable::Row::new(
            filtered
                .columns
                .iter()
                .map(|column| {
                    prettytable::Cell::new(
                        &record
                            .column_text(column)
                            .unwrap_or_else(|| NOT_INFORMED.to_string()),
                    )
                })
                .collect(),
        ));
    }
    table.printstd();

    if shown < filtered.len() {
        println!(
            "\n{}",
            format!("Showing {shown} of {} records.", filtered.len()).dimmed()
        );
    }

    Ok(())
}

fn column_title(column: &Column) -> String {
    match column {
        Column::Canonical(attribute) => attribute.label().to_string(),
        Column::PassThrough(token) => token.clone(),
    }
}

fn format_headline(headline: &Headline) -> String {
    let mean_age = headline
        .mean_age
        .map(|age| age.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {}   {} {}   {} {}",
        "Respondentes:".bright_white().bold(),
        headline.total.to_string().cyan(),
        "Idade média:".bright_white().bold(),
        mean_age.cyan(),
        "Regiões:".bright_white().bold(),
        headline.regions.to_string().cyan()
    )
}
