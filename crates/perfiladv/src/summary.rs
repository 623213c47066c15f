use std::path::PathBuf;

use perfiladv_core::export::write_summary_csv;
use perfiladv_core::raw::Delimiter;
use perfiladv_core::summary::{build_summary, render_text_report, SummaryEntry};

use crate::dataset::FilterArgs;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct SummaryOptions {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print the plain-text report instead of the summary table
    #[arg(long)]
    pub text: bool,

    /// Write the summary as CSV to this file
    #[arg(short, long, conflicts_with_all = ["json", "text"])]
    pub output: Option<PathBuf>,

    /// CSV delimiter: ';' or ','
    #[arg(short, long, default_value = ",")]
    pub delimiter: Delimiter,
}

pub fn run(options: SummaryOptions, global: crate::Global) -> Result<()> {
    let loaded = crate::dataset::load(&global)?;
    let filtered = options.filter.to_filter().apply(&loaded.dataset);

    if options.text {
        println!("{}", render_text_report(&filtered));
        return Ok(());
    }

    let entries = build_summary(&filtered);

    if let Some(path) = &options.output {
        let bytes = write_summary_csv(&entries, options.delimiter)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if global.verbose {
            println!("Wrote {} summary rows to {}", entries.len(), path.display());
        }
        return Ok(());
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        summary_table(&entries).printstd();
    }

    Ok(())
}

fn summary_table(entries: &[SummaryEntry]) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row![b->"Métrica", b->"Valor"]);
    for entry in entries {
        table.add_row(prettytable::row![entry.metric, r->entry.value]);
    }
    table
}
