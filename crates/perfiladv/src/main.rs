use std::path::PathBuf;

use crate::prelude::*;
use clap::Parser;

mod dataset;
mod error;
mod export;
mod load;
mod options;
mod prelude;
mod summary;
mod tables;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Load, normalize, filter and summarize survey data about Brazilian lawyers"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Directory holding the survey files (CSV, spreadsheet or PDF reports)
    #[clap(long, env = "PERFILADV_DATA_DIR", global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Read a single uploaded file instead of the data directory
    #[clap(long, global = true)]
    file: Option<PathBuf>,

    /// Always re-read the source instead of using the cache
    #[clap(long, global = true)]
    no_cache: bool,

    /// Cache directory (defaults to the user cache directory)
    #[clap(long, env = "PERFILADV_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "PERFILADV_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Show headline metrics and the (filtered) records
    Load(crate::load::LoadOptions),

    /// Build the summary table or the plain-text report
    Summary(crate::summary::SummaryOptions),

    /// Write the (filtered) records as CSV
    Export(crate::export::ExportOptions),

    /// List the values available for each filter
    Options(crate::options::OptionsOptions),

    /// Print the state lookup table and the column synonym table
    Tables(crate::tables::TablesOptions),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Load(options) => crate::load::run(options, app.global),
        SubCommands::Summary(options) => crate::summary::run(options, app.global),
        SubCommands::Export(options) => crate::export::run(options, app.global),
        SubCommands::Options(options) => crate::options::run(options, app.global),
        SubCommands::Tables(options) => crate::tables::run(options, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
