use std::io::Write;
use std::path::PathBuf;

use perfiladv_core::export::write_dataset_csv;
use perfiladv_core::raw::Delimiter;

use crate::dataset::FilterArgs;
use crate::prelude::{eprintln, *};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct ExportOptions {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output file (stdout when omitted), e.g. perfil_adv_filtrado.csv
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// CSV delimiter: ';' or ','
    #[arg(short, long, default_value = ",")]
    pub delimiter: Delimiter,
}

pub fn run(options: ExportOptions, global: crate::Global) -> Result<()> {
    let loaded = crate::dataset::load(&global)?;
    let filtered = options.filter.to_filter().apply(&loaded.dataset);
    let bytes = write_dataset_csv(&filtered, options.delimiter)?;

    match &options.output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if global.verbose {
                eprintln!("Wrote {} records to {}", filtered.len(), path.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
