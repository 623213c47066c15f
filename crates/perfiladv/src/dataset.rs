//! Shared plumbing: resolving the source, loading it and parsing filters.

use std::collections::BTreeSet;
use std::path::PathBuf;

use colored::Colorize;
use perfiladv_core::filter::Filter;
use perfiladv_core::region::Region;
use perfiladv_ingest::{load_dataset, LoadOptions, Loaded, Source};

use crate::prelude::{eprintln, *};
use crate::Global;

/// Filter flags shared by the subcommands that work on records.
#[derive(Debug, Clone, Default, clap::Args, serde::Serialize, serde::Deserialize)]
pub struct FilterArgs {
    /// Keep only these genders (comma-separated, repeatable)
    #[arg(long, value_delimiter = ',')]
    pub gender: Vec<String>,

    /// Keep only these races (comma-separated, repeatable)
    #[arg(long, value_delimiter = ',')]
    pub race: Vec<String>,

    /// Keep only these regions (comma-separated, repeatable), e.g. sudeste
    #[arg(long, value_delimiter = ',')]
    pub region: Vec<Region>,
}

fn value_set(values: &[String]) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    (!set.is_empty()).then_some(set)
}

impl FilterArgs {
    pub fn to_filter(&self) -> Filter {
        let region: BTreeSet<String> = self.region.iter().map(|r| r.to_string()).collect();
        Filter {
            gender: value_set(&self.gender),
            race: value_set(&self.race),
            region: (!region.is_empty()).then_some(region),
        }
    }
}

impl Global {
    pub fn source(&self) -> Source {
        match &self.file {
            Some(path) => Source::File(path.clone()),
            None => Source::Dir(self.data_dir.clone()),
        }
    }

    fn cache_dir(&self) -> Result<PathBuf, Error> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs_next::cache_dir()
                .map(|dir| dir.join("perfiladv"))
                .ok_or(Error::NoCacheDir),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        if self.no_cache {
            return LoadOptions::without_cache();
        }
        match self.cache_dir() {
            Ok(dir) => LoadOptions::with_cache(dir),
            Err(e) => {
                log::warn!("{e}; caching disabled");
                LoadOptions::without_cache()
            }
        }
    }
}

/// Load the dataset for the global source, reporting skipped input on
/// stderr.
pub fn load(global: &Global) -> Result<Loaded> {
    let source = global.source();
    if global.verbose {
        eprintln!("Loading {}", source.path().display());
    }

    let loaded = load_dataset(&source, &global.load_options())
        .with_context(|| format!("Failed to load {}", source.path().display()))?;

    if global.verbose {
        eprintln!(
            "Read {} records from {} ({}){}",
            loaded.dataset.len(),
            loaded.format,
            loaded
                .sources
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            if loaded.from_cache { " via cache" } else { "" }
        );
    }

    if loaded.is_partial() {
        eprintln!(
            "{}",
            "Warning: some input could not be read; results may be incomplete."
                .yellow()
                .bold()
        );
        for file in &loaded.skipped_files {
            eprintln!("  skipped file {}: {}", file.path.display(), file.reason);
        }
        for page in &loaded.skipped_pages {
            eprintln!(
                "  skipped page {} of {}: {}",
                page.page,
                page.file.display(),
                page.reason
            );
        }
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::{App, SubCommands};

    fn args(gender: &[&str], race: &[&str], region: &[Region]) -> FilterArgs {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();
        FilterArgs {
            gender: owned(gender),
            race: owned(race),
            region: region.to_vec(),
        }
    }

    #[test]
    fn test_empty_args_build_empty_filter() {
        assert!(args(&[], &[], &[]).to_filter().is_empty());
        assert!(args(&[" "], &[], &[]).to_filter().is_empty());
    }

    #[test]
    fn test_regions_use_display_names() {
        let filter = args(&[], &[], &[Region::Sudeste, Region::CentroOeste]).to_filter();
        let regions = filter.region.unwrap();
        assert!(regions.contains("Sudeste"));
        assert!(regions.contains("Centro-Oeste"));
    }

    #[test]
    fn test_region_flag_is_canonicalized() {
        let app = App::try_parse_from(["perfiladv", "export", "--region", "sudeste,centro oeste"])
            .unwrap();
        let SubCommands::Export(options) = app.command else {
            panic!("expected the export subcommand");
        };
        assert_eq!(options.filter.region, vec![Region::Sudeste, Region::CentroOeste]);
    }

    #[test]
    fn test_unknown_region_is_rejected() {
        let err = App::try_parse_from(["perfiladv", "summary", "--region", "Atlântida"]).unwrap_err();
        assert!(err.to_string().contains("Atlântida"));
    }

    #[test]
    fn test_gender_and_race_kept_verbatim() {
        let filter = args(&["Feminino"], &["Parda", "Preta"], &[]).to_filter();
        assert_eq!(filter.gender.unwrap().len(), 1);
        assert_eq!(filter.race.unwrap().len(), 2);
        assert!(filter.region.is_none());
    }

    #[test]
    fn test_file_overrides_data_dir() {
        let global = Global {
            data_dir: PathBuf::from("data"),
            file: Some(PathBuf::from("upload.csv")),
            no_cache: true,
            cache_dir: None,
            verbose: false,
        };
        assert_eq!(global.source(), Source::File(PathBuf::from("upload.csv")));
        assert!(global.load_options().cache_dir.is_none());
    }
}
