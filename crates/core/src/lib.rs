//! Core library for perfiladv
//!
//! This crate implements the **Functional Core** of the perfiladv toolkit,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The workspace splits the survey pipeline across crates:
//!
//! - **`perfiladv_core`** (this crate): the dataset model and the pure
//!   transformations applied to it
//! - **`pdf`**: table extraction from PDF reports
//! - **`perfiladv_ingest`**: locating and decoding source files, plus the
//!   cached `load_dataset` entry point
//! - **`perfiladv`**: the command-line shell (the Imperative Shell)
//!
//! Everything here works on in-memory data and can be tested with inline
//! fixtures. The only module that touches the filesystem is [`cache`], which
//! persists normalized datasets between runs.
//!
//! # Module Organization
//!
//! - [`raw`]: untyped tables as read from source files, delimiter detection
//! - [`record`]: canonical attributes, records and datasets
//! - [`schema`]: header normalization and the column synonym table
//! - [`age`]: lenient number parsing and the age-group bucketizer
//! - [`region`]: the state lookup table and region resolution
//! - [`filter`]: record filtering and filter option lists
//! - [`summary`]: the summary table, headline metrics and text report
//! - [`export`]: CSV rendering of datasets and summaries
//! - [`cache`]: fingerprint-keyed dataset cache
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use perfiladv_core::raw::RawTable;
//! use perfiladv_core::schema::normalize_table;
//! use perfiladv_core::summary::build_summary;
//!
//! let raw = RawTable::new(
//!     vec!["sexo".into(), "idade".into(), "estado".into()],
//!     vec![vec!["Feminino".into(), "30".into(), "SP".into()]],
//! );
//!
//! let dataset = normalize_table(&raw);
//! let summary = build_summary(&dataset);
//!
//! assert_eq!(summary[0].value, "1");
//! ```

pub mod age;
pub mod cache;
pub mod export;
pub mod filter;
pub mod raw;
pub mod record;
pub mod region;
pub mod schema;
pub mod summary;
