//! Irrigation Dataset Processing
//!
//! Loads sensor/weather exports and turns them into numeric feature matrices
//! for the irrigation models.
//!
//! # Overview
//!
//! - **Loading**: [`read_csv`] with a forgiving fallback chain
//! - **Preparation**: [`FeaturePreprocessor`] drops bookkeeping columns,
//!   one-hot encodes crop and phenological stage, coerces everything else to
//!   `Float64` and removes incomplete rows
//! - **Helpers**: [`filter_by_crop`], [`summarize`], [`column_means`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use irrigation_processing::{read_csv, DatasetConfig, FeaturePreprocessor, Task};
//!
//! let df = read_csv("sensores.csv")?;
//! let preprocessor = FeaturePreprocessor::new(DatasetConfig::default());
//! let prepared = preprocessor.prepare(&df, Task::Regression)?;
//!
//! println!("{} rows, features: {:?}", prepared.n_rows(), prepared.feature_names);
//! ```
//!
//! # Feature schema
//!
//! One-hot columns exist only for categories present in the input, so the
//! feature set depends on the data. Downstream code must align features by
//! name, never by position.

pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod preprocessing;
pub mod utils;

pub use config::{ConfigValidationError, DatasetConfig, DatasetConfigBuilder, Task};
pub use dataset::{DatasetSummary, Period, column_means, filter_by_crop, summarize};
pub use error::{ProcessingError, Result, ResultExt};
pub use io::{read_csv, read_csv_str};
pub use preprocessing::{FeaturePreprocessor, PreparationReport, PreparedDataset};
