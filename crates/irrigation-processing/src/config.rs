//! Configuration types for dataset preparation.
//!
//! Column names are exact-match strings. The defaults describe the sensor
//! export the system was built around; a different export only needs a
//! different [`DatasetConfig`].

use serde::{Deserialize, Serialize};

/// Default regression target (soil moisture, percent).
pub const DEFAULT_REGRESSION_TARGET: &str = "Umidade do Solo";
/// Default classification target (irrigation relay state).
pub const DEFAULT_CLASSIFICATION_TARGET: &str = "Relay_On";
/// Default crop column.
pub const DEFAULT_CROP_COLUMN: &str = "Cultura";
/// Default phenological stage column.
pub const DEFAULT_STAGE_COLUMN: &str = "Estágio Fenológico";
/// Default date column.
pub const DEFAULT_DATE_COLUMN: &str = "Data";

/// The learning task a dataset is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Predict soil moisture (continuous target).
    Regression,
    /// Predict relay activation (binary target).
    Classification,
}

impl Task {
    /// Lowercase name, used for artifact file names and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Regression => "regression",
            Task::Classification => "classification",
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column layout of the raw dataset.
///
/// Use [`DatasetConfig::builder()`] to override individual names.
///
/// # Example
///
/// ```rust,ignore
/// use irrigation_processing::DatasetConfig;
///
/// let config = DatasetConfig::builder()
///     .regression_target("Soil Moisture")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Target column for [`Task::Regression`].
    /// Default: "Umidade do Solo"
    pub regression_target: String,

    /// Target column for [`Task::Classification`].
    /// It is also dropped from the regression feature set.
    /// Default: "Relay_On"
    pub classification_target: String,

    /// Identifier, timestamp and status columns removed before encoding.
    /// Default: ["ID", "Data", "Hora", "Status de Irrigação"]
    pub dropped_columns: Vec<String>,

    /// Crop type column, one-hot encoded.
    /// Default: "Cultura"
    pub crop_column: String,

    /// Prefix of the crop one-hot columns (`{prefix}_{crop}`).
    /// Default: "Cultura"
    pub crop_prefix: String,

    /// Phenological stage column, one-hot encoded.
    /// Default: "Estágio Fenológico"
    pub stage_column: String,

    /// Prefix of the stage one-hot columns (`{prefix}_{stage}`).
    /// Default: "Estagio"
    pub stage_prefix: String,

    /// Date column used for the dataset summary period.
    /// Default: "Data"
    pub date_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            regression_target: DEFAULT_REGRESSION_TARGET.to_string(),
            classification_target: DEFAULT_CLASSIFICATION_TARGET.to_string(),
            dropped_columns: default_dropped_columns(),
            crop_column: DEFAULT_CROP_COLUMN.to_string(),
            crop_prefix: "Cultura".to_string(),
            stage_column: DEFAULT_STAGE_COLUMN.to_string(),
            stage_prefix: "Estagio".to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
        }
    }
}

fn default_dropped_columns() -> Vec<String> {
    ["ID", "Data", "Hora", "Status de Irrigação"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl DatasetConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DatasetConfigBuilder {
        DatasetConfigBuilder::default()
    }

    /// Target column for the given task.
    pub fn target_for(&self, task: Task) -> &str {
        match task {
            Task::Regression => &self.regression_target,
            Task::Classification => &self.classification_target,
        }
    }

    /// Columns removed before one-hot encoding for the given task.
    ///
    /// Regression additionally drops the relay state, which would otherwise
    /// leak the irrigation outcome into the moisture model.
    pub fn columns_to_drop(&self, task: Task) -> Vec<&str> {
        let mut columns: Vec<&str> = self.dropped_columns.iter().map(String::as_str).collect();
        if task == Task::Regression {
            columns.push(&self.classification_target);
        }
        columns
    }

    /// Name of the one-hot column for a crop value.
    pub fn crop_feature(&self, crop: &str) -> String {
        format!("{}_{}", self.crop_prefix, crop)
    }

    /// Name of the one-hot column for a stage value.
    pub fn stage_feature(&self, stage: &str) -> String {
        format!("{}_{}", self.stage_prefix, stage)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let named = [
            ("regression_target", &self.regression_target),
            ("classification_target", &self.classification_target),
            ("crop_column", &self.crop_column),
            ("crop_prefix", &self.crop_prefix),
            ("stage_column", &self.stage_column),
            ("stage_prefix", &self.stage_prefix),
            ("date_column", &self.date_column),
        ];
        for (field, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(field.to_string()));
            }
        }

        if self.regression_target == self.classification_target {
            return Err(ConfigValidationError::TargetsCollide(
                self.regression_target.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column name for '{0}' must not be empty")]
    EmptyColumnName(String),

    #[error("Regression and classification targets are both '{0}'")]
    TargetsCollide(String),
}

/// Builder for [`DatasetConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DatasetConfigBuilder {
    regression_target: Option<String>,
    classification_target: Option<String>,
    dropped_columns: Option<Vec<String>>,
    crop_column: Option<String>,
    crop_prefix: Option<String>,
    stage_column: Option<String>,
    stage_prefix: Option<String>,
    date_column: Option<String>,
}

impl DatasetConfigBuilder {
    /// Set the regression target column.
    pub fn regression_target(mut self, column: impl Into<String>) -> Self {
        self.regression_target = Some(column.into());
        self
    }

    /// Set the classification target column.
    pub fn classification_target(mut self, column: impl Into<String>) -> Self {
        self.classification_target = Some(column.into());
        self
    }

    /// Replace the list of columns dropped before encoding.
    pub fn dropped_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropped_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the crop column and its one-hot prefix.
    pub fn crop_column(mut self, column: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.crop_column = Some(column.into());
        self.crop_prefix = Some(prefix.into());
        self
    }

    /// Set the stage column and its one-hot prefix.
    pub fn stage_column(mut self, column: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.stage_column = Some(column.into());
        self.stage_prefix = Some(prefix.into());
        self
    }

    /// Set the date column.
    pub fn date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DatasetConfig` or an error if validation fails.
    pub fn build(self) -> Result<DatasetConfig, ConfigValidationError> {
        let defaults = DatasetConfig::default();
        let config = DatasetConfig {
            regression_target: self.regression_target.unwrap_or(defaults.regression_target),
            classification_target: self
                .classification_target
                .unwrap_or(defaults.classification_target),
            dropped_columns: self.dropped_columns.unwrap_or(defaults.dropped_columns),
            crop_column: self.crop_column.unwrap_or(defaults.crop_column),
            crop_prefix: self.crop_prefix.unwrap_or(defaults.crop_prefix),
            stage_column: self.stage_column.unwrap_or(defaults.stage_column),
            stage_prefix: self.stage_prefix.unwrap_or(defaults.stage_prefix),
            date_column: self.date_column.unwrap_or(defaults.date_column),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatasetConfig::default();
        assert_eq!(config.regression_target, "Umidade do Solo");
        assert_eq!(config.classification_target, "Relay_On");
        assert_eq!(config.dropped_columns.len(), 4);
        assert_eq!(config.crop_feature("SOJA"), "Cultura_SOJA");
        assert_eq!(config.stage_feature("Vegetativo"), "Estagio_Vegetativo");
    }

    #[test]
    fn test_columns_to_drop_per_task() {
        let config = DatasetConfig::default();
        let regression = config.columns_to_drop(Task::Regression);
        let classification = config.columns_to_drop(Task::Classification);

        assert!(regression.contains(&"Relay_On"));
        assert!(!classification.contains(&"Relay_On"));
        assert!(classification.contains(&"Hora"));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = DatasetConfig::builder()
            .regression_target("moisture")
            .crop_column("crop", "crop")
            .dropped_columns(["id"])
            .build()
            .unwrap();

        assert_eq!(config.target_for(Task::Regression), "moisture");
        assert_eq!(config.crop_feature("corn"), "crop_corn");
        assert_eq!(config.dropped_columns, vec!["id".to_string()]);
    }

    #[test]
    fn test_validation_empty_name() {
        let result = DatasetConfig::builder().regression_target("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyColumnName(field) if field == "regression_target"
        ));
    }

    #[test]
    fn test_validation_targets_collide() {
        let result = DatasetConfig::builder()
            .regression_target("y")
            .classification_target("y")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::TargetsCollide(_)
        ));
    }

    #[test]
    fn test_task_as_str() {
        assert_eq!(Task::Regression.as_str(), "regression");
        assert_eq!(Task::Classification.to_string(), "classification");
    }
}
