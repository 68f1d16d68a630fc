//! Read model catalogues.
//!
//! The format is picked by file extension: `.json` is JSON, anything else
//! (`.yaml`, `.yml`, no extension) is YAML. The schema is `domain::ModelsConfig`.

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::domain::ModelsConfig;
use crate::error::AppError;

/// Read and parse a model catalogue.
pub fn read_models_config(path: &Path) -> Result<ModelsConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model config '{}': {e}", path.display())))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: ModelsConfig = if is_json {
        serde_json::from_reader(file)
            .map_err(|e| AppError::new(2, format!("Invalid model config JSON '{}': {e}", path.display())))?
    } else {
        serde_yaml::from_reader(file)
            .map_err(|e| AppError::new(2, format!("Invalid model config YAML '{}': {e}", path.display())))?
    };

    info!(path = %path.display(), models = config.models.len(), "loaded model config");
    Ok(config)
}
