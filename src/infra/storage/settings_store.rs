use crate::domain::models::{AppError, MapSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    schema_version: u8,
    #[serde(default)]
    map: MapSettings,
}

/// Reads settings, writing the defaults first when the file does not exist.
pub fn load_or_default_settings(path: &Path) -> Result<MapSettings, AppError> {
    if !path.exists() {
        let settings = MapSettings::default();
        save_settings(path, &settings)?;
        tracing::info!("wrote default settings to {}", path.display());
        return Ok(settings);
    }
    load_settings(path)
}

pub fn load_settings(path: &Path) -> Result<MapSettings, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        AppError::new(
            "SETTINGS_READ_FAIL",
            format!("failed to read settings: {error}"),
            Some("check that settings.json is readable".to_string()),
        )
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|error| {
        AppError::new(
            "SETTINGS_PARSE_FAIL",
            format!("failed to parse settings json: {error}"),
            None,
        )
    })?;

    let schema_version = value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if schema_version > u64::from(CURRENT_SCHEMA_VERSION) {
        return Err(AppError::new(
            "SETTINGS_PARSE_FAIL",
            format!(
                "schemaVersion {schema_version} is newer than supported {}",
                CURRENT_SCHEMA_VERSION
            ),
            Some("upgrade the application and retry".to_string()),
        ));
    }

    let map = match value.get("map") {
        Some(map) => serde_json::from_value::<MapSettings>(map.clone()).map_err(|error| {
            AppError::new(
                "SETTINGS_PARSE_FAIL",
                format!("failed to decode map settings: {error}"),
                None,
            )
        })?,
        None => MapSettings::default(),
    };
    Ok(map)
}

pub fn save_settings(path: &Path, settings: &MapSettings) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| {
            AppError::new(
                "SETTINGS_WRITE_FAIL",
                format!("failed to create settings dir: {error}"),
                None,
            )
        })?;
    }
    let file = SettingsFile {
        schema_version: CURRENT_SCHEMA_VERSION,
        map: settings.clone(),
    };
    let raw = serde_json::to_string_pretty(&file).map_err(|error| {
        AppError::new(
            "SETTINGS_WRITE_FAIL",
            format!("failed to serialize settings: {error}"),
            None,
        )
    })?;
    std::fs::write(path, raw).map_err(|error| {
        AppError::new(
            "SETTINGS_WRITE_FAIL",
            format!("failed to write settings: {error}"),
            Some("check disk space and path permissions".to_string()),
        )
    })
}
