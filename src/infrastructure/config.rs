use crate::domain::models::{PomodoroSettings, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::task_store::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const POMODORO_JSON: &str = "pomodoro.json";
const SCHEMA_VERSION: u64 = 1;
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub schema: u8,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema: 1,
            app_name: default_app_name(),
            autoplay: false,
            dark_mode: false,
            storage_key: default_storage_key(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroConfig {
    pub schema: u8,
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            schema: 1,
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl PomodoroConfig {
    pub fn settings(&self) -> PomodoroSettings {
        PomodoroSettings {
            work_minutes: self.work_minutes,
            break_minutes: self.break_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBundle {
    pub app: AppConfig,
    pub pomodoro: PomodoroConfig,
}

impl ConfigBundle {
    pub fn validate(&self) -> Result<(), InfraError> {
        if self.app.storage_key.trim().is_empty() {
            return Err(InfraError::InvalidConfig(
                "storageKey must not be empty".to_string(),
            ));
        }
        if self.app.tick_interval_ms == 0 {
            return Err(InfraError::InvalidConfig(
                "tickIntervalMs must be > 0".to_string(),
            ));
        }
        self.pomodoro
            .settings()
            .validate()
            .map_err(InfraError::InvalidConfig)
    }
}

fn default_app_name() -> String {
    "Task Timer".to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_work_minutes() -> u32 {
    DEFAULT_WORK_MINUTES
}

fn default_break_minutes() -> u32 {
    DEFAULT_BREAK_MINUTES
}

fn default_files() -> Result<HashMap<&'static str, serde_json::Value>, InfraError> {
    Ok(HashMap::from([
        (APP_JSON, serde_json::to_value(AppConfig::default())?),
        (POMODORO_JSON, serde_json::to_value(PomodoroConfig::default())?),
    ]))
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files()? {
        let path = config_dir.join(name);
        if !path.exists() {
            write_json(&path, &value)?;
        }
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), InfraError> {
    let formatted = serde_json::to_string_pretty(value)?;
    fs::write(path, format!("{formatted}\n"))?;
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SCHEMA_VERSION {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, InfraError> {
    let bundle = ConfigBundle {
        app: load_app_config(config_dir)?,
        pomodoro: serde_json::from_value(read_config(&config_dir.join(POMODORO_JSON))?)?,
    };
    bundle.validate()?;
    Ok(bundle)
}

pub fn load_app_config(config_dir: &Path) -> Result<AppConfig, InfraError> {
    Ok(serde_json::from_value(read_config(&config_dir.join(APP_JSON))?)?)
}

/// Applies `update` to `app.json` and writes it back, returning the new value.
pub fn update_app_config<F>(config_dir: &Path, update: F) -> Result<AppConfig, InfraError>
where
    F: FnOnce(&mut AppConfig),
{
    let mut app = load_app_config(config_dir)?;
    update(&mut app);
    write_json(&config_dir.join(APP_JSON), &app)?;
    Ok(app)
}

pub fn save_pomodoro_settings(
    config_dir: &Path,
    settings: &PomodoroSettings,
) -> Result<(), InfraError> {
    settings.validate().map_err(InfraError::InvalidInput)?;
    let config = PomodoroConfig {
        schema: 1,
        work_minutes: settings.work_minutes,
        break_minutes: settings.break_minutes,
    };
    write_json(&config_dir.join(POMODORO_JSON), &config)
}
