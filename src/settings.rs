//! Persisted user settings.

use crate::comparison::ComparisonMode;
use crate::record::TimeRange;
use crate::store::{load_or_default, save_json, KeyValueStore, StoreError, SETTINGS_KEY};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// User preferences. Fields missing from the stored document take their
/// default values, so older documents keep loading as settings are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: Theme,
    pub notifications: bool,
    pub default_comparison_mode: ComparisonMode,
    pub default_time_range: TimeRange,
    pub auto_refresh: bool,
    /// Minutes between refreshes
    pub refresh_interval: u32,
    pub show_volatility_alerts: bool,
    pub compact_mode: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            theme: Theme::Dark,
            notifications: true,
            default_comparison_mode: ComparisonMode::Latest,
            default_time_range: TimeRange::Month,
            auto_refresh: false,
            refresh_interval: 5,
            show_volatility_alerts: true,
            compact_mode: false,
        }
    }
}

/// Partial update; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_comparison_mode: Option<ComparisonMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_time_range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_refresh: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_volatility_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_mode: Option<bool>,
}

/// Errors raised when applying a settings update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Only latest/week/month/year can be the default comparison
    UnsupportedDefaultMode(ComparisonMode),
    /// Refresh interval must be at least one minute
    InvalidRefreshInterval(u32),
    Store(StoreError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnsupportedDefaultMode(mode) => {
                write!(f, "'{}' cannot be the default comparison mode", mode)
            }
            SettingsError::InvalidRefreshInterval(minutes) => {
                write!(f, "Refresh interval must be at least 1 minute, got {}", minutes)
            }
            SettingsError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<StoreError> for SettingsError {
    fn from(err: StoreError) -> Self {
        SettingsError::Store(err)
    }
}

impl UserSettings {
    /// Applies `patch` on top of these settings after validating it.
    pub fn apply(&self, patch: &SettingsPatch) -> Result<UserSettings, SettingsError> {
        if let Some(mode) = patch.default_comparison_mode {
            if !is_default_mode(mode) {
                return Err(SettingsError::UnsupportedDefaultMode(mode));
            }
        }
        if let Some(minutes) = patch.refresh_interval {
            if minutes == 0 {
                return Err(SettingsError::InvalidRefreshInterval(minutes));
            }
        }

        Ok(UserSettings {
            theme: patch.theme.unwrap_or(self.theme),
            notifications: patch.notifications.unwrap_or(self.notifications),
            default_comparison_mode: patch
                .default_comparison_mode
                .unwrap_or(self.default_comparison_mode),
            default_time_range: patch.default_time_range.unwrap_or(self.default_time_range),
            auto_refresh: patch.auto_refresh.unwrap_or(self.auto_refresh),
            refresh_interval: patch.refresh_interval.unwrap_or(self.refresh_interval),
            show_volatility_alerts: patch
                .show_volatility_alerts
                .unwrap_or(self.show_volatility_alerts),
            compact_mode: patch.compact_mode.unwrap_or(self.compact_mode),
        })
    }
}

fn is_default_mode(mode: ComparisonMode) -> bool {
    !matches!(mode, ComparisonMode::Decade | ComparisonMode::Custom)
}

/// Loads settings, merging the stored document over the defaults.
///
/// Stored values that an update would reject are replaced by their defaults.
pub fn load_settings<S: KeyValueStore + ?Sized>(store: &S) -> UserSettings {
    let mut settings: UserSettings = load_or_default(store, SETTINGS_KEY);
    let defaults = UserSettings::default();

    if !is_default_mode(settings.default_comparison_mode) {
        tracing::warn!(
            mode = %settings.default_comparison_mode,
            "Stored default comparison mode is not allowed, using {}",
            defaults.default_comparison_mode
        );
        settings.default_comparison_mode = defaults.default_comparison_mode;
    }
    if settings.refresh_interval == 0 {
        tracing::warn!("Stored refresh interval is 0, using {}", defaults.refresh_interval);
        settings.refresh_interval = defaults.refresh_interval;
    }

    settings
}

/// Applies `patch` to the stored settings and persists the result.
pub fn update_settings<S: KeyValueStore + ?Sized>(
    store: &mut S,
    patch: &SettingsPatch,
) -> Result<UserSettings, SettingsError> {
    let updated = load_settings(&*store).apply(patch)?;
    save_json(store, SETTINGS_KEY, &updated)?;
    tracing::info!(?patch, "Updated settings");
    Ok(updated)
}

/// Stores and returns the default settings.
pub fn reset_settings<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<UserSettings, StoreError> {
    let defaults = UserSettings::default();
    save_json(store, SETTINGS_KEY, &defaults)?;
    Ok(defaults)
}
