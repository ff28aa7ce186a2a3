//! Per-session privacy settings and retention bounds.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Shortest allowed retention window (1 hour).
pub const MIN_RETENTION_HOURS: u32 = 1;

/// Longest allowed retention window (1 week).
pub const MAX_RETENTION_HOURS: u32 = 168;

/// Retention used when neither the caller nor configuration supplies one.
pub const DEFAULT_RETENTION_HOURS: u32 = 24;

/// Privacy settings fixed at session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub data_retention_hours: u32,
    pub allow_cloud_processing: bool,
    pub anonymize_data: bool,
    pub delete_images_immediately: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            data_retention_hours: DEFAULT_RETENTION_HOURS,
            allow_cloud_processing: true,
            anonymize_data: true,
            delete_images_immediately: true,
        }
    }
}

impl PrivacySettings {
    /// Merge caller overrides over defaults, using `default_retention_hours`
    /// when the caller does not pick a retention window.
    ///
    /// Fails with [`CoreError::Configuration`] when the resulting retention
    /// lies outside `[MIN_RETENTION_HOURS, MAX_RETENTION_HOURS]`.
    pub fn resolve(
        overrides: &PrivacyOverrides,
        default_retention_hours: u32,
    ) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let settings = Self {
            data_retention_hours: overrides
                .data_retention_hours
                .unwrap_or(default_retention_hours),
            allow_cloud_processing: overrides
                .allow_cloud_processing
                .unwrap_or(defaults.allow_cloud_processing),
            anonymize_data: overrides.anonymize_data.unwrap_or(defaults.anonymize_data),
            delete_images_immediately: overrides
                .delete_images_immediately
                .unwrap_or(defaults.delete_images_immediately),
        };

        if !retention_in_bounds(settings.data_retention_hours) {
            return Err(CoreError::Configuration(format!(
                "data_retention_hours must be between {MIN_RETENTION_HOURS} and {MAX_RETENTION_HOURS} (got {})",
                settings.data_retention_hours
            )));
        }

        Ok(settings)
    }

    /// The retention window as a duration.
    pub fn retention(&self) -> Duration {
        Duration::hours(i64::from(self.data_retention_hours))
    }
}

/// Caller-supplied privacy preferences. Unset fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyOverrides {
    #[serde(default)]
    pub data_retention_hours: Option<u32>,
    #[serde(default)]
    pub allow_cloud_processing: Option<bool>,
    #[serde(default)]
    pub anonymize_data: Option<bool>,
    #[serde(default)]
    pub delete_images_immediately: Option<bool>,
}

impl PrivacyOverrides {
    pub fn with_retention_hours(hours: u32) -> Self {
        Self {
            data_retention_hours: Some(hours),
            ..Self::default()
        }
    }

    /// Validate caller input before it reaches the session manager.
    ///
    /// Unlike [`PrivacySettings::resolve`] this reports a
    /// [`CoreError::Validation`], since the bad value came from a client.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.data_retention_hours {
            Some(hours) if !retention_in_bounds(hours) => Err(CoreError::Validation(format!(
                "data_retention_hours must be between {MIN_RETENTION_HOURS} and {MAX_RETENTION_HOURS}"
            ))),
            _ => Ok(()),
        }
    }
}

fn retention_in_bounds(hours: u32) -> bool {
    (MIN_RETENTION_HOURS..=MAX_RETENTION_HOURS).contains(&hours)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_overrides_use_defaults() {
        let settings = PrivacySettings::resolve(&PrivacyOverrides::default(), 24).unwrap();
        assert_eq!(settings, PrivacySettings::default());
    }

    #[test]
    fn configured_default_retention_applies() {
        let settings = PrivacySettings::resolve(&PrivacyOverrides::default(), 48).unwrap();
        assert_eq!(settings.data_retention_hours, 48);
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(PrivacySettings::resolve(&PrivacyOverrides::with_retention_hours(1), 24).is_ok());
        assert!(
            PrivacySettings::resolve(&PrivacyOverrides::with_retention_hours(168), 24).is_ok()
        );
    }

    #[test]
    fn out_of_bounds_retention_is_configuration_error() {
        assert_matches!(
            PrivacySettings::resolve(&PrivacyOverrides::with_retention_hours(0), 24),
            Err(CoreError::Configuration(_))
        );
        assert_matches!(
            PrivacySettings::resolve(&PrivacyOverrides::with_retention_hours(169), 24),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn misconfigured_default_is_rejected() {
        assert_matches!(
            PrivacySettings::resolve(&PrivacyOverrides::default(), 0),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn overrides_validate_reports_validation_error() {
        assert_matches!(
            PrivacyOverrides::with_retention_hours(500).validate(),
            Err(CoreError::Validation(_))
        );
        assert!(PrivacyOverrides::default().validate().is_ok());
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let overrides = PrivacyOverrides {
            allow_cloud_processing: Some(false),
            ..Default::default()
        };
        let settings = PrivacySettings::resolve(&overrides, 24).unwrap();
        assert!(!settings.allow_cloud_processing);
        assert!(settings.anonymize_data);
        assert!(settings.delete_images_immediately);
    }
}
