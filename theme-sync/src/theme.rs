use crate::common::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Key of the single remote settings row holding the storefront theme.
pub const CURRENT_THEME_KEY: &str = "current_theme";

/// Key under which the bootstrap value is stored in the local cache.
pub const LOCAL_CACHE_KEY: &str = "theme";

/// The closed set of storefront themes.
///
/// Values travel as kebab-case slugs (`mothers-day`) everywhere: in the remote
/// record, the local cache and on the cross-tab bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeValue {
    #[default]
    Default,
    Sparkling,
    Christmas,
    Diwali,
    Holi,
    Eid,
    MothersDay,
    FathersDay,
}

impl ThemeValue {
    /// Every theme, in catalogue order.
    pub const ALL: [ThemeValue; 8] = [
        ThemeValue::Default,
        ThemeValue::Sparkling,
        ThemeValue::Christmas,
        ThemeValue::Diwali,
        ThemeValue::Holi,
        ThemeValue::Eid,
        ThemeValue::MothersDay,
        ThemeValue::FathersDay,
    ];

    /// Slug used for storage and transport
    pub fn slug(&self) -> &'static str {
        match self {
            ThemeValue::Default => "default",
            ThemeValue::Sparkling => "sparkling",
            ThemeValue::Christmas => "christmas",
            ThemeValue::Diwali => "diwali",
            ThemeValue::Holi => "holi",
            ThemeValue::Eid => "eid",
            ThemeValue::MothersDay => "mothers-day",
            ThemeValue::FathersDay => "fathers-day",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeValue::Default => "Default",
            ThemeValue::Sparkling => "Sparkling",
            ThemeValue::Christmas => "Christmas",
            ThemeValue::Diwali => "Diwali",
            ThemeValue::Holi => "Holi",
            ThemeValue::Eid => "Eid",
            ThemeValue::MothersDay => "Mother's Day",
            ThemeValue::FathersDay => "Father's Day",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ThemeValue::Default => "Everyday storefront look",
            ThemeValue::Sparkling => "Glitter accents for launches and sales",
            ThemeValue::Christmas => "Red, green and snowfall for the holidays",
            ThemeValue::Diwali => "Warm lamps and rangoli colours",
            ThemeValue::Holi => "Bright festival-of-colours palette",
            ThemeValue::Eid => "Crescent moon and lantern motifs",
            ThemeValue::MothersDay => "Soft florals for Mother's Day gifting",
            ThemeValue::FathersDay => "Classic navy tones for Father's Day gifting",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ThemeValue::Default => "🎁",
            ThemeValue::Sparkling => "✨",
            ThemeValue::Christmas => "🎄",
            ThemeValue::Diwali => "🪔",
            ThemeValue::Holi => "🎨",
            ThemeValue::Eid => "🌙",
            ThemeValue::MothersDay => "💐",
            ThemeValue::FathersDay => "👔",
        }
    }
}

impl FromStr for ThemeValue {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeValue::ALL
            .iter()
            .copied()
            .find(|theme| theme.slug() == s)
            .ok_or_else(|| SyncError::InvalidCandidateValue(s.to_string()))
    }
}

impl Display for ThemeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// The remote settings row.
///
/// `value` is kept as the raw string the backend returned. Other writers share
/// the row, so it is only trusted after the reconciler has parsed it.
/// `version` is assigned by the store and grows with every upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRecord {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ThemeRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>, version: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            version,
            updated_at: Utc::now(),
        }
    }

    /// Parse the stored value against the catalogue
    pub fn theme(&self) -> Result<ThemeValue, SyncError> {
        self.value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;

    #[test]
    fn test_slug_round_trip_for_catalogue() {
        for theme in ThemeValue::ALL {
            let parsed: ThemeValue = assert_ok!(theme.slug().parse());
            assert_eq!(parsed, theme);
            assert_eq!(theme.to_string(), theme.slug());
        }
    }

    #[test]
    fn test_rejects_unknown_and_near_miss_slugs() {
        for input in ["", "not-a-real-theme", "Christmas", "mothers_day", " eid"] {
            let error = assert_err!(input.parse::<ThemeValue>());
            assert_eq!(error, SyncError::InvalidCandidateValue(input.to_string()));
        }
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = assert_ok!(serde_json::to_string(&ThemeValue::FathersDay));
        assert_eq!(json, "\"fathers-day\"");

        let theme: ThemeValue = assert_ok!(serde_json::from_str("\"mothers-day\""));
        assert_eq!(theme, ThemeValue::MothersDay);
    }

    #[test]
    fn test_default_theme() {
        assert_eq!(ThemeValue::default(), ThemeValue::Default);
    }

    #[test]
    fn test_record_deserializes_without_version() {
        let record: ThemeRecord = assert_ok!(serde_json::from_str(
            r#"{"key":"current_theme","value":"holi"}"#
        ));
        assert_eq!(record.version, 0);
        assert_eq!(assert_ok!(record.theme()), ThemeValue::Holi);
    }

    #[test]
    fn test_record_with_garbage_value() {
        let record = ThemeRecord::new(CURRENT_THEME_KEY, "halloween", 3);
        assert_err!(record.theme());
    }
}
