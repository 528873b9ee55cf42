use crate::mouse_gestures::db::GestureMap;
use crate::mouse_gestures::engine::TrackerConfig;
use crate::mouse_gestures::exclusion::normalize_excluded_rules;
use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

pub const SETTINGS_FILE: &str = "settings.json";
pub const EXPORT_SCHEMA: u32 = 1;
pub const EXPORT_FILE_NAME: &str = "mouse-gesture-config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GestureSettings {
    /// Gesture string to action. Defaults to the built-in map when absent or
    /// not an object; malformed entries are dropped individually.
    #[serde(default, deserialize_with = "lenient_gesture_map")]
    pub gesture_map: GestureMap,
    /// Exclusion rules, one per entry. See [`crate::mouse_gestures::exclusion`].
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub excluded_urls: Vec<String>,
    /// Ask before the close-window gesture closes anything.
    #[serde(default = "default_true", deserialize_with = "lenient_bool_default_true")]
    pub confirm_close_window: bool,
    #[serde(default = "default_true", deserialize_with = "lenient_bool_default_true")]
    pub show_trail: bool,
    /// When enabled the logger is initialised at debug level.
    #[serde(default, deserialize_with = "lenient_bool_default_false")]
    pub debug_logging: bool,
    #[serde(default, deserialize_with = "lenient_tracker")]
    pub tracker: TrackerConfig,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            gesture_map: GestureMap::default(),
            excluded_urls: Vec::new(),
            confirm_close_window: true,
            show_trail: true,
            debug_logging: false,
            tracker: TrackerConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Accepts booleans, `"true"`/`"false"` strings and numbers. Anything else
/// falls back to `true`, the default for every field using it.
fn lenient_bool_default_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_bool(&value).unwrap_or(true))
}

fn lenient_bool_default_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_bool(&value).unwrap_or(false))
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Arrays of anything become trimmed, non-empty strings; non-arrays become empty.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(string_list(&value))
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_gesture_map<'de, D>(deserializer: D) -> Result<GestureMap, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(gesture_map_from_value(&value).unwrap_or_else(|| {
        tracing::warn!("gestureMap is not an object; using the default map");
        GestureMap::default()
    }))
}

/// Map entries from a JSON object. `null` values mean `none`, other
/// non-strings are stringified and then validated like any action name.
fn gesture_map_from_value(value: &Value) -> Option<GestureMap> {
    let map = value.as_object()?;
    Some(GestureMap::from_entries(map.iter().map(|(key, action)| {
        let action = match action {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        (key.clone(), action)
    })))
}

fn lenient_tracker<'de, D>(deserializer: D) -> Result<TrackerConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        tracing::warn!(?err, "invalid tracker tuning; using defaults");
        TrackerConfig::default()
    }))
}

impl GestureSettings {
    /// Load settings from `path`. A missing or empty file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: GestureSettings = serde_json::from_str(&content)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Like [`load`](Self::load) but a malformed file degrades to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "invalid gesture settings; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Normalize the exclusion list and clamp tracker tuning. Returns `true` if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let rules_changed = normalize_excluded_rules(&mut self.excluded_urls);
        let tracker_changed = self.tracker.sanitize();
        if tracker_changed {
            tracing::warn!("gesture tracker tuning out of range; using defaults");
        }
        rules_changed || tracker_changed
    }

    pub fn export(&self) -> ConfigExport {
        ConfigExport {
            schema: EXPORT_SCHEMA,
            exported_at: chrono::Utc::now().to_rfc3339(),
            gesture_map: self.gesture_map.clone(),
            excluded_urls: self.excluded_urls.clone(),
            confirm_close_window: self.confirm_close_window,
            show_trail: self.show_trail,
        }
    }

    pub fn export_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Build settings from an exported payload.
    ///
    /// The text must be JSON with a `gestureMap` object; every other field is
    /// optional and defaults when missing or malformed. Fields outside the
    /// export format keep their current values.
    pub fn import(&self, text: &str) -> anyhow::Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| anyhow!("config is not valid JSON: {err}"))?;
        let gesture_map = value
            .get("gestureMap")
            .and_then(gesture_map_from_value)
            .ok_or_else(|| anyhow!("config is missing gestureMap or it is not an object"))?;

        let mut settings = Self {
            gesture_map,
            excluded_urls: value
                .get("excludedUrls")
                .map(string_list)
                .unwrap_or_default(),
            confirm_close_window: value
                .get("confirmCloseWindow")
                .and_then(lenient_bool)
                .unwrap_or(true),
            show_trail: value
                .get("showTrail")
                .and_then(lenient_bool)
                .unwrap_or(true),
            debug_logging: self.debug_logging,
            tracker: self.tracker,
        };
        settings.sanitize();
        Ok(settings)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigExport {
    pub schema: u32,
    pub exported_at: String,
    pub gesture_map: GestureMap,
    pub excluded_urls: Vec<String>,
    pub confirm_close_window: bool,
    pub show_trail: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mouse_gestures::db::GestureAction;

    #[test]
    fn missing_fields_use_defaults() {
        let settings: GestureSettings = serde_json::from_str("{}").expect("parse");
        assert_eq!(settings, GestureSettings::default());
    }

    #[test]
    fn lenient_booleans() {
        let settings: GestureSettings = serde_json::from_str(
            r#"{"confirmCloseWindow": " FALSE ", "showTrail": 0, "excludedUrls": "nope"}"#,
        )
        .expect("parse");
        assert!(!settings.confirm_close_window);
        assert!(!settings.show_trail);
        assert!(settings.excluded_urls.is_empty());

        let settings: GestureSettings =
            serde_json::from_str(r#"{"confirmCloseWindow": "maybe"}"#).expect("parse");
        assert!(settings.confirm_close_window);
    }

    #[test]
    fn import_requires_gesture_map() {
        let base = GestureSettings::default();
        assert!(base.import("not json").is_err());
        assert!(base.import(r#"{"excludedUrls": []}"#).is_err());
        assert!(base.import(r#"{"gestureMap": []}"#).is_err());
    }

    #[test]
    fn import_cleans_entries() {
        let base = GestureSettings::default();
        let settings = base
            .import(
                r#"{
                    "schema": 1,
                    "gestureMap": {"ul": "tabLeft", "XYZ": "back", "R": null},
                    "excludedUrls": ["  a.com ", "", 3],
                    "confirmCloseWindow": "false",
                    "showTrail": 1
                }"#,
            )
            .expect("import");
        assert_eq!(settings.gesture_map.len(), 2);
        assert_eq!(
            settings.gesture_map.resolve(&"UL".parse().expect("gesture")),
            GestureAction::TabLeft
        );
        assert_eq!(
            settings.gesture_map.get(&"R".parse().expect("gesture")),
            Some(GestureAction::None)
        );
        assert_eq!(settings.excluded_urls, vec!["a.com".to_string(), "3".to_string()]);
        assert!(!settings.confirm_close_window);
        assert!(settings.show_trail);
    }

    #[test]
    fn export_payload_shape() {
        let value = serde_json::to_value(GestureSettings::default().export()).expect("serialize");
        assert_eq!(value["schema"], 1);
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["gestureMap"]["UR"], "tabRight");
        assert_eq!(value["confirmCloseWindow"], true);
        assert!(value.get("debugLogging").is_none());
    }
}
