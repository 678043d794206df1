//! Runtime configuration.
//!
//! Defaults cover everything; a JSON object stored under [`CONFIG_KEY`] may
//! override any subset of fields.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::components::board::CourseColor;
use crate::persistence::KeyValueStore;

/// Local-storage key holding optional config overrides.
pub const CONFIG_KEY: &str = "pti_2026_config";

/// What a second click on the already-armed source course does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclickPolicy {
	/// Ignore it and keep waiting for a target.
	#[default]
	StayArmed,
	/// Drop the source and go back to idle.
	Cancel,
}

/// Color spellings accepted from the suggestion service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorVocabulary {
	/// Category names: `blue`, `green`, `yellow`, `red`, `purple`, `gray`, `white`.
	#[default]
	Named,
	/// Utility-class strings such as `bg-emerald-100`, matched by hue.
	ClassNames,
}

impl ColorVocabulary {
	/// Maps a raw color string to a category, or `None` if it is outside the vocabulary.
	pub fn parse(self, raw: &str) -> Option<CourseColor> {
		match self {
			Self::Named => CourseColor::from_name(raw),
			Self::ClassNames => raw
				.split_whitespace()
				.filter_map(|class| class.split('-').nth(1))
				.find_map(hue_to_color),
		}
	}
}

fn hue_to_color(hue: &str) -> Option<CourseColor> {
	Some(match hue {
		"blue" | "sky" | "indigo" => CourseColor::Blue,
		"green" | "emerald" | "teal" => CourseColor::Green,
		"yellow" | "amber" => CourseColor::Yellow,
		"red" | "rose" => CourseColor::Red,
		"purple" | "fuchsia" | "violet" => CourseColor::Purple,
		"gray" | "orange" => CourseColor::Gray,
		"white" | "slate" => CourseColor::White,
		_ => return None,
	})
}

/// Local-storage keys for the two persisted entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
	/// Key of the semester list.
	pub semesters: String,
	/// Key of the connection list.
	pub connections: String,
}

impl Default for StorageKeys {
	fn default() -> Self {
		Self {
			semesters: "pti_2026_semesters".into(),
			connections: "pti_2026_connections".into(),
		}
	}
}

/// Raster/PDF export settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
	/// Padding around the board, in pixels.
	pub padding: f64,
	/// Fill color behind the board.
	pub background: String,
	/// Download name prefix; the date and extension are appended.
	pub file_prefix: String,
}

impl Default for ExportConfig {
	fn default() -> Self {
		Self {
			padding: 40.0,
			background: "#f8fafc".into(),
			file_prefix: "kurikulum-pti-2026".into(),
		}
	}
}

/// Generative-language API settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
	/// Base URL of the models endpoint.
	pub endpoint: String,
	/// Model name.
	pub model: String,
	/// API key; the feature is disabled without one.
	pub api_key: Option<String>,
}

impl Default for SuggestionConfig {
	fn default() -> Self {
		Self {
			endpoint: "https://generativelanguage.googleapis.com/v1beta/models".into(),
			model: "gemini-3-flash-preview".into(),
			api_key: option_env!("GEMINI_API_KEY").map(str::to_owned),
		}
	}
}

/// Everything tunable about the board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
	/// Persisted entry keys.
	pub storage: StorageKeys,
	/// Re-click behavior while drawing a connection.
	pub reclick: ReclickPolicy,
	/// Accepted suggestion color spellings.
	pub color_vocabulary: ColorVocabulary,
	/// Delay before redrawing arrows after a drop, so card animations settle.
	pub drop_settle_ms: i32,
	/// Export settings.
	pub export: ExportConfig,
	/// Suggestion service settings.
	pub suggestion: SuggestionConfig,
}

impl Default for BoardConfig {
	fn default() -> Self {
		Self {
			storage: StorageKeys::default(),
			reclick: ReclickPolicy::default(),
			color_vocabulary: ColorVocabulary::default(),
			drop_settle_ms: Self::DROP_SETTLE_MS,
			export: ExportConfig::default(),
			suggestion: SuggestionConfig::default(),
		}
	}
}

impl BoardConfig {
	/// Default drop settle delay.
	pub const DROP_SETTLE_MS: i32 = 120;

	/// Reads overrides from `store`, falling back to defaults on any problem.
	pub fn load(store: &dyn KeyValueStore) -> Self {
		let Some(raw) = store.get(CONFIG_KEY) else {
			debug!("no config overrides, using defaults");
			return Self::default();
		};
		match Self::from_json(&raw) {
			Ok(config) => config,
			Err(err) => {
				warn!("ignoring invalid config in {CONFIG_KEY}: {err}");
				Self::default()
			}
		}
	}

	/// Parses a (possibly partial) JSON override object.
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		let mut config: Self = serde_json::from_str(raw)?;
		if config.suggestion.api_key.is_none() {
			config.suggestion.api_key = SuggestionConfig::default().api_key;
		}
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::persistence::MemoryStore;

	#[test]
	fn defaults_cover_every_setting() {
		let config = BoardConfig::default();
		assert_eq!(config.storage.semesters, "pti_2026_semesters");
		assert_eq!(config.storage.connections, "pti_2026_connections");
		assert_eq!(config.reclick, ReclickPolicy::StayArmed);
		assert_eq!(config.drop_settle_ms, BoardConfig::DROP_SETTLE_MS);
		assert_eq!(config.export.padding, 40.0);
	}

	#[test]
	fn partial_overrides_keep_other_defaults() {
		let config =
			BoardConfig::from_json(r#"{"reclick":"cancel","export":{"file_prefix":"plan"}}"#)
				.unwrap();
		assert_eq!(config.reclick, ReclickPolicy::Cancel);
		assert_eq!(config.export.file_prefix, "plan");
		assert_eq!(config.export.background, "#f8fafc");
		assert_eq!(config.storage, StorageKeys::default());
	}

	#[test]
	fn invalid_config_falls_back_to_defaults() {
		let store = MemoryStore::default();
		store.set(CONFIG_KEY, "{not json").unwrap();
		assert_eq!(BoardConfig::load(&store), BoardConfig::default());
	}

	#[test]
	fn named_vocabulary_accepts_category_names_only() {
		let v = ColorVocabulary::Named;
		assert_eq!(v.parse("Purple"), Some(CourseColor::Purple));
		assert_eq!(v.parse("bg-blue-50"), None);
		assert_eq!(v.parse("teal"), None);
	}

	#[test]
	fn class_vocabulary_maps_by_hue() {
		let v = ColorVocabulary::ClassNames;
		assert_eq!(v.parse("bg-emerald-50 text-emerald-700"), Some(CourseColor::Green));
		assert_eq!(v.parse("bg-orange-100"), Some(CourseColor::Gray));
		assert_eq!(v.parse("blue"), None);
	}
}
