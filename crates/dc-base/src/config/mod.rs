//! YAML configuration loader for the domain catalog and UI themes.
use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock};

use serde::Deserialize;

use crate::types::Intent;

// ============================================================================
// Catalog Configuration
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    pub features: Vec<FeatureSpec>,
    pub equipment: HashMap<String, EquipmentSpec>,
    pub feature_equipment: HashMap<String, String>,
    pub sensors: HashMap<String, SensorSpec>,
    pub tools: Vec<ToolSpec>,
    pub intents: Vec<IntentRule>,
    #[serde(default)]
    pub sample_questions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureSpec {
    pub id: String,
    pub label: String,
    pub baseline: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EquipmentSpec {
    pub name: String,
    pub name_en: String,
    pub description: String,
    pub action: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorSpec {
    pub name: String,
    pub unit: String,
    pub range: String,
}

/// A tool the agent is known to invoke. `stage` is the timeline stage id.
#[derive(Debug, Deserialize, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub stage: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntentRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

// ============================================================================
// Theme Configuration
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ThemesConfig {
    pub themes: HashMap<String, Theme>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Theme {
    pub name: String,
    pub description: String,
    pub icons: ThemeIcons,
    pub colors: ThemeColors,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeIcons {
    pub user: String,
    pub assistant: String,
    pub error: String,
    pub pending: String,
    pub active: String,
    pub completed: String,
    pub failed: String,
}

/// RGB color as [r, g, b] array
pub type RgbColor = [u8; 3];

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeColors {
    pub accent: RgbColor,
    pub accent_dim: RgbColor,
    pub success: RgbColor,
    pub warning: RgbColor,
    pub error: RgbColor,
    pub text: RgbColor,
    pub text_secondary: RgbColor,
    pub text_muted: RgbColor,
    pub bg_base: RgbColor,
    pub bg_surface: RgbColor,
    pub bg_elevated: RgbColor,
    pub border: RgbColor,
    pub user: RgbColor,
    pub assistant: RgbColor,
}

/// Default theme ID
pub const DEFAULT_THEME: &str = "foundry";

// ============================================================================
// Loading Functions
// ============================================================================

fn parse_yaml<T: for<'de> Deserialize<'de>>(name: &str, content: &str) -> T {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

// ============================================================================
// Global Configuration (embedded at compile time)
// ============================================================================

pub static CATALOG: LazyLock<CatalogConfig> =
    LazyLock::new(|| parse_yaml("catalog.yaml", include_str!("../../../../yamls/catalog.yaml")));
pub static THEMES: LazyLock<ThemesConfig> =
    LazyLock::new(|| parse_yaml("themes.yaml", include_str!("../../../../yamls/themes.yaml")));

/// Get a theme by ID, falling back to default if not found
pub fn get_theme(theme_id: &str) -> &'static Theme {
    THEMES.themes.get(theme_id).or_else(|| THEMES.themes.get(DEFAULT_THEME)).expect("Default theme must exist")
}

static ACTIVE_THEME: OnceLock<&'static Theme> = OnceLock::new();

/// Pin the active theme. Only the first call has an effect.
pub fn set_active_theme(theme_id: &str) {
    let _ = ACTIVE_THEME.set(get_theme(theme_id));
}

pub fn active_theme() -> &'static Theme {
    ACTIVE_THEME.get_or_init(|| get_theme(DEFAULT_THEME))
}

// =============================================================================
// THEME COLORS
// =============================================================================

pub mod theme {
    use crate::config::active_theme;
    use ratatui::style::Color;

    fn rgb(c: [u8; 3]) -> Color {
        Color::Rgb(c[0], c[1], c[2])
    }

    pub fn accent() -> Color {
        rgb(active_theme().colors.accent)
    }
    pub fn accent_dim() -> Color {
        rgb(active_theme().colors.accent_dim)
    }
    pub fn success() -> Color {
        rgb(active_theme().colors.success)
    }
    pub fn warning() -> Color {
        rgb(active_theme().colors.warning)
    }
    pub fn error() -> Color {
        rgb(active_theme().colors.error)
    }
    pub fn text() -> Color {
        rgb(active_theme().colors.text)
    }
    pub fn text_secondary() -> Color {
        rgb(active_theme().colors.text_secondary)
    }
    pub fn text_muted() -> Color {
        rgb(active_theme().colors.text_muted)
    }
    pub fn bg_base() -> Color {
        rgb(active_theme().colors.bg_base)
    }
    pub fn bg_surface() -> Color {
        rgb(active_theme().colors.bg_surface)
    }
    pub fn bg_elevated() -> Color {
        rgb(active_theme().colors.bg_elevated)
    }
    pub fn border() -> Color {
        rgb(active_theme().colors.border)
    }
    pub fn user() -> Color {
        rgb(active_theme().colors.user)
    }
    pub fn assistant() -> Color {
        rgb(active_theme().colors.assistant)
    }
}

// =============================================================================
// UI CHARACTERS
// =============================================================================

pub mod chars {
    pub const HORIZONTAL: &str = "─";
    pub const BLOCK_FULL: &str = "█";
    pub const BLOCK_LIGHT: &str = "░";
    pub const DOT: &str = "●";
    pub const ARROW_RIGHT: &str = "▸";
    pub const STAR: &str = "★";
}

// =============================================================================
// ICONS (loaded from the active theme)
// =============================================================================

pub mod icons {
    use crate::config::active_theme;

    fn padded(icon: &str) -> String {
        format!("{} ", icon)
    }

    pub fn msg_user() -> String {
        padded(&active_theme().icons.user)
    }
    pub fn msg_assistant() -> String {
        padded(&active_theme().icons.assistant)
    }
    pub fn msg_error() -> String {
        padded(&active_theme().icons.error)
    }
    pub fn stage_pending() -> String {
        padded(&active_theme().icons.pending)
    }
    pub fn stage_active() -> String {
        padded(&active_theme().icons.active)
    }
    pub fn stage_completed() -> String {
        padded(&active_theme().icons.completed)
    }
    pub fn stage_failed() -> String {
        padded(&active_theme().icons.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        assert_eq!(CATALOG.features.len(), 30);
        assert_eq!(CATALOG.tools.len(), 3);
        assert!(!CATALOG.intents.is_empty());
    }

    #[test]
    fn every_feature_maps_to_known_equipment() {
        for feature in &CATALOG.features {
            let key = CATALOG.feature_equipment.get(&feature.id).expect("feature has equipment");
            assert!(CATALOG.equipment.contains_key(key), "unknown equipment {}", key);
        }
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        assert_eq!(get_theme("no-such-theme").name, get_theme(DEFAULT_THEME).name);
    }
}
