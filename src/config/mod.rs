use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::modal::{DialogView, Effect, EventBus};

/// Presentation defaults shared by every dialog of a controller
///
/// Controllers hold an immutable snapshot; [`ModalController::configure`]
/// swaps in a new one.
///
/// [`ModalController::configure`]: crate::modal::ModalController::configure
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalSettings {
    /// Effect for dialogs that do not name one
    pub default_effect: Effect,

    /// Extra class applied to every dialog
    pub default_class: Option<String>,
}

impl ModalSettings {
    /// Initialize settings from config files and the environment
    pub async fn init() -> Result<Self> {
        debug!("Initializing modal settings");

        let mut settings = Self::default();

        if let Some(file_settings) = Self::load_from_file().await? {
            settings.merge_with(file_settings);
        }

        settings.load_from_env();
        Ok(settings)
    }

    /// Load settings from `MODAL_DEFAULT_EFFECT` and `MODAL_DEFAULT_CLASS`
    pub fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(effect) = lookup("MODAL_DEFAULT_EFFECT") {
            match effect.parse() {
                Ok(effect) => self.default_effect = effect,
                Err(e) => warn!("Ignoring MODAL_DEFAULT_EFFECT: {}", e),
            }
        }

        if let Some(class) = lookup("MODAL_DEFAULT_CLASS") {
            self.default_class = (!class.trim().is_empty()).then(|| class.trim().to_string());
        }
    }

    /// Load settings from the first config file found
    ///
    /// Lookup order:
    /// 1. ./.modal-stack.json
    /// 2. ./modal-stack.json
    /// 3. $CONFIG_DIR/modal-stack/config.json
    pub async fn load_from_file() -> Result<Option<Self>> {
        let mut config_paths = vec![
            PathBuf::from("./.modal-stack.json"),
            PathBuf::from("./modal-stack.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("modal-stack").join("config.json"));
        }

        for path in config_paths {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }

        Ok(None)
    }

    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading modal settings from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid modal settings in {}", path.display()))
    }

    /// Merge another set of settings into this one
    pub fn merge_with(&mut self, other: Self) {
        if other.default_effect != Effect::default() {
            self.default_effect = other.default_effect;
        }
        if other.default_class.is_some() {
            self.default_class = other.default_class;
        }
    }

    /// New snapshot with the given options applied
    pub fn merged(&self, options: &ConfigureOptions) -> Self {
        Self {
            default_effect: options.default_effect.unwrap_or(self.default_effect),
            default_class: options
                .default_class
                .clone()
                .or_else(|| self.default_class.clone()),
        }
    }

    pub fn effect_for(&self, view: &DialogView) -> Effect {
        view.effect.unwrap_or(self.default_effect)
    }

    /// Classes a renderer applies to a dialog: effect, default class, own class
    pub fn classes_for(&self, view: &DialogView) -> Vec<String> {
        let mut classes = vec![format!("effect-{}", self.effect_for(view))];
        classes.extend(self.default_class.iter().cloned());
        classes.extend(view.class_name.iter().cloned());
        classes
    }
}

/// Options accepted by [`ModalController::configure`]
///
/// [`ModalController::configure`]: crate::modal::ModalController::configure
#[derive(Debug, Default)]
pub struct ConfigureOptions {
    pub default_effect: Option<Effect>,
    pub default_class: Option<String>,
    /// Bus to listen to for global submit/reject, replacing any previous one
    pub bus: Option<EventBus>,
}

impl ConfigureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_effect(mut self, effect: Effect) -> Self {
        self.default_effect = Some(effect);
        self
    }

    pub fn with_default_class(mut self, class: impl Into<String>) -> Self {
        self.default_class = Some(class.into());
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::DialogId;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn view(effect: Option<Effect>, class_name: Option<&str>) -> DialogView {
        DialogView {
            id: DialogId::from("a"),
            group: None,
            effect,
            class_name: class_name.map(str::to_string),
            body: String::new(),
        }
    }

    #[test]
    fn test_default_values() {
        let settings = ModalSettings::default();
        assert_eq!(settings.default_effect, Effect::SlideTop);
        assert!(settings.default_class.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MODAL_DEFAULT_EFFECT", "fade"),
            ("MODAL_DEFAULT_CLASS", " wide "),
        ]);
        let mut settings = ModalSettings::default();
        settings.apply_env(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(settings.default_effect, Effect::Fade);
        assert_eq!(settings.default_class.as_deref(), Some("wide"));
    }

    #[test]
    fn test_invalid_env_effect_is_ignored() {
        let mut settings = ModalSettings::default();
        settings.apply_env(|key| (key == "MODAL_DEFAULT_EFFECT").then(|| "spin".to_string()));
        assert_eq!(settings.default_effect, Effect::SlideTop);
    }

    #[test]
    fn test_merged_snapshot_keeps_unset_fields() {
        let base = ModalSettings {
            default_effect: Effect::Fade,
            default_class: Some("base".to_string()),
        };

        let merged = base.merged(&ConfigureOptions::new().with_default_class("other"));
        assert_eq!(merged.default_effect, Effect::Fade);
        assert_eq!(merged.default_class.as_deref(), Some("other"));
        assert_eq!(base.default_class.as_deref(), Some("base"));
    }

    #[test]
    fn test_classes_for_view() {
        let settings = ModalSettings {
            default_effect: Effect::SlideTop,
            default_class: Some("shadowed".to_string()),
        };

        assert_eq!(
            settings.classes_for(&view(None, Some("wide"))),
            vec!["effect-slide-top", "shadowed", "wide"]
        );
        assert_eq!(
            settings.classes_for(&view(Some(Effect::Fade), None)),
            vec!["effect-fade", "shadowed"]
        );
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"default_effect": "fade"}"#)
            .await
            .unwrap();

        let settings = ModalSettings::load_from_path(&path).await.unwrap();
        assert_eq!(settings.default_effect, Effect::Fade);
        assert!(settings.default_class.is_none());
    }

    #[tokio::test]
    async fn test_load_from_path_rejects_bad_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        assert!(ModalSettings::load_from_path(&path).await.is_err());
    }
}
