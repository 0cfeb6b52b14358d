use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ruby_annotate_engine::annotations::{CollapsedRubySeed, default_hotkeys, normalize_hotkey};
use ruby_annotate_engine::models::{Format, UnknownFormat};
use ruby_annotate_engine::serialize::{Fixup, RubyContent, SerializeOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Hotkey '{hotkey}' is bound to an unknown format: {source}")]
    UnknownHotkeyFormat {
        hotkey: String,
        source: UnknownFormat,
    },
}

/// User configuration. Every field has a default, so a partial file is valid.
///
/// ```toml
/// ruby_content = "kanji"          # or "children"
/// fixup = "ruby_paragraphs"       # or "none", "strip_paragraphs"
/// collapsed_ruby_seed = "kana"    # or "kanji"
/// output_path = "~/ruby/out.html"
///
/// [hotkeys]
/// "mod+b" = "bold"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ruby_content: RubyContent,
    pub fixup: Fixup,
    pub collapsed_ruby_seed: CollapsedRubySeed,
    /// Where the CLI writes fixed markup when no output is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Key combination → format name
    pub hotkeys: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ruby_content: RubyContent::default(),
            fixup: Fixup::default(),
            collapsed_ruby_seed: CollapsedRubySeed::default(),
            output_path: None,
            hotkeys: default_hotkeys()
                .into_iter()
                .map(|(hotkey, format)| (hotkey, format.name().to_string()))
                .collect(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the output path
        config.output_path = config
            .output_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        // Fail at load time rather than on first keypress
        config.hotkey_table()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/ruby-annotate");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            ruby_content: self.ruby_content,
            fixup: self.fixup,
        }
    }

    /// Hotkey bindings with format names resolved, keys in canonical spelling
    pub fn hotkey_table(&self) -> Result<BTreeMap<String, Format>, ConfigError> {
        self.hotkeys
            .iter()
            .map(|(hotkey, name)| {
                let format = name.parse::<Format>().map_err(|source| {
                    ConfigError::UnknownHotkeyFormat {
                        hotkey: hotkey.clone(),
                        source,
                    }
                })?;
                Ok((normalize_hotkey(hotkey), format))
            })
            .collect()
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
