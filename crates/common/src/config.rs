//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PhotostripError, PhotostripResult};

/// Largest accepted `pixel_ratio`.
pub const MAX_PIXEL_RATIO: u32 = 8;

/// Largest accepted strip width and layout length, in CSS pixels.
pub const MAX_CSS_LENGTH: u32 = 4096;

/// Largest exported bitmap side, in device pixels.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Largest exported bitmap, in device pixels.
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Composite export settings.
    pub export: ExportSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Extra frame styles appended to the built-in catalog at startup.
    pub custom_styles: Vec<CustomStyleConfig>,
}

/// Parameters of the exported strip, in CSS pixels before `pixel_ratio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Fixed strip width, independent of any viewport.
    pub width: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    /// Vertical gap between tiles (and between the last tile and the caption).
    pub gap: u32,
    pub corner_radius: u32,

    /// Padding of the white frame around each photo.
    pub tile_padding: u32,
    pub tile_radius: u32,
    pub image_radius: u32,

    pub caption_text: String,
    pub caption_size: u32,
    pub caption_margin_top: u32,
    pub caption_line_height: u32,

    /// Optional TTF/OTF font used for the caption.
    pub caption_font: Option<PathBuf>,

    /// Integer device pixel ratio applied to every layout value.
    pub pixel_ratio: u32,

    /// Upper bound on waiting for every photo to decode.
    pub decode_timeout_ms: u64,

    /// Name of the saved file.
    pub filename: String,

    /// Directory exported strips are saved into.
    pub output_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "photostrip=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// A user-defined frame style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStyleConfig {
    pub name: String,

    /// Declaration used by the live preview (utility classes).
    pub preview: String,

    /// CSS background for the exported bitmap (color or linear-gradient).
    pub export: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 400,
            padding_x: 20,
            padding_y: 40,
            gap: 20,
            corner_radius: 12,
            tile_padding: 12,
            tile_radius: 8,
            image_radius: 4,
            caption_text: "made by tiosatrio100".to_string(),
            caption_size: 14,
            caption_margin_top: 10,
            caption_line_height: 20,
            caption_font: None,
            pixel_ratio: 1,
            decode_timeout_ms: 5_000,
            filename: "photobooth-photos.png".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl ExportSettings {
    /// Reject settings that cannot produce a strip.
    pub fn validate(&self) -> PhotostripResult<()> {
        if !(1..=MAX_PIXEL_RATIO).contains(&self.pixel_ratio) {
            return Err(PhotostripError::config(format!(
                "pixel_ratio must be between 1 and {MAX_PIXEL_RATIO}, got {}",
                self.pixel_ratio
            )));
        }
        let lengths = [
            ("width", self.width),
            ("padding_x", self.padding_x),
            ("padding_y", self.padding_y),
            ("gap", self.gap),
            ("corner_radius", self.corner_radius),
            ("tile_padding", self.tile_padding),
            ("tile_radius", self.tile_radius),
            ("image_radius", self.image_radius),
            ("caption_size", self.caption_size),
            ("caption_margin_top", self.caption_margin_top),
            ("caption_line_height", self.caption_line_height),
        ];
        for (name, value) in lengths {
            if value > MAX_CSS_LENGTH {
                return Err(PhotostripError::config(format!(
                    "{name} {value} exceeds {MAX_CSS_LENGTH}"
                )));
            }
        }
        if self.width * self.pixel_ratio > MAX_CANVAS_SIDE {
            return Err(PhotostripError::config(format!(
                "width {} at pixel_ratio {} exceeds {MAX_CANVAS_SIDE} device pixels",
                self.width, self.pixel_ratio
            )));
        }
        if self.width <= 2 * (self.padding_x + self.tile_padding) {
            return Err(PhotostripError::config(format!(
                "width {} leaves no room for photos after padding",
                self.width
            )));
        }
        if self.decode_timeout_ms == 0 {
            return Err(PhotostripError::config("decode_timeout_ms must be positive"));
        }
        if self.filename.trim().is_empty() {
            return Err(PhotostripError::config("filename must not be empty"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                    Ok(config) => match config.export.validate() {
                        Ok(()) => return config,
                        Err(e) => {
                            tracing::warn!("Invalid config at {:?}: {}", config_path, e);
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("photostrip").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_settings_are_valid() {
        let settings = ExportSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.width, 400);
        assert_eq!(settings.filename, "photobooth-photos.png");
    }

    #[test]
    fn test_zero_pixel_ratio_rejected() {
        let settings = ExportSettings {
            pixel_ratio: 0,
            ..ExportSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(PhotostripError::Config { .. })
        ));
    }

    #[test]
    fn test_oversized_pixel_ratio_rejected() {
        for pixel_ratio in [MAX_PIXEL_RATIO + 1, 20_000_000] {
            let settings = ExportSettings {
                pixel_ratio,
                ..ExportSettings::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(PhotostripError::Config { .. })
            ));
        }
    }

    #[test]
    fn test_oversized_lengths_rejected() {
        let wide = ExportSettings {
            width: 4096,
            pixel_ratio: 8,
            ..ExportSettings::default()
        };
        assert!(matches!(wide.validate(), Err(PhotostripError::Config { .. })));

        let gap = ExportSettings {
            gap: u32::MAX,
            ..ExportSettings::default()
        };
        assert!(matches!(gap.validate(), Err(PhotostripError::Config { .. })));
    }

    #[test]
    fn test_zero_decode_timeout_rejected() {
        let settings = ExportSettings {
            decode_timeout_ms: 0,
            ..ExportSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(PhotostripError::Config { .. })
        ));
    }

    #[test]
    fn test_partial_logging_block_keeps_other_sections() {
        let json = r#"{ "logging": { "level": "debug" }, "export": { "gap": 8 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
        assert!(config.logging.file.is_none());
        assert_eq!(config.export.gap, 8);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "export": { "pixel_ratio": 2 }, "custom_styles": [
            { "name": "Mint", "preview": "bg-emerald-200", "export": "rgb(167, 243, 208)" }
        ] }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.export.pixel_ratio, 2);
        assert_eq!(config.export.gap, 20);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.custom_styles.len(), 1);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("photostrip_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.export.decode_timeout_ms = 1234;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.export.decode_timeout_ms, 1234);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("photostrip_test_bad_config");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.export.width, 400);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
