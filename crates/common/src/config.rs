//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where projects are stored.
    pub projects_dir: PathBuf,

    /// Default render settings.
    pub render: RenderDefaults,

    /// Font lookup order for text and overlay drawing.
    pub fonts: FontConfig,

    /// Narration (text-to-speech) settings.
    pub tts: TtsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default parameters for new projects and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Canvas width for new projects.
    pub width: u32,

    /// Canvas height for new projects.
    pub height: u32,

    /// Frame rate for new projects.
    pub fps: u32,

    /// Project duration in seconds for new projects.
    pub duration_secs: f64,

    /// Zoom added over the lifetime of a still image clip
    /// when no explicit keyframes are given.
    pub drift_slope: f64,

    /// x264 preset passed to ffmpeg.
    pub preset: String,

    /// AAC bitrate in kbps.
    pub audio_bitrate_kbps: u32,
}

/// Font lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font tried before any fallback.
    pub preferred: Option<PathBuf>,

    /// Platform font paths tried in order.
    pub fallbacks: Vec<PathBuf>,
}

/// Text-to-speech backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// One of `auto`, `edge-tts`, `espeak-ng`, `none`.
    pub backend: String,

    /// Voice name handed to the backend.
    pub voice: String,

    /// Speaking rate adjustment in percent (0 = backend default).
    pub rate_pct: i32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelforge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_dir: dirs_default_projects(),
            render: RenderDefaults::default(),
            fonts: FontConfig::default(),
            tts: TtsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            duration_secs: 10.0,
            drift_slope: 0.02,
            preset: "medium".to_string(),
            audio_bitrate_kbps: 192,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            preferred: None,
            fallbacks: [
                "/System/Library/Fonts/AppleSDGothicNeo.ttc",
                "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "C:\\Windows\\Fonts\\malgun.ttf",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

impl FontConfig {
    /// Candidate font paths in lookup order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        self.preferred
            .iter()
            .cloned()
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
            voice: "ko-KR-SunHiNeural".to_string(),
            rate_pct: 0,
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

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
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
        let config_path = config_file_path();
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
    base.join("reelforge").join("config.json")
}

/// Default projects directory.
fn dirs_default_projects() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("reelforge").join("projects")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"render": {"fps": 60}, "tts": {"backend": "none"}}"#)
                .unwrap();
        assert_eq!(config.render.fps, 60);
        assert_eq!(config.render.width, 1080);
        assert_eq!(config.tts.backend, "none");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_font_candidates_put_preferred_first() {
        let fonts = FontConfig {
            preferred: Some(PathBuf::from("/opt/fonts/brand.ttf")),
            ..FontConfig::default()
        };
        let candidates = fonts.candidates();
        assert_eq!(candidates[0], PathBuf::from("/opt/fonts/brand.ttf"));
        assert_eq!(candidates.len(), fonts.fallbacks.len() + 1);
    }
}
