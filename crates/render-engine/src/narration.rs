//! Text-to-speech collaborator for narration audio.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use reelforge_common::config::TtsConfig;
use reelforge_common::error::{ReelError, ReelResult};

use crate::video::command_exists;

/// Turns narration text into an audio file.
///
/// Implementations return `None` when nothing could be synthesized; the
/// render then proceeds without narration.
pub trait NarrationSynthesizer: Send + Sync {
    /// Synthesize `text` next to `out_base`. The extension is chosen by the backend.
    fn synthesize(&self, text: &str, out_base: &Path) -> Option<PathBuf>;

    fn name(&self) -> &str;
}

/// Which external engine(s) to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsBackend {
    /// edge-tts, then espeak-ng.
    Auto,
    EdgeTts,
    EspeakNg,
    None,
}

impl TtsBackend {
    pub fn from_name(name: &str) -> ReelResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "edge-tts" | "edge" => Ok(Self::EdgeTts),
            "espeak-ng" | "espeak" => Ok(Self::EspeakNg),
            "none" | "off" => Ok(Self::None),
            other => Err(ReelError::Config {
                message: format!("unknown tts backend: {other}"),
            }),
        }
    }

    fn engines(self) -> &'static [Engine] {
        match self {
            Self::Auto => &[Engine::EdgeTts, Engine::EspeakNg],
            Self::EdgeTts => &[Engine::EdgeTts],
            Self::EspeakNg => &[Engine::EspeakNg],
            Self::None => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    EdgeTts,
    EspeakNg,
}

impl Engine {
    fn binary(self) -> &'static str {
        match self {
            Self::EdgeTts => "edge-tts",
            Self::EspeakNg => "espeak-ng",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::EdgeTts => "mp3",
            Self::EspeakNg => "wav",
        }
    }
}

/// Runs the edge-tts / espeak-ng command line tools.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    backend: TtsBackend,
    voice: String,
    rate_pct: i32,
}

impl CommandSynthesizer {
    pub fn new(backend: TtsBackend, voice: impl Into<String>, rate_pct: i32) -> Self {
        Self {
            backend,
            voice: voice.into(),
            rate_pct,
        }
    }

    pub fn from_config(config: &TtsConfig) -> ReelResult<Self> {
        Ok(Self::new(
            TtsBackend::from_name(&config.backend)?,
            config.voice.clone(),
            config.rate_pct,
        ))
    }

    fn args(&self, engine: Engine, text: &str, out: &Path) -> Vec<String> {
        match engine {
            Engine::EdgeTts => vec![
                "--voice".to_string(),
                self.voice.clone(),
                format!("--rate={:+}%", self.rate_pct),
                "--text".to_string(),
                text.to_string(),
                "--write-media".to_string(),
                out.display().to_string(),
            ],
            Engine::EspeakNg => {
                let wpm = (175.0 * (1.0 + self.rate_pct as f64 / 100.0)).round().max(80.0) as u32;
                vec![
                    "-s".to_string(),
                    wpm.to_string(),
                    "-w".to_string(),
                    out.display().to_string(),
                    text.to_string(),
                ]
            }
        }
    }

    fn run(&self, engine: Engine, text: &str, out_base: &Path) -> Option<PathBuf> {
        if !command_exists(engine.binary()) {
            tracing::debug!(engine = engine.binary(), "TTS engine not installed");
            return None;
        }
        let out = out_base.with_extension(engine.extension());
        let status = Command::new(engine.binary())
            .args(self.args(engine, text, &out))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::warn!(engine = engine.binary(), %status, "TTS engine failed");
                return None;
            }
            Err(e) => {
                tracing::warn!(engine = engine.binary(), error = %e, "Failed to run TTS engine");
                return None;
            }
        }
        let written = std::fs::metadata(&out).map(|m| m.len() > 0).unwrap_or(false);
        written.then_some(out)
    }
}

impl NarrationSynthesizer for CommandSynthesizer {
    fn synthesize(&self, text: &str, out_base: &Path) -> Option<PathBuf> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        for &engine in self.backend.engines() {
            if let Some(path) = self.run(engine, text, out_base) {
                tracing::info!(engine = engine.binary(), path = %path.display(), "Narration synthesized");
                return Some(path);
            }
        }
        None
    }

    fn name(&self) -> &str {
        match self.backend {
            TtsBackend::Auto => "auto",
            TtsBackend::EdgeTts => "edge-tts",
            TtsBackend::EspeakNg => "espeak-ng",
            TtsBackend::None => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(TtsBackend::from_name("AUTO").unwrap(), TtsBackend::Auto);
        assert_eq!(TtsBackend::from_name("edge-tts").unwrap(), TtsBackend::EdgeTts);
        assert_eq!(TtsBackend::from_name("espeak").unwrap(), TtsBackend::EspeakNg);
        assert_eq!(TtsBackend::from_name("none").unwrap(), TtsBackend::None);
        assert!(TtsBackend::from_name("pyttsx3").is_err());
    }

    #[test]
    fn test_auto_tries_edge_first() {
        assert_eq!(
            TtsBackend::Auto.engines(),
            &[Engine::EdgeTts, Engine::EspeakNg]
        );
        assert!(TtsBackend::None.engines().is_empty());
    }

    #[test]
    fn test_engine_arguments() {
        let synth = CommandSynthesizer::new(TtsBackend::Auto, "ko-KR-SunHiNeural", 10);
        let out = Path::new("/tmp/n.mp3");
        let edge = synth.args(Engine::EdgeTts, "hello", out);
        assert!(edge.contains(&"--rate=+10%".to_string()));
        assert!(edge.contains(&"ko-KR-SunHiNeural".to_string()));

        let espeak = synth.args(Engine::EspeakNg, "hello", Path::new("/tmp/n.wav"));
        assert_eq!(espeak[..2], ["-s".to_string(), "193".to_string()]);
        assert_eq!(espeak.last().map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_none_backend_never_synthesizes() {
        let synth = CommandSynthesizer::new(TtsBackend::None, "v", 0);
        assert!(synth.synthesize("hello", Path::new("/tmp/x")).is_none());
        assert_eq!(synth.name(), "none");
    }
}
