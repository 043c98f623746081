//! Caption timing and SRT/VTT output.

use serde::{Deserialize, Serialize};

use reelforge_common::error::ReelResult;

/// One caption on screen between two times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CaptionError {
    #[error("Caption block {index}: missing timing line")]
    MissingTiming { index: usize },

    #[error("Caption block {index}: bad timestamp {value:?}")]
    BadTimestamp { index: usize, value: String },
}

/// Spread `lines` over `duration` in equal slots. Blank lines are dropped.
pub fn caption_segments<S: AsRef<str>>(lines: &[S], duration: f64) -> Vec<CaptionSegment> {
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() || !(duration.is_finite() && duration > 0.0) {
        return vec![];
    }
    let slot = duration / lines.len() as f64;
    lines
        .iter()
        .enumerate()
        .map(|(i, text)| CaptionSegment {
            start_secs: slot * i as f64,
            end_secs: if i + 1 == lines.len() {
                duration
            } else {
                slot * (i + 1) as f64
            },
            text: text.to_string(),
        })
        .collect()
}

/// Generate SRT subtitle content.
pub fn to_srt(segments: &[CaptionSegment]) -> String {
    let mut output = String::new();

    for (i, segment) in segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(segment.start_secs),
            format_srt_time(segment.end_secs),
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content.
pub fn to_vtt(segments: &[CaptionSegment]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for segment in segments {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(segment.start_secs),
            format_vtt_time(segment.end_secs),
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Parse SRT content. Sequence numbers are not checked; multi-line cue
/// text is kept with `\n`.
pub fn parse_srt(content: &str) -> Result<Vec<CaptionSegment>, CaptionError> {
    let normalized = content.replace("\r\n", "\n");
    let mut segments = vec![];

    let blocks = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty());
    for (index, block) in blocks.enumerate() {
        let mut lines = block.lines();
        let mut timing = lines.next().unwrap_or_default();
        if !timing.contains("-->") {
            timing = lines.next().unwrap_or_default();
        }
        let Some((start, end)) = timing.split_once("-->") else {
            return Err(CaptionError::MissingTiming { index });
        };
        let parse = |value: &str| {
            parse_srt_time(value).ok_or_else(|| CaptionError::BadTimestamp {
                index,
                value: value.trim().to_string(),
            })
        };
        segments.push(CaptionSegment {
            start_secs: parse(start)?,
            end_secs: parse(end)?,
            text: lines.collect::<Vec<_>>().join("\n"),
        });
    }

    Ok(segments)
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_time(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_time(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

fn split_time(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

fn parse_srt_time(value: &str) -> Option<f64> {
    let value = value.trim().split_whitespace().next()?;
    let (hms, millis) = value.split_once([',', '.'])?;
    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;
    Some((hours * 3600 + minutes * 60 + seconds) as f64 + millis as f64 / 1000.0)
}

/// Save captions to a file; `.vtt` selects WebVTT, anything else SRT.
pub fn save_captions(segments: &[CaptionSegment], path: &std::path::Path) -> ReelResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("vtt") => to_vtt(segments),
        _ => to_srt(segments),
    };
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), captions = segments.len(), "Captions written");
    Ok(())
}
