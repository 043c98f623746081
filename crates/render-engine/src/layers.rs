//! Per-clip layers prepared once before the frame loop.

use std::borrow::Cow;
use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

use reelforge_common::error::{ReelError, ReelResult};
use reelforge_project_model::{Clip, KeyframeTrack, TextAlign};

use crate::geometry::{contain_fit, cover_fit, crop_rect, Placement, Size};
use crate::paint::{blend_at, parse_hex_color};
use crate::text::{Align, FontBook, TextBlock, TextStyle};
use crate::video::{probe_audio_stream, probe_video_dimensions, VideoFrameReader};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A still image, cover-fitted to the canvas, with a per-frame zoom.
#[derive(Debug)]
pub struct StillLayer {
    base: RgbaImage,
    keyframes: Option<KeyframeTrack>,
    base_scale: f64,
    drift_slope: f64,
    rotation: f64,
}

impl StillLayer {
    /// Zoom factor at clip-local time.
    ///
    /// Keyframes win when present; otherwise the transform scale drifts
    /// linearly by `drift_slope` over the clip duration.
    pub fn scale_at(&self, local_t: f64, duration: f64) -> f64 {
        match &self.keyframes {
            Some(track) => track.sample(local_t),
            None => self.base_scale + self.drift_slope * (local_t / duration.max(0.001)),
        }
    }

    /// Canvas-sized frame at clip-local time, or `None` when scaled to nothing.
    pub fn frame(&self, local_t: f64, duration: f64) -> Option<Cow<'_, RgbaImage>> {
        let scale = self.scale_at(local_t, duration);
        if !scale.is_finite() || scale <= 1e-6 {
            return None;
        }
        if (scale - 1.0).abs() < 1e-9 && self.rotation == 0.0 {
            return Some(Cow::Borrowed(&self.base));
        }

        let (w, h) = self.base.dimensions();
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        let projection = Projection::translate(cx, cy)
            * Projection::rotate((self.rotation as f32).to_radians())
            * Projection::scale(scale as f32, scale as f32)
            * Projection::translate(-cx, -cy);
        let mut out = RgbaImage::new(w, h);
        warp_into(&self.base, &projection, Interpolation::Bilinear, TRANSPARENT, &mut out);
        Some(Cow::Owned(out))
    }
}

/// A decoded video clip, contain-fitted and centred on the canvas.
#[derive(Debug)]
pub struct VideoLayer {
    reader: VideoFrameReader,
    placement: Placement,
    fps: u32,
}

impl VideoLayer {
    /// Blend the frame for clip-local time onto `canvas`.
    pub fn draw(&mut self, canvas: &mut RgbaImage, local_t: f64, opacity: f64) -> ReelResult<()> {
        let index = (local_t * self.fps as f64 + 1e-6).floor().max(0.0) as u64;
        let Placement { x, y, .. } = self.placement;
        if let Some(frame) = self.reader.frame_at(index)? {
            blend_at(canvas, frame, x, y, opacity);
        }
        Ok(())
    }
}

/// Text rasterised once into a canvas-sized transparent layer.
#[derive(Debug)]
pub struct TextLayer {
    pub image: RgbaImage,
}

/// An audio clip to be mixed by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCue {
    pub src: PathBuf,
    pub start: f64,
    pub duration: f64,
}

pub(crate) fn existing_source(clip: &Clip) -> ReelResult<PathBuf> {
    let src = clip
        .src
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ReelError::asset("clip has no source"))?;
    let path = PathBuf::from(src);
    if !path.exists() {
        return Err(ReelError::FileNotFound { path });
    }
    Ok(path)
}

/// Load, crop, and cover-fit an image clip.
pub fn prepare_still(clip: &Clip, canvas: Size, drift_slope: f64) -> ReelResult<StillLayer> {
    let path = existing_source(clip)?;
    let keyframes = clip
        .keyframe_track()
        .map_err(|e| ReelError::asset(format!("malformed keyframes: {e}")))?;

    let mut img = image::open(&path)
        .map_err(|e| ReelError::asset(format!("failed to decode {}: {e}", path.display())))?
        .to_rgba8();

    if let Some(crop) = clip.crop {
        match crop_rect(crop, Size::new(img.width(), img.height())) {
            Some((x, y, w, h)) => img = imageops::crop_imm(&img, x, y, w, h).to_image(),
            None => tracing::warn!(clip = %clip.id, ?crop, "Ignoring invalid crop box"),
        }
    }

    let fit = cover_fit(Size::new(img.width(), img.height()), canvas);
    let resized = imageops::resize(&img, fit.size.width, fit.size.height, FilterType::CatmullRom);
    let base = imageops::crop_imm(
        &resized,
        (-fit.x).max(0) as u32,
        (-fit.y).max(0) as u32,
        canvas.width,
        canvas.height,
    )
    .to_image();

    Ok(StillLayer {
        base,
        keyframes,
        base_scale: clip.transform.scale,
        drift_slope,
        rotation: clip.transform.rotation,
    })
}

/// Probe and open a video clip.
pub fn prepare_video(clip: &Clip, canvas: Size, fps: u32) -> ReelResult<VideoLayer> {
    let path = existing_source(clip)?;
    let source = probe_video_dimensions(&path)
        .ok_or_else(|| ReelError::asset(format!("ffprobe could not read {}", path.display())))?;
    let placement = contain_fit(source, canvas);
    Ok(VideoLayer {
        reader: VideoFrameReader::new(path, placement.size, fps, clip.duration),
        placement,
        fps,
    })
}

/// Rasterise a text clip, or `None` when it has no text.
pub fn prepare_text(clip: &Clip, canvas: Size, fonts: &FontBook) -> ReelResult<Option<TextLayer>> {
    let Some(text) = clip.text.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };

    let scale = if clip.transform.scale.is_finite() && clip.transform.scale > 0.0 {
        clip.transform.scale
    } else {
        1.0
    };
    let size = (clip.text_size as f64 * scale).max(1.0) as f32;
    let style = TextStyle {
        size,
        color: color_or(&clip.text_color, Rgba([255, 255, 255, 255]), &clip.id),
        align: match clip.text_align {
            TextAlign::Left => Align::Left,
            TextAlign::Center => Align::Center,
            TextAlign::Right => Align::Right,
        },
        outline_width: clip.outline_width,
        outline_color: color_or(&clip.outline_color, Rgba([0, 0, 0, 255]), &clip.id),
        background: clip.bg_color.as_deref().and_then(|c| {
            let parsed = parse_hex_color(c);
            if parsed.is_none() {
                tracing::warn!(clip = %clip.id, color = %c, "Ignoring unparseable background colour");
            }
            parsed
        }),
        padding: clip.bg_pad,
    };

    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let block = TextBlock::layout(fonts, &lines, size);
    let anchor_x = (clip.transform.x * canvas.width as f64) as f32;
    let anchor_y = (clip.transform.y * canvas.height as f64) as f32;
    let left = match style.align {
        Align::Left => anchor_x,
        Align::Center => anchor_x - block.width / 2.0,
        Align::Right => anchor_x - block.width,
    }
    .max(0.0);
    let top = (anchor_y - block.height() / 2.0).max(0.0);

    let mut image = RgbaImage::new(canvas.width, canvas.height);
    block.draw(fonts, &mut image, left, top, &style);

    if clip.transform.rotation != 0.0 && clip.transform.rotation.is_finite() {
        let projection = Projection::translate(anchor_x, anchor_y)
            * Projection::rotate((clip.transform.rotation as f32).to_radians())
            * Projection::translate(-anchor_x, -anchor_y);
        let mut rotated = RgbaImage::new(canvas.width, canvas.height);
        warp_into(&image, &projection, Interpolation::Bilinear, TRANSPARENT, &mut rotated);
        image = rotated;
    }

    Ok(Some(TextLayer { image }))
}

/// Validate an audio clip's source: it must exist and decode as audio.
pub fn prepare_audio(clip: &Clip) -> ReelResult<AudioCue> {
    let src = existing_source(clip)?;
    probe_audio_stream(&src)?;
    Ok(AudioCue {
        src,
        start: clip.start.max(0.0),
        duration: clip.duration,
    })
}

fn color_or(value: &str, fallback: Rgba<u8>, clip_id: &str) -> Rgba<u8> {
    parse_hex_color(value).unwrap_or_else(|| {
        tracing::warn!(clip = %clip_id, color = %value, "Unparseable colour, using fallback");
        fallback
    })
}
