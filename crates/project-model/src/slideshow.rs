//! Image slideshow laid out on a project's timeline.
//!
//! Every slide shows one image for the same length of time, with one
//! caption line drawn over it. Slides are sized to fill the project
//! duration exactly.

use std::path::Path;

use crate::{Clip, MediaKind, Project, ProjectError, TextAlign, Track};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

/// Vertical anchor of slide captions, relative to canvas height.
const CAPTION_Y: f64 = 0.62;
const CAPTION_SIZE: u32 = 54;
const CAPTION_BG: &str = "#00000099";

/// One planned slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub image: String,
    pub caption: Option<String>,
    pub start: f64,
    pub duration: f64,
}

/// Whether `path` has a still image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Plan one slide per image or caption, whichever there are more of.
///
/// The per-slide length is first clamped to `[min_slide, max_slide]` and
/// then rescaled so the slides cover `duration` exactly. When captions
/// outnumber images the last image is repeated.
pub fn plan_slides<S: AsRef<str>>(
    images: &[S],
    captions: &[S],
    duration: f64,
    min_slide: f64,
    max_slide: f64,
) -> Result<Vec<Slide>, ProjectError> {
    let Some(last_image) = images.last() else {
        return Err(ProjectError::ValidationError {
            message: "slideshow needs at least one image".to_string(),
        });
    };
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ProjectError::ValidationError {
            message: format!("duration must be positive, got {duration}"),
        });
    }
    if !(min_slide > 0.0 && min_slide <= max_slide) {
        return Err(ProjectError::ValidationError {
            message: format!("invalid slide bounds [{min_slide}, {max_slide}]"),
        });
    }

    let count = images.len().max(captions.len());
    let clamped = (duration / count as f64).clamp(min_slide, max_slide);
    let per = clamped * duration / (clamped * count as f64);

    let slides = (0..count)
        .map(|i| Slide {
            image: images.get(i).unwrap_or(last_image).as_ref().to_string(),
            caption: captions
                .get(i)
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty()),
            start: per * i as f64,
            duration: per,
        })
        .collect();
    Ok(slides)
}

/// Replace the project's image and text clips with a planned slideshow.
///
/// Audio clips are left alone. Returns the number of slides placed.
pub fn build_slideshow<S: AsRef<str>>(
    project: &mut Project,
    images: &[S],
    captions: &[S],
    min_slide: f64,
    max_slide: f64,
) -> Result<usize, ProjectError> {
    let slides = plan_slides(images, captions, project.duration, min_slide, max_slide)?;

    let image_track = track_for(project, MediaKind::Image, "v1");
    image_track.clips = slides
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            Clip::new(format!("slide_{}", i + 1), MediaKind::Image, slide.start, slide.duration)
                .with_src(slide.image.clone())
        })
        .collect();

    let text_track = track_for(project, MediaKind::Text, "t1");
    text_track.clips = slides
        .iter()
        .enumerate()
        .filter_map(|(i, slide)| {
            let caption = slide.caption.as_ref()?;
            let mut clip =
                Clip::new(format!("caption_{}", i + 1), MediaKind::Text, slide.start, slide.duration)
                    .with_text(caption.clone());
            clip.transform.x = 0.5;
            clip.transform.y = CAPTION_Y;
            clip.text_size = CAPTION_SIZE;
            clip.text_align = TextAlign::Center;
            clip.outline_width = 2;
            clip.bg_color = Some(CAPTION_BG.to_string());
            Some(clip)
        })
        .collect();

    tracing::debug!(project = %project.id, slides = slides.len(), "Built slideshow");
    Ok(slides.len())
}

fn track_for<'a>(project: &'a mut Project, kind: MediaKind, id: &str) -> &'a mut Track {
    if let Some(pos) = project.tracks.iter().position(|t| t.kind == kind) {
        return &mut project.tracks[pos];
    }
    project.tracks.push(Track::new(id, kind));
    let last = project.tracks.len() - 1;
    &mut project.tracks[last]
}
