//! Placement math for fitting sources onto the canvas.

/// Integer size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// A resize target plus the offset of its top-left corner on the canvas.
///
/// Offsets are negative when the scaled source overflows the canvas
/// (cover) and positive when it is smaller (contain).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub size: Size,
    pub x: i64,
    pub y: i64,
}

/// Scale-to-cover: fill the canvas completely, centre-cropping the overflow.
///
/// A source wider than the canvas aspect is matched on height; a narrower
/// one is matched on width.
pub fn cover_fit(source: Size, canvas: Size) -> Placement {
    let size = if source.aspect() > canvas.aspect() {
        let w = (source.aspect() * canvas.height as f64).round() as u32;
        Size::new(w.max(canvas.width), canvas.height)
    } else {
        let h = (canvas.width as f64 / source.aspect()).round() as u32;
        Size::new(canvas.width, h.max(canvas.height))
    };
    centred(size, canvas)
}

/// Scale-to-contain: the largest aspect-preserving size that fits inside the canvas.
pub fn contain_fit(source: Size, canvas: Size) -> Placement {
    let size = if source.aspect() > canvas.aspect() {
        let h = (canvas.width as f64 / source.aspect()).round() as u32;
        Size::new(canvas.width, h.clamp(1, canvas.height))
    } else {
        let w = (source.aspect() * canvas.height as f64).round() as u32;
        Size::new(w.clamp(1, canvas.width), canvas.height)
    };
    centred(size, canvas)
}

fn centred(size: Size, canvas: Size) -> Placement {
    Placement {
        size,
        x: (canvas.width as i64 - size.width as i64) / 2,
        y: (canvas.height as i64 - size.height as i64) / 2,
    }
}

/// Pixel rectangle from a relative crop box `[x0, y0, x1, y1]`.
///
/// Returns `None` unless the box is finite, inside `[0, 1]`, and non-empty
/// at pixel resolution.
pub fn crop_rect(crop: [f64; 4], source: Size) -> Option<(u32, u32, u32, u32)> {
    let [x0, y0, x1, y1] = crop;
    if crop.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
        return None;
    }
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let px0 = (x0 * source.width as f64).floor() as u32;
    let py0 = (y0 * source.height as f64).floor() as u32;
    let px1 = (x1 * source.width as f64).ceil() as u32;
    let py1 = (y1 * source.height as f64).ceil() as u32;
    let w = px1.min(source.width).saturating_sub(px0);
    let h = py1.min(source.height).saturating_sub(py0);
    if w == 0 || h == 0 {
        return None;
    }
    Some((px0, py0, w, h))
}

/// Clamp `value` into `[lo, hi]`, preferring `lo` when the range is empty.
pub fn clamp_into(value: i64, lo: i64, hi: i64) -> i64 {
    value.min(hi).max(lo)
}
