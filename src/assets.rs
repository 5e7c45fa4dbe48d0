use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Decoded overlay image, RGBA8, already scaled to its display size.
#[derive(Debug, Clone)]
pub struct OverlayImage {
    pub pixels: RgbaImage,
}

impl OverlayImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width() as i32, self.height() as i32)
    }
}

/// Resolve a configured asset path.
///
/// Absolute paths are returned untouched. Relative paths are tried against the
/// working directory first and then against the directory of the running
/// executable. When neither exists the working-directory form is returned so
/// error messages point at the place users expect.
pub fn resolve_asset_path(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let candidate = dir.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    path.to_path_buf()
}

/// Height for `target_width` that keeps the aspect ratio of `(w0, h0)`.
pub fn scaled_height(w0: u32, h0: u32, target_width: u32) -> u32 {
    if w0 == 0 {
        return h0.max(1);
    }
    let h = (h0 as f64 * (target_width as f64 / w0 as f64)) as u32;
    h.max(1)
}

/// Load the overlay image. A missing file is an error the caller treats as
/// fatal.
pub fn load_overlay_image(path: &Path, target_width: Option<u32>) -> Result<OverlayImage> {
    if !path.exists() {
        bail!("missing image: {}", path.display());
    }
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?;
    let mut pixels = decoded.to_rgba8();
    if let Some(width) = target_width.filter(|w| *w > 0) {
        let (w0, h0) = pixels.dimensions();
        let height = scaled_height(w0, h0, width);
        pixels = image::imageops::resize(&pixels, width, height, FilterType::Lanczos3);
    }
    tracing::debug!(
        width = pixels.width(),
        height = pixels.height(),
        "loaded overlay image"
    );
    Ok(OverlayImage { pixels })
}

/// Resolve the optional sound asset. Returns `None` (with a warning) when it is
/// not configured or does not exist; playback then silently does nothing.
pub fn resolve_sound_path(path: Option<&Path>) -> Option<PathBuf> {
    let path = path?;
    let resolved = resolve_asset_path(path);
    if resolved.exists() {
        Some(resolved)
    } else {
        tracing::warn!("sound not found at {}; playback will be silent", resolved.display());
        None
    }
}
