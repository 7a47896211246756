//! Pet image decoding and the metadata the grid derives from it.
//!
//! Failures never stop a preload: the caller substitutes
//! [`PetAsset::placeholder`] and moves on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{GenericImageView, RgbaImage};
use thiserror::Error;

use super::vec2::EPSILON;

/// Longest edge of the thumbnail kept for rendering.
const THUMB_EDGE: u32 = 96;
/// Pixels more transparent than this are ignored for the mean colour.
const ALPHA_CUTOFF: u8 = 16;
const PLACEHOLDER_COLOR: [u8; 3] = [196, 190, 210];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone)]
pub struct PetAsset {
    /// Width over height, `1.0` when unknown.
    pub aspect_ratio: f64,
    /// Mean colour of the opaque pixels; used to tint the tile.
    pub mean_color: [u8; 3],
    pub thumb: Option<Arc<RgbaImage>>,
}

impl PetAsset {
    pub fn placeholder() -> Self {
        Self {
            aspect_ratio: 1.0,
            mean_color: PLACEHOLDER_COLOR,
            thumb: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.thumb.is_none()
    }
}

pub fn load_asset(path: &Path) -> Result<PetAsset, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let img = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let (w, h) = img.dimensions();
    let thumb = if w.max(h) > THUMB_EDGE {
        img.thumbnail(THUMB_EDGE, THUMB_EDGE).to_rgba8()
    } else {
        img.to_rgba8()
    };
    Ok(PetAsset {
        aspect_ratio: aspect_ratio(w, h),
        mean_color: mean_color(&thumb).unwrap_or(PLACEHOLDER_COLOR),
        thumb: Some(Arc::new(thumb)),
    })
}

/// [`load_asset`], falling back to a placeholder with a warning.
pub fn load_or_placeholder(path: &Path) -> PetAsset {
    load_asset(path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "asset failed to load, using placeholder");
        PetAsset::placeholder()
    })
}

fn aspect_ratio(w: u32, h: u32) -> f64 {
    let ratio = w as f64 / h as f64;
    if h == 0 || !ratio.is_finite() || ratio <= EPSILON {
        1.0
    } else {
        ratio
    }
}

fn mean_color(img: &RgbaImage) -> Option<[u8; 3]> {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for px in img.pixels().filter(|p| p[3] > ALPHA_CUTOFF) {
        for (acc, channel) in sum.iter_mut().zip(px.0) {
            *acc += channel as u64;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum.map(|s| (s / count) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, color: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn decodes_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "01.png", 40, 20, [200, 100, 50, 255]);
        let asset = load_asset(&path).unwrap();
        assert!((asset.aspect_ratio - 2.0).abs() < 1e-9);
        assert_eq!(asset.mean_color, [200, 100, 50]);
        let thumb = asset.thumb.unwrap();
        assert_eq!((thumb.width(), thumb.height()), (40, 20));
    }

    #[test]
    fn transparent_images_fall_back_to_placeholder_tint() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "02.png", 8, 8, [10, 10, 10, 0]);
        let asset = load_asset(&path).unwrap();
        assert_eq!(asset.mean_color, PLACEHOLDER_COLOR);
    }

    #[test]
    fn failures_become_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        assert!(matches!(load_asset(&missing), Err(AssetError::Io { .. })));

        let garbage = dir.path().join("19.svg");
        std::fs::write(&garbage, b"<svg xmlns='http://www.w3.org/2000/svg'/>").unwrap();
        assert!(matches!(load_asset(&garbage), Err(AssetError::Decode { .. })));

        let asset = load_or_placeholder(&garbage);
        assert!(asset.is_placeholder());
        assert_eq!(asset.aspect_ratio, 1.0);
    }

    #[test]
    fn degenerate_dimensions_give_square_ratio() {
        assert_eq!(aspect_ratio(10, 0), 1.0);
        assert_eq!(aspect_ratio(0, 10), 1.0);
        assert_eq!(aspect_ratio(30, 10), 3.0);
    }
}
