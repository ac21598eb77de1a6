use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use motiontrail::Resolution;

const BACKGROUND: Rgba<u8> = Rgba([12, 12, 16, 255]);
const SQUARE: Rgba<u8> = Rgba([240, 240, 240, 255]);

/// Where the driver's "rendered" frames come from.
pub enum FrameSequence {
    /// PNG files played back in name order, wrapping at the end.
    Directory { paths: Vec<PathBuf> },
    /// A square sliding across a dark background.
    Synthetic { resolution: Resolution },
}

impl FrameSequence {
    pub fn open(directory: Option<&Path>, resolution: Resolution) -> Result<Self> {
        let Some(directory) = directory else {
            return Ok(Self::Synthetic { resolution });
        };

        let mut paths = Vec::new();
        let entries = fs::read_dir(directory)
            .with_context(|| format!("failed to list frames in {}", directory.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list frames in {}", directory.display()))?
                .path();
            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if path.is_file() && is_png {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            anyhow::bail!("no PNG frames found in {}", directory.display());
        }
        tracing::info!(
            frames = paths.len(),
            dir = %directory.display(),
            "loaded frame sequence"
        );
        Ok(Self::Directory { paths })
    }

    pub fn frame(&self, tick: u64) -> Result<RgbaImage> {
        match self {
            Self::Directory { paths } => {
                let path = &paths[(tick % paths.len() as u64) as usize];
                let image = image::open(path)
                    .with_context(|| format!("failed to open frame {}", path.display()))?;
                Ok(image.to_rgba8())
            }
            Self::Synthetic { resolution } => Ok(synthetic_frame(*resolution, tick)),
        }
    }
}

/// Square of a quarter of the frame height, moving two pixels per tick and
/// wrapping at the right edge.
pub fn synthetic_frame(resolution: Resolution, tick: u64) -> RgbaImage {
    let side = (resolution.height / 4).max(1);
    let travel = u64::from(resolution.width.saturating_sub(side).max(1));
    let left = ((tick * 2) % travel) as u32;
    let top = (resolution.height - side) / 2;

    RgbaImage::from_fn(resolution.width, resolution.height, |x, y| {
        let inside = (left..left + side).contains(&x) && (top..top + side).contains(&y);
        if inside {
            SQUARE
        } else {
            BACKGROUND
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_square_moves_between_ticks() {
        let resolution = Resolution::new(32, 16);
        let first = synthetic_frame(resolution, 0);
        let second = synthetic_frame(resolution, 1);
        assert_eq!(first.dimensions(), (32, 16));
        assert_ne!(first.as_raw(), second.as_raw());
        assert_eq!(*first.get_pixel(0, 8), SQUARE);
        assert_eq!(*second.get_pixel(0, 8), BACKGROUND);
        assert_eq!(*second.get_pixel(2, 8), SQUARE);
    }

    #[test]
    fn synthetic_frames_are_deterministic() {
        let resolution = Resolution::new(8, 8);
        assert_eq!(
            synthetic_frame(resolution, 5).as_raw(),
            synthetic_frame(resolution, 5).as_raw()
        );
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = FrameSequence::open(Some(dir.path()), Resolution::new(4, 4))
            .err()
            .expect("empty directory should fail");
        assert!(err.to_string().contains("no PNG frames"));
    }
}
