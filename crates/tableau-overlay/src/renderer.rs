//! Cached overlay rendering to PNG.
//!
//! Every overlay image has a `<image>.meta` JSON sidecar recording the
//! parameters it was drawn with. A request whose parameters match an existing
//! image and sidecar is served from disk.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tableau_combat::{OverlayRenderer, OverlayRequest, OverlayStatus};
use tableau_common::{SchemaVersion, TableauError, TableauResult};
use tracing::{info, warn};

use crate::raster::rasterize_grid;

/// Sidecar describing how an overlay image was drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayMeta {
    /// Sidecar format version
    pub version: SchemaVersion,
    /// Canvas width in pixels
    pub container_width: u32,
    /// Canvas height in pixels
    pub container_height: u32,
    /// Hex size in pixels
    pub hex_size: u32,
    /// Overflow rings drawn past the canvas edge
    pub overflow: u32,
}

impl OverlayMeta {
    /// Sidecar for a request.
    #[must_use]
    pub fn for_request(request: &OverlayRequest) -> Self {
        Self {
            version: SchemaVersion::OVERLAY_META,
            container_width: request.container_width,
            container_height: request.container_height,
            hex_size: request.hex_size,
            overflow: request.overflow,
        }
    }

    /// Whether an image drawn with these parameters satisfies `other`.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        SchemaVersion::OVERLAY_META.can_read(&self.version)
            && self.container_width == other.container_width
            && self.container_height == other.container_height
            && self.hex_size == other.hex_size
            && self.overflow == other.overflow
    }
}

/// Sidecar path for an overlay image: `<image>.meta`.
#[must_use]
pub fn meta_path(image_path: &Path) -> PathBuf {
    let mut path = OsString::from(image_path.as_os_str());
    path.push(".meta");
    PathBuf::from(path)
}

/// [`OverlayRenderer`] that writes PNG files next to a `.meta` sidecar.
#[derive(Debug, Default)]
pub struct HexOverlayRenderer {
    rendered: u64,
    cached: u64,
}

impl HexOverlayRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Images written so far.
    #[must_use]
    pub const fn rendered_count(&self) -> u64 {
        self.rendered
    }

    /// Requests served from disk so far.
    #[must_use]
    pub const fn cached_count(&self) -> u64 {
        self.cached
    }

    fn is_cached(request: &OverlayRequest, wanted: &OverlayMeta) -> bool {
        let meta_file = meta_path(&request.output_path);
        if !request.output_path.exists() || !meta_file.exists() {
            return false;
        }

        let stored = match fs::read_to_string(&meta_file) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read overlay meta {:?}: {}", meta_file, e);
                return false;
            },
        };
        match serde_json::from_str::<OverlayMeta>(&stored) {
            Ok(meta) => meta.matches(wanted),
            Err(e) => {
                warn!("Ignoring unreadable overlay meta {:?}: {}", meta_file, e);
                false
            },
        }
    }
}

impl OverlayRenderer for HexOverlayRenderer {
    fn render(&mut self, request: &OverlayRequest) -> TableauResult<OverlayStatus> {
        let wanted = OverlayMeta::for_request(request);
        if Self::is_cached(request, &wanted) {
            info!(path = ?request.output_path, "Overlay cache hit");
            self.cached += 1;
            return Ok(OverlayStatus::Cached);
        }

        let image = rasterize_grid(
            request.container_width,
            request.container_height,
            f64::from(request.hex_size),
            request.overflow,
        )?;

        if let Some(parent) = request.output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // The old sidecar goes before the image is replaced and the new one
        // lands last, so a half-finished render never looks cached.
        let meta_file = meta_path(&request.output_path);
        if let Err(e) = fs::remove_file(&meta_file) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }

        let temp_path = request.output_path.with_extension("png.tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            image
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| TableauError::Overlay(e.to_string()))?;
            writer.flush()?;
        }
        replace_file(&temp_path, &request.output_path)?;

        let meta = serde_json::to_string_pretty(&wanted)
            .map_err(|e| TableauError::Serialization(e.to_string()))?;
        let meta_temp = meta_file.with_extension("meta.tmp");
        fs::write(&meta_temp, meta)?;
        replace_file(&meta_temp, &meta_file)?;

        self.rendered += 1;
        info!(
            "Rendered {}x{} overlay (hex size {}) to {:?}",
            request.container_width, request.container_height, request.hex_size, request.output_path
        );
        Ok(OverlayStatus::Rendered)
    }
}

/// Renames `temp` over `target`, removing `temp` if that fails.
fn replace_file(temp: &Path, target: &Path) -> TableauResult<()> {
    fs::rename(temp, target).map_err(|e| {
        let _ = fs::remove_file(temp);
        TableauError::Io(e)
    })
}
