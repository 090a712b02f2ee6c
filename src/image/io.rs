//! I/O helpers for scan volumes, slice previews and JSON.
//!
//! - `load_volume`: read an `info.json` plus its per-layer images into a
//!   `VoxelVolume`.
//! - `load_series`: read `<root>/<i>/info.json` for every part of a series.
//! - `save_volume`: write 16-bit PNG layers and a matching `info.json`.
//! - `save_slice_png`: write an owned 8-bit gray buffer to a PNG.
//! - `write_json_file` / `read_json_file`: pretty JSON to and from disk.
//!
//! Layer files are named `<i><format>` next to the metadata file. Stored
//! samples cover the full 16-bit span and are remapped into the metadata
//! range (`[0, 255]` when the metadata carries none).
use crate::error::{Result, StitchError};
use crate::types::{Offset3, Range, Size3};
use crate::volume::VoxelVolume;
use image::{DynamicImage, ImageBuffer, Luma};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STORED_RANGE: Range = Range {
    min: 0.0,
    max: u16::MAX as f32,
};

/// Owned 8-bit grayscale buffer.
#[derive(Clone, Debug)]
pub struct GrayImageU8 {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayImageU8 {
    /// Construct an owned grayscale buffer given raw bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

/// Per-volume metadata stored as `info.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetadata {
    /// Extent along X
    pub width: usize,
    /// Extent along Y
    pub depth: usize,
    /// Extent along Z, i.e. the number of layer files
    pub height: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_min: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_max: Option<f32>,
    /// Layer file suffix, e.g. `.png` or `.tif`
    pub format: String,
    /// First layer of this part in the scanned object (reference data)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_begin: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<i32>,
}

impl VolumeMetadata {
    pub fn size(&self) -> Size3 {
        Size3::new(self.width, self.depth, self.height)
    }

    /// Metadata range, or `[0, 255]` when either bound is missing.
    pub fn range(&self) -> Range {
        match (self.range_min, self.range_max) {
            (Some(min), Some(max)) => Range::new(min, max),
            _ => Range::U8,
        }
    }

    /// Reference placement; present only when `part_begin` is recorded.
    pub fn reference_offset(&self) -> Option<Offset3> {
        self.part_begin.map(|z| {
            Offset3::new(self.offset_x.unwrap_or(0), self.offset_y.unwrap_or(0), z)
        })
    }

    fn for_volume(volume: &VoxelVolume, format: &str) -> Self {
        let size = volume.size();
        let range = volume.range();
        let reference = volume.reference_offset();
        Self {
            width: size.x,
            depth: size.y,
            height: size.z,
            range_min: Some(range.min),
            range_max: Some(range.max),
            format: format.to_string(),
            part_begin: reference.map(|o| o.z),
            offset_x: reference.map(|o| o.x),
            offset_y: reference.map(|o| o.y),
        }
    }
}

/// Root metadata of a multi-part scan series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub parts_num: usize,
}

/// Load a volume from its `info.json` and the layer images beside it.
pub fn load_volume(info_path: &Path) -> Result<VoxelVolume> {
    let meta: VolumeMetadata = read_json_file(info_path)?;
    let size = meta.size();
    if size.is_empty() {
        return Err(StitchError::metadata(format!(
            "{} declares an empty volume {size}",
            info_path.display()
        )));
    }
    let range = meta.range();
    let dir = info_path.parent().unwrap_or_else(|| Path::new(""));

    let mut data = Vec::with_capacity(size.volume());
    for z in 0..size.z {
        let layer_path = dir.join(format!("{z}{}", meta.format));
        let layer = image::open(&layer_path)
            .map_err(|e| StitchError::image(&layer_path, e))?
            .into_luma16();
        if layer.width() as usize != size.x || layer.height() as usize != size.y {
            return Err(StitchError::metadata(format!(
                "{} is {}x{}, expected {}x{}",
                layer_path.display(),
                layer.width(),
                layer.height(),
                size.x,
                size.y
            )));
        }
        data.extend(
            layer
                .into_raw()
                .into_iter()
                .map(|v| STORED_RANGE.fit(v as f32, range)),
        );
    }
    log::debug!(
        "load_volume {} size={} range=[{}, {}]",
        info_path.display(),
        size,
        range.min,
        range.max
    );
    Ok(VoxelVolume::new(size, data, range)?.with_reference_offset(meta.reference_offset()))
}

/// Load every part `<root>/<i>/info.json` listed by a series `info.json`.
pub fn load_series(root_info: &Path) -> Result<Vec<VoxelVolume>> {
    let series: SeriesMetadata = read_json_file(root_info)?;
    let root = root_info.parent().unwrap_or_else(|| Path::new(""));
    (0..series.parts_num)
        .map(|i| load_volume(&part_info_path(root, i)))
        .collect()
}

pub fn part_info_path(root: &Path, part: usize) -> PathBuf {
    root.join(part.to_string()).join("info.json")
}

/// Write `volume` as 16-bit PNG layers plus `info.json` under `dir`.
pub fn save_volume(dir: &Path, volume: &VoxelVolume) -> Result<()> {
    const FORMAT: &str = ".png";
    fs::create_dir_all(dir).map_err(|e| StitchError::io(dir, e))?;
    let size = volume.size();
    let range = volume.range();
    for z in 0..size.z {
        let pixels: Vec<u16> = volume
            .layer(z)
            .iter()
            .map(|&v| range.fit(v, STORED_RANGE).round().clamp(0.0, STORED_RANGE.max) as u16)
            .collect();
        let path = dir.join(format!("{z}{FORMAT}"));
        let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(size.x as u32, size.y as u32, pixels)
                .ok_or_else(|| StitchError::metadata("layer buffer size mismatch"))?;
        DynamicImage::ImageLuma16(buffer)
            .save(&path)
            .map_err(|e| StitchError::image(&path, e))?;
    }
    write_json_file(&dir.join("info.json"), &VolumeMetadata::for_volume(volume, FORMAT))
}

/// Save an 8-bit grayscale buffer to a PNG.
pub fn save_slice_png(buffer: &GrayImageU8, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let image: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(buffer.width as u32, buffer.height as u32, buffer.data.clone())
            .ok_or_else(|| StitchError::metadata("slice buffer size mismatch"))?;
    DynamicImage::ImageLuma8(image)
        .save(path)
        .map_err(|e| StitchError::image(path, e))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| StitchError::io(path, e))
}

/// Parse a JSON file into `T`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|e| StitchError::io(path, e))?;
    Ok(serde_json::from_str(&data)?)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StitchError::io(parent, e))?;
        }
    }
    Ok(())
}
