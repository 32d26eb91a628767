//! Raw planar 8-bit 4:2:0 video files.

#![cfg_attr(not(feature = "native"), allow(dead_code))]

use std::path::Path;

use anyhow::{Context, Result, bail};
use vship_flat::{Colorspace, Planes, SamplingFormat};

/// Frames of a headerless `.yuv` file, held in memory.
pub struct YuvFile {
    data: Vec<u8>,
    colorspace: Colorspace,
    frame_len: usize,
}

impl YuvFile {
    pub fn open(path: &Path, width: u32, height: u32) -> Result<Self> {
        let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_bytes(data, width, height).with_context(|| format!("Invalid input {}", path.display()))
    }

    pub fn from_bytes(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Frame size must be non-zero, got {}x{}", width, height);
        }
        let colorspace = Colorspace::new(i64::from(width), i64::from(height), SamplingFormat::UInt8);
        let frame_len = frame_len(&colorspace);
        if data.is_empty() || data.len() % frame_len != 0 {
            bail!(
                "{} bytes is not a whole number of {}x{} 4:2:0 frames ({} bytes each)",
                data.len(),
                width,
                height,
                frame_len
            );
        }
        Ok(Self {
            data,
            colorspace,
            frame_len,
        })
    }

    pub fn colorspace(&self) -> &Colorspace {
        &self.colorspace
    }

    pub fn frame_count(&self) -> usize {
        self.data.len() / self.frame_len
    }

    pub fn frame(&self, index: usize) -> Result<Planes<'_>> {
        let start = index * self.frame_len;
        let Some(bytes) = self.data.get(start..start + self.frame_len) else {
            bail!("Frame {} is out of range ({} frames)", index, self.frame_count());
        };
        Ok(Planes::from_packed(bytes, &self.colorspace)?)
    }
}

/// Number of frames to score when the reference starts at frame `aidx` and
/// the distorted input at frame `bidx`.
///
/// Defaults to every frame both inputs still have after their offsets.
pub fn frame_span(
    reference_frames: usize,
    distorted_frames: usize,
    aidx: usize,
    bidx: usize,
    requested: Option<usize>,
) -> Result<usize> {
    let (Some(reference), Some(distorted)) =
        (reference_frames.checked_sub(aidx), distorted_frames.checked_sub(bidx))
    else {
        bail!(
            "Start frames {}/{} are past the end of the inputs ({}/{} frames)",
            aidx,
            bidx,
            reference_frames,
            distorted_frames
        );
    };
    let available = reference.min(distorted);
    let frames = requested.unwrap_or(available);
    if frames == 0 || frames > available {
        bail!("Requested {} frames but only {} are available", frames, available);
    }
    Ok(frames)
}

/// Bytes in one tightly packed frame.
pub fn frame_len(colorspace: &Colorspace) -> usize {
    (0..3)
        .map(|plane| colorspace.row_bytes(plane) as usize * colorspace.plane_dimensions(plane).1)
        .sum()
}
