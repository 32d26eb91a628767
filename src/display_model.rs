//! Display and viewing-condition models for CVVDP.
//!
//! CVVDP scores depend on the physical display and on how it is viewed: peak
//! luminance, size, distance, contrast, ambient light. [`DisplayModel`]
//! describes one such setup, and [`to_cvvdp_json`] renders a set of them in
//! the display configuration format. libvship reads that configuration from
//! a file: see [`write_cvvdp_json`], [`crate::CvvdpHandler::with_config`] and
//! [`crate::CvvdpHandler::with_display_models`].
//!
//! ## Presets
//!
//! | Preset | Resolution | Peak | Ambient |
//! |--------|------------|------|---------|
//! | [`DisplayModel::standard_4k`] | 3840x2160 | 200 nits | 250 lux |
//! | [`DisplayModel::standard_fhd`] | 1920x1080 | 200 nits | 250 lux |
//! | [`DisplayModel::standard_hdr`] | 3840x2160 | 1500 nits | 10 lux |
//! | [`DisplayModel::standard_hdr_dark_room`] | 3840x2160 | 1500 nits | 0 lux |

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Perceptual pipeline CVVDP applies for the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayModelColorspace {
    #[serde(rename = "HDR")]
    Hdr,
    #[serde(rename = "SDR")]
    Sdr,
}

/// Physical and viewing characteristics of a display.
///
/// Zero-valued fields are left out of the generated configuration, so a model
/// with only some fields set overrides just those fields of a built-in model
/// with the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayModel {
    /// Human-readable description of the display and viewing setup.
    pub name: String,
    pub colorspace: Option<DisplayModelColorspace>,
    /// Native resolution in pixels.
    pub width: u32,
    pub height: u32,
    /// Peak luminance in cd/m².
    pub max_luminance: f32,
    pub diagonal_size_inches: f32,
    /// Distance between viewer and display.
    pub viewing_distance_meters: f32,
    /// Native contrast ratio, e.g. 1000 for 1000:1. OLED panels should use a
    /// large finite value such as 1e6.
    pub contrast_ratio: u32,
    /// Ambient illumination in lux.
    pub ambient_lux: u32,
    /// Fraction of ambient light reflected by the panel.
    pub reflectivity: f32,
    /// Global perceptual scale; 1 matches CVVDP reference conditions.
    pub exposure: f32,
}

impl DisplayModel {
    /// A model that only carries a name; every other field is unset.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colorspace: None,
            width: 0,
            height: 0,
            max_luminance: 0.0,
            diagonal_size_inches: 0.0,
            viewing_distance_meters: 0.0,
            contrast_ratio: 0,
            ambient_lux: 0,
            reflectivity: 0.0,
            exposure: 0.0,
        }
    }

    /// 30-inch SDR 4K monitor under office lighting, seen from twice the
    /// display height.
    #[must_use]
    pub fn standard_4k() -> Self {
        Self {
            name: "30-inch 4K monitor, peak luminance 200 cd/m^2, viewed under office light levels (250 lux), seen from 2 x display height".to_string(),
            colorspace: Some(DisplayModelColorspace::Sdr),
            width: 3840,
            height: 2160,
            max_luminance: 200.0,
            diagonal_size_inches: 30.0,
            viewing_distance_meters: 0.7472,
            contrast_ratio: 1000,
            ambient_lux: 250,
            reflectivity: 0.005,
            exposure: 1.0,
        }
    }

    /// As [`DisplayModel::standard_4k`] at Full HD.
    #[must_use]
    pub fn standard_fhd() -> Self {
        Self {
            name: "30-inch FHD monitor, peak luminance 200 cd/m^2, viewed under office light levels (250 lux), seen from 2 x display height".to_string(),
            width: 1920,
            height: 1080,
            ..Self::standard_4k()
        }
    }

    /// Bright HDR monitor in a dim room.
    #[must_use]
    pub fn standard_hdr() -> Self {
        Self {
            name: "30-inch 4K HDR monitor, peak luminance 1500 cd/m^2, viewed under low light levels (10 lux), seen from 2 x display height".to_string(),
            colorspace: Some(DisplayModelColorspace::Hdr),
            max_luminance: 1500.0,
            contrast_ratio: 1_000_000,
            ambient_lux: 10,
            ..Self::standard_4k()
        }
    }

    /// Bright HDR monitor with no ambient light.
    #[must_use]
    pub fn standard_hdr_dark_room() -> Self {
        Self {
            name: "30-inch 4K HDR monitor, peak luminance 1500 cd/m^2, viewed in a dark room (0 lux), seen from 2 x display height".to_string(),
            ambient_lux: 0,
            ..Self::standard_hdr()
        }
    }

    /// Preset by its CVVDP key.
    #[must_use]
    pub fn preset(key: &str) -> Option<Self> {
        match key {
            "standard_4k" => Some(Self::standard_4k()),
            "standard_fhd" => Some(Self::standard_fhd()),
            "standard_hdr" => Some(Self::standard_hdr()),
            "standard_hdr_dark" => Some(Self::standard_hdr_dark_room()),
            _ => None,
        }
    }

    /// Keys accepted by [`DisplayModel::preset`].
    pub const PRESET_KEYS: [&'static str; 4] =
        ["standard_4k", "standard_fhd", "standard_hdr", "standard_hdr_dark"];
}

fn is_zero_f32(value: &f32) -> bool {
    *value == 0.0
}

fn is_zero_resolution(value: &[u32; 2]) -> bool {
    value[0] == 0 && value[1] == 0
}

/// One entry of a CVVDP display configuration file.
#[derive(Debug, Serialize)]
struct CvvdpDisplayEntry<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    colorspace: Option<DisplayModelColorspace>,
    #[serde(skip_serializing_if = "is_zero_resolution")]
    resolution: [u32; 2],
    #[serde(skip_serializing_if = "is_zero_f32")]
    max_luminance: f32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    viewing_distance_meters: f32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    diagonal_size_inches: f32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    contrast: f32,
    #[serde(rename = "E_ambient", skip_serializing_if = "is_zero_f32")]
    e_ambient: f32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    k_refl: f32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    exposure: f32,
    source: &'static str,
}

impl<'a> From<&'a DisplayModel> for CvvdpDisplayEntry<'a> {
    fn from(model: &'a DisplayModel) -> Self {
        Self {
            name: &model.name,
            colorspace: model.colorspace,
            resolution: [model.width, model.height],
            max_luminance: model.max_luminance,
            viewing_distance_meters: model.viewing_distance_meters,
            diagonal_size_inches: model.diagonal_size_inches,
            contrast: model.contrast_ratio as f32,
            e_ambient: model.ambient_lux as f32,
            k_refl: model.reflectivity,
            exposure: model.exposure,
            source: "none",
        }
    }
}

/// Render display models as a CVVDP display configuration.
///
/// Map keys become the display identifiers to pass as `model_key`. Output is
/// indented with four spaces.
pub fn to_cvvdp_json(models: &BTreeMap<String, DisplayModel>) -> Result<String> {
    let entries: BTreeMap<&str, CvvdpDisplayEntry<'_>> = models
        .iter()
        .map(|(key, model)| (key.as_str(), CvvdpDisplayEntry::from(model)))
        .collect();

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    entries.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Write [`to_cvvdp_json`] output to `path`.
pub fn write_cvvdp_json(models: &BTreeMap<String, DisplayModel>, path: &Path) -> Result<()> {
    std::fs::write(path, to_cvvdp_json(models)?)?;
    Ok(())
}
