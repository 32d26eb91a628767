//! CVVDP handler.
//!
//! CVVDP is temporal: the handler accumulates frames to model masking and
//! adaptation, and the score it reports covers every frame submitted since
//! the last [`CvvdpHandler::reset_score`] or [`CvvdpHandler::reset`]. Scores
//! are in JOD; 10 means no visible difference.
//!
//! Frames are order sensitive. Feed them in presentation order.

use std::collections::BTreeMap;
use std::ffi::CString;
use std::path::Path;

use crate::backend::Backend;
use crate::colorspace::Colorspace;
use crate::display_model::{DisplayModel, write_cvvdp_json};
use crate::error::{Error, ImageRole, Result};
use crate::ffi;
use crate::flat;
use crate::planes::{DiffMap, Planes};
use crate::trace::{trace_debug, trace_warn};
use crate::vship::Vship;

/// Viewing parameters shared by both constructors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvvdpOptions {
    /// Presentation frame rate of the content.
    pub fps: f32,
    /// Resample frames to the display model's resolution before scoring.
    pub resize_to_display: bool,
}

impl Default for CvvdpOptions {
    fn default() -> Self {
        Self {
            fps: 24.0,
            resize_to_display: false,
        }
    }
}

/// A libvship CVVDP handler. Freed on drop.
#[derive(Debug)]
pub struct CvvdpHandler<'v, B: Backend> {
    vship: &'v Vship<B>,
    raw: ffi::CvvdpHandler,
    source: Colorspace,
    distorted: Colorspace,
    open: bool,
}

impl<B: Backend> Vship<B> {
    /// Create a CVVDP handler using a built-in display model.
    /// See [`CvvdpHandler::new`].
    pub fn cvvdp(
        &self,
        source: &Colorspace,
        distorted: &Colorspace,
        options: CvvdpOptions,
        model_key: &str,
    ) -> Result<CvvdpHandler<'_, B>> {
        CvvdpHandler::new(self, source, distorted, options, model_key)
    }
}

impl<'v, B: Backend> CvvdpHandler<'v, B> {
    /// Create a handler with one of CVVDP's built-in display models, such as
    /// `"standard_fhd"` or `"standard_4k"`.
    pub fn new(
        vship: &'v Vship<B>,
        source: &Colorspace,
        distorted: &Colorspace,
        options: CvvdpOptions,
        model_key: &str,
    ) -> Result<Self> {
        let key = CString::new(model_key)?;
        let mut raw = ffi::CvvdpHandler::default();
        let code = unsafe {
            vship.backend().cvvdp_init(
                &raw mut raw,
                source.to_raw(),
                distorted.to_raw(),
                options.fps,
                options.resize_to_display,
                key.as_ptr(),
            )
        };
        vship.check(code)?;
        trace_debug!("cvvdp_init", id = raw.id, fps = options.fps);

        Ok(Self::bind(vship, raw, source, distorted))
    }

    /// Create a handler with a display model read from the CVVDP display
    /// configuration file at `model_config_path`, typically written by
    /// [`write_cvvdp_json`]. The library reads the file during this call.
    ///
    /// When `model_key` names a built-in model, fields present in the
    /// configuration override it.
    pub fn with_config(
        vship: &'v Vship<B>,
        source: &Colorspace,
        distorted: &Colorspace,
        options: CvvdpOptions,
        model_key: &str,
        model_config_path: &Path,
    ) -> Result<Self> {
        let key = CString::new(model_key)?;
        let path = model_config_path
            .to_str()
            .ok_or_else(|| Error::NonUtf8Path(model_config_path.to_path_buf()))?;
        let config = CString::new(path)?;
        let mut raw = ffi::CvvdpHandler::default();
        let code = unsafe {
            vship.backend().cvvdp_init_with_config(
                &raw mut raw,
                source.to_raw(),
                distorted.to_raw(),
                options.fps,
                options.resize_to_display,
                key.as_ptr(),
                config.as_ptr(),
            )
        };
        vship.check(code)?;
        trace_debug!("cvvdp_init", id = raw.id, fps = options.fps);

        Ok(Self::bind(vship, raw, source, distorted))
    }

    /// Create a handler from in-memory display models.
    ///
    /// The models are written to a temporary configuration file that is
    /// removed once the library has read it.
    pub fn with_display_models(
        vship: &'v Vship<B>,
        source: &Colorspace,
        distorted: &Colorspace,
        options: CvvdpOptions,
        model_key: &str,
        models: &BTreeMap<String, DisplayModel>,
    ) -> Result<Self> {
        let config = tempfile::Builder::new()
            .prefix("cvvdp-display-")
            .suffix(".json")
            .tempfile()?;
        write_cvvdp_json(models, config.path())?;
        trace_debug!("cvvdp_display_config", models = models.len());
        Self::with_config(vship, source, distorted, options, model_key, config.path())
    }

    fn bind(
        vship: &'v Vship<B>,
        raw: ffi::CvvdpHandler,
        source: &Colorspace,
        distorted: &Colorspace,
    ) -> Self {
        Self {
            vship,
            raw,
            source: *source,
            distorted: *distorted,
            open: true,
        }
    }

    /// The raw libvship handler, for use with [`crate::flat`].
    #[must_use]
    pub fn raw(&self) -> ffi::CvvdpHandler {
        self.raw
    }

    /// Drop all temporal history and the accumulated score.
    pub fn reset(&mut self) -> Result<()> {
        self.vship.check(self.vship.backend().cvvdp_reset(self.raw))
    }

    /// Drop the accumulated score but keep temporal history.
    pub fn reset_score(&mut self) -> Result<()> {
        self.vship.check(self.vship.backend().cvvdp_reset_score(self.raw))
    }

    /// Feed a frame pair into the temporal history without scoring it.
    pub fn load_temporal(&mut self, source: &Planes<'_>, distorted: &Planes<'_>) -> Result<()> {
        self.validate(source, distorted)?;

        let [s0, s1, s2] = source.pointers();
        let [ls0, ls1, ls2] = source.strides();
        let [d0, d1, d2] = distorted.pointers();
        let [ld0, ld1, ld2] = distorted.strides();

        let code = unsafe {
            flat::load_temporal_cvvdp(
                self.vship.backend(),
                &raw const self.raw,
                s0,
                s1,
                s2,
                d0,
                d1,
                d2,
                ls0,
                ls1,
                ls2,
                ld0,
                ld1,
                ld2,
            )
        };
        self.vship.check(code)
    }

    /// Score a frame pair and return the score accumulated so far.
    pub fn compute_score(&mut self, source: &Planes<'_>, distorted: &Planes<'_>) -> Result<f64> {
        self.validate(source, distorted)?;
        unsafe { self.compute(std::ptr::null(), 0, source, distorted) }
    }

    /// As [`CvvdpHandler::compute_score`], also writing the per-pixel
    /// difference map.
    ///
    /// # Safety
    ///
    /// The map resolution depends on the display model and on
    /// `resize_to_display`, which this crate cannot see. `map` must cover the
    /// resolution the library scores at.
    pub unsafe fn compute_score_into_map(
        &mut self,
        map: &mut DiffMap<'_>,
        source: &Planes<'_>,
        distorted: &Planes<'_>,
    ) -> Result<f64> {
        self.validate(source, distorted)?;
        unsafe { self.compute(map.as_mut_ptr(), map.stride_bytes(), source, distorted) }
    }

    fn validate(&self, source: &Planes<'_>, distorted: &Planes<'_>) -> Result<()> {
        source.validate(&self.source, ImageRole::Source)?;
        distorted.validate(&self.distorted, ImageRole::Distorted)
    }

    /// Planes must already be validated; `dstp` is null or covers the map.
    unsafe fn compute(
        &mut self,
        dstp: *const u8,
        dst_stride: i64,
        source: &Planes<'_>,
        distorted: &Planes<'_>,
    ) -> Result<f64> {
        let [s0, s1, s2] = source.pointers();
        let [ls0, ls1, ls2] = source.strides();
        let [d0, d1, d2] = distorted.pointers();
        let [ld0, ld1, ld2] = distorted.strides();

        let mut score = 0.0;
        let code = unsafe {
            flat::compute_cvvdp(
                self.vship.backend(),
                &raw const self.raw,
                &raw mut score,
                dstp,
                dst_stride,
                s0,
                s1,
                s2,
                d0,
                d1,
                d2,
                ls0,
                ls1,
                ls2,
                ld0,
                ld1,
                ld2,
            )
        };
        self.vship.check(code)?;
        Ok(score)
    }

    /// Free the handler, reporting the library's status.
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        trace_debug!("cvvdp_free", id = self.raw.id);
        self.vship.check(self.vship.backend().cvvdp_free(self.raw))
    }
}

impl<B: Backend> Drop for CvvdpHandler<'_, B> {
    fn drop(&mut self) {
        if self.open {
            let code = self.vship.backend().cvvdp_free(self.raw);
            if !code.is_none() {
                trace_warn!("cvvdp_free_failed", id = self.raw.id, code = code.raw());
            }
        }
    }
}
