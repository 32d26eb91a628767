//! Butteraugli handler.
//!
//! Butteraugli computes a distance per pixel; lower is better. A distance of
//! 1 is roughly the threshold at which a viewer notices the difference in an
//! in-place swap at the assumed display brightness.
//!
//! Score interpretation:
//! - < 1.0: Imperceptible difference
//! - < 2.0: Marginal difference
//! - >= 3.0: Clearly visible

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::colorspace::Colorspace;
use crate::error::{ImageRole, Result};
use crate::ffi;
use crate::flat;
use crate::planes::{DiffMap, Planes};
use crate::trace::{trace_debug, trace_warn};
use crate::vship::Vship;

/// Norm used by libvship when none is requested explicitly.
pub const DEFAULT_QNORM: i32 = 2;

/// Display brightness assumed by the reference Butteraugli.
pub const DEFAULT_DISPLAY_NITS: f32 = 203.0;

/// Summaries of a Butteraugli distance map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ButteraugliScore {
    /// Q-norm of all per-pixel distances, with the Q chosen at handler creation.
    pub norm_q: f64,
    /// 3-norm; weights structured and spatially correlated errors.
    pub norm3: f64,
    /// Distance of the single worst pixel.
    pub norm_inf: f64,
}

impl From<ffi::ButteraugliScore> for ButteraugliScore {
    fn from(raw: ffi::ButteraugliScore) -> Self {
        Self {
            norm_q: raw.norm_q,
            norm3: raw.norm3,
            norm_inf: raw.norm_inf,
        }
    }
}

/// A libvship Butteraugli handler. Freed on drop.
#[derive(Debug)]
pub struct ButteraugliHandler<'v, B: Backend> {
    vship: &'v Vship<B>,
    raw: ffi::ButteraugliHandler,
    source: Colorspace,
    distorted: Colorspace,
    open: bool,
}

impl<B: Backend> Vship<B> {
    /// Create a Butteraugli handler. See [`ButteraugliHandler::new`].
    pub fn butteraugli(
        &self,
        source: &Colorspace,
        distorted: &Colorspace,
        qnorm: i32,
        display_nits: f32,
    ) -> Result<ButteraugliHandler<'_, B>> {
        ButteraugliHandler::new(self, source, distorted, qnorm, display_nits)
    }
}

impl<'v, B: Backend> ButteraugliHandler<'v, B> {
    /// Create a handler.
    ///
    /// `qnorm` selects the norm reported as [`ButteraugliScore::norm_q`].
    /// `display_nits` is the peak brightness of the assumed display.
    pub fn new(
        vship: &'v Vship<B>,
        source: &Colorspace,
        distorted: &Colorspace,
        qnorm: i32,
        display_nits: f32,
    ) -> Result<Self> {
        let mut raw = ffi::ButteraugliHandler::default();
        let code = unsafe {
            vship.backend().butteraugli_init(
                &raw mut raw,
                source.to_raw(),
                distorted.to_raw(),
                qnorm,
                display_nits,
            )
        };
        vship.check(code)?;
        trace_debug!("butteraugli_init", id = raw.id, qnorm = qnorm);

        Ok(Self {
            vship,
            raw,
            source: *source,
            distorted: *distorted,
            open: true,
        })
    }

    /// The raw libvship handler, for use with [`crate::flat`].
    #[must_use]
    pub fn raw(&self) -> ffi::ButteraugliHandler {
        self.raw
    }

    /// Score `distorted` against `source` without producing a distance map.
    pub fn compute_score(
        &mut self,
        source: &Planes<'_>,
        distorted: &Planes<'_>,
    ) -> Result<ButteraugliScore> {
        self.compute(std::ptr::null(), 0, source, distorted)
    }

    /// Score `distorted` against `source` and write the per-pixel distance
    /// map into `map`, which must cover the source frame.
    pub fn compute_score_with_map(
        &mut self,
        map: &mut DiffMap<'_>,
        source: &Planes<'_>,
        distorted: &Planes<'_>,
    ) -> Result<ButteraugliScore> {
        map.check_covers(self.source.map_dimensions())?;
        self.compute(map.as_mut_ptr(), map.stride_bytes(), source, distorted)
    }

    fn compute(
        &mut self,
        dstp: *const u8,
        dst_stride: i64,
        source: &Planes<'_>,
        distorted: &Planes<'_>,
    ) -> Result<ButteraugliScore> {
        source.validate(&self.source, ImageRole::Source)?;
        distorted.validate(&self.distorted, ImageRole::Distorted)?;

        let [s0, s1, s2] = source.pointers();
        let [ls0, ls1, ls2] = source.strides();
        let [d0, d1, d2] = distorted.pointers();
        let [ld0, ld1, ld2] = distorted.strides();

        let mut score = ffi::ButteraugliScore::default();
        let code = unsafe {
            flat::compute_butteraugli(
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
        Ok(score.into())
    }

    /// Free the handler, reporting the library's status.
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        trace_debug!("butteraugli_free", id = self.raw.id);
        self.vship.check(self.vship.backend().butteraugli_free(self.raw))
    }
}

impl<B: Backend> Drop for ButteraugliHandler<'_, B> {
    fn drop(&mut self) {
        if self.open {
            let code = self.vship.backend().butteraugli_free(self.raw);
            if !code.is_none() {
                trace_warn!("butteraugli_free_failed", id = self.raw.id, code = code.raw());
            }
        }
    }
}
