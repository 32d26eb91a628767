//! SSIMULACRA2 handler.
//!
//! Higher scores are better; identical frames score 100. Each score is
//! independent: the handler keeps no history between calls.

use crate::backend::Backend;
use crate::colorspace::Colorspace;
use crate::error::{ImageRole, Result};
use crate::ffi;
use crate::flat;
use crate::planes::Planes;
use crate::trace::{trace_debug, trace_warn};
use crate::vship::Vship;

/// A libvship SSIMULACRA2 handler bound to one source and one distorted
/// layout. Freed on drop.
#[derive(Debug)]
pub struct Ssimu2Handler<'v, B: Backend> {
    vship: &'v Vship<B>,
    raw: ffi::Ssimu2Handler,
    source: Colorspace,
    distorted: Colorspace,
    open: bool,
}

impl<B: Backend> Vship<B> {
    /// Create a SSIMULACRA2 handler. See [`Ssimu2Handler::new`].
    pub fn ssimu2(
        &self,
        source: &Colorspace,
        distorted: &Colorspace,
    ) -> Result<Ssimu2Handler<'_, B>> {
        Ssimu2Handler::new(self, source, distorted)
    }
}

impl<'v, B: Backend> Ssimu2Handler<'v, B> {
    /// Create a handler for frames laid out as `source` and `distorted`.
    pub fn new(vship: &'v Vship<B>, source: &Colorspace, distorted: &Colorspace) -> Result<Self> {
        let mut raw = ffi::Ssimu2Handler::default();
        let code = unsafe {
            vship
                .backend()
                .ssimu2_init(&raw mut raw, source.to_raw(), distorted.to_raw())
        };
        vship.check(code)?;
        trace_debug!("ssimu2_init", id = raw.id);

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
    pub fn raw(&self) -> ffi::Ssimu2Handler {
        self.raw
    }

    /// Score `distorted` against `source`.
    pub fn compute_score(&mut self, source: &Planes<'_>, distorted: &Planes<'_>) -> Result<f64> {
        source.validate(&self.source, ImageRole::Source)?;
        distorted.validate(&self.distorted, ImageRole::Distorted)?;

        let [s0, s1, s2] = source.pointers();
        let [ls0, ls1, ls2] = source.strides();
        let [d0, d1, d2] = distorted.pointers();
        let [ld0, ld1, ld2] = distorted.strides();

        let mut score = 0.0;
        let code = unsafe {
            flat::compute_ssimu2(
                self.vship.backend(),
                &raw const self.raw,
                &raw mut score,
                s0,
                s1,
                s2,
                ls0,
                ls1,
                ls2,
                d0,
                d1,
                d2,
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
        trace_debug!("ssimu2_free", id = self.raw.id);
        self.vship.check(self.vship.backend().ssimu2_free(self.raw))
    }
}

impl<B: Backend> Drop for Ssimu2Handler<'_, B> {
    fn drop(&mut self) {
        if self.open {
            let code = self.vship.backend().ssimu2_free(self.raw);
            if !code.is_none() {
                trace_warn!("ssimu2_free_failed", id = self.raw.id, code = code.raw());
            }
        }
    }
}
