//! Flattened entry points.
//!
//! libvship takes the planes of each image as `const uint8_t* planes[3]` and
//! the strides as `int64_t lineSize[3]`. A host whose collector may move or
//! free its buffers cannot hand native code an array that points into managed
//! memory, so every operation here takes each plane pointer and each stride
//! as its own argument instead. The arrays are rebuilt on this call's stack,
//! passed to the library, and dropped when the call returns.
//!
//! Nothing is validated and nothing is retained: the status of the wrapped
//! call is returned exactly as the library produced it, and the score slot
//! and difference map are written by the library alone.
//!
//! With the `native` feature the four operations are also exported with C
//! linkage under the names declared in `include/vship_flat.h`.

use crate::backend::Backend;
use crate::ffi::{ButteraugliHandler, ButteraugliScore, CvvdpHandler, ExceptionCode, Ssimu2Handler};

/// Flattened `Vship_ComputeSSIMU2`.
///
/// # Safety
///
/// `handler` must point to a handler value (its contents may be stale; the
/// library reports that as `BadHandler`). `score` must be writable. Each
/// non-null plane must stay valid and unmoved for the duration of the call and
/// cover its stride times its row count.
pub unsafe fn compute_ssimu2<B: Backend + ?Sized>(
    backend: &B,
    handler: *const Ssimu2Handler,
    score: *mut f64,
    s0: *const u8,
    s1: *const u8,
    s2: *const u8,
    ls0: i64,
    ls1: i64,
    ls2: i64,
    d0: *const u8,
    d1: *const u8,
    d2: *const u8,
    ld0: i64,
    ld1: i64,
    ld2: i64,
) -> ExceptionCode {
    let src = [s0, s1, s2];
    let dis = [d0, d1, d2];
    let src_line = [ls0, ls1, ls2];
    let dis_line = [ld0, ld1, ld2];

    unsafe {
        backend.compute_ssimu2(
            *handler,
            score,
            src.as_ptr(),
            dis.as_ptr(),
            src_line.as_ptr(),
            dis_line.as_ptr(),
        )
    }
}

/// Flattened `Vship_ComputeButteraugli`.
///
/// # Safety
///
/// As [`compute_ssimu2`]. `dstp` is null or a writable `f32` map of
/// `dst_stride` bytes per row.
pub unsafe fn compute_butteraugli<B: Backend + ?Sized>(
    backend: &B,
    handler: *const ButteraugliHandler,
    score: *mut ButteraugliScore,
    dstp: *const u8,
    dst_stride: i64,
    s0: *const u8,
    s1: *const u8,
    s2: *const u8,
    d0: *const u8,
    d1: *const u8,
    d2: *const u8,
    ls0: i64,
    ls1: i64,
    ls2: i64,
    ld0: i64,
    ld1: i64,
    ld2: i64,
) -> ExceptionCode {
    let src = [s0, s1, s2];
    let dis = [d0, d1, d2];
    let src_line = [ls0, ls1, ls2];
    let dis_line = [ld0, ld1, ld2];

    unsafe {
        backend.compute_butteraugli(
            *handler,
            score,
            dstp,
            dst_stride,
            src.as_ptr(),
            dis.as_ptr(),
            src_line.as_ptr(),
            dis_line.as_ptr(),
        )
    }
}

/// Flattened `Vship_LoadTemporalCVVDP`.
///
/// # Safety
///
/// As [`compute_ssimu2`], without a score slot.
pub unsafe fn load_temporal_cvvdp<B: Backend + ?Sized>(
    backend: &B,
    handler: *const CvvdpHandler,
    s0: *const u8,
    s1: *const u8,
    s2: *const u8,
    d0: *const u8,
    d1: *const u8,
    d2: *const u8,
    ls0: i64,
    ls1: i64,
    ls2: i64,
    ld0: i64,
    ld1: i64,
    ld2: i64,
) -> ExceptionCode {
    let src = [s0, s1, s2];
    let dis = [d0, d1, d2];
    let src_line = [ls0, ls1, ls2];
    let dis_line = [ld0, ld1, ld2];

    unsafe {
        backend.load_temporal_cvvdp(
            *handler,
            src.as_ptr(),
            dis.as_ptr(),
            src_line.as_ptr(),
            dis_line.as_ptr(),
        )
    }
}

/// Flattened `Vship_ComputeCVVDP`.
///
/// # Safety
///
/// As [`compute_butteraugli`], with a scalar score slot.
pub unsafe fn compute_cvvdp<B: Backend + ?Sized>(
    backend: &B,
    handler: *const CvvdpHandler,
    score: *mut f64,
    dstp: *const u8,
    dst_stride: i64,
    s0: *const u8,
    s1: *const u8,
    s2: *const u8,
    d0: *const u8,
    d1: *const u8,
    d2: *const u8,
    ls0: i64,
    ls1: i64,
    ls2: i64,
    ld0: i64,
    ld1: i64,
    ld2: i64,
) -> ExceptionCode {
    let src = [s0, s1, s2];
    let dis = [d0, d1, d2];
    let src_line = [ls0, ls1, ls2];
    let dis_line = [ld0, ld1, ld2];

    unsafe {
        backend.compute_cvvdp(
            *handler,
            score,
            dstp,
            dst_stride,
            src.as_ptr(),
            dis.as_ptr(),
            src_line.as_ptr(),
            dis_line.as_ptr(),
        )
    }
}

#[cfg(feature = "native")]
#[allow(non_snake_case)]
mod exports {
    use super::{
        ButteraugliHandler, ButteraugliScore, CvvdpHandler, ExceptionCode, Ssimu2Handler,
    };
    use crate::backend::Native;

    /// # Safety
    ///
    /// See [`super::compute_ssimu2`].
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn ComputeSSIMU2_flat(
        handler: *mut Ssimu2Handler,
        score: *mut f64,
        s0: *mut u8,
        s1: *mut u8,
        s2: *mut u8,
        ls0: i64,
        ls1: i64,
        ls2: i64,
        d0: *mut u8,
        d1: *mut u8,
        d2: *mut u8,
        ld0: i64,
        ld1: i64,
        ld2: i64,
    ) -> ExceptionCode {
        unsafe {
            super::compute_ssimu2(
                &Native, handler, score, s0, s1, s2, ls0, ls1, ls2, d0, d1, d2, ld0, ld1, ld2,
            )
        }
    }

    /// # Safety
    ///
    /// See [`super::compute_butteraugli`].
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn ComputeButteraugli_flat(
        handler: *mut ButteraugliHandler,
        score: *mut ButteraugliScore,
        dstp: *const u8,
        dststride: i64,
        s0: *const u8,
        s1: *const u8,
        s2: *const u8,
        d0: *const u8,
        d1: *const u8,
        d2: *const u8,
        ls0: i64,
        ls1: i64,
        ls2: i64,
        ld0: i64,
        ld1: i64,
        ld2: i64,
    ) -> ExceptionCode {
        unsafe {
            super::compute_butteraugli(
                &Native, handler, score, dstp, dststride, s0, s1, s2, d0, d1, d2, ls0, ls1, ls2,
                ld0, ld1, ld2,
            )
        }
    }

    /// # Safety
    ///
    /// See [`super::load_temporal_cvvdp`].
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn LoadTemporalCVVDP_flat(
        handler: *mut CvvdpHandler,
        s0: *const u8,
        s1: *const u8,
        s2: *const u8,
        d0: *const u8,
        d1: *const u8,
        d2: *const u8,
        ls0: i64,
        ls1: i64,
        ls2: i64,
        ld0: i64,
        ld1: i64,
        ld2: i64,
    ) -> ExceptionCode {
        unsafe {
            super::load_temporal_cvvdp(
                &Native, handler, s0, s1, s2, d0, d1, d2, ls0, ls1, ls2, ld0, ld1, ld2,
            )
        }
    }

    /// # Safety
    ///
    /// See [`super::compute_cvvdp`].
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn ComputeCVVDP_flat(
        handler: *mut CvvdpHandler,
        score: *mut f64,
        dstp: *const u8,
        dststride: i64,
        s0: *const u8,
        s1: *const u8,
        s2: *const u8,
        d0: *const u8,
        d1: *const u8,
        d2: *const u8,
        ls0: i64,
        ls1: i64,
        ls2: i64,
        ld0: i64,
        ld1: i64,
        ld2: i64,
    ) -> ExceptionCode {
        unsafe {
            super::compute_cvvdp(
                &Native, handler, score, dstp, dststride, s0, s1, s2, d0, d1, d2, ls0, ls1, ls2,
                ld0, ld1, ld2,
            )
        }
    }
}
