//! # vship-flat
//!
//! Flattened entry points and a safe Rust binding for
//! [Vship](https://github.com/Line-fr/Vship), a GPU implementation of the
//! SSIMULACRA2, Butteraugli and CVVDP image quality metrics.
//!
//! libvship takes each image as an array of three plane pointers plus an array
//! of three strides. Hosts with a moving or collecting garbage collector cannot
//! hand native code an array that points into their own heap. The functions in
//! [`flat`] take every plane pointer and stride as its own argument and build
//! the arrays on the native stack for the duration of the call. With the
//! `native` feature they are exported with C linkage (see
//! `include/vship_flat.h`).
//!
//! The safe layer drives the same entry points from Rust with borrowed
//! [`Planes`], so the borrow checker provides the pinning a managed host has
//! to arrange by hand.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vship_flat::{Colorspace, Plane, Planes, SamplingFormat, Vship};
//!
//! let vship = Vship::native();
//! let cs = Colorspace::new(1920, 1080, SamplingFormat::UInt8);
//! let mut handler = vship.ssimu2(&cs, &cs)?;
//!
//! let source = Planes::new(Plane::new(&y, 1920), Plane::new(&u, 960), Plane::new(&v, 960));
//! let distorted = Planes::new(Plane::new(&y2, 1920), Plane::new(&u2, 960), Plane::new(&v2, 960));
//! let score = handler.compute_score(&source, &distorted)?;
//! ```
//!
//! ## Modules
//!
//! - [`flat`]: Flattened entry points (the C ABI surface)
//! - [`backend`]: The libvship seam and the linked implementation
//! - [`ffi`]: Raw `#[repr(C)]` declarations
//! - [`metrics`]: SSIMULACRA2, Butteraugli and CVVDP handlers
//! - [`colorspace`]: Image format descriptions
//! - [`display_model`]: CVVDP display models and their JSON configuration
//! - [`error`]: Error types for the safe layer

pub mod backend;
pub mod colorspace;
pub mod display_model;
pub mod error;
pub mod ffi;
pub mod flat;
pub mod metrics;
pub mod planes;
mod trace;
pub mod vship;

// Re-export commonly used types
#[cfg(feature = "native")]
pub use backend::Native;
pub use backend::Backend;
pub use colorspace::{
    ChromaLocation, ColorFamily, ColorMatrix, ColorPrimaries, ColorRange, ColorTransfer,
    Colorspace, Crop, SamplingFormat,
};
pub use display_model::{DisplayModel, DisplayModelColorspace};
pub use error::{Error, ImageRole, Result};
pub use ffi::ExceptionCode;
pub use metrics::{
    ButteraugliHandler, ButteraugliScore, CvvdpHandler, CvvdpOptions, Metric, PerceptionLevel,
    Ssimu2Handler,
};
pub use planes::{DiffMap, Plane, Planes};
pub use vship::{DeviceInfo, GpuBackend, Version, Vship};
