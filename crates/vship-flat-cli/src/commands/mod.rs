//! Subcommand implementations.

#[cfg(feature = "native")]
pub mod compare;
#[cfg(feature = "native")]
pub mod device;
pub mod display_models;
pub mod stats;
pub mod yuv;
