//! Library-level calls: version, devices, error messages.

use std::ffi::{CStr, c_char, c_int};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::ffi::{self, ExceptionCode};

/// GPU runtime libvship was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuBackend {
    Hip,
    Cuda,
    /// A value the headers do not define.
    Unknown(i32),
}

impl From<c_int> for GpuBackend {
    fn from(value: c_int) -> Self {
        match value {
            0 => Self::Hip,
            1 => Self::Cuda,
            other => Self::Unknown(other),
        }
    }
}

/// libvship version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub minor_minor: i32,
    pub backend: GpuBackend,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match self.backend {
            GpuBackend::Hip => "hip",
            GpuBackend::Cuda => "cuda",
            GpuBackend::Unknown(_) => "unknown",
        };
        write!(f, "{}.{}.{} ({backend})", self.major, self.minor, self.minor_minor)
    }
}

/// Properties of one GPU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub vram_size: u64,
    pub integrated: bool,
    pub multi_processor_count: i32,
    pub warp_size: i32,
}

impl DeviceInfo {
    /// VRAM in GiB.
    #[must_use]
    pub fn vram_gib(&self) -> f64 {
        self.vram_size as f64 / 1024.0 / 1024.0 / 1024.0
    }

    fn from_raw(raw: &ffi::DeviceInfo) -> Self {
        let bytes: Vec<u8> = raw
            .name
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        Self {
            name: String::from_utf8_lossy(&bytes).into_owned(),
            vram_size: raw.vram_size,
            integrated: raw.integrated != 0,
            multi_processor_count: raw.multi_processor_count,
            warp_size: raw.warp_size,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {} VramSize: {:.3} GiB Integrated: {} Processor Count: {} Warp Size: {}",
            self.name,
            self.vram_gib(),
            self.integrated,
            self.multi_processor_count,
            self.warp_size
        )
    }
}

/// Entry point of the safe API: a libvship backend plus the calls that are
/// not tied to a metric handler.
///
/// ```no_run
/// # #[cfg(feature = "native")]
/// # fn main() -> vship_flat::Result<()> {
/// use vship_flat::{Colorspace, SamplingFormat, Vship};
///
/// let vship = Vship::native();
/// vship.set_device(0)?;
/// let cs = Colorspace::new(1920, 1080, SamplingFormat::UInt8);
/// let mut ssimu2 = vship.ssimu2(&cs, &cs)?;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "native"))]
/// # fn main() {}
/// ```
#[derive(Debug, Default)]
pub struct Vship<B> {
    backend: B,
}

#[cfg(feature = "native")]
impl Vship<crate::backend::Native> {
    /// The linked libvship.
    #[must_use]
    pub fn native() -> Self {
        Self::new(crate::backend::Native)
    }
}

impl<B: Backend> Vship<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn version(&self) -> Version {
        let raw = self.backend.version();
        Version {
            major: raw.major,
            minor: raw.minor,
            minor_minor: raw.minor_minor,
            backend: GpuBackend::from(raw.backend),
        }
    }

    /// Number of GPUs libvship can use.
    pub fn device_count(&self) -> Result<usize> {
        let mut count: c_int = 0;
        let code = unsafe { self.backend.device_count(&raw mut count) };
        self.check(code)?;
        Ok(count.max(0) as usize)
    }

    /// Run libvship's full self-test on a GPU.
    pub fn gpu_full_check(&self, gpu_id: i32) -> Result<()> {
        self.check(self.backend.gpu_full_check(gpu_id))
    }

    /// Select the GPU used by handlers created afterwards on this thread.
    pub fn set_device(&self, gpu_id: i32) -> Result<()> {
        self.check(self.backend.set_device(gpu_id))
    }

    pub fn device_info(&self, gpu_id: i32) -> Result<DeviceInfo> {
        let mut raw = ffi::DeviceInfo::default();
        let code = unsafe { self.backend.device_info(&raw mut raw, gpu_id) };
        self.check(code)?;
        Ok(DeviceInfo::from_raw(&raw))
    }

    /// libvship's description of a status code.
    #[must_use]
    pub fn error_message(&self, code: ExceptionCode) -> String {
        let len = unsafe { self.backend.error_message(code, std::ptr::null_mut(), 0) };
        if len <= 0 {
            return code.to_string();
        }
        let mut buf = vec![0 as c_char; len as usize];
        unsafe { self.backend.error_message(code, buf.as_mut_ptr(), len) };
        // Guarantee termination even if the library filled the whole buffer.
        if let Some(last) = buf.last_mut() {
            *last = 0;
        }
        unsafe { CStr::from_ptr(buf.as_ptr()) }.to_string_lossy().into_owned()
    }

    /// Turn a status into a `Result`, attaching the library's message.
    pub fn check(&self, code: ExceptionCode) -> Result<()> {
        if code.is_none() {
            return Ok(());
        }
        Err(Error::Vship {
            code,
            message: self.error_message(code),
        })
    }
}
