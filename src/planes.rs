//! Borrowed plane views.
//!
//! A [`Plane`] is a byte slice plus the byte stride between its rows. The
//! borrow keeps the memory alive and unmoved for as long as the view exists,
//! which is what the flattened entry points require of their callers.

use imgref::{ImgRef, ImgRefMut};

use crate::colorspace::Colorspace;
use crate::error::{Error, ImageRole, Result};

/// One plane of an image.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    data: &'a [u8],
    stride: i64,
}

impl<'a> Plane<'a> {
    /// Wrap raw plane bytes with a stride in bytes.
    #[must_use]
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self {
            data,
            stride: stride as i64,
        }
    }

    /// View a 16-bit plane (9 to 16 bit integer or half-float samples).
    #[must_use]
    pub fn from_u16(img: ImgRef<'a, u16>) -> Self {
        let stride = (img.stride() * 2) as i64;
        let buf = img.into_buf();
        // SAFETY: u8 has no alignment requirement and the byte length is the
        // element length times the element size.
        let data =
            unsafe { std::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), std::mem::size_of_val(buf)) };
        Self { data, stride }
    }

    /// View a 32-bit float plane.
    #[must_use]
    pub fn from_f32(img: ImgRef<'a, f32>) -> Self {
        let stride = (img.stride() * 4) as i64;
        let buf = img.into_buf();
        // SAFETY: as in `from_u16`.
        let data =
            unsafe { std::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), std::mem::size_of_val(buf)) };
        Self { data, stride }
    }

    /// The plane bytes.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes between the starts of consecutive rows.
    #[must_use]
    pub fn stride(&self) -> i64 {
        self.stride
    }
}

impl<'a> From<ImgRef<'a, u8>> for Plane<'a> {
    fn from(img: ImgRef<'a, u8>) -> Self {
        let stride = img.stride() as i64;
        Self {
            data: img.into_buf(),
            stride,
        }
    }
}

/// Up to three planes of one image, in libvship plane order.
///
/// Absent planes are passed to the library as a null pointer with stride 0.
#[derive(Debug, Clone, Copy)]
pub struct Planes<'a> {
    planes: [Option<Plane<'a>>; 3],
}

impl<'a> Planes<'a> {
    /// Three planes: luma then chroma for YUV, or R, G, B.
    #[must_use]
    pub fn new(p0: Plane<'a>, p1: Plane<'a>, p2: Plane<'a>) -> Self {
        Self {
            planes: [Some(p0), Some(p1), Some(p2)],
        }
    }

    /// A single plane; planes 1 and 2 are forwarded as null.
    #[must_use]
    pub fn mono(p0: Plane<'a>) -> Self {
        Self {
            planes: [Some(p0), None, None],
        }
    }

    /// Split one contiguous planar frame into its planes using the geometry of
    /// `colorspace`, with tightly packed rows.
    pub fn from_packed(data: &'a [u8], colorspace: &Colorspace) -> Result<Self> {
        let mut planes = [None; 3];
        let mut rest = data;
        for (index, slot) in planes.iter_mut().enumerate() {
            let row_bytes = colorspace.row_bytes(index) as usize;
            let (_, rows) = colorspace.plane_dimensions(index);
            let len = row_bytes * rows;
            if rest.len() < len {
                return Err(Error::PlaneTooSmall {
                    image: ImageRole::Source,
                    plane: index,
                    required: len as u64,
                    actual: rest.len(),
                });
            }
            let (head, tail) = rest.split_at(len);
            *slot = Some(Plane::new(head, row_bytes));
            rest = tail;
        }
        Ok(Self { planes })
    }

    /// Plane `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Plane<'a>> {
        self.planes.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn pointers(&self) -> [*const u8; 3] {
        self.planes.map(|plane| match plane {
            Some(plane) if !plane.data.is_empty() => plane.data.as_ptr(),
            _ => std::ptr::null(),
        })
    }

    pub(crate) fn strides(&self) -> [i64; 3] {
        self.planes.map(|plane| plane.map_or(0, |plane| plane.stride))
    }

    /// Check every present plane against the geometry declared for this image.
    ///
    /// A plane must reach the end of its last row; padding after the last row
    /// is not required.
    pub(crate) fn validate(&self, colorspace: &Colorspace, image: ImageRole) -> Result<()> {
        if self.get(0).is_none_or(|plane| plane.data.is_empty()) {
            return Err(Error::MissingPlane { image, plane: 0 });
        }

        for (index, plane) in self.planes.iter().enumerate() {
            let Some(plane) = plane else { continue };
            let row_bytes = colorspace.row_bytes(index);
            if plane.stride < 0 || (plane.stride as u64) < row_bytes {
                return Err(Error::InvalidStride {
                    image,
                    plane: index,
                    stride: plane.stride,
                    row_bytes,
                });
            }
            let (_, rows) = colorspace.plane_dimensions(index);
            // An overflowing extent cannot fit in any slice.
            let required = match rows {
                0 => 0,
                rows => (plane.stride as u64)
                    .checked_mul(rows as u64 - 1)
                    .and_then(|span| span.checked_add(row_bytes))
                    .unwrap_or(u64::MAX),
            };
            if (plane.data.len() as u64) < required {
                return Err(Error::PlaneTooSmall {
                    image,
                    plane: index,
                    required,
                    actual: plane.data.len(),
                });
            }
        }
        Ok(())
    }
}

/// Per-pixel `f32` difference map written by Butteraugli and CVVDP.
#[derive(Debug)]
pub struct DiffMap<'a> {
    data: &'a mut [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> DiffMap<'a> {
    /// A tightly packed `width` x `height` map.
    ///
    /// Fails with [`Error::DiffMapTooSmall`] when `data` holds fewer than
    /// `width * height` values; `actual` then reports the whole rows present.
    pub fn new(data: &'a mut [f32], width: usize, height: usize) -> Result<Self> {
        if width.checked_mul(height).is_none_or(|len| data.len() < len) {
            return Err(Error::DiffMapTooSmall {
                required: (width, height),
                actual: (width, data.len().checked_div(width).unwrap_or(0)),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride: width,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row stride in bytes, as the library expects it.
    #[must_use]
    pub fn stride_bytes(&self) -> i64 {
        (self.stride * std::mem::size_of::<f32>()) as i64
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr().cast()
    }

    pub(crate) fn check_covers(&self, required: (usize, usize)) -> Result<()> {
        if self.width < required.0 || self.height < required.1 {
            return Err(Error::DiffMapTooSmall {
                required,
                actual: (self.width, self.height),
            });
        }
        Ok(())
    }
}

impl<'a> From<ImgRefMut<'a, f32>> for DiffMap<'a> {
    fn from(img: ImgRefMut<'a, f32>) -> Self {
        let (width, height, stride) = (img.width(), img.height(), img.stride());
        let data = img.into_buf();
        Self {
            data,
            width,
            height,
            stride,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::{Colorspace, SamplingFormat};
    use proptest::prelude::*;

    #[test]
    fn test_mono_forwards_null() {
        let luma = [128u8; 4];
        let planes = Planes::mono(Plane::new(&luma, 2));
        let ptrs = planes.pointers();
        assert_eq!(ptrs[0], luma.as_ptr());
        assert!(ptrs[1].is_null());
        assert!(ptrs[2].is_null());
        assert_eq!(planes.strides(), [2, 0, 0]);
    }

    #[test]
    fn test_u16_stride_in_bytes() {
        let buf = vec![0u16; 10 * 4];
        let img = ImgRef::new_stride(&buf[..], 8, 4, 10);
        let plane = Plane::from_u16(img);
        assert_eq!(plane.stride(), 20);
        assert_eq!(plane.data().len(), 80);
    }

    #[test]
    fn test_validate_rejects_short_plane() {
        let cs = Colorspace::new(4, 4, SamplingFormat::UInt8);
        let luma = [0u8; 16];
        let chroma = [0u8; 3];
        let planes = Planes::new(
            Plane::new(&luma, 4),
            Plane::new(&chroma, 2),
            Plane::new(&chroma, 2),
        );
        let err = planes.validate(&cs, ImageRole::Source).unwrap_err();
        assert!(matches!(
            err,
            Error::PlaneTooSmall { plane: 1, required: 4, actual: 3, .. }
        ));
    }

    #[test]
    fn test_validate_rejects_short_stride() {
        let cs = Colorspace::new(4, 4, SamplingFormat::UInt8);
        let luma = [0u8; 16];
        let planes = Planes::mono(Plane::new(&luma, 3));
        assert!(matches!(
            planes.validate(&cs, ImageRole::Distorted),
            Err(Error::InvalidStride { stride: 3, row_bytes: 4, .. })
        ));
    }

    #[test]
    fn test_validate_accepts_short_last_row() {
        let cs = Colorspace::new(4, 2, SamplingFormat::UInt8);
        let luma = [0u8; 8 + 4];
        let planes = Planes::mono(Plane::new(&luma, 8));
        assert!(planes.validate(&cs, ImageRole::Source).is_ok());
        let short = Planes::mono(Plane::new(&luma[..11], 8));
        assert!(matches!(
            short.validate(&cs, ImageRole::Source),
            Err(Error::PlaneTooSmall { required: 12, actual: 11, .. })
        ));
    }

    #[test]
    fn test_validate_requires_plane_zero() {
        let cs = Colorspace::new(4, 4, SamplingFormat::UInt8);
        let planes = Planes::mono(Plane::new(&[], 4));
        assert!(matches!(
            planes.validate(&cs, ImageRole::Source),
            Err(Error::MissingPlane { plane: 0, .. })
        ));
    }

    #[test]
    fn test_from_packed_yuv420() {
        let cs = Colorspace::new(4, 2, SamplingFormat::UInt8);
        let frame = [7u8; 8 + 2 + 2];
        let planes = Planes::from_packed(&frame, &cs).unwrap();
        assert_eq!(planes.strides(), [4, 2, 2]);
        assert_eq!(planes.get(2).unwrap().data().len(), 2);
        assert!(planes.validate(&cs, ImageRole::Source).is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_stride() {
        let cs = Colorspace::rgb(4, 5, SamplingFormat::UInt8);
        let luma = [0u8; 4];
        let planes = Planes::mono(Plane::new(&luma, 1 << 62));
        assert!(matches!(
            planes.validate(&cs, ImageRole::Source),
            Err(Error::PlaneTooSmall { plane: 0, required: u64::MAX, actual: 4, .. })
        ));
    }

    #[test]
    fn test_diff_map_short_buffer() {
        let mut buf = vec![0f32; 10];
        assert!(matches!(
            DiffMap::new(&mut buf, 4, 3),
            Err(Error::DiffMapTooSmall { required: (4, 3), actual: (4, 2) })
        ));
        assert!(DiffMap::new(&mut buf, usize::MAX, 2).is_err());
        let map = DiffMap::new(&mut buf, 5, 2).unwrap();
        assert_eq!(map.stride_bytes(), 20);
    }

    #[test]
    fn test_diff_map_from_imgref() {
        let mut buf = vec![0f32; 6 * 3];
        let img = ImgRefMut::new_stride(&mut buf[..], 5, 3, 6);
        let map = DiffMap::from(img);
        assert_eq!(map.stride_bytes(), 24);
        assert!(map.check_covers((5, 3)).is_ok());
        assert!(map.check_covers((6, 3)).is_err());
    }

    proptest! {
        #[test]
        fn prop_validate_requires_full_extent(
            stride in prop_oneof![0usize..64, (1usize << 40)..(i64::MAX as usize)],
            rows in 1i64..40,
            len in 0usize..2048,
        ) {
            let cs = Colorspace::rgb(4, rows, SamplingFormat::UInt8);
            let data = vec![0u8; len];
            let planes = Planes::mono(Plane::new(&data, stride));
            let extent = stride as u128 * (rows as u128 - 1) + 4;
            let ok = planes.validate(&cs, ImageRole::Source).is_ok();
            prop_assert_eq!(ok, len > 0 && stride >= 4 && len as u128 >= extent);
        }
    }
}
