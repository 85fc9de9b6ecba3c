//! Conversion between on-disk FITS pixels and the internal 16-bit model.
//!
//! Internally every image is an array of native-endian `u16` samples. On disk
//! FITS stores big-endian signed integers (BITPIX 16 or 32) or IEEE floats
//! (BITPIX -32). The integer encodings are offset by BZERO so the signed range
//! maps onto `0..=65535`:
//!
//! ```text
//! internal = swap(raw) + BZERO
//! raw      = swap(internal - BZERO)
//! ```
//!
//! where `swap` reverses bytes on little-endian hosts. Pixel order is never
//! changed here.

use crate::endian::{host_byte_order, ByteOrder};
use crate::error::{Error, Result};

/// The usual bias for cameras that deliver unsigned 16-bit data.
pub const DEFAULT_BZERO: i32 = 32768;

/// On-disk sample encodings accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    /// BITPIX = 16, big-endian two's complement.
    I16,
    /// BITPIX = 32, big-endian two's complement.
    I32,
    /// BITPIX = -32, big-endian IEEE-754 single precision.
    F32,
}

impl Bitpix {
    /// Map a BITPIX card value to an encoding.
    pub fn from_value(value: i64) -> Result<Self> {
        match value {
            16 => Ok(Bitpix::I16),
            32 => Ok(Bitpix::I32),
            -32 => Ok(Bitpix::F32),
            other => Err(Error::InvalidBitpix(other)),
        }
    }

    /// The BITPIX card value.
    pub fn value(self) -> i64 {
        match self {
            Bitpix::I16 => 16,
            Bitpix::I32 => 32,
            Bitpix::F32 => -32,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Bitpix::I16 => 2,
            Bitpix::I32 | Bitpix::F32 => 4,
        }
    }
}

/// Converts pixel buffers between internal and FITS form.
///
/// Carries the BZERO bias and the byte order of the memory it works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelCodec {
    bzero: i32,
    order: ByteOrder,
}

impl Default for PixelCodec {
    fn default() -> Self {
        PixelCodec::new(DEFAULT_BZERO)
    }
}

impl PixelCodec {
    /// A codec for this host with the given bias.
    pub fn new(bzero: i32) -> Self {
        PixelCodec::with_byte_order(bzero, host_byte_order())
    }

    /// A codec that assumes memory is laid out in `order`.
    pub fn with_byte_order(bzero: i32, order: ByteOrder) -> Self {
        PixelCodec { bzero, order }
    }

    pub fn bzero(&self) -> i32 {
        self.bzero
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Convert internal samples to FITS 16-bit form in place.
    pub fn to_file(&self, pixels: &mut [u16]) {
        for p in pixels.iter_mut() {
            let raw = (i32::from(*p) - self.bzero) as u16;
            *p = self.order.swap_u16(raw);
        }
    }

    /// Convert FITS 16-bit samples to internal form in place.
    pub fn from_file(&self, pixels: &mut [u16]) {
        for p in pixels.iter_mut() {
            let raw = i32::from(self.order.swap_u16(*p) as i16);
            *p = (raw + self.bzero) as u16;
        }
    }

    /// Convert FITS 32-bit integer words into internal samples.
    ///
    /// The biased value is truncated to its low 16 bits.
    pub fn from_file_i32(&self, raw: &[u32], out: &mut [u16]) {
        for (dst, &word) in out.iter_mut().zip(raw) {
            let value = self.order.swap_u32(word) as i32;
            *dst = value.wrapping_add(self.bzero) as u16;
        }
    }

    /// Convert FITS IEEE float words into internal samples.
    ///
    /// No bias is applied; values are clamped to `0..=65535` and truncated.
    pub fn from_file_f32(&self, raw: &[u32], out: &mut [u16]) {
        for (dst, &word) in out.iter_mut().zip(raw) {
            let value = f32::from_bits(self.order.swap_u32(word));
            *dst = value.clamp(0.0, 65535.0) as u16;
        }
    }
}
