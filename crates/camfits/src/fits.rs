//! Reading and writing whole FITS files.
//!
//! A file is a single primary HDU: header blocks ending with `END`, followed by
//! the pixel data zero-padded to the block size. Pixels are always loaded as
//! 16-bit internal samples and always written as BITPIX 16.

use std::io::{Read, Write};

use crate::block::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::header::{read_header, write_header, Header};
use crate::image::{alloc_samples, FitsImage, INTERNAL_BITPIX};
use crate::io::{read_exact, write_full, write_padding};
use crate::pixel::{Bitpix, PixelCodec};

/// Highest NAXIS value FITS allows.
const MAX_NAXIS: i64 = 999;

/// Bytes of pixel data read per call.
const READ_CHUNK: usize = 64 * BLOCK_SIZE;

/// Geometry and exposure for [`write_simple_fits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimpleImage {
    pub width: usize,
    pub height: usize,
    pub x_offset: i32,
    pub y_offset: i32,
    pub exposure_ms: i32,
}

/// Read and validate a header, filling in the derived fields of `image`.
///
/// `image` is reset first, and again if anything fails. The stream is left at
/// the start of the pixel data.
pub fn read_fits_header<R: Read + ?Sized>(reader: &mut R, image: &mut FitsImage) -> Result<()> {
    image.reset();
    let result = read_header(reader).and_then(|header| {
        image.header = header;
        apply_header(image)
    });
    if let Err(e) = &result {
        tracing::warn!(error = %e, "rejected FITS header");
        image.reset();
    }
    result
}

/// Read a complete file into `image`, converting the pixels to internal form.
///
/// On success `image.bitpix` is [`INTERNAL_BITPIX`] whatever the file held.
pub fn read_fits<R: Read + ?Sized>(
    reader: &mut R,
    image: &mut FitsImage,
    codec: &PixelCodec,
) -> Result<()> {
    read_fits_header(reader, image)?;
    match read_pixels(reader, image.bitpix, image.pixel_count(), codec) {
        Ok(pixels) => {
            image.pixels = Some(pixels);
            image.bitpix = INTERNAL_BITPIX;
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read FITS pixels");
            image.reset();
            Err(e)
        }
    }
}

/// Write the header of `image` as is, then its pixels.
///
/// The pixels are converted in place. With `restore` set they are converted
/// back afterwards, whether or not the write succeeded.
pub fn write_fits<W: Write + ?Sized>(
    writer: &mut W,
    image: &mut FitsImage,
    codec: &PixelCodec,
    restore: bool,
) -> Result<()> {
    let count = image.pixel_count();
    let FitsImage { header, pixels, .. } = image;
    let pixels = pixels.as_deref_mut().ok_or(Error::NoPixels)?;
    let actual = pixels.len();
    let pixels = pixels
        .get_mut(..count)
        .ok_or(Error::BufferSize { expected: count, actual })?;
    write_image(writer, header, pixels, codec, restore)
}

/// Write `pixels` under a freshly built minimal header.
pub fn write_simple_fits<W: Write + ?Sized>(
    writer: &mut W,
    pixels: &mut [u16],
    simple: SimpleImage,
    codec: &PixelCodec,
    restore: bool,
) -> Result<()> {
    let count = simple.width * simple.height;
    let actual = pixels.len();
    let pixels = pixels
        .get_mut(..count)
        .ok_or(Error::BufferSize { expected: count, actual })?;

    let mut image = FitsImage {
        width: simple.width,
        height: simple.height,
        x_offset: simple.x_offset,
        y_offset: simple.y_offset,
        exposure_ms: simple.exposure_ms,
        bitpix: INTERNAL_BITPIX,
        ..FitsImage::default()
    };
    image.set_simple_header(codec.bzero());
    write_image(writer, &image.header, pixels, codec, restore)
}

fn write_image<W: Write + ?Sized>(
    writer: &mut W,
    header: &Header,
    pixels: &mut [u16],
    codec: &PixelCodec,
    restore: bool,
) -> Result<()> {
    write_header(writer, header)?;

    codec.to_file(pixels);
    let result = write_pixel_data(writer, pixels);
    if restore {
        codec.from_file(pixels);
    }
    result
}

fn write_pixel_data<W: Write + ?Sized>(writer: &mut W, pixels: &[u16]) -> Result<()> {
    let bytes: &[u8] = bytemuck::cast_slice(pixels);
    write_full(writer, bytes, "FITS pixels")?;
    let pad = write_padding(writer, bytes.len())?;
    tracing::debug!(bytes = bytes.len(), pad, "wrote FITS pixels");
    Ok(())
}

fn read_pixels<R: Read + ?Sized>(
    reader: &mut R,
    bitpix: i64,
    count: usize,
    codec: &PixelCodec,
) -> Result<Vec<u16>> {
    let bitpix = Bitpix::from_value(bitpix)?;
    let pixels = match bitpix {
        Bitpix::I16 => {
            let mut pixels = read_samples::<u16, R>(reader, count)?;
            codec.from_file(&mut pixels);
            pixels
        }
        Bitpix::I32 | Bitpix::F32 => {
            let raw = read_samples::<u32, R>(reader, count)?;
            let mut pixels = alloc_samples::<u16>(count)?;
            if bitpix == Bitpix::I32 {
                codec.from_file_i32(&raw, &mut pixels);
            } else {
                codec.from_file_f32(&raw, &mut pixels);
            }
            pixels
        }
    };
    tracing::debug!(
        bitpix = bitpix.value(),
        bytes = count * bitpix.bytes_per_sample(),
        "read FITS pixels"
    );
    Ok(pixels)
}

/// Read `count` raw samples, growing the buffer one chunk at a time as the
/// data arrives.
fn read_samples<T: bytemuck::Pod, R: Read + ?Sized>(
    reader: &mut R,
    count: usize,
) -> Result<Vec<T>> {
    let chunk = READ_CHUNK / core::mem::size_of::<T>();
    let mut samples: Vec<T> = Vec::new();
    while samples.len() < count {
        let start = samples.len();
        let n = chunk.min(count - start);
        samples
            .try_reserve(n)
            .map_err(|_| Error::OutOfMemory(count.saturating_mul(core::mem::size_of::<T>())))?;
        samples.resize(start + n, T::zeroed());
        read_exact(reader, bytemuck::cast_slice_mut(&mut samples[start..]), "data is short")?;
    }
    Ok(samples)
}

// ── Header validation ──

fn apply_header(image: &mut FitsImage) -> Result<()> {
    let h = &image.header;

    match h.logical("SIMPLE")? {
        Some(true) => {}
        Some(false) => return Err(Error::InvalidHeader("SIMPLE is not T".into())),
        None => return Err(Error::MissingKeyword("SIMPLE".into())),
    }

    let bitpix = required_integer(h, "BITPIX")?;
    let encoding = Bitpix::from_value(bitpix)?;

    let naxis = required_integer(h, "NAXIS")?;
    if !(2..=MAX_NAXIS).contains(&naxis) {
        return Err(Error::InvalidHeader(format!(
            "NAXIS = {naxis}, need a 2-dimensional image"
        )));
    }
    for i in 3..=naxis {
        let name = format!("NAXIS{i}");
        let len = required_integer(h, &name)?;
        if len != 1 {
            return Err(Error::InvalidHeader(format!(
                "{name} = {len}, only 2-dimensional images are supported"
            )));
        }
    }

    let width = axis_length(h, "NAXIS1")?;
    let height = axis_length(h, "NAXIS2")?;
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(encoding.bytes_per_sample()))
        .ok_or_else(|| Error::InvalidHeader(format!("image of {width}x{height} is too large")))?;

    let x_binning = optional_i32(h, "XFACTOR")?;
    let y_binning = optional_i32(h, "YFACTOR")?;
    let x_offset = optional_i32(h, "OFFSET1")?;
    let y_offset = optional_i32(h, "OFFSET2")?;
    let exposure = h.real("EXPTIME")?;

    image.bitpix = bitpix;
    image.width = width;
    image.height = height;
    if let Some(v) = x_binning {
        image.x_binning = v;
    }
    if let Some(v) = y_binning {
        image.y_binning = v;
    }
    if let Some(v) = x_offset {
        image.x_offset = v;
    }
    if let Some(v) = y_offset {
        image.y_offset = v;
    }
    if let Some(seconds) = exposure {
        image.exposure_ms = (seconds * 1000.0) as i32;
    }

    tracing::debug!(width, height, bitpix, "accepted FITS header");
    Ok(())
}

fn required_integer(h: &Header, name: &str) -> Result<i64> {
    h.integer(name)?
        .ok_or_else(|| Error::MissingKeyword(name.to_string()))
}

fn axis_length(h: &Header, name: &str) -> Result<usize> {
    let len = required_integer(h, name)?;
    usize::try_from(len).map_err(|_| Error::InvalidHeader(format!("{name} = {len} is negative")))
}

fn optional_i32(h: &Header, name: &str) -> Result<Option<i32>> {
    h.integer(name)?
        .map(|v| i32::try_from(v).map_err(|_| Error::InvalidValue(name.to_string())))
        .transpose()
}
