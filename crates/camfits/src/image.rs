//! The in-memory image: header cards, derived geometry and 16-bit pixels.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::calendar::{Calendar, MJD0};
use crate::error::{Error, Result};
use crate::header::Header;

/// BITPIX of the internal pixel representation.
pub const INTERNAL_BITPIX: i64 = 16;

/// A camera frame and its FITS header.
///
/// The derived fields mirror the mandatory and common optional cards. They
/// are filled in by [`crate::fits::read_fits_header`] and used by
/// [`FitsImage::set_simple_header`]; changing one does not edit the header by
/// itself.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsImage {
    /// Header cards, END excluded.
    pub header: Header,
    /// NAXIS1, pixels per row.
    pub width: usize,
    /// NAXIS2, number of rows.
    pub height: usize,
    /// OFFSET1, camera frame x of the upper left pixel.
    pub x_offset: i32,
    /// OFFSET2, camera frame y of the upper left pixel.
    pub y_offset: i32,
    /// XFACTOR, horizontal binning.
    pub x_binning: i32,
    /// YFACTOR, vertical binning.
    pub y_binning: i32,
    /// EXPTIME in milliseconds.
    pub exposure_ms: i32,
    /// BITPIX as declared on disk; [`INTERNAL_BITPIX`] once pixels are loaded.
    pub bitpix: i64,
    /// `width * height` internal samples, first sample at the upper left.
    pub pixels: Option<Vec<u16>>,
}

impl Default for FitsImage {
    fn default() -> Self {
        FitsImage {
            header: Header::new(),
            width: 0,
            height: 0,
            x_offset: 0,
            y_offset: 0,
            x_binning: 1,
            y_binning: 1,
            exposure_ms: 0,
            bitpix: 0,
            pixels: None,
        }
    }
}

impl FitsImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples the geometry calls for.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn pixels(&self) -> Option<&[u16]> {
        self.pixels.as_deref()
    }

    pub fn pixels_mut(&mut self) -> Option<&mut [u16]> {
        self.pixels.as_deref_mut()
    }

    /// Drop the header and pixels and return to the default state.
    pub fn reset(&mut self) {
        *self = FitsImage::default();
    }

    /// Copy everything except the pixels from `src`. The pixel buffer already
    /// owned by `self`, if any, is kept.
    pub fn copy_header_from(&mut self, src: &FitsImage) {
        let pixels = self.pixels.take();
        *self = FitsImage {
            header: src.header.clone(),
            pixels,
            ..*src
        };
    }

    /// Copy the header and a duplicate of the pixels from `src`.
    ///
    /// If `src` has no pixels, those of `self` are kept. On allocation failure
    /// `self` is reset.
    pub fn copy_from(&mut self, src: &FitsImage) -> Result<()> {
        self.copy_header_from(src);
        if let Some(pixels) = &src.pixels {
            match alloc_samples::<u16>(pixels.len()) {
                Ok(mut copy) => {
                    copy.copy_from_slice(pixels);
                    self.pixels = Some(copy);
                }
                Err(e) => {
                    self.reset();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Set the minimal card set describing this image.
    ///
    /// Each card replaces an existing one with the same keyword or is
    /// appended, so other cards already in the header are kept.
    pub fn set_simple_header(&mut self, bzero: i32) {
        let h = &mut self.header;
        h.set_logical("SIMPLE", true, Some("Standard FITS"));
        h.set_integer("BITPIX", self.bitpix, Some("Bits per pixel"));
        h.set_integer("NAXIS", 2, Some("Number of dimensions"));
        h.set_integer("NAXIS1", self.width as i64, Some("Number of columns"));
        h.set_integer("NAXIS2", self.height as i64, Some("Number of rows"));
        h.set_real("BZERO", f64::from(bzero), 6, Some("Real = Pixel*BSCALE + BZERO"));
        h.set_real("BSCALE", 1.0, 6, Some("Pixel scale factor"));
        h.set_integer("OFFSET1", self.x_offset.into(), Some("Camera upper left frame x"));
        h.set_integer("OFFSET2", self.y_offset.into(), Some("Camera upper left frame y"));
        h.set_integer("XFACTOR", self.x_binning.into(), Some("Camera x binning factor"));
        h.set_integer("YFACTOR", self.y_binning.into(), Some("Camera y binning factor"));
        h.set_real(
            "EXPTIME",
            f64::from(self.exposure_ms) / 1000.0,
            6,
            Some("Exposure time, seconds"),
        );
    }

    /// Set `JD`, `DATE-OBS` and `TIME-OBS` for the instant `at`.
    pub fn stamp_time<C: Calendar + ?Sized>(
        &mut self,
        at: DateTime<Utc>,
        comment: Option<&str>,
        calendar: &C,
    ) {
        let micros = at.timestamp_subsec_micros().min(999_999);
        let seconds = f64::from(at.second()) + f64::from(micros) / 1_000_000.0;
        let day = f64::from(at.day())
            + (f64::from(at.hour()) + (f64::from(at.minute()) + seconds / 60.0) / 60.0) / 24.0;
        let mjd = calendar.mjd(at.month(), day, at.year());
        self.header.set_real("JD", mjd + MJD0, 16, comment);

        let date = format!("{:04}-{:02}-{:02}", at.year(), at.month(), at.day());
        self.header.set_string("DATE-OBS", &date, Some("UTC CCYY-MM-DD"));

        let time = format!(
            "{:02}:{:02}:{:02}.{:02}",
            at.hour(),
            at.minute(),
            at.second(),
            micros / 10_000
        );
        self.header.set_string("TIME-OBS", &time, Some("UTC HH:MM:SS.ss"));
        tracing::debug!(%date, %time, "stamped FITS header");
    }

    /// [`FitsImage::stamp_time`] with the current time.
    pub fn stamp_now<C: Calendar + ?Sized>(&mut self, comment: Option<&str>, calendar: &C) {
        self.stamp_time(Utc::now(), comment, calendar);
    }

    /// The pixels as a `(height, width)` array, if loaded.
    #[cfg(feature = "array")]
    pub fn to_array(&self) -> Option<ndarray::Array2<u16>> {
        let pixels = self.pixels.as_ref()?;
        ndarray::Array2::from_shape_vec((self.height, self.width), pixels.clone()).ok()
    }
}

/// Allocate a zeroed sample buffer, reporting failure instead of aborting.
pub(crate) fn alloc_samples<T: Copy + Default>(count: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(count)
        .map_err(|_| Error::OutOfMemory(count.saturating_mul(core::mem::size_of::<T>())))?;
    v.resize(count, T::default());
    Ok(v)
}
