//! Single-HDU FITS image files for camera pipelines.
//!
//! Images are held as native-endian 16-bit samples in a [`FitsImage`] along
//! with their header cards. Files with BITPIX 16, 32 or -32 can be read; files
//! are always written as BITPIX 16 with a BZERO bias.

pub mod block;
pub mod calendar;
pub mod card;
pub mod endian;
pub mod error;
pub mod fits;
pub mod header;
pub mod image;
pub mod io;
pub mod pixel;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use calendar::{Calendar, Gregorian, MJD0};
pub use card::Card;
pub use endian::{host_byte_order, ByteOrder};
pub use error::{Error, Result};
pub use fits::{read_fits, read_fits_header, write_fits, write_simple_fits, SimpleImage};
pub use header::{read_header, write_header, Header};
pub use image::{FitsImage, INTERNAL_BITPIX};
pub use pixel::{Bitpix, PixelCodec, DEFAULT_BZERO};
