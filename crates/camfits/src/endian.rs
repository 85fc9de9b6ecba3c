//! Host byte-order detection.
//!
//! FITS stores all binary data big-endian. The pixel codec needs to know
//! whether the words it loads from memory must be byte-swapped, which depends
//! on the host. The answer is probed once at runtime and cached; codecs also
//! accept an explicit [`ByteOrder`] so both branches can be exercised on any
//! machine.

use std::sync::OnceLock;

/// Order in which the host stores the bytes of multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first (FITS order).
    Big,
}

impl ByteOrder {
    /// Returns `true` for [`ByteOrder::Little`].
    #[inline]
    pub fn is_little(self) -> bool {
        self == ByteOrder::Little
    }

    /// Convert a 16-bit word between this order and FITS (big-endian) order.
    ///
    /// The operation is its own inverse.
    #[inline]
    pub fn swap_u16(self, word: u16) -> u16 {
        if self.is_little() {
            word.swap_bytes()
        } else {
            word
        }
    }

    /// Convert a 32-bit word between this order and FITS (big-endian) order.
    #[inline]
    pub fn swap_u32(self, word: u32) -> u32 {
        if self.is_little() {
            word.swap_bytes()
        } else {
            word
        }
    }
}

fn probe() -> ByteOrder {
    let bytes = 1u16.to_ne_bytes();
    if bytes[0] == 1 {
        ByteOrder::Little
    } else {
        ByteOrder::Big
    }
}

/// Byte order of the running host, probed on first use.
pub fn host_byte_order() -> ByteOrder {
    static HOST: OnceLock<ByteOrder> = OnceLock::new();
    *HOST.get_or_init(probe)
}
