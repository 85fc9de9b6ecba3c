//! The 2880-byte record structure of a FITS file.

/// Every header and data section is a whole number of these.
pub const BLOCK_SIZE: usize = 2880;

/// Length of one header card.
pub const CARD_SIZE: usize = 80;

/// 36 cards per block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Fill for unused header cards.
pub const HEADER_PAD_BYTE: u8 = b' ';

/// Fill after the last pixel.
pub const DATA_PAD_BYTE: u8 = 0;

/// Bytes needed to store a `len`-byte section, rounded up to whole blocks.
pub const fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Pad bytes that follow a `len`-byte section.
pub const fn padding_len(len: usize) -> usize {
    padded_len(len) - len
}

/// Blank cards that follow `cards` header cards and the END card.
pub const fn header_pad_cards(cards: usize) -> usize {
    (CARDS_PER_BLOCK - (cards + 1) % CARDS_PER_BLOCK) % CARDS_PER_BLOCK
}
