//! The ordered header card store and its block-aligned serialization.

use std::io::{Read, Write};

use crate::block::{header_pad_cards, CARDS_PER_BLOCK, CARD_SIZE, HEADER_PAD_BYTE};
use crate::card::{
    end_card, format_commentary, format_integer, format_logical, format_real, format_string, kw,
    parse_commentary, parse_integer, parse_logical, parse_real, parse_string, Card,
};
use crate::error::{Error, Result};
use crate::io::{read_full, write_full};

/// Header cards in file order, excluding the END card.
///
/// Lookups compare the full 8-byte blank-padded keyword, so `NAXIS` never
/// matches `NAXIS1`. Duplicate keywords are allowed; every by-name operation
/// acts on the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// An empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cards held (the END card is never stored).
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns `true` if no cards are held.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over the cards in file order.
    pub fn iter(&self) -> core::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// The cards in file order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Remove every card.
    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Index of the first card named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        let key = kw(name.as_bytes());
        self.cards.iter().position(|c| c.has_keyword(&key))
    }

    /// The first card named `name`.
    pub fn find(&self, name: &str) -> Option<&Card> {
        self.position(name).map(|i| &self.cards[i])
    }

    /// Append a card unconditionally.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Replace the first card with the same keyword as `card`, in place, or
    /// append it if there is none.
    pub fn set(&mut self, card: Card) {
        let key = card.keyword();
        match self.cards.iter().position(|c| c.has_keyword(&key)) {
            Some(i) => self.cards[i] = card,
            None => self.cards.push(card),
        }
    }

    /// Delete the first card named `name`. Returns `false` if there was none.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.cards.remove(i);
                true
            }
            None => false,
        }
    }

    // ── Typed setters ──

    /// Set a logical (`T`/`F`) value.
    pub fn set_logical(&mut self, name: &str, value: bool, comment: Option<&str>) {
        self.set(format_logical(name, value, comment));
    }

    /// Set an integer value.
    pub fn set_integer(&mut self, name: &str, value: i64, comment: Option<&str>) {
        self.set(format_integer(name, value, comment));
    }

    /// Set a real value written with at most `sigdig` significant digits.
    pub fn set_real(&mut self, name: &str, value: f64, sigdig: usize, comment: Option<&str>) {
        self.set(format_real(name, value, sigdig, comment));
    }

    /// Set a quoted string value.
    pub fn set_string(&mut self, name: &str, value: &str, comment: Option<&str>) {
        self.set(format_string(name, value, comment));
    }

    /// Append free text under `name` (usually `COMMENT` or `HISTORY`),
    /// splitting it across as many cards as needed.
    pub fn add_commentary(&mut self, name: &str, text: &str) {
        self.cards.extend(format_commentary(name, text));
    }

    // ── Typed getters ──
    //
    // `Ok(None)` means the keyword is absent; `Err` means it is present but its
    // value field is malformed.

    /// The logical value of `name`.
    pub fn logical(&self, name: &str) -> Result<Option<bool>> {
        self.find(name).map(parse_logical).transpose()
    }

    /// The integer value of `name`.
    pub fn integer(&self, name: &str) -> Result<Option<i64>> {
        self.find(name).map(parse_integer).transpose()
    }

    /// The real value of `name`; `D` exponents are accepted.
    pub fn real(&self, name: &str) -> Result<Option<f64>> {
        self.find(name).map(parse_real).transpose()
    }

    /// The string value of `name`, without quotes or padding.
    pub fn string(&self, name: &str) -> Result<Option<String>> {
        self.find(name).map(parse_string).transpose()
    }

    /// Text of the first commentary card named `name`.
    pub fn commentary(&self, name: &str) -> Option<String> {
        self.find(name).map(parse_commentary)
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a Card;
    type IntoIter = core::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

// ── Block I/O ──

/// Serialize header cards into complete FITS header blocks.
///
/// Appends the END card and pads the final block with blank cards, so the
/// returned length is always a multiple of [`crate::BLOCK_SIZE`].
pub fn serialize_header(header: &Header) -> Vec<u8> {
    let total_cards = header.len() + 1 + header_pad_cards(header.len());
    let mut buf = Vec::with_capacity(total_cards * CARD_SIZE);
    for card in header {
        buf.extend_from_slice(card.as_bytes());
    }
    buf.extend_from_slice(end_card().as_bytes());
    buf.resize(total_cards * CARD_SIZE, HEADER_PAD_BYTE);
    buf
}

/// Write the header, END card and blank padding. Returns the bytes written.
pub fn write_header<W: Write + ?Sized>(writer: &mut W, header: &Header) -> Result<usize> {
    let bytes = serialize_header(header);
    write_full(writer, &bytes, "FITS header")?;
    tracing::debug!(cards = header.len(), bytes = bytes.len(), "wrote FITS header");
    Ok(bytes.len())
}

/// Read header cards up to END, then skip padding cards to the end of the
/// block.
///
/// A stream that ends after the END card but before the block is complete is
/// accepted; running out of data before END is [`Error::UnexpectedEof`].
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<Header> {
    let mut header = Header::new();
    let mut raw = [0u8; CARD_SIZE];
    let mut count = 0usize;
    let mut saw_end = false;

    loop {
        let n = read_full(reader, &mut raw)?;
        if n < CARD_SIZE {
            if saw_end {
                tracing::debug!(cards = count, "header ends without block padding");
                break;
            }
            tracing::warn!(cards = count, "header is short");
            return Err(Error::UnexpectedEof("header is short"));
        }
        count += 1;

        if !saw_end {
            let card = Card::from_bytes(raw);
            if card.is_end() {
                saw_end = true;
            } else {
                header.push(card);
            }
        }

        if saw_end && count % CARDS_PER_BLOCK == 0 {
            break;
        }
    }

    tracing::debug!(cards = header.len(), "read FITS header");
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BLOCK_SIZE;
    use crate::io::testing::TrickleReader;
    use std::io::Cursor;

    fn sample_header() -> Header {
        let mut h = Header::new();
        h.set_logical("SIMPLE", true, Some("Standard FITS"));
        h.set_integer("BITPIX", 16, Some("Bits per pixel"));
        h.set_integer("NAXIS", 2, None);
        h.set_integer("NAXIS1", 4, None);
        h.set_integer("NAXIS2", 3, None);
        h
    }

    // ---- store ----

    #[test]
    fn find_uses_exact_keyword() {
        let h = sample_header();
        assert_eq!(h.position("NAXIS"), Some(2));
        assert_eq!(h.position("NAXIS1"), Some(3));
        assert!(h.find("NAXIS3").is_none());
        assert!(h.find("naxis").is_none());
    }

    #[test]
    fn set_is_idempotent_and_keeps_position() {
        let mut h = sample_header();
        let before = h.len();
        h.set_integer("NAXIS1", 640, None);
        h.set_integer("NAXIS1", 640, None);
        assert_eq!(h.len(), before);
        assert_eq!(h.position("NAXIS1"), Some(3));
        assert_eq!(h.integer("NAXIS1").unwrap(), Some(640));
        assert_eq!(h.iter().filter(|c| c.keyword_str() == "NAXIS1").count(), 1);
    }

    #[test]
    fn set_is_idempotent_for_non_ascii_names() {
        let mut h = Header::new();
        h.set_integer("ABCDEFGé", 1, None);
        h.set_integer("ABCDEFGé", 2, None);
        assert_eq!(h.len(), 1);
        assert_eq!(h.integer("ABCDEFGé").unwrap(), Some(2));
    }

    #[test]
    fn set_matches_raw_keyword_bytes() {
        let mut raw = *format_integer("X", 1, None).as_bytes();
        raw[1] = 0xC3;
        let mut h = Header::new();
        h.push(Card::from_bytes(raw));
        h.push(format_integer("NEXT", 5, None));

        let mut replacement = raw;
        replacement[29] = b'9';
        h.set(Card::from_bytes(replacement));
        assert_eq!(h.len(), 2);
        assert_eq!(h.cards()[0].as_bytes()[29], b'9');
    }

    #[test]
    fn set_appends_when_absent() {
        let mut h = sample_header();
        h.set_string("OBJECT", "M31", None);
        assert_eq!(h.position("OBJECT"), Some(5));
        assert_eq!(h.string("OBJECT").unwrap().as_deref(), Some("M31"));
    }

    #[test]
    fn push_allows_duplicates_and_set_hits_first() {
        let mut h = Header::new();
        h.push(format_integer("DUP", 1, None));
        h.push(format_integer("DUP", 2, None));
        h.set_integer("DUP", 3, None);
        assert_eq!(h.len(), 2);
        assert_eq!(parse_integer(&h.cards()[0]).unwrap(), 3);
        assert_eq!(parse_integer(&h.cards()[1]).unwrap(), 2);
    }

    #[test]
    fn remove_first_match() {
        let mut h = sample_header();
        assert!(h.remove("NAXIS"));
        assert_eq!(h.len(), 4);
        assert_eq!(h.position("NAXIS1"), Some(2));
        assert!(!h.remove("NAXIS"));
        assert!(!Header::new().remove("SIMPLE"));
    }

    #[test]
    fn getters_distinguish_absent_from_malformed() {
        let mut h = Header::new();
        h.set_string("EXPTIME", "long", None);
        assert!(h.integer("MISSING").unwrap().is_none());
        assert!(h.real("MISSING").unwrap().is_none());
        assert!(h.logical("MISSING").unwrap().is_none());
        assert!(h.string("MISSING").unwrap().is_none());
        assert!(matches!(h.real("EXPTIME"), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn commentary_cards_are_appended() {
        let mut h = Header::new();
        h.add_commentary("HISTORY", "first");
        h.add_commentary("HISTORY", "second");
        assert_eq!(h.len(), 2);
        assert_eq!(h.commentary("HISTORY").as_deref(), Some("first"));
        assert!(h.commentary("COMMENT").is_none());
    }

    // ---- serialization ----

    #[test]
    fn serialize_pads_to_block() {
        let bytes = serialize_header(&sample_header());
        assert_eq!(bytes.len(), BLOCK_SIZE);
        assert_eq!(&bytes[5 * CARD_SIZE..5 * CARD_SIZE + 3], b"END");
        assert!(bytes[6 * CARD_SIZE..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn serialize_full_block_spills_end() {
        let mut h = Header::new();
        for i in 0..CARDS_PER_BLOCK {
            h.push(format_integer(&format!("KEY{i}"), i as i64, None));
        }
        let bytes = serialize_header(&h);
        assert_eq!(bytes.len(), 2 * BLOCK_SIZE);
        assert_eq!(&bytes[BLOCK_SIZE..BLOCK_SIZE + 3], b"END");
    }

    #[test]
    fn write_header_is_block_aligned() {
        let mut out = Vec::new();
        let n = write_header(&mut out, &sample_header()).unwrap();
        assert_eq!(n, out.len());
        assert_eq!(n % BLOCK_SIZE, 0);
    }

    #[test]
    fn read_header_round_trip() {
        let h = sample_header();
        let mut bytes = serialize_header(&h);
        bytes.extend_from_slice(&[0xAB; 16]);
        let mut cursor = Cursor::new(bytes);
        let parsed = read_header(&mut cursor).unwrap();
        assert_eq!(parsed, h);
        // positioned right after the header block
        assert_eq!(cursor.position(), BLOCK_SIZE as u64);
    }

    #[test]
    fn read_header_over_trickling_stream() {
        let h = sample_header();
        let bytes = serialize_header(&h);
        let mut reader = TrickleReader::new(&bytes, 13);
        assert_eq!(read_header(&mut reader).unwrap(), h);
    }

    #[test]
    fn read_header_accepts_missing_padding_after_end() {
        let h = sample_header();
        let bytes = serialize_header(&h);
        let truncated = &bytes[..6 * CARD_SIZE];
        let parsed = read_header(&mut Cursor::new(truncated)).unwrap();
        assert_eq!(parsed.len(), 5);
    }

    #[test]
    fn read_header_without_end_is_short() {
        let h = sample_header();
        let bytes = serialize_header(&h);
        let truncated = &bytes[..3 * CARD_SIZE + 40];
        assert!(matches!(
            read_header(&mut Cursor::new(truncated)),
            Err(Error::UnexpectedEof("header is short"))
        ));
        assert!(matches!(
            read_header(&mut Cursor::new(&[0u8; 0][..])),
            Err(Error::UnexpectedEof(_))
        ));
    }

    #[test]
    fn read_header_spanning_two_blocks() {
        let mut h = Header::new();
        for i in 0..40 {
            h.push(format_integer(&format!("KEY{i}"), i, None));
        }
        let bytes = serialize_header(&h);
        assert_eq!(bytes.len(), 2 * BLOCK_SIZE);
        let mut cursor = Cursor::new(bytes);
        let parsed = read_header(&mut cursor).unwrap();
        assert_eq!(parsed.len(), 40);
        assert_eq!(cursor.position(), 2 * BLOCK_SIZE as u64);
    }
}
