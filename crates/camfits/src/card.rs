//! FITS header cards: formatting and parsing of fixed 80-column records.
//!
//! Layout (1-based columns, as in the FITS standard):
//!
//! - 1–8: keyword, left-justified and blank-padded
//! - 9: `=` for value cards
//! - 11–30: value field; numbers right-justified, logicals in column 30,
//!   strings open with `'` in column 11
//! - 31–80: optional ` / comment`
//!
//! Commentary cards (`COMMENT`, `HISTORY`) carry free text in columns 9–80.

use core::fmt;

use crate::block::CARD_SIZE;
use crate::error::{Error, Result};

const KEYWORD_LEN: usize = 8;
const VALUE_START: usize = 10;
const VALUE_END: usize = 30;
const LOGICAL_INDEX: usize = 29;
const COMMENT_START: usize = 30;
const COMMENT_MAX: usize = 47;
const STRING_MIN: usize = 8;
const STRING_MAX: usize = 68;
const COMMENTARY_FIRST: usize = 72;
const COMMENTARY_NEXT: usize = 68;
const CONTINUATION: &[u8; 4] = b"... ";

/// Pad a short keyword name to 8 bytes with trailing ASCII spaces,
/// truncating anything longer. Bytes that are not printable ASCII become `?`.
pub const fn kw(name: &[u8]) -> [u8; KEYWORD_LEN] {
    let mut buf = [b' '; KEYWORD_LEN];
    let mut i = 0;
    while i < name.len() && i < KEYWORD_LEN {
        let b = name[i];
        buf[i] = if b == b' ' || b.is_ascii_graphic() { b } else { b'?' };
        i += 1;
    }
    buf
}

/// One raw 80-byte header record.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Card([u8; CARD_SIZE]);

impl Card {
    /// An all-blank card, used for header padding.
    pub const fn blank() -> Self {
        Card([b' '; CARD_SIZE])
    }

    /// Wrap raw card bytes as read from a file.
    pub const fn from_bytes(bytes: [u8; CARD_SIZE]) -> Self {
        Card(bytes)
    }

    fn with_keyword(name: &str) -> Self {
        let mut card = Card::blank();
        card.0[..KEYWORD_LEN].copy_from_slice(&kw(name.as_bytes()));
        card
    }

    /// The raw 80 bytes of this card.
    pub fn as_bytes(&self) -> &[u8; CARD_SIZE] {
        &self.0
    }

    /// The card as text, or an empty string if it holds non-UTF-8 bytes.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("")
    }

    /// Columns 1–8, blank padded.
    pub fn keyword(&self) -> [u8; KEYWORD_LEN] {
        let mut key = [b' '; KEYWORD_LEN];
        key.copy_from_slice(&self.0[..KEYWORD_LEN]);
        key
    }

    /// Returns `true` if columns 1–8 equal the padded keyword `name`.
    pub fn has_keyword(&self, name: &[u8; KEYWORD_LEN]) -> bool {
        &self.0[..KEYWORD_LEN] == name
    }

    /// Return the keyword as a trimmed UTF-8 string.
    pub fn keyword_str(&self) -> &str {
        let end = self.0[..KEYWORD_LEN]
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        core::str::from_utf8(&self.0[..end]).unwrap_or("")
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        self.has_keyword(b"END     ")
    }

    fn invalid(&self) -> Error {
        Error::InvalidValue(String::from(self.keyword_str()))
    }
}

impl Default for Card {
    fn default() -> Self {
        Card::blank()
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Card")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

// ── Formatting ──

/// Copy `text` into `dest`, truncating to fit. Bytes outside printable ASCII
/// become `?` so the card stays valid FITS text.
fn put_text(dest: &mut [u8], text: &str) -> usize {
    let mut n = 0;
    for (slot, b) in dest.iter_mut().zip(text.bytes()) {
        *slot = if b == b' ' || b.is_ascii_graphic() {
            b
        } else {
            b'?'
        };
        n += 1;
    }
    n
}

/// Right-justify `src` within `dest`, padding the left with spaces.
fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest.fill(b' ');
    dest[start..].copy_from_slice(&src[..len]);
}

fn value_card(name: &str) -> Card {
    let mut card = Card::with_keyword(name);
    card.0[8] = b'=';
    card
}

/// Fill columns 31–80 with ` / comment`, or blanks when there is none.
fn inline_comment(card: &mut Card, comment: Option<&str>) {
    let tail = &mut card.0[COMMENT_START..];
    tail.fill(b' ');
    if let Some(text) = comment {
        tail[..3].copy_from_slice(b" / ");
        put_text(&mut tail[3..3 + COMMENT_MAX], text);
    }
}

/// Format a logical card with `T` or `F` in column 30.
pub fn format_logical(name: &str, value: bool, comment: Option<&str>) -> Card {
    let mut card = value_card(name);
    card.0[LOGICAL_INDEX] = if value { b'T' } else { b'F' };
    inline_comment(&mut card, comment);
    card
}

/// Format an integer card, right-justified in columns 11–30.
pub fn format_integer(name: &str, value: i64, comment: Option<&str>) -> Card {
    let mut card = value_card(name);
    let text = value.to_string();
    right_justify(text.as_bytes(), &mut card.0[VALUE_START..VALUE_END]);
    inline_comment(&mut card, comment);
    card
}

/// Format a real card with at most `sigdig` significant digits, right-justified
/// in columns 11–30.
///
/// Uses general notation: fixed point for moderate exponents, `E` notation
/// otherwise, with trailing zeros removed. If the text would not fit the
/// 20-column field, precision is reduced until it does.
pub fn format_real(name: &str, value: f64, sigdig: usize, comment: Option<&str>) -> Card {
    let mut card = value_card(name);
    let width = VALUE_END - VALUE_START;
    let mut precision = sigdig.max(1);
    let mut text = format_general(value, precision);
    while text.len() > width && precision > 1 {
        precision -= 1;
        text = format_general(value, precision);
    }
    right_justify(text.as_bytes(), &mut card.0[VALUE_START..VALUE_END]);
    inline_comment(&mut card, comment);
    card
}

/// Format a character-string card.
///
/// The value opens with `'` in column 11, is padded to at least 8 and
/// truncated to at most 68 characters, then closed with `'`. A comment starts
/// in column 31 or right after the closing quote, whichever is later.
pub fn format_string(name: &str, value: &str, comment: Option<&str>) -> Card {
    let mut card = value_card(name);
    let len = value.len().clamp(STRING_MIN, STRING_MAX);
    let open = VALUE_START;
    card.0[open] = b'\'';
    put_text(&mut card.0[open + 1..open + 1 + len], value);
    let close = open + 1 + len;
    card.0[close] = b'\'';

    if let Some(text) = comment {
        let start = (close + 1).max(COMMENT_START);
        if start + 3 < CARD_SIZE {
            card.0[start..start + 3].copy_from_slice(b" / ");
            put_text(&mut card.0[start + 3..], text);
        }
    }
    card
}

/// Format free text under a commentary keyword such as `HISTORY`.
///
/// The first card holds up to 72 characters in columns 9–80; any remainder
/// continues on further cards that start with `... ` and hold 68 characters
/// each.
pub fn format_commentary(name: &str, text: &str) -> Vec<Card> {
    let bytes = text.as_bytes();
    let mut cards = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let mut card = Card::with_keyword(name);
        let (start, room) = if pos == 0 {
            (KEYWORD_LEN, COMMENTARY_FIRST)
        } else {
            card.0[KEYWORD_LEN..KEYWORD_LEN + 4].copy_from_slice(CONTINUATION);
            (KEYWORD_LEN + 4, COMMENTARY_NEXT)
        };
        let end = (pos + room).min(bytes.len());
        let chunk = String::from_utf8_lossy(&bytes[pos..end]);
        put_text(&mut card.0[start..], &chunk);
        cards.push(card);
        pos += room;
    }
    cards
}

/// Create the standard FITS END card.
pub fn end_card() -> Card {
    Card::with_keyword("END")
}

/// Render `value` like C's `%.{sigdig}G`.
fn format_general(value: f64, sigdig: usize) -> String {
    if value.is_nan() {
        return String::from("NAN");
    }
    if value.is_infinite() {
        return String::from(if value > 0.0 { "INF" } else { "-INF" });
    }
    if value == 0.0 {
        return String::from("0");
    }

    let precision = sigdig.max(1);
    let scientific = format!("{:.*E}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('E') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}E{}{:02}",
            strip_fraction_zeros(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, value);
        String::from(strip_fraction_zeros(&fixed))
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// ── Parsing ──

/// Parse the logical value in column 30 (`T`/`t` or `F`/`f`).
pub fn parse_logical(card: &Card) -> Result<bool> {
    match card.0[LOGICAL_INDEX] {
        b'T' | b't' => Ok(true),
        b'F' | b'f' => Ok(false),
        _ => Err(card.invalid()),
    }
}

/// Parse a decimal integer starting in column 11.
///
/// Leading whitespace is skipped and parsing stops at the first non-digit,
/// so a trailing comment is ignored. A field with no digits is malformed.
pub fn parse_integer(card: &Card) -> Result<i64> {
    let field = &card.0[VALUE_START..];
    let mut i = field
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(field.len());

    let negative = match field.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let digits = field[i..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return Err(card.invalid());
    }

    let mut value: i64 = 0;
    for &b in &field[i..i + digits] {
        let d = i64::from(b - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| if negative { v.checked_sub(d) } else { v.checked_add(d) })
            .ok_or_else(|| card.invalid())?;
    }
    Ok(value)
}

/// Parse a real value starting in column 11.
///
/// Fortran-style `D` exponents are accepted as well as `E`.
pub fn parse_real(card: &Card) -> Result<f64> {
    let field = core::str::from_utf8(&card.0[VALUE_START..]).map_err(|_| card.invalid())?;
    let text = match field.find('/') {
        Some(idx) => &field[..idx],
        None => field,
    };
    let normalized = text.trim().replace(|c: char| c == 'D' || c == 'd', "E");
    if normalized.is_empty() {
        return Err(card.invalid());
    }
    normalized.parse::<f64>().map_err(|_| card.invalid())
}

/// Parse a string value: `'` in column 11 and a closing `'` later on.
///
/// Returns the quoted content with surrounding blanks removed.
pub fn parse_string(card: &Card) -> Result<String> {
    if card.0[VALUE_START] != b'\'' {
        return Err(card.invalid());
    }
    let body = &card.0[VALUE_START + 1..];
    let close = body
        .iter()
        .position(|&b| b == b'\'')
        .ok_or_else(|| card.invalid())?;
    let text = String::from_utf8_lossy(&body[..close]);
    Ok(String::from(text.trim_matches(' ')))
}

/// Free text from columns 9–80, trailing blanks removed.
pub fn parse_commentary(card: &Card) -> String {
    let text = String::from_utf8_lossy(&card.0[KEYWORD_LEN..]);
    String::from(text.trim_end())
}
