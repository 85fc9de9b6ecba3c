/// All errors that can occur while reading or writing camera FITS images.
#[derive(Debug)]
pub enum Error {
    /// The header failed validation (missing SIMPLE, bad NAXIS, ...).
    InvalidHeader(String),
    /// The reader ran out of data before a transfer completed.
    UnexpectedEof(&'static str),
    /// The writer stopped accepting bytes before a transfer completed.
    ShortWrite(&'static str),
    /// Unsupported BITPIX value.
    InvalidBitpix(i64),
    /// A required keyword was not found in the header.
    MissingKeyword(String),
    /// The value field of the named card could not be parsed.
    InvalidValue(String),
    /// A write was requested for an image with no pixel buffer.
    NoPixels,
    /// A caller-supplied pixel slice is smaller than the declared image.
    BufferSize { expected: usize, actual: usize },
    /// A buffer of the given byte size could not be allocated.
    OutOfMemory(usize),
    /// An I/O error from the underlying transport.
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidHeader(msg) => write!(f, "invalid FITS header: {msg}"),
            Error::UnexpectedEof(what) => write!(f, "unexpected end of file: {what}"),
            Error::ShortWrite(what) => write!(f, "short write of {what}"),
            Error::InvalidBitpix(v) => {
                write!(f, "invalid BITPIX value: {v} (must be 16, 32 or -32)")
            }
            Error::MissingKeyword(kw) => write!(f, "missing required keyword: {kw}"),
            Error::InvalidValue(kw) => write!(f, "malformed value for keyword: {kw}"),
            Error::NoPixels => write!(f, "image has no pixels"),
            Error::BufferSize { expected, actual } => {
                write!(f, "pixel buffer holds {actual} samples, need {expected}")
            }
            Error::OutOfMemory(n) => write!(f, "could not allocate {n} bytes"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_header() {
        let e = Error::InvalidHeader(String::from("NAXIS must be at least 2"));
        assert_eq!(e.to_string(), "invalid FITS header: NAXIS must be at least 2");
    }

    #[test]
    fn display_unexpected_eof() {
        let e = Error::UnexpectedEof("data is short");
        assert_eq!(e.to_string(), "unexpected end of file: data is short");
    }

    #[test]
    fn display_short_write() {
        let e = Error::ShortWrite("FITS pixels");
        assert_eq!(e.to_string(), "short write of FITS pixels");
    }

    #[test]
    fn display_invalid_bitpix() {
        let e = Error::InvalidBitpix(64);
        assert_eq!(e.to_string(), "invalid BITPIX value: 64 (must be 16, 32 or -32)");
    }

    #[test]
    fn display_missing_keyword() {
        let e = Error::MissingKeyword(String::from("NAXIS2"));
        assert_eq!(e.to_string(), "missing required keyword: NAXIS2");
    }

    #[test]
    fn display_invalid_value() {
        let e = Error::InvalidValue(String::from("OBJECT"));
        assert_eq!(e.to_string(), "malformed value for keyword: OBJECT");
    }

    #[test]
    fn display_buffer_size() {
        let e = Error::BufferSize {
            expected: 100,
            actual: 10,
        };
        assert_eq!(e.to_string(), "pixel buffer holds 10 samples, need 100");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e = Error::Io(io_err);
        assert_eq!(e.to_string(), "I/O error: file not found");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::other("oops");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn std_error_source() {
        use std::error::Error as StdError;

        let e = Error::NoPixels;
        assert!(e.source().is_none());

        let e = Error::Io(std::io::Error::other("inner"));
        assert!(e.source().is_some());
    }
}
