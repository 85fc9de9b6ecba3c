//! Blocking byte transfers over `std::io` streams.
//!
//! Pipes and sockets may move fewer bytes per call than requested. These
//! helpers loop until the whole buffer has been transferred, retry
//! `Interrupted`, and tell a clean end of data apart from a transport error.

use std::io::{ErrorKind, Read, Write};

use crate::block::{padding_len, BLOCK_SIZE, DATA_PAD_BYTE};
use crate::error::{Error, Result};

/// Read until `buf` is full or the reader reports end of data.
///
/// Returns the number of bytes read, which is less than `buf.len()` only when
/// the reader ran dry.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut offset = 0;
    while offset < buf.len() {
        match reader.read(&mut buf[offset..]) {
            Ok(0) => break,
            Ok(n) => offset += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(offset)
}

/// Fill `buf` completely, or fail with [`Error::UnexpectedEof`] naming `what`.
pub fn read_exact<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    what: &'static str,
) -> Result<()> {
    let n = read_full(reader, buf)?;
    if n < buf.len() {
        tracing::warn!(wanted = buf.len(), got = n, "{what}");
        return Err(Error::UnexpectedEof(what));
    }
    Ok(())
}

/// Write all of `buf`, looping over partial writes.
///
/// A writer that accepts zero bytes fails with [`Error::ShortWrite`].
pub fn write_full<W: Write + ?Sized>(
    writer: &mut W,
    buf: &[u8],
    what: &'static str,
) -> Result<()> {
    let mut offset = 0;
    while offset < buf.len() {
        match writer.write(&buf[offset..]) {
            Ok(0) => {
                tracing::warn!(wanted = buf.len(), wrote = offset, "short write of {what}");
                return Err(Error::ShortWrite(what));
            }
            Ok(n) => offset += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(())
}

/// Write zero bytes so that a section of `written` bytes ends on a block
/// boundary. Returns the number of pad bytes written.
pub fn write_padding<W: Write + ?Sized>(writer: &mut W, written: usize) -> Result<usize> {
    let n = padding_len(written);
    if n > 0 {
        let pad = [DATA_PAD_BYTE; BLOCK_SIZE];
        write_full(writer, &pad[..n], "FITS padding")?;
    }
    Ok(n)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Streams that misbehave in controlled ways.

    use std::io::{self, Read, Write};

    /// Hands out at most `chunk` bytes per call and interrupts every other call.
    pub struct TrickleReader<'a> {
        pub data: &'a [u8],
        pub chunk: usize,
        pub calls: usize,
    }

    impl<'a> TrickleReader<'a> {
        pub fn new(data: &'a [u8], chunk: usize) -> Self {
            TrickleReader {
                data,
                chunk,
                calls: 0,
            }
        }
    }

    impl Read for TrickleReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls % 2 == 1 {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.chunk).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Accepts at most `chunk` bytes per call, and nothing once `limit` is hit.
    pub struct TrickleWriter {
        pub data: Vec<u8>,
        pub chunk: usize,
        pub limit: usize,
    }

    impl TrickleWriter {
        pub fn new(chunk: usize) -> Self {
            TrickleWriter {
                data: Vec::new(),
                chunk,
                limit: usize::MAX,
            }
        }

        pub fn with_limit(chunk: usize, limit: usize) -> Self {
            TrickleWriter {
                data: Vec::new(),
                chunk,
                limit,
            }
        }
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.data.len();
            let n = buf.len().min(self.chunk).min(room);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Fails every call with a transport error.
    pub struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
