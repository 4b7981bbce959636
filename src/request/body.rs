//! The request input stream.

use std::fmt;
use std::io::{self, Read};

/// One-shot handle over a request's input stream.
///
/// A `Request` hands out its `Body` at most once; whoever holds it owns the
/// stream. It is also consumed internally when form parameters are decoded
/// from the body, after which no handle is available.
///
/// When the server declared a content length, the handle never reads past
/// it, even if the underlying stream has more bytes or stays open.
pub struct Body {
    inner: Box<dyn Read>,
}

impl Body {
    pub(crate) fn new(input: impl Read + 'static, length: Option<u64>) -> Self {
        let inner: Box<dyn Read> = match length {
            Some(length) => Box::new(input.take(length)),
            None => Box::new(input),
        };
        Self { inner }
    }

    /// Reads the remaining stream into memory.
    pub fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Body { .. }")
    }
}
