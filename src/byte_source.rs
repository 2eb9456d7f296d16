//! # C10 — async byte-source contract
//!
//! The codec's only suspension point. A link layer (out of scope for this
//! crate) hands the codec a `ByteSource` once it has authenticated a frame;
//! the codec never peeks or pushes bytes back, and a failed parse leaves
//! the source's position unspecified (`spec.md` §5).

use async_trait::async_trait;

use crate::error::CodecError;

/// A single async capability: read exactly `n` bytes or fail.
///
/// Fewer bytes than requested is fatal (`CodecError::UnexpectedEnd`); the
/// codec never requests zero bytes except when it already knows a payload
/// is empty.
#[async_trait]
pub trait ByteSource: Send {
    async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, CodecError>;

    /// Running count of bytes consumed so far, used only to annotate error
    /// offsets — the codec does not use it for control flow.
    fn position(&self) -> usize;
}

/// A deterministic finite buffer, used by tests and by synchronous
/// harnesses: "a blocking byte source with the same interface is equally
/// valid for test harnesses" (`spec.md` §9).
#[derive(Debug, Clone)]
pub struct SliceByteSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceByteSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

#[async_trait]
impl<'a> ByteSource for SliceByteSource<'a> {
    async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, CodecError> {
        let available = self.data.len() - self.pos;
        if available < n {
            return Err(CodecError::UnexpectedEnd {
                offset: self.pos,
                needed: n - available,
            });
        }
        let bytes = self.data[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(bytes)
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// Adapts any `tokio::io::AsyncRead` (serial port, TCP socket, ...) into a
/// [`ByteSource`]. The transport itself — framing, timeouts, reconnects —
/// stays with the caller; this is purely the read-exact adapter the codec
/// needs.
pub struct TokioByteSource<R> {
    inner: R,
    pos: usize,
}

impl<R> TokioByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }
}

#[async_trait]
impl<R> ByteSource for TokioByteSource<R>
where
    R: tokio::io::AsyncRead + Unpin + Send,
{
    async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, CodecError> {
        use tokio::io::AsyncReadExt;

        let mut buf = vec![0u8; n];
        match self.inner.read_exact(&mut buf).await {
            Ok(_) => {
                self.pos += n;
                Ok(buf)
            }
            Err(e) => {
                let read_before_eof = e.to_string(); // best effort; tokio doesn't report partial count
                let _ = read_before_eof;
                Err(CodecError::UnexpectedEnd {
                    offset: self.pos,
                    needed: n,
                })
            }
        }
    }

    fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slice_source_reads_in_order() {
        let mut src = SliceByteSource::new(&[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(src.read_exact(2).await.unwrap(), vec![0x01, 0x02]);
        assert_eq!(src.position(), 2);
        assert_eq!(src.read_exact(2).await.unwrap(), vec![0x03, 0x04]);
    }

    #[tokio::test]
    async fn slice_source_rejects_short_read() {
        let mut src = SliceByteSource::new(&[0x01]);
        let err = src.read_exact(2).await.unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEnd {
                offset: 0,
                needed: 1
            }
        );
    }

    #[tokio::test]
    async fn tokio_adapter_reads_from_async_read() {
        let data: &[u8] = &[0xAA, 0xBB, 0xCC];
        let mut src = TokioByteSource::new(data);
        assert_eq!(src.read_exact(3).await.unwrap(), vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(src.position(), 3);
    }

    /// A real transport delivers bytes across several `poll_read`s, not in
    /// one shot; `tokio_test::io::Builder` lets a `read_exact` spanning two
    /// separate reads be exercised without a live serial port or socket.
    #[tokio::test]
    async fn tokio_adapter_reassembles_a_read_split_across_chunks() {
        let mock = tokio_test::io::Builder::new()
            .read(&[0x04])
            .read(&[0x03, 0x39])
            .read(&[0x30, 0x00, 0x00])
            .build();
        let mut src = TokioByteSource::new(mock);
        assert_eq!(src.read_exact(1).await.unwrap(), vec![0x04]);
        assert_eq!(src.read_exact(5).await.unwrap(), vec![0x03, 0x39, 0x30, 0x00, 0x00]);
        assert_eq!(src.position(), 6);
    }

    #[tokio::test]
    async fn tokio_adapter_reports_unexpected_end_on_early_close() {
        let mock = tokio_test::io::Builder::new().read(&[0x01]).build();
        let mut src = TokioByteSource::new(mock);
        let err = src.read_exact(2).await.unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEnd { .. }));
    }
}
