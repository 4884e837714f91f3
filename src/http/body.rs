//! Response body streaming module
//!
//! Builds streaming response bodies from files, optionally bounded to a byte
//! range and wrapped in a compression transform. Terminal responses use the
//! in-memory constructors, so no file handle is ever opened for them.

use crate::http::encoding::Encoding;
use crate::http::range::ByteRange;
use brotli::CompressorWriter;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use futures_util::{Stream, TryStreamExt};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io::{self, SeekFrom, Write};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Body type shared by all responses
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Empty body for terminal statuses and HEAD responses
pub fn empty() -> ResponseBody {
    Empty::new().map_err(|never| match never {}).boxed()
}

/// Fixed in-memory body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Open a file and stream it, bounded to `range` when given and compressed
/// with `encoding` when given.
///
/// A range stream seeks to the start offset and reads exactly the range
/// length; backpressure and cancellation are the stream's native behavior,
/// and dropping the body closes the file.
pub async fn open_read(
    path: &Path,
    range: Option<ByteRange>,
    encoding: Option<Encoding>,
) -> io::Result<ResponseBody> {
    let mut file = File::open(path).await?;
    match range {
        Some(r) => {
            file.seek(SeekFrom::Start(r.start)).await?;
            Ok(build(ReaderStream::new(file.take(r.byte_len())), encoding))
        }
        None => Ok(build(ReaderStream::new(file), encoding)),
    }
}

fn build<S>(stream: S, encoding: Option<Encoding>) -> ResponseBody
where
    S: Stream<Item = io::Result<Bytes>> + Send + Sync + Unpin + 'static,
{
    match encoding {
        Some(enc) => stream_body(EncoderStream::new(stream, enc)),
        None => stream_body(stream),
    }
}

fn stream_body<S>(stream: S) -> ResponseBody
where
    S: Stream<Item = io::Result<Bytes>> + Send + Sync + 'static,
{
    StreamBody::new(stream.map_ok(Frame::data)).boxed()
}

/// Write-side compressor state for one response body
enum Sink {
    Deflate(ZlibEncoder<Vec<u8>>),
    Gzip(GzEncoder<Vec<u8>>),
    Brotli(Box<CompressorWriter<Vec<u8>>>),
}

impl Sink {
    fn new(encoding: Encoding) -> Self {
        match encoding {
            // HTTP "deflate" is the zlib-wrapped format
            Encoding::Deflate => Self::Deflate(ZlibEncoder::new(Vec::new(), Compression::default())),
            Encoding::Gzip => Self::Gzip(GzEncoder::new(Vec::new(), Compression::default())),
            Encoding::Brotli => Self::Brotli(Box::new(CompressorWriter::new(Vec::new(), 4096, 4, 22))),
        }
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self {
            Self::Deflate(e) => e.write_all(chunk),
            Self::Gzip(e) => e.write_all(chunk),
            Self::Brotli(w) => w.write_all(chunk),
        }
    }

    /// Take whatever compressed output has accumulated so far
    fn drain(&mut self) -> Vec<u8> {
        match self {
            Self::Deflate(e) => std::mem::take(e.get_mut()),
            Self::Gzip(e) => std::mem::take(e.get_mut()),
            Self::Brotli(w) => std::mem::take(w.get_mut()),
        }
    }

    /// Finalize the encoder and return the trailing output
    fn finish(self) -> io::Result<Vec<u8>> {
        match self {
            Self::Deflate(e) => e.finish(),
            Self::Gzip(e) => e.finish(),
            Self::Brotli(w) => {
                let mut w = *w;
                w.flush()?;
                Ok(w.into_inner())
            }
        }
    }
}

/// Stream transform that compresses chunks as they flow through and emits
/// the encoder tail when the source ends.
pub struct EncoderStream<S> {
    inner: S,
    sink: Option<Sink>,
}

impl<S> EncoderStream<S> {
    fn new(inner: S, encoding: Encoding) -> Self {
        Self {
            inner,
            sink: Some(Sink::new(encoding)),
        }
    }
}

impl<S> Stream for EncoderStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.sink.is_none() {
                return Poll::Ready(None);
            }
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    let Some(sink) = this.sink.as_mut() else {
                        return Poll::Ready(None);
                    };
                    if let Err(e) = sink.write(&chunk) {
                        this.sink = None;
                        return Poll::Ready(Some(Err(e)));
                    }
                    let out = sink.drain();
                    if !out.is_empty() {
                        return Poll::Ready(Some(Ok(Bytes::from(out))));
                    }
                    // Encoder buffered the whole chunk; pull more input
                }
                Poll::Ready(Some(Err(e))) => {
                    this.sink = None;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    let Some(sink) = this.sink.take() else {
                        return Poll::Ready(None);
                    };
                    return match sink.finish() {
                        Ok(tail) if tail.is_empty() => Poll::Ready(None),
                        Ok(tail) => Poll::Ready(Some(Ok(Bytes::from(tail)))),
                        Err(e) => Poll::Ready(Some(Err(e))),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::io::Read;

    async fn collect(mut stream: impl Stream<Item = io::Result<Bytes>> + Unpin) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_gzip_stream_round_trips() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let source = futures_util::stream::iter(chunks);
        let compressed = collect(EncoderStream::new(source, Encoding::Gzip)).await;

        let mut decoder = flate2::read::GzDecoder::new(&compressed[..]);
        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[tokio::test]
    async fn test_deflate_stream_is_zlib_format() {
        let source = futures_util::stream::iter(vec![Ok(Bytes::from_static(b"abcabcabc"))]);
        let compressed = collect(EncoderStream::new(source, Encoding::Deflate)).await;

        let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, b"abcabcabc");
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data")),
            Err(io::Error::new(io::ErrorKind::Other, "boom")),
        ];
        let mut stream = EncoderStream::new(futures_util::stream::iter(chunks), Encoding::Gzip);
        let mut saw_error = false;
        while let Some(item) = stream.next().await {
            if item.is_err() {
                saw_error = true;
                break;
            }
        }
        assert!(saw_error);
        // Terminated after the error
        assert!(stream.next().await.is_none());
    }
}
