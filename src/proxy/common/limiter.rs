// Body size enforcement
//
// Both checks trigger strictly above the limit: a body of exactly
// `max_file_size` bytes is relayed.

use crate::proxy::error::ProxyError;
use bytes::{Bytes, BytesMut};
use futures::{ready, Stream, StreamExt};
use pin_project::pin_project;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimit {
    max: u64,
}

impl SizeLimit {
    pub fn new(max: u64) -> Self {
        Self { max }
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Reject a declared Content-Length above the limit before any body is read
    pub fn check_declared(&self, declared: Option<u64>) -> Result<(), ProxyError> {
        match declared {
            Some(declared) if declared > self.max => Err(ProxyError::DeclaredTooLarge {
                allowed: self.max,
                declared,
            }),
            _ => Ok(()),
        }
    }

    /// Reject once the running byte count passes the limit
    pub fn check_read(&self, read: u64) -> Result<(), ProxyError> {
        if read > self.max {
            Err(ProxyError::StreamTooLarge { allowed: self.max })
        } else {
            Ok(())
        }
    }

    /// Wrap a body stream so it fails as soon as the limit is exceeded
    pub fn wrap<S>(self, inner: S) -> LimitedStream<S> {
        LimitedStream {
            inner,
            limit: self,
            read: 0,
            done: false,
        }
    }
}

/// Content-Length header value, if present and numeric.
///
/// Read from the header map directly since reqwest reports the body size
/// hint for HEAD responses, which is always zero.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Byte-counting stream adapter. Yields the limit error once and then ends.
#[pin_project]
pub struct LimitedStream<S> {
    #[pin]
    inner: S,
    limit: SizeLimit,
    read: u64,
    done: bool,
}

impl<S> LimitedStream<S> {
    pub fn bytes_read(&self) -> u64 {
        self.read
    }
}

impl<S, E> Stream for LimitedStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<ProxyError>,
{
    type Item = Result<Bytes, ProxyError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                *this.read += chunk.len() as u64;
                if let Err(e) = this.limit.check_read(*this.read) {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                *this.done = true;
                Poll::Ready(Some(Err(e.into())))
            }
            None => {
                *this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

/// Drain a limited stream into memory. The buffer never grows past the limit
/// plus one chunk; the inner stream is dropped on the first error.
pub async fn collect_limited<S, E>(
    stream: LimitedStream<S>,
    size_hint: Option<u64>,
) -> Result<Bytes, ProxyError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<ProxyError>,
{
    let capacity = size_hint.unwrap_or(0).min(stream.limit.max()) as usize;
    let mut buffer = BytesMut::with_capacity(capacity);

    let mut stream = std::pin::pin!(stream);
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }

    Ok(buffer.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use reqwest::header::HeaderValue;

    fn chunks(sizes: &[usize]) -> impl Stream<Item = Result<Bytes, ProxyError>> {
        let items: Vec<Result<Bytes, ProxyError>> = sizes
            .iter()
            .map(|n| Ok(Bytes::from(vec![b'c'; *n])))
            .collect();
        stream::iter(items)
    }

    #[test]
    fn test_declared_boundary() {
        let limit = SizeLimit::new(100);
        assert!(limit.check_declared(None).is_ok());
        assert!(limit.check_declared(Some(100)).is_ok());
        let err = limit.check_declared(Some(101)).unwrap_err();
        assert!(matches!(
            err,
            ProxyError::DeclaredTooLarge {
                allowed: 100,
                declared: 101
            }
        ));
    }

    #[test]
    fn test_declared_length_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        assert_eq!(declared_length(&headers), Some(42));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert_eq!(declared_length(&headers), None);
    }

    #[tokio::test]
    async fn test_collects_body_at_exact_limit() {
        let limited = SizeLimit::new(10).wrap(chunks(&[4, 4, 2]));
        let body = collect_limited(limited, None).await.unwrap();
        assert_eq!(body.len(), 10);
    }

    #[tokio::test]
    async fn test_overflow_aborts_mid_stream() {
        let mut limited = SizeLimit::new(10).wrap(chunks(&[4, 4, 4, 4]));

        assert!(limited.next().await.unwrap().is_ok());
        assert!(limited.next().await.unwrap().is_ok());
        let err = limited.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ProxyError::StreamTooLarge { allowed: 10 }));
        assert_eq!(limited.bytes_read(), 12);
        // fused after the error, the fourth chunk is never polled
        assert!(limited.next().await.is_none());
    }

    #[tokio::test]
    async fn test_collect_reports_overflow() {
        let limited = SizeLimit::new(1024).wrap(chunks(&[512, 512, 1]));
        let err = collect_limited(limited, Some(10)).await.unwrap_err();
        assert!(err.is_too_large());
    }

    #[tokio::test]
    async fn test_inner_error_is_forwarded() {
        let items: Vec<Result<Bytes, ProxyError>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(ProxyError::Connection("reset by peer".into())),
        ];
        let limited = SizeLimit::new(1024).wrap(stream::iter(items));
        let err = collect_limited(limited, None).await.unwrap_err();
        assert!(matches!(err, ProxyError::Connection(_)));
    }
}
