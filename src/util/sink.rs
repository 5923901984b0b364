use std::io::{self, Write};

use futures::future::{self, BoxFuture, FutureExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Destination for rendered feed fragments.
///
/// The execution strategy is fixed when the sink is constructed:
/// [`BlockingSink`] performs the write before returning a ready future,
/// [`AsyncSink`] awaits the underlying writer. Both produce the same bytes.
pub trait FeedSink: Send {
    fn write_raw<'a>(&'a mut self, fragment: &'a str) -> BoxFuture<'a, io::Result<()>>;

    fn flush(&mut self) -> BoxFuture<'_, io::Result<()>>;

    /// Whether the underlying writer supports non-blocking writes.
    fn is_async(&self) -> bool;
}

/// Sink over a synchronous [`std::io::Write`].
#[derive(Debug)]
pub struct BlockingSink<W> {
    inner: W,
}

impl<W: Write + Send> BlockingSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> FeedSink for BlockingSink<W> {
    fn write_raw<'a>(&'a mut self, fragment: &'a str) -> BoxFuture<'a, io::Result<()>> {
        future::ready(self.inner.write_all(fragment.as_bytes())).boxed()
    }

    fn flush(&mut self) -> BoxFuture<'_, io::Result<()>> {
        future::ready(self.inner.flush()).boxed()
    }

    fn is_async(&self) -> bool {
        false
    }
}

/// Sink over a tokio [`AsyncWrite`].
#[derive(Debug)]
pub struct AsyncSink<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin + Send> AsyncSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin + Send> FeedSink for AsyncSink<W> {
    fn write_raw<'a>(&'a mut self, fragment: &'a str) -> BoxFuture<'a, io::Result<()>> {
        self.inner.write_all(fragment.as_bytes()).boxed()
    }

    fn flush(&mut self) -> BoxFuture<'_, io::Result<()>> {
        self.inner.flush().boxed()
    }

    fn is_async(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocking_and_async_produce_same_bytes() {
        let fragments = ["<item>", "<title>A &amp; B</title>", "</item>"];

        let mut blocking = BlockingSink::new(Vec::new());
        let mut non_blocking = AsyncSink::new(Vec::new());
        for fragment in fragments {
            blocking.write_raw(fragment).await.unwrap();
            non_blocking.write_raw(fragment).await.unwrap();
        }
        blocking.flush().await.unwrap();
        non_blocking.flush().await.unwrap();

        assert!(!blocking.is_async());
        assert!(non_blocking.is_async());
        assert_eq!(blocking.into_inner(), non_blocking.into_inner());
    }
}
