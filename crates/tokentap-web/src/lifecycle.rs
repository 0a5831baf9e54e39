//! Soft exit: the single path by which a run ends.
//!
//! A request handler never stops the listener itself. It records an exit
//! code on the shared [`Lifecycle`] and the main control path, blocked in
//! [`Lifecycle::wait`], takes it from there.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use futures::Stream;
use tokio::sync::watch;

/// Highest exit code that is portable across shells.
pub const MAX_EXIT_CODE: u8 = 125;

/// Map `code` into `0..=125`; anything outside becomes 125.
pub fn clamp_exit_code(code: i64) -> u8 {
    match u8::try_from(code) {
        Ok(c) if c <= MAX_EXIT_CODE => c,
        _ => {
            tracing::debug!(
                requested = code,
                replacement = MAX_EXIT_CODE,
                "exit code out of range, replaced"
            );
            MAX_EXIT_CODE
        }
    }
}

/// Shared handle to the exit request of this run.
///
/// Cloning is cheap; every clone refers to the same exit cell.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    code: AtomicU8,
    requested: watch::Sender<bool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (requested, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                code: AtomicU8::new(0),
                requested,
            }),
        }
    }

    /// Record `code` (clamped) as the exit code and wake the main control
    /// path. Later calls overwrite the code; the wake-up is idempotent.
    ///
    /// Returns the clamped code.
    pub fn request_exit(&self, code: i64) -> u8 {
        let code = clamp_exit_code(code);
        self.inner.code.store(code, Ordering::SeqCst);
        self.inner.requested.send_replace(true);
        code
    }

    /// Like [`request_exit`](Self::request_exit), but only if no exit has
    /// been requested yet. Returns whether this call made the request.
    pub fn request_exit_if_idle(&self, code: i64) -> bool {
        let code = clamp_exit_code(code);
        self.inner.requested.send_if_modified(|requested| {
            if *requested {
                return false;
            }
            self.inner.code.store(code, Ordering::SeqCst);
            *requested = true;
            true
        })
    }

    /// Whether an exit has been requested.
    pub fn is_exit_requested(&self) -> bool {
        *self.inner.requested.borrow()
    }

    /// The recorded exit code (0 until something requests otherwise).
    pub fn exit_code(&self) -> u8 {
        self.inner.code.load(Ordering::SeqCst)
    }

    /// Resolve once an exit has been requested.
    pub async fn wait(&self) {
        let mut rx = self.inner.requested.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = rx.wait_for(|requested| *requested).await;
    }

    /// Wrap `body` so that `code` is requested as the exit code once the
    /// body has been handed to the connection (or the client went away).
    pub fn body_then_exit(&self, body: impl Into<Bytes>, code: i64) -> Body {
        Body::from_stream(ExitAfterBody {
            chunk: Some(body.into()),
            _guard: ExitOnDrop {
                lifecycle: self.clone(),
                code,
            },
        })
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Response body that ends the run
// ---------------------------------------------------------------------------

struct ExitOnDrop {
    lifecycle: Lifecycle,
    code: i64,
}

impl Drop for ExitOnDrop {
    fn drop(&mut self) {
        self.lifecycle.request_exit(self.code);
    }
}

/// A single-chunk body stream. Hyper drops it after the last chunk has been
/// written out, which is when the exit is requested.
struct ExitAfterBody {
    chunk: Option<Bytes>,
    _guard: ExitOnDrop,
}

impl Stream for ExitAfterBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.chunk.take().map(Ok))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clamp_keeps_portable_codes() {
        assert_eq!(clamp_exit_code(0), 0);
        assert_eq!(clamp_exit_code(42), 42);
        assert_eq!(clamp_exit_code(125), 125);
    }

    #[test]
    fn clamp_replaces_out_of_range_codes() {
        assert_eq!(clamp_exit_code(200), 125);
        assert_eq!(clamp_exit_code(-1), 125);
        assert_eq!(clamp_exit_code(126), 125);
        assert_eq!(clamp_exit_code(400), 125);
        assert_eq!(clamp_exit_code(i64::MAX), 125);
    }

    #[test]
    fn request_exit_records_clamped_code() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_exit_requested());

        assert_eq!(lifecycle.request_exit(200), 125);
        assert_eq!(lifecycle.exit_code(), 125);
        assert!(lifecycle.is_exit_requested());

        assert_eq!(lifecycle.request_exit(-1), 125);
        assert_eq!(lifecycle.request_exit(42), 42);
        assert_eq!(lifecycle.exit_code(), 42);
    }

    #[test]
    fn request_exit_if_idle_does_not_overwrite() {
        let lifecycle = Lifecycle::new();
        lifecycle.request_exit(0);
        assert!(!lifecycle.request_exit_if_idle(1));
        assert_eq!(lifecycle.exit_code(), 0);

        let lifecycle = Lifecycle::new();
        assert!(lifecycle.request_exit_if_idle(1));
        assert_eq!(lifecycle.exit_code(), 1);
    }

    #[tokio::test]
    async fn wait_resolves_after_request_from_another_task() {
        let lifecycle = Lifecycle::new();
        let handle = lifecycle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.request_exit(7);
        });

        tokio::time::timeout(Duration::from_secs(5), lifecycle.wait())
            .await
            .expect("exit was requested");
        assert_eq!(lifecycle.exit_code(), 7);
    }

    #[tokio::test]
    async fn wait_resolves_immediately_when_already_requested() {
        let lifecycle = Lifecycle::new();
        lifecycle.request_exit(3);
        tokio::time::timeout(Duration::from_millis(100), lifecycle.wait())
            .await
            .expect("already requested");
    }

    #[tokio::test]
    async fn body_requests_exit_when_consumed() {
        let lifecycle = Lifecycle::new();
        let body = lifecycle.body_then_exit("done", 0);
        assert!(!lifecycle.is_exit_requested());

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"done");
        assert!(lifecycle.is_exit_requested());
        assert_eq!(lifecycle.exit_code(), 0);
    }

    #[test]
    fn dropped_body_still_requests_exit() {
        let lifecycle = Lifecycle::new();
        drop(lifecycle.body_then_exit("unsent", 400));
        assert_eq!(lifecycle.exit_code(), 125);
    }
}
