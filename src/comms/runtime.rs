//! Channel runtime — spawns every configured channel as its own task.
//!
//! A [`Component`] captures its shared state (`Arc<ChatService>`) at
//! construction time; [`Component::run`] only receives the shutdown token.
//! Any component error cancels the shared [`CancellationToken`] so siblings
//! stop cooperatively.

use std::future::Future;
use std::pin::Pin;

use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::AppError;

/// A boxed, owned future returned by [`Component::run`].
pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// A self-contained, concurrently-runnable channel.
pub trait Component: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Consume the component and return its run-loop. Must watch `shutdown`.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

/// Handle to the running channel set. `.join()` resolves when all have exited.
pub struct ChannelsHandle {
    inner: JoinHandle<Result<(), AppError>>,
}

impl ChannelsHandle {
    /// Await all channels and return the first error, if any.
    pub async fn join(self) -> Result<(), AppError> {
        match self.inner.await {
            Ok(r) => r,
            Err(e) => Err(AppError::Comms(format!("channel manager panicked: {e}"))),
        }
    }
}

/// Spawn each component and return a handle that resolves once all exit.
///
/// The first error (or panic) cancels `shutdown` and is returned after the
/// remaining components have drained.
pub fn spawn_components(
    components: Vec<Box<dyn Component>>,
    shutdown: CancellationToken,
) -> ChannelsHandle {
    let handle = tokio::spawn(async move {
        let mut set: JoinSet<Result<(), AppError>> = JoinSet::new();

        for component in components {
            debug!(component = %component.id(), "spawning channel");
            set.spawn(component.run(shutdown.clone()));
        }

        let mut first_err: Option<AppError> = None;

        while let Some(res) = set.join_next().await {
            match res {
                Err(e) => {
                    error!("channel panicked: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert_with(|| AppError::Comms(format!("channel panicked: {e}")));
                }
                Ok(Err(e)) => {
                    error!("channel error: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert(e);
                }
                Ok(Ok(())) => {}
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    });

    ChannelsHandle { inner: handle }
}
