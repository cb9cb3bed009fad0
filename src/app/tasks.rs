use crate::api::ProxyClient;
use crate::error::ApiError;
use derivative::Derivative;
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Shared handle the panels use to issue requests off the UI thread.
#[derive(Clone, Debug)]
pub struct Backend {
    client: Arc<ProxyClient>,
    runtime: Handle,
}

impl Backend {
    pub fn new(client: Arc<ProxyClient>, runtime: Handle) -> Self {
        Self { client, runtime }
    }

    pub fn client(&self) -> &Arc<ProxyClient> {
        &self.client
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Runs one request on the runtime; the result is picked up later with
    /// [`Pending::poll`].
    pub fn spawn<T, F, Fut>(&self, request: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<ProxyClient>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (sender, receiver) = channel();
        let future = request(Arc::clone(&self.client));
        self.runtime.spawn(async move {
            let result = future.await;
            sender.send(result).unwrap_or_default();
        });
        Pending { receiver }
    }
}

/// A request whose result has not been picked up yet.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Pending<T> {
    #[derivative(Debug = "ignore")]
    receiver: Receiver<Result<T, ApiError>>,
}

impl<T> Pending<T> {
    pub fn poll(&self) -> Option<Result<T, ApiError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ApiError::Transport(
                "request task ended without a response".to_string(),
            ))),
        }
    }
}

/// Takes the result out of `slot` once it is ready, leaving the slot empty.
pub fn take_ready<T>(slot: &mut Option<Pending<T>>) -> Option<Result<T, ApiError>> {
    let result = slot.as_ref()?.poll()?;
    *slot = None;
    Some(result)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::AdminConfig;
    use std::time::Duration;

    pub const PREFIX: &str = "/services/learn-dashboard/api/proxy";

    pub fn backend_for(server_uri: &str) -> Backend {
        let config = AdminConfig {
            base_url: format!("{}/services/learn-dashboard", server_uri),
            ..AdminConfig::default()
        };
        Backend::new(
            Arc::new(ProxyClient::new(&config).unwrap()),
            Handle::current(),
        )
    }

    /// Repeats `frame` the way the UI loop would until it reports `true`.
    pub async fn until(mut frame: impl FnMut() -> bool) {
        for _ in 0..300 {
            if frame() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition never reached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn result_is_taken_exactly_once() {
        let backend = testing::backend_for("http://127.0.0.1:9");
        let mut slot = Some(backend.spawn(|_| async { Ok::<_, ApiError>(42) }));

        let mut results = Vec::new();
        testing::until(|| {
            if let Some(result) = take_ready(&mut slot) {
                results.push(result);
            }
            slot.is_none()
        })
        .await;

        assert_eq!(results, vec![Ok(42)]);
        assert!(take_ready(&mut slot).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panicking_request_reports_failure() {
        let backend = testing::backend_for("http://127.0.0.1:9");
        let mut slot = Some(backend.spawn(|_| async {
            if true {
                panic!("boom");
            }
            Ok::<(), ApiError>(())
        }));

        let mut outcome = None;
        testing::until(|| {
            if outcome.is_none() {
                outcome = take_ready(&mut slot);
            }
            outcome.is_some()
        })
        .await;
        assert!(matches!(outcome, Some(Err(ApiError::Transport(_)))));
    }
}
