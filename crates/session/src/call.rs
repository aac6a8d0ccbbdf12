//! Deadline and cancellation around a single backend call.

use nexus_gateway::{GatewayError, GatewayResult};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tracks the cancellation token of the call currently in flight.
#[derive(Debug)]
pub(crate) struct InFlight {
    root: CancellationToken,
    current: Mutex<Option<CancellationToken>>,
}

impl InFlight {
    pub(crate) fn new(root: CancellationToken) -> Self {
        Self {
            root,
            current: Mutex::new(None),
        }
    }

    /// Register a new call. Cancelling the root also cancels the call.
    pub(crate) fn begin(&self) -> InFlightCall<'_> {
        let token = self.root.child_token();
        *self.slot() = Some(token.clone());
        InFlightCall { owner: self, token }
    }

    /// Cancel the call in flight, if any.
    pub(crate) fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle for one registered call; unregisters itself on drop.
pub(crate) struct InFlightCall<'a> {
    owner: &'a InFlight,
    token: CancellationToken,
}

impl InFlightCall<'_> {
    /// Run `call` under `deadline`, giving up early if cancelled.
    pub(crate) async fn run<T, F>(&self, deadline: Duration, call: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(GatewayError::Cancelled),
            outcome = tokio::time::timeout(deadline, call) => {
                outcome.unwrap_or(Err(GatewayError::Timeout(deadline)))
            }
        }
    }
}

impl Drop for InFlightCall<'_> {
    fn drop(&mut self) {
        self.owner.slot().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completed_call_passes_through() {
        let in_flight = InFlight::new(CancellationToken::new());
        let call = in_flight.begin();
        let outcome = call
            .run(Duration::from_secs(1), async { Ok::<_, GatewayError>(7) })
            .await;
        assert_eq!(outcome, Ok(7));
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let in_flight = InFlight::new(CancellationToken::new());
        let call = in_flight.begin();
        let deadline = Duration::from_millis(10);
        let outcome: GatewayResult<()> = call.run(deadline, std::future::pending()).await;
        assert_eq!(outcome, Err(GatewayError::Timeout(deadline)));
    }

    #[tokio::test]
    async fn test_cancel_before_completion() {
        let in_flight = InFlight::new(CancellationToken::new());
        let call = in_flight.begin();
        assert!(in_flight.cancel());

        let outcome: GatewayResult<()> =
            call.run(Duration::from_secs(5), std::future::pending()).await;
        assert_eq!(outcome, Err(GatewayError::Cancelled));
    }

    #[tokio::test]
    async fn test_root_cancellation_reaches_call() {
        let root = CancellationToken::new();
        let in_flight = InFlight::new(root.clone());
        let call = in_flight.begin();
        root.cancel();

        let outcome: GatewayResult<()> =
            call.run(Duration::from_secs(5), std::future::pending()).await;
        assert_eq!(outcome, Err(GatewayError::Cancelled));
    }

    #[test]
    fn test_cancel_without_call() {
        let in_flight = InFlight::new(CancellationToken::new());
        assert!(!in_flight.cancel());

        let call = in_flight.begin();
        drop(call);
        assert!(!in_flight.cancel());
    }
}
