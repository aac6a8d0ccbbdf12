//! Busy flags gating re-entrant backend calls.

use tokio::sync::watch;

/// A boolean that is set for exactly the duration of one in-flight call.
///
/// Acquisition is a single check-and-set on the watch channel, so two
/// callers can never both observe the flag clear and proceed.
#[derive(Debug)]
pub(crate) struct BusyFlag {
    tx: watch::Sender<bool>,
}

impl BusyFlag {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub(crate) fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Set the flag if it is clear. The flag clears again when the guard drops.
    pub(crate) fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        let acquired = self.tx.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                true
            }
        });

        acquired.then(|| BusyGuard { flag: self })
    }
}

/// Clears its flag on drop, including when the owning future is dropped.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.tx.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_exclusive() {
        let flag = BusyFlag::new();
        assert!(!flag.is_set());

        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_set());
        assert!(flag.try_acquire().is_none());
        // A refused acquire must not release the holder's flag
        assert!(flag.is_set());

        drop(guard);
        assert!(!flag.is_set());
        assert!(flag.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let flag = BusyFlag::new();
        let mut rx = flag.subscribe();

        let guard = flag.try_acquire();
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        drop(guard);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
    }
}
