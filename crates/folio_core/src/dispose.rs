//! Idempotent release handles
//!
//! Every registration in the animation core (trigger, tween, clock callback,
//! scroll listener) hands back a [`Disposer`]. Calling it more than once is a
//! no-op. A [`DisposeBag`] collects disposers and releases them in insertion
//! order, either explicitly or when the bag is dropped.

use std::fmt;
use std::sync::Mutex;

type DisposeFn = Box<dyn FnOnce() + Send>;

/// A once-only release action
pub struct Disposer {
    action: Mutex<Option<DisposeFn>>,
}

impl Disposer {
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// A disposer that releases nothing (missing targets, skipped features)
    pub fn noop() -> Self {
        Self {
            action: Mutex::new(None),
        }
    }

    /// Run the release action if it has not run yet
    pub fn dispose(&self) {
        let action = match self.action.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(action) = action {
            action();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.action.lock().map(|a| a.is_none()).unwrap_or(true)
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Ordered collection of disposers released together
#[derive(Debug, Default)]
pub struct DisposeBag {
    items: Vec<Disposer>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, disposer: Disposer) {
        self.items.push(disposer);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Release everything in insertion order
    pub fn dispose_all(&mut self) {
        for item in self.items.drain(..) {
            item.dispose();
        }
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_dispose_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let d = {
            let count = Arc::clone(&count);
            Disposer::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(!d.is_disposed());
        d.dispose();
        d.dispose();
        assert!(d.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_is_already_disposed() {
        let d = Disposer::noop();
        assert!(d.is_disposed());
        d.dispose();
    }

    #[test]
    fn test_bag_releases_in_order_on_drop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let mut bag = DisposeBag::new();
            for i in 0..3 {
                let log = Arc::clone(&log);
                bag.push(Disposer::new(move || log.lock().unwrap().push(i)));
            }
            assert_eq!(bag.len(), 3);
        }
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }
}
