use std::sync::{Arc, Mutex, OnceLock};

/// A shared, initialise-once handle for expensive model state.
///
/// Reads after initialisation are lock-free. The first callers race on the
/// fast-path check, then serialise on `init_lock` and check again, so the
/// initialiser runs at most once per successful initialisation and every
/// caller observes the same `Arc`. A failed initialisation leaves the cell
/// empty; the next caller retries.
pub struct ModelCell<T: ?Sized> {
    value: OnceLock<Arc<T>>,
    init_lock: Mutex<()>,
}

impl<T: ?Sized> ModelCell<T> {
    pub fn new() -> Self {
        Self {
            value: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Creates a cell that is already initialised.
    pub fn with_value(value: Arc<T>) -> Self {
        let cell = Self::new();
        let _ = cell.value.set(value);
        cell
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.value.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }

    /// Returns the shared value, running `init` if nobody has yet.
    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<Arc<T>, E>,
    {
        if let Some(value) = self.value.get() {
            return Ok(Arc::clone(value));
        }

        // A panic inside a previous initialiser poisons the lock but leaves
        // the cell empty, which is still a consistent state.
        let _guard = self.init_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(value) = self.value.get() {
            return Ok(Arc::clone(value));
        }

        let value = init()?;
        let _ = self.value.set(Arc::clone(&value));
        Ok(value)
    }
}

impl<T: ?Sized> Default for ModelCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for ModelCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCell")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_concurrent_first_access_initializes_once() {
        let cell = Arc::new(ModelCell::<String>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cell.get_or_try_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(20));
                        Ok::<_, ()>(Arc::new("bundle".to_string()))
                    })
                    .unwrap()
                })
            })
            .collect();

        let values: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for value in &values {
            assert!(Arc::ptr_eq(value, &values[0]));
        }
    }

    #[test]
    fn test_failed_init_is_retried() {
        let cell = ModelCell::<u32>::new();
        let first: Result<Arc<u32>, &str> = cell.get_or_try_init(|| Err("no corpus"));
        assert!(first.is_err());
        assert!(!cell.is_initialized());

        let second = cell.get_or_try_init(|| Ok::<_, &str>(Arc::new(7)));
        assert_eq!(*second.unwrap(), 7);
        assert!(cell.is_initialized());
    }

    #[test]
    fn test_preinitialized_cell_skips_init() {
        let cell = ModelCell::with_value(Arc::new(1u8));
        let value = cell
            .get_or_try_init(|| -> Result<Arc<u8>, ()> { panic!("must not run") })
            .unwrap();
        assert_eq!(*value, 1);
    }
}
