//! Lazily created, releasable resources.
//!
//! The `Resource` trait describes something expensive to build (an HTTP
//! connection pool, for instance) that should only be created on first use,
//! can be released explicitly, and is rebuilt transparently the next time it
//! is needed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A resource that can be initialized from a configuration and queried.
///
/// # Type Parameters
/// - `Config`: Configuration needed to initialize the resource
/// - `Error`: Error type for initialization failures
///
/// # Examples
///
/// ```rust
/// use double_o_core::resource::{LazyResource, Resource};
///
/// struct Session {
///     base_url: String,
/// }
///
/// impl Resource for Session {
///     type Config = String;
///     type Error = std::io::Error;
///
///     fn initialize(config: &Self::Config) -> Result<Self, Self::Error> {
///         Ok(Self { base_url: config.clone() })
///     }
/// }
///
/// let session: LazyResource<Session> = LazyResource::new("https://example.com".into());
/// assert!(!session.is_initialized());
///
/// let first = session.get()?;
/// assert_eq!(first.base_url, "https://example.com");
///
/// session.release();
/// let second = session.get()?; // rebuilt on demand
/// assert!(!std::sync::Arc::ptr_eq(&first, &second));
/// # Ok::<(), std::io::Error>(())
/// ```
pub trait Resource: Send + Sync + Sized {
    /// Configuration required to initialize this resource.
    type Config: Clone + Send + Sync;

    /// Error type for initialization failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build the resource from its configuration.
    ///
    /// Called on first access and again after every release.
    fn initialize(config: &Self::Config) -> Result<Self, Self::Error>;
}

/// A lazily-initialized [`Resource`] that can be released and recreated.
///
/// Clones share the same slot: a resource created through one clone is seen
/// by all of them, and releasing it through one clone releases it for all.
/// Callers that already hold an `Arc<R>` keep using it until they drop it.
pub struct LazyResource<R: Resource> {
    slot: Arc<Mutex<Option<Arc<R>>>>,
    config: R::Config,
}

impl<R: Resource> LazyResource<R> {
    /// Create a new lazy resource with the given configuration.
    pub fn new(config: R::Config) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            config,
        }
    }

    /// Get or initialize the resource.
    ///
    /// The first call (and the first call after [`release`](Self::release))
    /// initializes the resource. A failed initialization leaves the slot
    /// empty, so the next call tries again.
    pub fn get(&self) -> Result<Arc<R>, R::Error> {
        let mut slot = self.lock();
        if let Some(resource) = slot.as_ref() {
            return Ok(Arc::clone(resource));
        }
        let resource = Arc::new(R::initialize(&self.config)?);
        *slot = Some(Arc::clone(&resource));
        Ok(resource)
    }

    /// Drop the held resource, if any. Returns whether one was held.
    pub fn release(&self) -> bool {
        self.lock().take().is_some()
    }

    /// Check if the resource is currently initialized.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<R>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Resource> Clone for LazyResource<R> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct TestResource {
        value: i32,
    }

    #[derive(Clone)]
    struct TestConfig {
        value: i32,
        init_count: Arc<AtomicU32>,
        fail_first: bool,
    }

    impl TestConfig {
        fn new(value: i32) -> Self {
            Self {
                value,
                init_count: Arc::new(AtomicU32::new(0)),
                fail_first: false,
            }
        }
    }

    impl Resource for TestResource {
        type Config = TestConfig;
        type Error = io::Error;

        fn initialize(config: &Self::Config) -> Result<Self, Self::Error> {
            let previous = config.init_count.fetch_add(1, Ordering::SeqCst);
            if config.fail_first && previous == 0 {
                return Err(io::Error::other("first initialization fails"));
            }
            Ok(Self {
                value: config.value,
            })
        }
    }

    #[test]
    fn test_lazy_resource_initialization() {
        let config = TestConfig::new(42);
        let init_count = Arc::clone(&config.init_count);
        let resource = LazyResource::<TestResource>::new(config);

        assert!(!resource.is_initialized());
        assert_eq!(init_count.load(Ordering::SeqCst), 0);

        let instance = resource.get().unwrap();
        assert_eq!(instance.value, 42);
        assert!(resource.is_initialized());
        assert_eq!(init_count.load(Ordering::SeqCst), 1);

        // Second call returns same instance - init count should not increase
        let instance2 = resource.get().unwrap();
        assert!(Arc::ptr_eq(&instance, &instance2));
        assert_eq!(init_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_then_recreate() {
        let config = TestConfig::new(7);
        let init_count = Arc::clone(&config.init_count);
        let resource = LazyResource::<TestResource>::new(config);

        assert!(!resource.release(), "nothing to release yet");

        let first = resource.get().unwrap();
        assert!(resource.release());
        assert!(!resource.is_initialized());

        // Outstanding handles stay usable
        assert_eq!(first.value, 7);

        let second = resource.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(init_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_initialization_is_retried() {
        let mut config = TestConfig::new(1);
        config.fail_first = true;
        let resource = LazyResource::<TestResource>::new(config);

        assert!(resource.get().is_err());
        assert!(!resource.is_initialized());
        assert_eq!(resource.get().unwrap().value, 1);
    }

    #[test]
    fn test_lazy_resource_cloning() {
        let config = TestConfig::new(42);
        let init_count = Arc::clone(&config.init_count);
        let resource = LazyResource::<TestResource>::new(config);

        // Clone before initialization
        let cloned = resource.clone();
        assert!(!cloned.is_initialized());

        resource.get().unwrap();

        // Clone shares the same initialized resource
        assert!(cloned.is_initialized());
        cloned.get().unwrap();
        assert_eq!(init_count.load(Ordering::SeqCst), 1);

        // And the same release
        cloned.release();
        assert!(!resource.is_initialized());
    }
}
