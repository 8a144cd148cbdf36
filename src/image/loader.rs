//! Image loading with caching and request deduplication.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use super::{FileSource, ImageError, ImageSource, LoadOptions, LoadedImage, resolve_image_path};

/// One in-flight request that later callers for the same URL wait on.
#[derive(Debug, Default)]
struct Pending {
    result: Mutex<Option<LoadedImage>>,
    ready: Condvar,
}

impl Pending {
    fn publish(&self, image: LoadedImage) {
        *lock(&self.result) = Some(image);
        self.ready.notify_all();
    }

    fn wait(&self) -> LoadedImage {
        let mut guard = lock(&self.result);
        loop {
            if let Some(image) = guard.as_ref() {
                return image.clone();
            }
            guard = match self.ready.wait(guard) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}

struct Inner {
    source: Arc<dyn ImageSource>,
    cache: Mutex<HashMap<String, LoadedImage>>,
    in_flight: Mutex<HashMap<String, Arc<Pending>>>,
}

/// Image loader with caching.
///
/// Successful loads are cached by resolved URL until [`ImageLoader::clear_cache`].
/// Failures are never cached. Concurrent requests for one URL share a single
/// fetch. Clones share the cache.
///
/// A fetch that exceeds [`LoadOptions::timeout`] is reported as failed, but
/// its worker thread keeps running until the [`ImageSource`] returns, and its
/// late result is discarded. Sources that can block indefinitely should
/// bound their own work.
#[derive(Clone)]
pub struct ImageLoader {
    inner: Arc<Inner>,
}

impl ImageLoader {
    pub fn new(source: impl ImageSource + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                source: Arc::new(source),
                cache: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Load an image, blocking until it resolves, fails or times out.
    pub fn load(&self, src: &str, options: &LoadOptions) -> LoadedImage {
        let resolved = resolve_image_path(src, options.base_path.as_deref());

        if let Some(hit) = lock(&self.inner.cache).get(&resolved) {
            return hit.clone();
        }

        let (pending, leader) = {
            let mut in_flight = lock(&self.inner.in_flight);
            // A leader may have finished between the cache check and here.
            if let Some(hit) = lock(&self.inner.cache).get(&resolved) {
                return hit.clone();
            }
            match in_flight.get(&resolved) {
                Some(pending) => (Arc::clone(pending), false),
                None => {
                    let pending = Arc::new(Pending::default());
                    in_flight.insert(resolved.clone(), Arc::clone(&pending));
                    (pending, true)
                }
            }
        };
        if !leader {
            tracing::trace!(src = %resolved, "joining in-flight image load");
            return pending.wait();
        }

        let _scope = crate::perf::scope("image.load");
        let result = self.fetch(&resolved, options);
        if result.loaded {
            lock(&self.inner.cache).insert(resolved.clone(), result.clone());
        } else {
            tracing::debug!(src = %resolved, error = ?result.error, "image load failed");
        }
        pending.publish(result.clone());
        lock(&self.inner.in_flight).remove(&resolved);
        result
    }

    /// Load on a worker thread and hand the result to `on_done`.
    pub fn load_in_background(
        &self,
        src: &str,
        options: &LoadOptions,
        on_done: impl FnOnce(LoadedImage) + Send + 'static,
    ) {
        let loader = self.clone();
        let src = src.to_string();
        let options = options.clone();
        thread::spawn(move || on_done(loader.load(&src, &options)));
    }

    /// Load several images concurrently. Results follow the input order.
    pub fn preload(&self, srcs: &[&str], options: &LoadOptions) -> Vec<LoadedImage> {
        thread::scope(|scope| {
            let handles: Vec<_> = srcs
                .iter()
                .map(|src| scope.spawn(move || self.load(src, options)))
                .collect();
            handles
                .into_iter()
                .zip(srcs)
                .map(|(handle, src)| {
                    handle.join().unwrap_or_else(|_| {
                        let resolved = resolve_image_path(src, options.base_path.as_deref());
                        LoadedImage::failure(resolved, &ImageError::Aborted)
                    })
                })
                .collect()
        })
    }

    /// Whether a successful load for `src` is cached.
    pub fn is_cached(&self, src: &str, options: &LoadOptions) -> bool {
        self.cached(src, options).is_some()
    }

    /// The cached successful load for `src`, without fetching.
    pub fn cached(&self, src: &str, options: &LoadOptions) -> Option<LoadedImage> {
        let resolved = resolve_image_path(src, options.base_path.as_deref());
        lock(&self.inner.cache).get(&resolved).cloned()
    }

    /// Clear the image cache.
    pub fn clear_cache(&self) {
        lock(&self.inner.cache).clear();
    }

    /// Get the number of cached images.
    pub fn len(&self) -> usize {
        lock(&self.inner.cache).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fetch(&self, resolved: &str, options: &LoadOptions) -> LoadedImage {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.inner.source);
        let target = resolved.to_string();
        thread::spawn(move || {
            // The receiver is gone after a timeout; the late result is dropped.
            let _ = tx.send(source.fetch(&target));
        });
        match rx.recv_timeout(options.timeout) {
            Ok(Ok((width, height))) => LoadedImage::success(resolved, width, height),
            Ok(Err(err)) => LoadedImage::failure(resolved, &err),
            Err(RecvTimeoutError::Timeout) => {
                LoadedImage::failure(resolved, &ImageError::Timeout(options.timeout.as_millis()))
            }
            Err(RecvTimeoutError::Disconnected) => {
                LoadedImage::failure(resolved, &ImageError::Aborted)
            }
        }
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(FileSource)
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("cached", &self.len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    struct Scripted {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        fail: bool,
    }

    impl ImageSource for Scripted {
        fn fetch(&self, resolved: &str) -> Result<(u32, u32), ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if self.fail {
                Err(ImageError::Unsupported(resolved.to_string()))
            } else {
                Ok((640, 480))
            }
        }
    }

    fn scripted(delay_ms: u64, fail: bool) -> (ImageLoader, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = ImageLoader::new(Scripted {
            calls: Arc::clone(&calls),
            delay: Duration::from_millis(delay_ms),
            fail,
        });
        (loader, calls)
    }

    #[test]
    fn test_success_is_cached() {
        let (loader, calls) = scripted(0, false);
        let options = LoadOptions::default();
        let first = loader.load("a.png", &options);
        let second = loader.load("a.png", &options);
        assert!(first.loaded);
        assert_eq!((first.width, first.height), (640, 480));
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(loader.is_cached("a.png", &options));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let (loader, calls) = scripted(0, true);
        let options = LoadOptions::default();
        let result = loader.load("a.png", &options);
        assert!(!result.loaded);
        assert!(result.error.is_some());
        loader.load("a.png", &options);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(loader.is_empty());
    }

    #[test]
    fn test_timeout_reports_timeout() {
        let (loader, _) = scripted(500, false);
        let options = LoadOptions {
            timeout: Duration::from_millis(20),
            base_path: None,
        };
        let result = loader.load("slow.png", &options);
        assert!(!result.loaded);
        let error = result.error.unwrap();
        assert!(error.contains("timeout"), "got {error}");
        assert_eq!(error, "Image load timeout after 20ms");
    }

    #[test]
    fn test_concurrent_requests_share_one_fetch() {
        let (loader, calls) = scripted(150, false);
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let loader = loader.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    loader.load("shared.png", &LoadOptions::default())
                })
            })
            .collect();
        let results: Vec<LoadedImage> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|r| r.loaded));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_keyed_by_resolved_path() {
        let (loader, calls) = scripted(0, false);
        let options = LoadOptions {
            base_path: Some("/assets".into()),
            ..LoadOptions::default()
        };
        let result = loader.load("./img.png", &options);
        assert_eq!(result.src, "/assets/img.png");
        loader.load("img.png", &options);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preload_keeps_order() {
        let (loader, _) = scripted(10, false);
        let results = loader.preload(&["one.png", "two.png"], &LoadOptions::default());
        let srcs: Vec<&str> = results.iter().map(|r| r.src.as_str()).collect();
        assert_eq!(srcs, vec!["one.png", "two.png"]);
    }

    #[test]
    fn test_cached_does_not_fetch() {
        let (loader, calls) = scripted(0, false);
        let options = LoadOptions::default();
        assert_eq!(loader.cached("a.png", &options), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let loaded = loader.load("a.png", &options);
        assert_eq!(loader.cached("a.png", &options), Some(loaded));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_cache_forces_reload() {
        let (loader, calls) = scripted(0, false);
        let options = LoadOptions::default();
        loader.load("a.png", &options);
        loader.clear_cache();
        assert!(loader.is_empty());
        loader.load("a.png", &options);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_background_load_delivers_result() {
        let (loader, _) = scripted(0, false);
        let (tx, rx) = mpsc::channel();
        loader.load_in_background("bg.png", &LoadOptions::default(), move |image| {
            let _ = tx.send(image);
        });
        let image = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(image.loaded);
    }
}
