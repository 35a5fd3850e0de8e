use std::time::Duration;

pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_millis(30_000);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Configuration of a single coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions<T> {
    /// How long a successful result is served without asking the backend.
    pub cache_duration: Duration,
    /// Quiet period before a debounced fetch fires.
    pub debounce: Duration,
    /// Value of `data` before the first success and after a cache clear.
    pub initial_data: Option<T>,
    /// Whether `mount` and dependency changes trigger a fetch.
    pub auto_fetch_on_mount: bool,
}

impl<T> Default for CoordinatorOptions<T> {
    fn default() -> Self {
        Self {
            cache_duration: DEFAULT_CACHE_DURATION,
            debounce: DEFAULT_DEBOUNCE,
            initial_data: None,
            auto_fetch_on_mount: true,
        }
    }
}

impl<T> CoordinatorOptions<T> {
    pub fn cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn debounce(mut self, duration: Duration) -> Self {
        self.debounce = duration;
        self
    }

    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn auto_fetch_on_mount(mut self, enabled: bool) -> Self {
        self.auto_fetch_on_mount = enabled;
        self
    }
}
