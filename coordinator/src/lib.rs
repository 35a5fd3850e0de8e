//! Cached, de-duplicated remote reads.
//!
//! A [`Coordinator`] wraps one remote read function and gives its consumers a
//! stable `{ data, loading, error }` view of it:
//!
//! - results are cached for [`CoordinatorOptions::cache_duration`];
//! - concurrent non-forced calls share the request already in flight;
//! - a forced refresh cancels the request it supersedes, so a late answer
//!   never overwrites a newer one;
//! - failures are stored as a message next to the last good data instead of
//!   being returned to the caller.
//!
//! A [`MultiCoordinator`] issues several keyed reads together and settles all
//! of them before reporting.
//!
//! Remote reads return the raw JSON body. Envelopes (`{ "data": ... }`,
//! nested up to twice) are removed by [`payloads::envelope::normalize`]
//! before the payload is deserialized.
//!
//! # Example
//!
//! ```rust,ignore
//! let freights: Coordinator<Vec<Freight>, FreightFilters> = Coordinator::new(
//!     "freights",
//!     fetcher(move |filters: FreightFilters| {
//!         let api = api.clone();
//!         async move { api.list_freights_raw(&filters).await }
//!     }),
//!     CoordinatorOptions::default().initial_data(Vec::new()),
//! );
//! freights.mount(FreightFilters::default()).await;
//! let snapshot = freights.snapshot();
//! ```

mod cache;
mod error;
mod multi;
mod options;
mod single;

pub use cache::{CacheEntry, FetchOutcome};
pub use error::FetchError;
pub use multi::{FetchSpec, KeyState, MultiCoordinator, MultiSnapshot};
pub use options::{CoordinatorOptions, DEFAULT_CACHE_DURATION, DEFAULT_DEBOUNCE};
pub use single::{Coordinator, FetchSnapshot};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Future returned by a remote read.
pub type FetchFuture = BoxFuture<'static, Result<Value, FetchError>>;

/// A remote read taking arguments of type `A`.
pub type Fetcher<A> = Arc<dyn Fn(A) -> FetchFuture + Send + Sync>;

/// Box an async closure into a [`Fetcher`]. Any error convertible into
/// [`FetchError`] (such as [`payloads::ClientError`]) is accepted.
pub fn fetcher<A, F, Fut, E>(f: F) -> Fetcher<A>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
    E: Into<FetchError>,
{
    Arc::new(move |args| f(args).map(|r| r.map_err(Into::into)).boxed())
}
