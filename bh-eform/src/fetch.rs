// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Retrieval of remote form resources.
//!
//! * [`ReqwestFetcher`] performs a single blocking HTTP GET per resource.
//! * [`CachingFetcher`] memoizes the bodies fetched by another [`ResourceFetcher`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use reqwest::{
    blocking::{Client, ClientBuilder},
    StatusCode,
};

/// Default lifetime of a [`CachingFetcher`] entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Interface providing the functionality of fetching a remote resource by URL.
///
/// The abstraction allows the embedding application to restrict the reachable hosts, or to serve
/// the resources from a local mirror.
pub trait ResourceFetcher {
    /// Error type used by this trait.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Fetches the body of the resource at `url`.
    ///
    /// Returns `Ok(None)` when the resource does not exist or is empty, and `Err` when the
    /// transport failed.
    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, Self::Err>;
}

impl<F: ResourceFetcher + ?Sized> ResourceFetcher for &F {
    type Err = F::Err;

    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, Self::Err> {
        (**self).fetch(url)
    }
}

impl<F: ResourceFetcher + ?Sized> ResourceFetcher for Arc<F> {
    type Err = F::Err;

    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, Self::Err> {
        (**self).fetch(url)
    }
}

/// [`ResourceFetcher`] implementation using the blocking [`reqwest`] client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher(Client);

impl ReqwestFetcher {
    /// Construct [`ReqwestFetcher`] from [`Client`].
    pub fn new(client: Client) -> Self {
        Self(client)
    }

    /// Construct [`ReqwestFetcher`] from [`ClientBuilder`].
    pub fn from_builder(builder: ClientBuilder) -> reqwest::Result<Self> {
        Ok(Self(builder.build()?))
    }
}

impl ResourceFetcher for ReqwestFetcher {
    type Err = reqwest::Error;

    fn fetch(&self, url: &str) -> reqwest::Result<Option<Vec<u8>>> {
        let response = self.0.get(url).send()?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(url, "resource not found");
            return Ok(None);
        }

        let body = response.error_for_status()?.bytes()?;
        if body.is_empty() {
            return Ok(None);
        }

        Ok(Some(body.to_vec()))
    }
}

/// [`ResourceFetcher`] that remembers the bodies returned by the wrapped fetcher for a limited
/// time.
///
/// Only found resources are cached; misses and transport failures are retried on the next call.
pub struct CachingFetcher<F> {
    inner: F,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Vec<u8>)>>,
}

impl<F: ResourceFetcher> CachingFetcher<F> {
    /// Wraps `inner` with the [`DEFAULT_CACHE_TTL`].
    pub fn new(inner: F) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    /// Wraps `inner`, keeping entries for `ttl`.
    pub fn with_ttl(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> Option<MutexGuard<'_, HashMap<String, (Instant, Vec<u8>)>>> {
        match self.entries.lock() {
            Ok(entries) => Some(entries),
            Err(_) => {
                tracing::warn!("resource cache lock is poisoned, bypassing the cache");
                None
            }
        }
    }

    fn cached(&self, url: &str) -> Option<Vec<u8>> {
        self.entries()?
            .get(url)
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, body)| body.clone())
    }

    fn store(&self, url: &str, body: &[u8]) {
        let Some(mut entries) = self.entries() else {
            return;
        };
        entries.retain(|_, (fetched_at, _)| fetched_at.elapsed() < self.ttl);
        entries.insert(url.to_owned(), (Instant::now(), body.to_vec()));
    }

    #[cfg(test)]
    fn cached_urls(&self) -> usize {
        self.entries().map_or(0, |entries| entries.len())
    }
}

impl<F: ResourceFetcher> ResourceFetcher for CachingFetcher<F> {
    type Err = F::Err;

    fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, Self::Err> {
        if let Some(body) = self.cached(url) {
            tracing::debug!(url, "serving resource from cache");
            return Ok(Some(body));
        }

        let body = self.inner.fetch(url)?;

        if let Some(body) = &body {
            self.store(url, body);
        }

        Ok(body)
    }
}
