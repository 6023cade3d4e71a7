//! Bounded TTL memoization in front of any collaborator.
//!
//! Only successful answers are remembered, so a transient failure is retried
//! on the next call. Each method keeps at most `capacity` answers; expired
//! and surplus entries are evicted by the cache itself.

use async_trait::async_trait;
use kgseed_core::{
    CollaboratorResult, CrossReference, EncyclopediaPage, EncyclopediaSearch, EntityRecognizer,
    EntitySearch, ImageSource, Mention, SchemaType, SearchHit, TypeLookup, TypeSet, WebDetector,
    WebLabel,
};
use moka::sync::Cache;
use std::collections::BTreeSet;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

struct TtlCache<K, V> {
    /// Zero disables caching.
    ttl: Duration,
    entries: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn new(ttl: Duration, capacity: u64) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            ttl,
            entries: builder.build(),
        }
    }

    async fn get_or_fetch<F>(&self, key: K, fetch: F) -> CollaboratorResult<V>
    where
        F: Future<Output = CollaboratorResult<V>>,
    {
        if self.ttl.is_zero() {
            return fetch.await;
        }
        if let Some(value) = self.entries.get(&key) {
            return Ok(value);
        }
        let value = fetch.await?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }
}

type SearchKey = (String, Option<TypeSet>, Option<usize>);

/// Wraps a collaborator and remembers up to `capacity` successful answers
/// per method for `ttl`.
pub struct Memoized<C> {
    inner: C,
    search: TtlCache<SearchKey, Vec<SearchHit>>,
    cross_reference: TtlCache<String, Option<String>>,
    types: TtlCache<String, TypeSet>,
    canonical_types: TtlCache<String, TypeSet>,
    text_mentions: TtlCache<String, Vec<Mention>>,
    url_mentions: TtlCache<String, Vec<Mention>>,
    web_labels: TtlCache<ImageSource, Vec<WebLabel>>,
    encyclopedia: TtlCache<String, Vec<EncyclopediaPage>>,
}

impl<C> Memoized<C> {
    pub fn new(inner: C, ttl: Duration, capacity: u64) -> Self {
        Self {
            inner,
            search: TtlCache::new(ttl, capacity),
            cross_reference: TtlCache::new(ttl, capacity),
            types: TtlCache::new(ttl, capacity),
            canonical_types: TtlCache::new(ttl, capacity),
            text_mentions: TtlCache::new(ttl, capacity),
            url_mentions: TtlCache::new(ttl, capacity),
            web_labels: TtlCache::new(ttl, capacity),
            encyclopedia: TtlCache::new(ttl, capacity),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of live answers across all methods, after pending evictions.
    pub fn cached_entries(&self) -> usize {
        self.search.len()
            + self.cross_reference.len()
            + self.types.len()
            + self.canonical_types.len()
            + self.text_mentions.len()
            + self.url_mentions.len()
            + self.web_labels.len()
            + self.encyclopedia.len()
    }
}

#[async_trait]
impl<C: EntitySearch> EntitySearch for Memoized<C> {
    async fn search(
        &self,
        query: &str,
        types: Option<&BTreeSet<SchemaType>>,
        limit: Option<usize>,
    ) -> CollaboratorResult<Vec<SearchHit>> {
        let key = (query.to_string(), types.cloned(), limit);
        self.search
            .get_or_fetch(key, self.inner.search(query, types, limit))
            .await
    }
}

#[async_trait]
impl<C: CrossReference> CrossReference for Memoized<C> {
    async fn lookup(&self, article_uri: &str) -> CollaboratorResult<Option<String>> {
        self.cross_reference
            .get_or_fetch(article_uri.to_string(), self.inner.lookup(article_uri))
            .await
    }
}

#[async_trait]
impl<C: TypeLookup> TypeLookup for Memoized<C> {
    async fn types_of(&self, linked_data_uri: &str) -> CollaboratorResult<TypeSet> {
        self.types
            .get_or_fetch(linked_data_uri.to_string(), self.inner.types_of(linked_data_uri))
            .await
    }

    async fn canonical_types(&self, canonical_id: &str) -> CollaboratorResult<TypeSet> {
        self.canonical_types
            .get_or_fetch(
                canonical_id.to_string(),
                self.inner.canonical_types(canonical_id),
            )
            .await
    }
}

#[async_trait]
impl<C: EntityRecognizer> EntityRecognizer for Memoized<C> {
    async fn recognize_text(&self, text: &str) -> CollaboratorResult<Vec<Mention>> {
        self.text_mentions
            .get_or_fetch(text.to_string(), self.inner.recognize_text(text))
            .await
    }

    async fn recognize_url(&self, url: &str) -> CollaboratorResult<Vec<Mention>> {
        self.url_mentions
            .get_or_fetch(url.to_string(), self.inner.recognize_url(url))
            .await
    }
}

#[async_trait]
impl<C: WebDetector> WebDetector for Memoized<C> {
    async fn detect(&self, image: &ImageSource) -> CollaboratorResult<Vec<WebLabel>> {
        self.web_labels
            .get_or_fetch(image.clone(), self.inner.detect(image))
            .await
    }
}

#[async_trait]
impl<C: EncyclopediaSearch> EncyclopediaSearch for Memoized<C> {
    async fn search(&self, text: &str) -> CollaboratorResult<Vec<EncyclopediaPage>> {
        self.encyclopedia
            .get_or_fetch(text.to_string(), EncyclopediaSearch::search(&self.inner, text))
            .await
    }
}
