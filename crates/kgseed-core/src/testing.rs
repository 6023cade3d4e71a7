//! Scripted in-memory collaborators.
//!
//! Every role answers from a table filled in by the test. Anything not
//! scripted answers with an empty success, so tests only describe the calls
//! they care about.

use crate::collaborators::{
    CrossReference, EncyclopediaSearch, EntityRecognizer, EntitySearch, TypeLookup, WebDetector,
};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::types::{
    EncyclopediaPage, ImageSource, Mention, RawScore, SchemaType, SearchHit, TypeSet, WebLabel,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};

/// English encyclopedia article URL for `name`.
pub fn article(name: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", name.replace(' ', "_"))
}

/// A search row for the article named `name`.
pub fn hit(name: &str, ty: &str, raw: f64) -> SearchHit {
    SearchHit {
        uri: article(name),
        schema_type: SchemaType::new(ty),
        raw_score: RawScore(raw),
        name: name.to_string(),
    }
}

type SearchKey = (String, Option<TypeSet>);

#[derive(Default)]
struct Script {
    search: HashMap<SearchKey, Vec<SearchHit>>,
    failing_search: HashSet<String>,
    failing_filtered_search: HashSet<SearchKey>,
    panicking_search: HashSet<SearchKey>,
    search_log: Vec<SearchKey>,

    types: HashMap<String, TypeSet>,
    failing_types: HashSet<String>,

    cross_reference: HashMap<String, String>,
    failing_cross_reference: HashSet<String>,
    cross_reference_log: Vec<String>,
    canonical_types: HashMap<String, TypeSet>,

    text_mentions: HashMap<String, Vec<Mention>>,
    url_mentions: HashMap<String, Vec<Mention>>,
    failing_recognizer: bool,

    web_labels: Vec<WebLabel>,
    failing_web_detection: bool,

    encyclopedia: HashMap<String, Vec<EncyclopediaPage>>,
}

#[derive(Default)]
pub struct ScriptedCollaborators {
    script: Mutex<Script>,
}

impl ScriptedCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Entity search
    // ------------------------------------------------------------------

    pub fn script_search(&self, query: &str, filter: Option<TypeSet>, hits: Vec<SearchHit>) {
        self.script
            .lock()
            .search
            .insert((query.to_string(), filter), hits);
    }

    /// Every search for `query` fails, whatever the filter.
    pub fn fail_search(&self, query: &str) {
        self.script.lock().failing_search.insert(query.to_string());
    }

    pub fn fail_search_filtered(&self, query: &str, filter: TypeSet) {
        self.script
            .lock()
            .failing_filtered_search
            .insert((query.to_string(), Some(filter)));
    }

    pub fn panic_search(&self, query: &str, filter: Option<TypeSet>) {
        self.script
            .lock()
            .panicking_search
            .insert((query.to_string(), filter));
    }

    pub fn search_calls(&self) -> usize {
        self.script.lock().search_log.len()
    }

    /// Every search issued so far, in call order.
    pub fn searched_queries(&self) -> Vec<(String, Option<TypeSet>)> {
        self.script.lock().search_log.clone()
    }

    // ------------------------------------------------------------------
    // Types and cross-references
    // ------------------------------------------------------------------

    pub fn script_types(&self, linked_data_uri: &str, types: TypeSet) {
        self.script
            .lock()
            .types
            .insert(linked_data_uri.to_string(), types);
    }

    pub fn fail_types(&self, linked_data_uri: &str) {
        self.script
            .lock()
            .failing_types
            .insert(linked_data_uri.to_string());
    }

    pub fn script_cross_reference(&self, article_uri: &str, canonical_id: &str) {
        self.script
            .lock()
            .cross_reference
            .insert(article_uri.to_string(), canonical_id.to_string());
    }

    pub fn fail_cross_reference(&self, article_uri: &str) {
        self.script
            .lock()
            .failing_cross_reference
            .insert(article_uri.to_string());
    }

    pub fn cross_reference_calls(&self) -> Vec<String> {
        self.script.lock().cross_reference_log.clone()
    }

    pub fn script_canonical_types(&self, canonical_id: &str, types: TypeSet) {
        self.script
            .lock()
            .canonical_types
            .insert(canonical_id.to_string(), types);
    }

    // ------------------------------------------------------------------
    // Discovery collaborators
    // ------------------------------------------------------------------

    pub fn script_text_mentions(&self, text: &str, mentions: Vec<Mention>) {
        self.script
            .lock()
            .text_mentions
            .insert(text.to_string(), mentions);
    }

    pub fn script_url_mentions(&self, url: &str, mentions: Vec<Mention>) {
        self.script
            .lock()
            .url_mentions
            .insert(url.to_string(), mentions);
    }

    pub fn fail_recognizer(&self) {
        self.script.lock().failing_recognizer = true;
    }

    /// Labels returned for any image.
    pub fn script_web_labels(&self, labels: Vec<WebLabel>) {
        self.script.lock().web_labels = labels;
    }

    pub fn fail_web_detection(&self) {
        self.script.lock().failing_web_detection = true;
    }

    pub fn script_encyclopedia(&self, text: &str, pages: Vec<EncyclopediaPage>) {
        self.script
            .lock()
            .encyclopedia
            .insert(text.to_string(), pages);
    }
}

fn scripted_failure(what: &str) -> CollaboratorError {
    CollaboratorError::Unavailable(format!("scripted failure: {what}"))
}

#[async_trait]
impl EntitySearch for ScriptedCollaborators {
    async fn search(
        &self,
        query: &str,
        types: Option<&BTreeSet<SchemaType>>,
        limit: Option<usize>,
    ) -> CollaboratorResult<Vec<SearchHit>> {
        let key = (query.to_string(), types.cloned());
        let mut script = self.script.lock();
        script.search_log.push(key.clone());

        if script.panicking_search.contains(&key) {
            drop(script);
            panic!("scripted panic: {query}");
        }
        if script.failing_search.contains(query) || script.failing_filtered_search.contains(&key) {
            return Err(scripted_failure(query));
        }
        let mut hits = script.search.get(&key).cloned().unwrap_or_default();
        if let Some(max) = limit {
            hits.truncate(max);
        }
        Ok(hits)
    }
}

#[async_trait]
impl TypeLookup for ScriptedCollaborators {
    async fn types_of(&self, linked_data_uri: &str) -> CollaboratorResult<TypeSet> {
        let script = self.script.lock();
        if script.failing_types.contains(linked_data_uri) {
            return Err(scripted_failure(linked_data_uri));
        }
        Ok(script.types.get(linked_data_uri).cloned().unwrap_or_default())
    }

    async fn canonical_types(&self, canonical_id: &str) -> CollaboratorResult<TypeSet> {
        Ok(self
            .script
            .lock()
            .canonical_types
            .get(canonical_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl CrossReference for ScriptedCollaborators {
    async fn lookup(&self, article_uri: &str) -> CollaboratorResult<Option<String>> {
        let mut script = self.script.lock();
        script.cross_reference_log.push(article_uri.to_string());
        if script.failing_cross_reference.contains(article_uri) {
            return Err(scripted_failure(article_uri));
        }
        Ok(script.cross_reference.get(article_uri).cloned())
    }
}

#[async_trait]
impl EntityRecognizer for ScriptedCollaborators {
    async fn recognize_text(&self, text: &str) -> CollaboratorResult<Vec<Mention>> {
        let script = self.script.lock();
        if script.failing_recognizer {
            return Err(scripted_failure("recognizer"));
        }
        Ok(script.text_mentions.get(text).cloned().unwrap_or_default())
    }

    async fn recognize_url(&self, url: &str) -> CollaboratorResult<Vec<Mention>> {
        let script = self.script.lock();
        if script.failing_recognizer {
            return Err(scripted_failure("recognizer"));
        }
        Ok(script.url_mentions.get(url).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl WebDetector for ScriptedCollaborators {
    async fn detect(&self, _image: &ImageSource) -> CollaboratorResult<Vec<WebLabel>> {
        let script = self.script.lock();
        if script.failing_web_detection {
            return Err(scripted_failure("web detection"));
        }
        Ok(script.web_labels.clone())
    }
}

#[async_trait]
impl EncyclopediaSearch for ScriptedCollaborators {
    async fn search(&self, text: &str) -> CollaboratorResult<Vec<EncyclopediaPage>> {
        Ok(self
            .script
            .lock()
            .encyclopedia
            .get(text)
            .cloned()
            .unwrap_or_default())
    }
}
