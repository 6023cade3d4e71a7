//! Minimal SPARQL 1.1 SELECT client over the JSON results format.

use crate::http::send_json;
use kgseed_core::CollaboratorResult;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

/// One result row: variable name → bound value.
pub type Bindings = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct SparqlClient {
    client: Client,
    endpoint: String,
}

impl SparqlClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub async fn select(&self, query: &str) -> CollaboratorResult<Vec<Bindings>> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header(reqwest::header::ACCEPT, "application/sparql-results+json");
        let results: SelectResults = send_json("sparql", request).await?;
        Ok(results.rows())
    }
}

#[derive(Debug, Deserialize)]
struct SelectResults {
    #[serde(default)]
    results: ResultRows,
}

#[derive(Debug, Default, Deserialize)]
struct ResultRows {
    #[serde(default)]
    bindings: Vec<HashMap<String, Term>>,
}

#[derive(Debug, Deserialize)]
struct Term {
    value: String,
}

impl SelectResults {
    fn rows(self) -> Vec<Bindings> {
        self.results
            .bindings
            .into_iter()
            .map(|row| row.into_iter().map(|(var, term)| (var, term.value)).collect())
            .collect()
    }
}

/// Write `iri` as a SPARQL IRI reference, percent-encoding the characters
/// IRIREF forbids.
pub fn iri_ref(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len() + 2);
    out.push('<');
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                out.push_str(&urlencoding::encode(c.encode_utf8(&mut [0; 4])));
            }
            c if c <= ' ' => out.push_str(&urlencoding::encode(c.encode_utf8(&mut [0; 4]))),
            c => out.push(c),
        }
    }
    out.push('>');
    out
}
