//! Wikidata: canonical identifiers for encyclopedia articles and the
//! schema.org types of their class hierarchy.

use crate::sparql::{iri_ref, SparqlClient};
use async_trait::async_trait;
use kgseed_core::{CollaboratorResult, CrossReference, SchemaType, TypeSet};

const ENTITY_NAMESPACE: &str = "http://www.wikidata.org/entity/";

#[derive(Debug, Clone)]
pub struct WikidataCrossReference {
    sparql: SparqlClient,
}

impl WikidataCrossReference {
    pub fn new(sparql: SparqlClient) -> Self {
        Self { sparql }
    }

    async fn about(&self, article_uri: &str) -> CollaboratorResult<Option<String>> {
        let query = format!(
            "PREFIX schema: <http://schema.org/>\nSELECT ?item WHERE {{ {} schema:about ?item . }} LIMIT 1",
            iri_ref(&sitelink(article_uri))
        );
        let rows = self.sparql.select(&query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove("item"))
            .map(|item| item.trim_start_matches(ENTITY_NAMESPACE).to_string())
            .find(|id| !id.is_empty()))
    }

    /// schema.org equivalents of every class `canonical_id` is an instance of.
    pub async fn canonical_types(&self, canonical_id: &str) -> CollaboratorResult<TypeSet> {
        if !is_entity_id(canonical_id) {
            return Ok(TypeSet::new());
        }
        let query = format!(
            "PREFIX wd: <http://www.wikidata.org/entity/>\n\
             PREFIX wdt: <http://www.wikidata.org/prop/direct/>\n\
             SELECT DISTINCT ?wd WHERE {{ wd:{canonical_id} wdt:P31/wdt:P279* ?super . ?super wdt:P1709 ?wd }}"
        );
        let rows = self.sparql.select(&query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove("wd"))
            .filter(|iri| is_schema_org(iri))
            .map(SchemaType::new)
            .collect())
    }
}

#[async_trait]
impl CrossReference for WikidataCrossReference {
    async fn lookup(&self, article_uri: &str) -> CollaboratorResult<Option<String>> {
        if let Some(id) = self.about(article_uri).await? {
            tracing::debug!(article = %article_uri, id = %id, "cross-reference found");
            return Ok(Some(id));
        }
        // sitelinks are stored with https
        match article_uri.strip_prefix("http:") {
            Some(rest) => self.about(&format!("https:{rest}")).await,
            None => Ok(None),
        }
    }
}

pub(crate) fn is_schema_org(iri: &str) -> bool {
    iri.starts_with("http://schema.org/") || iri.starts_with("https://schema.org/")
}

fn is_entity_id(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('Q'))
        && id.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}

/// Article URL in the form Wikidata stores sitelinks: spaces as underscores,
/// the title escaped like MediaWiki's `wfUrlencode`.
pub fn sitelink(article_uri: &str) -> String {
    let Some((base, title)) = article_uri.split_once("/wiki/") else {
        return article_uri.to_string();
    };
    let mut out = format!("{base}/wiki/");
    for c in title.replace(' ', "_").chars() {
        if c.is_ascii_alphanumeric() || "-_.~;:@$!*(),/".contains(c) {
            out.push(c);
        } else {
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut [0; 4])));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sitelinks_follow_mediawiki_escaping() {
        assert_eq!(
            sitelink("https://en.wikipedia.org/wiki/Real Madrid C.F."),
            "https://en.wikipedia.org/wiki/Real_Madrid_C.F."
        );
        assert_eq!(
            sitelink("https://en.wikipedia.org/wiki/Château d'If"),
            "https://en.wikipedia.org/wiki/Ch%C3%A2teau_d%27If"
        );
        assert_eq!(
            sitelink("https://en.wikipedia.org/wiki/Mercury_(planet)"),
            "https://en.wikipedia.org/wiki/Mercury_(planet)"
        );
    }

    #[test]
    fn only_item_ids_are_queried() {
        assert!(is_entity_id("Q2807"));
        assert!(!is_entity_id("Q"));
        assert!(!is_entity_id("P31"));
        assert!(!is_entity_id("Q1 } DELETE"));
    }
}
