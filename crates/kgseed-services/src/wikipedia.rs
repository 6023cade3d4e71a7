//! MediaWiki search with disambiguation expansion.

use crate::http::send_json;
use async_trait::async_trait;
use kgseed_core::{CollaboratorResult, EncyclopediaPage, EncyclopediaSearch};
use reqwest::Client;
use serde::Deserialize;

pub struct WikipediaSearch {
    client: Client,
    api: String,
}

impl WikipediaSearch {
    pub fn new(client: Client, api: impl Into<String>) -> Self {
        Self {
            client,
            api: api.into(),
        }
    }

    async fn top_title(&self, text: &str) -> CollaboratorResult<Option<String>> {
        let request = self.client.get(&self.api).query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", text),
            ("srlimit", "1"),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let response: SearchResponse = send_json("wikipedia", request).await?;
        Ok(response.query.search.into_iter().next().map(|hit| hit.title))
    }

    async fn page(&self, title: &str) -> CollaboratorResult<Option<PageInfo>> {
        let request = self.client.get(&self.api).query(&[
            ("action", "query"),
            ("prop", "info|pageprops|links"),
            ("inprop", "url"),
            ("ppprop", "disambiguation"),
            ("plnamespace", "0"),
            ("pllimit", "max"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let response: PageResponse = send_json("wikipedia", request).await?;
        Ok(response.query.pages.into_iter().find(|p| !p.missing))
    }
}

#[async_trait]
impl EncyclopediaSearch for WikipediaSearch {
    async fn search(&self, text: &str) -> CollaboratorResult<Vec<EncyclopediaPage>> {
        let Some(title) = self.top_title(text).await? else {
            return Ok(Vec::new());
        };
        let Some(page) = self.page(&title).await? else {
            return Ok(Vec::new());
        };
        Ok(page.into_pages())
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: SearchQuery,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    query: PageQuery,
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    title: String,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    pageprops: Option<PageProps>,
    #[serde(default)]
    links: Vec<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(default)]
    disambiguation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    #[serde(default)]
    ns: i64,
    title: String,
}

impl PageInfo {
    fn is_disambiguation(&self) -> bool {
        self.pageprops
            .as_ref()
            .is_some_and(|p| p.disambiguation.is_some())
    }

    /// The page itself, or for a disambiguation page every article it lists.
    fn into_pages(self) -> Vec<EncyclopediaPage> {
        let Some(url) = self.fullurl.clone() else {
            return Vec::new();
        };
        if !self.is_disambiguation() {
            return vec![EncyclopediaPage {
                title: self.title,
                url,
            }];
        }

        let base = match url.split_once("/wiki/") {
            Some((base, _)) => base.to_string(),
            None => return Vec::new(),
        };
        self.links
            .into_iter()
            .filter(|link| link.ns == 0 && !link.title.contains("disambiguation"))
            .map(|link| EncyclopediaPage {
                url: format!("{base}/wiki/{}", link.title.replace(' ', "_")),
                title: link.title,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_page_is_returned_as_is() {
        let body = r#"{"query": {"pages": [{
            "pageid": 41188, "ns": 0, "title": "Madrid",
            "fullurl": "https://en.wikipedia.org/wiki/Madrid",
            "links": [{"ns": 0, "title": "Spain"}]
        }]}}"#;
        let page = serde_json::from_str::<PageResponse>(body)
            .unwrap()
            .query
            .pages
            .remove(0);
        assert_eq!(
            page.into_pages(),
            vec![EncyclopediaPage {
                title: "Madrid".into(),
                url: "https://en.wikipedia.org/wiki/Madrid".into()
            }]
        );
    }

    #[test]
    fn disambiguation_expands_to_listed_articles() {
        let body = r#"{"query": {"pages": [{
            "title": "Mercury",
            "fullurl": "https://en.wikipedia.org/wiki/Mercury",
            "pageprops": {"disambiguation": ""},
            "links": [
                {"ns": 0, "title": "Mercury (planet)"},
                {"ns": 0, "title": "Mercury (element)"},
                {"ns": 0, "title": "Mercury (disambiguation)"},
                {"ns": 14, "title": "Category:Disambiguation pages"}
            ]
        }]}}"#;
        let page = serde_json::from_str::<PageResponse>(body)
            .unwrap()
            .query
            .pages
            .remove(0);
        let pages = page.into_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].url, "https://en.wikipedia.org/wiki/Mercury_(planet)");
    }

    #[test]
    fn search_without_hits_is_empty() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"batchcomplete": true, "query": {"search": []}}"#).unwrap();
        assert!(response.query.search.is_empty());
    }
}
