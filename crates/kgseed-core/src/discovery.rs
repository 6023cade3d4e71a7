//! Seed discovery: turning text, documents and images into root queries.

use crate::collaborators::Collaborators;
use crate::links::{linked_data_uri, normalize_article_uri};
use crate::policy::ResolverPolicy;
use crate::resolver::SeedQuery;
use crate::types::{Candidate, ImageSource, Mention, SchemaType, Score, TypeSet};
use futures::future::join_all;
use std::collections::BTreeMap;

/// Root queries to resolve plus candidates recognized directly in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPlan {
    pub queries: Vec<SeedQuery>,
    pub mentions: Vec<Candidate>,
}

impl SeedPlan {
    /// Plan `text` once per type, or once unfiltered when `types` is empty.
    pub fn push_resolution(&mut self, text: &str, types: &TypeSet) {
        if types.is_empty() {
            self.push_query(SeedQuery::root(text, None));
        } else {
            for ty in types {
                self.push_query(SeedQuery::root(text, Some(TypeSet::from([ty.clone()]))));
            }
        }
    }

    fn push_query(&mut self, query: SeedQuery) {
        if !self.queries.contains(&query) {
            self.queries.push(query);
        }
    }
}

pub struct Discovery<'a> {
    collaborators: &'a Collaborators,
    policy: &'a ResolverPolicy,
}

impl<'a> Discovery<'a> {
    pub fn new(collaborators: &'a Collaborators, policy: &'a ResolverPolicy) -> Self {
        Self {
            collaborators,
            policy,
        }
    }

    /// Free text: the text itself, every confident mention in it, and the
    /// encyclopedia types of each.
    pub async fn plan_text(&self, text: &str, caller_types: &TypeSet) -> SeedPlan {
        let mentions = match self.collaborators.recognizer.recognize_text(text).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(error = %err, "entity recognition failed");
                Vec::new()
            }
        };
        let mentions = self.confident_mentions(mentions);

        let mut texts = vec![text.to_string()];
        for mention in &mentions {
            if !texts.contains(&mention.name) {
                texts.push(mention.name.clone());
            }
        }
        self.plan_texts(texts, mentions, caller_types).await
    }

    /// Remote document: like text, minus the URL itself.
    pub async fn plan_url(&self, url: &str, caller_types: &TypeSet) -> SeedPlan {
        let mentions = match self.collaborators.recognizer.recognize_url(url).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "entity recognition failed");
                Vec::new()
            }
        };
        let mentions = self.confident_mentions(mentions);

        let mut texts: Vec<String> = Vec::new();
        for mention in &mentions {
            if !texts.contains(&mention.name) {
                texts.push(mention.name.clone());
            }
        }
        self.plan_texts(texts, mentions, caller_types).await
    }

    /// Web-detection labels scoring at or above the mean of the response.
    pub async fn image_labels(&self, image: &ImageSource) -> Vec<String> {
        let labels = match self.collaborators.web_detector.detect(image).await {
            Ok(labels) => labels,
            Err(err) => {
                tracing::warn!(error = %err, "web detection failed");
                return Vec::new();
            }
        };
        if labels.is_empty() {
            return Vec::new();
        }

        let mean = labels.iter().map(|l| l.score).sum::<f64>() / labels.len() as f64;
        let kept: Vec<String> = labels
            .into_iter()
            .filter(|l| l.score >= mean)
            .filter_map(|l| l.label)
            .filter(|l| !l.trim().is_empty())
            .collect();
        tracing::debug!(mean, kept = ?kept, "image labels");
        kept
    }

    /// Resolve each label through its encyclopedia types.
    pub async fn plan_image(&self, labels: &[String], caller_types: &TypeSet) -> SeedPlan {
        let lookups = labels
            .iter()
            .map(|label| self.discover_types(label.to_lowercase()));
        let per_label = join_all(lookups).await;

        let mut plan = SeedPlan::default();
        for (title, found) in pool_title_types(per_label, caller_types) {
            let types: TypeSet = caller_types.union(&found).cloned().collect();
            plan.push_resolution(&title, &types);
        }
        plan
    }

    /// Encyclopedia pages for `text` and the linked-data types of each.
    pub async fn discover_types(&self, text: String) -> BTreeMap<String, TypeSet> {
        let pages = match self.collaborators.encyclopedia.search(&text).await {
            Ok(pages) => pages,
            Err(err) => {
                tracing::warn!(text = %text, error = %err, "encyclopedia search failed");
                return BTreeMap::new();
            }
        };

        let lookups = pages
            .into_iter()
            .filter(|page| !page.title.contains("disambiguation"))
            .map(|page| async move {
                let resource = linked_data_uri(&page.url);
                match self.collaborators.types.types_of(&resource).await {
                    Ok(types) => (page.title, types),
                    Err(err) => {
                        tracing::warn!(resource = %resource, error = %err, "type lookup failed");
                        (page.title, TypeSet::new())
                    }
                }
            });

        let mut found = BTreeMap::new();
        for (title, types) in join_all(lookups).await {
            tracing::debug!(title = %title, types = ?types, "encyclopedia types");
            found.entry(title).or_insert(types);
        }
        found
    }

    async fn plan_texts(
        &self,
        texts: Vec<String>,
        mentions: Vec<Candidate>,
        caller_types: &TypeSet,
    ) -> SeedPlan {
        let discovered = join_all(texts.iter().map(|t| self.discover_types(t.clone()))).await;

        let mut plan = SeedPlan {
            queries: Vec::new(),
            mentions,
        };
        for (text, found) in texts.iter().zip(discovered) {
            plan.push_resolution(text, caller_types);
            for (title, types) in found {
                let types: TypeSet = caller_types.union(&types).cloned().collect();
                plan.push_resolution(&title, &types);
            }
        }
        plan
    }

    fn confident_mentions(&self, mentions: Vec<Mention>) -> Vec<Candidate> {
        let floor = self.policy.mention_confidence_floor;
        mentions
            .into_iter()
            .filter(|m| m.confidence > floor)
            .map(|m| Candidate {
                uri: normalize_article_uri(&m.uri),
                name: m.name,
                types: TypeSet::from([SchemaType::thing()]),
                score: Score::from_unit(m.confidence),
            })
            .collect()
    }
}

/// Pool the types of labels that land on the same encyclopedia title:
/// intersected when the caller restricted types, unioned otherwise.
fn pool_title_types(
    per_label: Vec<BTreeMap<String, TypeSet>>,
    caller_types: &TypeSet,
) -> Vec<(String, TypeSet)> {
    let restricted = !caller_types.is_empty();
    let mut pooled: Vec<(String, TypeSet)> = Vec::new();
    for found in per_label {
        for (title, types) in found {
            match pooled.iter_mut().find(|(t, _)| *t == title) {
                Some((_, existing)) => {
                    *existing = if restricted {
                        existing.intersection(&types).cloned().collect()
                    } else {
                        existing.union(&types).cloned().collect()
                    };
                }
                None => {
                    let first = if restricted {
                        types.intersection(caller_types).cloned().collect()
                    } else {
                        types
                    };
                    pooled.push((title, first));
                }
            }
        }
    }
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article, ScriptedCollaborators};
    use crate::types::{type_set, EncyclopediaPage, WebLabel};
    use std::sync::Arc;

    fn setup() -> (Arc<ScriptedCollaborators>, Collaborators, ResolverPolicy) {
        let fake = Arc::new(ScriptedCollaborators::new());
        let collaborators = Collaborators::uniform(fake.clone());
        (fake, collaborators, ResolverPolicy::default())
    }

    fn page(title: &str) -> EncyclopediaPage {
        EncyclopediaPage {
            title: title.to_string(),
            url: article(title),
        }
    }

    fn texts_of(plan: &SeedPlan) -> Vec<(String, Option<TypeSet>)> {
        plan.queries
            .iter()
            .map(|q| (q.text.clone(), q.filter.clone()))
            .collect()
    }

    #[test]
    fn typed_resolution_fans_out_per_type() {
        let mut plan = SeedPlan::default();
        plan.push_resolution("Madrid", &type_set(["City", "Place"]));
        plan.push_resolution("Madrid", &type_set(["City"]));
        plan.push_resolution("Madrid", &TypeSet::new());
        assert_eq!(plan.queries.len(), 3);
        assert_eq!(plan.queries[2].filter, None);
    }

    #[tokio::test]
    async fn image_keeps_labels_at_or_above_mean() {
        let (fake, collaborators, policy) = setup();
        fake.script_web_labels(vec![
            WebLabel { label: Some("Eiffel Tower".into()), score: 0.9 },
            WebLabel { label: Some("Paris".into()), score: 0.8 },
            WebLabel { label: Some("tourism".into()), score: 0.1 },
        ]);
        let discovery = Discovery::new(&collaborators, &policy);

        let labels = discovery
            .image_labels(&ImageSource::Remote("https://img.example/eiffel.jpg".into()))
            .await;

        assert_eq!(labels, vec!["Eiffel Tower", "Paris"]);
    }

    #[tokio::test]
    async fn image_without_labels_plans_nothing() {
        let (_fake, collaborators, policy) = setup();
        let discovery = Discovery::new(&collaborators, &policy);
        let labels = discovery.image_labels(&ImageSource::Bytes(vec![1, 2, 3])).await;
        assert!(labels.is_empty());
    }

    #[tokio::test]
    async fn image_types_union_without_caller_filter() {
        let (fake, collaborators, policy) = setup();
        fake.script_encyclopedia("eiffel tower", vec![page("Eiffel Tower")]);
        fake.script_encyclopedia("tour eiffel", vec![page("Eiffel Tower")]);
        fake.script_types(
            "http://dbpedia.org/resource/Eiffel_Tower",
            type_set(["LandmarksOrHistoricalBuildings", "Place"]),
        );
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery
            .plan_image(&["Eiffel Tower".into(), "Tour Eiffel".into()], &TypeSet::new())
            .await;

        assert_eq!(
            texts_of(&plan),
            vec![
                ("Eiffel Tower".to_string(), Some(type_set(["LandmarksOrHistoricalBuildings"]))),
                ("Eiffel Tower".to_string(), Some(type_set(["Place"]))),
            ]
        );
    }

    #[tokio::test]
    async fn image_types_intersect_with_caller_filter() {
        let (fake, collaborators, policy) = setup();
        fake.script_encyclopedia("paris", vec![page("Paris")]);
        fake.script_types("http://dbpedia.org/resource/Paris", type_set(["City", "Place"]));
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery
            .plan_image(&["Paris".into()], &type_set(["City"]))
            .await;

        assert_eq!(
            texts_of(&plan),
            vec![("Paris".to_string(), Some(type_set(["City"])))]
        );
    }

    #[tokio::test]
    async fn text_plans_input_mentions_and_their_types() {
        let (fake, collaborators, policy) = setup();
        fake.script_text_mentions(
            "Picasso painted in Madrid",
            vec![
                Mention { uri: article("Pablo Picasso"), name: "Pablo Picasso".into(), confidence: 0.9 },
                Mention { uri: article("Painting"), name: "Painting".into(), confidence: 0.3 },
            ],
        );
        fake.script_encyclopedia("Pablo Picasso", vec![page("Pablo Picasso")]);
        fake.script_types("http://dbpedia.org/resource/Pablo_Picasso", type_set(["Person"]));
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery
            .plan_text("Picasso painted in Madrid", &TypeSet::new())
            .await;

        assert_eq!(plan.mentions.len(), 1);
        assert_eq!(plan.mentions[0].name, "Pablo Picasso");
        assert!(plan.mentions[0].is_uncategorized());
        assert_eq!(
            texts_of(&plan),
            vec![
                ("Picasso painted in Madrid".to_string(), None),
                ("Pablo Picasso".to_string(), None),
                ("Pablo Picasso".to_string(), Some(type_set(["Person"]))),
            ]
        );
    }

    #[tokio::test]
    async fn url_never_queries_the_url_itself() {
        let (fake, collaborators, policy) = setup();
        fake.script_url_mentions(
            "https://news.example/article",
            vec![Mention { uri: article("Lisbon"), name: "Lisbon".into(), confidence: 0.8 }],
        );
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery
            .plan_url("https://news.example/article", &TypeSet::new())
            .await;

        assert_eq!(texts_of(&plan), vec![("Lisbon".to_string(), None)]);
        assert_eq!(plan.mentions.len(), 1);
    }

    #[tokio::test]
    async fn disambiguation_titles_are_skipped() {
        let (fake, collaborators, policy) = setup();
        fake.script_encyclopedia(
            "mercury",
            vec![page("Mercury (planet)"), page("Mercury (disambiguation)"), page("Mercury (element)")],
        );
        fake.script_types("http://dbpedia.org/resource/Mercury_(planet)", type_set(["Place"]));
        let discovery = Discovery::new(&collaborators, &policy);

        let found = discovery.discover_types("mercury".into()).await;

        assert_eq!(found.len(), 2);
        assert!(!found.keys().any(|t| t.contains("disambiguation")));
        assert_eq!(found["Mercury (planet)"], type_set(["Place"]));
        assert!(found["Mercury (element)"].is_empty());
    }

    #[tokio::test]
    async fn image_title_survives_failed_type_lookup() {
        let (fake, collaborators, policy) = setup();
        fake.script_encyclopedia("paris", vec![page("Paris")]);
        fake.fail_types("http://dbpedia.org/resource/Paris");
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery.plan_image(&["Paris".into()], &TypeSet::new()).await;

        assert_eq!(texts_of(&plan), vec![("Paris".to_string(), None)]);
    }

    #[tokio::test]
    async fn text_title_survives_failed_type_lookup() {
        let (fake, collaborators, policy) = setup();
        fake.script_encyclopedia("the French capital", vec![page("Paris")]);
        fake.fail_types("http://dbpedia.org/resource/Paris");
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery
            .plan_text("the French capital", &type_set(["City"]))
            .await;

        assert_eq!(
            texts_of(&plan),
            vec![
                ("the French capital".to_string(), Some(type_set(["City"]))),
                ("Paris".to_string(), Some(type_set(["City"]))),
            ]
        );
    }

    #[tokio::test]
    async fn failed_recognizer_still_plans_the_text() {
        let (fake, collaborators, policy) = setup();
        fake.fail_recognizer();
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery.plan_text("Madrid", &TypeSet::new()).await;

        assert!(plan.mentions.is_empty());
        assert_eq!(texts_of(&plan), vec![("Madrid".to_string(), None)]);
    }

    #[tokio::test]
    async fn failed_recognizer_leaves_a_url_with_nothing_to_plan() {
        let (fake, collaborators, policy) = setup();
        fake.script_url_mentions(
            "https://news.example/article",
            vec![Mention { uri: article("Lisbon"), name: "Lisbon".into(), confidence: 0.8 }],
        );
        fake.fail_recognizer();
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery
            .plan_url("https://news.example/article", &TypeSet::new())
            .await;

        assert_eq!(plan, SeedPlan::default());
    }

    #[test]
    fn shared_title_types_intersect_under_caller_filter() {
        let caller = type_set(["City", "Place"]);
        let per_label = vec![
            BTreeMap::from([("Paris".to_string(), type_set(["City", "Place", "Thing"]))]),
            BTreeMap::from([("Paris".to_string(), type_set(["City", "Museum"]))]),
        ];

        let pooled = pool_title_types(per_label, &caller);

        assert_eq!(pooled, vec![("Paris".to_string(), type_set(["City"]))]);
    }

    #[test]
    fn shared_title_types_union_without_caller_filter() {
        let per_label = vec![
            BTreeMap::from([("Paris".to_string(), type_set(["City"]))]),
            BTreeMap::from([
                ("Paris".to_string(), type_set(["Place"])),
                ("Louvre".to_string(), type_set(["Museum"])),
            ]),
        ];

        let pooled = pool_title_types(per_label, &TypeSet::new());

        assert_eq!(
            pooled,
            vec![
                ("Paris".to_string(), type_set(["City", "Place"])),
                ("Louvre".to_string(), type_set(["Museum"])),
            ]
        );
    }

    #[tokio::test]
    async fn labels_sharing_a_title_plan_it_once() {
        let (fake, collaborators, policy) = setup();
        fake.script_encyclopedia("paris", vec![page("Paris")]);
        fake.script_encyclopedia(
            "city of light",
            vec![EncyclopediaPage {
                title: "Paris".into(),
                url: article("Paris_France"),
            }],
        );
        fake.script_types("http://dbpedia.org/resource/Paris", type_set(["City", "Place"]));
        fake.script_types("http://dbpedia.org/resource/Paris_France", type_set(["City"]));
        let discovery = Discovery::new(&collaborators, &policy);

        let plan = discovery
            .plan_image(&["Paris".into(), "City of Light".into()], &type_set(["City"]))
            .await;

        assert_eq!(
            texts_of(&plan),
            vec![("Paris".to_string(), Some(type_set(["City"])))]
        );
    }
}
