//! Boundary-level selection: score floor, best-only window, per-type
//! deduplication and the result cap.

use crate::links::trailing_segment;
use crate::policy::ResolverPolicy;
use crate::types::{EnrichedCandidate, ResultSet, SchemaType};

/// Slack for comparisons against the band edge, so that e.g. 0.95 - 0.90
/// counts as "within 0.05".
const BAND_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub score_floor: f64,
    pub best_only: bool,
    pub band: f64,
    /// Maximum number of distinct candidates in the result.
    pub limit: Option<usize>,
}

impl AggregateOptions {
    pub fn from_policy(policy: &ResolverPolicy, best_only: bool, limit: Option<usize>) -> Self {
        Self {
            score_floor: policy.score_floor,
            best_only,
            band: policy.best_band,
            limit,
        }
    }
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self::from_policy(&ResolverPolicy::default(), false, None)
    }
}

/// Bucket `enriched` by type. Input order is significant: it decides which of
/// two duplicates survives and who makes the cap.
pub fn aggregate(enriched: Vec<EnrichedCandidate>, options: &AggregateOptions) -> ResultSet {
    let above_floor = enriched
        .into_iter()
        .filter(|c| c.score.value() >= options.score_floor);

    let selected: Vec<EnrichedCandidate> = if options.best_only {
        let mut window = BestWindow::new(options.band);
        for candidate in above_floor {
            window.offer(candidate);
        }
        window.finish()
    } else {
        above_floor.collect()
    };

    populate(selected, options.limit)
}

/// Running best-score window over one stream.
struct BestWindow {
    band: f64,
    best: Option<f64>,
    accepted: Vec<EnrichedCandidate>,
}

impl BestWindow {
    fn new(band: f64) -> Self {
        Self {
            band,
            best: None,
            accepted: Vec::new(),
        }
    }

    fn offer(&mut self, candidate: EnrichedCandidate) {
        let score = candidate.score.value();
        let Some(best) = self.best else {
            self.best = Some(score);
            self.accepted.push(candidate);
            return;
        };

        if score - best > self.band + BAND_EPSILON {
            self.accepted.clear();
            self.best = Some(score);
            self.accepted.push(candidate);
        } else if best - score <= self.band + BAND_EPSILON {
            if score > best {
                self.best = Some(score);
            }
            self.accepted.push(candidate);
        }
    }

    /// Drop anything the final best left behind.
    fn finish(self) -> Vec<EnrichedCandidate> {
        let Some(best) = self.best else {
            return Vec::new();
        };
        let band = self.band;
        self.accepted
            .into_iter()
            .filter(|c| best - c.score.value() <= band + BAND_EPSILON)
            .collect()
    }
}

fn populate(selected: Vec<EnrichedCandidate>, limit: Option<usize>) -> ResultSet {
    let mut result = ResultSet::new();
    let mut accepted = 0usize;

    for candidate in selected {
        if limit.is_some_and(|max| accepted >= max) {
            break;
        }

        let types: Vec<SchemaType> = if candidate.types.is_empty() {
            vec![SchemaType::thing()]
        } else {
            candidate.types.iter().cloned().collect()
        };

        let mut landed = false;
        for ty in types {
            let bucket = result.entry(ty).or_default();
            if bucket.iter().any(|seen| same_entity(seen, &candidate)) {
                continue;
            }
            bucket.push(candidate.clone());
            landed = true;
        }
        if landed {
            accepted += 1;
        }
    }

    result.retain(|_, bucket| !bucket.is_empty());
    result
}

/// Two seeds are the same entity if they share a canonical id or point at the
/// same encyclopedia article.
fn same_entity(a: &EnrichedCandidate, b: &EnrichedCandidate) -> bool {
    if let (Some(x), Some(y)) = (&a.canonical_id, &b.canonical_id) {
        if x == y {
            return true;
        }
    }
    match (
        trailing_segment(&a.encyclopedia_uri),
        trailing_segment(&b.encyclopedia_uri),
    ) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{type_set, Score};

    fn seed(name: &str, score: f64, types: &[&str], id: Option<&str>) -> EnrichedCandidate {
        let uri = format!("https://en.wikipedia.org/wiki/{}", name.replace(' ', "_"));
        EnrichedCandidate {
            uri: uri.clone(),
            name: name.to_string(),
            types: type_set(types.iter().copied()),
            score: Score::from_unit(score),
            canonical_id: id.map(str::to_string),
            linked_data_uri: crate::links::linked_data_uri(&uri),
            encyclopedia_uri: uri,
        }
    }

    fn scores(result: &ResultSet, ty: &str) -> Vec<f64> {
        result[&SchemaType::new(ty)]
            .iter()
            .map(|c| c.score.value())
            .collect()
    }

    #[test]
    fn explodes_into_one_bucket_per_type() {
        let result = aggregate(
            vec![seed("Madrid", 1.0, &["City", "Place"], Some("Q2807"))],
            &AggregateOptions::default(),
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result[&SchemaType::new("City")][0].name, "Madrid");
        assert_eq!(result[&SchemaType::new("Place")][0].name, "Madrid");
    }

    #[test]
    fn floor_drops_weak_seeds() {
        let result = aggregate(
            vec![
                seed("Madrid", 0.8, &["City"], None),
                seed("Madridejos", 0.09, &["City"], None),
            ],
            &AggregateOptions::default(),
        );
        assert_eq!(scores(&result, "City"), vec![0.8]);
    }

    #[test]
    fn same_seed_twice_lands_once_per_bucket() {
        let madrid = seed("Madrid", 1.0, &["City", "Place"], Some("Q2807"));
        let result = aggregate(vec![madrid.clone(), madrid], &AggregateOptions::default());
        assert_eq!(result[&SchemaType::new("City")].len(), 1);
        assert_eq!(result[&SchemaType::new("Place")].len(), 1);
    }

    #[test]
    fn shared_article_segment_is_a_duplicate() {
        let mut es = seed("Torre Eiffel", 0.7, &["Place"], None);
        es.encyclopedia_uri = "https://es.wikipedia.org/wiki/Eiffel_Tower?x=1".into();
        let en = seed("Eiffel Tower", 0.9, &["Place"], None);
        let result = aggregate(vec![en, es], &AggregateOptions::default());
        let bucket = &result[&SchemaType::new("Place")];
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].name, "Eiffel Tower");
    }

    #[test]
    fn article_segment_comparison_is_case_sensitive() {
        let a = seed("Apple", 0.9, &["Thing"], None);
        let b = seed("apple", 0.8, &["Thing"], None);
        let result = aggregate(vec![a, b], &AggregateOptions::default());
        assert_eq!(result[&SchemaType::thing()].len(), 2);
    }

    #[test]
    fn distinct_canonical_ids_with_distinct_articles_both_survive() {
        let result = aggregate(
            vec![
                seed("Paris", 0.9, &["City"], Some("Q90")),
                seed("Paris, Texas", 0.6, &["City"], Some("Q830149")),
            ],
            &AggregateOptions::default(),
        );
        assert_eq!(result[&SchemaType::new("City")].len(), 2);
    }

    #[test]
    fn best_only_keeps_a_tightening_window() {
        let input = vec![
            seed("A", 0.90, &["Thing"], None),
            seed("B", 0.95, &["Thing"], None),
            seed("C", 0.93, &["Thing"], None),
            seed("D", 0.80, &["Thing"], None),
        ];
        let options = AggregateOptions {
            best_only: true,
            ..Default::default()
        };
        let result = aggregate(input, &options);
        assert_eq!(scores(&result, "Thing"), vec![0.90, 0.95, 0.93]);
    }

    #[test]
    fn best_only_resets_on_a_clear_leader() {
        let input = vec![
            seed("A", 0.50, &["Thing"], None),
            seed("B", 0.52, &["Thing"], None),
            seed("C", 0.90, &["Thing"], None),
            seed("D", 0.87, &["Thing"], None),
            seed("E", 0.84, &["Thing"], None),
        ];
        let options = AggregateOptions {
            best_only: true,
            ..Default::default()
        };
        let result = aggregate(input, &options);
        assert_eq!(scores(&result, "Thing"), vec![0.90, 0.87]);
    }

    #[test]
    fn best_only_window_spans_all_types() {
        let input = vec![
            seed("Madrid", 0.95, &["City"], None),
            seed("Real Madrid", 0.60, &["SportsTeam"], None),
        ];
        let options = AggregateOptions {
            best_only: true,
            ..Default::default()
        };
        let result = aggregate(input, &options);
        assert!(result.contains_key(&SchemaType::new("City")));
        assert!(!result.contains_key(&SchemaType::new("SportsTeam")));
    }

    #[test]
    fn cap_counts_candidates_not_buckets() {
        let input = vec![
            seed("Madrid", 0.9, &["City", "Place"], None),
            seed("Barcelona", 0.8, &["City", "Place"], None),
            seed("Sevilla", 0.7, &["City", "Place"], None),
        ];
        let options = AggregateOptions {
            limit: Some(2),
            ..Default::default()
        };
        let result = aggregate(input, &options);
        assert_eq!(scores(&result, "City"), vec![0.9, 0.8]);
        assert_eq!(scores(&result, "Place"), vec![0.9, 0.8]);
    }

    #[test]
    fn duplicates_do_not_consume_the_cap() {
        let madrid = seed("Madrid", 0.9, &["City"], Some("Q2807"));
        let input = vec![madrid.clone(), madrid, seed("Toledo", 0.5, &["City"], None)];
        let options = AggregateOptions {
            limit: Some(2),
            ..Default::default()
        };
        let result = aggregate(input, &options);
        assert_eq!(scores(&result, "City"), vec![0.9, 0.5]);
    }

    #[test]
    fn untyped_seeds_fall_into_thing() {
        let result = aggregate(vec![seed("X", 0.5, &[], None)], &AggregateOptions::default());
        assert_eq!(result[&SchemaType::thing()].len(), 1);
    }
}
