//! Hotspot aggregation: whitelist filter, bucket by lower-cased title, rank by summed score.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::ingest::types::ScoredItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotBucket {
    pub keyword: String,
    pub hits: usize,
    /// Sorted distinct source names, comma-joined.
    pub sources: String,
    pub score_sum: f64,
}

/// Bucketing key for a title.
pub fn bucket_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Lower-cased, trimmed, non-empty whitelist terms.
fn prepare_terms(whitelist: &[String]) -> Vec<String> {
    whitelist
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// `lowered` must already be lower-cased; `terms` come from `prepare_terms`.
fn matches_terms(lowered: &str, terms: &[String]) -> bool {
    terms.iter().any(|w| lowered.contains(w.as_str()))
}

/// Case-insensitive substring match against any term ("coin" matches "bitcoin").
pub fn matches_whitelist(title: &str, whitelist: &[String]) -> bool {
    matches_terms(&title.to_lowercase(), &prepare_terms(whitelist))
}

/// Rank buckets by `(score_sum, hits)` descending; ties keep first-encounter order.
pub fn aggregate(items: &[ScoredItem], whitelist: &[String]) -> Vec<HotspotBucket> {
    let terms = prepare_terms(whitelist);
    if terms.is_empty() {
        return Vec::new();
    }

    struct Acc<'a> {
        keyword: String,
        hits: usize,
        sources: BTreeSet<&'a str>,
        score_sum: f64,
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut accs: Vec<Acc<'_>> = Vec::new();

    for it in items {
        let title = it.item.title.to_lowercase();
        if !matches_terms(&title, &terms) {
            continue;
        }
        let key = bucket_key(&title);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            accs.push(Acc {
                keyword: key,
                hits: 0,
                sources: BTreeSet::new(),
                score_sum: 0.0,
            });
            accs.len() - 1
        });
        let acc = &mut accs[slot];
        acc.hits += 1;
        acc.sources.insert(it.item.source.as_str());
        acc.score_sum += it.score;
    }

    let mut out: Vec<HotspotBucket> = accs
        .into_iter()
        .map(|a| HotspotBucket {
            keyword: a.keyword,
            hits: a.hits,
            sources: a.sources.into_iter().collect::<Vec<_>>().join(","),
            score_sum: a.score_sum,
        })
        .collect();

    out.sort_by(|a, b| {
        b.score_sum
            .total_cmp(&a.score_sum)
            .then_with(|| b.hits.cmp(&a.hits))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{Item, Source};

    fn scored(title: &str, source: Source, score: f64) -> ScoredItem {
        ScoredItem {
            item: Item::new(source, title),
            score,
        }
    }

    fn wl(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn same_title_merges_and_sources_are_sorted() {
        let items = vec![
            scored("moon coin", Source::Trend, 1.0),
            scored("moon coin", Source::SocialPost, 2.0),
        ];
        let out = aggregate(&items, &wl(&["moon"]));
        assert_eq!(
            out,
            vec![HotspotBucket {
                keyword: "moon coin".into(),
                hits: 2,
                sources: "social_post,trend".into(),
                score_sum: 3.0,
            }]
        );
    }

    #[test]
    fn duplicate_sources_are_listed_once() {
        let items = vec![
            scored("Pepe Season", Source::SocialPost, 1.0),
            scored("pepe season", Source::SocialPost, 1.0),
        ];
        let out = aggregate(&items, &wl(&["pepe"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sources, "social_post");
        assert_eq!(out[0].keyword, "pepe season");
    }

    #[test]
    fn empty_whitelist_or_blank_terms_yield_nothing() {
        let items = vec![scored("moon coin", Source::Trend, 1.0)];
        assert!(aggregate(&items, &[]).is_empty());
        assert!(aggregate(&items, &wl(&["", "  "])).is_empty());
        assert!(aggregate(&[], &wl(&["moon"])).is_empty());
    }

    #[test]
    fn ranking_breaks_ties_on_hits() {
        let items = vec![
            scored("a coin", Source::Trend, 5.0),
            scored("b coin", Source::Trend, 9.0),
            scored("c coin", Source::Trend, 4.5),
            scored("c coin", Source::Trend, 4.5),
        ];
        let out = aggregate(&items, &wl(&["coin"]));
        let keys: Vec<&str> = out.iter().map(|b| b.keyword.as_str()).collect();
        assert_eq!(keys, vec!["c coin", "b coin", "a coin"]);
    }

    #[test]
    fn equal_pairs_keep_encounter_order() {
        let items = vec![
            scored("y coin", Source::Trend, 1.0),
            scored("x coin", Source::Trend, 1.0),
        ];
        let out = aggregate(&items, &wl(&["coin"]));
        assert_eq!(out[0].keyword, "y coin");
        assert_eq!(out[1].keyword, "x coin");
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        assert!(matches_whitelist("Bitcoin Rally", &wl(&["COIN"])));
        assert!(!matches_whitelist("stocks rally", &wl(&["coin"])));
        assert!(!matches_whitelist("anything", &wl(&["  "])));
    }

    #[test]
    fn aggregate_keeps_exactly_the_whitelisted_titles() {
        let terms = wl(&[" Coin ", "PEPE"]);
        let titles = ["Bitcoin Rally", "pepe season", "stocks rally", "DogeCOIN", "weather"];
        let items: Vec<ScoredItem> = titles
            .iter()
            .map(|t| scored(t, Source::Trend, 1.0))
            .collect();
        let mut kept: Vec<String> = aggregate(&items, &terms).into_iter().map(|b| b.keyword).collect();
        kept.sort();
        let mut expected: Vec<String> = titles
            .iter()
            .filter(|t| matches_whitelist(t, &terms))
            .map(|t| bucket_key(t))
            .collect();
        expected.sort();
        assert_eq!(kept, expected);
        assert_eq!(kept, vec!["bitcoin rally", "dogecoin", "pepe season"]);
    }
}
