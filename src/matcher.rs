use std::collections::HashMap;

use crate::name_norm::NameNormalizer;
use crate::roster::Named;
use crate::token_sort;

#[derive(Debug, Clone)]
struct Candidate {
    normalized: String,
    sort_key: String,
}

/// Normalized external names plus a reverse lookup to the source record.
///
/// Built once per listing. When two records normalize to the same string
/// the later one owns the lookup entry.
#[derive(Debug, Clone)]
pub struct CandidateIndex<'a, T> {
    normalizer: NameNormalizer,
    candidates: Vec<Candidate>,
    lookup: HashMap<String, &'a T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch<'a, T> {
    pub record: &'a T,
    pub score: u8,
}

impl<'a, T> BestMatch<'a, T> {
    pub fn accepted(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}

impl<'a, T: Named> CandidateIndex<'a, T> {
    pub fn build(records: &'a [T], normalizer: &NameNormalizer) -> Self {
        let mut candidates = Vec::with_capacity(records.len());
        let mut lookup: HashMap<String, &'a T> = HashMap::with_capacity(records.len());
        for record in records {
            let normalized = normalizer.normalize(record.display_name());
            if normalized.is_empty() {
                continue;
            }
            if lookup.insert(normalized.clone(), record).is_none() {
                let sort_key = token_sort::sort_key(&normalized);
                candidates.push(Candidate {
                    normalized,
                    sort_key,
                });
            }
        }
        Self {
            normalizer: normalizer.clone(),
            candidates,
            lookup,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.normalized.as_str())
    }

    pub fn get(&self, normalized: &str) -> Option<&'a T> {
        self.lookup.get(normalized).copied()
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Highest-scoring candidate for `name`, regardless of any threshold.
    ///
    /// Ties go to the candidate seen first.
    pub fn match_one(&self, name: &str) -> Option<BestMatch<'a, T>> {
        let query = self.normalizer.normalize(name);
        if query.is_empty() || self.candidates.is_empty() {
            return None;
        }
        let query_key = token_sort::sort_key(&query);

        let mut best: Option<(&Candidate, u8)> = None;
        for candidate in &self.candidates {
            let score = token_sort::ratio_of_keys(&query_key, &candidate.sort_key);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }

        let (candidate, score) = best?;
        let record = self.get(&candidate.normalized)?;
        Some(BestMatch { record, score })
    }
}

pub fn match_one<'a, T: Named>(name: &str, index: &CandidateIndex<'a, T>) -> Option<BestMatch<'a, T>> {
    index.match_one(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name_norm::NameOverrides;
    use crate::roster::ExternalRecord;

    fn listing(names: &[&str]) -> Vec<ExternalRecord> {
        names.iter().map(|n| ExternalRecord::new(n, "€1M")).collect()
    }

    #[test]
    fn verbatim_names_score_full() {
        let records = listing(&["John Smith", "Bukayo Saka", "Kai Havertz"]);
        let index = CandidateIndex::build(&records, &NameNormalizer::default());
        for name in ["John Smith", "Bukayo Saka", "Kai Havertz"] {
            let best = index.match_one(name).expect("match");
            assert_eq!(best.record.name, name);
            assert_eq!(best.score, 100);
        }
    }

    #[test]
    fn reversed_order_scores_full() {
        let records = listing(&["John Smith", "Jane Doe"]);
        let index = CandidateIndex::build(&records, &NameNormalizer::default());
        assert_eq!(match_one("Smith John", &index).map(|m| m.score), Some(100));
        assert_eq!(match_one("John Smith", &index).map(|m| m.score), Some(100));
    }

    #[test]
    fn empty_query_or_index_yields_none() {
        let records = listing(&["John Smith"]);
        let index = CandidateIndex::build(&records, &NameNormalizer::default());
        assert!(index.match_one("   ").is_none());

        let empty: Vec<ExternalRecord> = Vec::new();
        let index = CandidateIndex::build(&empty, &NameNormalizer::default());
        assert!(index.match_one("John Smith").is_none());
    }

    #[test]
    fn collisions_are_last_write_wins() {
        let records = vec![
            ExternalRecord::new("Ben White", "€30M"),
            ExternalRecord::new("Ben  White", "€45M"),
        ];
        let index = CandidateIndex::build(&records, &NameNormalizer::default());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("Ben White").map(|r| r.price.as_str()), Some("€45M"));
    }

    #[test]
    fn ties_prefer_first_seen() {
        // Both candidates score identically against the query.
        let records = listing(&["Jon Smitt", "Jon Smitz"]);
        let index = CandidateIndex::build(&records, &NameNormalizer::default());
        let best = index.match_one("Jon Smith").expect("match");
        assert_eq!(best.record.name, "Jon Smitt");
    }

    #[test]
    fn blank_candidates_are_skipped() {
        let records = listing(&["", "  ", "Declan Rice"]);
        let index = CandidateIndex::build(&records, &NameNormalizer::default());
        assert_eq!(index.len(), 1);
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["Declan Rice"]);
    }

    #[test]
    fn query_is_normalized_inside() {
        let records = listing(&["Gabriel Jesus"]);
        let norm = NameNormalizer::first_last(NameOverrides::empty());
        let index = CandidateIndex::build(&records, &norm);
        let best = index.match_one("Gabriel Fernando de Jesus").expect("match");
        assert_eq!(best.score, 100);
        assert!(best.accepted(90));
    }
}
