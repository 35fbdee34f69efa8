//! Title predicate priority list

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Default title predicates, highest priority first
pub const DEFAULT_TITLE_PREDICATES: [&str; 8] = [
    "http://purl.org/dc/elements/1.1/title",
    "http://www.w3.org/2000/01/rdf-schema#label",
    "http://purl.org/dc/terms/title",
    "http://purl.org/dc/terms/alternative",
    "http://udfr.org/onto#documentTitle",
    "http://www.w3.org/2004/02/skos/core#prefLabel",
    "http://www.w3.org/2004/02/skos/core#altLabel",
    "http://www.w3.org/2004/02/skos/core#hiddenLabel",
];

/// Ordered, immutable list of predicates that carry titles
///
/// Index 0 is the preferred title predicate. Cached entries are stored in
/// this order, so changing the list requires repopulating every graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TitlePredicateList(Arc<[String]>);

impl TitlePredicateList {
    pub fn new(predicates: Vec<String>) -> Self {
        Self(predicates.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest-priority predicate
    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Predicate -> priority rank; a repeated predicate keeps its first rank
    pub fn rank_map(&self) -> HashMap<&str, usize> {
        let mut ranks = HashMap::with_capacity(self.0.len());
        for (rank, predicate) in self.0.iter().enumerate() {
            ranks.entry(predicate.as_str()).or_insert(rank);
        }
        ranks
    }
}

impl Default for TitlePredicateList {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_PREDICATES.iter().map(|p| p.to_string()).collect())
    }
}

impl From<Vec<String>> for TitlePredicateList {
    fn from(predicates: Vec<String>) -> Self {
        Self::new(predicates)
    }
}

impl From<TitlePredicateList> for Vec<String> {
    fn from(list: TitlePredicateList) -> Self {
        list.0.to_vec()
    }
}
