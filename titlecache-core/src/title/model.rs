//! Cached title records and candidate ranking

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One literal title found for a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleCandidate {
    /// Predicate the title was found under
    pub uri: String,

    /// Literal value
    pub value: String,

    /// Language tag, absent for plain literals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl TitleCandidate {
    pub fn new(uri: impl Into<String>, value: impl Into<String>, lang: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            value: value.into(),
            lang: lang.filter(|l| !l.is_empty()).map(str::to_string),
        }
    }

    fn has_lang(&self, lang: &str) -> bool {
        self.lang.as_deref() == Some(lang)
    }
}

/// Cached titles of one subject within one graph, in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectTitleEntry {
    pub titles: Vec<TitleCandidate>,
}

impl SubjectTitleEntry {
    pub fn new(titles: Vec<TitleCandidate>) -> Self {
        Self { titles }
    }

    /// Pick the title to serve for `lang`
    ///
    /// The first candidate tagged `lang` wins wherever it sits in the list.
    /// Failing that, the first candidate tagged `default_lang`, and failing
    /// that the first candidate overall. Untagged candidates can only be
    /// picked by the last rule.
    pub fn choose(&self, lang: &str, default_lang: &str) -> Option<&str> {
        let mut default_match: Option<&TitleCandidate> = None;

        for candidate in &self.titles {
            if candidate.has_lang(lang) {
                return Some(&candidate.value);
            }
            if default_match.is_none() && lang != default_lang && candidate.has_lang(default_lang) {
                default_match = Some(candidate);
            }
        }

        default_match
            .or_else(|| self.titles.first())
            .map(|candidate| candidate.value.as_str())
    }
}

/// Stable sort of `candidates` by predicate rank
///
/// Candidates whose predicate has no rank are dropped; candidates sharing a
/// predicate keep their discovery order.
pub fn rank(candidates: Vec<TitleCandidate>, ranks: &HashMap<&str, usize>) -> Vec<TitleCandidate> {
    let mut ranked: Vec<(usize, TitleCandidate)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let rank = *ranks.get(candidate.uri.as_str())?;
            Some((rank, candidate))
        })
        .collect();

    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, candidate)| candidate).collect()
}
