//! Frequency-based concept formation and contradiction detection.
//!
//! Both are pure functions over atom names and beliefs; the integrator feeds
//! them from the graph and writes the results back.

use std::collections::{BTreeMap, BTreeSet};

use crate::belief::BeliefValue;
use crate::graph::GraphRef;

/// Prefix given to concepts created by formation.
pub const CONCEPT_PREFIX: &str = "Concept_";

/// Minimum number of items a term must appear in, whatever the batch size.
const MIN_SUPPORT: usize = 2;
/// Fraction of the batch a term must appear in.
const SUPPORT_RATIO: f64 = 0.3;
/// Terms of this many characters or fewer are ignored.
const MIN_TERM_LEN: usize = 2;

/// Strength on either side of which two beliefs disagree.
const CONTRADICTION_PIVOT: f64 = 0.5;

/// Split on whitespace, keep alphanumerics, lower-case. Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Support a term needs in a batch of `item_count` items.
pub fn support_threshold(item_count: usize) -> usize {
    let ratio = (SUPPORT_RATIO * item_count as f64).ceil() as usize;
    ratio.max(MIN_SUPPORT)
}

/// A term that qualifies as a new concept, with the indices of the items it
/// appeared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptCandidate {
    pub term: String,
    pub exemplars: Vec<usize>,
}

impl ConceptCandidate {
    pub fn concept_name(&self) -> String {
        format!("{CONCEPT_PREFIX}{}", self.term)
    }
}

/// Terms appearing in enough of `texts` to form a concept, sorted by term.
///
/// Frequency is per document: a term repeated inside one text counts once.
pub fn concept_candidates(texts: &[Option<String>]) -> Vec<ConceptCandidate> {
    let mut occurrences: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, text) in texts.iter().enumerate() {
        let Some(text) = text else { continue };
        let unique: BTreeSet<String> = tokenize(text).into_iter().collect();
        for term in unique {
            occurrences.entry(term).or_default().push(i);
        }
    }

    let threshold = support_threshold(texts.len());
    occurrences
        .into_iter()
        .filter(|(term, items)| term.chars().count() > MIN_TERM_LEN && items.len() >= threshold)
        .map(|(term, exemplars)| ConceptCandidate { term, exemplars })
        .collect()
}

/// First whitespace-delimited token of a name, used as its subject.
pub fn subject_of(name: &str) -> Option<&str> {
    name.split_whitespace().next()
}

fn disagree(a: &BeliefValue, b: &BeliefValue) -> bool {
    (a.strength() > CONTRADICTION_PIVOT && b.strength() < CONTRADICTION_PIVOT)
        || (a.strength() < CONTRADICTION_PIVOT && b.strength() > CONTRADICTION_PIVOT)
}

/// Atoms sharing a subject whose beliefs point in opposite directions.
///
/// Every disagreeing pair contributes both members, so an atom that
/// contradicts several others appears several times.
pub fn inconsistent_atoms(atoms: &[(GraphRef, String, BeliefValue)]) -> Vec<GraphRef> {
    let mut groups: BTreeMap<&str, Vec<(GraphRef, BeliefValue)>> = BTreeMap::new();
    for (atom, name, belief) in atoms {
        if let Some(subject) = subject_of(name) {
            groups.entry(subject).or_default().push((*atom, *belief));
        }
    }

    let mut flagged = Vec::new();
    for group in groups.values().filter(|g| g.len() > 1) {
        for (i, (a, belief_a)) in group.iter().enumerate() {
            for (b, belief_b) in &group[i + 1..] {
                if disagree(belief_a, belief_b) {
                    flagged.push(*a);
                    flagged.push(*b);
                }
            }
        }
    }
    flagged
}
