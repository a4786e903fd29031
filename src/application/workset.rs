//! Per-call matching state
//!
//! A [`Workset`] borrows the dataset and the (truncated) input for the duration
//! of one match. It is never shared between calls and never writes to the
//! dataset.

use std::collections::{HashMap, HashSet};

use crate::application::dto::MatchMetrics;
use crate::domain::entities::parse_numeric;
use crate::domain::value_objects::{NodeIndex, SignatureIndex};
use crate::domain::DataSet;

pub struct Workset<'a> {
    dataset: &'a DataSet,
    input: &'a [u8],
    /// Outcome of comparing each node reached so far, across all components
    evaluated: HashMap<NodeIndex, bool>,
    seen: HashSet<SignatureIndex>,
    candidates: Vec<SignatureIndex>,
    stack: Vec<NodeIndex>,
    metrics: MatchMetrics,
}

impl<'a> Workset<'a> {
    /// Start a match; input past the dataset's scan limit is ignored
    pub fn new(dataset: &'a DataSet, input: &'a str) -> Self {
        let bytes = input.as_bytes();
        let input = &bytes[..bytes.len().min(dataset.max_scan_length())];
        Self {
            dataset,
            input,
            evaluated: HashMap::new(),
            seen: HashSet::new(),
            candidates: Vec::new(),
            stack: Vec::new(),
            metrics: MatchMetrics::default(),
        }
    }

    pub fn dataset(&self) -> &'a DataSet {
        self.dataset
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    pub fn metrics(&self) -> MatchMetrics {
        self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MatchMetrics {
        &mut self.metrics
    }

    /// Start collecting candidates for the next component.
    ///
    /// Node outcomes are kept so later selection can check a signature's
    /// nodes in every component.
    pub fn begin_component(&mut self) {
        self.seen.clear();
        self.candidates.clear();
    }

    /// Hand over the signatures reached through matched nodes of the current
    /// component, in discovery order
    pub fn take_candidates(&mut self) -> Vec<SignatureIndex> {
        std::mem::take(&mut self.candidates)
    }

    /// Whether the tree walk reached and matched this node
    pub fn is_matched(&self, node: NodeIndex) -> bool {
        self.evaluated.get(&node).copied().unwrap_or(false)
    }

    /// Depth-first walk from one root.
    ///
    /// Children are only visited below a matching node, and a node has exactly
    /// one parent, so each node is evaluated at most once per walk.
    pub fn walk(&mut self, root: NodeIndex) {
        let dataset = self.dataset;
        self.metrics.root_nodes_evaluated += 1;
        self.stack.clear();
        self.stack.push(root);

        while let Some(index) = self.stack.pop() {
            self.metrics.nodes_evaluated += 1;
            if !self.node_matches(index) {
                continue;
            }

            let node = dataset.node(index);
            for &signature in node.signatures() {
                if self.seen.insert(signature) {
                    self.metrics.signatures_read += 1;
                    self.candidates.push(signature);
                }
            }
            // Reversed so children are visited in stored order
            self.stack.extend(node.children().iter().rev().copied());
        }
    }

    /// Compare a node's characters with the input at the node's position.
    /// The string is read once; later calls reuse the outcome.
    pub fn node_matches(&mut self, index: NodeIndex) -> bool {
        if let Some(&outcome) = self.evaluated.get(&index) {
            return outcome;
        }
        self.metrics.strings_read += 1;
        let node = self.dataset.node(index);
        let characters = self.dataset.string(node.characters()).as_bytes();
        let outcome = self.input.get(node.position()..node.end()) == Some(characters);
        self.evaluated.insert(index, outcome);
        outcome
    }

    /// Numeric distance between a node and the input.
    ///
    /// Zero when the node matches on the spot. Otherwise both the node and the
    /// digit run starting at the node's position must parse as numbers.
    pub fn numeric_difference(&mut self, index: NodeIndex) -> Option<u64> {
        if self.node_matches(index) {
            return Some(0);
        }
        let node = self.dataset.node(index);
        let target = node.numeric()?;
        let tail = self.input.get(node.position()..)?;
        let run = tail.iter().take_while(|b| b.is_ascii_digit()).count();
        let actual = parse_numeric(&tail[..run])?;
        Some(u64::from(actual.abs_diff(target)))
    }

    /// Number of byte positions in the node's range where the input differs.
    /// Positions past the end of the input always differ.
    pub fn character_difference(&mut self, index: NodeIndex) -> u64 {
        self.metrics.strings_read += 1;
        let node = self.dataset.node(index);
        let characters = self.dataset.string(node.characters()).as_bytes();
        let position = node.position();
        characters
            .iter()
            .enumerate()
            .filter(|&(i, b)| self.input.get(position + i) != Some(b))
            .count() as u64
    }
}
