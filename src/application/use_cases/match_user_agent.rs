use std::cmp::Reverse;

use tracing::debug;

use crate::application::dto::{ComponentMatch, Match};
use crate::application::workset::Workset;
use crate::domain::value_objects::{ComponentIndex, MatchMethod, NodeIndex, SignatureIndex};
use crate::domain::DataSet;

/// Signature chosen for one component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Selection {
    signature: SignatureIndex,
    method: MatchMethod,
    difference: u64,
}

/// Match an input against every component tree of the dataset.
///
/// All trees are walked before any selection so a candidate can be checked
/// against the nodes it holds in other components. Never fails: an input that
/// reaches nothing yields [`MatchMethod::None`] with only component default
/// profiles.
pub fn match_user_agent(dataset: &DataSet, input: &str) -> Match {
    let mut workset = Workset::new(dataset, input);
    let component_count = dataset.components().len();

    let mut candidate_sets = Vec::with_capacity(component_count);
    for i in 0..component_count {
        let component_index = ComponentIndex::new(i as u32);
        workset.begin_component();
        for &root in dataset.root_nodes(component_index) {
            workset.walk(root);
        }
        candidate_sets.push(workset.take_candidates());
    }

    let mut components = Vec::with_capacity(component_count);
    for (i, (component, candidates)) in dataset
        .components()
        .iter()
        .zip(&candidate_sets)
        .enumerate()
    {
        let component_index = ComponentIndex::new(i as u32);
        let component_match = match select(&mut workset, component_index, candidates) {
            Some(selection) => ComponentMatch {
                component: component_index,
                signature: Some(selection.signature),
                profile: dataset
                    .signature(selection.signature)
                    .profile_for(component_index),
                method: selection.method,
                difference: selection.difference,
            },
            None => ComponentMatch {
                component: component_index,
                signature: None,
                profile: component.default_profile(),
                method: MatchMethod::None,
                difference: 0,
            },
        };
        components.push(component_match);
    }

    let method = components
        .iter()
        .filter(|c| c.signature.is_some())
        .map(|c| c.method)
        .max()
        .unwrap_or_default();
    let difference = components.iter().map(|c| c.difference).sum();
    let metrics = workset.metrics();

    debug!(
        %method,
        difference,
        nodes_evaluated = metrics.nodes_evaluated,
        signatures_read = metrics.signatures_read,
        "matched input"
    );

    Match {
        components,
        method,
        difference,
        metrics,
    }
}

fn select(
    workset: &mut Workset<'_>,
    component: ComponentIndex,
    candidates: &[SignatureIndex],
) -> Option<Selection> {
    if candidates.is_empty() {
        return None;
    }
    exact(workset, component, candidates)
        .or_else(|| scored(workset, component, candidates, MatchMethod::Numeric))
        .or_else(|| scored(workset, component, candidates, MatchMethod::Closest))
}

/// Nodes of a signature that belong to one component, in position order
fn component_nodes(
    workset: &Workset<'_>,
    signature: SignatureIndex,
    component: ComponentIndex,
) -> Vec<NodeIndex> {
    let dataset = workset.dataset();
    dataset
        .signature(signature)
        .nodes()
        .iter()
        .copied()
        .filter(|&n| dataset.node(n).component() == component)
        .collect()
}

/// Nodes of a signature outside this component that did not match the input.
///
/// A signature the input reproduces in every component counts zero, so it
/// wins each component slot over any partially matching signature.
fn foreign_misses(
    workset: &Workset<'_>,
    signature: SignatureIndex,
    component: ComponentIndex,
) -> usize {
    let dataset = workset.dataset();
    dataset
        .signature(signature)
        .nodes()
        .iter()
        .filter(|&&n| dataset.node(n).component() != component && !workset.is_matched(n))
        .count()
}

/// Candidate whose every node of the component matched.
///
/// Fewer misses in other components come first, then the highest rank, then
/// the lowest signature index.
fn exact(
    workset: &Workset<'_>,
    component: ComponentIndex,
    candidates: &[SignatureIndex],
) -> Option<Selection> {
    let dataset = workset.dataset();
    candidates
        .iter()
        .copied()
        .filter(|&s| {
            component_nodes(workset, s, component)
                .iter()
                .all(|&n| workset.is_matched(n))
        })
        .max_by_key(|&s| {
            (
                Reverse(foreign_misses(workset, s, component)),
                dataset.signature(s).rank(),
                Reverse(s),
            )
        })
        .map(|signature| Selection {
            signature,
            method: MatchMethod::Exact,
            difference: 0,
        })
}

/// Score every candidate and keep the lowest difference.
///
/// Ties on difference go to fewer misses in other components, then to the
/// higher rank, then to the lower index. Numeric scoring disqualifies
/// candidates with a non-numeric mismatch; closest scoring accepts every
/// candidate.
fn scored(
    workset: &mut Workset<'_>,
    component: ComponentIndex,
    candidates: &[SignatureIndex],
    method: MatchMethod,
) -> Option<Selection> {
    let dataset = workset.dataset();
    let mut compared = 0u32;
    let mut tied = 0u32;
    let mut best: Option<(u64, usize, Reverse<u32>, SignatureIndex)> = None;

    for &signature in candidates {
        let mut difference = 0u64;
        let mut qualifies = true;
        for node in component_nodes(workset, signature, component) {
            if workset.is_matched(node) {
                continue;
            }
            let node_difference = match method {
                MatchMethod::Numeric => workset.numeric_difference(node),
                _ => Some(workset.character_difference(node)),
            };
            match node_difference {
                Some(d) => difference += d,
                None => {
                    qualifies = false;
                    break;
                }
            }
        }
        if !qualifies {
            continue;
        }

        compared += 1;
        let key = (
            difference,
            foreign_misses(workset, signature, component),
            Reverse(dataset.signature(signature).rank()),
            signature,
        );
        match best {
            Some((best_difference, ..)) if difference > best_difference => {}
            Some((best_difference, ..)) if difference == best_difference => {
                tied += 1;
                if best.is_some_and(|b| key < b) {
                    best = Some(key);
                }
            }
            _ => {
                tied = 1;
                best = Some(key);
            }
        }
    }

    let metrics = workset.metrics_mut();
    metrics.signatures_compared += compared;
    let (difference, _, _, signature) = best?;
    metrics.closest_signatures += tied;

    Some(Selection {
        signature,
        method,
        difference,
    })
}
