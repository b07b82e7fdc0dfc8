use std::collections::HashSet;

use crate::lineage::{LineageIndex, LineageNode};

/// Inputs of the visibility reductions: collapsed subtrees and an optional focus.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub collapsed: HashSet<String>,
    pub focus: Option<String>,
}

/// Applies focus then collapse reduction, keeping input order. Pure and idempotent.
pub fn visible_nodes<'a>(
    nodes: &'a [LineageNode],
    index: &LineageIndex,
    filter: &ViewFilter,
) -> Vec<&'a LineageNode> {
    let mut candidate = focus_mask(nodes, index, filter.focus.as_deref());
    apply_collapse(nodes, index, &filter.collapsed, &mut candidate);

    nodes
        .iter()
        .zip(candidate)
        .filter_map(|(node, keep)| keep.then_some(node))
        .collect()
}

/// Convenience wrapper building a throwaway index; prefer [`visible_nodes`] in loops.
pub fn filter_visible<'a>(
    nodes: &'a [LineageNode],
    collapsed: &HashSet<String>,
    focus: Option<&str>,
) -> Vec<&'a LineageNode> {
    let index = LineageIndex::build(nodes);
    let filter = ViewFilter {
        collapsed: collapsed.clone(),
        focus: focus.map(str::to_owned),
    };
    visible_nodes(nodes, &index, &filter)
}

pub fn hidden_descendant_count(
    id: &str,
    nodes: &[LineageNode],
    collapsed: &HashSet<String>,
) -> usize {
    LineageIndex::build(nodes).hidden_descendant_count(nodes, id, collapsed)
}

fn focus_mask(nodes: &[LineageNode], index: &LineageIndex, focus: Option<&str>) -> Vec<bool> {
    let Some((focus, position)) = focus.and_then(|id| index.position(id).map(|p| (id, p))) else {
        return vec![true; nodes.len()];
    };

    let mut mask = vec![false; nodes.len()];
    mask[position] = true;
    for ancestor in index.ancestors(nodes, focus) {
        mask[ancestor] = true;
    }
    for descendant in index.descendants(nodes, focus) {
        mask[descendant] = true;
    }
    mask
}

fn apply_collapse(
    nodes: &[LineageNode],
    index: &LineageIndex,
    collapsed: &HashSet<String>,
    candidate: &mut [bool],
) {
    if collapsed.is_empty() {
        return;
    }

    // Descendants are evaluated against the candidate set before any removal.
    let mut hidden = vec![false; nodes.len()];
    for (position, node) in nodes.iter().enumerate() {
        if !candidate[position] || !collapsed.contains(&node.lineage_code) {
            continue;
        }
        for descendant in
            index.descendants_where(nodes, &node.lineage_code, |child| candidate[child])
        {
            hidden[descendant] = true;
        }
    }

    for (keep, hide) in candidate.iter_mut().zip(hidden) {
        if hide {
            *keep = false;
        }
    }
}
