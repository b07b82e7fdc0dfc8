//! Vertical tidy-tree layout (Buchheim, Jünger & Leipert's linear-time variant of
//! Reingold–Tilford).
//!
//! Works directly on the pre-ordered [`Hierarchy`] arena. Both walks are iterative, so
//! long single-descent chains cannot exhaust the stack.

use std::collections::HashMap;

use eframe::egui::{Pos2, pos2};

use crate::hierarchy::Hierarchy;

pub const DEFAULT_COUSIN_SEPARATION: f32 = 1.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeSpacing {
    /// World units between adjacent siblings.
    pub horizontal: f32,
    /// World units between depth levels.
    pub vertical: f32,
    /// Multiplier applied between neighbours that do not share a parent.
    pub cousin_separation: f32,
}

impl TreeSpacing {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
            cousin_separation: DEFAULT_COUSIN_SEPARATION,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub hierarchy_index: usize,
    pub position: Pos2,
    pub depth: usize,
}

/// Positions for every hierarchy node, in hierarchy (pre-)order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
    nodes: Vec<LayoutNode>,
    index_by_id: HashMap<String, usize>,
}

impl TreeLayout {
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn position(&self, id: &str) -> Option<Pos2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].position)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
struct WalkState {
    prelim: f32,
    modifier: f32,
    change: f32,
    shift: f32,
    thread: Option<usize>,
    ancestor: usize,
    default_ancestor: Option<usize>,
    number: usize,
}

struct Walker<'h> {
    hierarchy: &'h Hierarchy,
    state: Vec<WalkState>,
    cousin_separation: f32,
}

pub fn tidy_tree(hierarchy: &Hierarchy, spacing: TreeSpacing) -> TreeLayout {
    if hierarchy.is_empty() {
        return TreeLayout::default();
    }

    let mut walker = Walker::new(hierarchy, spacing.cousin_separation);
    for v in post_order(hierarchy) {
        walker.first_walk(v);
    }
    let units = walker.second_walk();

    let mut layout = TreeLayout {
        nodes: Vec::with_capacity(hierarchy.len()),
        index_by_id: HashMap::with_capacity(hierarchy.len()),
    };
    for (index, (node, x)) in hierarchy.nodes().iter().zip(units).enumerate() {
        layout.index_by_id.insert(node.id.clone(), index);
        layout.nodes.push(LayoutNode {
            id: node.id.clone(),
            hierarchy_index: index,
            position: pos2(x * spacing.horizontal, node.depth as f32 * spacing.vertical),
            depth: node.depth,
        });
    }
    layout
}

/// Children left to right before their parent.
fn post_order(hierarchy: &Hierarchy) -> Vec<usize> {
    let nodes = hierarchy.nodes();
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack = vec![0usize];
    while let Some(v) = stack.pop() {
        order.push(v);
        stack.extend(nodes[v].children.iter().copied());
    }
    order.reverse();
    order
}

impl<'h> Walker<'h> {
    fn new(hierarchy: &'h Hierarchy, cousin_separation: f32) -> Self {
        let mut state = (0..hierarchy.len())
            .map(|index| WalkState {
                prelim: 0.0,
                modifier: 0.0,
                change: 0.0,
                shift: 0.0,
                thread: None,
                ancestor: index,
                default_ancestor: None,
                number: 0,
            })
            .collect::<Vec<_>>();
        for node in hierarchy.nodes() {
            for (number, &child) in node.children.iter().enumerate() {
                state[child].number = number;
            }
        }

        Self {
            hierarchy,
            state,
            cousin_separation,
        }
    }

    fn children(&self, v: usize) -> &'h [usize] {
        let hierarchy: &'h Hierarchy = self.hierarchy;
        &hierarchy.nodes()[v].children
    }

    fn parent(&self, v: usize) -> Option<usize> {
        self.hierarchy.nodes()[v].parent
    }

    fn separation(&self, a: usize, b: usize) -> f32 {
        if self.parent(a) == self.parent(b) {
            1.0
        } else {
            self.cousin_separation
        }
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let number = self.state[v].number;
        if number == 0 {
            return None;
        }
        self.parent(v)
            .and_then(|parent| self.children(parent).get(number - 1).copied())
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.children(v).first().copied().or(self.state[v].thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.children(v).last().copied().or(self.state[v].thread)
    }

    fn first_walk(&mut self, v: usize) {
        let children = self.children(v);
        let left = self.left_sibling(v);

        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            self.execute_shifts(v);
            let midpoint = (self.state[first].prelim + self.state[last].prelim) / 2.0;
            if let Some(w) = left {
                self.state[v].prelim = self.state[w].prelim + self.separation(v, w);
                self.state[v].modifier = self.state[v].prelim - midpoint;
            } else {
                self.state[v].prelim = midpoint;
            }
        } else if let Some(w) = left {
            self.state[v].prelim = self.state[w].prelim + self.separation(v, w);
        }

        if let Some(parent) = self.parent(v) {
            let fallback = self.children(parent)[0];
            let ancestor = self.state[parent].default_ancestor.unwrap_or(fallback);
            self.state[parent].default_ancestor = Some(self.apportion(v, left, ancestor));
        }
    }

    /// Pushes the subtree of `v` right until it clears every subtree to its left.
    fn apportion(&mut self, v: usize, left: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = left else {
            return ancestor;
        };
        let Some(parent) = self.parent(v) else {
            return ancestor;
        };

        let mut inner_right = v;
        let mut outer_right = v;
        let mut inner_left = w;
        let mut outer_left = self.children(parent)[0];
        let mut sum_inner_right = self.state[inner_right].modifier;
        let mut sum_outer_right = self.state[outer_right].modifier;
        let mut sum_inner_left = self.state[inner_left].modifier;
        let mut sum_outer_left = self.state[outer_left].modifier;

        let tail = loop {
            let next = (self.next_right(inner_left), self.next_left(inner_right));
            let (Some(next_inner_left), Some(next_inner_right)) = next else {
                break next;
            };
            inner_left = next_inner_left;
            inner_right = next_inner_right;
            outer_left = self.next_left(outer_left).unwrap_or(outer_left);
            outer_right = self.next_right(outer_right).unwrap_or(outer_right);
            self.state[outer_right].ancestor = v;

            let shift = (self.state[inner_left].prelim + sum_inner_left)
                - (self.state[inner_right].prelim + sum_inner_right)
                + self.separation(inner_left, inner_right);
            if shift > 0.0 {
                let from = self.next_ancestor(inner_left, v, ancestor);
                self.move_subtree(from, v, shift);
                sum_inner_right += shift;
                sum_outer_right += shift;
            }

            sum_inner_left += self.state[inner_left].modifier;
            sum_inner_right += self.state[inner_right].modifier;
            sum_outer_left += self.state[outer_left].modifier;
            sum_outer_right += self.state[outer_right].modifier;
        };

        if let (Some(next_inner_left), _) = tail
            && self.next_right(outer_right).is_none()
        {
            self.state[outer_right].thread = Some(next_inner_left);
            self.state[outer_right].modifier += sum_inner_left - sum_outer_right;
        }
        if let (_, Some(next_inner_right)) = tail
            && self.next_left(outer_left).is_none()
        {
            self.state[outer_left].thread = Some(next_inner_right);
            self.state[outer_left].modifier += sum_inner_right - sum_outer_left;
            ancestor = v;
        }

        ancestor
    }

    fn next_ancestor(&self, inner_left: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.state[inner_left].ancestor;
        if self.parent(candidate) == self.parent(v) {
            candidate
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, from: usize, to: usize, shift: f32) {
        let gap = self.state[to]
            .number
            .saturating_sub(self.state[from].number)
            .max(1);
        let change = shift / gap as f32;
        self.state[to].change -= change;
        self.state[to].shift += shift;
        self.state[from].change += change;
        self.state[to].prelim += shift;
        self.state[to].modifier += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for &child in self.children(v).iter().rev() {
            let state = &mut self.state[child];
            state.prelim += shift;
            state.modifier += shift;
            change += state.change;
            shift += state.shift + change;
        }
    }

    /// Resolves accumulated modifiers top-down; the root lands on `x = 0`.
    fn second_walk(mut self) -> Vec<f32> {
        let mut units = vec![0.0; self.state.len()];
        let root_offset = -self.state[0].prelim;
        // Hierarchy order is pre-order, so every parent is settled before its children.
        for v in 0..self.state.len() {
            let parent_modifier = self
                .parent(v)
                .map_or(root_offset, |parent| self.state[parent].modifier);
            units[v] = self.state[v].prelim + parent_modifier;
            self.state[v].modifier += parent_modifier;
        }
        units
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;
    use crate::lineage::LineageNode;

    fn layout_of(nodes: &[LineageNode], spacing: TreeSpacing) -> TreeLayout {
        let visible = nodes.iter().collect::<Vec<_>>();
        tidy_tree(&Hierarchy::build(&visible), spacing)
    }

    fn x_of(layout: &TreeLayout, id: &str) -> f32 {
        layout.position(id).expect("laid out").x
    }

    #[test]
    fn empty_hierarchy_has_no_layout() {
        let layout = tidy_tree(&Hierarchy::default(), TreeSpacing::new(160.0, 120.0));
        assert!(layout.is_empty());
    }

    #[test]
    fn small_tree_matches_expected_coordinates() {
        let nodes = [
            LineageNode::new("R", None),
            LineageNode::new("A", Some("R")),
            LineageNode::new("B", Some("R")),
            LineageNode::new("C", Some("A")),
        ];
        let layout = layout_of(&nodes, TreeSpacing::new(160.0, 120.0));

        assert_eq!(layout.position("R"), Some(pos2(0.0, 0.0)));
        assert_eq!(layout.position("A"), Some(pos2(-80.0, 120.0)));
        assert_eq!(layout.position("B"), Some(pos2(80.0, 120.0)));
        assert_eq!(layout.position("C"), Some(pos2(-80.0, 240.0)));
        assert!(x_of(&layout, "B") - x_of(&layout, "A") >= 160.0);
    }

    #[test]
    fn cousins_use_wider_separation() {
        let nodes = [
            LineageNode::new("R", None),
            LineageNode::new("A", Some("R")),
            LineageNode::new("B", Some("R")),
            LineageNode::new("C", Some("A")),
            LineageNode::new("D", Some("B")),
        ];
        let layout = layout_of(&nodes, TreeSpacing::new(100.0, 50.0));

        let gap = x_of(&layout, "D") - x_of(&layout, "C");
        assert!((gap - 130.0).abs() < 1e-3, "cousin gap was {gap}");
        assert!((x_of(&layout, "A") - x_of(&layout, "C")).abs() < 1e-3);
        assert!(x_of(&layout, "R").abs() < 1e-3);
    }

    #[test]
    fn small_subtree_between_wide_ones_is_spread_evenly() {
        let nodes = [
            LineageNode::new("R", None),
            LineageNode::new("A", Some("R")),
            LineageNode::new("M", Some("R")),
            LineageNode::new("B", Some("R")),
            LineageNode::new("A1", Some("A")),
            LineageNode::new("A2", Some("A")),
            LineageNode::new("A3", Some("A")),
            LineageNode::new("B1", Some("B")),
            LineageNode::new("B2", Some("B")),
            LineageNode::new("B3", Some("B")),
        ];
        let layout = layout_of(&nodes, TreeSpacing::new(1.0, 1.0));

        let left_gap = x_of(&layout, "M") - x_of(&layout, "A");
        let right_gap = x_of(&layout, "B") - x_of(&layout, "M");
        assert!((left_gap - right_gap).abs() < 1e-3);
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let mut nodes = vec![LineageNode::new("N0", None)];
        for depth in 1..5_000 {
            let parent = format!("N{}", depth - 1);
            nodes.push(LineageNode::new(format!("N{depth}"), Some(parent.as_str())));
        }
        let layout = layout_of(&nodes, TreeSpacing::new(10.0, 10.0));
        assert_eq!(layout.len(), 5_000);
        assert_eq!(layout.position("N4999"), Some(pos2(0.0, 49_990.0)));
    }

    fn tree_strategy() -> impl Strategy<Value = Vec<LineageNode>> {
        prop::collection::vec(any::<prop::sample::Index>(), 0..60).prop_map(|choices| {
            let mut nodes = vec![LineageNode::new("n0", None)];
            for (index, choice) in choices.iter().enumerate() {
                let parent = format!("n{}", choice.index(index + 1));
                nodes.push(LineageNode::new(format!("n{}", index + 1), Some(parent.as_str())));
            }
            nodes
        })
    }

    fn check_no_overlap_per_depth(nodes: &[LineageNode]) -> Result<(), TestCaseError> {
        let spacing = TreeSpacing::new(160.0, 120.0);
        let layout = layout_of(nodes, spacing);

        let mut rows: BTreeMap<usize, Vec<f32>> = BTreeMap::new();
        for node in layout.nodes() {
            rows.entry(node.depth).or_default().push(node.position.x);
        }
        for (depth, row) in rows {
            for pair in row.windows(2) {
                prop_assert!(
                    pair[1] - pair[0] >= spacing.horizontal - 1e-2,
                    "depth {depth}: {} then {}",
                    pair[0],
                    pair[1]
                );
            }
        }
        Ok(())
    }

    fn check_parents_centered(nodes: &[LineageNode]) -> Result<(), TestCaseError> {
        let visible = nodes.iter().collect::<Vec<_>>();
        let hierarchy = Hierarchy::build(&visible);
        let layout = tidy_tree(&hierarchy, TreeSpacing::new(160.0, 120.0));

        for (index, node) in hierarchy.nodes().iter().enumerate() {
            let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) else {
                continue;
            };
            let expected =
                (layout.nodes()[first].position.x + layout.nodes()[last].position.x) / 2.0;
            let actual = layout.nodes()[index].position.x;
            prop_assert!((expected - actual).abs() < 1e-2, "{expected} vs {actual}");
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn layout_is_deterministic(nodes in tree_strategy()) {
            let spacing = TreeSpacing::new(160.0, 120.0);
            prop_assert_eq!(layout_of(&nodes, spacing), layout_of(&nodes, spacing));
        }

        #[test]
        fn rows_never_overlap(nodes in tree_strategy()) {
            check_no_overlap_per_depth(&nodes)?;
        }

        #[test]
        fn parents_sit_over_children(nodes in tree_strategy()) {
            check_parents_centered(&nodes)?;
        }
    }
}
