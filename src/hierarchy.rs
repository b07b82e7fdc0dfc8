use std::collections::{HashMap, HashSet};

use crate::lineage::{LineageNode, ROOT_CODE};

#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
    pub id: String,
    /// Position of the wrapped record in the visible list; `None` for the synthetic root.
    pub record: Option<usize>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
}

impl HierarchyNode {
    pub fn is_virtual(&self) -> bool {
        self.record.is_none()
    }
}

/// Rooted arena tree over the visible lineage records, in pre-order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    index_by_id: HashMap<String, usize>,
    reparented_orphans: usize,
    unreachable: usize,
}

impl Hierarchy {
    pub fn build(visible: &[&LineageNode]) -> Self {
        if visible.is_empty() {
            return Self::default();
        }

        let present = visible
            .iter()
            .map(|node| node.lineage_code.as_str())
            .collect::<HashSet<_>>();

        let mut children_by_parent: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        let mut orphans = Vec::new();
        for (position, node) in visible.iter().enumerate() {
            match node.parent() {
                None => roots.push(position),
                Some(parent) if parent == node.lineage_code || !present.contains(parent) => {
                    orphans.push(position)
                }
                Some(parent) => children_by_parent.entry(parent).or_default().push(position),
            }
        }

        let reparented_orphans = orphans.len();
        let mut seen = HashSet::new();
        let top_level = roots
            .into_iter()
            .chain(orphans)
            .filter(|&position| seen.insert(visible[position].lineage_code.as_str()))
            .collect::<Vec<_>>();

        let mut hierarchy = Self {
            reparented_orphans,
            ..Self::default()
        };

        // A lone top-level node becomes the root; otherwise a synthetic root adopts them.
        let mut stack = Vec::new();
        if let [only] = top_level.as_slice() {
            stack.push((*only, None, 0usize));
        } else {
            hierarchy.push(HierarchyNode {
                id: ROOT_CODE.to_owned(),
                record: None,
                parent: None,
                children: Vec::new(),
                depth: 0,
            });
            for &position in top_level.iter().rev() {
                stack.push((position, Some(0), 1));
            }
        }

        while let Some((position, parent, depth)) = stack.pop() {
            let id = visible[position].lineage_code.as_str();
            if hierarchy.index_by_id.contains_key(id) {
                continue;
            }

            let index = hierarchy.push(HierarchyNode {
                id: id.to_owned(),
                record: Some(position),
                parent,
                children: Vec::new(),
                depth,
            });
            if let Some(parent) = parent {
                hierarchy.nodes[parent].children.push(index);
            }

            if let Some(children) = children_by_parent.get(id) {
                for &child in children.iter().rev() {
                    stack.push((child, Some(index), depth + 1));
                }
            }
        }

        let placed = hierarchy.nodes.iter().filter(|node| !node.is_virtual()).count();
        hierarchy.unreachable = visible.len().saturating_sub(placed);
        hierarchy
    }

    fn push(&mut self, node: HierarchyNode) -> usize {
        let index = self.nodes.len();
        self.index_by_id.insert(node.id.clone(), index);
        self.nodes.push(node);
        index
    }

    pub fn root(&self) -> Option<&HierarchyNode> {
        self.nodes.first()
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&HierarchyNode> {
        self.nodes.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_virtual_root(&self) -> bool {
        self.root().is_some_and(HierarchyNode::is_virtual)
    }

    /// Orphans (parent code citing a node outside the visible list) promoted to roots.
    pub fn reparented_orphans(&self) -> usize {
        self.reparented_orphans
    }

    /// Visible records that could not be reached from any root, e.g. parent cycles.
    pub fn unreachable(&self) -> usize {
        self.unreachable
    }

    /// Parent/child index pairs in pre-order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.parent.map(|parent| (parent, index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(hierarchy: &Hierarchy, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .map(|&index| hierarchy.nodes()[index].id.clone())
            .collect()
    }

    #[test]
    fn empty_input_builds_empty_hierarchy() {
        let hierarchy = Hierarchy::build(&[]);
        assert!(hierarchy.is_empty());
        assert!(hierarchy.root().is_none());
    }

    #[test]
    fn single_root_is_used_directly() {
        let nodes = [
            LineageNode::new("R", None),
            LineageNode::new("A", Some("R")),
            LineageNode::new("B", Some("R")),
        ];
        let visible = nodes.iter().collect::<Vec<_>>();
        let hierarchy = Hierarchy::build(&visible);

        let root = hierarchy.root().expect("root");
        assert_eq!(root.id, "R");
        assert!(!hierarchy.has_virtual_root());
        assert_eq!(ids(&hierarchy, &root.children), vec!["A", "B"]);
    }

    #[test]
    fn orphans_join_true_roots_under_synthetic_root() {
        let nodes = [
            LineageNode::new("A", Some(ROOT_CODE)),
            LineageNode::new("B", Some("X")),
        ];
        let visible = nodes.iter().collect::<Vec<_>>();
        let hierarchy = Hierarchy::build(&visible);

        let root = hierarchy.root().expect("root");
        assert_eq!(root.id, ROOT_CODE);
        assert!(root.is_virtual());
        assert_eq!(ids(&hierarchy, &root.children), vec!["A", "B"]);
        assert_eq!(hierarchy.reparented_orphans(), 1);
        assert_eq!(hierarchy.nodes()[root.children[1]].depth, 1);
    }

    #[test]
    fn lone_orphan_becomes_root() {
        let nodes = [
            LineageNode::new("B", Some("X")),
            LineageNode::new("C", Some("B")),
        ];
        let visible = nodes.iter().collect::<Vec<_>>();
        let hierarchy = Hierarchy::build(&visible);

        assert_eq!(hierarchy.root().map(|root| root.id.as_str()), Some("B"));
        assert_eq!(hierarchy.len(), 2);
    }

    #[test]
    fn cycles_are_reported_unreachable() {
        let nodes = [
            LineageNode::new("R", None),
            LineageNode::new("X", Some("Y")),
            LineageNode::new("Y", Some("X")),
        ];
        let visible = nodes.iter().collect::<Vec<_>>();
        let hierarchy = Hierarchy::build(&visible);

        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy.unreachable(), 2);
    }

    #[test]
    fn preorder_depths_and_edges() {
        let nodes = [
            LineageNode::new("R", None),
            LineageNode::new("A", Some("R")),
            LineageNode::new("B", Some("R")),
            LineageNode::new("C", Some("A")),
        ];
        let visible = nodes.iter().collect::<Vec<_>>();
        let hierarchy = Hierarchy::build(&visible);

        let order = hierarchy
            .nodes()
            .iter()
            .map(|node| (node.id.as_str(), node.depth))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![("R", 0), ("A", 1), ("C", 2), ("B", 1)]);
        assert_eq!(hierarchy.edges().count(), 3);
    }
}
