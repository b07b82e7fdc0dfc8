use std::collections::{HashMap, HashSet, VecDeque};

use super::LineageNode;

/// Adjacency over one snapshot: `code -> position` and `parent_code -> children`.
///
/// Built once per snapshot and shared by every traversal query, so hidden counts,
/// focus extraction and collapse-all never rescan the flat list.
#[derive(Clone, Debug, Default)]
pub struct LineageIndex {
    position_by_code: HashMap<String, usize>,
    children_by_code: HashMap<String, Vec<usize>>,
}

impl LineageIndex {
    pub fn build(nodes: &[LineageNode]) -> Self {
        let mut position_by_code = HashMap::with_capacity(nodes.len());
        let mut children_by_code: HashMap<String, Vec<usize>> = HashMap::new();

        for (position, node) in nodes.iter().enumerate() {
            position_by_code
                .entry(node.lineage_code.clone())
                .or_insert(position);
            if let Some(parent) = node.parent()
                && parent != node.lineage_code
            {
                children_by_code
                    .entry(parent.to_owned())
                    .or_default()
                    .push(position);
            }
        }

        Self {
            position_by_code,
            children_by_code,
        }
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.position_by_code.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.position_by_code.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.position_by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position_by_code.is_empty()
    }

    pub fn children(&self, code: &str) -> &[usize] {
        self.children_by_code
            .get(code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_children(&self, code: &str) -> bool {
        !self.children(code).is_empty()
    }

    /// Codes of every node that has at least one child in the snapshot.
    pub fn parents_with_children<'a>(&'a self, nodes: &'a [LineageNode]) -> Vec<&'a str> {
        nodes
            .iter()
            .map(|node| node.lineage_code.as_str())
            .filter(|code| self.has_children(code))
            .collect()
    }

    /// Positions of the ancestors of `code`, nearest first.
    pub fn ancestors(&self, nodes: &[LineageNode], code: &str) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([code]);
        let mut cursor = self.position(code).and_then(|position| nodes[position].parent());

        while let Some(parent_code) = cursor {
            if !seen.insert(parent_code) {
                break;
            }
            let Some(position) = self.position(parent_code) else {
                break;
            };
            chain.push(position);
            cursor = nodes[position].parent();
        }

        chain
    }

    /// Positions of every transitive descendant of `code`, breadth first.
    pub fn descendants(&self, nodes: &[LineageNode], code: &str) -> Vec<usize> {
        self.descendants_where(nodes, code, |_| true)
    }

    /// Like [`Self::descendants`] but only walks through positions accepted by `keep`.
    pub fn descendants_where(
        &self,
        nodes: &[LineageNode],
        code: &str,
        keep: impl Fn(usize) -> bool,
    ) -> Vec<usize> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        if let Some(position) = self.position(code) {
            visited.insert(position);
        }
        let mut queue = VecDeque::from([code]);

        while let Some(current) = queue.pop_front() {
            for &child in self.children(current) {
                if !keep(child) || !visited.insert(child) {
                    continue;
                }
                found.push(child);
                queue.push_back(nodes[child].lineage_code.as_str());
            }
        }

        found
    }

    /// Number of descendants hidden because `code` is collapsed; zero when it is not.
    pub fn hidden_descendant_count(
        &self,
        nodes: &[LineageNode],
        code: &str,
        collapsed: &HashSet<String>,
    ) -> usize {
        if !collapsed.contains(code) {
            return 0;
        }
        self.descendants(nodes, code).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<LineageNode> {
        vec![
            LineageNode::new("R", None),
            LineageNode::new("A", Some("R")),
            LineageNode::new("B", Some("R")),
            LineageNode::new("C", Some("A")),
            LineageNode::new("D", Some("C")),
        ]
    }

    #[test]
    fn children_keep_input_order() {
        let nodes = sample();
        let index = LineageIndex::build(&nodes);
        assert_eq!(index.children("R"), &[1, 2]);
        assert!(index.children("B").is_empty());
    }

    #[test]
    fn ancestors_walk_to_root() {
        let nodes = sample();
        let index = LineageIndex::build(&nodes);
        assert_eq!(index.ancestors(&nodes, "D"), vec![3, 1, 0]);
        assert!(index.ancestors(&nodes, "R").is_empty());
    }

    #[test]
    fn descendants_are_transitive() {
        let nodes = sample();
        let index = LineageIndex::build(&nodes);
        assert_eq!(index.descendants(&nodes, "A"), vec![3, 4]);
        assert_eq!(index.descendants(&nodes, "R").len(), 4);
    }

    #[test]
    fn parent_cycles_terminate() {
        let nodes = vec![
            LineageNode::new("X", Some("Y")),
            LineageNode::new("Y", Some("X")),
        ];
        let index = LineageIndex::build(&nodes);
        assert_eq!(index.ancestors(&nodes, "X"), vec![1]);
        assert_eq!(index.descendants(&nodes, "X"), vec![1]);
    }

    #[test]
    fn hidden_count_requires_collapse() {
        let nodes = sample();
        let index = LineageIndex::build(&nodes);
        let collapsed = HashSet::from(["A".to_owned()]);
        assert_eq!(index.hidden_descendant_count(&nodes, "A", &collapsed), 2);
        assert_eq!(index.hidden_descendant_count(&nodes, "R", &collapsed), 0);
    }

    #[test]
    fn parents_with_children_lists_inner_nodes() {
        let nodes = sample();
        let index = LineageIndex::build(&nodes);
        assert_eq!(index.parents_with_children(&nodes), vec!["R", "A", "C"]);
    }
}
