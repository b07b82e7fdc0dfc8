use crate::lineage::{LineageIndex, LineageNode, ROOT_CODE};
use crate::visibility::ViewFilter;

/// Collapse and focus state driving the visibility filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    filter: ViewFilter,
}

impl ViewState {
    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn focus(&self) -> Option<&str> {
        self.filter.focus.as_deref()
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.filter.collapsed.contains(id)
    }

    pub fn collapsed_count(&self) -> usize {
        self.filter.collapsed.len()
    }

    pub fn toggle_collapse(&mut self, id: &str) {
        if !self.filter.collapsed.remove(id) {
            self.filter.collapsed.insert(id.to_owned());
        }
    }

    /// Returns `false` when nothing was collapsed.
    pub fn expand_all(&mut self) -> bool {
        let changed = !self.filter.collapsed.is_empty();
        self.filter.collapsed.clear();
        changed
    }

    /// Collapses every record with at least one child in the snapshot.
    pub fn collapse_all(&mut self, nodes: &[LineageNode], index: &LineageIndex) -> bool {
        let before = self.filter.collapsed.len();
        self.filter.collapsed.extend(
            index
                .parents_with_children(nodes)
                .into_iter()
                .map(str::to_owned),
        );
        self.filter.collapsed.len() != before
    }

    /// Rejects the synthetic root and codes outside the snapshot.
    pub fn focus_lineage(&mut self, id: &str, index: &LineageIndex) -> bool {
        if id == ROOT_CODE || !index.contains(id) {
            return false;
        }
        if self.focus() == Some(id) {
            return false;
        }
        self.filter.focus = Some(id.to_owned());
        true
    }

    pub fn clear_focus(&mut self) -> bool {
        self.filter.focus.take().is_some()
    }

    /// Drops collapse and focus entries that no longer name a record.
    pub fn retain_known(&mut self, index: &LineageIndex) {
        self.filter.collapsed.retain(|id| index.contains(id));
        if self.focus().is_some_and(|id| !index.contains(id)) {
            self.filter.focus = None;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct PendingSelect {
    id: String,
    deadline: f64,
}

/// What a click resolved to once the previous pending select is dealt with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickAction {
    /// A select is armed and fires from [`ClickTracker::poll`] unless a second click lands.
    Armed,
    Focus(String),
    ClearSelection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Select from an earlier click that had to fire before this one.
    pub flushed: Option<String>,
    pub action: ClickAction,
}

/// Tells single clicks (select) from double clicks (focus) on the same node.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickTracker {
    window: f64,
    pending: Option<PendingSelect>,
}

impl ClickTracker {
    pub fn new(window_secs: f64) -> Self {
        Self {
            window: window_secs.max(0.0),
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|pending| pending.id.as_str())
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Registers a click at `now` on `target`, or on empty canvas when `None`.
    pub fn click(&mut self, now: f64, target: Option<&str>) -> ClickOutcome {
        let Some(id) = target else {
            self.pending = None;
            return ClickOutcome {
                flushed: None,
                action: ClickAction::ClearSelection,
            };
        };

        match self.pending.take() {
            Some(pending) if pending.id == id && now <= pending.deadline => ClickOutcome {
                flushed: None,
                action: ClickAction::Focus(pending.id),
            },
            previous => {
                self.pending = Some(PendingSelect {
                    id: id.to_owned(),
                    deadline: now + self.window,
                });
                ClickOutcome {
                    flushed: previous.map(|pending| pending.id),
                    action: ClickAction::Armed,
                }
            }
        }
    }

    /// Fires the pending select once its window has elapsed.
    pub fn poll(&mut self, now: f64) -> Option<String> {
        if self.pending.as_ref()?.deadline > now {
            return None;
        }
        self.pending.take().map(|pending| pending.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<LineageNode>, LineageIndex) {
        let nodes = vec![
            LineageNode::new("R", None),
            LineageNode::new("A", Some("R")),
            LineageNode::new("B", Some("R")),
            LineageNode::new("C", Some("A")),
        ];
        let index = LineageIndex::build(&nodes);
        (nodes, index)
    }

    #[test]
    fn toggle_collapse_round_trips() {
        let mut state = ViewState::default();
        state.toggle_collapse("A");
        assert!(state.is_collapsed("A"));
        state.toggle_collapse("A");
        assert!(!state.is_collapsed("A"));
    }

    #[test]
    fn collapse_all_targets_parents_only() {
        let (nodes, index) = sample();
        let mut state = ViewState::default();
        assert!(state.collapse_all(&nodes, &index));
        assert!(state.is_collapsed("R"));
        assert!(state.is_collapsed("A"));
        assert!(!state.is_collapsed("B"));
        assert!(!state.collapse_all(&nodes, &index));

        assert!(state.expand_all());
        assert_eq!(state.collapsed_count(), 0);
        assert!(!state.expand_all());
    }

    #[test]
    fn focus_rejects_root_and_unknown_ids() {
        let (_, index) = sample();
        let mut state = ViewState::default();
        assert!(!state.focus_lineage(ROOT_CODE, &index));
        assert!(!state.focus_lineage("missing", &index));
        assert!(state.focus_lineage("A", &index));
        assert_eq!(state.focus(), Some("A"));
        assert!(state.clear_focus());
        assert!(!state.clear_focus());
    }

    #[test]
    fn retain_known_drops_stale_entries() {
        let (_, index) = sample();
        let mut state = ViewState::default();
        state.toggle_collapse("gone");
        state.toggle_collapse("A");
        state.filter.focus = Some("gone".to_owned());
        state.retain_known(&index);
        assert_eq!(state.collapsed_count(), 1);
        assert_eq!(state.focus(), None);
    }

    #[test]
    fn single_click_selects_after_window() {
        let mut clicks = ClickTracker::new(0.25);
        let outcome = clicks.click(1.0, Some("A"));
        assert_eq!(outcome.action, ClickAction::Armed);
        assert_eq!(outcome.flushed, None);

        assert_eq!(clicks.poll(1.2), None);
        assert_eq!(clicks.poll(1.25), Some("A".to_owned()));
        assert_eq!(clicks.poll(2.0), None);
    }

    #[test]
    fn double_click_focuses_without_selecting() {
        let mut clicks = ClickTracker::new(0.25);
        clicks.click(1.0, Some("A"));
        let outcome = clicks.click(1.1, Some("A"));
        assert_eq!(outcome.action, ClickAction::Focus("A".to_owned()));
        assert_eq!(clicks.poll(5.0), None);
    }

    #[test]
    fn slow_second_click_rearms() {
        let mut clicks = ClickTracker::new(0.25);
        clicks.click(1.0, Some("A"));
        let outcome = clicks.click(1.4, Some("A"));
        assert_eq!(outcome.flushed, Some("A".to_owned()));
        assert_eq!(outcome.action, ClickAction::Armed);
    }

    #[test]
    fn click_on_other_node_flushes_pending() {
        let mut clicks = ClickTracker::new(0.25);
        clicks.click(1.0, Some("A"));
        let outcome = clicks.click(1.05, Some("B"));
        assert_eq!(outcome.flushed, Some("A".to_owned()));
        assert_eq!(clicks.pending(), Some("B"));
    }

    #[test]
    fn canvas_click_cancels_pending() {
        let mut clicks = ClickTracker::new(0.25);
        clicks.click(1.0, Some("A"));
        let outcome = clicks.click(1.1, None);
        assert_eq!(outcome.action, ClickAction::ClearSelection);
        assert_eq!(clicks.pending(), None);
        assert_eq!(clicks.poll(2.0), None);
    }
}
