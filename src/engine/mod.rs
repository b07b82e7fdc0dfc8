mod schedule;

use std::time::Instant;

use eframe::egui::{Pos2, Vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::hierarchy::Hierarchy;
use crate::interaction::{ClickAction, ClickTracker, ViewState};
use crate::layout::{TreeSpacing, tidy_tree};
use crate::lineage::{LineageIndex, LineageNode, TaxonomicRank};
use crate::scene::{LinkClass, LinkSpec, NodeSpec, SceneState, VisualNode, frame_delta};
use crate::visibility::visible_nodes;

pub use schedule::{DueRebuild, RebuildScheduler};

/// Notifications for the embedding shell, drained once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    NodeSelected(LineageNode),
    FocusChanged {
        focus: Option<String>,
        name: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKey {
    Escape,
    Backspace,
    Home,
    Fit,
}

/// Counters describing the last rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub records: usize,
    pub visible_nodes: usize,
    pub edges: usize,
    pub collapsed: usize,
    pub reparented_orphans: usize,
    pub unreachable: usize,
    pub rebuilds: u64,
}

/// Frame-driven lineage explorer: data, view filter, layout, camera and animated scene.
///
/// The engine keeps its own clock, advanced by [`GraphEngine::tick`]. Debounced rebuilds
/// and pending click selects fire at the start of a tick, before animation.
pub struct GraphEngine {
    config: EngineConfig,
    nodes: Vec<LineageNode>,
    index: LineageIndex,
    view: ViewState,
    spacing: TreeSpacing,
    camera: Camera,
    viewport: Option<Vec2>,
    scene: SceneState,
    clicks: ClickTracker,
    rebuild: RebuildScheduler,
    clock: f64,
    cursor: Option<Pos2>,
    hovered: Option<String>,
    selected: Option<String>,
    show_all_hybrid_links: bool,
    events: Vec<EngineEvent>,
    stats: EngineStats,
    rng: StdRng,
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.animation.particle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            spacing: config.layout.spacing(),
            camera: Camera::new(config.camera),
            clicks: ClickTracker::new(config.interaction.double_click_secs),
            rebuild: RebuildScheduler::new(config.interaction.rebuild_delay_secs),
            show_all_hybrid_links: config.links.show_all_hybrid_links,
            config,
            nodes: Vec::new(),
            index: LineageIndex::default(),
            view: ViewState::default(),
            viewport: None,
            scene: SceneState::default(),
            clock: 0.0,
            cursor: None,
            hovered: None,
            selected: None,
            events: Vec::new(),
            stats: EngineStats::default(),
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the snapshot. Collapse, focus and selection survive when their codes do.
    pub fn set_data(&mut self, nodes: Vec<LineageNode>) {
        self.index = LineageIndex::build(&nodes);
        self.nodes = nodes;
        self.view.retain_known(&self.index);
        if self
            .selected
            .as_deref()
            .is_some_and(|id| !self.index.contains(id))
        {
            self.selected = None;
        }
        self.hovered = None;
        self.clicks.cancel();
        info!(records = self.nodes.len(); "lineage snapshot received");
        self.rebuild.request(self.clock);
    }

    pub fn set_spacing(&mut self, horizontal: f32, vertical: f32) {
        let spacing = TreeSpacing {
            horizontal,
            vertical,
            ..self.spacing
        };
        if spacing != self.spacing {
            self.spacing = spacing;
            self.rebuild.request(self.clock);
        }
    }

    pub fn spacing(&self) -> TreeSpacing {
        self.spacing
    }

    pub fn set_camera(&mut self, offset: Vec2, zoom: f32) {
        self.camera.set(offset, zoom);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        self.viewport = (size.x > 0.0 && size.y > 0.0).then_some(size);
    }

    pub fn viewport(&self) -> Option<Vec2> {
        self.viewport
    }

    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Advances the clock by `dt` seconds, fires due timers, then animates.
    pub fn tick(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt;
        }

        if let Some(id) = self.clicks.poll(self.clock) {
            self.select(Some(&id));
        }
        if let Some(due) = self.rebuild.take_due(self.clock) {
            self.rebuild_scene();
            if due.fit {
                self.fit_to_content();
            }
        }

        let cursor_world = self.cursor.map(|cursor| self.camera.screen_to_world(cursor));
        self.scene.animate(
            frame_delta(dt),
            cursor_world,
            &self.config.animation,
            &self.config.node,
        );
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.rebuild.is_pending()
    }

    fn rebuild_scene(&mut self) {
        let started = Instant::now();
        let visible = visible_nodes(&self.nodes, &self.index, self.view.filter());
        let hierarchy = Hierarchy::build(&visible);
        let layout = tidy_tree(&hierarchy, self.spacing);

        let specs = hierarchy
            .nodes()
            .iter()
            .zip(layout.nodes())
            .map(|(node, placed)| {
                let record = node
                    .record
                    .and_then(|position| self.index.position(&visible[position].lineage_code));
                let collapsed = self.view.is_collapsed(&node.id);
                NodeSpec {
                    id: node.id.clone(),
                    record,
                    parent: node.parent,
                    depth: node.depth,
                    target: placed.position,
                    collapsed,
                    hidden_descendants: self.index.hidden_descendant_count(
                        &self.nodes,
                        &node.id,
                        &self.view.filter().collapsed,
                    ),
                }
            })
            .collect::<Vec<_>>();

        let links = self.link_specs(&hierarchy, &visible);
        self.scene
            .sync(&specs, &links, &self.config.animation, &mut self.rng);

        if self
            .hovered
            .as_deref()
            .is_some_and(|id| self.scene.node(id).is_none())
        {
            self.hovered = None;
        }
        self.refresh_emphasis();

        let reparented = hierarchy.reparented_orphans();
        if reparented > 0 && reparented != self.stats.reparented_orphans {
            warn!(orphans = reparented; "orphan lineages reparented under the synthetic root");
        }
        if hierarchy.unreachable() > 0 {
            warn!(
                unreachable = hierarchy.unreachable();
                "lineages unreachable from any root were skipped"
            );
        }

        self.stats = EngineStats {
            records: self.nodes.len(),
            visible_nodes: hierarchy.nodes().iter().filter(|node| !node.is_virtual()).count(),
            edges: self.scene.shown_link_count(),
            collapsed: self.view.collapsed_count(),
            reparented_orphans: reparented,
            unreachable: hierarchy.unreachable(),
            rebuilds: self.stats.rebuilds + 1,
        };
        debug!(
            visible = self.stats.visible_nodes,
            edges = self.stats.edges,
            elapsed_us = started.elapsed().as_micros() as u64;
            "lineage scene rebuilt"
        );
    }

    fn link_specs(&self, hierarchy: &Hierarchy, visible: &[&LineageNode]) -> Vec<LinkSpec> {
        let mut links = Vec::new();
        for (parent, child) in hierarchy.edges() {
            let Some(record) = hierarchy.nodes()[child].record.map(|position| visible[position])
            else {
                continue;
            };
            if hierarchy.nodes()[parent].is_virtual() {
                continue;
            }
            links.push(LinkSpec {
                source: parent,
                target: child,
                class: match record.taxonomic_rank {
                    TaxonomicRank::Subspecies => LinkClass::Subspecies,
                    TaxonomicRank::Hybrid => LinkClass::Hybrid,
                    TaxonomicRank::Species | TaxonomicRank::Genus => LinkClass::Lineage,
                },
                secondary_hybrid: false,
                extinct: record.is_extinct(),
            });
        }

        for (child, node) in hierarchy.nodes().iter().enumerate() {
            let Some(record) = node.record.map(|position| visible[position]) else {
                continue;
            };
            let Some(source) = record
                .secondary_parent()
                .filter(|code| Some(*code) != record.parent())
                .and_then(|code| hierarchy.index_of(code))
            else {
                continue;
            };
            links.push(LinkSpec {
                source,
                target: child,
                class: LinkClass::Hybrid,
                secondary_hybrid: true,
                extinct: record.is_extinct(),
            });
        }
        links
    }

    fn refresh_emphasis(&mut self) {
        self.scene.set_emphasis(
            self.hovered.as_deref(),
            self.selected.as_deref(),
            self.show_all_hybrid_links,
        );
    }

    pub fn pointer_moved(&mut self, screen: Pos2) {
        self.cursor = Some(screen);
        let hovered = self.node_at(screen).map(|node| node.id.clone());
        if hovered != self.hovered {
            self.hovered = hovered;
            self.refresh_emphasis();
        }
    }

    pub fn pointer_left(&mut self) {
        self.cursor = None;
        if self.hovered.take().is_some() {
            self.refresh_emphasis();
        }
    }

    /// Primary click at `screen`: select on single click, focus on double click.
    /// Clicks on the top of the tree are ignored.
    pub fn pointer_clicked(&mut self, screen: Pos2) {
        let hit = self.node_at(screen).map(|node| (node.id.clone(), node.depth == 0));
        if let Some((_, true)) = hit {
            return;
        }
        let target = hit.map(|(id, _)| id);
        let outcome = self.clicks.click(self.clock, target.as_deref());
        if let Some(id) = outcome.flushed {
            self.select(Some(&id));
        }
        match outcome.action {
            ClickAction::Armed => {}
            ClickAction::Focus(id) => {
                self.focus_lineage(&id);
            }
            ClickAction::ClearSelection => self.select(None),
        }
    }

    pub fn node_at(&self, screen: Pos2) -> Option<&VisualNode> {
        let world = self.camera.screen_to_world(screen);
        self.scene
            .hit_test(world, &self.config.node)
            .map(|index| &self.scene.nodes()[index])
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.camera.pan(delta);
    }

    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        self.camera.zoom_at(anchor, factor);
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    /// Frames every node's resting position. Needs a known viewport and a non-empty scene.
    pub fn fit_to_content(&mut self) -> bool {
        let Some(viewport) = self.viewport else {
            return false;
        };
        self.camera
            .fit_to_content(self.scene.nodes().iter().map(|node| node.target), viewport)
    }

    pub fn center_on(&mut self, id: &str) -> bool {
        let (Some(viewport), Some(node)) = (self.viewport, self.scene.node(id)) else {
            return false;
        };
        self.camera.center_on(node.target, viewport);
        true
    }

    /// Returns whether the key did anything.
    pub fn handle_key(&mut self, key: EngineKey) -> bool {
        match key {
            EngineKey::Escape | EngineKey::Backspace => self.clear_focus(),
            EngineKey::Home => {
                self.reset_camera();
                true
            }
            EngineKey::Fit => self.fit_to_content(),
        }
    }

    /// Confirms a selection (or clears it with `None`) and reports it to the shell.
    pub fn select(&mut self, id: Option<&str>) {
        let record = id
            .and_then(|id| self.index.position(id))
            .map(|position| &self.nodes[position]);
        self.selected = record.map(|record| record.lineage_code.clone());
        if let Some(record) = record {
            self.events.push(EngineEvent::NodeSelected(record.clone()));
        }
        self.refresh_emphasis();
    }

    pub fn toggle_collapse(&mut self, id: &str) {
        if !self.index.contains(id) {
            return;
        }
        self.view.toggle_collapse(id);
        self.rebuild.request(self.clock);
    }

    pub fn expand_all(&mut self) {
        if self.view.expand_all() {
            self.rebuild.request(self.clock);
        }
    }

    pub fn collapse_all(&mut self) {
        if self.view.collapse_all(&self.nodes, &self.index) {
            self.rebuild.request(self.clock);
        }
    }

    /// Restricts the view to `id`'s ancestors and subtree and selects it.
    pub fn focus_lineage(&mut self, id: &str) -> bool {
        if self.view.focus() == Some(id) {
            self.clicks.cancel();
            self.select(Some(id));
            return true;
        }
        if !self.view.focus_lineage(id, &self.index) {
            return false;
        }
        self.clicks.cancel();
        self.select(Some(id));
        self.focus_changed();
        true
    }

    pub fn clear_focus(&mut self) -> bool {
        if !self.view.clear_focus() {
            return false;
        }
        self.focus_changed();
        true
    }

    fn focus_changed(&mut self) {
        let focus = self.view.focus().map(str::to_owned);
        info!(focus:? = focus; "lineage focus changed");
        self.events.push(EngineEvent::FocusChanged {
            name: self.focus_name().map(str::to_owned),
            focus,
        });
        self.rebuild.request_with_fit(self.clock);
    }

    pub fn set_show_all_hybrid_links(&mut self, show: bool) {
        if self.show_all_hybrid_links != show {
            self.show_all_hybrid_links = show;
            self.refresh_emphasis();
        }
    }

    pub fn show_all_hybrid_links(&self) -> bool {
        self.show_all_hybrid_links
    }

    /// Best fuzzy match among the displayed lineages by latin name, common name or code.
    pub fn find_node(&self, query: &str) -> Option<&LineageNode> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let matcher = SkimMatcherV2::default().ignore_case();
        self.scene
            .nodes()
            .iter()
            .filter_map(|node| node.record.map(|position| &self.nodes[position]))
            .filter_map(|record| {
                [
                    record.latin_name.as_str(),
                    record.common_name.as_str(),
                    record.lineage_code.as_str(),
                ]
                .into_iter()
                .filter_map(|text| matcher.fuzzy_match(text, query))
                .max()
                .map(|score| (score, record))
            })
            .max_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| b.1.lineage_code.cmp(&a.1.lineage_code))
            })
            .map(|(_, record)| record)
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            edges: self.scene.shown_link_count(),
            ..self.stats
        }
    }

    pub fn nodes(&self) -> &[LineageNode] {
        &self.nodes
    }

    pub fn record(&self, node: &VisualNode) -> Option<&LineageNode> {
        node.record.and_then(|position| self.nodes.get(position))
    }

    pub fn lookup(&self, id: &str) -> Option<&LineageNode> {
        self.index.position(id).map(|position| &self.nodes[position])
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    /// Visual nodes back to front.
    pub fn draw_nodes(&self) -> impl Iterator<Item = &VisualNode> + '_ {
        self.scene
            .draw_order()
            .iter()
            .map(|&index| &self.scene.nodes()[index])
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn focus(&self) -> Option<&str> {
        self.view.focus()
    }

    pub fn focus_name(&self) -> Option<&str> {
        self.focus()
            .and_then(|id| self.lookup(id))
            .map(LineageNode::display_name)
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.view.is_collapsed(id)
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.index.has_children(id)
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
