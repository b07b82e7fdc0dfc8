mod animate;
mod path;

use std::collections::HashMap;

use eframe::egui::{Pos2, Rect, Vec2, vec2};
use rand::Rng;

use crate::config::{AnimationConfig, NodeConfig};

pub use animate::{frame_delta, magnetic_offset};
pub use path::ElbowPath;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Emphasis {
    #[default]
    Idle,
    Hovered,
    Selected,
}

/// Animated card appearance: vertical lift, scale and drop shadow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeLook {
    pub lift: f32,
    pub scale: f32,
    pub shadow_alpha: f32,
    pub shadow_scale: f32,
}

impl NodeLook {
    pub fn for_emphasis(emphasis: Emphasis) -> Self {
        match emphasis {
            Emphasis::Idle => Self {
                lift: 0.0,
                scale: 1.0,
                shadow_alpha: 0.0,
                shadow_scale: 0.8,
            },
            Emphasis::Hovered => Self {
                lift: -5.0,
                scale: 1.06,
                shadow_alpha: 0.4,
                shadow_scale: 1.0,
            },
            Emphasis::Selected => Self {
                lift: -8.0,
                scale: 1.12,
                shadow_alpha: 0.6,
                shadow_scale: 1.15,
            },
        }
    }

    fn ease_toward(&mut self, goal: &Self, amount: f32) {
        self.lift += (goal.lift - self.lift) * amount;
        self.scale += (goal.scale - self.scale) * amount;
        self.shadow_alpha += (goal.shadow_alpha - self.shadow_alpha) * amount;
        self.shadow_scale += (goal.shadow_scale - self.shadow_scale) * amount;
    }
}

impl Default for NodeLook {
    fn default() -> Self {
        Self::for_emphasis(Emphasis::Idle)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
    pub id: String,
    /// Position of the lineage record in the engine's snapshot; `None` for the synthetic root.
    pub record: Option<usize>,
    pub depth: usize,
    pub position: Pos2,
    pub target: Pos2,
    pub magnetic: Vec2,
    pub look: NodeLook,
    pub goal: NodeLook,
    pub emphasis: Emphasis,
    pub collapsed: bool,
    pub hidden_descendants: usize,
}

impl VisualNode {
    pub fn is_virtual(&self) -> bool {
        self.record.is_none()
    }

    /// Live centre including the hover/selection lift.
    pub fn center(&self) -> Pos2 {
        self.position + vec2(0.0, self.look.lift)
    }

    pub fn bounds(&self, node: &NodeConfig) -> Rect {
        Rect::from_center_size(self.center(), node.half_extent() * 2.0 * self.look.scale)
    }

    pub fn top_anchor(&self, node: &NodeConfig) -> Pos2 {
        self.center() - vec2(0.0, node.half_height * self.look.scale)
    }

    pub fn bottom_anchor(&self, node: &NodeConfig) -> Pos2 {
        self.center() + vec2(0.0, node.half_height * self.look.scale)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkStyle {
    Solid,
    Dashed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkClass {
    Lineage,
    Subspecies,
    Hybrid,
}

impl LinkClass {
    pub fn style(self) -> LinkStyle {
        match self {
            Self::Lineage => LinkStyle::Solid,
            Self::Subspecies | Self::Hybrid => LinkStyle::Dashed,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualLink {
    pub source: usize,
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub style: LinkStyle,
    pub class: LinkClass,
    pub secondary_hybrid: bool,
    pub extinct: bool,
    pub highlighted: bool,
    pub alpha: f32,
    pub width: f32,
    pub target_alpha: f32,
    pub target_width: f32,
    pub path: ElbowPath,
}

impl VisualLink {
    pub fn is_visible(&self) -> bool {
        self.alpha > 0.01
    }

    fn key(&self) -> LinkKey {
        (
            self.source_id.clone(),
            self.target_id.clone(),
            self.secondary_hybrid,
        )
    }
}

type LinkKey = (String, String, bool);

/// A dot travelling from ancestor to descendant along its link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowParticle {
    pub link: usize,
    pub t: f32,
    pub speed: f32,
}

impl FlowParticle {
    /// Fades in from the parent, peaks mid-path and fades out into the child.
    pub fn alpha(&self) -> f32 {
        (self.t * std::f32::consts::PI).sin().max(0.0)
    }
}

/// Layout-derived description of a node entering or staying in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    pub record: Option<usize>,
    /// Index of the parent within the same spec list.
    pub parent: Option<usize>,
    pub depth: usize,
    pub target: Pos2,
    pub collapsed: bool,
    pub hidden_descendants: usize,
}

/// Edge between two entries of the spec list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkSpec {
    pub source: usize,
    pub target: usize,
    pub class: LinkClass,
    pub secondary_hybrid: bool,
    pub extinct: bool,
}

/// Arena of visual records keyed by lineage code.
///
/// Nodes are spawned when they enter the visible set and freed (with their links and
/// particles) when they leave; indices are dense and change on free.
#[derive(Clone, Debug, Default)]
pub struct SceneState {
    nodes: Vec<VisualNode>,
    index_by_id: HashMap<String, usize>,
    links: Vec<VisualLink>,
    particles: Vec<FlowParticle>,
    draw_order: Vec<usize>,
}

impl SceneState {
    pub fn nodes(&self) -> &[VisualNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[VisualLink] {
        &self.links
    }

    pub fn particles(&self) -> &[FlowParticle] {
        &self.particles
    }

    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Back-to-front: idle, then hovered, then selected.
    pub fn draw_order(&self) -> &[usize] {
        &self.draw_order
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reconciles the arena with a fresh layout pass.
    pub fn sync(
        &mut self,
        specs: &[NodeSpec],
        link_specs: &[LinkSpec],
        animation: &AnimationConfig,
        rng: &mut impl Rng,
    ) {
        let mut alive = vec![false; self.nodes.len()];
        let mut spawn_index = Vec::with_capacity(specs.len());

        for spec in specs {
            let index = match self.index_of(&spec.id) {
                Some(index) => {
                    let node = &mut self.nodes[index];
                    node.record = spec.record;
                    node.depth = spec.depth;
                    node.target = spec.target;
                    node.collapsed = spec.collapsed;
                    node.hidden_descendants = spec.hidden_descendants;
                    alive[index] = true;
                    index
                }
                None => {
                    // Newcomers grow out of their parent's live position.
                    let origin = spec
                        .parent
                        .and_then(|parent| spawn_index.get(parent).copied())
                        .map_or(spec.target, |parent: usize| self.nodes[parent].position);
                    let index = self.spawn(spec, origin);
                    alive.push(true);
                    index
                }
            };
            spawn_index.push(index);
        }

        for index in (0..alive.len()).rev() {
            if !alive[index] {
                self.free(index);
            }
        }

        let arena_index = specs
            .iter()
            .filter_map(|spec| self.index_of(&spec.id))
            .collect::<Vec<_>>();
        self.rebuild_links(link_specs, &arena_index, animation, rng);
        self.rebuild_draw_order();
    }

    fn spawn(&mut self, spec: &NodeSpec, origin: Pos2) -> usize {
        let index = self.nodes.len();
        self.index_by_id.insert(spec.id.clone(), index);
        self.nodes.push(VisualNode {
            id: spec.id.clone(),
            record: spec.record,
            depth: spec.depth,
            position: origin,
            target: spec.target,
            magnetic: Vec2::ZERO,
            look: NodeLook::default(),
            goal: NodeLook::default(),
            emphasis: Emphasis::Idle,
            collapsed: spec.collapsed,
            hidden_descendants: spec.hidden_descendants,
        });
        index
    }

    fn free(&mut self, index: usize) {
        let removed = self.nodes.swap_remove(index);
        self.index_by_id.remove(&removed.id);
        if let Some(moved) = self.nodes.get(index) {
            self.index_by_id.insert(moved.id.clone(), index);
        }
    }

    fn rebuild_links(
        &mut self,
        link_specs: &[LinkSpec],
        arena_index: &[usize],
        animation: &AnimationConfig,
        rng: &mut impl Rng,
    ) {
        let mut previous_particles = HashMap::new();
        for particle in &self.particles {
            if let Some(link) = self.links.get(particle.link) {
                previous_particles.insert(link.key(), (particle.t, particle.speed));
            }
        }
        let mut previous_links = self
            .links
            .drain(..)
            .map(|link| (link.key(), link))
            .collect::<HashMap<_, _>>();
        self.particles.clear();

        for spec in link_specs {
            let (Some(&source), Some(&target)) =
                (arena_index.get(spec.source), arena_index.get(spec.target))
            else {
                continue;
            };
            let source_node = &self.nodes[source];
            let target_node = &self.nodes[target];
            let key = (
                source_node.id.clone(),
                target_node.id.clone(),
                spec.secondary_hybrid,
            );

            let mut link = VisualLink {
                source,
                target,
                source_id: source_node.id.clone(),
                target_id: target_node.id.clone(),
                style: spec.class.style(),
                class: spec.class,
                secondary_hybrid: spec.secondary_hybrid,
                extinct: spec.extinct,
                highlighted: false,
                alpha: 0.0,
                width: 1.0,
                target_alpha: 0.0,
                target_width: 1.0,
                path: ElbowPath::new(source_node.position, target_node.position),
            };
            if let Some(previous) = previous_links.remove(&key) {
                link.alpha = previous.alpha;
                link.width = previous.width;
                link.target_alpha = previous.target_alpha;
                link.target_width = previous.target_width;
                link.highlighted = previous.highlighted;
            }

            if !spec.secondary_hybrid && !spec.extinct {
                let (t, speed) = previous_particles.remove(&key).unwrap_or_else(|| {
                    let speed = if animation.particle_speed_max > animation.particle_speed_min {
                        rng.random_range(animation.particle_speed_min..animation.particle_speed_max)
                    } else {
                        animation.particle_speed_min
                    };
                    (rng.random_range(0.0..1.0), speed)
                });
                self.particles.push(FlowParticle {
                    link: self.links.len(),
                    t,
                    speed,
                });
            }
            self.links.push(link);
        }
    }

    fn rebuild_draw_order(&mut self) {
        self.draw_order.clear();
        self.draw_order.extend(0..self.nodes.len());
        let nodes = &self.nodes;
        self.draw_order.sort_by_key(|&index| nodes[index].emphasis);
    }

    /// Re-targets every node and link for the current hover/selection.
    pub fn set_emphasis(
        &mut self,
        hovered: Option<&str>,
        selected: Option<&str>,
        show_all_hybrid_links: bool,
    ) {
        for node in &mut self.nodes {
            node.emphasis = if Some(node.id.as_str()) == selected {
                Emphasis::Selected
            } else if Some(node.id.as_str()) == hovered {
                Emphasis::Hovered
            } else {
                Emphasis::Idle
            };
            node.goal = NodeLook::for_emphasis(node.emphasis);
        }

        for link in &mut self.links {
            let touches = |id: Option<&str>| {
                id.is_some_and(|id| link.source_id == id || link.target_id == id)
            };
            let focused = touches(hovered) || touches(selected);
            let (alpha, width) = link_targets(link, focused, show_all_hybrid_links);
            link.highlighted = link.secondary_hybrid && focused;
            link.target_alpha = alpha;
            link.target_width = width;
        }

        self.rebuild_draw_order();
    }

    /// Topmost real node whose live card contains `world`; the synthetic root is never hit.
    pub fn hit_test(&self, world: Pos2, node: &NodeConfig) -> Option<usize> {
        self.draw_order.iter().rev().copied().find(|&index| {
            let candidate = &self.nodes[index];
            !candidate.is_virtual() && candidate.bounds(node).contains(world)
        })
    }

    /// Links that are showing or fading in.
    pub fn shown_link_count(&self) -> usize {
        self.links
            .iter()
            .filter(|link| link.target_alpha > 0.01)
            .count()
    }

    /// World position and alpha of every particle whose link is showing.
    pub fn particle_points(&self) -> impl Iterator<Item = (Pos2, f32)> + '_ {
        self.particles.iter().filter_map(|particle| {
            let link = self.links.get(particle.link)?;
            link.is_visible()
                .then(|| (link.path.point_at(particle.t), particle.alpha() * link.alpha))
        })
    }
}

fn link_targets(link: &VisualLink, focused: bool, show_all_hybrid_links: bool) -> (f32, f32) {
    if link.secondary_hybrid {
        return if focused {
            (0.9, 2.4)
        } else if show_all_hybrid_links {
            (0.45, 1.3)
        } else {
            (0.0, 1.3)
        };
    }

    let (alpha, width) = match link.class {
        LinkClass::Lineage => (0.6, 1.6),
        LinkClass::Subspecies | LinkClass::Hybrid => (0.5, 1.3),
    };
    if link.extinct {
        (alpha * 0.55, width)
    } else {
        (alpha, width)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn spec(id: &str, parent: Option<usize>, x: f32, y: f32) -> NodeSpec {
        NodeSpec {
            id: id.to_owned(),
            record: Some(0),
            parent,
            depth: parent.map_or(0, |_| 1),
            target: pos2(x, y),
            collapsed: false,
            hidden_descendants: 0,
        }
    }

    fn lineage(source: usize, target: usize) -> LinkSpec {
        LinkSpec {
            source,
            target,
            class: LinkClass::Lineage,
            secondary_hybrid: false,
            extinct: false,
        }
    }

    fn synced(specs: &[NodeSpec], links: &[LinkSpec]) -> SceneState {
        let mut scene = SceneState::default();
        let mut rng = StdRng::seed_from_u64(1);
        scene.sync(specs, links, &AnimationConfig::default(), &mut rng);
        scene
    }

    #[test]
    fn new_nodes_spawn_at_parent() {
        let mut scene = synced(&[spec("R", None, 0.0, 0.0)], &[]);
        let mut rng = StdRng::seed_from_u64(2);
        scene.sync(
            &[spec("R", None, 0.0, 0.0), spec("A", Some(0), 50.0, 120.0)],
            &[lineage(0, 1)],
            &AnimationConfig::default(),
            &mut rng,
        );

        let child = scene.node("A").expect("spawned");
        assert_eq!(child.position, pos2(0.0, 0.0));
        assert_eq!(child.target, pos2(50.0, 120.0));
        assert_eq!(scene.links().len(), 1);
        assert_eq!(scene.particles().len(), 1);
    }

    #[test]
    fn leaving_nodes_are_freed_with_links_and_particles() {
        let mut scene = synced(
            &[
                spec("R", None, 0.0, 0.0),
                spec("A", Some(0), -80.0, 120.0),
                spec("B", Some(0), 80.0, 120.0),
            ],
            &[lineage(0, 1), lineage(0, 2)],
        );
        let kept_phase = scene.particles()[1].t;

        let mut rng = StdRng::seed_from_u64(3);
        scene.sync(
            &[spec("R", None, 0.0, 0.0), spec("B", Some(0), 0.0, 120.0)],
            &[lineage(0, 1)],
            &AnimationConfig::default(),
            &mut rng,
        );

        assert!(scene.node("A").is_none());
        assert_eq!(scene.nodes().len(), 2);
        assert_eq!(scene.links().len(), 1);
        assert_eq!(scene.links()[0].target_id, "B");
        assert_eq!(scene.particles().len(), 1);
        assert_eq!(scene.particles()[0].t, kept_phase);
        for (id, &index) in &scene.index_by_id {
            assert_eq!(&scene.nodes()[index].id, id);
        }
    }

    #[test]
    fn extinct_and_secondary_links_carry_no_particles() {
        let mut extinct = lineage(0, 1);
        extinct.extinct = true;
        let secondary = LinkSpec {
            class: LinkClass::Hybrid,
            secondary_hybrid: true,
            ..lineage(0, 2)
        };
        let scene = synced(
            &[
                spec("R", None, 0.0, 0.0),
                spec("A", Some(0), -80.0, 120.0),
                spec("H", Some(0), 80.0, 120.0),
            ],
            &[extinct, secondary],
        );

        assert!(scene.particles().is_empty());
        assert_eq!(scene.links()[1].style, LinkStyle::Dashed);
    }

    #[test]
    fn emphasis_orders_selected_last() {
        let mut scene = synced(
            &[
                spec("R", None, 0.0, 0.0),
                spec("A", Some(0), -80.0, 120.0),
                spec("B", Some(0), 80.0, 120.0),
            ],
            &[],
        );
        scene.set_emphasis(Some("A"), Some("R"), false);

        let order = scene
            .draw_order()
            .iter()
            .map(|&index| scene.nodes()[index].id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["B", "A", "R"]);
        assert_eq!(scene.node("A").map(|node| node.goal.lift), Some(-5.0));
        assert_eq!(scene.node("R").map(|node| node.goal.scale), Some(1.12));
    }

    #[test]
    fn secondary_hybrid_links_show_only_when_touched_or_toggled() {
        let secondary = LinkSpec {
            class: LinkClass::Hybrid,
            secondary_hybrid: true,
            ..lineage(1, 2)
        };
        let mut scene = synced(
            &[
                spec("R", None, 0.0, 0.0),
                spec("P", Some(0), -80.0, 120.0),
                spec("H", Some(0), 80.0, 120.0),
            ],
            &[secondary],
        );

        scene.set_emphasis(None, None, false);
        assert_eq!(scene.links()[0].target_alpha, 0.0);

        scene.set_emphasis(Some("H"), None, false);
        assert!(scene.links()[0].highlighted);
        assert_eq!(scene.links()[0].target_width, 2.4);

        scene.set_emphasis(None, None, true);
        assert!(!scene.links()[0].highlighted);
        assert_eq!(scene.links()[0].target_alpha, 0.45);
    }

    #[test]
    fn particle_alpha_peaks_mid_path() {
        let at = |t: f32| {
            FlowParticle {
                link: 0,
                t,
                speed: 0.01,
            }
            .alpha()
        };
        assert_eq!(at(0.0), 0.0);
        assert!((at(0.5) - 1.0).abs() < 1e-6);
        assert!(at(0.25) < at(0.5));
        assert!(at(0.999) < 0.01);
    }

    #[test]
    fn particles_show_once_their_link_fades_in() {
        let mut scene = synced(
            &[spec("R", None, 0.0, 0.0), spec("A", Some(0), 0.0, 120.0)],
            &[lineage(0, 1)],
        );
        assert_eq!(scene.particles().len(), 1);
        assert_eq!(scene.particle_points().count(), 0);

        scene.set_emphasis(None, None, false);
        let animation = AnimationConfig::default();
        let node = NodeConfig::default();
        for _ in 0..60 {
            scene.animate(1.0, None, &animation, &node);
        }
        assert!(scene.links()[0].is_visible());

        scene.particles[0].t = 0.5;
        let points = scene.particle_points().collect::<Vec<_>>();
        let link = &scene.links()[0];
        assert_eq!(points.len(), 1);
        assert!((points[0].0 - link.path.point_at(0.5)).length() < 1e-4);
        assert!((points[0].1 - link.alpha).abs() < 1e-4);
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut scene = synced(
            &[spec("A", None, 0.0, 0.0), spec("B", Some(0), 10.0, 0.0)],
            &[],
        );
        let node = NodeConfig::default();
        scene.set_emphasis(None, Some("A"), false);
        assert_eq!(scene.hit_test(pos2(5.0, 0.0), &node), scene.index_of("A"));
        assert_eq!(scene.hit_test(pos2(500.0, 0.0), &node), None);
    }
}
