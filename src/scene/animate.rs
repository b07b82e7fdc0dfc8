use eframe::egui::{Pos2, Vec2};

use super::{ElbowPath, SceneState};
use crate::config::{AnimationConfig, NodeConfig};

/// Frames elapsed at 60 Hz, clamped so a stalled frame cannot overshoot the easing.
pub fn frame_delta(dt_seconds: f64) -> f32 {
    if dt_seconds.is_finite() {
        (dt_seconds * 60.0).clamp(0.0, 4.0) as f32
    } else {
        0.0
    }
}

/// Pull of the cursor on a node resting at `target`.
pub fn magnetic_offset(target: Pos2, cursor: Option<Pos2>, config: &AnimationConfig) -> Vec2 {
    let Some(cursor) = cursor else {
        return Vec2::ZERO;
    };
    let delta = cursor - target;
    let distance = delta.length();
    if config.magnet_radius <= 0.0 || distance >= config.magnet_radius {
        return Vec2::ZERO;
    }

    let offset = delta * (1.0 - distance / config.magnet_radius) * config.magnet_strength;
    let length = offset.length();
    if length > config.magnet_max_offset && length > 0.0 {
        offset * (config.magnet_max_offset / length)
    } else {
        offset
    }
}

impl SceneState {
    /// Advances every animated quantity by `frame_delta` 60 Hz frames.
    pub fn animate(
        &mut self,
        frame_delta: f32,
        cursor_world: Option<Pos2>,
        animation: &AnimationConfig,
        node_config: &NodeConfig,
    ) {
        let amount = (animation.ease_rate * frame_delta).clamp(0.0, 1.0);

        for node in &mut self.nodes {
            node.magnetic = if node.is_virtual() {
                Vec2::ZERO
            } else {
                magnetic_offset(node.target, cursor_world, animation)
            };
            let goal = node.target + node.magnetic;
            node.position += (goal - node.position) * amount;
            let look_goal = node.goal;
            node.look.ease_toward(&look_goal, amount);
        }

        for link in &mut self.links {
            link.alpha += (link.target_alpha - link.alpha) * amount;
            link.width += (link.target_width - link.width) * amount;
            let source = &self.nodes[link.source];
            let target = &self.nodes[link.target];
            link.path = ElbowPath::new(
                source.bottom_anchor(node_config),
                target.top_anchor(node_config),
            );
        }

        for particle in &mut self.particles {
            particle.t += particle.speed * frame_delta;
            if particle.t >= 1.0 {
                particle.t = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::scene::{LinkClass, LinkSpec, NodeSpec};

    fn two_node_scene() -> SceneState {
        let specs = [
            NodeSpec {
                id: "R".to_owned(),
                record: Some(0),
                parent: None,
                depth: 0,
                target: pos2(0.0, 0.0),
                collapsed: false,
                hidden_descendants: 0,
            },
            NodeSpec {
                id: "A".to_owned(),
                record: Some(1),
                parent: Some(0),
                depth: 1,
                target: pos2(0.0, 120.0),
                collapsed: false,
                hidden_descendants: 0,
            },
        ];
        let links = [LinkSpec {
            source: 0,
            target: 1,
            class: LinkClass::Lineage,
            secondary_hybrid: false,
            extinct: false,
        }];
        let mut scene = SceneState::default();
        let mut rng = StdRng::seed_from_u64(9);
        scene.sync(&specs, &links, &AnimationConfig::default(), &mut rng);
        scene
    }

    #[test]
    fn frame_delta_is_clamped() {
        assert_eq!(frame_delta(1.0 / 60.0), 1.0);
        assert_eq!(frame_delta(1.0), 4.0);
        assert_eq!(frame_delta(-0.5), 0.0);
        assert_eq!(frame_delta(f64::NAN), 0.0);
    }

    #[test]
    fn magnet_pulls_toward_cursor_and_is_capped() {
        let config = AnimationConfig::default();
        let target = pos2(0.0, 0.0);

        assert_eq!(magnetic_offset(target, None, &config), Vec2::ZERO);
        assert_eq!(
            magnetic_offset(target, Some(pos2(100.0, 0.0)), &config),
            Vec2::ZERO
        );

        let pull = magnetic_offset(target, Some(pos2(40.0, 0.0)), &config);
        assert!((pull.x - 40.0 * 0.5 * 0.15).abs() < 1e-5);
        assert_eq!(pull.y, 0.0);

        let strong = AnimationConfig {
            magnet_strength: 10.0,
            ..config
        };
        let capped = magnetic_offset(target, Some(pos2(0.0, 40.0)), &strong);
        assert!((capped.length() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn spawned_child_eases_out_of_parent() {
        let mut scene = two_node_scene();
        let config = AnimationConfig::default();
        let node = NodeConfig::default();

        scene.animate(1.0, None, &config, &node);
        let child = scene.node("A").expect("child");
        assert!((child.position.y - 18.0).abs() < 1e-4);

        for _ in 0..400 {
            scene.animate(1.0, None, &config, &node);
        }
        let child = scene.node("A").expect("child");
        assert!((child.position - pos2(0.0, 120.0)).length() < 1e-3);
    }

    #[test]
    fn looks_and_links_follow_targets() {
        let mut scene = two_node_scene();
        scene.set_emphasis(Some("A"), None, false);
        let node = NodeConfig::default();
        for _ in 0..400 {
            scene.animate(4.0, None, &AnimationConfig::default(), &node);
        }

        let child = scene.node("A").expect("child");
        assert!((child.look.lift + 5.0).abs() < 1e-3);
        assert!((child.look.scale - 1.06).abs() < 1e-4);

        let link = &scene.links()[0];
        assert!((link.alpha - link.target_alpha).abs() < 1e-4);
        assert_eq!(link.path.start, pos2(0.0, 22.0));
        assert!((link.path.end.y - (120.0 - 5.0 - 22.0 * child.look.scale)).abs() < 1e-3);
    }

    #[test]
    fn particles_wrap_to_zero() {
        let mut scene = two_node_scene();
        scene.particles[0].t = 0.999;
        scene.particles[0].speed = 0.005;
        scene.animate(1.0, None, &AnimationConfig::default(), &NodeConfig::default());
        assert_eq!(scene.particles()[0].t, 0.0);

        scene.animate(2.0, None, &AnimationConfig::default(), &NodeConfig::default());
        assert!((scene.particles()[0].t - 0.01).abs() < 1e-6);
    }

    #[test]
    fn magnet_targets_the_resting_position() {
        let mut scene = two_node_scene();
        let node = NodeConfig::default();
        let cursor = Some(pos2(0.0, 120.0) + vec2(30.0, 0.0));
        for _ in 0..400 {
            scene.animate(4.0, cursor, &AnimationConfig::default(), &node);
        }
        let child = scene.node("A").expect("child");
        let expected = 30.0 * (1.0 - 30.0 / 80.0) * 0.15;
        assert!((child.position.x - expected).abs() < 1e-3);
    }
}
