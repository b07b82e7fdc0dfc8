use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

use crate::layout::{DEFAULT_COUSIN_SEPARATION, TreeSpacing};

/// Every tunable of the engine. Missing keys in a config file keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub node: NodeConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub links: LinkConfig,
    pub interaction: InteractionConfig,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub spacing_x: f32,
    pub spacing_y: f32,
    pub cousin_separation: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing_x: 160.0,
            spacing_y: 120.0,
            cousin_separation: DEFAULT_COUSIN_SEPARATION,
        }
    }
}

impl LayoutConfig {
    pub fn spacing(&self) -> TreeSpacing {
        TreeSpacing {
            horizontal: self.spacing_x,
            vertical: self.spacing_y,
            cousin_separation: self.cousin_separation,
        }
    }
}

/// World-space size of a node card, used for hit testing and link anchors.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub half_width: f32,
    pub half_height: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            half_width: 62.0,
            half_height: 22.0,
        }
    }
}

impl NodeConfig {
    pub fn half_extent(&self) -> Vec2 {
        vec2(self.half_width, self.half_height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub home_offset: [f32; 2],
    pub home_zoom: f32,
    pub fit_margin: f32,
    pub fit_zoom_cap: f32,
    pub fit_shrink: f32,
    pub min_fit_extent: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            home_offset: [400.0, 80.0],
            home_zoom: 0.7,
            fit_margin: 80.0,
            fit_zoom_cap: 1.2,
            fit_shrink: 0.9,
            min_fit_extent: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Exponential smoothing rate per 60 Hz frame.
    pub ease_rate: f32,
    pub magnet_radius: f32,
    pub magnet_strength: f32,
    pub magnet_max_offset: f32,
    pub particle_speed_min: f32,
    pub particle_speed_max: f32,
    /// Fixed seed for particle phases; entropy when absent.
    pub particle_seed: Option<u64>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            ease_rate: 0.15,
            magnet_radius: 80.0,
            magnet_strength: 0.15,
            magnet_max_offset: 20.0,
            particle_speed_min: 0.003,
            particle_speed_max: 0.008,
            particle_seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub dash_length: f32,
    pub gap_length: f32,
    pub show_all_hybrid_links: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            dash_length: 7.0,
            gap_length: 5.0,
            show_all_hybrid_links: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub double_click_secs: f64,
    pub rebuild_delay_secs: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            double_click_secs: 0.25,
            rebuild_delay_secs: 0.016,
        }
    }
}
