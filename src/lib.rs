pub mod camera;
pub mod config;
pub mod engine;
pub mod hierarchy;
pub mod interaction;
pub mod layout;
pub mod lineage;
pub mod scene;
pub mod util;
pub mod visibility;

pub use config::EngineConfig;
pub use engine::{EngineEvent, EngineKey, EngineStats, GraphEngine};
pub use lineage::LineageNode;
