use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

/// Force configuration read on every tick. Mutating it takes effect on the
/// next step without rebuilding the graph.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    pub link_distance: f32,
    pub link_strength: f32,
    /// Default link strength multiplier for edges ending at clustered kinds.
    pub clustered_link_scale: f32,
    pub repulsion: f32,
    pub repulsion_softening: f32,
    pub collision_radius: f32,
    pub collision_strength: f32,
    pub center_strength: f32,
    pub clustering: bool,
    pub cluster_strength: f32,
    pub cluster_distance: f32,
    pub radial_strength: f32,
    pub radial_radius: f32,
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub drag_alpha_target: f32,
    pub rebuild_alpha: f32,
    pub spawn_jitter: f32,
    pub max_speed: f32,
    pub energy_threshold: f32,
    pub max_ticks: u32,
    #[serde(skip)]
    pub center: Vec2,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            link_distance: 140.0,
            link_strength: 0.6,
            clustered_link_scale: 0.15,
            repulsion: 12_000.0,
            repulsion_softening: 400.0,
            collision_radius: 1.0,
            collision_strength: 0.7,
            center_strength: 0.05,
            clustering: true,
            cluster_strength: 0.06,
            cluster_distance: 620.0,
            radial_strength: 0.1,
            radial_radius: 340.0,
            velocity_decay: 0.4,
            alpha_decay: 0.0228,
            drag_alpha_target: 0.3,
            rebuild_alpha: 0.7,
            spawn_jitter: 24.0,
            max_speed: 40.0,
            energy_threshold: 0.5,
            max_ticks: 600,
            center: Vec2::ZERO,
        }
    }
}

impl ForceParams {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read force parameters from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid force parameters in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"link_distance": 90.0, "clustering": false}}"#).unwrap();

        let params = ForceParams::from_json_file(file.path()).unwrap();
        let defaults = ForceParams::default();
        assert_eq!(params.link_distance, 90.0);
        assert!(!params.clustering);
        assert_eq!(params.repulsion, defaults.repulsion);
        assert_eq!(params.max_ticks, defaults.max_ticks);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ link_distance: ").unwrap();
        assert!(ForceParams::from_json_file(file.path()).is_err());
    }
}
