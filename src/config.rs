//! Runtime settings driven by the host control panel.
//!
//! [`LayoutSettings`] outlives any single dataset and is read by the force
//! simulation on restart. [`DisplaySettings`] and [`NodeFilter`] are applied to
//! the objects already in the scene as soon as they change.

use std::str::FromStr;

use serde::Deserialize;

use crate::data::CommitData;
use crate::error::GraphError;

/// Force simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    /// Many-body strength; negative values repel.
    pub charge: f32,
    /// Rest length of link springs.
    pub link_distance: f32,
    /// Pull of the centroid toward the origin (0..=1).
    pub center_strength: f32,
    /// Fraction of velocity removed each tick (0..=1).
    pub damping: f32,
    /// Minimum separation radius between node centres.
    pub collision_radius: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            charge: -30.0,
            link_distance: 30.0,
            center_strength: 1.0,
            damping: 0.4,
            collision_radius: 5.0,
        }
    }
}

impl LayoutSettings {
    /// Set one field by parameter name.
    pub fn set(&mut self, parameter: LayoutParameter, value: f32) {
        match parameter {
            LayoutParameter::Charge => self.charge = value,
            LayoutParameter::LinkDistance => self.link_distance = value.max(0.0),
            LayoutParameter::CenterStrength => self.center_strength = value.clamp(0.0, 1.0),
            LayoutParameter::Damping => self.damping = value.clamp(0.0, 1.0),
            LayoutParameter::CollisionRadius => self.collision_radius = value.max(0.0),
        }
    }
}

/// Names of the tunable force parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutParameter {
    Charge,
    LinkDistance,
    CenterStrength,
    Damping,
    CollisionRadius,
}

impl FromStr for LayoutParameter {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charge" => Ok(Self::Charge),
            "linkDistance" | "link_distance" => Ok(Self::LinkDistance),
            "centerStrength" | "center_strength" | "centering" => Ok(Self::CenterStrength),
            "damping" | "velocityDecay" => Ok(Self::Damping),
            "collisionRadius" | "collision_radius" | "collision" => Ok(Self::CollisionRadius),
            other => Err(GraphError::UnknownParameter(other.to_string())),
        }
    }
}

/// Visual settings applied to every rendered object.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    /// Multiplier on node radius.
    pub node_scale: f32,
    /// Tube radius / line width for edges.
    pub edge_thickness: f32,
    pub show_labels: bool,
    pub auto_rotate: bool,
    /// Radians per second when auto-rotating.
    pub rotate_speed: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            node_scale: 1.0,
            edge_thickness: 0.5,
            show_labels: true,
            auto_rotate: false,
            rotate_speed: 0.5,
        }
    }
}

/// Commit visibility filter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeFilter {
    pub show_merges: bool,
    pub show_initial: bool,
    pub min_files: usize,
    pub max_files: Option<usize>,
    /// Case-insensitive substring of the author name; empty matches all.
    pub author: String,
}

impl Default for NodeFilter {
    fn default() -> Self {
        Self {
            show_merges: true,
            show_initial: true,
            min_files: 0,
            max_files: None,
            author: String::new(),
        }
    }
}

impl NodeFilter {
    /// Whether a commit passes the filter.
    pub fn matches(&self, commit: &CommitData) -> bool {
        if !self.show_merges && commit.is_merge() {
            return false;
        }
        if !self.show_initial && commit.is_initial {
            return false;
        }
        let files = commit.files_changed.len();
        if files < self.min_files {
            return false;
        }
        if self.max_files.is_some_and(|max| files > max) {
            return false;
        }
        if !self.author.is_empty()
            && !commit
                .author
                .to_lowercase()
                .contains(&self.author.to_lowercase())
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_names() {
        assert_eq!("charge".parse::<LayoutParameter>().unwrap(), LayoutParameter::Charge);
        assert_eq!(
            "linkDistance".parse::<LayoutParameter>().unwrap(),
            LayoutParameter::LinkDistance
        );
        assert!(matches!(
            "gravity".parse::<LayoutParameter>(),
            Err(GraphError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_settings_set_clamps() {
        let mut settings = LayoutSettings::default();
        settings.set(LayoutParameter::Damping, 3.0);
        assert_eq!(settings.damping, 1.0);
        settings.set(LayoutParameter::Charge, -120.0);
        assert_eq!(settings.charge, -120.0);
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: LayoutSettings = serde_json::from_str(r#"{"linkDistance": 12}"#).unwrap();
        assert_eq!(settings.link_distance, 12.0);
        assert_eq!(settings.charge, LayoutSettings::default().charge);
    }

    #[test]
    fn test_filter_matches() {
        let commit = CommitData {
            author: "Grace Hopper".into(),
            files_changed: vec!["a".into(), "b".into()],
            is_merge: Some(true),
            ..CommitData::default()
        };
        assert!(NodeFilter::default().matches(&commit));

        let hide_merges = NodeFilter {
            show_merges: false,
            ..NodeFilter::default()
        };
        assert!(!hide_merges.matches(&commit));

        let by_author = NodeFilter {
            author: "grace".into(),
            ..NodeFilter::default()
        };
        assert!(by_author.matches(&commit));

        let too_many = NodeFilter {
            max_files: Some(1),
            ..NodeFilter::default()
        };
        assert!(!too_many.matches(&commit));

        let too_few = NodeFilter {
            min_files: 3,
            ..NodeFilter::default()
        };
        assert!(!too_few.matches(&commit));
    }
}
