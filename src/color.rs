//! Colour policy for nodes and edges.
//!
//! Pure functions from semantic attributes (initial commit, merge commit,
//! branch name, edge kind) to display colours, plus the hover and selection
//! variants used by the interaction controller.

use serde::Serialize;

/// RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Packed `0xRRGGBB`, the form three.js materials take.
    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
    pub fn lighten(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let up = |c: u8| (c as f32 + (255.0 - c as f32) * f).round() as u8;
        Self {
            r: up(self.r),
            g: up(self.g),
            b: up(self.b),
        }
    }

    /// Linear interpolation between two colors
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

pub const INITIAL_COMMIT: Color = Color::from_hex(0x4caf50);
pub const MERGE_COMMIT: Color = Color::from_hex(0xff5722);
pub const REGULAR_COMMIT: Color = Color::from_hex(0x2196f3);
pub const DATA_EDGE: Color = Color::from_hex(0x8899aa);
pub const BRANCH_EDGE: Color = Color::from_hex(0x66bb6a);
pub const HOVER: Color = Color::from_hex(0xffeb3b);
pub const NEIGHBOR: Color = Color::from_hex(0xffc107);
pub const HIGHLIGHT_EDGE: Color = Color::from_hex(0xffd54f);
pub const SELECTED: Color = Color::from_hex(0xffffff);
pub const MARKER: Color = Color::from_hex(0xb0bec5);

/// Branch cluster palette.
const BRANCH_PALETTE: [Color; 8] = [
    Color::rgb(94, 129, 172),
    Color::rgb(180, 136, 100),
    Color::rgb(130, 120, 150),
    Color::rgb(100, 148, 160),
    Color::rgb(180, 120, 100),
    Color::rgb(120, 158, 110),
    Color::rgb(170, 145, 115),
    Color::rgb(110, 125, 155),
];

/// Colour for a commit node.
pub fn commit_color(is_initial: bool, is_merge: bool) -> Color {
    if is_initial {
        INITIAL_COMMIT
    } else if is_merge {
        MERGE_COMMIT
    } else {
        REGULAR_COMMIT
    }
}

/// Stable colour for a branch cluster, derived from the branch name.
pub fn branch_color(branch: &str) -> Color {
    // FNV-1a, stable across runs and platforms.
    let hash = branch
        .bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
    BRANCH_PALETTE[hash as usize % BRANCH_PALETTE.len()]
}

/// Colour for an edge by kind.
pub fn edge_color(branch_connection: bool) -> Color {
    if branch_connection { BRANCH_EDGE } else { DATA_EDGE }
}

/// Colour shown on the hovered node itself.
pub fn hover_variant(_base: Color) -> Color {
    HOVER
}

/// Colour shown on nodes adjacent to the hovered node.
pub fn neighbor_variant(base: Color) -> Color {
    base.lerp(NEIGHBOR, 0.6)
}

/// Colour shown on a selected node.
pub fn selected_variant(base: Color) -> Color {
    base.lighten(0.5).lerp(SELECTED, 0.3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        assert_eq!(Color::from_hex(0x2196f3).to_hex(), 0x2196f3);
    }

    #[test]
    fn test_commit_color_precedence() {
        assert_eq!(commit_color(true, true), INITIAL_COMMIT);
        assert_eq!(commit_color(false, true), MERGE_COMMIT);
        assert_eq!(commit_color(false, false), REGULAR_COMMIT);
    }

    #[test]
    fn test_branch_color_stable() {
        assert_eq!(branch_color("main"), branch_color("main"));
        assert!(BRANCH_PALETTE.contains(&branch_color("feature/x")));
    }

    #[test]
    fn test_lighten_and_lerp() {
        let black = Color::rgb(0, 0, 0);
        assert_eq!(black.lighten(1.0), Color::rgb(255, 255, 255));
        assert_eq!(black.lighten(0.0), black);
        assert_eq!(black.lerp(Color::rgb(200, 100, 50), 0.5), Color::rgb(100, 50, 25));
    }

    #[test]
    fn test_variants_differ_from_base() {
        assert_ne!(neighbor_variant(REGULAR_COMMIT), REGULAR_COMMIT);
        assert_ne!(selected_variant(REGULAR_COMMIT), REGULAR_COMMIT);
        assert_eq!(hover_variant(MERGE_COMMIT), HOVER);
    }
}
