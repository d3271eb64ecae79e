//! Continuous force-directed layout in three dimensions.
//!
//! A velocity-Verlet style simulation in the manner of d3-force: many-body
//! repulsion, link springs, centering and collision, cooled by an `alpha` term
//! that decays towards zero. Rendered positions trail the simulated ones by a
//! fixed interpolation factor so motion on screen stays smooth.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use serde::Serialize;

use crate::config::{LayoutParameter, LayoutSettings};

/// Fraction of the gap between rendered and simulated position closed per tick.
pub const INTERPOLATION: f32 = 0.1;

/// Simulation stops once alpha falls below this.
pub const ALPHA_MIN: f32 = 0.001;

/// Minimum squared distance used by the many-body force.
const DISTANCE_MIN_2: f32 = 1.0;

/// Collision force strength.
const COLLIDE_STRENGTH: f32 = 0.7;

/// Per-tick alpha decay giving roughly 300 ticks from hot to [`ALPHA_MIN`].
pub fn default_alpha_decay() -> f32 {
    1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

/// A node handed to the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceNode {
    pub key: String,
    /// Starting position.
    pub position: Vec3,
}

/// State reported to the tick callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickInfo {
    pub tick: u64,
    pub alpha: f32,
}

pub type TickCallback = Box<dyn FnMut(&TickInfo)>;

/// The force simulation.
pub struct ForceLayout {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    simulated: Vec<Vec3>,
    velocities: Vec<Vec3>,
    rendered: Vec<Vec3>,
    fixed: Vec<Option<Vec3>>,

    links: Vec<(usize, usize)>,
    link_strength: Vec<f32>,
    link_bias: Vec<f32>,

    settings: LayoutSettings,
    alpha: f32,
    alpha_decay: f32,
    ticks: u64,
    running: bool,
    on_tick: Option<TickCallback>,
}

impl fmt::Debug for ForceLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceLayout")
            .field("nodes", &self.keys.len())
            .field("links", &self.links.len())
            .field("alpha", &self.alpha)
            .field("running", &self.running)
            .finish()
    }
}

impl ForceLayout {
    /// Start a simulation over `nodes` joined by `links` (pairs of node keys).
    ///
    /// Links naming an unknown key are ignored.
    pub fn initialize(
        nodes: Vec<ForceNode>,
        links: &[(String, String)],
        settings: LayoutSettings,
        on_tick: Option<TickCallback>,
    ) -> Self {
        let mut keys = Vec::with_capacity(nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());
        let mut simulated = Vec::with_capacity(nodes.len());
        let mut rendered = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.into_iter().enumerate() {
            index.insert(node.key.clone(), i);
            keys.push(node.key);
            rendered.push(node.position);
            // Lift nodes out of a flat starting layout so the third axis gets used.
            simulated.push(node.position + Vec3::Y * spread(i));
        }
        let count = keys.len();

        let links: Vec<(usize, usize)> = links
            .iter()
            .filter_map(|(s, t)| Some((*index.get(s)?, *index.get(t)?)))
            .filter(|(s, t)| s != t)
            .collect();

        let mut layout = Self {
            keys,
            index,
            simulated,
            velocities: vec![Vec3::ZERO; count],
            rendered,
            fixed: vec![None; count],
            links,
            link_strength: Vec::new(),
            link_bias: Vec::new(),
            settings,
            alpha: 1.0,
            alpha_decay: default_alpha_decay(),
            ticks: 0,
            running: count > 0,
            on_tick,
        };
        layout.init_links();
        log::debug!("force layout started: {count} nodes, {} links", layout.links.len());
        layout
    }

    fn init_links(&mut self) {
        let mut degree = vec![0usize; self.keys.len()];
        for &(s, t) in &self.links {
            degree[s] += 1;
            degree[t] += 1;
        }
        self.link_strength = self
            .links
            .iter()
            .map(|&(s, t)| 1.0 / degree[s].min(degree[t]).max(1) as f32)
            .collect();
        self.link_bias = self
            .links
            .iter()
            .map(|&(s, t)| degree[s] as f32 / (degree[s] + degree[t]).max(1) as f32)
            .collect();
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn node_count(&self) -> usize {
        self.keys.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Current on-screen positions, in input order.
    pub fn rendered_positions(&self) -> impl Iterator<Item = (&str, Vec3)> + '_ {
        self.keys.iter().map(String::as_str).zip(self.rendered.iter().copied())
    }

    pub fn rendered_position(&self, key: &str) -> Option<Vec3> {
        self.index.get(key).map(|&i| self.rendered[i])
    }

    pub fn simulated_position(&self, key: &str) -> Option<Vec3> {
        self.index.get(key).map(|&i| self.simulated[i])
    }

    pub fn is_pinned(&self, key: &str) -> bool {
        self.index.get(key).is_some_and(|&i| self.fixed[i].is_some())
    }

    /// Advance one tick. Returns false when the simulation is idle.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (0.0 - self.alpha) * self.alpha_decay;
        self.apply_many_body();
        self.apply_links();
        self.apply_collisions();
        self.integrate();
        self.apply_center();
        self.interpolate();

        self.ticks += 1;
        if let Some(on_tick) = self.on_tick.as_mut() {
            on_tick(&TickInfo {
                tick: self.ticks,
                alpha: self.alpha,
            });
        }
        if self.alpha < ALPHA_MIN {
            self.running = false;
            log::debug!("force layout cooled after {} ticks", self.ticks);
        }
        true
    }

    /// Hold a node at `position` and reheat the simulation.
    pub fn pin(&mut self, key: &str, position: Vec3) -> bool {
        let Some(&i) = self.index.get(key) else {
            return false;
        };
        self.fixed[i] = Some(position);
        self.simulated[i] = position;
        self.rendered[i] = position;
        self.velocities[i] = Vec3::ZERO;
        self.reheat();
        true
    }

    /// Release a pinned node and reheat the simulation.
    pub fn unpin(&mut self, key: &str) -> bool {
        let Some(&i) = self.index.get(key) else {
            return false;
        };
        self.fixed[i] = None;
        self.reheat();
        true
    }

    /// Change one parameter and restart with full energy.
    pub fn set_parameter(&mut self, parameter: LayoutParameter, value: f32) {
        self.settings.set(parameter, value);
        self.reheat();
    }

    /// Replace every parameter and restart with full energy.
    pub fn set_settings(&mut self, settings: LayoutSettings) {
        self.settings = settings;
        self.reheat();
    }

    /// Replace the per-tick callback.
    pub fn set_on_tick(&mut self, on_tick: Option<TickCallback>) {
        self.on_tick = on_tick;
    }

    /// Stop for good and drop all node and link state.
    pub fn destroy(&mut self) {
        self.running = false;
        self.keys.clear();
        self.index.clear();
        self.simulated.clear();
        self.velocities.clear();
        self.rendered.clear();
        self.fixed.clear();
        self.links.clear();
        self.link_strength.clear();
        self.link_bias.clear();
        self.on_tick = None;
        log::debug!("force layout destroyed after {} ticks", self.ticks);
    }

    fn reheat(&mut self) {
        self.alpha = 1.0;
        self.running = !self.keys.is_empty();
    }

    fn apply_many_body(&mut self) {
        let strength = self.settings.charge * self.alpha;
        let n = self.keys.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let mut delta = self.simulated[j] - self.simulated[i];
                if delta == Vec3::ZERO {
                    delta = jiggle(i, j);
                }
                let mut l2 = delta.length_squared();
                if l2 < DISTANCE_MIN_2 {
                    l2 = (DISTANCE_MIN_2 * l2).sqrt();
                }
                let w = strength / l2;
                self.velocities[i] += delta * w;
                self.velocities[j] -= delta * w;
            }
        }
    }

    fn apply_links(&mut self) {
        let distance = self.settings.link_distance;
        for (k, &(s, t)) in self.links.iter().enumerate() {
            let mut delta =
                (self.simulated[t] + self.velocities[t]) - (self.simulated[s] + self.velocities[s]);
            if delta == Vec3::ZERO {
                delta = jiggle(s, t);
            }
            let length = delta.length();
            let pull = (length - distance) / length * self.alpha * self.link_strength[k];
            let delta = delta * pull;
            let bias = self.link_bias[k];
            self.velocities[t] -= delta * bias;
            self.velocities[s] += delta * (1.0 - bias);
        }
    }

    fn apply_collisions(&mut self) {
        let radius = self.settings.collision_radius;
        if radius <= 0.0 {
            return;
        }
        let reach = radius * 2.0;
        let n = self.keys.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let mut delta = (self.simulated[i] + self.velocities[i])
                    - (self.simulated[j] + self.velocities[j]);
                let mut length = delta.length();
                if length >= reach {
                    continue;
                }
                if length == 0.0 {
                    delta = jiggle(i, j);
                    length = delta.length();
                }
                let push = (reach - length) / length * COLLIDE_STRENGTH * 0.5;
                self.velocities[i] += delta * push;
                self.velocities[j] -= delta * push;
            }
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.settings.damping;
        for i in 0..self.keys.len() {
            if let Some(fixed) = self.fixed[i] {
                self.simulated[i] = fixed;
                self.velocities[i] = Vec3::ZERO;
            } else {
                self.velocities[i] *= keep;
                self.simulated[i] += self.velocities[i];
            }
        }
    }

    fn apply_center(&mut self) {
        let free: Vec<usize> = (0..self.keys.len()).filter(|&i| self.fixed[i].is_none()).collect();
        if free.is_empty() {
            return;
        }
        let mean = free.iter().map(|&i| self.simulated[i]).sum::<Vec3>() / free.len() as f32;
        let shift = mean * self.settings.center_strength;
        for i in free {
            self.simulated[i] -= shift;
        }
    }

    fn interpolate(&mut self) {
        for i in 0..self.keys.len() {
            match self.fixed[i] {
                Some(fixed) => self.rendered[i] = fixed,
                None => {
                    let step = (self.simulated[i] - self.rendered[i]) * INTERPOLATION;
                    self.rendered[i] += step;
                }
            }
        }
    }
}

/// Deterministic small vertical offset for slot `i`.
fn spread(i: usize) -> f32 {
    ((i * 7919) % 97) as f32 / 97.0 - 0.5
}

/// Deterministic tiny displacement separating coincident points.
fn jiggle(i: usize, j: usize) -> Vec3 {
    let seed = (i * 31 + j * 17) % 13;
    Vec3::new(1e-3 * (seed as f32 + 1.0), 1e-3, -1e-3 * (seed as f32 + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn node(key: &str, position: Vec3) -> ForceNode {
        ForceNode {
            key: key.to_string(),
            position,
        }
    }

    fn link(s: &str, t: &str) -> (String, String) {
        (s.to_string(), t.to_string())
    }

    fn gap(layout: &ForceLayout) -> f32 {
        let a = layout.simulated_position("a").unwrap();
        a.distance(layout.simulated_position("b").unwrap())
    }

    #[test]
    fn test_alpha_decay_constant() {
        let decay = default_alpha_decay();
        assert!((decay - 0.0228).abs() < 1e-3);
    }

    #[test]
    fn test_repulsion_separates_nodes() {
        let mut layout = ForceLayout::initialize(
            vec![node("a", Vec3::new(-1.0, 0.0, 0.0)), node("b", Vec3::new(1.0, 0.0, 0.0))],
            &[],
            LayoutSettings::default(),
            None,
        );
        let before = gap(&layout);
        for _ in 0..50 {
            layout.step();
        }
        let after = gap(&layout);
        assert!(after > before);
    }

    #[test]
    fn test_link_pulls_toward_rest_length() {
        let settings = LayoutSettings {
            charge: 0.0,
            collision_radius: 0.0,
            ..LayoutSettings::default()
        };
        let mut layout = ForceLayout::initialize(
            vec![node("a", Vec3::new(-100.0, 0.0, 0.0)), node("b", Vec3::new(100.0, 0.0, 0.0))],
            &[link("a", "b")],
            settings,
            None,
        );
        while layout.step() {}
        let d = gap(&layout);
        assert!((d - settings.link_distance).abs() < 5.0, "distance {d}");
    }

    #[test]
    fn test_rendered_trails_simulation() {
        let mut layout = ForceLayout::initialize(
            vec![node("a", Vec3::ZERO), node("b", Vec3::new(0.5, 0.0, 0.0))],
            &[],
            LayoutSettings::default(),
            None,
        );
        let start = layout.rendered_position("b").unwrap();
        layout.step();
        let rendered = layout.rendered_position("b").unwrap();
        let simulated = layout.simulated_position("b").unwrap();
        let expected = start + (simulated - start) * INTERPOLATION;
        assert!((rendered - expected).length() < 1e-5);
    }

    #[test]
    fn test_pin_holds_exact_position_and_reheats() {
        let mut layout = ForceLayout::initialize(
            vec![node("a", Vec3::ZERO), node("b", Vec3::X), node("c", Vec3::Z)],
            &[link("a", "b"), link("b", "c")],
            LayoutSettings::default(),
            None,
        );
        for _ in 0..100 {
            layout.step();
        }
        assert!(layout.alpha() < 0.5);

        let target = Vec3::new(40.0, 5.0, -3.0);
        assert!(layout.pin("b", target));
        assert_eq!(layout.alpha(), 1.0);
        assert!(layout.is_running());
        for _ in 0..20 {
            layout.step();
            assert_eq!(layout.rendered_position("b"), Some(target));
        }

        layout.step();
        assert!(layout.unpin("b"));
        assert_eq!(layout.alpha(), 1.0);
        assert!(!layout.is_pinned("b"));
        assert!(!layout.pin("ghost", Vec3::ZERO));
    }

    #[test]
    fn test_cools_and_stops() {
        let mut layout = ForceLayout::initialize(
            vec![node("a", Vec3::ZERO), node("b", Vec3::X)],
            &[link("a", "b")],
            LayoutSettings::default(),
            None,
        );
        let mut ticks = 0;
        while layout.step() {
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert!(!layout.is_running());
        assert!((290..=310).contains(&ticks));
    }

    #[test]
    fn test_set_parameter_restarts() {
        let nodes = vec![node("a", Vec3::ZERO)];
        let mut layout = ForceLayout::initialize(nodes, &[], LayoutSettings::default(), None);
        while layout.step() {}
        layout.set_parameter(LayoutParameter::LinkDistance, 80.0);
        assert_eq!(layout.settings().link_distance, 80.0);
        assert_eq!(layout.alpha(), 1.0);
        assert!(layout.is_running());
    }

    #[test]
    fn test_tick_callback_and_destroy() {
        let calls = Rc::new(Cell::new(0u64));
        let seen = Rc::clone(&calls);
        let mut layout = ForceLayout::initialize(
            vec![node("a", Vec3::ZERO), node("b", Vec3::X)],
            &[link("a", "b"), link("a", "ghost")],
            LayoutSettings::default(),
            Some(Box::new(move |info: &TickInfo| seen.set(info.tick))),
        );
        layout.step();
        layout.step();
        assert_eq!(calls.get(), 2);

        layout.destroy();
        assert!(!layout.step());
        assert_eq!(layout.node_count(), 0);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_set_on_tick_replaces_callback() {
        let alphas: Rc<Cell<f32>> = Rc::default();
        let seen = Rc::clone(&alphas);
        let mut layout = ForceLayout::initialize(
            vec![node("a", Vec3::ZERO), node("b", Vec3::X)],
            &[],
            LayoutSettings::default(),
            None,
        );
        layout.step();
        layout.set_on_tick(Some(Box::new(move |info: &TickInfo| seen.set(info.alpha))));
        layout.step();
        assert_eq!(alphas.get(), layout.alpha());

        layout.set_on_tick(None);
        layout.step();
        assert_ne!(alphas.get(), layout.alpha());
    }
}
