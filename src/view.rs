//! View Coordinator and the per-session scene context.
//!
//! The coordinator owns the active layout, the last dataset it was given and
//! everything derived from it. Rebuilds plan the new scene first and only clear
//! the store once the plan exists, so a failing layout leaves the old scene up.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::Serialize;

use crate::analysis::{self, AnalysisKey, AnalysisLookup, AnalysisService, CompletedAnalysis};
use crate::camera::{ndc_from_pixels, Camera, Ray};
use crate::config::{DisplaySettings, LayoutParameter, LayoutSettings, NodeFilter};
use crate::data::{CommitData, Dataset, NodeRecord};
use crate::diff::{self, DiffRequest, DIFF_UNAVAILABLE};
use crate::error::{GraphError, Result};
use crate::expansion::ExpansionController;
use crate::graph::{NodeId, SceneStore};
use crate::interaction::{ClickAction, InteractionController};
use crate::layout::branch_tree::{self, BranchTreeConfig};
use crate::layout::force::{ForceLayout, ForceNode, TickCallback, TickInfo};
use crate::layout::radial::{self, RadialConfig};
use crate::layout::spiral::{self, SpiralConfig};
use crate::layout::timeline::{self, TimelineConfig};
use crate::layout::ScenePlan;
use crate::metrics::{self, GraphMetrics};
use crate::render::RenderBackend;

/// Diagnostics kept, newest last.
pub const MAX_DIAGNOSTICS: usize = 64;

/// The discrete layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Radial,
    Tree,
    Linear,
    Timeline,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Radial => "radial",
            ViewMode::Tree => "tree",
            ViewMode::Linear => "linear",
            ViewMode::Timeline => "timeline",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "radial" => Ok(ViewMode::Radial),
            "tree" | "branch" => Ok(ViewMode::Tree),
            "linear" | "spiral" => Ok(ViewMode::Linear),
            "timeline" => Ok(ViewMode::Timeline),
            other => Err(GraphError::UnknownViewMode(other.to_string())),
        }
    }
}

/// What is currently positioning the nodes.
///
/// The force simulation replaces the discrete layouts while it runs.
#[derive(Debug)]
pub enum ActiveLayout {
    Discrete(ViewMode),
    Force(ForceLayout),
}

impl ActiveLayout {
    pub fn name(&self) -> &'static str {
        match self {
            ActiveLayout::Discrete(mode) => mode.as_str(),
            ActiveLayout::Force(_) => "force",
        }
    }
}

/// Tunables for the discrete layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutConfigs {
    pub radial: RadialConfig,
    pub tree: BranchTreeConfig,
    pub spiral: SpiralConfig,
    pub timeline: TimelineConfig,
}

/// A failure that was handled locally and reported instead of returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: &'static str,
    pub message: String,
}

/// Something the host should act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// Open the detail panel for a commit.
    #[serde(rename_all = "camelCase")]
    ShowCommit { key: String, commit: CommitData, related: Vec<String> },
    /// Fetch a file diff and report it with `completeDiff`.
    FetchDiff(DiffRequest),
    /// Produce a summary and report it with `completeAnalysis`.
    Analyze(analysis::AnalysisRequest),
    /// A summary is ready to show.
    AnalysisReady { key: AnalysisKey, summary: String },
    /// A diff is ready to show.
    DiffReady { commit: String, file: String, html: String },
}

/// Repository the commits belong to, needed for diff requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
}

/// Objects that live exactly as long as one visualization session.
pub struct SceneContext<B: RenderBackend> {
    pub store: SceneStore<B>,
    pub camera: Camera,
    pub interaction: InteractionController,
    pub expansion: ExpansionController,
    pub viewport: Vec2,
}

impl<B: RenderBackend> SceneContext<B> {
    pub fn new(backend: B) -> Self {
        Self {
            store: SceneStore::new(backend),
            camera: Camera::default(),
            interaction: InteractionController::new(),
            expansion: ExpansionController::default(),
            viewport: Vec2::new(1.0, 1.0),
        }
    }

    /// Empty the scene. Interaction and expansion state go with it.
    pub fn clear(&mut self) {
        self.interaction.reset();
        self.expansion = ExpansionController::default();
        self.store.clear();
    }

    /// Ray through a pixel of the viewport.
    pub fn ray_at(&self, x: f32, y: f32) -> Ray {
        self.camera
            .ray_from_ndc(ndc_from_pixels(x, y, self.viewport.x, self.viewport.y))
    }

    /// Point the camera at everything visible.
    pub fn reframe(&mut self) {
        if let Some((min, max)) = self.store.bounds() {
            self.camera.frame_bounds(min, max);
        }
    }
}

/// Top-level state machine.
pub struct ViewCoordinator<B: RenderBackend> {
    scene: SceneContext<B>,
    layout: ActiveLayout,
    configs: LayoutConfigs,
    settings: LayoutSettings,
    dataset: Option<Dataset>,
    analysis: AnalysisService,
    pending_diffs: HashMap<u64, (String, String)>,
    next_diff_id: u64,
    repository: Option<Repository>,
    tick_hook: Option<Rc<dyn Fn(&TickInfo)>>,
    events: Vec<EngineEvent>,
    diagnostics: VecDeque<Diagnostic>,
}

impl<B: RenderBackend> ViewCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            scene: SceneContext::new(backend),
            layout: ActiveLayout::Discrete(ViewMode::default()),
            configs: LayoutConfigs::default(),
            settings: LayoutSettings::default(),
            dataset: None,
            analysis: AnalysisService::new(),
            pending_diffs: HashMap::new(),
            next_diff_id: 0,
            repository: None,
            tick_hook: None,
            events: Vec::new(),
            diagnostics: VecDeque::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &SceneStore<B> {
        &self.scene.store
    }

    pub fn scene(&self) -> &SceneContext<B> {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.scene.camera
    }

    pub fn layout(&self) -> &ActiveLayout {
        &self.layout
    }

    pub fn force(&self) -> Option<&ForceLayout> {
        match &self.layout {
            ActiveLayout::Force(force) => Some(force),
            ActiveLayout::Discrete(_) => None,
        }
    }

    pub fn expansion(&self) -> &ExpansionController {
        &self.scene.expansion
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn analysis(&self) -> &AnalysisService {
        &self.analysis
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    /// Events for the host, including queued analysis requests.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        let requests = self.analysis.take_requests();
        self.events.extend(requests.into_iter().map(EngineEvent::Analyze));
        std::mem::take(&mut self.events)
    }

    pub fn metrics(&self) -> GraphMetrics {
        self.dataset.as_ref().map(metrics::compute).unwrap_or_default()
    }

    pub fn set_repository(&mut self, owner: impl Into<String>, repo: impl Into<String>) {
        self.repository = Some(Repository {
            owner: owner.into(),
            repo: repo.into(),
        });
    }

    /// Called after every force tick, including the running simulation's.
    pub fn set_tick_hook(&mut self, hook: Option<Rc<dyn Fn(&TickInfo)>>) {
        self.tick_hook = hook;
        let callback = self.tick_callback();
        if let ActiveLayout::Force(force) = &mut self.layout {
            force.set_on_tick(callback);
        }
    }

    fn tick_callback(&self) -> Option<TickCallback> {
        self.tick_hook.clone().map(|hook| {
            let callback: TickCallback = Box::new(move |info: &TickInfo| hook(info));
            callback
        })
    }

    // =========================================================================
    // Dataset and view transitions
    // =========================================================================

    /// Replace the dataset and rebuild the scene in the current mode.
    ///
    /// On error the previous dataset and scene stay as they were.
    pub fn visualize_data(&mut self, dataset: Dataset) -> Result<()> {
        let plan = match &self.layout {
            ActiveLayout::Discrete(mode) => Some(self.plan_for(*mode, &dataset)?),
            ActiveLayout::Force(_) => None,
        };
        log::info!(
            "visualizing {} commits, {} links in {} mode",
            dataset.nodes.len(),
            dataset.edges.len(),
            self.layout.name()
        );
        self.analysis.invalidate();
        self.pending_diffs.clear();
        self.dataset = Some(dataset);

        match plan {
            Some(plan) => self.install(plan),
            None => self.start_force(),
        }
        Ok(())
    }

    /// Parse a JSON dataset and visualize it. Rejected input leaves the scene alone.
    pub fn visualize_json(&mut self, json: &str) -> Result<()> {
        let dataset = Dataset::from_json_str(json)?;
        self.visualize_data(dataset)
    }

    /// Switch to a discrete layout and rebuild from the last dataset.
    pub fn switch_view(&mut self, mode: ViewMode) -> Result<()> {
        let Some(dataset) = self.dataset.as_ref() else {
            self.stop_force();
            self.layout = ActiveLayout::Discrete(mode);
            return Ok(());
        };
        let plan = self.plan_for(mode, dataset)?;
        self.stop_force();
        self.layout = ActiveLayout::Discrete(mode);
        log::info!("switched to {mode} view");
        self.install(plan);
        Ok(())
    }

    /// Replace the discrete layout with the force simulation, seeded radially.
    pub fn enable_force(&mut self) {
        self.stop_force();
        self.start_force();
        log::info!("switched to force view");
    }

    /// Tear the session down. The coordinator stays usable afterwards.
    pub fn destroy(&mut self) {
        self.stop_force();
        self.layout = ActiveLayout::Discrete(ViewMode::default());
        self.scene.clear();
        self.analysis.invalidate();
        self.pending_diffs.clear();
        self.events.clear();
        self.dataset = None;
    }

    fn plan_for(&self, mode: ViewMode, dataset: &Dataset) -> Result<PlannedScene> {
        let planned = match mode {
            ViewMode::Radial => PlannedScene::flat(radial::plan(dataset, &self.configs.radial)),
            ViewMode::Tree => {
                let (plan, clusters) = branch_tree::plan(dataset, &self.configs.tree);
                PlannedScene {
                    plan,
                    expansion: Some(ExpansionController::new(clusters, dataset.edges.clone())),
                    empty_reason: None,
                }
            }
            ViewMode::Linear => PlannedScene::flat(spiral::plan(dataset, &self.configs.spiral)?),
            ViewMode::Timeline => match timeline::plan(dataset, &self.configs.timeline) {
                Ok(plan) => PlannedScene::flat(plan),
                Err(err @ GraphError::EmptyDataset { .. }) => PlannedScene {
                    plan: ScenePlan::default(),
                    expansion: None,
                    empty_reason: Some(err),
                },
                Err(err) => return Err(err),
            },
        };
        Ok(planned)
    }

    fn install(&mut self, planned: PlannedScene) {
        self.scene.clear();
        if let Some(reason) = planned.empty_reason {
            log::warn!("{reason}");
            self.report(&reason);
        }
        planned.plan.populate(&mut self.scene.store);
        if let Some(expansion) = planned.expansion {
            self.scene.expansion = expansion;
        }
        self.scene.reframe();
        log::debug!(
            "scene rebuilt: {} nodes, {} edges, {} markers",
            self.scene.store.node_count(),
            self.scene.store.edge_count(),
            self.scene.store.marker_count()
        );
    }

    fn start_force(&mut self) {
        let empty = Dataset::default();
        let dataset = self.dataset.as_ref().unwrap_or(&empty);
        let seed = radial::plan(dataset, &self.configs.radial);
        self.scene.clear();
        seed.populate(&mut self.scene.store);

        let nodes: Vec<ForceNode> = self
            .scene
            .store
            .nodes()
            .map(|(_, n)| ForceNode {
                key: n.key.clone(),
                position: n.position,
            })
            .collect();
        let links = self.scene.store.edge_keys();
        let on_tick = self.tick_callback();
        let force = ForceLayout::initialize(nodes, &links, self.settings, on_tick);
        self.layout = ActiveLayout::Force(force);
        self.scene.reframe();
    }

    fn stop_force(&mut self) {
        if let ActiveLayout::Force(force) = &mut self.layout {
            force.destroy();
        }
    }

    // =========================================================================
    // Frame loop
    // =========================================================================

    /// Advance one animation frame: simulation tick, camera, then render.
    pub fn frame(&mut self, dt_seconds: f32) {
        if let ActiveLayout::Force(force) = &mut self.layout
            && force.step()
        {
            let mut moved = HashSet::new();
            for (key, position) in force.rendered_positions() {
                let Some(id) = self.scene.store.node_id(key) else {
                    continue;
                };
                if self.scene.store.position(key) != Some(position)
                    && self.scene.store.set_position(id, position)
                {
                    moved.insert(id);
                }
            }
            self.scene.store.sync_edges(&moved);
        }

        let display = *self.scene.store.display();
        if display.auto_rotate && !self.scene.interaction.is_dragging() {
            self.scene.camera.orbit(display.rotate_speed * dt_seconds);
        }

        let view = self.scene.camera.view();
        self.scene.store.backend_mut().present(&view);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.scene.viewport = Vec2::new(width, height);
        self.scene.camera.set_viewport(width, height);
    }

    /// Fit the camera to the visible nodes.
    pub fn reframe(&mut self) {
        self.scene.reframe();
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    /// Hover tracking, or moving the dragged node.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let ray = self.scene.ray_at(x, y);
        if self.scene.interaction.is_dragging() {
            if let Some((id, point)) = self.scene.interaction.drag_to(&ray) {
                self.move_pinned(id, point);
            }
            return;
        }
        let hit = self.scene.store.pick(&ray);
        self.scene.interaction.hover(hit, &mut self.scene.store);
    }

    /// Start dragging in force mode. Returns true when a drag began.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        if self.force().is_none() {
            return false;
        }
        self.pointer_move(x, y);
        let Some(id) = self.scene.interaction.hovered() else {
            return false;
        };
        let forward = self.scene.camera.forward();
        if !self.scene.interaction.begin_drag(id, forward, &mut self.scene.store) {
            return false;
        }
        if let Some(position) = self.scene.store.node(id).map(|n| n.position) {
            self.move_pinned(id, position);
        }
        true
    }

    /// Finish a drag and let the node go.
    pub fn pointer_up(&mut self) {
        let Some(id) = self.scene.interaction.end_drag(&mut self.scene.store) else {
            return;
        };
        let Some(key) = self.scene.store.node(id).map(|n| n.key.clone()) else {
            return;
        };
        if let ActiveLayout::Force(force) = &mut self.layout {
            force.unpin(&key);
        }
    }

    fn move_pinned(&mut self, id: NodeId, point: Vec3) {
        let Some(key) = self.scene.store.node(id).map(|n| n.key.clone()) else {
            return;
        };
        if let ActiveLayout::Force(force) = &mut self.layout {
            force.pin(&key, point);
        }
        if self.scene.store.set_position(id, point) {
            self.scene.store.sync_edges(&HashSet::from([id]));
        }
    }

    /// Primary click: expand a cluster or open a commit.
    pub fn click(&mut self, x: f32, y: f32) {
        self.pointer_move(x, y);
        match self.scene.interaction.click(&mut self.scene.store) {
            ClickAction::None => {}
            ClickAction::ToggleCluster { branch } => self.toggle_branch(&branch),
            ClickAction::ShowCommit { key } => self.show_commit(&key),
        }
    }

    /// Secondary or double activation: per-file analysis of the commit.
    pub fn double_click(&mut self, x: f32, y: f32) {
        self.pointer_move(x, y);
        let Some(key) = self.scene.interaction.double_click(&self.scene.store) else {
            return;
        };
        let Some(record) = self.commit_record(&key) else {
            return;
        };
        for file in &record.data.files_changed {
            self.request_analysis(AnalysisKey::file(&record.id, file), || {
                analysis::file_prompt(&record, file)
            });
        }
    }

    /// Expand or collapse a branch in the tree view.
    pub fn toggle_branch(&mut self, branch: &str) {
        // The toggle rebuilds every tree edge, so drop highlight state first.
        self.scene.interaction.clear_highlight(&mut self.scene.store);
        match self.scene.expansion.toggle(branch, &mut self.scene.store) {
            Ok(expanded) => {
                if expanded {
                    self.request_branch_summary(branch);
                }
            }
            Err(err) => {
                log::error!("toggling {branch} failed: {err}");
                self.report(&err);
            }
        }
    }

    fn request_branch_summary(&mut self, branch: &str) {
        let Some(cluster) = self.scene.expansion.cluster(branch).cloned() else {
            return;
        };
        if cluster.summary.is_some() {
            return;
        }
        let key = AnalysisKey::branch(branch);
        if let Some(summary) = self.request_analysis(key, || analysis::branch_prompt(&cluster)) {
            self.scene.expansion.set_summary(branch, summary);
        }
    }

    fn show_commit(&mut self, key: &str) {
        let Some(record) = self.commit_record(key) else {
            return;
        };
        let related: Vec<String> = self
            .scene
            .store
            .node_id(key)
            .map(|id| self.scene.store.neighbors(id))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|n| self.scene.store.node(n))
            .filter(|n| n.commit.is_some())
            .map(|n| n.key.clone())
            .collect();

        self.events.push(EngineEvent::ShowCommit {
            key: key.to_string(),
            commit: record.data.clone(),
            related: related.clone(),
        });
        if let Some(file) = record.data.files_changed.first() {
            self.request_diff(key, file);
        }

        let group: Vec<NodeRecord> = std::iter::once(key.to_string())
            .chain(related)
            .filter_map(|id| self.commit_record(&id))
            .collect();
        let ids = group.iter().map(|r| r.id.clone());
        let key = AnalysisKey::commits(ids);
        self.request_analysis(key, || {
            let refs: Vec<&NodeRecord> = group.iter().collect();
            analysis::commits_prompt(&refs)
        });
    }

    fn commit_record(&self, key: &str) -> Option<NodeRecord> {
        self.dataset.as_ref()?.commit(key).cloned()
    }

    // =========================================================================
    // Host responses
    // =========================================================================

    /// Ask for a summary. Returns it immediately when cached.
    pub fn request_analysis(
        &mut self,
        key: AnalysisKey,
        prompt: impl FnOnce() -> String,
    ) -> Option<String> {
        match self.analysis.request(key.clone(), prompt) {
            AnalysisLookup::Cached(summary) => {
                self.events.push(EngineEvent::AnalysisReady {
                    key,
                    summary: summary.clone(),
                });
                Some(summary)
            }
            AnalysisLookup::Requested(id) | AnalysisLookup::Pending(id) => {
                log::debug!("analysis {id} outstanding for {key:?}");
                None
            }
        }
    }

    /// Deliver a summary. Stale or unknown responses are ignored.
    pub fn complete_analysis(
        &mut self,
        id: u64,
        generation: u64,
        result: std::result::Result<String, String>,
    ) {
        let Some(completed) = self.analysis.complete(id, generation, result) else {
            return;
        };
        if let Some(reason) = completed.failure {
            self.report(&GraphError::TransientNetworkFailure(reason));
        }
        let CompletedAnalysis { key, summary, .. } = completed;
        if let AnalysisKey::Branch { name } = &key
            && summary != analysis::ANALYSIS_PLACEHOLDER
        {
            self.scene.expansion.set_summary(name, summary.clone());
        }
        self.events.push(EngineEvent::AnalysisReady { key, summary });
    }

    /// Queue a diff fetch for one file of a commit.
    pub fn request_diff(&mut self, commit: &str, file: &str) -> Option<u64> {
        let Some(repository) = self.repository.clone() else {
            log::warn!("no repository set, not fetching diff for {commit}:{file}");
            return None;
        };
        let id = self.next_diff_id;
        self.next_diff_id += 1;
        self.pending_diffs.insert(id, (commit.to_string(), file.to_string()));
        self.events.push(EngineEvent::FetchDiff(DiffRequest {
            id,
            generation: self.analysis.generation(),
            owner: repository.owner,
            repo: repository.repo,
            commit: commit.to_string(),
            file: file.to_string(),
        }));
        Some(id)
    }

    /// Deliver diff text (whole commit or single file). Stale or unknown
    /// responses are ignored; failures show a fixed message.
    pub fn complete_diff(
        &mut self,
        id: u64,
        generation: u64,
        result: std::result::Result<String, String>,
    ) {
        if generation != self.analysis.generation() {
            log::debug!("dropping diff {id} from generation {generation}");
            return;
        }
        let Some((commit, file)) = self.pending_diffs.remove(&id) else {
            return;
        };
        let html = match result {
            Ok(text) => diff::render_html(&diff::file_diff(&text, &file)),
            Err(reason) => {
                self.report(&GraphError::TransientNetworkFailure(reason));
                diff::escape_html(DIFF_UNAVAILABLE)
            }
        };
        self.events.push(EngineEvent::DiffReady { commit, file, html });
    }

    // =========================================================================
    // Control surface
    // =========================================================================

    /// Set one force parameter by name. A running simulation restarts.
    pub fn set_layout_parameter(&mut self, name: &str, value: f32) -> Result<()> {
        let parameter: LayoutParameter = name.parse()?;
        self.settings.set(parameter, value);
        if let ActiveLayout::Force(force) = &mut self.layout {
            force.set_parameter(parameter, value);
        }
        Ok(())
    }

    pub fn set_layout_settings(&mut self, settings: LayoutSettings) {
        self.settings = settings;
        if let ActiveLayout::Force(force) = &mut self.layout {
            force.set_settings(settings);
        }
    }

    pub fn set_display(&mut self, display: DisplaySettings) {
        self.scene.store.apply_display(display);
    }

    pub fn set_filter(&mut self, filter: NodeFilter) {
        self.scene.interaction.clear_highlight(&mut self.scene.store);
        self.scene.store.apply_filter(filter);
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Record a handled failure.
    pub fn report(&mut self, error: &GraphError) {
        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(Diagnostic {
            kind: error.kind(),
            message: error.to_string(),
        });
    }
}

/// A plan plus what the coordinator installs alongside it.
struct PlannedScene {
    plan: ScenePlan,
    expansion: Option<ExpansionController>,
    /// Set when the layout had nothing to show.
    empty_reason: Option<GraphError>,
}

impl PlannedScene {
    fn flat(plan: ScenePlan) -> Self {
        Self {
            plan,
            expansion: None,
            empty_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;
    use crate::render::HeadlessBackend;

    fn coordinator() -> ViewCoordinator<HeadlessBackend> {
        let mut view = ViewCoordinator::new(HeadlessBackend::new());
        view.resize(800.0, 600.0);
        view
    }

    /// Pixel position of a node as seen by the current camera.
    fn screen_of(view: &ViewCoordinator<HeadlessBackend>, key: &str) -> (f32, f32) {
        let position = view.store().position(key).unwrap();
        let ndc = view.camera().view_projection().project_point3(position);
        ((ndc.x + 1.0) * 0.5 * 800.0, (1.0 - ndc.y) * 0.5 * 600.0)
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!("tree".parse::<ViewMode>().unwrap(), ViewMode::Tree);
        assert_eq!("linear".parse::<ViewMode>().unwrap(), ViewMode::Linear);
        assert!(matches!("cube".parse::<ViewMode>(), Err(GraphError::UnknownViewMode(_))));
    }

    #[test]
    fn test_switch_without_data_is_noop() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Timeline).unwrap();
        assert_eq!(view.layout().name(), "timeline");
        assert_eq!(view.store().node_count(), 0);
    }

    #[test]
    fn test_every_mode_places_all_nodes() {
        let dataset = fixtures::two_branches();
        let mut view = coordinator();
        view.visualize_data(dataset.clone()).unwrap();
        for mode in [ViewMode::Radial, ViewMode::Linear, ViewMode::Timeline] {
            view.switch_view(mode).unwrap();
            assert_eq!(view.store().node_count(), dataset.nodes.len(), "{mode}");
            assert_eq!(view.store().edge_count(), dataset.edges.len(), "{mode}");
            assert_eq!(view.store().live_handles(), view.store().backend().live_objects());
        }
    }

    #[test]
    fn test_failed_layout_keeps_old_scene() {
        let mut view = coordinator();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        let mut broken = fixtures::two_branches();
        broken.nodes[0].data.date = "not a date".into();

        view.switch_view(ViewMode::Linear).unwrap();
        assert!(view.visualize_data(broken).is_err());
        assert_eq!(view.store().node_count(), 3);
        assert_eq!(view.dataset().unwrap().nodes.len(), 3);
    }

    #[test]
    fn test_empty_timeline_renders_nothing() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Timeline).unwrap();
        view.visualize_data(Dataset::default()).unwrap();
        assert_eq!(view.store().node_count(), 0);
        assert_eq!(view.store().marker_count(), 0);
        assert_eq!(view.diagnostics().last().unwrap().kind, "empty-dataset");
        view.frame(0.016);
    }

    #[test]
    fn test_reframe_centres_on_scene() {
        let mut view = coordinator();
        view.visualize_data(fixtures::two_branches()).unwrap();
        let target = view.camera().target;
        assert!(target.length() < 1e-3, "radial scene is centred at the origin, got {target:?}");
    }

    #[test]
    fn test_force_mode_ticks_before_render() {
        let mut view = coordinator();
        view.visualize_data(fixtures::two_branches()).unwrap();
        view.enable_force();
        assert_eq!(view.layout().name(), "force");

        let before = view.store().position("c0").unwrap();
        view.frame(0.016);
        let after = view.store().position("c0").unwrap();
        assert_ne!(before, after);
        assert_eq!(view.force().unwrap().rendered_position("c0"), Some(after));
        assert_eq!(view.store().backend().frames(), 1);
    }

    #[test]
    fn test_switch_view_destroys_force() {
        let mut view = coordinator();
        view.visualize_data(fixtures::two_branches()).unwrap();
        view.enable_force();
        view.switch_view(ViewMode::Radial).unwrap();
        assert!(view.force().is_none());
        let before = view.store().position("c0");
        view.frame(0.016);
        assert_eq!(view.store().position("c0"), before);
    }

    #[test]
    fn test_layout_parameter_restarts_force() {
        let mut view = coordinator();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        view.enable_force();
        for _ in 0..50 {
            view.frame(0.016);
        }
        view.set_layout_parameter("charge", -80.0).unwrap();
        assert_eq!(view.settings().charge, -80.0);
        assert_eq!(view.force().unwrap().alpha(), 1.0);
        assert!(matches!(
            view.set_layout_parameter("gravity", 1.0),
            Err(GraphError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_click_cluster_toggles_and_requests_summary() {
        let mut view = coordinator();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        view.switch_view(ViewMode::Tree).unwrap();
        assert_eq!(view.store().node_count(), 1);

        let (x, y) = screen_of(&view, "branch:main");
        view.click(x, y);
        assert!(view.expansion().is_expanded("main"));
        assert_eq!(view.store().node_count(), 4);

        let events = view.take_events();
        let request = events
            .iter()
            .find_map(|e| match e {
                EngineEvent::Analyze(request) => Some(request.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(request.key, AnalysisKey::branch("main"));

        view.complete_analysis(request.id, request.generation, Ok("Main line.".into()));
        let cluster = view.expansion().cluster("main").unwrap();
        assert_eq!(cluster.summary.as_deref(), Some("Main line."));
    }

    #[test]
    fn test_click_commit_emits_detail_and_diff() {
        let mut view = coordinator();
        view.set_repository("octo", "repo");
        view.visualize_data(fixtures::merge_triangle()).unwrap();

        let (x, y) = screen_of(&view, "a");
        view.click(x, y);
        let events = view.take_events();
        assert!(events.iter().any(|e| matches!(e, EngineEvent::ShowCommit { key, related, .. }
            if key == "a" && related == &vec!["init".to_string(), "m".to_string()])));
        let diff = events
            .iter()
            .find_map(|e| match e {
                EngineEvent::FetchDiff(request) => Some(request.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(diff.file, "src/a.rs");
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Analyze(r)
            if r.key == AnalysisKey::commits(["a", "init", "m"]))));

        view.complete_diff(diff.id, diff.generation, Err("503".into()));
        let events = view.take_events();
        assert!(events.iter().any(|e| {
            matches!(e, EngineEvent::DiffReady { html, .. } if html == DIFF_UNAVAILABLE)
        }));
        assert_eq!(view.diagnostics().last().unwrap().kind, "network");
    }

    #[test]
    fn test_stale_responses_after_new_data_are_ignored() {
        let mut view = coordinator();
        view.set_repository("octo", "repo");
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        let diff_id = view.request_diff("a", "src/a.rs").unwrap();
        view.request_analysis(AnalysisKey::branch("main"), || "p".into());
        let request = match view.take_events().pop() {
            Some(EngineEvent::Analyze(request)) => request,
            other => panic!("unexpected {other:?}"),
        };

        view.visualize_data(fixtures::two_branches()).unwrap();
        view.complete_analysis(request.id, request.generation, Ok("late".into()));
        view.complete_diff(diff_id, 0, Ok("diff --git a/src/a.rs b/src/a.rs".into()));
        assert!(view.take_events().is_empty());
        assert!(view.analysis().cache().is_empty());
    }

    #[test]
    fn test_drag_pins_in_force_mode() {
        let mut view = coordinator();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        assert!(!view.pointer_down(400.0, 300.0));

        view.enable_force();
        let (x, y) = screen_of(&view, "init");
        assert!(view.pointer_down(x, y));
        assert!(view.force().unwrap().is_pinned("init"));

        view.pointer_move(x + 20.0, y);
        let pinned = view.force().unwrap().simulated_position("init").unwrap();
        view.frame(0.016);
        assert_eq!(view.store().position("init"), Some(pinned));

        view.pointer_up();
        assert!(!view.force().unwrap().is_pinned("init"));
    }

    #[test]
    fn test_filter_applies_to_rendered_scene() {
        let mut view = coordinator();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        view.set_filter(NodeFilter {
            show_merges: false,
            ..NodeFilter::default()
        });
        let m = view.store().node_by_key("m").unwrap();
        assert!(m.state.is_hidden());
        assert!(!view.store().node_by_key("a").unwrap().state.is_hidden());
    }

    #[test]
    fn test_diagnostics_bounded() {
        let mut view = coordinator();
        for i in 0..(MAX_DIAGNOSTICS + 10) {
            view.report(&GraphError::Runtime(format!("e{i}")));
        }
        assert_eq!(view.diagnostics().count(), MAX_DIAGNOSTICS);
        assert_eq!(
            view.diagnostics().last().unwrap().message,
            format!("runtime error: e{}", MAX_DIAGNOSTICS + 9)
        );
    }

    #[test]
    fn test_auto_rotate_moves_camera() {
        let mut view = coordinator();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        view.set_display(DisplaySettings {
            auto_rotate: true,
            ..DisplaySettings::default()
        });
        let before = view.camera().position;
        view.frame(1.0);
        assert_ne!(view.camera().position, before);
    }
}
