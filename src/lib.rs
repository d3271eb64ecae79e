//! Commit Graph - WASM Module
//!
//! Interactive 3D visualization engine for git commit histories. The engine
//! keeps the scene, runs the layouts and resolves pointer input; drawing is
//! delegated to a host object through the [`render::RenderBackend`] seam.
//!
//! # Architecture
//!
//! - `graph`: Scene store over petgraph's StableGraph, owning every render handle
//! - `spatial`: 3D R-tree for ray picking
//! - `layout`: Radial, branch tree, spiral, timeline and force layouts
//! - `view`: The coordinator tying layouts, interaction and host requests together

use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod analysis;
pub mod camera;
pub mod color;
pub mod config;
pub mod data;
pub mod diff;
pub mod error;
pub mod expansion;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod metrics;
pub mod render;
pub mod spatial;
pub mod view;

use camera::CameraView;
use color::Color;
use config::{DisplaySettings, LayoutSettings, NodeFilter};
use data::Dataset;
use error::GraphError;
use layout::force::TickInfo;
use render::{
    Cursor, EdgeGeometry, EdgeVisual, MarkerVisual, NodeVisual, RenderBackend, RenderHandle,
};
use view::{ViewCoordinator, ViewMode};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

// =============================================================================
// JS render backend
// =============================================================================

/// Forwards scene mutations to methods of a host JS object.
///
/// Missing methods and exceptions thrown by the host are logged and skipped.
struct JsRenderBackend {
    host: JsValue,
}

impl JsRenderBackend {
    fn call(&self, method: &str, args: &[JsValue]) {
        let function = match js_sys::Reflect::get(&self.host, &JsValue::from_str(method)) {
            Ok(value) => match value.dyn_into::<js_sys::Function>() {
                Ok(function) => function,
                Err(_) => {
                    log::warn!("render host has no `{method}` method");
                    return;
                }
            },
            Err(err) => {
                log::warn!("render host lookup of `{method}` failed: {err:?}");
                return;
            }
        };
        let array: js_sys::Array = args.iter().collect();
        if let Err(err) = function.apply(&self.host, &array) {
            log::error!("render host `{method}` threw: {err:?}");
        }
    }

    fn payload<T: Serialize>(value: &T) -> JsValue {
        value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .unwrap_or_else(|err| {
                log::error!("failed to serialize render payload: {err}");
                JsValue::UNDEFINED
            })
    }

    fn handle(handle: RenderHandle) -> JsValue {
        JsValue::from(handle.raw())
    }
}

impl RenderBackend for JsRenderBackend {
    fn create_node(&mut self, handle: RenderHandle, visual: &NodeVisual) {
        self.call("createNode", &[Self::handle(handle), Self::payload(visual)]);
    }

    fn create_edge(&mut self, handle: RenderHandle, visual: &EdgeVisual) {
        self.call("createEdge", &[Self::handle(handle), Self::payload(visual)]);
    }

    fn create_marker(&mut self, handle: RenderHandle, visual: &MarkerVisual) {
        self.call("createMarker", &[Self::handle(handle), Self::payload(visual)]);
    }

    fn move_node(&mut self, handle: RenderHandle, position: glam::Vec3) {
        self.call("updateNode", &[Self::handle(handle), Self::payload(&position.to_array())]);
    }

    fn update_edge(&mut self, handle: RenderHandle, geometry: &EdgeGeometry) {
        self.call("updateEdge", &[Self::handle(handle), Self::payload(geometry)]);
    }

    fn set_color(&mut self, handle: RenderHandle, color: Color) {
        self.call("setColor", &[Self::handle(handle), JsValue::from(color.to_hex())]);
    }

    fn set_visible(&mut self, handle: RenderHandle, visible: bool) {
        self.call("setVisible", &[Self::handle(handle), JsValue::from_bool(visible)]);
    }

    fn set_scale(&mut self, handle: RenderHandle, scale: f32) {
        self.call("setScale", &[Self::handle(handle), JsValue::from(scale)]);
    }

    fn set_label_visible(&mut self, handle: RenderHandle, visible: bool) {
        self.call("setLabelVisible", &[Self::handle(handle), JsValue::from_bool(visible)]);
    }

    fn release(&mut self, handle: RenderHandle) {
        self.call("release", &[Self::handle(handle)]);
    }

    fn present(&mut self, camera: &CameraView) {
        self.call("render", &[Self::payload(camera)]);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.call("setCursor", &[JsValue::from_str(cursor.as_css())]);
    }
}

// =============================================================================
// Facade
// =============================================================================

/// Main entry point for the visualization engine.
///
/// Wraps the [`ViewCoordinator`] and exposes it to JavaScript. Failures are
/// recorded as diagnostics before being thrown.
#[wasm_bindgen]
pub struct CommitGraphWasm {
    view: ViewCoordinator<JsRenderBackend>,
}

#[wasm_bindgen]
impl CommitGraphWasm {
    /// Create an engine drawing into the element with id `container_id`
    /// through the `renderer` host object.
    ///
    /// Fails without constructing anything when the container is absent.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, renderer: JsValue) -> Result<CommitGraphWasm, JsError> {
        let container = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(container_id))
            .ok_or_else(|| GraphError::ResourceNotFound(format!("container #{container_id}")))?;

        let mut view = ViewCoordinator::new(JsRenderBackend { host: renderer });
        view.resize(container.client_width() as f32, container.client_height() as f32);
        log::info!("commit graph attached to #{container_id}");
        Ok(Self { view })
    }

    // =========================================================================
    // Data and views
    // =========================================================================

    /// Replace the dataset (`{ nodes, edges }`) and rebuild the scene.
    #[wasm_bindgen(js_name = visualizeData)]
    pub fn visualize_data(&mut self, data: JsValue) -> Result<(), JsError> {
        let parsed = serde_wasm_bindgen::from_value::<serde_json::Value>(data)
            .map_err(|e| GraphError::InvalidDataset(e.to_string()))
            .and_then(Dataset::from_value)
            .and_then(|dataset| self.view.visualize_data(dataset));
        self.guard(parsed)
    }

    /// Same as `visualizeData` for a JSON string.
    #[wasm_bindgen(js_name = visualizeJson)]
    pub fn visualize_json(&mut self, json: &str) -> Result<(), JsError> {
        let parsed = self.view.visualize_json(json);
        self.guard(parsed)
    }

    /// Switch to `radial`, `tree`, `linear` or `timeline`.
    #[wasm_bindgen(js_name = switchView)]
    pub fn switch_view(&mut self, mode: &str) -> Result<(), JsError> {
        let switched = mode.parse::<ViewMode>().and_then(|mode| self.view.switch_view(mode));
        self.guard(switched)
    }

    /// Replace the current layout with the force simulation.
    #[wasm_bindgen(js_name = enableForce)]
    pub fn enable_force(&mut self) {
        self.view.enable_force();
    }

    /// Call `callback({ tick, alpha })` after every force tick; `null` removes it.
    #[wasm_bindgen(js_name = setTickHook)]
    pub fn set_tick_hook(&mut self, callback: Option<js_sys::Function>) {
        let hook = callback.map(|callback| {
            let hook: Rc<dyn Fn(&TickInfo)> = Rc::new(move |info: &TickInfo| {
                let payload = JsRenderBackend::payload(info);
                if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                    log::warn!("tick hook threw: {err:?}");
                }
            });
            hook
        });
        self.view.set_tick_hook(hook);
    }

    /// Name of the active layout.
    #[wasm_bindgen(js_name = viewMode)]
    pub fn view_mode(&self) -> String {
        self.view.layout().name().to_string()
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.view.store().node_count() as u32
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.view.store().edge_count() as u32
    }

    /// Commit-graph statistics for the current dataset.
    pub fn metrics(&self) -> Result<JsValue, JsError> {
        to_js(&self.view.metrics())
    }

    // =========================================================================
    // Frame loop and input
    // =========================================================================

    /// Advance one animation frame. `dt` is in seconds.
    pub fn frame(&mut self, dt: f32) {
        self.view.frame(dt);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.view.resize(width, height);
    }

    pub fn reframe(&mut self) {
        self.view.reframe();
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.view.pointer_move(x, y);
    }

    /// Returns true when a drag began.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.view.pointer_down(x, y)
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.view.pointer_up();
    }

    pub fn click(&mut self, x: f32, y: f32) {
        self.view.click(x, y);
    }

    #[wasm_bindgen(js_name = doubleClick)]
    pub fn double_click(&mut self, x: f32, y: f32) {
        self.view.double_click(x, y);
    }

    #[wasm_bindgen(js_name = toggleBranch)]
    pub fn toggle_branch(&mut self, branch: &str) {
        self.view.toggle_branch(branch);
    }

    // =========================================================================
    // Control surface
    // =========================================================================

    /// Set `charge`, `linkDistance`, `centerStrength`, `damping` or `collisionRadius`.
    #[wasm_bindgen(js_name = setLayoutParameter)]
    pub fn set_layout_parameter(&mut self, name: &str, value: f32) -> Result<(), JsError> {
        let applied = self.view.set_layout_parameter(name, value);
        self.guard(applied)
    }

    #[wasm_bindgen(js_name = setLayoutSettings)]
    pub fn set_layout_settings(&mut self, settings: JsValue) -> Result<(), JsError> {
        let settings: LayoutSettings = from_js(settings)?;
        self.view.set_layout_settings(settings);
        Ok(())
    }

    #[wasm_bindgen(js_name = setDisplay)]
    pub fn set_display(&mut self, display: JsValue) -> Result<(), JsError> {
        let display: DisplaySettings = from_js(display)?;
        self.view.set_display(display);
        Ok(())
    }

    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(&mut self, filter: JsValue) -> Result<(), JsError> {
        let filter: NodeFilter = from_js(filter)?;
        self.view.set_filter(filter);
        Ok(())
    }

    // =========================================================================
    // Host requests
    // =========================================================================

    /// Repository used for diff requests.
    #[wasm_bindgen(js_name = setRepository)]
    pub fn set_repository(&mut self, owner: &str, repo: &str) {
        self.view.set_repository(owner, repo);
    }

    /// Queue a diff fetch. Returns the request id, if one was queued.
    #[wasm_bindgen(js_name = requestDiff)]
    pub fn request_diff(&mut self, commit: &str, file: &str) -> Option<u32> {
        self.view.request_diff(commit, file).map(|id| id as u32)
    }

    /// Events queued since the last call (detail panels, fetches, summaries).
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.view.take_events())
    }

    /// Diagnostics recorded since the last call.
    #[wasm_bindgen(js_name = takeDiagnostics)]
    pub fn take_diagnostics(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.view.take_diagnostics())
    }

    #[wasm_bindgen(js_name = completeAnalysis)]
    pub fn complete_analysis(&mut self, id: u32, generation: u32, summary: String) {
        self.view.complete_analysis(id.into(), generation.into(), Ok(summary));
    }

    #[wasm_bindgen(js_name = failAnalysis)]
    pub fn fail_analysis(&mut self, id: u32, generation: u32, reason: String) {
        self.view.complete_analysis(id.into(), generation.into(), Err(reason));
    }

    #[wasm_bindgen(js_name = completeDiff)]
    pub fn complete_diff(&mut self, id: u32, generation: u32, diff: String) {
        self.view.complete_diff(id.into(), generation.into(), Ok(diff));
    }

    #[wasm_bindgen(js_name = failDiff)]
    pub fn fail_diff(&mut self, id: u32, generation: u32, reason: String) {
        self.view.complete_diff(id.into(), generation.into(), Err(reason));
    }

    /// Release every render object and forget the dataset.
    pub fn destroy(&mut self) {
        self.view.destroy();
    }
}

impl CommitGraphWasm {
    /// Record a failed call as a diagnostic before handing it to JS.
    fn guard<T>(&mut self, result: error::Result<T>) -> Result<T, JsError> {
        result.map_err(|err| {
            log::error!("{err}");
            self.view.report(&err);
            JsError::from(err)
        })
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&e.to_string()))
}

// =============================================================================
// Integration tests
// =============================================================================

#[cfg(test)]
mod integration_tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use glam::{Vec2, Vec3};
    use serde_json::json;

    use crate::analysis::{AnalysisRequest, ANALYSIS_PLACEHOLDER};
    use crate::data::{fixtures, Dataset};
    use crate::expansion::{cluster_key, EXPANSION_RADIUS};
    use crate::layout::force::TickInfo;
    use crate::render::HeadlessBackend;
    use crate::view::{EngineEvent, ViewCoordinator, ViewMode};

    fn coordinator() -> ViewCoordinator<HeadlessBackend> {
        let mut view = ViewCoordinator::new(HeadlessBackend::new());
        view.resize(800.0, 600.0);
        view
    }

    fn screen_of(view: &ViewCoordinator<HeadlessBackend>, key: &str) -> Vec2 {
        let position = view.store().position(key).unwrap();
        let ndc = view.camera().view_projection().project_point3(position);
        Vec2::new((ndc.x + 1.0) * 400.0, (1.0 - ndc.y) * 300.0)
    }

    fn branch_request(view: &mut ViewCoordinator<HeadlessBackend>) -> AnalysisRequest {
        view.take_events()
            .into_iter()
            .find_map(|event| match event {
                EngineEvent::Analyze(request) => Some(request),
                _ => None,
            })
            .unwrap()
    }

    /// Four commits on `feature` hanging off one commit on `main`.
    fn feature_branch() -> Dataset {
        let commit = |id: &str, branch: &str, day: u32| {
            json!({
                "id": id,
                "data": {
                    "message": format!("commit {id}"),
                    "author": "bob",
                    "date": format!("2024-02-0{day}T12:00:00Z"),
                    "branch": branch,
                    "files_changed": [format!("{id}.txt")]
                }
            })
        };
        Dataset::from_value(json!({
            "nodes": [
                commit("m0", "main", 1),
                commit("f1", "feature", 2),
                commit("f2", "feature", 3),
                commit("f3", "feature", 4),
                commit("f4", "feature", 5),
            ],
            "edges": [
                { "source": "m0", "target": "f1" },
                { "source": "f1", "target": "f2" },
                { "source": "f2", "target": "f3" },
                { "source": "f3", "target": "f4" },
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_every_layout_places_every_commit() {
        let dataset = fixtures::two_branches();
        let ids: HashSet<&str> = dataset.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut view = coordinator();
        view.visualize_data(dataset.clone()).unwrap();

        for mode in [ViewMode::Radial, ViewMode::Linear, ViewMode::Timeline] {
            view.switch_view(mode).unwrap();
            let keys: HashSet<&str> = view.store().nodes().map(|(_, n)| n.key.as_str()).collect();
            assert_eq!(keys, ids, "{mode}");
            for (source, target) in view.store().edge_keys() {
                assert!(ids.contains(source.as_str()) && ids.contains(target.as_str()));
            }
        }

        view.switch_view(ViewMode::Tree).unwrap();
        let clustered: usize = view.expansion().clusters().iter().map(|c| c.commits.len()).sum();
        assert_eq!(clustered, dataset.nodes.len());
    }

    #[test]
    fn test_second_dataset_replaces_first() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Timeline).unwrap();
        view.visualize_data(fixtures::two_branches()).unwrap();
        view.visualize_data(fixtures::merge_triangle()).unwrap();

        let keys: HashSet<&str> = view.store().nodes().map(|(_, n)| n.key.as_str()).collect();
        assert_eq!(keys, HashSet::from(["init", "a", "m"]));
        assert_eq!(view.store().edge_count(), 3);
        assert_eq!(view.store().marker_count(), 5);
        assert_eq!(view.store().backend().live_objects(), 3 + 3 + 5);
        assert_eq!(view.store().live_handles(), 3 + 3 + 5);
    }

    #[test]
    fn test_merge_triangle_is_one_collapsed_cluster() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Tree).unwrap();
        view.visualize_data(fixtures::merge_triangle()).unwrap();

        let clusters = view.expansion().clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].branch, "main");
        assert_eq!(clusters[0].commits.len(), 3);
        assert!(!clusters[0].expanded);
        assert_eq!(view.store().node_count(), 1);
    }

    #[test]
    fn test_empty_timeline_raises_nothing() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Timeline).unwrap();
        view.visualize_data(Dataset::from_json_str(r#"{"nodes": [], "edges": []}"#).unwrap())
            .unwrap();
        view.frame(0.016);
        assert_eq!(view.store().node_count(), 0);
        assert_eq!(view.store().backend().live_objects(), 0);
    }

    #[test]
    fn test_missing_collection_keeps_scene() {
        let mut view = coordinator();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        let live = view.store().backend().live_objects();

        for bad in [r#"{"nodes": []}"#, r#"{"nodes": [], "edges": 3}"#, "not json"] {
            let err = view.visualize_json(bad).unwrap_err();
            assert_eq!(err.kind(), "input", "{bad}");
        }
        assert_eq!(view.store().node_count(), 3);
        assert_eq!(view.store().edge_count(), 3);
        assert_eq!(view.store().backend().live_objects(), live);
        assert_eq!(view.dataset(), Some(&fixtures::merge_triangle()));
    }

    #[test]
    fn test_expanding_four_commits() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Tree).unwrap();
        view.visualize_data(feature_branch()).unwrap();
        assert_eq!(view.store().node_count(), 2);

        view.toggle_branch("feature");
        assert_eq!(view.store().node_count(), 6);

        let center = view.store().position(&cluster_key("feature")).unwrap();
        let mut last_height = center.y;
        for id in ["f1", "f2", "f3", "f4"] {
            let position = view.store().position(id).unwrap();
            let offset = position - center;
            let ring = Vec3::new(offset.x, 0.0, offset.z).length();
            assert!((ring - EXPANSION_RADIUS).abs() < 1e-3, "{id} off the ring");
            assert!(position.y > last_height, "{id} not above its predecessor");
            last_height = position.y;
        }

        let edges: HashSet<(String, String)> = view.store().edge_keys().into_iter().collect();
        assert!(edges.contains(&("branch:main".to_string(), "f1".to_string())));
        assert!(edges.contains(&("f1".to_string(), "f2".to_string())));
        assert!(edges.contains(&("f3".to_string(), "f4".to_string())));
        assert!(!edges.iter().any(|(s, t)| s == "branch:feature" || t == "branch:feature"));
    }

    #[test]
    fn test_four_toggles_restore_scene() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Tree).unwrap();
        view.visualize_data(feature_branch()).unwrap();
        let nodes = view.store().node_count();
        let edges = view.store().edge_count();

        for _ in 0..4 {
            view.toggle_branch("feature");
        }
        assert_eq!(view.store().node_count(), nodes);
        assert_eq!(view.store().edge_count(), edges);
        assert_eq!(view.store().live_handles(), view.store().backend().live_objects());
    }

    #[test]
    fn test_hover_round_trip_restores_colors() {
        let mut view = coordinator();
        view.visualize_data(fixtures::two_branches()).unwrap();
        let colors = |view: &ViewCoordinator<HeadlessBackend>| {
            view.store()
                .nodes()
                .map(|(_, n)| view.store().backend().color_of(n.handle))
                .chain(view.store().edges().map(|(_, e)| view.store().backend().color_of(e.handle)))
                .collect::<Vec<_>>()
        };
        let before = colors(&view);

        let target = screen_of(&view, "c1");
        view.pointer_move(target.x, target.y);
        assert_ne!(colors(&view), before);

        view.pointer_move(1.0, 1.0);
        assert_eq!(colors(&view), before);
    }

    #[test]
    fn test_tick_runs_before_render() {
        let ticks: Rc<RefCell<Vec<u64>>> = Rc::default();
        let recorded = Rc::clone(&ticks);

        let mut view = coordinator();
        view.set_tick_hook(Some(Rc::new(move |info: &TickInfo| {
            recorded.borrow_mut().push(info.tick)
        })));
        view.visualize_data(fixtures::two_branches()).unwrap();
        view.enable_force();

        for frame in 1..=3 {
            view.frame(0.016);
            assert_eq!(ticks.borrow().len(), frame);
            assert_eq!(view.store().backend().frames(), frame);
            let force = view.force().unwrap();
            for (_, node) in view.store().nodes() {
                assert_eq!(force.rendered_position(&node.key), Some(node.position));
            }
        }
    }

    #[test]
    fn test_tick_hook_reaches_running_simulation() {
        let ticks: Rc<RefCell<Vec<TickInfo>>> = Rc::default();
        let recorded = Rc::clone(&ticks);

        let mut view = coordinator();
        view.visualize_data(fixtures::two_branches()).unwrap();
        view.enable_force();
        view.frame(0.016);
        assert!(ticks.borrow().is_empty());

        view.set_tick_hook(Some(Rc::new(move |info: &TickInfo| {
            recorded.borrow_mut().push(*info)
        })));
        view.frame(0.016);
        view.frame(0.016);
        assert_eq!(ticks.borrow().len(), 2);
        assert_eq!(ticks.borrow()[1].tick, ticks.borrow()[0].tick + 1);

        let payload = serde_json::to_value(ticks.borrow()[0]).unwrap();
        assert_eq!(payload["tick"], json!(ticks.borrow()[0].tick));
        assert!(payload["alpha"].is_number());

        view.set_tick_hook(None);
        view.frame(0.016);
        assert_eq!(ticks.borrow().len(), 2);
    }

    #[test]
    fn test_stale_analysis_after_reload_is_silent() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Tree).unwrap();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        view.toggle_branch("main");
        let request = branch_request(&mut view);

        view.visualize_data(fixtures::two_branches()).unwrap();
        view.complete_analysis(request.id, request.generation, Ok("too late".into()));
        assert!(view.take_events().is_empty());
        assert!(view.expansion().clusters().iter().all(|c| c.summary.is_none()));
    }

    #[test]
    fn test_stale_analysis_failure_records_nothing() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Tree).unwrap();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        view.toggle_branch("main");
        let request = branch_request(&mut view);

        view.visualize_data(fixtures::two_branches()).unwrap();
        let before = view.diagnostics().count();
        view.complete_analysis(request.id, request.generation, Err("timeout".into()));
        assert_eq!(view.diagnostics().count(), before);
        assert!(view.take_events().is_empty());
    }

    #[test]
    fn test_current_analysis_failure_is_reported() {
        let mut view = coordinator();
        view.switch_view(ViewMode::Tree).unwrap();
        view.visualize_data(fixtures::merge_triangle()).unwrap();
        view.toggle_branch("main");
        let request = branch_request(&mut view);

        view.complete_analysis(request.id, request.generation, Err("timeout".into()));
        let last = view.diagnostics().last().unwrap();
        assert_eq!(last.kind, "network");
        assert!(view.take_events().iter().any(|e| matches!(e,
            EngineEvent::AnalysisReady { summary, .. } if summary == ANALYSIS_PLACEHOLDER)));
        assert_eq!(view.expansion().cluster("main").unwrap().summary, None);
    }
}
