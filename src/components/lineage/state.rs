use log::{debug, warn};

use super::layout::{LayoutMode, LineageLayout, compute_layout, get_all_nodes};
use super::minimap::MinimapProjection;
use super::render::{CardAction, action_rect, card_actions};
use super::types::{AssetNode, LineageData, Position};
use super::viewport::{PanGesture, Viewport};
use crate::config::ViewerConfig;

/// Everything one viewer instance needs to draw a frame and answer input.
///
/// Selection, hover, pan and zoom are local to the instance; two viewers on the
/// same page never share them.
pub struct LineageViewState {
	config: ViewerConfig,
	data: Option<LineageData>,
	layout: Option<LineageLayout>,
	mode: LayoutMode,
	/// Current pan and zoom.
	pub viewport: Viewport,
	/// Background drag in progress, if any.
	pub pan: PanGesture,
	/// Id of the selected node.
	pub selected: Option<String>,
	/// Id of the node under the pointer.
	pub hovered: Option<String>,
	hovered_action: Option<(String, CardAction)>,
	/// Whether the overview is drawn.
	pub minimap_visible: bool,
	/// Canvas width in CSS pixels.
	pub width: f64,
	/// Canvas height in CSS pixels.
	pub height: f64,
}

impl LineageViewState {
	/// Empty state; nothing is drawn until [`set_data`](Self::set_data).
	pub fn new(config: ViewerConfig, mode: LayoutMode, width: f64, height: f64) -> Self {
		Self {
			config,
			data: None,
			layout: None,
			mode,
			viewport: Viewport::default(),
			pan: PanGesture::default(),
			selected: None,
			hovered: None,
			hovered_action: None,
			minimap_visible: true,
			width,
			height,
		}
	}

	/// The lineage being shown.
	pub fn data(&self) -> Option<&LineageData> {
		self.data.as_ref()
	}

	/// Positions for the current data and mode.
	pub fn layout(&self) -> Option<&LineageLayout> {
		self.layout.as_ref()
	}

	/// Current layout mode.
	pub fn mode(&self) -> LayoutMode {
		self.mode
	}

	/// Replaces the tree. Selection and hover survive only if their node still exists.
	pub fn set_data(&mut self, data: Option<LineageData>) {
		self.data = data;
		let still_there = |id: &Option<String>, data: &Option<LineageData>| match (id, data) {
			(Some(id), Some(data)) => data.root_node.find(id).is_some(),
			_ => false,
		};
		if !still_there(&self.selected, &self.data) {
			self.selected = None;
		}
		if !still_there(&self.hovered, &self.data) {
			self.hovered = None;
			self.hovered_action = None;
		}
		self.relayout();
	}

	/// Switches the layout algorithm; the layout is only recomputed on an actual change.
	pub fn set_layout_mode(&mut self, mode: LayoutMode) {
		if self.mode == mode && self.layout.is_some() {
			return;
		}
		self.mode = mode;
		self.relayout();
	}

	fn relayout(&mut self) {
		self.layout = self.data.as_ref().map(|data| {
			let layout = compute_layout(&data.root_node, self.mode, self.config.radial_center);
			let total = get_all_nodes(&data.root_node).len();
			if layout.len() != total {
				warn!(
					"{} of {} nodes have no position in {} layout",
					total - layout.len(),
					total,
					self.mode
				);
			}
			debug!("laid out {} nodes in {} mode", layout.len(), self.mode);
			layout
		});
	}

	/// Updates the canvas size used for hit testing and fitting.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Starts a background pan at a screen point.
	pub fn begin_pan(&mut self, pointer: Position) {
		self.pan.begin(pointer, &self.viewport);
	}

	/// Moves an active pan. Returns false when nothing is being dragged.
	pub fn drag_to(&mut self, pointer: Position) -> bool {
		self.pan.update(pointer, &mut self.viewport)
	}

	/// Finishes a background drag.
	pub fn end_pan(&mut self) {
		self.pan.end();
	}

	/// Selects `id`, replacing any previous selection. Returns whether anything changed.
	pub fn select(&mut self, id: &str) -> bool {
		if self.selected.as_deref() == Some(id) {
			return false;
		}
		self.selected = Some(id.to_string());
		true
	}

	/// Drops the selection; returns whether anything was selected.
	pub fn clear_selection(&mut self) -> bool {
		self.selected.take().is_some()
	}

	/// The selected node, if it is still in the data.
	pub fn selected_node(&self) -> Option<&AssetNode> {
		let id = self.selected.as_deref()?;
		self.data.as_ref()?.root_node.find(id)
	}

	/// Sets the hovered node; returns whether it changed.
	pub fn set_hover(&mut self, id: Option<&str>) -> bool {
		if self.hovered.as_deref() == id {
			return false;
		}
		self.hovered = id.map(str::to_string);
		true
	}

	/// Sets the action button under the pointer.
	pub fn set_hovered_action(&mut self, action: Option<(String, CardAction)>) {
		self.hovered_action = action;
	}

	/// Node id and action under the pointer.
	pub fn hovered_action(&self) -> Option<(&str, CardAction)> {
		self.hovered_action
			.as_ref()
			.map(|(id, action)| (id.as_str(), *action))
	}

	/// Whether `id` is the selected node.
	pub fn is_selected(&self, id: &str) -> bool {
		self.selected.as_deref() == Some(id)
	}

	/// Whether `id` is under the pointer.
	pub fn is_hovered(&self, id: &str) -> bool {
		self.hovered.as_deref() == Some(id)
	}

	/// Hovered or selected; these nodes get highlighted edges and an action strip.
	pub fn is_emphasized(&self, id: &str) -> bool {
		self.is_selected(id) || self.is_hovered(id)
	}

	/// Topmost card under a screen point.
	pub fn node_at(&self, screen: Position) -> Option<&AssetNode> {
		let (data, layout) = (self.data.as_ref()?, self.layout.as_ref()?);
		let world = self.viewport.screen_to_world(screen);
		get_all_nodes(&data.root_node)
			.into_iter()
			.rev()
			.find(|node| {
				layout
					.card_rect(&node.id)
					.is_some_and(|rect| rect.contains(world))
			})
	}

	/// Action button under a screen point, looking only at cards whose strip is showing.
	pub fn action_at(&self, screen: Position) -> Option<(&AssetNode, CardAction)> {
		let (data, layout) = (self.data.as_ref()?, self.layout.as_ref()?);
		let world = self.viewport.screen_to_world(screen);
		[self.hovered.as_deref(), self.selected.as_deref()]
			.into_iter()
			.flatten()
			.filter_map(|id| data.root_node.find(id))
			.find_map(|node| {
				let card = layout.position(&node.id)?;
				card_actions(node)
					.into_iter()
					.enumerate()
					.find(|(i, _)| action_rect(card, *i).contains(world))
					.map(|(_, action)| (node, action))
			})
	}

	/// Projection for the overview, when it is shown and there is something to show.
	pub fn minimap(&self) -> Option<MinimapProjection> {
		if !self.minimap_visible {
			return None;
		}
		let bounds = self.layout.as_ref()?.content_bounds()?;
		let frame = self.config.minimap_frame(self.width, self.height);
		Some(MinimapProjection::new(bounds, frame))
	}

	/// Recenters the main view on the world point under a minimap click.
	/// Returns false when the point is outside the minimap.
	pub fn minimap_navigate(&mut self, screen: Position) -> bool {
		let Some(projection) = self.minimap() else {
			return false;
		};
		if !projection.frame.contains(screen) {
			return false;
		}
		let target = projection.unproject(screen);
		self.viewport.center_on(target, self.width, self.height);
		true
	}

	/// Zooms and pans so the whole tree is on screen.
	pub fn fit_to_content(&mut self) {
		if let Some(bounds) = self.layout.as_ref().and_then(LineageLayout::content_bounds) {
			self.viewport
				.fit(bounds, self.width, self.height, self.config.fit_padding);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::lineage::layout::{NODE_HEIGHT, NODE_WIDTH};
	use crate::components::lineage::types::AssetType;
	use crate::components::lineage::types::tests::{leaf, node};

	fn state_with(root: AssetNode) -> LineageViewState {
		let mut state =
			LineageViewState::new(ViewerConfig::default(), LayoutMode::Tree, 1200.0, 800.0);
		state.set_data(Some(LineageData::from_root(root)));
		state
	}

	fn sample() -> LineageViewState {
		state_with(node(
			"root",
			AssetType::Original,
			vec![leaf("a"), leaf("b")],
		))
	}

	fn card_center(state: &LineageViewState, id: &str) -> Position {
		let rect = state.layout().unwrap().card_rect(id).unwrap();
		state.viewport.world_to_screen(rect.center())
	}

	#[test]
	fn selection_is_exclusive_and_idempotent() {
		let mut state = sample();
		assert!(state.select("a"));
		assert!(!state.select("a"));
		assert!(state.is_selected("a"));
		assert!(state.select("b"));
		assert!(state.is_selected("b"));
		assert!(!state.is_selected("a"));
		assert_eq!(state.selected_node().map(|n| n.id.as_str()), Some("b"));
		assert!(state.clear_selection());
		assert!(!state.clear_selection());
	}

	#[test]
	fn hover_and_selection_are_independent() {
		let mut state = sample();
		state.select("a");
		state.set_hover(Some("b"));
		assert!(state.is_emphasized("a"));
		assert!(state.is_emphasized("b"));
		assert!(!state.is_emphasized("root"));
		state.set_hover(None);
		assert!(state.is_selected("a"));
	}

	#[test]
	fn hit_testing_follows_the_viewport() {
		let mut state = sample();
		let at = card_center(&state, "b");
		assert_eq!(state.node_at(at).map(|n| n.id.as_str()), Some("b"));

		state.viewport.zoom_in();
		state.viewport.pan = Position::new(-80.0, 35.0);
		let at = card_center(&state, "a");
		assert_eq!(state.node_at(at).map(|n| n.id.as_str()), Some("a"));
		assert!(state.node_at(Position::new(5.0, 5.0)).is_none());
	}

	#[test]
	fn actions_only_hit_on_emphasized_cards() {
		let mut state = sample();
		let card = state.layout().unwrap().position("a").unwrap();
		let button = state.viewport.world_to_screen(action_rect(card, 0).center());
		assert!(state.action_at(button).is_none());

		state.set_hover(Some("a"));
		let (node, action) = state.action_at(button).unwrap();
		assert_eq!((node.id.as_str(), action), ("a", CardAction::View));

		state.set_hover(None);
		state.select("a");
		assert!(state.action_at(button).is_some());
	}

	#[test]
	fn new_data_drops_stale_selection() {
		let mut state = sample();
		state.select("b");
		state.set_hover(Some("a"));
		state.set_data(Some(LineageData::from_root(node(
			"root",
			AssetType::Original,
			vec![leaf("a")],
		))));
		assert!(state.selected.is_none());
		assert!(state.is_hovered("a"));

		state.set_data(None);
		assert!(state.layout().is_none());
		assert!(state.hovered.is_none());
	}

	#[test]
	fn pan_helpers_drive_the_viewport() {
		let mut state = sample();
		assert!(!state.drag_to(Position::new(10.0, 10.0)));
		state.begin_pan(Position::new(100.0, 100.0));
		assert!(state.drag_to(Position::new(130.0, 90.0)));
		assert_eq!(state.viewport.pan, Position::new(30.0, -10.0));
		state.end_pan();
		assert!(state.pan.moved());
		assert!(!state.drag_to(Position::new(0.0, 0.0)));
	}

	#[test]
	fn switching_mode_relayouts() {
		let mut state = sample();
		let tree_pos = state.layout().unwrap().position("root");
		state.set_layout_mode(LayoutMode::Radial);
		assert_eq!(state.mode(), LayoutMode::Radial);
		assert_eq!(state.layout().unwrap().mode, LayoutMode::Radial);
		assert_ne!(state.layout().unwrap().position("root"), tree_pos);
	}

	#[test]
	fn minimap_hides_without_losing_state() {
		let mut state = sample();
		state.viewport.zoom_in();
		assert!(state.minimap().is_some());
		state.minimap_visible = false;
		assert!(state.minimap().is_none());
		assert!(!state.minimap_navigate(Position::new(1100.0, 700.0)));
		state.minimap_visible = true;
		assert!(state.minimap().is_some());
		assert!((state.viewport.zoom - 1.2).abs() < 1e-12);
	}

	#[test]
	fn minimap_click_centers_the_view() {
		let mut state = sample();
		let projection = state.minimap().unwrap();
		let root = state.layout().unwrap().card_rect("root").unwrap().center();
		let click = projection.project(root);
		assert!(state.minimap_navigate(click));
		let on_screen = state.viewport.world_to_screen(root);
		assert!((on_screen.x - 600.0).abs() < 1e-6);
		assert!((on_screen.y - 400.0).abs() < 1e-6);
		assert!(!state.minimap_navigate(Position::new(10.0, 10.0)));
	}

	#[test]
	fn fit_shows_every_card() {
		let mut state = state_with(node(
			"root",
			AssetType::Original,
			(0..30).map(|i| leaf(&format!("n{i}"))).collect(),
		));
		state.fit_to_content();
		let visible = state.viewport.visible_world_rect(state.width, state.height);
		let bounds = state.layout().unwrap().content_bounds().unwrap();
		assert!(visible.x <= bounds.x && visible.right() >= bounds.right());
		assert!(visible.y <= bounds.y && visible.bottom() >= bounds.bottom());
		assert!(bounds.height > NODE_HEIGHT && bounds.width > NODE_WIDTH);
	}
}
