//! Overview of the whole lineage drawn in a corner of the canvas.

use web_sys::CanvasRenderingContext2d;

use super::layout::{LineageLayout, NODE_HEIGHT, NODE_WIDTH, get_all_nodes};
use super::types::{AssetNode, Position, Rect};
use super::viewport::Viewport;

/// World-space padding around the content inside the overview.
const CONTENT_PADDING: f64 = 40.0;

/// Maps the full content bounding box into the fixed minimap frame, like an SVG `viewBox`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapProjection {
	/// Screen rectangle the overview is drawn into.
	pub frame: Rect,
	content: Rect,
	scale: f64,
	offset: Position,
}

impl MinimapProjection {
	/// Fits `content`, padded, into `frame` while keeping its aspect ratio.
	pub fn new(content: Rect, frame: Rect) -> Self {
		let content = content.inflate(CONTENT_PADDING);
		let scale = (frame.width / content.width).min(frame.height / content.height);
		let offset = Position::new(
			frame.x + (frame.width - content.width * scale) / 2.0,
			frame.y + (frame.height - content.height * scale) / 2.0,
		);
		Self {
			frame,
			content,
			scale,
			offset,
		}
	}

	/// Screen pixels per world unit.
	pub fn scale(&self) -> f64 {
		self.scale
	}

	/// World point to minimap screen point.
	pub fn project(&self, world: Position) -> Position {
		Position::new(
			self.offset.x + (world.x - self.content.x) * self.scale,
			self.offset.y + (world.y - self.content.y) * self.scale,
		)
	}

	/// World rectangle to minimap screen rectangle.
	pub fn project_rect(&self, world: Rect) -> Rect {
		let origin = self.project(Position::new(world.x, world.y));
		Rect::new(
			origin.x,
			origin.y,
			world.width * self.scale,
			world.height * self.scale,
		)
	}

	/// Minimap screen point back to world space.
	pub fn unproject(&self, screen: Position) -> Position {
		Position::new(
			self.content.x + (screen.x - self.offset.x) / self.scale,
			self.content.y + (screen.y - self.offset.y) / self.scale,
		)
	}

	/// The main canvas' visible region, in minimap pixels.
	pub fn indicator(&self, viewport: &Viewport, canvas_width: f64, canvas_height: f64) -> Rect {
		self.project_rect(viewport.visible_world_rect(canvas_width, canvas_height))
	}
}

/// Draws the overview in screen space. Zoom and pan of the main view are ignored
/// except for the indicator rectangle.
pub fn draw(
	ctx: &CanvasRenderingContext2d,
	projection: &MinimapProjection,
	root: &AssetNode,
	layout: &LineageLayout,
	indicator: Rect,
	selected: Option<&str>,
) {
	let frame = projection.frame;
	ctx.save();
	ctx.set_fill_style_str("rgba(15, 23, 42, 0.85)");
	ctx.fill_rect(frame.x, frame.y, frame.width, frame.height);
	ctx.begin_path();
	ctx.rect(frame.x, frame.y, frame.width, frame.height);
	ctx.clip();

	let (card_w, card_h) = (NODE_WIDTH * projection.scale(), NODE_HEIGHT * projection.scale());
	ctx.set_stroke_style_str("rgba(148, 163, 184, 0.6)");
	ctx.set_line_width(1.0);
	let nodes = get_all_nodes(root);
	for node in &nodes {
		let Some(from) = layout.position(&node.id) else {
			continue;
		};
		let from = projection.project(from);
		for child in &node.children {
			let Some(to) = layout.position(&child.id) else {
				continue;
			};
			let to = projection.project(to);
			ctx.begin_path();
			ctx.move_to(from.x + card_w / 2.0, from.y + card_h);
			ctx.line_to(to.x + card_w / 2.0, to.y);
			ctx.stroke();
		}
	}

	for node in &nodes {
		let Some(at) = layout.position(&node.id) else {
			continue;
		};
		let at = projection.project(at);
		let color = if selected == Some(node.id.as_str()) {
			"#facc15"
		} else {
			node.kind.color()
		};
		ctx.set_fill_style_str(color);
		ctx.fill_rect(at.x, at.y, card_w.max(2.0), card_h.max(2.0));
	}

	ctx.set_stroke_style_str("#f8fafc");
	ctx.set_line_width(1.5);
	ctx.stroke_rect(indicator.x, indicator.y, indicator.width, indicator.height);
	ctx.restore();

	ctx.set_stroke_style_str("rgba(148, 163, 184, 0.8)");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(frame.x, frame.y, frame.width, frame.height);
}
