//! Canvas drawing of edges, cards and their action strips.

use std::collections::HashMap;

use log::warn;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::layout::{LineageLayout, NODE_HEIGHT, NODE_WIDTH, get_all_nodes};
use super::minimap;
use super::state::LineageViewState;
use super::types::{AssetNode, AssetStatus, AssetType, Position, Rect};

const CARD_PADDING: f64 = 8.0;
const THUMB_HEIGHT: f64 = 56.0;
/// Side length of an action button.
pub const ACTION_SIZE: f64 = 24.0;
const ACTION_GAP: f64 = 6.0;
const BADGE_RADIUS: f64 = 10.0;
const TITLE_MAX_CHARS: usize = 22;

/// A parent to child connection in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSegment {
	/// Bottom-center of the parent card.
	pub from: Position,
	/// Top-center of the child card.
	pub to: Position,
	/// Refinements are drawn dashed.
	pub dashed: bool,
	/// Either end is hovered or selected.
	pub highlighted: bool,
}

/// Buttons in a card's action strip, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardAction {
	/// Open the full asset.
	View,
	/// Download the asset file.
	Download,
	/// Start a new revision from this one.
	Duplicate,
	/// Approve a pending revision.
	Approve,
	/// Remove the revision, after confirmation.
	Delete,
}

impl CardAction {
	/// Icon drawn on the button.
	pub fn glyph(self) -> &'static str {
		match self {
			Self::View => "👁",
			Self::Download => "⬇",
			Self::Duplicate => "⧉",
			Self::Approve => "✓",
			Self::Delete => "✕",
		}
	}

	/// Tooltip and accessible name.
	pub fn label(self) -> &'static str {
		match self {
			Self::View => "View",
			Self::Download => "Download",
			Self::Duplicate => "Duplicate",
			Self::Approve => "Approve",
			Self::Delete => "Delete",
		}
	}
}

/// Actions offered for `node`. Approve only shows while the node is pending review.
pub fn card_actions(node: &AssetNode) -> Vec<CardAction> {
	let mut actions = vec![CardAction::View, CardAction::Download, CardAction::Duplicate];
	if node.status() == Some(AssetStatus::Pending) {
		actions.push(CardAction::Approve);
	}
	actions.push(CardAction::Delete);
	actions
}

/// World-space hit box of the `index`-th action button on a card at `card`.
pub fn action_rect(card: Position, index: usize) -> Rect {
	Rect::new(
		card.x + CARD_PADDING + 4.0 + index as f64 * (ACTION_SIZE + ACTION_GAP),
		card.y + CARD_PADDING + THUMB_HEIGHT - ACTION_SIZE - 4.0,
		ACTION_SIZE,
		ACTION_SIZE,
	)
}

/// One segment per parent-child pair whose ends both have a position.
///
/// Highlighting is derived from `is_emphasized` on every call and never stored.
pub fn edge_segments(
	root: &AssetNode,
	layout: &LineageLayout,
	is_emphasized: impl Fn(&str) -> bool,
) -> Vec<EdgeSegment> {
	let mut edges = Vec::new();
	for parent in get_all_nodes(root) {
		let Some(from) = layout.position(&parent.id) else {
			continue;
		};
		for child in &parent.children {
			let Some(to) = layout.position(&child.id) else {
				continue;
			};
			edges.push(EdgeSegment {
				from: Position::new(from.x + NODE_WIDTH / 2.0, from.y + NODE_HEIGHT),
				to: Position::new(to.x + NODE_WIDTH / 2.0, to.y),
				dashed: child.kind == AssetType::Refinement,
				highlighted: is_emphasized(&parent.id) || is_emphasized(&child.id),
			});
		}
	}
	edges
}

/// Thumbnail elements keyed by URL. Images draw once the browser reports them loaded.
#[derive(Default)]
pub struct ImageCache {
	images: HashMap<String, HtmlImageElement>,
}

impl ImageCache {
	/// Returns the image once it has finished loading, starting the load on first use.
	pub fn get(&mut self, url: &str) -> Option<&HtmlImageElement> {
		if !self.images.contains_key(url) {
			match HtmlImageElement::new() {
				Ok(img) => {
					img.set_src(url);
					self.images.insert(url.to_string(), img);
				}
				Err(err) => {
					warn!("could not create image element for {url}: {err:?}");
					return None;
				}
			}
		}
		self.images
			.get(url)
			.filter(|img| img.complete() && img.natural_width() > 0)
	}
}

fn truncate(title: &str) -> String {
	if title.chars().count() <= TITLE_MAX_CHARS {
		title.to_string()
	} else {
		let head: String = title.chars().take(TITLE_MAX_CHARS - 1).collect();
		format!("{head}…")
	}
}

/// Draws one full frame: edges, cards, then the minimap.
pub fn render(state: &LineageViewState, ctx: &CanvasRenderingContext2d, images: &mut ImageCache) {
	ctx.set_fill_style_str("#0f172a");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	let (Some(data), Some(layout)) = (state.data(), state.layout()) else {
		return;
	};
	let root = &data.root_node;

	ctx.save();
	let _ = ctx.translate(state.viewport.pan.x, state.viewport.pan.y);
	let _ = ctx.scale(state.viewport.zoom, state.viewport.zoom);
	draw_edges(state, root, layout, ctx);
	draw_cards(state, root, layout, ctx, images);
	ctx.restore();

	if let Some(projection) = state.minimap() {
		let indicator = projection.indicator(&state.viewport, state.width, state.height);
		minimap::draw(
			ctx,
			&projection,
			root,
			layout,
			indicator,
			state.selected.as_deref(),
		);
	}
}

fn draw_edges(
	state: &LineageViewState,
	root: &AssetNode,
	layout: &LineageLayout,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.viewport.zoom;
	let dash = js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(4.0));
	for edge in edge_segments(root, layout, |id| state.is_emphasized(id)) {
		let (color, width) = if edge.highlighted {
			("#f59e0b", 3.0)
		} else {
			("#64748b", 1.5)
		};
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(width / k.max(0.5));
		if edge.dashed {
			let _ = ctx.set_line_dash(&dash);
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
		ctx.begin_path();
		ctx.move_to(edge.from.x, edge.from.y);
		ctx.line_to(edge.to.x, edge.to.y);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_cards(
	state: &LineageViewState,
	root: &AssetNode,
	layout: &LineageLayout,
	ctx: &CanvasRenderingContext2d,
	images: &mut ImageCache,
) {
	for node in get_all_nodes(root) {
		// A node without a position is skipped rather than blanking the view.
		let Some(at) = layout.position(&node.id) else {
			continue;
		};
		draw_card(state, node, at, ctx, images);
	}
}

fn draw_card(
	state: &LineageViewState,
	node: &AssetNode,
	at: Position,
	ctx: &CanvasRenderingContext2d,
	images: &mut ImageCache,
) {
	let (selected, hovered) = (state.is_selected(&node.id), state.is_hovered(&node.id));

	ctx.set_fill_style_str(if hovered { "#1e293b" } else { "#172033" });
	ctx.fill_rect(at.x, at.y, NODE_WIDTH, NODE_HEIGHT);
	let (border, border_width) = if selected {
		("#38bdf8", 3.0)
	} else if hovered {
		("#e2e8f0", 2.0)
	} else {
		(node.kind.color(), 1.5)
	};
	ctx.set_stroke_style_str(border);
	ctx.set_line_width(border_width);
	ctx.stroke_rect(at.x, at.y, NODE_WIDTH, NODE_HEIGHT);

	let thumb = Rect::new(
		at.x + CARD_PADDING,
		at.y + CARD_PADDING,
		NODE_WIDTH - 2.0 * CARD_PADDING,
		THUMB_HEIGHT,
	);
	let image = node.thumbnail_url.as_deref().and_then(|url| images.get(url));
	match image {
		Some(img) => {
			let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
				img,
				thumb.x,
				thumb.y,
				thumb.width,
				thumb.height,
			);
		}
		None => {
			ctx.set_fill_style_str("#334155");
			ctx.fill_rect(thumb.x, thumb.y, thumb.width, thumb.height);
			ctx.set_fill_style_str("#94a3b8");
			ctx.set_font("24px sans-serif");
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			let center = thumb.center();
			let _ = ctx.fill_text(node.kind.glyph(), center.x, center.y);
		}
	}

	ctx.set_text_align("left");
	ctx.set_text_baseline("alphabetic");
	ctx.set_fill_style_str("#f8fafc");
	ctx.set_font("bold 13px sans-serif");
	let _ = ctx.fill_text(
		&truncate(&node.title),
		at.x + CARD_PADDING,
		at.y + CARD_PADDING + THUMB_HEIGHT + 18.0,
	);
	ctx.set_fill_style_str(node.kind.color());
	ctx.set_font("11px sans-serif");
	let _ = ctx.fill_text(
		node.kind.label(),
		at.x + CARD_PADDING,
		at.y + CARD_PADDING + THUMB_HEIGHT + 36.0,
	);

	if let Some(status) = node.status() {
		let cx = at.x + NODE_WIDTH - CARD_PADDING - BADGE_RADIUS;
		let cy = at.y + NODE_HEIGHT - CARD_PADDING - BADGE_RADIUS;
		ctx.begin_path();
		let _ = ctx.arc(cx, cy, BADGE_RADIUS, 0.0, std::f64::consts::TAU);
		ctx.set_fill_style_str(status.color());
		ctx.fill();
		ctx.set_fill_style_str("#0f172a");
		ctx.set_font("bold 11px sans-serif");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(&status.badge_letter().to_string(), cx, cy);
	}

	if selected || hovered {
		draw_action_strip(state, node, at, ctx);
	}
	ctx.set_text_align("left");
	ctx.set_text_baseline("alphabetic");
}

fn draw_action_strip(
	state: &LineageViewState,
	node: &AssetNode,
	at: Position,
	ctx: &CanvasRenderingContext2d,
) {
	let actions = card_actions(node);
	ctx.set_font("13px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for (i, action) in actions.iter().enumerate() {
		let rect = action_rect(at, i);
		let armed = state.hovered_action() == Some((node.id.as_str(), *action));
		let fill = match (action, armed) {
			(CardAction::Delete, true) => "#dc2626",
			(CardAction::Approve, true) => "#16a34a",
			(_, true) => "#0284c7",
			(_, false) => "rgba(15, 23, 42, 0.8)",
		};
		ctx.set_fill_style_str(fill);
		ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
		ctx.set_fill_style_str("#f8fafc");
		let center = rect.center();
		let _ = ctx.fill_text(action.glyph(), center.x, center.y);
	}
}
