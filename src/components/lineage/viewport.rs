//! Pan and zoom state for a lineage canvas.
//!
//! The forward transform is `screen = world * zoom + pan`. The minimap
//! indicator is its inverse applied to the canvas rectangle.

use super::types::{Position, Rect};

/// Smallest zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 3.0;
/// Zoom multiplier for one wheel notch towards the screen.
pub const WHEEL_ZOOM_IN: f64 = 1.1;
/// Zoom multiplier for one wheel notch away from the screen.
pub const WHEEL_ZOOM_OUT: f64 = 0.9;
/// Multiplier applied by the toolbar zoom buttons.
pub const BUTTON_ZOOM_STEP: f64 = 1.2;
/// Pointer travel, in pixels, after which a press counts as a drag instead of a click.
pub const DRAG_THRESHOLD: f64 = 3.0;

/// World to screen transform of a canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Scale factor, kept within [`MIN_ZOOM`, `MAX_ZOOM`].
	pub zoom: f64,
	/// Screen offset of the world origin.
	pub pan: Position,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			zoom: 1.0,
			pan: Position::default(),
		}
	}
}

impl Viewport {
	/// Sets the zoom, clamped to the allowed range.
	pub fn set_zoom(&mut self, zoom: f64) {
		self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
	}

	/// Positive `delta_y` scrolls away from the user and zooms out.
	pub fn wheel(&mut self, delta_y: f64) {
		if delta_y == 0.0 {
			return;
		}
		let factor = if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
		self.set_zoom(self.zoom * factor);
	}

	/// One toolbar step in.
	pub fn zoom_in(&mut self) {
		self.set_zoom(self.zoom * BUTTON_ZOOM_STEP);
	}

	/// One toolbar step out.
	pub fn zoom_out(&mut self) {
		self.set_zoom(self.zoom / BUTTON_ZOOM_STEP);
	}

	/// Back to zoom 1 with no pan.
	pub fn reset(&mut self) {
		*self = Self::default();
	}

	/// `world * zoom + pan`.
	pub fn world_to_screen(&self, p: Position) -> Position {
		Position::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
	}

	/// Inverse of [`world_to_screen`](Self::world_to_screen).
	pub fn screen_to_world(&self, p: Position) -> Position {
		Position::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
	}

	/// The part of the world visible on a `width` x `height` canvas.
	pub fn visible_world_rect(&self, width: f64, height: f64) -> Rect {
		Rect::new(
			-self.pan.x / self.zoom,
			-self.pan.y / self.zoom,
			width / self.zoom,
			height / self.zoom,
		)
	}

	/// Pans so that `world` lands in the middle of the canvas, keeping the zoom.
	pub fn center_on(&mut self, world: Position, width: f64, height: f64) {
		self.pan = Position::new(
			width / 2.0 - world.x * self.zoom,
			height / 2.0 - world.y * self.zoom,
		);
	}

	/// Zooms and pans so `bounds` fills the canvas minus `padding` on every side.
	pub fn fit(&mut self, bounds: Rect, width: f64, height: f64, padding: f64) {
		if bounds.width <= 0.0 || bounds.height <= 0.0 {
			return;
		}
		let avail_w = (width - 2.0 * padding).max(1.0);
		let avail_h = (height - 2.0 * padding).max(1.0);
		self.set_zoom((avail_w / bounds.width).min(avail_h / bounds.height));
		self.center_on(bounds.center(), width, height);
	}
}

/// A press-drag-release gesture on empty canvas background.
#[derive(Clone, Debug, Default)]
pub struct PanGesture {
	anchor: Option<Position>,
	start: Position,
	moved: bool,
}

impl PanGesture {
	/// Anchors the gesture so later pointer positions map straight to an offset.
	pub fn begin(&mut self, pointer: Position, viewport: &Viewport) {
		self.anchor = Some(Position::new(
			pointer.x - viewport.pan.x,
			pointer.y - viewport.pan.y,
		));
		self.start = pointer;
		self.moved = false;
	}

	/// Applies the pointer position to `viewport`. Returns false when no gesture is active.
	pub fn update(&mut self, pointer: Position, viewport: &mut Viewport) -> bool {
		let Some(anchor) = self.anchor else {
			return false;
		};
		let (dx, dy) = (pointer.x - self.start.x, pointer.y - self.start.y);
		if (dx * dx + dy * dy).sqrt() > DRAG_THRESHOLD {
			self.moved = true;
		}
		viewport.pan = Position::new(pointer.x - anchor.x, pointer.y - anchor.y);
		true
	}

	/// Releases the pointer; the moved flag is kept until [`clear`](Self::clear).
	pub fn end(&mut self) {
		self.anchor = None;
	}

	/// Forgets whether the last gesture was a drag.
	pub fn clear(&mut self) {
		self.anchor = None;
		self.moved = false;
	}

	/// True while the pointer is held down.
	pub fn is_active(&self) -> bool {
		self.anchor.is_some()
	}

	/// True if the most recent gesture travelled far enough to swallow the click that ends it.
	pub fn moved(&self) -> bool {
		self.moved
	}
}
