//! Viewer configuration.

use crate::components::lineage::{Position, Rect};

/// Build-time variable naming the default lineage source, e.g. `/api/lineage/42`.
pub const SOURCE_URL_ENV: &str = "LINEAGE_SOURCE_URL";

/// Sizes and anchors used by a lineage viewer instance.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
	/// Canvas width used when neither fullscreen nor an explicit size applies
	/// and the parent element has no measurable size.
	pub canvas_width: f64,
	/// Fallback canvas height, see `canvas_width`.
	pub canvas_height: f64,
	/// Minimap width in screen pixels.
	pub minimap_width: f64,
	/// Minimap height in screen pixels.
	pub minimap_height: f64,
	/// Gap between the minimap and the canvas corner.
	pub minimap_margin: f64,
	/// Where the root card is centered in radial mode.
	pub radial_center: Position,
	/// Screen padding kept around content by "fit to view".
	pub fit_padding: f64,
	/// Backend URL for the lineage document. `None` shows the built-in demo lineage.
	pub source_url: Option<String>,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self {
			canvas_width: 1200.0,
			canvas_height: 800.0,
			minimap_width: 200.0,
			minimap_height: 150.0,
			minimap_margin: 16.0,
			radial_center: Position::new(600.0, 400.0),
			fit_padding: 40.0,
			source_url: None,
		}
	}
}

impl ViewerConfig {
	/// Defaults, with the source taken from [`SOURCE_URL_ENV`] when it was set at build time.
	pub fn from_build_env() -> Self {
		Self::default().with_source_opt(option_env!("LINEAGE_SOURCE_URL"))
	}

	/// Sets the lineage source.
	pub fn with_source(mut self, url: impl Into<String>) -> Self {
		self.source_url = Some(url.into());
		self
	}

	/// Sets the lineage source when `url` is present and not blank.
	pub fn with_source_opt(self, url: Option<&str>) -> Self {
		match url.map(str::trim).filter(|url| !url.is_empty()) {
			Some(url) => self.with_source(url),
			None => self,
		}
	}

	/// Screen rectangle of the minimap, anchored to the bottom-right corner.
	pub fn minimap_frame(&self, canvas_width: f64, canvas_height: f64) -> Rect {
		Rect::new(
			canvas_width - self.minimap_width - self.minimap_margin,
			canvas_height - self.minimap_height - self.minimap_margin,
			self.minimap_width,
			self.minimap_height,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn minimap_sits_in_bottom_right_corner() {
		let config = ViewerConfig::default();
		let frame = config.minimap_frame(1000.0, 700.0);
		assert_eq!(frame.right(), 1000.0 - config.minimap_margin);
		assert_eq!(frame.bottom(), 700.0 - config.minimap_margin);
		assert_eq!(frame.width, config.minimap_width);
	}

	#[test]
	fn blank_sources_are_ignored() {
		let config = ViewerConfig::default().with_source_opt(Some("  /api/lineage/7 "));
		assert_eq!(config.source_url.as_deref(), Some("/api/lineage/7"));
		assert_eq!(ViewerConfig::default().with_source_opt(Some("   ")).source_url, None);
		assert_eq!(ViewerConfig::default().with_source_opt(None).source_url, None);
	}

	#[test]
	fn build_env_source_matches_compile_time_value() {
		let expected = option_env!("LINEAGE_SOURCE_URL")
			.map(str::trim)
			.filter(|url| !url.is_empty());
		assert_eq!(ViewerConfig::from_build_env().source_url.as_deref(), expected);
	}
}
