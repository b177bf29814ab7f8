use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LineageError;

/// How a revision relates to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
	/// The first revision of an asset.
	Original,
	/// A straight successor of its parent.
	Version,
	/// An alternative take derived from its parent.
	Variant,
	/// A touch-up of its parent; drawn with a dashed incoming edge.
	Refinement,
	/// A merge of several sources.
	Composite,
}

impl AssetType {
	/// Label shown on the card.
	pub fn label(self) -> &'static str {
		match self {
			Self::Original => "Original",
			Self::Version => "Version",
			Self::Variant => "Variant",
			Self::Refinement => "Refinement",
			Self::Composite => "Composite",
		}
	}

	/// Accent color for the card border.
	pub fn color(self) -> &'static str {
		match self {
			Self::Original => "#3b82f6",
			Self::Version => "#10b981",
			Self::Variant => "#a855f7",
			Self::Refinement => "#f97316",
			Self::Composite => "#ec4899",
		}
	}

	/// Glyph drawn in place of a missing thumbnail.
	pub fn glyph(self) -> &'static str {
		match self {
			Self::Original => "◉",
			Self::Version => "◆",
			Self::Variant => "⑂",
			Self::Refinement => "✎",
			Self::Composite => "⧉",
		}
	}
}

impl fmt::Display for AssetType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Review status of a revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
	/// Accepted for use.
	Approved,
	/// Turned down during review.
	Rejected,
	/// Waiting for review; the only status that offers the approve action.
	Pending,
	/// Kept for history only.
	Archived,
}

impl AssetStatus {
	/// Human readable status.
	pub fn label(self) -> &'static str {
		match self {
			Self::Approved => "Approved",
			Self::Rejected => "Rejected",
			Self::Pending => "Pending",
			Self::Archived => "Archived",
		}
	}

	/// Single letter shown in the status badge.
	pub fn badge_letter(self) -> char {
		self.label().chars().next().unwrap_or('?')
	}

	/// Badge fill color.
	pub fn color(self) -> &'static str {
		match self {
			Self::Approved => "#22c55e",
			Self::Rejected => "#ef4444",
			Self::Pending => "#eab308",
			Self::Archived => "#6b7280",
		}
	}
}

/// Descriptive data attached to a revision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
	/// When the revision was produced.
	pub created_at: DateTime<Utc>,
	/// Generation prompt, when the revision came from one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub prompt: Option<String>,
	/// Summary of what changed relative to the parent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub changes: Option<String>,
	/// Review state; absent for revisions never submitted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<AssetStatus>,
}

/// One revision of a creative asset and the revisions derived from it.
///
/// Children are kept in display order. Layout coordinates are not stored here;
/// see [`LineageLayout`](super::layout::LineageLayout).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetNode {
	/// Unique id within the lineage.
	pub id: String,
	/// How this revision relates to its parent.
	#[serde(rename = "type")]
	pub kind: AssetType,
	/// Display title.
	pub title: String,
	/// Preview image drawn on the card.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub thumbnail_url: Option<String>,
	/// Creation time, prompt and review state.
	pub metadata: NodeMetadata,
	/// Id of the parent; `None` for the root.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<String>,
	/// Derived revisions in display order.
	#[serde(default)]
	pub children: Vec<AssetNode>,
}

impl AssetNode {
	/// Finds a node by id anywhere in this subtree.
	pub fn find(&self, id: &str) -> Option<&AssetNode> {
		let mut stack = vec![self];
		while let Some(node) = stack.pop() {
			if node.id == id {
				return Some(node);
			}
			stack.extend(node.children.iter().rev());
		}
		None
	}

	/// True when nothing was derived from this revision.
	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Shorthand for `metadata.status`.
	pub fn status(&self) -> Option<AssetStatus> {
		self.metadata.status
	}
}

/// The whole lineage graph handed over by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageData {
	/// The original revision.
	pub root_node: AssetNode,
	/// Number of nodes in the tree.
	pub total_nodes: usize,
	/// Number of root-to-leaf paths.
	pub total_branches: usize,
	/// Deepest level, with the root at 0.
	pub max_depth: usize,
}

impl LineageData {
	/// Builds lineage data with summary counts derived from the tree.
	///
	/// Branches are counted as root-to-leaf paths and depth starts at 0 for the root.
	pub fn from_root(root_node: AssetNode) -> Self {
		let (mut total_nodes, mut total_branches, mut max_depth) = (0, 0, 0);
		let mut stack = vec![(&root_node, 0usize)];
		while let Some((node, depth)) = stack.pop() {
			total_nodes += 1;
			max_depth = max_depth.max(depth);
			if node.is_leaf() {
				total_branches += 1;
			}
			stack.extend(node.children.iter().map(|child| (child, depth + 1)));
		}
		Self {
			root_node,
			total_nodes,
			total_branches,
			max_depth,
		}
	}

	/// Checks that ids are unique and that every `parent_id` matches the tree structure.
	pub fn validate(&self) -> Result<(), LineageError> {
		let mut seen = HashSet::new();
		let mut stack: Vec<(&AssetNode, Option<&str>)> = vec![(&self.root_node, None)];
		while let Some((node, parent)) = stack.pop() {
			if !seen.insert(node.id.as_str()) {
				return Err(LineageError::DuplicateId(node.id.clone()));
			}
			if let (Some(found), Some(expected)) = (node.parent_id.as_deref(), parent) {
				if found != expected {
					return Err(LineageError::ParentMismatch {
						node: node.id.clone(),
						expected: expected.to_string(),
						found: found.to_string(),
					});
				}
			}
			stack.extend(
				node.children
					.iter()
					.map(|child| (child, Some(node.id.as_str()))),
			);
		}
		Ok(())
	}
}

/// A point in world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Position {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	/// Left edge.
	pub x: f64,
	/// Top edge.
	pub y: f64,
	/// Extent along x.
	pub width: f64,
	/// Extent along y.
	pub height: f64,
}

impl Rect {
	/// Rectangle with top-left corner `(x, y)`.
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	/// Right edge.
	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	/// Bottom edge.
	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}

	/// Midpoint.
	pub fn center(&self) -> Position {
		Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	/// Edges are inclusive on the top/left side only.
	pub fn contains(&self, p: Position) -> bool {
		p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
	}

	/// Smallest rectangle covering both.
	pub fn union(&self, other: &Rect) -> Rect {
		let (x, y) = (self.x.min(other.x), self.y.min(other.y));
		Rect::new(
			x,
			y,
			self.right().max(other.right()) - x,
			self.bottom().max(other.bottom()) - y,
		)
	}

	/// Grows the rectangle by `by` on every side.
	pub fn inflate(&self, by: f64) -> Rect {
		Rect::new(
			self.x - by,
			self.y - by,
			self.width + 2.0 * by,
			self.height + 2.0 * by,
		)
	}
}
