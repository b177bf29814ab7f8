//! Coordinate assignment for lineage trees.
//!
//! A layout pass is split into independent walks over the tree:
//!
//! 1. [`subtree_sizes`] counts every subtree bottom-up.
//! 2. [`compute_layout`] assigns a top-left card position per node, top-down,
//!    for the selected [`LayoutMode`].
//! 3. [`get_all_nodes`] flattens the tree in pre-order for drawing.
//!
//! Each walk is O(n). Positions live in a map keyed by node id and never on
//! the nodes themselves, so switching modes on the same tree cannot leave stale
//! coordinates behind.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use super::types::{AssetNode, Position, Rect};
use crate::error::LineageError;

/// Card width in world units.
pub const NODE_WIDTH: f64 = 200.0;
/// Card height in world units.
pub const NODE_HEIGHT: f64 = 120.0;
/// Gap between neighbouring cards along x.
pub const HORIZONTAL_SPACING: f64 = 80.0;
/// Gap between neighbouring cards along y.
pub const VERTICAL_SPACING: f64 = 60.0;
/// Offset of the first column and row in tree and timeline modes.
pub const MARGIN: f64 = 50.0;
/// Ring radius for children at depth `d` is `d * RADIAL_RING_STEP + RADIAL_BASE_RADIUS`.
pub const RADIAL_RING_STEP: f64 = 200.0;
/// Radius added on top of the per-ring step in radial mode.
pub const RADIAL_BASE_RADIUS: f64 = 100.0;

const COLUMN: f64 = NODE_WIDTH + HORIZONTAL_SPACING;
const ROW: f64 = NODE_HEIGHT + VERTICAL_SPACING;

/// Algorithm used to place nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
	/// Left-to-right layered tree, parents aligned with their first child.
	#[default]
	Tree,
	/// Children on a ring around each parent.
	Radial,
	/// Pre-order index along x, depth along y.
	Timeline,
}

impl LayoutMode {
	/// Every mode, in toolbar order.
	pub const ALL: [LayoutMode; 3] = [Self::Tree, Self::Radial, Self::Timeline];

	/// Lowercase name used in URLs and `FromStr`.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Tree => "tree",
			Self::Radial => "radial",
			Self::Timeline => "timeline",
		}
	}

	/// Toolbar label.
	pub fn label(self) -> &'static str {
		match self {
			Self::Tree => "Tree",
			Self::Radial => "Radial",
			Self::Timeline => "Timeline",
		}
	}
}

impl fmt::Display for LayoutMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for LayoutMode {
	type Err = LineageError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"tree" => Ok(Self::Tree),
			"radial" => Ok(Self::Radial),
			"timeline" => Ok(Self::Timeline),
			_ => Err(LineageError::UnknownLayoutMode(s.to_string())),
		}
	}
}

/// Card positions for one tree under one mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineageLayout {
	/// Mode the positions were computed for.
	pub mode: LayoutMode,
	positions: HashMap<String, Position>,
}

impl LineageLayout {
	/// Top-left corner of the node's card, if it was placed.
	pub fn position(&self, id: &str) -> Option<Position> {
		self.positions.get(id).copied()
	}

	/// Card footprint of the node in world space.
	pub fn card_rect(&self, id: &str) -> Option<Rect> {
		self.position(id)
			.map(|p| Rect::new(p.x, p.y, NODE_WIDTH, NODE_HEIGHT))
	}

	/// Number of placed cards.
	pub fn len(&self) -> usize {
		self.positions.len()
	}

	/// True when nothing was placed.
	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}

	/// Bounding box of every placed card.
	pub fn content_bounds(&self) -> Option<Rect> {
		self.positions
			.values()
			.map(|p| Rect::new(p.x, p.y, NODE_WIDTH, NODE_HEIGHT))
			.reduce(|acc, rect| acc.union(&rect))
	}
}

/// Number of nodes in every subtree, keyed by the subtree root's id.
pub fn subtree_sizes(root: &AssetNode) -> HashMap<&str, usize> {
	fn visit<'a>(node: &'a AssetNode, sizes: &mut HashMap<&'a str, usize>) -> usize {
		let size = 1 + node
			.children
			.iter()
			.map(|child| visit(child, sizes))
			.sum::<usize>();
		sizes.insert(node.id.as_str(), size);
		size
	}

	let mut sizes = HashMap::new();
	visit(root, &mut sizes);
	sizes
}

/// Depth of every node, root = 0.
pub fn node_depths(root: &AssetNode) -> HashMap<&str, usize> {
	let mut depths = HashMap::new();
	let mut stack = vec![(root, 0usize)];
	while let Some((node, depth)) = stack.pop() {
		depths.insert(node.id.as_str(), depth);
		stack.extend(node.children.iter().map(|child| (child, depth + 1)));
	}
	depths
}

/// Every node in pre-order, children in their stored order.
pub fn get_all_nodes(root: &AssetNode) -> Vec<&AssetNode> {
	let mut out = Vec::new();
	let mut stack = vec![root];
	while let Some(node) = stack.pop() {
		out.push(node);
		stack.extend(node.children.iter().rev());
	}
	out
}

/// Places every node of `root` under `mode`.
///
/// `radial_center` is where the root card is centered in radial mode; the other
/// modes start at [`MARGIN`]. The input tree is only read.
pub fn compute_layout(
	root: &AssetNode,
	mode: LayoutMode,
	radial_center: Position,
) -> LineageLayout {
	let mut positions = HashMap::new();
	match mode {
		LayoutMode::Tree => {
			let sizes = subtree_sizes(root);
			place_tree(root, 0, 0, &sizes, &mut positions);
		}
		LayoutMode::Radial => {
			let origin = Position::new(
				radial_center.x - NODE_WIDTH / 2.0,
				radial_center.y - NODE_HEIGHT / 2.0,
			);
			place_radial(root, 0, origin, &mut positions);
		}
		LayoutMode::Timeline => {
			let mut index = 0;
			place_timeline(root, 0, &mut index, &mut positions);
		}
	}
	LineageLayout { mode, positions }
}

fn place_tree(
	node: &AssetNode,
	depth: usize,
	row: usize,
	sizes: &HashMap<&str, usize>,
	positions: &mut HashMap<String, Position>,
) {
	positions.insert(
		node.id.clone(),
		Position::new(
			MARGIN + depth as f64 * COLUMN,
			MARGIN + row as f64 * ROW,
		),
	);
	// siblings start where the previous sibling's subtree ends
	let mut next_row = row;
	for child in &node.children {
		place_tree(child, depth + 1, next_row, sizes, positions);
		next_row += sizes.get(child.id.as_str()).copied().unwrap_or(1);
	}
}

fn place_radial(
	node: &AssetNode,
	depth: usize,
	at: Position,
	positions: &mut HashMap<String, Position>,
) {
	positions.insert(node.id.clone(), at);
	if node.children.is_empty() {
		return;
	}
	let radius = (depth + 1) as f64 * RADIAL_RING_STEP + RADIAL_BASE_RADIUS;
	let step = TAU / node.children.len() as f64;
	for (i, child) in node.children.iter().enumerate() {
		let theta = i as f64 * step;
		let child_at = Position::new(at.x + radius * theta.cos(), at.y + radius * theta.sin());
		place_radial(child, depth + 1, child_at, positions);
	}
}

fn place_timeline(
	node: &AssetNode,
	depth: usize,
	index: &mut usize,
	positions: &mut HashMap<String, Position>,
) {
	positions.insert(
		node.id.clone(),
		Position::new(
			MARGIN + *index as f64 * COLUMN,
			MARGIN + depth as f64 * ROW,
		),
	);
	*index += 1;
	for child in &node.children {
		place_timeline(child, depth + 1, index, positions);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::lineage::types::AssetType;
	use crate::components::lineage::types::tests::{leaf, node};

	const CENTER: Position = Position::new(600.0, 400.0);

	fn row_of(layout: &LineageLayout, id: &str) -> usize {
		((layout.position(id).unwrap().y - MARGIN) / ROW).round() as usize
	}

	fn sample() -> AssetNode {
		node(
			"root",
			AssetType::Original,
			vec![
				node(
					"a",
					AssetType::Version,
					vec![node("a1", AssetType::Variant, vec![leaf("a1x")]), leaf("a2")],
				),
				leaf("b"),
				node("c", AssetType::Refinement, vec![leaf("c1")]),
			],
		)
	}

	#[test]
	fn chain_stays_on_one_row() {
		let chain = node(
			"root",
			AssetType::Original,
			vec![node("child", AssetType::Version, vec![leaf("grandchild")])],
		);
		let layout = compute_layout(&chain, LayoutMode::Tree, CENTER);
		assert_eq!(layout.position("root"), Some(Position::new(50.0, 50.0)));
		assert_eq!(
			layout.position("child"),
			Some(Position::new(NODE_WIDTH + 80.0 + 50.0, 50.0))
		);
		assert_eq!(
			layout.position("grandchild"),
			Some(Position::new(2.0 * (NODE_WIDTH + 80.0) + 50.0, 50.0))
		);
	}

	#[test]
	fn two_leaves_take_consecutive_rows() {
		let tree = node("root", AssetType::Original, vec![leaf("one"), leaf("two")]);
		let layout = compute_layout(&tree, LayoutMode::Tree, CENTER);
		let (one, two) = (layout.position("one").unwrap(), layout.position("two").unwrap());
		assert_eq!(one.x, two.x);
		assert_eq!(one.x, MARGIN + COLUMN);
		assert_eq!(one.y, MARGIN);
		assert_eq!(two.y - one.y, NODE_HEIGHT + 60.0);
	}

	#[test]
	fn sibling_subtrees_never_share_rows() {
		let tree = sample();
		let sizes = subtree_sizes(&tree);
		let layout = compute_layout(&tree, LayoutMode::Tree, CENTER);
		for parent in get_all_nodes(&tree) {
			for pair in parent.children.windows(2) {
				let (a, b) = (&pair[0], &pair[1]);
				assert_eq!(
					row_of(&layout, &b.id),
					row_of(&layout, &a.id) + sizes[a.id.as_str()],
					"{} should start right after {}",
					b.id,
					a.id
				);
			}
		}
	}

	#[test]
	fn parent_is_aligned_with_first_child() {
		let layout = compute_layout(&sample(), LayoutMode::Tree, CENTER);
		assert_eq!(row_of(&layout, "a"), row_of(&layout, "a1"));
		assert_eq!(row_of(&layout, "root"), row_of(&layout, "a"));
	}

	#[test]
	fn layout_is_deterministic() {
		let tree = sample();
		for mode in LayoutMode::ALL {
			assert_eq!(
				compute_layout(&tree, mode, CENTER),
				compute_layout(&tree, mode, CENTER)
			);
		}
	}

	#[test]
	fn layout_does_not_touch_the_tree() {
		let tree = sample();
		let before = tree.clone();
		for mode in LayoutMode::ALL {
			let _ = compute_layout(&tree, mode, CENTER);
		}
		assert_eq!(tree, before);
	}

	#[test]
	fn flatten_is_preorder_and_complete() {
		let tree = sample();
		let ids: Vec<&str> = get_all_nodes(&tree).iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["root", "a", "a1", "a1x", "a2", "b", "c", "c1"]);
		let data = crate::components::lineage::types::LineageData::from_root(tree.clone());
		assert_eq!(ids.len(), data.total_nodes);
		let unique: std::collections::HashSet<_> = ids.iter().collect();
		assert_eq!(unique.len(), ids.len());
	}

	#[test]
	fn radial_places_root_at_center_and_children_on_a_ring() {
		let tree = node(
			"root",
			AssetType::Original,
			vec![leaf("e"), leaf("s"), leaf("w"), leaf("n")],
		);
		let layout = compute_layout(&tree, LayoutMode::Radial, CENTER);
		let root = layout.position("root").unwrap();
		assert_eq!(layout.card_rect("root").unwrap().center(), CENTER);

		let radius = RADIAL_RING_STEP + RADIAL_BASE_RADIUS;
		let east = layout.position("e").unwrap();
		assert!((east.x - (root.x + radius)).abs() < 1e-9);
		assert!((east.y - root.y).abs() < 1e-9);
		let south = layout.position("s").unwrap();
		assert!((south.x - root.x).abs() < 1e-9);
		assert!((south.y - (root.y + radius)).abs() < 1e-9);
	}

	#[test]
	fn radial_rings_grow_with_depth() {
		let tree = node(
			"root",
			AssetType::Original,
			vec![node("a", AssetType::Version, vec![leaf("b")])],
		);
		let layout = compute_layout(&tree, LayoutMode::Radial, CENTER);
		let (a, b) = (layout.position("a").unwrap(), layout.position("b").unwrap());
		assert!((b.x - a.x - (2.0 * RADIAL_RING_STEP + RADIAL_BASE_RADIUS)).abs() < 1e-9);
	}

	#[test]
	fn timeline_interleaves_in_traversal_order() {
		let layout = compute_layout(&sample(), LayoutMode::Timeline, CENTER);
		let order = ["root", "a", "a1", "a1x", "a2", "b", "c", "c1"];
		for (i, id) in order.iter().enumerate() {
			assert_eq!(layout.position(id).unwrap().x, MARGIN + i as f64 * COLUMN);
		}
		assert_eq!(layout.position("a1x").unwrap().y, MARGIN + 3.0 * ROW);
		assert_eq!(layout.position("b").unwrap().y, MARGIN + ROW);
	}

	#[test]
	fn every_mode_places_every_node() {
		let tree = sample();
		for mode in LayoutMode::ALL {
			let layout = compute_layout(&tree, mode, CENTER);
			assert_eq!(layout.len(), 8);
			assert_eq!(layout.mode, mode);
		}
	}

	#[test]
	fn subtree_sizes_count_descendants() {
		let tree = sample();
		let sizes = subtree_sizes(&tree);
		assert_eq!(sizes["root"], 8);
		assert_eq!(sizes["a"], 4);
		assert_eq!(sizes["b"], 1);
	}

	#[test]
	fn depths_start_at_zero() {
		let tree = sample();
		let depths = node_depths(&tree);
		assert_eq!(depths["root"], 0);
		assert_eq!(depths["a1x"], 3);
	}

	#[test]
	fn content_bounds_cover_all_cards() {
		let tree = node("root", AssetType::Original, vec![leaf("one"), leaf("two")]);
		let layout = compute_layout(&tree, LayoutMode::Tree, CENTER);
		let bounds = layout.content_bounds().unwrap();
		assert_eq!(bounds.x, MARGIN);
		assert_eq!(bounds.right(), MARGIN + COLUMN + NODE_WIDTH);
		assert_eq!(bounds.bottom(), MARGIN + ROW + NODE_HEIGHT);
	}

	#[test]
	fn mode_names_parse() {
		assert_eq!("Radial".parse::<LayoutMode>(), Ok(LayoutMode::Radial));
		assert_eq!(LayoutMode::Timeline.to_string(), "timeline");
		assert_eq!(
			"spiral".parse::<LayoutMode>(),
			Err(LineageError::UnknownLayoutMode("spiral".into()))
		);
	}
}
