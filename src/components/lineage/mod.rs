//! Lineage viewer: layout, viewport, canvas rendering and the Leptos component.

mod component;
pub mod layout;
pub mod minimap;
pub mod render;
mod state;
mod types;
pub mod viewport;

pub use component::LineageViewer;
pub use layout::{LayoutMode, LineageLayout, compute_layout, get_all_nodes, subtree_sizes};
pub use render::CardAction;
pub use state::LineageViewState;
pub use types::{AssetNode, AssetStatus, AssetType, LineageData, NodeMetadata, Position, Rect};
pub use viewport::{PanGesture, Viewport};
