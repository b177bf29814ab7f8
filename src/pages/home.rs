use chrono::{DateTime, Utc};
use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use log::{info, warn};

use crate::api::fetch_lineage;
use crate::components::lineage::{
	AssetNode, AssetStatus, AssetType, LineageData, LineageViewer, NodeMetadata,
};
use crate::config::ViewerConfig;

/// 2024-05-01T10:00:00Z
const DEMO_EPOCH: i64 = 1_714_557_600;

fn created(hours: i64) -> DateTime<Utc> {
	DateTime::from_timestamp(DEMO_EPOCH + hours * 3600, 0).unwrap_or_default()
}

/// Demo node builder.
struct Revision(AssetNode);

impl Revision {
	fn new(id: &str, kind: AssetType, title: &str, hours: i64, status: AssetStatus) -> Self {
		Self(AssetNode {
			id: id.to_string(),
			kind,
			title: title.to_string(),
			thumbnail_url: None,
			metadata: NodeMetadata {
				created_at: created(hours),
				prompt: None,
				changes: None,
				status: Some(status),
			},
			parent_id: None,
			children: Vec::new(),
		})
	}

	fn prompt(mut self, prompt: &str) -> Self {
		self.0.metadata.prompt = Some(prompt.to_string());
		self
	}

	fn changes(mut self, changes: &str) -> Self {
		self.0.metadata.changes = Some(changes.to_string());
		self
	}

	fn child(mut self, child: Revision) -> Self {
		let mut child = child.0;
		child.parent_id = Some(self.0.id.clone());
		self.0.children.push(child);
		self
	}

	fn build(self) -> AssetNode {
		self.0
	}
}

/// Built-in lineage shown when no `?src=` is given.
fn demo_lineage() -> LineageData {
	use AssetStatus::*;
	use AssetType::*;

	let cleaned = Revision::new("char-ada-v2-night-r1", Refinement, "Night, cleaned", 20, Rejected)
		.changes("reduced noise in shadows");
	let night = Revision::new("char-ada-v2-night", Variant, "Ada v2, night palette", 12, Pending)
		.prompt("same pose, moonlit blue grade")
		.child(cleaned);
	let v2 = Revision::new("char-ada-v2", Version, "Ada v2", 5, Approved)
		.changes("sharper jawline, jacket patches")
		.child(
			Revision::new("char-ada-v2-r1", Refinement, "Ada v2 retouch", 9, Pending)
				.changes("fixed hand anatomy"),
		)
		.child(night);
	let hangar = Revision::new("char-ada-hangar", Composite, "Ada in the hangar", 30, Pending)
		.prompt("character composited over hangar plate")
		.child(
			Revision::new("char-ada-hangar-v2", Version, "Hangar composite v2", 34, Approved)
				.changes("matched grain and lens distortion"),
		);

	let root = Revision::new("char-ada", Original, "Ada, lead character", 0, Approved)
		.prompt("young engineer, weathered flight jacket, soft rim light")
		.child(v2)
		.child(
			Revision::new("char-ada-sketch", Variant, "Ada, storyboard sketch", 3, Archived)
				.prompt("pencil sketch, loose lines"),
		)
		.child(hangar)
		.build();
	LineageData::from_root(root)
}

/// `?src=` wins over the configured source; `None` means the demo lineage.
fn pick_source(query: Option<String>, configured: Option<&str>) -> Option<String> {
	query
		.filter(|src| !src.trim().is_empty())
		.or_else(|| configured.map(str::to_string))
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<ViewerConfig>().unwrap_or_default();
	let query = use_query_map();
	let configured = config.source_url.clone();
	let lineage = LocalResource::new(move || {
		let source = pick_source(query.with(|q| q.get("src")), configured.as_deref());
		async move {
			match source {
				Some(src) => fetch_lineage(&src).await,
				None => Ok(demo_lineage()),
			}
		}
	});
	let data = Signal::derive(move || lineage.get().and_then(Result::ok));
	let loading = move || lineage.get().is_none();
	let last_action = RwSignal::new(String::new());

	let report = move |verb: &'static str| {
		move |node: AssetNode| {
			info!("{verb} {}", node.id);
			last_action.set(format!("{verb}: {}", node.title));
		}
	};

	view! {
		<div class="fullscreen-lineage">
			<LineageViewer
				data=data
				config=config
				fullscreen=true
				on_node_select=report("Selected")
				on_node_view=report("Viewing")
				on_node_duplicate=report("Duplicate requested")
				on_node_approve=report("Approval requested")
				on_node_delete=report("Delete requested")
				on_node_download=move |node: AssetNode| {
					match node.thumbnail_url.as_deref().zip(web_sys::window()) {
						Some((url, window)) => {
							if let Err(err) = window.open_with_url_and_target(url, "_blank") {
								warn!("could not open {url}: {err:?}");
							}
						}
						None => warn!("{} has no downloadable preview", node.id),
					}
					last_action.set(format!("Download: {}", node.title));
				}
			/>
			<div class="graph-overlay">
				<h1>"Asset Lineage"</h1>
				<p class="subtitle">
					"Click a card to select it. Scroll to zoom. Drag the background to pan."
				</p>
				<Show when=loading>
					<p class="lineage-loading">"Loading lineage…"</p>
				</Show>
				<p class="lineage-status">{move || last_action.get()}</p>
				<ErrorBoundary fallback=|errors| {
					view! {
						<h2>"Uh oh! Something went wrong!"</h2>

						<p>"Errors: "</p>
						<ul>
							{move || {
								errors
									.get()
									.into_iter()
									.map(|(_, e)| view! { <li>{e.to_string()}</li> })
									.collect_view()
							}}
						</ul>
					}
				}>{move || lineage.get().map(|result| result.map(|_| ()))}</ErrorBoundary>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::lineage::get_all_nodes;

	#[test]
	fn query_source_overrides_configured_one() {
		assert_eq!(
			pick_source(Some("/api/lineage/9".into()), Some("/api/lineage/1")).as_deref(),
			Some("/api/lineage/9")
		);
		assert_eq!(
			pick_source(None, Some("/api/lineage/1")).as_deref(),
			Some("/api/lineage/1")
		);
		assert_eq!(
			pick_source(Some(" ".into()), Some("/api/lineage/1")).as_deref(),
			Some("/api/lineage/1")
		);
		assert_eq!(pick_source(None, None), None);
	}

	#[test]
	fn demo_lineage_is_consistent() {
		let data = demo_lineage();
		assert!(data.validate().is_ok());
		assert_eq!(get_all_nodes(&data.root_node).len(), data.total_nodes);
		assert_eq!(data.total_nodes, 8);
		assert_eq!(data.max_depth, 3);
	}

	#[test]
	fn revision_builder_links_children_to_parent() {
		let node = Revision::new("a", AssetType::Original, "A", 0, AssetStatus::Approved)
			.changes("tweak")
			.child(Revision::new("b", AssetType::Version, "B", 1, AssetStatus::Pending))
			.build();
		assert_eq!(node.metadata.changes.as_deref(), Some("tweak"));
		assert_eq!(node.metadata.prompt, None);
		assert_eq!(node.children.len(), 1);
		assert_eq!(node.children[0].parent_id.as_deref(), Some("a"));
	}
}
