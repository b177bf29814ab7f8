use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::layout::{LayoutMode, node_depths};
use super::render::{self, CardAction, ImageCache};
use super::state::LineageViewState;
use super::types::{AssetNode, LineageData, Position};
use crate::config::ViewerConfig;

/// Host notifications. None of them feed back into viewer state; the host is
/// expected to hand over a fresh [`LineageData`] when something changed.
#[derive(Clone, Copy, Default)]
struct NodeCallbacks {
	select: Option<Callback<AssetNode>>,
	view: Option<Callback<AssetNode>>,
	download: Option<Callback<AssetNode>>,
	delete: Option<Callback<AssetNode>>,
	duplicate: Option<Callback<AssetNode>>,
	approve: Option<Callback<AssetNode>>,
}

impl NodeCallbacks {
	/// Runs the host callback for `action`. Delete asks `confirm` first, and only
	/// when the host actually handles deletes. Returns whether a callback ran.
	fn dispatch(
		&self,
		action: CardAction,
		node: AssetNode,
		confirm: impl FnOnce(&AssetNode) -> bool,
	) -> bool {
		let callback = match action {
			CardAction::View => self.view,
			CardAction::Download => self.download,
			CardAction::Duplicate => self.duplicate,
			CardAction::Approve => self.approve,
			CardAction::Delete => self.delete,
		};
		let Some(callback) = callback else {
			debug!("no handler for {} on {}", action.label(), node.id);
			return false;
		};
		if action == CardAction::Delete && !confirm(&node) {
			info!("delete of {} cancelled", node.id);
			return false;
		}
		debug!("{} requested for {}", action.label(), node.id);
		callback.run(node);
		true
	}
}

fn confirm_delete(node: &AssetNode) -> bool {
	let Some(window) = web_sys::window() else {
		return false;
	};
	match window.confirm_with_message(&format!(
		"Delete \"{}\"? This cannot be undone.",
		node.title
	)) {
		Ok(answer) => answer,
		Err(err) => {
			warn!("confirm dialog failed, not deleting {}: {err:?}", node.id);
			false
		}
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_size(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
	fallback: (f64, f64),
) -> (f64, f64) {
	if fullscreen {
		if let Some(size) = window_size(window) {
			return size;
		}
	}
	let parent = |measure: fn(&web_sys::Element) -> i32| {
		canvas
			.parent_element()
			.map(|p| measure(&p) as f64)
			.filter(|v| *v > 0.0)
	};
	(
		width
			.or_else(|| parent(web_sys::Element::client_width))
			.unwrap_or(fallback.0),
		height
			.or_else(|| parent(web_sys::Element::client_height))
			.unwrap_or(fallback.1),
	)
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Position> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Position::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn set_cursor(canvas_ref: NodeRef<leptos::html::Canvas>, cursor: &str) {
	if let Some(canvas) = canvas_ref.get_untracked() {
		let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
	}
}

enum Click {
	Action(CardAction, AssetNode),
	Select(AssetNode),
	Background,
}

/// Interactive lineage tree on a canvas, with toolbar, detail panel and minimap.
///
/// `data = None` shows a "no data" placeholder. Rendering runs on animation
/// frames; input only mutates state, so a drag repaints at most once per frame.
#[component]
pub fn LineageViewer(
	/// Lineage to show; `None` renders the placeholder.
	#[prop(into)] data: Signal<Option<LineageData>>,
	/// Size the canvas to the window and follow its resizes.
	#[prop(default = false)] fullscreen: bool,
	/// Fixed canvas width; defaults to the parent width.
	#[prop(default = None)] width: Option<f64>,
	/// Fixed canvas height; defaults to the parent height.
	#[prop(default = None)] height: Option<f64>,
	/// Sizes, anchors and source; defaults to [`ViewerConfig::default`].
	#[prop(optional)] config: Option<ViewerConfig>,
	/// Layout mode on first render.
	#[prop(default = LayoutMode::Tree)] initial_layout: LayoutMode,
	/// Whether the overview starts visible.
	#[prop(default = true)] show_minimap: bool,
	/// Called when a card is clicked.
	#[prop(optional, into)] on_node_select: Option<Callback<AssetNode>>,
	/// Called by the view action.
	#[prop(optional, into)] on_node_view: Option<Callback<AssetNode>>,
	/// Called by the download action.
	#[prop(optional, into)] on_node_download: Option<Callback<AssetNode>>,
	/// Called by the delete action once the user confirms.
	#[prop(optional, into)] on_node_delete: Option<Callback<AssetNode>>,
	/// Called by the duplicate action.
	#[prop(optional, into)] on_node_duplicate: Option<Callback<AssetNode>>,
	/// Called by the approve action.
	#[prop(optional, into)] on_node_approve: Option<Callback<AssetNode>>,
) -> impl IntoView {
	let config = config.unwrap_or_default();
	let callbacks = NodeCallbacks {
		select: on_node_select,
		view: on_node_view,
		download: on_node_download,
		delete: on_node_delete,
		duplicate: on_node_duplicate,
		approve: on_node_approve,
	};
	let fallback = (config.canvas_width, config.canvas_height);

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state = Rc::new(RefCell::new(LineageViewState::new(
		config,
		initial_layout,
		fallback.0,
		fallback.1,
	)));
	state.borrow_mut().minimap_visible = show_minimap;
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	let mode = RwSignal::new(initial_layout);
	let zoom = RwSignal::new(1.0_f64);
	let minimap_on = RwSignal::new(show_minimap);
	let selected = RwSignal::new(None::<AssetNode>);

	let state_data = state.clone();
	Effect::new(move |_| {
		let next = data.get();
		let mut s = state_data.borrow_mut();
		s.set_data(next);
		selected.set(s.selected_node().cloned());
	});

	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if animate_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("no window; lineage viewer stays idle");
			return;
		};

		let (w, h) = canvas_size(&window, &canvas, fullscreen, width, height, fallback);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|obj| obj.dyn_into::<CanvasRenderingContext2d>().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("2d canvas context unavailable; lineage viewer stays idle");
				return;
			}
		};
		state_init.borrow_mut().resize(w, h);
		debug!("lineage canvas ready at {w}x{h}");

		if fullscreen {
			let (state_resize, canvas_resize, resize_inner) = (
				Rc::downgrade(&state_init),
				canvas.clone(),
				resize_cb_init.clone(),
			);
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				if !canvas_resize.is_connected() {
					if let Some(cb) = resize_inner.borrow().as_ref() {
						let _ = win.remove_event_listener_with_callback(
							"resize",
							cb.as_ref().unchecked_ref(),
						);
					}
					debug!("lineage canvas detached, resize listener removed");
					return;
				}
				let (Some((nw, nh)), Some(state)) = (window_size(&win), state_resize.upgrade())
				else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				state.borrow_mut().resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, canvas_anim) =
			(state_init.clone(), animate_init.clone(), canvas.clone());
		let mut images = ImageCache::default();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !canvas_anim.is_connected() {
				debug!("lineage canvas detached, render loop stopped");
				return;
			}
			if let Ok(s) = state_anim.try_borrow() {
				render::render(&s, &ctx, &mut images);
				if (s.viewport.zoom - zoom.get_untracked()).abs() > f64::EPSILON {
					zoom.set(s.viewport.zoom);
				}
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut s = state_md.borrow_mut();
		s.pan.clear();
		if s.minimap_navigate(p) || s.action_at(p).is_some() || s.node_at(p).is_some() {
			return;
		}
		s.begin_pan(p);
		set_cursor(canvas_ref, "grabbing");
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut s = state_mm.borrow_mut();
		if s.drag_to(p) {
			return;
		}
		let hovered = s.node_at(p).map(|n| n.id.clone());
		let action = s.action_at(p).map(|(n, a)| (n.id.clone(), a));
		let cursor = if action.is_some() || hovered.is_some() {
			"pointer"
		} else {
			"grab"
		};
		s.set_hover(hovered.as_deref());
		s.set_hovered_action(action);
		set_cursor(canvas_ref, cursor);
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		state_mu.borrow_mut().end_pan();
		set_cursor(canvas_ref, "grab");
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let mut s = state_ml.borrow_mut();
		s.end_pan();
		s.set_hover(None);
		s.set_hovered_action(None);
	};

	let state_ck = state.clone();
	let on_click = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		let click = {
			let mut s = state_ck.borrow_mut();
			if s.pan.moved() || s.minimap().is_some_and(|m| m.frame.contains(p)) {
				return;
			}
			let action = s.action_at(p).map(|(n, a)| (a, n.clone()));
			let target = s.node_at(p).cloned();
			match (action, target) {
				(Some((action, node)), _) => Click::Action(action, node),
				(None, Some(node)) => {
					s.select(&node.id);
					selected.set(Some(node.clone()));
					Click::Select(node)
				}
				(None, None) => {
					if s.clear_selection() {
						selected.set(None);
					}
					Click::Background
				}
			}
		};
		// state is released before host code runs
		match click {
			Click::Action(action, node) => {
				callbacks.dispatch(action, node, confirm_delete);
			}
			Click::Select(node) => {
				if let Some(cb) = callbacks.select {
					cb.run(node);
				}
			}
			Click::Background => {}
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		state_wh.borrow_mut().viewport.wheel(ev.delta_y());
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		let mut s = state_kd.borrow_mut();
		match ev.key().as_str() {
			"Escape" => {
				if s.clear_selection() {
					selected.set(None);
				}
			}
			"+" | "=" => s.viewport.zoom_in(),
			"-" => s.viewport.zoom_out(),
			"0" => s.viewport.reset(),
			"f" => s.fit_to_content(),
			_ => return,
		}
		ev.prevent_default();
	};

	let state_mode = state.clone();
	let on_mode_change = move |ev: leptos::ev::Event| {
		match event_target_value(&ev).parse::<LayoutMode>() {
			Ok(next) => {
				state_mode.borrow_mut().set_layout_mode(next);
				mode.set(next);
			}
			Err(err) => warn!("{err}; keeping {} layout", mode.get_untracked()),
		}
	};

	let state_zin = state.clone();
	let zoom_in = move |_: MouseEvent| state_zin.borrow_mut().viewport.zoom_in();
	let state_zout = state.clone();
	let zoom_out = move |_: MouseEvent| state_zout.borrow_mut().viewport.zoom_out();
	let state_reset = state.clone();
	let reset_view = move |_: MouseEvent| state_reset.borrow_mut().viewport.reset();
	let state_fit = state.clone();
	let fit_view = move |_: MouseEvent| state_fit.borrow_mut().fit_to_content();
	let state_mini = state.clone();
	let toggle_minimap = move |_: MouseEvent| {
		let visible = !minimap_on.get_untracked();
		state_mini.borrow_mut().minimap_visible = visible;
		minimap_on.set(visible);
	};

	let has_data = move || data.with(Option::is_some);
	let summary = move || {
		data.with(|d| {
			d.as_ref()
				.map(|d| (d.total_nodes, d.total_branches, d.max_depth))
		})
	};

	let details = move || {
		selected.get().map(|node| {
			let depth = data.with(|d| {
				d.as_ref()
					.and_then(|d| node_depths(&d.root_node).get(node.id.as_str()).copied())
			});
			view! {
				<aside class="lineage-details">
					<h2>{node.title.clone()}</h2>
					<dl>
						<dt>"Type"</dt>
						<dd>{node.kind.label()}</dd>
						<dt>"Status"</dt>
						<dd>{node.status().map(|s| s.label()).unwrap_or("None")}</dd>
						<dt>"Created"</dt>
						<dd>{node.metadata.created_at.format("%Y-%m-%d %H:%M UTC").to_string()}</dd>
						<dt>"Depth"</dt>
						<dd>{depth.map(|d| d.to_string()).unwrap_or_default()}</dd>
						{node
							.metadata
							.prompt
							.clone()
							.map(|prompt| view! {
								<dt>"Prompt"</dt>
								<dd>{prompt}</dd>
							})}
						{node
							.metadata
							.changes
							.clone()
							.map(|changes| view! {
								<dt>"Changes"</dt>
								<dd>{changes}</dd>
							})}
					</dl>
				</aside>
			}
		})
	};

	let display = move || if has_data() { "flex" } else { "none" };

	view! {
		<div class="lineage-viewer">
			{move || {
				(!has_data())
					.then(|| {
						view! {
							<div class="lineage-empty">
								<p>"No lineage data"</p>
								<p class="subtitle">"Pick an asset to see its revision history."</p>
							</div>
						}
					})
			}}
			<header class="lineage-header" style:display=display>
				{move || {
					summary()
						.map(|(nodes, branches, depth)| {
							view! {
								<span>{format!("{nodes} nodes")}</span>
								<span>{format!("{branches} branches")}</span>
								<span>{format!("depth {depth}")}</span>
							}
						})
				}}
			</header>
			<div class="lineage-toolbar" style:display=display>
				<select on:change=on_mode_change prop:value=move || mode.get().as_str()>
					{LayoutMode::ALL
						.into_iter()
						.map(|m| {
							view! {
								<option value=m.as_str() selected=move || mode.get() == m>
									{m.label()}
								</option>
							}
						})
						.collect_view()}
				</select>
				<button title="Zoom out" on:click=zoom_out>"−"</button>
				<span class="lineage-zoom">{move || format!("{:.0}%", zoom.get() * 100.0)}</span>
				<button title="Zoom in" on:click=zoom_in>"+"</button>
				<button title="Reset view" on:click=reset_view>"Reset"</button>
				<button title="Fit to view" on:click=fit_view>"Fit"</button>
				<button
					title="Toggle minimap"
					class:active=move || minimap_on.get()
					on:click=toggle_minimap
				>
					"Minimap"
				</button>
			</div>
			{details}
			<canvas
				node_ref=canvas_ref
				class="lineage-canvas"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:click=on_click
				on:wheel=on_wheel
				on:keydown=on_keydown
				style:display=move || if has_data() { "block" } else { "none" }
			/>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::sync::{Arc, Mutex};

	use super::*;
	use crate::components::lineage::types::tests::leaf;

	fn recorder(log: &Arc<Mutex<Vec<String>>>, verb: &'static str) -> Callback<AssetNode> {
		let log = Arc::clone(log);
		Callback::new(move |node: AssetNode| {
			log.lock().unwrap().push(format!("{verb} {}", node.id));
		})
	}

	fn all_handlers(log: &Arc<Mutex<Vec<String>>>) -> NodeCallbacks {
		NodeCallbacks {
			select: Some(recorder(log, "select")),
			view: Some(recorder(log, "view")),
			download: Some(recorder(log, "download")),
			delete: Some(recorder(log, "delete")),
			duplicate: Some(recorder(log, "duplicate")),
			approve: Some(recorder(log, "approve")),
		}
	}

	#[test]
	fn cancelled_confirm_never_deletes() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let callbacks = all_handlers(&log);
		let asked = Cell::new(0);
		let ran = callbacks.dispatch(CardAction::Delete, leaf("x"), |_| {
			asked.set(asked.get() + 1);
			false
		});
		assert!(!ran);
		assert_eq!(asked.get(), 1);
		assert!(log.lock().unwrap().is_empty());
	}

	#[test]
	fn confirmed_delete_reaches_the_host() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let callbacks = all_handlers(&log);
		assert!(callbacks.dispatch(CardAction::Delete, leaf("x"), |node| node.id == "x"));
		assert_eq!(*log.lock().unwrap(), ["delete x"]);
	}

	#[test]
	fn other_actions_never_ask_for_confirmation() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let callbacks = all_handlers(&log);
		for action in [
			CardAction::View,
			CardAction::Download,
			CardAction::Duplicate,
			CardAction::Approve,
		] {
			let ran =
				callbacks.dispatch(action, leaf("n"), |_| panic!("confirm asked for {action:?}"));
			assert!(ran);
		}
		assert_eq!(
			*log.lock().unwrap(),
			["view n", "download n", "duplicate n", "approve n"]
		);
	}

	#[test]
	fn no_delete_handler_means_no_dialog() {
		let callbacks = NodeCallbacks::default();
		let ran = callbacks.dispatch(CardAction::Delete, leaf("x"), |_| {
			panic!("nothing would be deleted")
		});
		assert!(!ran);
	}
}
