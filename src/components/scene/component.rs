use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::build::{SceneModel, build};
use super::render;
use super::state::SceneState;
use crate::data::ChartData;
use crate::layout::{ForceLayoutOptions, TreeLayoutOptions};

const FRAME: f64 = 0.016;

fn canvas_size(canvas: &HtmlCanvasElement, fullscreen: bool) -> (f64, f64) {
	let window = web_sys::window();
	if fullscreen {
		if let Some(win) = window {
			let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
			if let (Some(w), Some(h)) = (dim(win.inner_width()), dim(win.inner_height())) {
				return (w, h);
			}
		}
	}
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or((800.0, 600.0))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn local_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Draws a prepared chart as an orbiting 3D scene. A network chart keeps
/// stepping its force layout one step per frame until the budget runs out.
/// Clicking a point focuses the camera on it; each change of `reset` puts the
/// camera back where it started.
#[component]
pub fn SceneCanvas(
	#[prop(into)] chart: Signal<Option<ChartData>>,
	#[prop(optional, into)] reset: Option<Signal<u32>>,
	#[prop(optional)] force: ForceLayoutOptions,
	#[prop(optional)] tree: TreeLayoutOptions,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<SceneState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) = (state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let chart = chart.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = canvas_size(&canvas, fullscreen);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		// the old scene, engine included, is dropped here
		let mut rng = SmallRng::seed_from_u64(js_sys::Date::now() as u64);
		let model = chart
			.map(|chart| {
				build(&chart, &force, &tree, &mut rng).unwrap_or_else(|e| {
					error!("cannot lay out chart: {e}");
					SceneModel::default()
				})
			})
			.unwrap_or_default();
		let camera = state_init.borrow().as_ref().map(|s| s.camera);
		let mut next = SceneState::new(model, w, h);
		if let Some(camera) = camera {
			next.camera = camera;
		}
		*state_init.borrow_mut() = Some(next);

		if animate_init.borrow().is_some() {
			return;
		}
		let Some(ctx) = context_2d(&canvas) else {
			error!("canvas has no 2d context");
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = canvas_size(&canvas_resize, fullscreen);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(FRAME);
				render::render(s, &ctx);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_reset = state.clone();
	Effect::new(move |_| {
		let Some(reset) = reset else {
			return;
		};
		if reset.get() == 0 {
			return;
		}
		if let Some(ref mut s) = *state_reset.borrow_mut() {
			s.reset_view();
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.begin_orbit(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.drag.active {
				s.orbit_to(x, y);
			} else {
				let hovered = s.point_at_position(x, y);
				s.set_hover(hovered);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.end_orbit();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.end_orbit();
			s.set_hover(None);
		}
	};

	let state_click = state.clone();
	let on_click = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_click.borrow_mut() {
			s.click(x, y);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.camera.zoom_by(if ev.delta_y() > 0.0 { 0.9 } else { 1.1 });
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="scene-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
