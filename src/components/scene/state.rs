use std::collections::HashSet;

use super::build::SceneModel;
use super::camera::{Camera, Projected};
use super::types::Scene;
use crate::layout::{ForceLayout, Vec3};

pub const HIT_RADIUS: f64 = 10.0;
/// Pointer travel, in pixels, beyond which a press is a drag and not a click.
const CLICK_SLOP: f64 = 4.0;
/// Fraction of the remaining distance to the focus covered per second.
const FOCUS_SPEED: f64 = 4.0;
/// Radians of yaw per pixel dragged.
const ORBIT_SPEED: f64 = 0.01;
/// Radians per second while idle.
const AUTO_ROTATE: f64 = 0.12;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub yaw_start: f64,
	pub pitch_start: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub point: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_point: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

/// Everything the canvas needs between frames. Rebuilt from scratch whenever
/// the chart changes.
pub struct SceneState {
	pub scene: Scene,
	engine: Option<ForceLayout>,
	pub camera: Camera,
	pub drag: DragState,
	pub hover: HoverState,
	/// Clicked point the camera centers on.
	pub selected: Option<usize>,
	selected_neighbors: HashSet<usize>,
	pub width: f64,
	pub height: f64,
	pub auto_rotate: bool,
}

impl SceneState {
	pub fn new(model: SceneModel, width: f64, height: f64) -> Self {
		Self {
			scene: model.scene,
			engine: model.engine,
			camera: Camera::default(),
			drag: DragState::default(),
			hover: HoverState::default(),
			selected: None,
			selected_neighbors: HashSet::new(),
			width,
			height,
			auto_rotate: true,
		}
	}

	pub fn engine(&self) -> Option<&ForceLayout> {
		self.engine.as_ref()
	}

	pub fn project_all(&self) -> Vec<Projected> {
		self.scene
			.points
			.iter()
			.map(|p| self.camera.project(p.position, self.width, self.height))
			.collect()
	}

	/// Front-most visible point under the cursor.
	pub fn point_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		self.scene
			.points
			.iter()
			.zip(self.project_all())
			.enumerate()
			.filter(|(_, (point, p))| {
				let reach = HIT_RADIUS.max(point.radius * p.scale);
				point.radius > 0.0 && (p.x - sx).hypot(p.y - sy) < reach
			})
			.min_by(|(_, (_, a)), (_, (_, b))| a.depth.total_cmp(&b.depth))
			.map(|(i, _)| i)
	}

	pub fn set_hover(&mut self, point: Option<usize>) {
		if self.hover.point == point {
			return;
		}
		let was_hovering = self.hover.point.is_some();

		// keep the old highlight around while it fades out
		if was_hovering && point.is_none() {
			self.hover.prev_point = self.hover.point.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_point = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.point = point;
		self.hover.neighbors.clear();
		if let Some(idx) = point {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			self.hover.neighbors.extend(self.scene.neighbors(idx));
		}
	}

	/// Selects `point`, or clears the selection for `None`.
	pub fn select(&mut self, point: Option<usize>) {
		self.selected = point.filter(|&i| i < self.scene.points.len());
		self.selected_neighbors.clear();
		if let Some(idx) = self.selected {
			self.selected_neighbors.extend(self.scene.neighbors(idx));
		}
	}

	/// Toggles the point under the cursor; a click on empty space clears the
	/// selection. The click that ends an orbit drag is ignored.
	pub fn click(&mut self, x: f64, y: f64) {
		if self.drag.moved {
			return;
		}
		let hit = self.point_at_position(x, y);
		self.select(if hit == self.selected { None } else { hit });
	}

	/// Back to the initial camera, with nothing selected.
	pub fn reset_view(&mut self) {
		self.select(None);
		self.camera = Camera::default();
		self.auto_rotate = true;
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.is_hovered(idx)
			|| self.is_selected(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_neighbors.contains(&idx)
			|| self.selected_neighbors.contains(&idx)
	}

	pub fn is_selected(&self, idx: usize) -> bool {
		self.selected == Some(idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.point == Some(idx) || self.hover.prev_point == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.point.is_some() || self.hover.prev_point.is_some() || self.selected.is_some()
	}

	pub fn begin_orbit(&mut self, x: f64, y: f64) {
		self.drag = DragState {
			active: true,
			start_x: x,
			start_y: y,
			yaw_start: self.camera.yaw,
			pitch_start: self.camera.pitch,
			moved: false,
		};
		self.auto_rotate = false;
	}

	pub fn orbit_to(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			return;
		}
		if (x - self.drag.start_x).hypot(y - self.drag.start_y) > CLICK_SLOP {
			self.drag.moved = true;
		}
		self.camera.orbit(
			self.drag.yaw_start + (x - self.drag.start_x) * ORBIT_SPEED,
			self.drag.pitch_start + (y - self.drag.start_y) * ORBIT_SPEED,
		);
	}

	pub fn end_orbit(&mut self) {
		self.drag.active = false;
	}

	/// One frame: at most one layout step, then camera, focus and hover easing.
	pub fn tick(&mut self, dt: f64) {
		if let Some(engine) = &mut self.engine {
			if engine.step() {
				for (point, node) in self.scene.points.iter_mut().zip(engine.nodes()) {
					point.position = node.position;
				}
			}
		}

		if self.auto_rotate && !self.drag.active && self.hover.point.is_none() {
			self.camera.yaw += AUTO_ROTATE * dt;
		}

		let focus = self
			.selected
			.and_then(|i| self.scene.points.get(i))
			.map_or(Vec3::ZERO, |p| p.position);
		self.camera.target += (focus - self.camera.target) * (FOCUS_SPEED * dt).min(1.0);

		let active = self.hover.point.is_some() || self.selected.is_some();
		let (target, delay, speed) = if active {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};
		if active {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_point = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
