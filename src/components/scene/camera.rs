use std::f64::consts::FRAC_PI_2;

use crate::layout::Vec3;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;
const PITCH_LIMIT: f64 = FRAC_PI_2 - 0.05;
/// Distance from the eye to the orbit center, in scene units.
const EYE_DISTANCE: f64 = 40.0;
/// Scene units visible across the shorter canvas side at zoom 1.
const VIEW_SPAN: f64 = 30.0;

/// A point after projection onto the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	/// Larger is further from the viewer.
	pub depth: f64,
	/// Perspective size multiplier.
	pub scale: f64,
}

/// Orbit camera around a movable target point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub yaw: f64,
	pub pitch: f64,
	pub zoom: f64,
	/// Scene point drawn at the canvas center.
	pub target: Vec3,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			yaw: -0.6,
			pitch: 0.35,
			zoom: 1.0,
			target: Vec3::ZERO,
		}
	}
}

impl Camera {
	pub fn orbit(&mut self, yaw: f64, pitch: f64) {
		self.yaw = yaw;
		self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
	}

	pub fn zoom_by(&mut self, factor: f64) {
		self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
	}

	/// Rotates `p` into view space: x right, y up, z towards the viewer.
	fn view(&self, p: Vec3) -> Vec3 {
		let p = p - self.target;
		let (sy, cy) = self.yaw.sin_cos();
		let (sp, cp) = self.pitch.sin_cos();
		let x = p.x * cy - p.z * sy;
		let z = p.x * sy + p.z * cy;
		Vec3::new(x, p.y * cp - z * sp, p.y * sp + z * cp)
	}

	pub fn project(&self, p: Vec3, width: f64, height: f64) -> Projected {
		let v = self.view(p);
		let depth = -v.z;
		let scale = EYE_DISTANCE / (EYE_DISTANCE + depth).max(1.0);
		let unit = width.min(height) / VIEW_SPAN * self.zoom * scale;
		Projected {
			x: width / 2.0 + v.x * unit,
			y: height / 2.0 - v.y * unit,
			depth,
			scale,
		}
	}
}
