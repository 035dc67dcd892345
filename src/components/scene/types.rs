use crate::layout::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub u32);

pub const PALETTE: &[Color] = &[
	Color(0x1f77b4),
	Color(0xff7f0e),
	Color(0x2ca02c),
	Color(0xd62728),
	Color(0x9467bd),
	Color(0x8c564b),
	Color(0xe377c2),
	Color(0x7f7f7f),
	Color(0xbcbd22),
	Color(0x17becf),
];

pub const AXIS: Color = Color(0x5a6b8c);

impl Color {
	pub fn palette(i: usize) -> Self {
		PALETTE[i % PALETTE.len()]
	}

	fn channels(self) -> (u32, u32, u32) {
		((self.0 >> 16) & 0xff, (self.0 >> 8) & 0xff, self.0 & 0xff)
	}

	/// Blue to red ramp for `t` in `[0, 1]`.
	pub fn ramp(t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let r = (40.0 + 215.0 * t) as u32;
		let g = (90.0 + 120.0 * (1.0 - (2.0 * t - 1.0).abs())) as u32;
		let b = (255.0 - 215.0 * t) as u32;
		Color((r << 16) | (g << 8) | b)
	}

	pub fn css(self, alpha: f64) -> String {
		let (r, g, b) = self.channels();
		format!("rgba({r}, {g}, {b}, {alpha})")
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScenePoint {
	pub position: Vec3,
	/// Screen radius in pixels at zoom 1; 0 hides the point.
	pub radius: f64,
	pub color: Color,
	pub label: Option<String>,
	/// Tooltip body.
	pub detail: Option<String>,
}

impl ScenePoint {
	pub fn new(position: Vec3, radius: f64, color: Color) -> Self {
		Self {
			position,
			radius,
			color,
			label: None,
			detail: None,
		}
	}

	/// An invisible anchor for segment ends.
	pub fn anchor(position: Vec3) -> Self {
		Self::new(position, 0.0, AXIS)
	}

	pub fn labelled(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn detailed(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
	pub from: usize,
	pub to: usize,
	pub color: Color,
	pub width: f64,
	pub alpha: f64,
}

/// Everything the renderer draws for one chart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub points: Vec<ScenePoint>,
	pub segments: Vec<Segment>,
	/// Draw labels next to every labelled point, not only the hovered one.
	pub show_labels: bool,
}

impl Scene {
	pub fn push(&mut self, point: ScenePoint) -> usize {
		self.points.push(point);
		self.points.len() - 1
	}

	pub fn connect(&mut self, from: usize, to: usize, color: Color, width: f64, alpha: f64) {
		self.segments.push(Segment {
			from,
			to,
			color,
			width,
			alpha,
		});
	}

	/// Indices linked to `idx` by a segment.
	pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
		self.segments.iter().filter_map(move |s| {
			if s.from == idx {
				Some(s.to)
			} else if s.to == idx {
				Some(s.from)
			} else {
				None
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_colors() {
		assert_eq!(Color(0x1f77b4).css(0.5), "rgba(31, 119, 180, 0.5)");
		assert_eq!(Color::palette(11), Color(0xff7f0e));
		assert_eq!(Color::ramp(0.0), Color((40 << 16) | (90 << 8) | 255));
	}
}
