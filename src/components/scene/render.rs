use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::camera::Projected;
use super::state::SceneState;

const BACKGROUND: &str = "#1a1a2e";
const FONT: &str = "12px sans-serif";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Indices sorted far to near, for painter's ordering.
fn back_to_front(depths: impl Iterator<Item = f64>) -> Vec<usize> {
	let depths: Vec<f64> = depths.collect();
	let mut order: Vec<usize> = (0..depths.len()).collect();
	order.sort_by(|&a, &b| depths[b].total_cmp(&depths[a]));
	order
}

pub fn render(state: &SceneState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	let projected = state.project_all();
	draw_segments(state, ctx, &projected);
	draw_points(state, ctx, &projected);
	draw_tooltip(state, ctx, &projected);
	draw_status(state, ctx);
}

fn draw_status(state: &SceneState, ctx: &CanvasRenderingContext2d) {
	let Some(engine) = state.engine().filter(|e| !e.is_done()) else {
		return;
	};
	ctx.set_font(FONT);
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.6)");
	let _ = ctx.fill_text(
		&format!("layout step {}", engine.steps()),
		12.0,
		state.height - 12.0,
	);
}

fn draw_segments(state: &SceneState, ctx: &CanvasRenderingContext2d, projected: &[Projected]) {
	let segments = &state.scene.segments;
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();
	ctx.set_line_cap("round");

	for i in back_to_front(
		segments
			.iter()
			.map(|s| (projected[s.from].depth + projected[s.to].depth) / 2.0),
	) {
		let segment = &segments[i];
		let (a, b) = (projected[segment.from], projected[segment.to]);
		let lit = state.is_highlighted(segment.from) && state.is_highlighted(segment.to);
		let alpha = match (has_highlight, lit) {
			(true, true) => (segment.alpha * (1.0 + 0.5 * t)).min(1.0),
			(true, false) => segment.alpha * (1.0 - 0.75 * t),
			(false, _) => segment.alpha,
		};
		ctx.set_stroke_style_str(&segment.color.css(alpha));
		ctx.set_line_width(segment.width * (a.scale + b.scale) / 2.0 * state.camera.zoom.sqrt());
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}
}

fn draw_points(state: &SceneState, ctx: &CanvasRenderingContext2d, projected: &[Projected]) {
	let points = &state.scene.points;
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();
	ctx.set_font(FONT);

	for i in back_to_front(projected.iter().map(|p| p.depth)) {
		let point = &points[i];
		if point.radius <= 0.0 {
			continue;
		}
		let p = projected[i];
		let radius = point.radius * p.scale * state.camera.zoom.sqrt();
		let lit = state.is_highlighted(i);
		let alpha = if has_highlight && !lit { 1.0 - 0.7 * t } else { 1.0 };

		if state.is_hovered(i) && t > 0.01 {
			let glow = radius * (1.8 + 1.2 * t);
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, glow, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", 0.2 * t));
			ctx.fill();
		}

		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&point.color.css(alpha));
		ctx.fill();

		if state.is_selected(i) {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, radius + 4.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.9)");
			ctx.set_line_width(2.0);
			ctx.stroke();
		}

		if state.scene.show_labels {
			if let Some(label) = &point.label {
				ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.8));
				let _ = ctx.fill_text(label, p.x + radius + 3.0, p.y + 4.0);
			}
		}
	}
}

fn draw_tooltip(state: &SceneState, ctx: &CanvasRenderingContext2d, projected: &[Projected]) {
	let Some(idx) = state.hover.point.or(state.selected) else {
		return;
	};
	let point = &state.scene.points[idx];
	let lines: Vec<&str> = point
		.label
		.iter()
		.chain(point.detail.iter())
		.map(String::as_str)
		.collect();
	if lines.is_empty() {
		return;
	}

	ctx.set_font(FONT);
	let width = lines
		.iter()
		.filter_map(|l| ctx.measure_text(l).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max);
	let (pad, line_height) = (6.0, 16.0);
	let (box_w, box_h) = (width + pad * 2.0, lines.len() as f64 * line_height + pad);
	let p = projected[idx];
	let x = (p.x + 12.0).min(state.width - box_w - 4.0).max(4.0);
	let y = (p.y - box_h - 8.0).max(4.0);

	ctx.set_fill_style_str("rgba(10, 12, 24, 0.85)");
	ctx.fill_rect(x, y, box_w, box_h);
	ctx.set_stroke_style_str("rgba(100, 180, 255, 0.6)");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(x, y, box_w, box_h);
	ctx.set_fill_style_str("white");
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x + pad, y + pad + 10.0 + i as f64 * line_height);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn far_things_draw_first() {
		assert_eq!(back_to_front([1.0, 3.0, -2.0].into_iter()), vec![1, 0, 2]);
	}

	#[test]
	fn easing_hits_the_ends() {
		assert_eq!(ease_out_cubic(0.0), 0.0);
		assert_eq!(ease_out_cubic(1.0), 1.0);
	}
}
