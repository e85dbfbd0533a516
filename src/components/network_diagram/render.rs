use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::DiagramState;

const BASE_EDGE: &str = "100, 180, 255";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.highlight_t);

	state.graph.visit_edges(|n1, n2, _| {
		let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}
		let style = state.link_style(n1.index(), n2.index());
		let (r1, r2) = (n1.data.user_data.radius(), n2.data.user_data.radius());

		// Highlighted edges take their path color and thicken; the rest fade
		// back as the highlight eases in.
		let (stroke, width) = match style.highlight {
			Some(class) if state.has_highlight => (
				state.highlight_color(class).to_owned(),
				line_width * (1.0 + 1.0 * t),
			),
			_ => (
				format!("rgba({BASE_EDGE}, {})", 0.6 - 0.45 * t),
				line_width * (1.0 - 0.3 * t),
			),
		};

		ctx.set_stroke_style_str(&stroke);
		ctx.set_line_width(width);
		if style.bypass {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		}

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + arrow_size), y2 - uy * (r2 + arrow_size));
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&stroke);
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	});
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let (t, k) = (ease_out_cubic(state.highlight_t), state.transform.k);
	let font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let base = info.radius();
		let on_path = info.selected || info.highlight.is_some();
		let dimmed = state.has_highlight && !on_path;
		let (alpha, radius) = if dimmed {
			(1.0 - 0.7 * t, base * (1.0 - 0.15 * t))
		} else if info.selected {
			(1.0, base * (1.0 + 0.35 * t))
		} else {
			(1.0, base)
		};

		if info.selected && t > 0.01 {
			let glow_radius = base * (1.8 + 1.2 * t);
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) {
				let glow = 0.35 * t;
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {glow})"));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", glow * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&info.color);
		ctx.fill();

		let ring = match info.highlight {
			Some(class) if state.has_highlight => Some(state.highlight_color(class)),
			_ if state.hovered == Some(node.index()) => Some("rgba(255, 255, 255, 0.7)"),
			_ => None,
		};
		if let Some(ring) = ring {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(ring);
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}
		ctx.set_global_alpha(1.0);

		let label_alpha = if dimmed { alpha * 0.8 } else { 1.0 };
		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {label_alpha})"));
		ctx.set_font(&font);
		let _ = ctx.fill_text(&info.label, x + radius + 3.0, y + 3.0);
	});
}
