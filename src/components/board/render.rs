use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::geometry::{ARROW_SIZE, ConnectionGeometry, HANDLE_RADIUS, PathPiece, Point, Rect};
use super::types::CourseColor;
use crate::export::BoardSnapshot;

const LINE_COLOR: &str = "#94a3b8";
const SELECTED_COLOR: &str = "#6366f1";
const HANDLE_FILL: &str = "#ffffff";
const CARD_RADIUS: f64 = 8.0;
const FONT: &str = "Inter, system-ui, sans-serif";

/// Redraws the arrow overlay. Handles are only drawn in design mode.
pub fn render_overlay(
	ctx: &CanvasRenderingContext2d,
	width: f64,
	height: f64,
	geometries: &[ConnectionGeometry],
	selected: Option<&str>,
	design_mode: bool,
) {
	ctx.clear_rect(0.0, 0.0, width, height);
	// selected path last so it sits on top
	let (highlighted, rest): (Vec<_>, Vec<_>) = geometries
		.iter()
		.partition(|g| Some(g.connection_id.as_str()) == selected);
	for geometry in &rest {
		draw_connection(ctx, geometry, LINE_COLOR, 2.0);
	}
	for geometry in &highlighted {
		draw_connection(ctx, geometry, SELECTED_COLOR, 3.0);
	}
	if design_mode {
		for geometry in geometries {
			let is_selected = Some(geometry.connection_id.as_str()) == selected;
			for handle in &geometry.handles {
				draw_handle(ctx, *handle, is_selected);
			}
		}
	}
}

fn trace(ctx: &CanvasRenderingContext2d, piece: &PathPiece) {
	match *piece {
		PathPiece::Line(_, b) => ctx.line_to(b.x, b.y),
		PathPiece::Cubic(_, c1, c2, b) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, b.x, b.y),
	}
}

fn draw_connection(ctx: &CanvasRenderingContext2d, geometry: &ConnectionGeometry, color: &str, width: f64) {
	let Some(last) = geometry.last_piece() else {
		return;
	};
	let (ux, uy) = last.end_direction();
	let tip = last.end();

	ctx.set_stroke_style_str(color);
	ctx.set_line_width(width);
	ctx.set_line_join("round");
	ctx.begin_path();
	let mut pieces = geometry.pieces().peekable();
	if let Some(first) = pieces.peek() {
		let start = first.start();
		ctx.move_to(start.x, start.y);
	}
	for piece in pieces {
		trace(ctx, piece);
	}
	ctx.stroke();

	ctx.set_fill_style_str(color);
	let (back_x, back_y) = (tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_handle(ctx: &CanvasRenderingContext2d, at: Point, selected: bool) {
	ctx.begin_path();
	let _ = ctx.arc(at.x, at.y, HANDLE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(HANDLE_FILL);
	ctx.fill();
	ctx.set_stroke_style_str(if selected { SELECTED_COLOR } else { LINE_COLOR });
	ctx.set_line_width(2.0);
	ctx.stroke();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, r: &Rect, radius: f64) {
	let radius = radius.min(r.width / 2.0).min(r.height / 2.0);
	ctx.begin_path();
	ctx.move_to(r.left + radius, r.top);
	let _ = ctx.arc_to(r.right(), r.top, r.right(), r.bottom(), radius);
	let _ = ctx.arc_to(r.right(), r.bottom(), r.left, r.bottom(), radius);
	let _ = ctx.arc_to(r.left, r.bottom(), r.left, r.top, radius);
	let _ = ctx.arc_to(r.left, r.top, r.right(), r.top, radius);
	ctx.close_path();
}

fn fill_box(ctx: &CanvasRenderingContext2d, r: &Rect, fill: &str, border: &str) {
	rounded_rect(ctx, r, CARD_RADIUS);
	ctx.set_fill_style_str(fill);
	ctx.fill();
	ctx.set_stroke_style_str(border);
	ctx.set_line_width(1.0);
	ctx.stroke();
}

/// Shortens `text` with an ellipsis until it fits in `max_width`.
fn fit_text(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> String {
	let fits = |s: &str| ctx.measure_text(s).map(|m| m.width() <= max_width).unwrap_or(true);
	if fits(text) {
		return text.to_owned();
	}
	let mut chars: Vec<char> = text.chars().collect();
	while !chars.is_empty() {
		chars.pop();
		let candidate = format!("{}…", chars.iter().collect::<String>().trim_end());
		if fits(&candidate) {
			return candidate;
		}
	}
	String::new()
}

fn text(ctx: &CanvasRenderingContext2d, s: &str, x: f64, y: f64, size: f64, weight: &str, color: &str) {
	ctx.set_font(&format!("{weight} {size}px {FONT}"));
	ctx.set_fill_style_str(color);
	let _ = ctx.fill_text(s, x, y);
}

/// Draws a measured board: columns, cards, arrows and the legend. No
/// selection state or handles.
pub fn draw_snapshot(snapshot: &BoardSnapshot, ctx: &CanvasRenderingContext2d) {
	ctx.set_text_baseline("middle");
	for column in &snapshot.columns {
		fill_box(ctx, &column.rect, "#f1f5f9", "#e2e8f0");
		ctx.set_font(&format!("600 14px {FONT}"));
		let title = fit_text(ctx, &column.title, column.rect.width - 80.0);
		text(ctx, &title, column.rect.left + 12.0, column.rect.top + 20.0, 14.0, "600", "#334155");
		ctx.set_text_align("right");
		text(
			ctx,
			&format!("{} SKS", column.total_sks),
			column.rect.right() - 12.0,
			column.rect.top + 20.0,
			12.0,
			"500",
			"#64748b",
		);
		ctx.set_text_align("left");
	}

	for card in &snapshot.cards {
		let (bg, fg, border) = card.color.palette();
		fill_box(ctx, &card.rect, bg, border);
		ctx.set_font(&format!("500 13px {FONT}"));
		let name = fit_text(ctx, &card.name, card.rect.width - 64.0);
		text(ctx, &name, card.rect.left + 10.0, card.rect.center_y(), 13.0, "500", fg);
		ctx.set_text_align("right");
		text(
			ctx,
			&format!("{} SKS", card.sks),
			card.rect.right() - 10.0,
			card.rect.center_y(),
			11.0,
			"600",
			fg,
		);
		ctx.set_text_align("left");
	}

	for geometry in &snapshot.connections {
		draw_connection(ctx, geometry, LINE_COLOR, 2.0);
	}

	if let Some(legend) = &snapshot.legend {
		draw_legend(ctx, legend);
	}
}

fn draw_legend(ctx: &CanvasRenderingContext2d, area: &Rect) {
	let mut x = area.left;
	let y = area.center_y();
	for color in CourseColor::LEGEND {
		let (bg, fg, border) = color.palette();
		let swatch = Rect::new(x, y - 8.0, 16.0, 16.0);
		rounded_rect(ctx, &swatch, 4.0);
		ctx.set_fill_style_str(bg);
		ctx.fill();
		ctx.set_stroke_style_str(border);
		ctx.stroke();
		let label = format!("{} ({})", color.label(), color.short_label());
		text(ctx, &label, x + 22.0, y, 12.0, "500", fg);
		x += 22.0 + ctx.measure_text(&label).map(|m| m.width()).unwrap_or(120.0) + 20.0;
	}
}
