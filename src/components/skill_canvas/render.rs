use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::EditorState;
use crate::skill_tree::{LabelMeasure, PathId, SkillView, wrap_label};

const BACKGROUND: &str = "rgb(30, 30, 30)";
const UNGROUPED: &str = "rgb(100, 100, 255)";
const PANEL_WIDTH: f64 = 200.0;
const FONT_PX: f64 = 13.0;

const INSTRUCTIONS: &[&str] = &[
	"Create skill: right-click.",
	"Rename skill: select it, Enter to start typing, Enter again to finish.",
	"Link skills: shift-click skill A, then shift-click skill B.",
	"Delete skill: select it and press Delete.",
	"Detach skill from its path: select it and press D.",
	"Save / load: Ctrl+S / Ctrl+O.",
	"Zoom: mouse wheel. Pan: drag the background.",
];

/// Canvas text metrics, so labels wrap the way they are drawn.
struct CanvasMeasure<'a>(&'a CanvasRenderingContext2d);

impl LabelMeasure for CanvasMeasure<'_> {
	fn text_width(&self, text: &str) -> f64 {
		self.0.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
	}

	fn line_height(&self) -> f64 {
		FONT_PX + 2.0
	}
}

pub fn render(state: &EditorState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	let snapshot = state.tree.snapshot();

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	let k = state.transform.k;

	for edge in &snapshot.edges {
		ctx.set_stroke_style_str(&edge.color.map(|c| c.css()).unwrap_or_else(|| "black".into()));
		ctx.set_line_width(2.0 / k);
		ctx.begin_path();
		ctx.move_to(edge.from.x, edge.from.y);
		ctx.line_to(edge.to.x, edge.to.y);
		ctx.stroke();
	}

	if let Some(from) = state.connecting.and_then(|id| snapshot.skills.iter().find(|s| s.id == id)) {
		let to = state.screen_to_graph(state.pointer.0, state.pointer.1);
		ctx.set_stroke_style_str(&from.color.map(|c| c.css()).unwrap_or_else(|| "red".into()));
		ctx.set_line_width(2.0 / k);
		ctx.begin_path();
		ctx.move_to(from.position.x, from.position.y);
		ctx.line_to(to.x, to.y);
		ctx.stroke();
	}

	ctx.set_font(&format!("{FONT_PX}px sans-serif"));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for skill in &snapshot.skills {
		draw_skill(state, ctx, skill);
	}
	ctx.restore();

	if let Some(path) = state.selected_path {
		draw_side_panel(state, ctx, path);
	}
	draw_instructions(state, ctx);
}

fn draw_skill(state: &EditorState, ctx: &CanvasRenderingContext2d, skill: &SkillView) {
	let (x, y) = (skill.position.x, skill.position.y);
	let selected = state.active == Some(skill.id) || (state.selected_path.is_some() && state.selected_path == skill.path);
	let pulse = if selected {
		5.0 * (1.0 + (state.pulse_time * 8.0).sin()) / 2.0
	} else {
		0.0
	};
	let radius = skill.radius + pulse;

	if state.editing && state.active == Some(skill.id) {
		let glow = radius + 5.0 * (1.0 + (state.pulse_time * 10.0).sin()) / 2.0;
		ctx.begin_path();
		let _ = ctx.arc(x, y, glow, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str("rgb(255, 255, 0)");
		ctx.set_line_width(3.0 / state.transform.k);
		ctx.stroke();
	}

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&skill.color.map(|c| c.css()).unwrap_or_else(|| UNGROUPED.into()));
	ctx.fill();

	let measure = CanvasMeasure(ctx);
	let lines = wrap_label(&skill.label, &measure, skill.radius * 1.8);
	let line_h = measure.line_height();
	let mut line_y = y - (lines.len() as f64 - 1.0) * line_h / 2.0;
	ctx.set_fill_style_str("white");
	for line in &lines {
		let _ = ctx.fill_text(line, x, line_y);
		line_y += line_h;
	}
}

fn draw_side_panel(state: &EditorState, ctx: &CanvasRenderingContext2d, path: PathId) {
	let left = state.width - PANEL_WIDTH;
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(left, 0.0, PANEL_WIDTH, state.height);
	ctx.set_stroke_style_str("white");
	ctx.set_line_width(2.0);
	ctx.stroke_rect(left, 0.0, PANEL_WIDTH, state.height);

	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	ctx.set_fill_style_str("white");
	ctx.set_font("18px sans-serif");
	let _ = ctx.fill_text(&format!("Path {path}"), left + 10.0, 10.0);
	ctx.set_font(&format!("{FONT_PX}px sans-serif"));
	for (i, skill) in state.tree.path_members(path).iter().enumerate() {
		let name = if skill.label.is_empty() { "empty" } else { skill.label.as_str() };
		let _ = ctx.fill_text(name, left + 10.0, 40.0 + i as f64 * 25.0);
	}
}

fn draw_instructions(state: &EditorState, ctx: &CanvasRenderingContext2d) {
	let caret = if state.instructions_open { "v" } else { ">" };
	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	ctx.set_fill_style_str("rgba(0, 0, 0, 0.55)");
	ctx.fill_rect(14.0, 16.0, 520.0, 26.0);
	ctx.set_fill_style_str("white");
	ctx.set_font("18px sans-serif");
	let _ = ctx.fill_text(&format!("{caret} Instructions  (press H)"), 20.0, 20.0);
	if !state.instructions_open {
		return;
	}

	let line_h = FONT_PX + 10.0;
	ctx.set_fill_style_str("rgba(0, 0, 0, 0.6)");
	ctx.fill_rect(20.0, 50.0, 520.0, 20.0 + INSTRUCTIONS.len() as f64 * line_h);
	ctx.set_fill_style_str("rgb(230, 230, 230)");
	ctx.set_font(&format!("{FONT_PX}px sans-serif"));
	for (i, line) in INSTRUCTIONS.iter().enumerate() {
		let _ = ctx.fill_text(&format!("• {line}"), 30.0, 60.0 + i as f64 * line_h);
	}
}
