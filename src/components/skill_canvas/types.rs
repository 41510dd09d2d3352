use crate::skill_tree::{SkillId, Vec2};

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub skill: Option<SkillId>,
	pub start_x: f64,
	pub start_y: f64,
	pub skill_start: Vec2,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// What a key press asks of the component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
	Ignored,
	Handled,
	Save,
	Load,
}
