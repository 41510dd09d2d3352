use log::debug;

use super::types::{DragState, KeyOutcome, PanState, ViewTransform};
use crate::skill_tree::{PathId, SkillId, SkillTree, TreeConfig, Vec2};

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 3.0;

pub struct EditorState {
	pub tree: SkillTree,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	/// Skill last clicked; target of rename, delete and detach.
	pub active: Option<SkillId>,
	pub editing: bool,
	/// First end of a shift-click connection in progress.
	pub connecting: Option<SkillId>,
	pub selected_path: Option<PathId>,
	pub pointer: (f64, f64),
	pub instructions_open: bool,
	pub width: f64,
	pub height: f64,
	pub pulse_time: f64,
}

impl EditorState {
	pub fn new(width: f64, height: f64, seed: u64) -> Self {
		Self {
			tree: SkillTree::new(TreeConfig {
				palette_seed: seed,
				..TreeConfig::default()
			}),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			active: None,
			editing: false,
			connecting: None,
			selected_path: None,
			pointer: (0.0, 0.0),
			instructions_open: false,
			width,
			height,
			pulse_time: 0.0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Vec2 {
		Vec2::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn skill_at_position(&self, sx: f64, sy: f64) -> Option<SkillId> {
		let g = self.screen_to_graph(sx, sy);
		self.tree
			.skills()
			.iter()
			.filter(|s| (s.position - g).length_sq() <= s.radius * s.radius)
			.last()
			.map(|s| s.id)
	}

	/// Right click: a new skill under the pointer, ready for typing.
	pub fn create_at(&mut self, sx: f64, sy: f64) {
		let id = self.tree.create_skill(self.screen_to_graph(sx, sy), "");
		self.active = Some(id);
		self.editing = true;
		self.connecting = None;
	}

	/// Left click on a skill. With shift held the first click picks the
	/// source of a connection and the second one completes it.
	pub fn click_skill(&mut self, id: SkillId, shift: bool, sx: f64, sy: f64) {
		self.selected_path = self.tree.path_of(id);
		if shift {
			match self.connecting.take() {
				None => self.connecting = Some(id),
				Some(from) if from == id => self.connecting = Some(id),
				Some(from) => {
					self.tree.connect(from, id);
					self.selected_path = self.tree.path_of(id);
				}
			}
			return;
		}
		if self.active != Some(id) {
			self.editing = false;
		}
		self.active = Some(id);
		let skill_start = self.tree.skill(id).map(|s| s.position).unwrap_or_default();
		self.drag = DragState {
			active: true,
			skill: Some(id),
			start_x: sx,
			start_y: sy,
			skill_start,
		};
		self.tree.set_dragging(id, true);
	}

	pub fn click_background(&mut self, sx: f64, sy: f64) {
		self.active = None;
		self.editing = false;
		self.selected_path = None;
		self.connecting = None;
		self.start_pan(sx, sy);
	}

	pub fn start_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pointer_moved(&mut self, sx: f64, sy: f64) {
		self.pointer = (sx, sy);
		if self.drag.active {
			if let Some(id) = self.drag.skill {
				let delta = Vec2::new(
					(sx - self.drag.start_x) / self.transform.k,
					(sy - self.drag.start_y) / self.transform.k,
				);
				self.tree.move_skill(id, self.drag.skill_start + delta);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn release(&mut self) {
		if let Some(id) = self.drag.skill.take() {
			self.tree.set_dragging(id, false);
		}
		self.drag.active = false;
		self.pan.active = false;
	}

	pub fn zoom_at(&mut self, sx: f64, sy: f64, zoom_in: bool) {
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn key(&mut self, key: &str, ctrl: bool) -> KeyOutcome {
		if ctrl {
			return match key {
				"s" | "S" => KeyOutcome::Save,
				"o" | "O" => KeyOutcome::Load,
				_ => KeyOutcome::Ignored,
			};
		}
		if key == "Enter" {
			if self.active.is_some() {
				self.editing = !self.editing;
				return KeyOutcome::Handled;
			}
			return KeyOutcome::Ignored;
		}
		if let ("Delete", Some(id)) = (key, self.active) {
			self.tree.delete_skill(id);
			self.active = None;
			self.editing = false;
			self.selected_path = None;
			self.connecting = None;
			return KeyOutcome::Handled;
		}
		if self.editing {
			return self.edit_label(key);
		}
		match (key, self.active) {
			("h" | "H", _) => self.instructions_open = !self.instructions_open,
			("d" | "D", Some(id)) => {
				self.tree.detach_skill(id);
				self.selected_path = self.tree.path_of(id);
			}
			_ => return KeyOutcome::Ignored,
		}
		KeyOutcome::Handled
	}

	fn edit_label(&mut self, key: &str) -> KeyOutcome {
		let Some(id) = self.active else {
			return KeyOutcome::Ignored;
		};
		let Some(mut label) = self.tree.skill(id).map(|s| s.label.clone()) else {
			return KeyOutcome::Ignored;
		};
		match key {
			"Backspace" => {
				label.pop();
			}
			k if k.chars().count() == 1 => label.push_str(k),
			_ => return KeyOutcome::Ignored,
		}
		debug!("skill {id} label now {label:?}");
		self.tree.rename_skill(id, label);
		KeyOutcome::Handled
	}

	/// Swaps in a freshly loaded tree and forgets selections into the old one.
	pub fn replace_tree(&mut self, tree: SkillTree) {
		self.tree = tree;
		self.active = None;
		self.editing = false;
		self.connecting = None;
		self.selected_path = None;
		self.drag = DragState::default();
	}

	pub fn tick(&mut self, dt: f64) {
		self.tree.tick(dt);
		self.pulse_time += dt;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
