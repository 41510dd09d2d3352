use std::rc::Rc;

use log::debug;

use super::connectivity;
use super::layout::{self, LayoutParams};
use super::model::{Color, LabelMeasure, MonospaceMeasure, Path, PathId, Skill, SkillId, Vec2, label_radius};
use super::registry::{Connections, PathRegistry, SkillRegistry};

/// Construction-time settings of a [`SkillTree`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeConfig {
	/// Force simulation settings.
	pub layout: LayoutParams,
	/// Seed of the palette draws for new paths.
	pub palette_seed: u64,
}

impl Default for TreeConfig {
	fn default() -> Self {
		Self {
			layout: LayoutParams::default(),
			palette_seed: 0x5eed,
		}
	}
}

/// What the canvas needs to draw one skill.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillView {
	/// The skill drawn.
	pub id: SkillId,
	/// Text inside the circle.
	pub label: String,
	/// Center in world space.
	pub position: Vec2,
	/// Circle radius.
	pub radius: f64,
	/// Owning path, if any.
	pub path: Option<PathId>,
	/// Fill, taken from the owning path.
	pub color: Option<Color>,
	/// Held by the pointer.
	pub dragging: bool,
}

/// What the canvas needs to draw one connection. `color` is set when both
/// ends share a path.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView {
	/// Center of the first endpoint.
	pub from: Vec2,
	/// Center of the second endpoint.
	pub to: Vec2,
	/// Shared path color, if any.
	pub color: Option<Color>,
}

/// Read-only picture of the tree for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
	/// Skills in id order.
	pub skills: Vec<SkillView>,
	/// Connections in insertion order.
	pub edges: Vec<EdgeView>,
}

/// Skills, paths and connections together with the commands that edit them.
///
/// Every command keeps paths equal to connected components: connecting two
/// skills merges their paths, and removals run the repair pass on the path
/// they touched. Invalid commands leave the tree unchanged and return `false`.
#[derive(Clone)]
pub struct SkillTree {
	pub(crate) skills: SkillRegistry,
	pub(crate) paths: PathRegistry,
	pub(crate) connections: Connections,
	layout: LayoutParams,
	measure: Rc<dyn LabelMeasure>,
}

impl Default for SkillTree {
	fn default() -> Self {
		Self::new(TreeConfig::default())
	}
}

impl SkillTree {
	/// An empty tree.
	pub fn new(config: TreeConfig) -> Self {
		Self::from_parts(SkillRegistry::new(), PathRegistry::new(config.palette_seed), Connections::new(), config)
	}

	pub(crate) fn from_parts(
		skills: SkillRegistry,
		paths: PathRegistry,
		connections: Connections,
		config: TreeConfig,
	) -> Self {
		Self {
			skills,
			paths,
			connections,
			layout: config.layout,
			measure: Rc::new(MonospaceMeasure::default()),
		}
	}

	/// Replaces the text metrics used to size skills on rename.
	pub fn with_measure(mut self, measure: impl LabelMeasure + 'static) -> Self {
		self.measure = Rc::new(measure);
		self
	}

	/// All skills.
	pub fn skills(&self) -> &SkillRegistry {
		&self.skills
	}

	/// All live paths.
	pub fn paths(&self) -> &PathRegistry {
		&self.paths
	}

	/// All connections.
	pub fn connections(&self) -> &Connections {
		&self.connections
	}

	/// The skill with `id`.
	pub fn skill(&self, id: SkillId) -> Option<&Skill> {
		self.skills.get(id)
	}

	/// The live path with `id`.
	pub fn path(&self, id: PathId) -> Option<&Path> {
		self.paths.get(id)
	}

	/// Path currently holding `skill`.
	pub fn path_of(&self, skill: SkillId) -> Option<PathId> {
		self.skills.get(skill).and_then(|s| s.path)
	}

	/// Members of `path` in path order.
	pub fn path_members(&self, path: PathId) -> Vec<&Skill> {
		self.paths
			.get(path)
			.map(|p| p.members().iter().filter_map(|&id| self.skills.get(id)).collect())
			.unwrap_or_default()
	}

	/// Current force simulation settings.
	pub fn layout_params(&self) -> &LayoutParams {
		&self.layout
	}

	/// Force simulation settings, for tuning at runtime.
	pub fn layout_params_mut(&mut self) -> &mut LayoutParams {
		&mut self.layout
	}

	/// Creates a skill at `position` inside a new singleton path.
	pub fn create_skill(&mut self, position: Vec2, label: impl Into<String>) -> SkillId {
		let label = label.into();
		let radius = label_radius(&label, self.measure.as_ref());
		let id = self.skills.create(position, label, radius);
		let path = self.paths.create(None);
		self.paths.add_skill(path, id, &mut self.skills);
		debug!("created skill {id} in path {path}");
		id
	}

	/// Removes a skill with its connections, splitting its former path as
	/// needed.
	pub fn delete_skill(&mut self, id: SkillId) -> bool {
		if !self.skills.contains(id) {
			return false;
		}
		let removed = self.connections.remove_incident(id);
		let path = self.path_of(id);
		if let Some(path) = path {
			self.paths.remove_skill(path, id, &mut self.skills);
		}
		self.skills.remove(id);
		debug!("deleted skill {id} and {} connections", removed.len());
		if let Some(path) = path {
			connectivity::repair(path, &self.connections, &mut self.paths, &mut self.skills);
		}
		true
	}

	/// Connects two skills and merges their paths. Refused for self loops,
	/// unknown skills and existing connections.
	pub fn connect(&mut self, a: SkillId, b: SkillId) -> bool {
		if a == b || !self.skills.contains(a) || !self.skills.contains(b) {
			return false;
		}
		if !self.connections.insert(a, b) {
			return false;
		}
		match (self.path_of(a), self.path_of(b)) {
			(Some(pa), Some(pb)) if pa != pb => {
				self.paths.merge(pa, pb, &mut self.skills);
				self.paths.discard(pb, &mut self.skills);
			}
			(Some(_), Some(_)) => {}
			(Some(pa), None) => {
				self.paths.add_skill(pa, b, &mut self.skills);
			}
			(None, Some(pb)) => {
				self.paths.add_skill(pb, a, &mut self.skills);
			}
			(None, None) => {
				let path = self.paths.create(None);
				self.paths.add_skill(path, a, &mut self.skills);
				self.paths.add_skill(path, b, &mut self.skills);
			}
		}
		debug!("connected {a} and {b}");
		true
	}

	/// Removes the connection between `a` and `b` and splits their path if it
	/// fell apart.
	pub fn disconnect(&mut self, a: SkillId, b: SkillId) -> bool {
		if !self.connections.remove(a, b) {
			return false;
		}
		debug!("disconnected {a} and {b}");
		for path in [self.path_of(a), self.path_of(b)].into_iter().flatten() {
			connectivity::repair(path, &self.connections, &mut self.paths, &mut self.skills);
		}
		true
	}

	/// Cuts every connection of `id` and moves it to a path of its own.
	/// Does nothing for a skill without connections.
	pub fn detach_skill(&mut self, id: SkillId) -> bool {
		if !self.skills.contains(id) || !self.connections.has_incident(id) {
			return false;
		}
		self.connections.remove_incident(id);
		let former = self.path_of(id);
		if let Some(former) = former {
			self.paths.remove_skill(former, id, &mut self.skills);
		}
		let alone = self.paths.create(None);
		self.paths.add_skill(alone, id, &mut self.skills);
		debug!("detached skill {id} into path {alone}");
		if let Some(former) = former {
			connectivity::repair(former, &self.connections, &mut self.paths, &mut self.skills);
		}
		true
	}

	/// Sets the label and resizes the circle to fit it.
	pub fn rename_skill(&mut self, id: SkillId, label: impl Into<String>) -> bool {
		let label = label.into();
		let radius = label_radius(&label, self.measure.as_ref());
		let Some(skill) = self.skills.get_mut(id) else {
			return false;
		};
		skill.label = label;
		skill.radius = radius;
		true
	}

	/// Places a skill directly, as a pointer drag does.
	pub fn move_skill(&mut self, id: SkillId, position: Vec2) -> bool {
		let Some(skill) = self.skills.get_mut(id) else {
			return false;
		};
		skill.position = position;
		true
	}

	/// Grabbing a skill stops it; while held the simulation does not move it.
	pub fn set_dragging(&mut self, id: SkillId, dragging: bool) -> bool {
		let Some(skill) = self.skills.get_mut(id) else {
			return false;
		};
		if dragging && !skill.dragging {
			skill.velocity = Vec2::ZERO;
		}
		skill.dragging = dragging;
		true
	}

	/// Moves every member of `source` into `target` and drops `source`.
	pub fn merge_paths(&mut self, target: PathId, source: PathId) -> bool {
		if !self.paths.merge(target, source, &mut self.skills) {
			return false;
		}
		self.paths.discard(source, &mut self.skills);
		true
	}

	/// Splits `path` into its connected components. Returns the paths now
	/// holding its members, `path` first.
	pub fn split_path(&mut self, path: PathId) -> Vec<PathId> {
		connectivity::repair(path, &self.connections, &mut self.paths, &mut self.skills)
	}

	/// Advances the layout by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		layout::step(&self.layout, &mut self.skills, &self.connections, dt);
	}

	/// What to draw this frame.
	pub fn snapshot(&self) -> Snapshot {
		let color_of = |path: Option<PathId>| path.and_then(|p| self.paths.get(p)).map(|p| p.color);
		let skills = self
			.skills
			.iter()
			.map(|s| SkillView {
				id: s.id,
				label: s.label.clone(),
				position: s.position,
				radius: s.radius,
				path: s.path,
				color: color_of(s.path),
				dragging: s.dragging,
			})
			.collect();
		let edges = self
			.connections
			.iter()
			.filter_map(|e| {
				let (a, b) = (self.skills.get(e.a)?, self.skills.get(e.b)?);
				let shared = if a.path == b.path { a.path } else { None };
				Some(EdgeView {
					from: a.position,
					to: b.position,
					color: color_of(shared),
				})
			})
			.collect();
		Snapshot { skills, edges }
	}
}
