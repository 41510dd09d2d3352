use std::collections::BTreeMap;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::model::{Color, Connection, PATH_COLORS, Path, PathId, Skill, SkillId, Vec2};

/// Owns every skill and hands out skill ids.
#[derive(Clone, Debug, Default)]
pub struct SkillRegistry {
	skills: BTreeMap<SkillId, Skill>,
	next_id: u32,
}

impl SkillRegistry {
	/// Empty registry; the first skill gets id 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an ungrouped skill with a fresh id.
	pub fn create(&mut self, position: Vec2, label: String, radius: f64) -> SkillId {
		let id = SkillId(self.next_id);
		self.next_id = self.next_id.saturating_add(1);
		self.skills.insert(id, Skill::new(id, position, label, radius));
		id
	}

	/// Inserts a skill with a caller-chosen id, as the loader does. Returns
	/// `false` when the id is taken or is `u32::MAX`, which would leave no
	/// id after it. The counter moves past `id`.
	pub(crate) fn insert_with_id(&mut self, id: SkillId, position: Vec2, label: String, radius: f64) -> bool {
		let Some(after) = id.0.checked_add(1) else {
			return false;
		};
		if self.skills.contains_key(&id) {
			return false;
		}
		self.next_id = self.next_id.max(after);
		self.skills.insert(id, Skill::new(id, position, label, radius));
		true
	}

	/// Drops a skill. Its path and connections are the caller's business.
	pub fn remove(&mut self, id: SkillId) -> Option<Skill> {
		self.skills.remove(&id)
	}

	/// The skill with `id`, if live.
	pub fn get(&self, id: SkillId) -> Option<&Skill> {
		self.skills.get(&id)
	}

	/// Mutable access to a live skill.
	pub fn get_mut(&mut self, id: SkillId) -> Option<&mut Skill> {
		self.skills.get_mut(&id)
	}

	/// Whether `id` names a live skill.
	pub fn contains(&self, id: SkillId) -> bool {
		self.skills.contains_key(&id)
	}

	/// Skills in id order.
	pub fn iter(&self) -> impl Iterator<Item = &Skill> {
		self.skills.values()
	}

	/// Skills in id order, mutably.
	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Skill> {
		self.skills.values_mut()
	}

	/// Live skill ids, ascending.
	pub fn ids(&self) -> Vec<SkillId> {
		self.skills.keys().copied().collect()
	}

	/// Number of live skills.
	pub fn len(&self) -> usize {
		self.skills.len()
	}

	/// Whether there are no skills.
	pub fn is_empty(&self) -> bool {
		self.skills.is_empty()
	}

	/// Id the next created skill will get.
	pub fn next_id(&self) -> SkillId {
		SkillId(self.next_id)
	}

	fn path_of(&self, id: SkillId) -> Option<PathId> {
		self.skills.get(&id).and_then(|s| s.path)
	}

	fn set_path(&mut self, id: SkillId, path: Option<PathId>) {
		if let Some(skill) = self.skills.get_mut(&id) {
			skill.path = path;
		}
	}
}

/// Owns every live path, hands out path ids and picks their colors.
///
/// All membership edits go through here so a skill's `path` and the path's
/// member list change together.
#[derive(Clone, Debug)]
pub struct PathRegistry {
	paths: BTreeMap<PathId, Path>,
	next_id: u32,
	rng: SmallRng,
}

impl PathRegistry {
	/// Empty registry whose palette draws are seeded by `seed`.
	pub fn new(seed: u64) -> Self {
		Self {
			paths: BTreeMap::new(),
			next_id: 0,
			rng: SmallRng::seed_from_u64(seed),
		}
	}

	/// A color drawn from the palette.
	pub fn random_color(&mut self) -> Color {
		PATH_COLORS[self.rng.random_range(0..PATH_COLORS.len())]
	}

	/// Creates an empty path. Without an explicit color one is drawn from the
	/// palette.
	pub fn create(&mut self, color: Option<Color>) -> PathId {
		let id = PathId(self.next_id);
		self.next_id = self.next_id.saturating_add(1);
		let color = color.unwrap_or_else(|| self.random_color());
		self.paths.insert(id, Path::new(id, color));
		id
	}

	/// Inserts an empty path with a caller-chosen id. Returns `false` when the
	/// id is taken or is `u32::MAX`. The counter moves past `id`.
	pub(crate) fn insert_with_id(&mut self, id: PathId, color: Option<Color>) -> bool {
		let Some(after) = id.0.checked_add(1) else {
			return false;
		};
		if self.paths.contains_key(&id) {
			return false;
		}
		self.next_id = self.next_id.max(after);
		let color = color.unwrap_or_else(|| self.random_color());
		self.paths.insert(id, Path::new(id, color));
		true
	}

	/// The live path with `id`.
	pub fn get(&self, id: PathId) -> Option<&Path> {
		self.paths.get(&id)
	}

	/// Whether `id` names a live path.
	pub fn contains(&self, id: PathId) -> bool {
		self.paths.contains_key(&id)
	}

	/// Live paths in id order.
	pub fn iter(&self) -> impl Iterator<Item = &Path> {
		self.paths.values()
	}

	/// Live path ids, ascending.
	pub fn ids(&self) -> Vec<PathId> {
		self.paths.keys().copied().collect()
	}

	/// Number of live paths.
	pub fn len(&self) -> usize {
		self.paths.len()
	}

	/// Whether there are no live paths.
	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}

	/// Id the next created path will get.
	pub fn next_id(&self) -> PathId {
		PathId(self.next_id)
	}

	/// Appends `skill` to `path`. A skill already grouped elsewhere leaves its
	/// old path first. No-op for unknown ids or existing members.
	pub fn add_skill(&mut self, path: PathId, skill: SkillId, skills: &mut SkillRegistry) -> bool {
		if !self.paths.contains_key(&path) || !skills.contains(skill) {
			return false;
		}
		match skills.path_of(skill) {
			Some(current) if current == path => {
				if let Some(p) = self.paths.get_mut(&path) {
					if !p.members.contains(&skill) {
						p.members.push(skill);
					}
				}
				return false;
			}
			Some(current) => {
				if let Some(old) = self.paths.get_mut(&current) {
					old.members.retain(|&m| m != skill);
				}
			}
			None => {}
		}
		if let Some(p) = self.paths.get_mut(&path) {
			if !p.members.contains(&skill) {
				p.members.push(skill);
			}
		}
		skills.set_path(skill, Some(path));
		true
	}

	/// Takes `skill` out of `path`, leaving it ungrouped. The path stays live
	/// even when it becomes empty.
	pub fn remove_skill(&mut self, path: PathId, skill: SkillId, skills: &mut SkillRegistry) -> bool {
		let Some(p) = self.paths.get_mut(&path) else {
			return false;
		};
		let before = p.members.len();
		p.members.retain(|&m| m != skill);
		if skills.path_of(skill) == Some(path) {
			skills.set_path(skill, None);
		}
		p.members.len() != before
	}

	/// Moves every member of `source` into `target`, in order. `source` is left
	/// empty but live; discarding it is up to the caller. Target keeps its own
	/// color. Merging a path into itself changes nothing.
	pub fn merge(&mut self, target: PathId, source: PathId, skills: &mut SkillRegistry) -> bool {
		if target == source || !self.paths.contains_key(&target) {
			return false;
		}
		let Some(src) = self.paths.get_mut(&source) else {
			return false;
		};
		let moved = std::mem::take(&mut src.members);
		debug!("merging path {source} ({} skills) into path {target}", moved.len());
		for skill in moved {
			skills.set_path(skill, None);
			self.add_skill(target, skill, skills);
		}
		true
	}

	/// Drops a path from the live set. Any members it still had become
	/// ungrouped.
	pub fn discard(&mut self, id: PathId, skills: &mut SkillRegistry) -> Option<Path> {
		let path = self.paths.remove(&id)?;
		for &skill in &path.members {
			if skills.path_of(skill) == Some(id) {
				skills.set_path(skill, None);
			}
		}
		Some(path)
	}

	/// Replaces the member list of `path` wholesale, pointing every listed
	/// skill at it. Used by the repair pass, which has already taken the
	/// listed skills out of any other path.
	pub(crate) fn set_members(&mut self, path: PathId, members: Vec<SkillId>, skills: &mut SkillRegistry) {
		for &skill in &members {
			skills.set_path(skill, Some(path));
		}
		if let Some(p) = self.paths.get_mut(&path) {
			p.members = members;
		}
	}
}

impl Default for PathRegistry {
	fn default() -> Self {
		Self::new(0)
	}
}

/// The undirected edge set, kept in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Connections {
	edges: Vec<Connection>,
}

impl Connections {
	/// No edges.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `a`-`b`. Self loops and pairs already present in either
	/// orientation are refused.
	pub fn insert(&mut self, a: SkillId, b: SkillId) -> bool {
		let edge = Connection::new(a, b);
		if a == b || self.edges.contains(&edge) {
			return false;
		}
		self.edges.push(edge);
		true
	}

	/// Removes `a`-`b` in either orientation.
	pub fn remove(&mut self, a: SkillId, b: SkillId) -> bool {
		let edge = Connection::new(a, b);
		let before = self.edges.len();
		self.edges.retain(|e| *e != edge);
		self.edges.len() != before
	}

	/// Removes every edge touching `skill` and returns them.
	pub fn remove_incident(&mut self, skill: SkillId) -> Vec<Connection> {
		let (removed, kept): (Vec<_>, Vec<_>) =
			std::mem::take(&mut self.edges).into_iter().partition(|e| e.touches(skill));
		self.edges = kept;
		removed
	}

	/// Whether `a`-`b` is present in either orientation.
	pub fn contains(&self, a: SkillId, b: SkillId) -> bool {
		self.edges.contains(&Connection::new(a, b))
	}

	/// Whether any edge touches `skill`.
	pub fn has_incident(&self, skill: SkillId) -> bool {
		self.edges.iter().any(|e| e.touches(skill))
	}

	/// Endpoints adjacent to `skill`, in edge order.
	pub fn neighbors(&self, skill: SkillId) -> impl Iterator<Item = SkillId> + '_ {
		self.edges.iter().filter_map(move |e| e.other(skill))
	}

	/// Edges in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &Connection> {
		self.edges.iter()
	}

	/// Number of edges.
	pub fn len(&self) -> usize {
		self.edges.len()
	}

	/// Whether there are no edges.
	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}
}
