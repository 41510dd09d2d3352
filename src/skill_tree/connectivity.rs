//! Keeps every path equal to one connected component after edges or skills
//! are removed.

use std::collections::{BTreeSet, HashSet, VecDeque};

use log::debug;

use super::model::{PathId, SkillId};
use super::registry::{Connections, PathRegistry, SkillRegistry};

/// Breadth-first walk from `start` that only enters skills for which
/// `allowed` holds. Every skill reached is added to `visited`; the result is
/// in visiting order and starts with `start`.
pub fn reachable(
	start: SkillId,
	connections: &Connections,
	visited: &mut HashSet<SkillId>,
	allowed: impl Fn(SkillId) -> bool,
) -> Vec<SkillId> {
	let mut order = vec![start];
	let mut queue = VecDeque::from([start]);
	visited.insert(start);
	while let Some(current) = queue.pop_front() {
		for next in connections.neighbors(current) {
			if allowed(next) && visited.insert(next) {
				order.push(next);
				queue.push_back(next);
			}
		}
	}
	order
}

/// Splits `path` into one path per connected component of its former
/// members.
///
/// The component holding the path's first member keeps `path`; every other
/// component moves to a freshly created path. An empty path is discarded.
/// Returns the paths now holding the former members, `path` first.
pub fn repair(
	path: PathId,
	connections: &Connections,
	paths: &mut PathRegistry,
	skills: &mut SkillRegistry,
) -> Vec<PathId> {
	let Some(candidates) = paths.get(path).map(|p| p.members().to_vec()) else {
		return Vec::new();
	};
	let candidates: Vec<SkillId> = candidates.into_iter().filter(|&s| skills.contains(s)).collect();
	let Some(&first) = candidates.first() else {
		paths.discard(path, skills);
		return Vec::new();
	};

	let mut remaining: BTreeSet<SkillId> = candidates.iter().copied().collect();
	let mut visited = HashSet::new();

	let kept = reachable(first, connections, &mut visited, |s| remaining.contains(&s));
	for s in &kept {
		remaining.remove(s);
	}
	paths.set_members(path, kept, skills);

	let mut result = vec![path];
	while let Some(start) = remaining.pop_first() {
		let component = reachable(start, connections, &mut visited, |s| remaining.contains(&s));
		for s in &component {
			remaining.remove(s);
		}
		let fresh = paths.create(None);
		debug!("path {path} split: {} skills moved to path {fresh}", component.len());
		paths.set_members(fresh, component, skills);
		result.push(fresh);
	}
	result
}
