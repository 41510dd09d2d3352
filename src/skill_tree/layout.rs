//! Force-directed placement of skills.

use super::model::Vec2;
use super::registry::{Connections, SkillRegistry};

/// Knobs of the force simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
	/// `k` in the `k / d²` push between nearby skills.
	pub repulsion_strength: f64,
	/// Spring constant along connections.
	pub attraction_strength: f64,
	/// Rest length of a connection.
	pub ideal_distance: f64,
	/// Skills further apart than this do not repel.
	pub repulsion_range: f64,
	/// Velocity multiplier applied every step.
	pub damping: f64,
	/// Speed ceiling, in units per second.
	pub max_speed: f64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			repulsion_strength: 10_000.0,
			attraction_strength: 0.05,
			ideal_distance: 100.0,
			repulsion_range: 100.0,
			damping: 0.95,
			max_speed: 600.0,
		}
	}
}

impl LayoutParams {
	/// Push felt by `a` from `b`. Zero outside the range or when the two
	/// coincide.
	pub fn repulsion(&self, a: Vec2, b: Vec2) -> Vec2 {
		let delta = a - b;
		let dist_sq = delta.length_sq();
		if dist_sq == 0.0 || dist_sq > self.repulsion_range * self.repulsion_range {
			return Vec2::ZERO;
		}
		let dist = dist_sq.sqrt();
		delta * (self.repulsion_strength / dist_sq / dist)
	}

	/// Spring pull felt by `a` towards `b`; negative when closer than the rest
	/// length. Zero when the two coincide.
	pub fn attraction(&self, a: Vec2, b: Vec2) -> Vec2 {
		let delta = b - a;
		let dist = delta.length();
		if dist == 0.0 {
			return Vec2::ZERO;
		}
		delta * (self.attraction_strength * (dist - self.ideal_distance) / dist)
	}

	/// Scales `v` down to `max_speed` when faster.
	pub fn clamp_speed(&self, v: Vec2) -> Vec2 {
		let sp2 = v.length_sq();
		if sp2 > self.max_speed * self.max_speed {
			v * (self.max_speed / sp2.sqrt())
		} else {
			v
		}
	}
}

/// Advances the simulation by `dt` seconds.
///
/// Forces are summed from the positions at the start of the step and added
/// to velocities; then every skill moves (unless dragged), slows down and is
/// capped to the speed ceiling.
pub fn step(params: &LayoutParams, skills: &mut SkillRegistry, connections: &Connections, dt: f64) {
	let ids = skills.ids();
	let positions: Vec<Vec2> = skills.iter().map(|s| s.position).collect();
	let mut forces = vec![Vec2::ZERO; ids.len()];

	for i in 0..positions.len() {
		for j in (i + 1)..positions.len() {
			let push = params.repulsion(positions[i], positions[j]);
			forces[i] += push;
			forces[j] += -push;
		}
	}

	for edge in connections.iter() {
		let (Ok(i), Ok(j)) = (ids.binary_search(&edge.a), ids.binary_search(&edge.b)) else {
			continue;
		};
		let pull = params.attraction(positions[i], positions[j]);
		forces[i] += pull;
		forces[j] += -pull;
	}

	for (skill, force) in skills.iter_mut().zip(forces) {
		skill.velocity += force;
		if !skill.dragging {
			skill.position += skill.velocity * dt;
		}
		skill.velocity *= params.damping;
		skill.velocity = params.clamp_speed(skill.velocity);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::skill_tree::model::SkillId;

	fn approx(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn repulsion_is_inverse_square() {
		let p = LayoutParams::default();
		let f = p.repulsion(Vec2::new(0.0, 0.0), Vec2::new(50.0, 0.0));
		assert!(approx(f.x, -10_000.0 / 2500.0));
		assert!(approx(f.y, 0.0));
	}

	#[test]
	fn repulsion_skips_far_and_coincident_pairs() {
		let p = LayoutParams::default();
		assert_eq!(p.repulsion(Vec2::ZERO, Vec2::new(100.5, 0.0)), Vec2::ZERO);
		assert_eq!(p.repulsion(Vec2::new(3.0, 4.0), Vec2::new(3.0, 4.0)), Vec2::ZERO);
		// Exactly at the range still repels.
		assert!(p.repulsion(Vec2::ZERO, Vec2::new(100.0, 0.0)).x < 0.0);
	}

	#[test]
	fn spring_pulls_stretched_and_pushes_compressed() {
		let p = LayoutParams::default();
		let far = p.attraction(Vec2::ZERO, Vec2::new(200.0, 0.0));
		assert!(approx(far.x, 0.05 * 100.0));
		let near = p.attraction(Vec2::ZERO, Vec2::new(60.0, 0.0));
		assert!(approx(near.x, 0.05 * -40.0));
		assert_eq!(p.attraction(Vec2::ZERO, Vec2::new(100.0, 0.0)), Vec2::ZERO);
		assert_eq!(p.attraction(Vec2::ZERO, Vec2::ZERO), Vec2::ZERO);
	}

	#[test]
	fn speed_is_capped_uniformly() {
		let p = LayoutParams::default();
		let v = p.clamp_speed(Vec2::new(3000.0, 4000.0));
		assert!(approx(v.length(), 600.0));
		assert!(approx(v.x / v.y, 0.75));
		assert_eq!(p.clamp_speed(Vec2::new(3.0, 4.0)), Vec2::new(3.0, 4.0));
	}

	#[test]
	fn close_pair_drifts_apart_symmetrically() {
		let p = LayoutParams::default();
		let mut skills = SkillRegistry::new();
		let a = skills.create(Vec2::new(-10.0, 0.0), String::new(), 30.0);
		let b = skills.create(Vec2::new(10.0, 0.0), String::new(), 30.0);
		step(&p, &mut skills, &Connections::new(), 0.016);

		let (sa, sb) = (skills.get(a).cloned(), skills.get(b).cloned());
		let (Some(sa), Some(sb)) = (sa, sb) else {
			panic!("skills vanished");
		};
		assert!(sa.position.x < -10.0);
		assert!(sb.position.x > 10.0);
		assert!(approx(sa.position.x, -sb.position.x));
		// 10000 / 400 = 25 units/s, moved then damped.
		assert!(approx(sb.velocity.x, 25.0 * 0.95));
		assert!(approx(sb.position.x, 10.0 + 25.0 * 0.016));
	}

	#[test]
	fn dragged_skill_holds_position_but_still_decays() {
		let p = LayoutParams::default();
		let mut skills = SkillRegistry::new();
		let a = skills.create(Vec2::ZERO, String::new(), 30.0);
		if let Some(s) = skills.get_mut(a) {
			s.dragging = true;
			s.velocity = Vec2::new(100.0, 0.0);
		}
		step(&p, &mut skills, &Connections::new(), 0.5);
		let s = skills.get(a).cloned();
		assert_eq!(s.as_ref().map(|s| s.position), Some(Vec2::ZERO));
		assert!(s.is_some_and(|s| approx(s.velocity.x, 95.0)));
	}

	#[test]
	fn connected_pair_settles_towards_rest_length() {
		let p = LayoutParams::default();
		let mut skills = SkillRegistry::new();
		let a = skills.create(Vec2::new(0.0, 0.0), String::new(), 30.0);
		let b = skills.create(Vec2::new(400.0, 0.0), String::new(), 30.0);
		let mut edges = Connections::new();
		edges.insert(a, b);
		for _ in 0..2000 {
			step(&p, &mut skills, &edges, 0.016);
		}
		let gap = skills.get(b).map(|s| s.position.x).unwrap_or_default()
			- skills.get(a).map(|s| s.position.x).unwrap_or_default();
		assert!(gap > 90.0 && gap < 150.0, "gap {gap}");
	}

	#[test]
	fn dangling_edges_are_ignored() {
		let p = LayoutParams::default();
		let mut skills = SkillRegistry::new();
		let a = skills.create(Vec2::ZERO, String::new(), 30.0);
		let mut edges = Connections::new();
		edges.insert(a, SkillId(99));
		step(&p, &mut skills, &edges, 0.016);
		assert_eq!(skills.get(a).map(|s| s.position), Some(Vec2::ZERO));
	}
}
