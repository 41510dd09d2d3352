//! Property tests for grouping and layout invariants.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use skill_tree_builder::skill_tree::{LayoutParams, PathId, SkillId, SkillTree, Vec2};

#[derive(Clone, Debug)]
enum Op {
	Connect(usize, usize),
	Disconnect(usize, usize),
	Detach(usize),
	Delete(usize),
	Create,
}

fn arb_op(n: usize) -> impl Strategy<Value = Op> {
	prop_oneof![
		4 => (0..n, 0..n).prop_map(|(a, b)| Op::Connect(a, b)),
		3 => (0..n, 0..n).prop_map(|(a, b)| Op::Disconnect(a, b)),
		1 => (0..n).prop_map(Op::Detach),
		1 => (0..n).prop_map(Op::Delete),
		1 => Just(Op::Create),
	]
}

fn pick(tree: &SkillTree, i: usize) -> Option<SkillId> {
	let ids = tree.skills().ids();
	(!ids.is_empty()).then(|| ids[i % ids.len()])
}

fn apply(tree: &mut SkillTree, op: &Op) {
	match *op {
		Op::Connect(a, b) => {
			if let (Some(a), Some(b)) = (pick(tree, a), pick(tree, b)) {
				tree.connect(a, b);
			}
		}
		Op::Disconnect(a, b) => {
			if let (Some(a), Some(b)) = (pick(tree, a), pick(tree, b)) {
				tree.disconnect(a, b);
			}
		}
		Op::Detach(a) => {
			if let Some(a) = pick(tree, a) {
				tree.detach_skill(a);
			}
		}
		Op::Delete(a) => {
			if let Some(a) = pick(tree, a) {
				tree.delete_skill(a);
			}
		}
		Op::Create => {
			tree.create_skill(Vec2::new(0.0, 0.0), "new");
		}
	}
}

/// Connected components by union-find over the current connections.
fn components(tree: &SkillTree) -> HashMap<SkillId, SkillId> {
	fn find(parent: &mut HashMap<SkillId, SkillId>, x: SkillId) -> SkillId {
		let p = parent[&x];
		if p == x {
			return x;
		}
		let root = find(parent, p);
		parent.insert(x, root);
		root
	}
	let mut parent: HashMap<SkillId, SkillId> = tree.skills().ids().into_iter().map(|s| (s, s)).collect();
	for e in tree.connections().iter() {
		let (ra, rb) = (find(&mut parent, e.a), find(&mut parent, e.b));
		parent.insert(ra, rb);
	}
	let ids = tree.skills().ids();
	ids.into_iter().map(|s| (s, find(&mut parent, s))).collect()
}

fn check_partition(tree: &SkillTree) -> Result<(), TestCaseError> {
	let mut seen: HashSet<SkillId> = HashSet::new();
	for path in tree.paths().iter() {
		prop_assert!(!path.is_empty(), "empty live path {}", path.id);
		for &m in path.members() {
			prop_assert!(seen.insert(m), "skill {} in two paths", m);
			prop_assert_eq!(tree.path_of(m), Some(path.id));
		}
	}
	prop_assert_eq!(seen.len(), tree.skills().len());

	let roots = components(tree);
	let mut path_by_root: HashMap<SkillId, PathId> = HashMap::new();
	let mut root_by_path: HashMap<PathId, SkillId> = HashMap::new();
	for (skill, root) in roots {
		let Some(path) = tree.path_of(skill) else {
			return Err(TestCaseError::fail(format!("skill {skill} ungrouped")));
		};
		prop_assert_eq!(*path_by_root.entry(root).or_insert(path), path);
		prop_assert_eq!(*root_by_path.entry(path).or_insert(root), root);
	}
	Ok(())
}

proptest! {
	#[test]
	fn paths_always_match_components(ops in prop::collection::vec(arb_op(8), 0..60)) {
		let mut tree = SkillTree::default();
		for i in 0..6 {
			tree.create_skill(Vec2::new(i as f64 * 40.0, 0.0), format!("s{i}"));
		}
		for op in &ops {
			apply(&mut tree, op);
			check_partition(&tree)?;
		}
	}

	#[test]
	fn split_twice_is_split_once(ops in prop::collection::vec(arb_op(6), 0..40)) {
		let mut tree = SkillTree::default();
		for i in 0..5 {
			tree.create_skill(Vec2::new(i as f64, 0.0), format!("s{i}"));
		}
		for op in &ops {
			apply(&mut tree, op);
		}
		let ids = tree.paths().ids();
		let Some(&first) = ids.first() else {
			return Ok(());
		};
		let others: Vec<_> = ids[1..].to_vec();
		// Force a non-component path, then split it.
		for p in others {
			tree.merge_paths(first, p);
		}
		tree.split_path(first);
		let members = |t: &SkillTree| t.paths().iter().map(|p| (p.id, p.members().to_vec())).collect::<Vec<_>>();
		let once = members(&tree);
		for id in tree.paths().ids() {
			prop_assert_eq!(tree.split_path(id), vec![id]);
		}
		prop_assert_eq!(members(&tree), once);
		check_partition(&tree)?;
	}

	#[test]
	fn speed_never_exceeds_the_ceiling(
		coords in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 2..12),
		kick in 0.0f64..1e9,
		dt in 0.001f64..0.5,
	) {
		let mut tree = SkillTree::default();
		tree.layout_params_mut().repulsion_strength = kick;
		let ids: Vec<_> = coords.iter().map(|&(x, y)| tree.create_skill(Vec2::new(x, y), "")).collect();
		for pair in ids.windows(2) {
			tree.connect(pair[0], pair[1]);
		}
		let ceiling = LayoutParams::default().max_speed;
		for _ in 0..5 {
			tree.tick(dt);
			for s in tree.skills().iter() {
				prop_assert!(s.velocity.length() <= ceiling * (1.0 + 1e-9));
				prop_assert!(s.position.x.is_finite() && s.position.y.is_finite());
			}
		}
	}
}

#[test]
fn coincident_skills_feel_no_force() {
	let mut tree = SkillTree::default();
	let a = tree.create_skill(Vec2::new(5.0, 5.0), "a");
	let b = tree.create_skill(Vec2::new(5.0, 5.0), "b");
	tree.connect(a, b);
	tree.tick(0.016);
	for id in [a, b] {
		let s = tree.skill(id).cloned();
		assert_eq!(s.as_ref().map(|s| s.velocity), Some(Vec2::ZERO));
		assert_eq!(s.map(|s| s.position), Some(Vec2::new(5.0, 5.0)));
	}
}
