//! The `type,id,name,x,y,radius,path_id,path_color,edge_from,edge_to` file
//! format.
//!
//! One row per path, skill and connection. Reading never gives up on bad
//! field data: numbers that do not parse fall back to defaults, dangling
//! references are dropped, and a repair pass afterwards makes sure every
//! skill ends up in a path matching its connected component.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path as FsPath;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::connectivity;
use super::error::Result;
use super::model::{Color, LabelMeasure, MonospaceMeasure, PATH_COLORS, PathId, SkillId, Vec2, label_radius};
use super::registry::{Connections, PathRegistry, SkillRegistry};
use super::tree::{SkillTree, TreeConfig};

const PATH_ROW: &str = "path";
const SKILL_ROW: &str = "skill";
const EDGE_ROW: &str = "edge";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Row {
	#[serde(rename = "type")]
	kind: String,
	id: String,
	name: String,
	x: String,
	y: String,
	radius: String,
	path_id: String,
	path_color: String,
	edge_from: String,
	edge_to: String,
}

fn parse_field<T: std::str::FromStr>(field: &str) -> Option<T> {
	field.trim().parse().ok()
}

/// Writes the whole tree. Skills without a path are written inside an ad-hoc
/// singleton path so every skill row carries a path id; the tree itself is
/// not changed.
pub fn write_to<W: io::Write>(tree: &SkillTree, writer: W) -> Result<()> {
	let mut out = csv::Writer::from_writer(writer);

	let mut next_path = tree.paths.next_id().0;
	let mut adhoc: HashMap<SkillId, PathId> = HashMap::new();
	for skill in tree.skills.iter().filter(|s| s.path.is_none_or(|p| !tree.paths.contains(p))) {
		adhoc.insert(skill.id, PathId(next_path));
		next_path = next_path.saturating_add(1);
	}

	for path in tree.paths.iter() {
		out.serialize(Row {
			kind: PATH_ROW.into(),
			id: path.id.to_string(),
			path_color: path.color.to_string(),
			..Row::default()
		})?;
	}
	for skill in tree.skills.iter() {
		if let Some(&path) = adhoc.get(&skill.id) {
			out.serialize(Row {
				kind: PATH_ROW.into(),
				id: path.to_string(),
				path_color: PATH_COLORS[path.0 as usize % PATH_COLORS.len()].to_string(),
				..Row::default()
			})?;
		}
	}

	for skill in tree.skills.iter() {
		let path = adhoc.get(&skill.id).copied().or(skill.path);
		out.serialize(Row {
			kind: SKILL_ROW.into(),
			id: skill.id.to_string(),
			name: skill.label.clone(),
			x: format!("{:.3}", skill.position.x),
			y: format!("{:.3}", skill.position.y),
			radius: skill.radius.to_string(),
			path_id: path.map(|p| p.to_string()).unwrap_or_default(),
			..Row::default()
		})?;
	}

	for edge in tree.connections.iter() {
		out.serialize(Row {
			kind: EDGE_ROW.into(),
			edge_from: edge.a.to_string(),
			edge_to: edge.b.to_string(),
			..Row::default()
		})?;
	}

	out.flush()?;
	Ok(())
}

/// The tree as CSV text.
pub fn to_csv_string(tree: &SkillTree) -> Result<String> {
	let mut buf = Vec::new();
	write_to(tree, &mut buf)?;
	Ok(String::from_utf8(buf)?)
}

/// Saves the tree to `path`.
pub fn save(tree: &SkillTree, path: impl AsRef<FsPath>) -> Result<()> {
	let path = path.as_ref();
	let file = File::create(path)?;
	write_to(tree, BufWriter::new(file))?;
	info!(
		"saved {} skills, {} paths, {} connections to {}",
		tree.skills.len(),
		tree.paths.len(),
		tree.connections.len(),
		path.display()
	);
	Ok(())
}

/// Loads a tree from `path` with the default configuration.
pub fn load(path: impl AsRef<FsPath>) -> Result<SkillTree> {
	load_with(path, TreeConfig::default())
}

/// Loads a tree from `path`.
pub fn load_with(path: impl AsRef<FsPath>, config: TreeConfig) -> Result<SkillTree> {
	let path = path.as_ref();
	let tree = read_from(BufReader::new(File::open(path)?), config)?;
	info!("loaded {}", path.display());
	Ok(tree)
}

/// Parses CSV text.
pub fn from_csv_str(text: &str, config: TreeConfig) -> Result<SkillTree> {
	read_from(text.as_bytes(), config)
}

/// Reads a tree. Only I/O failures are errors; bad records are skipped and
/// bad fields defaulted, with a warning each.
pub fn read_from<R: io::Read>(reader: R, config: TreeConfig) -> Result<SkillTree> {
	let mut input = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
	let headers = input.headers()?.clone();
	let mut rows = Vec::new();
	for record in input.records() {
		let mut record = match record {
			Ok(record) => record,
			Err(err) if err.is_io_error() => return Err(err.into()),
			Err(err) => {
				warn!("skipping unreadable record: {err}");
				continue;
			}
		};
		// Trailing empty cells may be left off.
		record.truncate(headers.len());
		while record.len() < headers.len() {
			record.push_field("");
		}
		match record.deserialize::<Row>(Some(&headers)) {
			Ok(row) => rows.push(row),
			Err(err) => warn!("skipping unreadable record: {err}"),
		}
	}

	let mut skills = SkillRegistry::new();
	let mut paths = PathRegistry::new(config.palette_seed);
	let mut connections = Connections::new();
	let measure = MonospaceMeasure::default();

	let mut file_paths = Vec::new();
	for row in rows.iter().filter(|r| r.kind == PATH_ROW) {
		let Some(id) = parse_field(&row.id).map(PathId) else {
			warn!("path row without a usable id: {:?}", row.id);
			continue;
		};
		let color = Color::parse_triplet(&row.path_color);
		if color.is_none() && !row.path_color.is_empty() {
			warn!("path {id}: bad color {:?}, picking a new one", row.path_color);
		}
		if paths.insert_with_id(id, color) {
			file_paths.push(id);
		} else {
			warn!("path {id} is a duplicate or out of range, ignored");
		}
	}

	for row in rows.iter().filter(|r| r.kind == SKILL_ROW) {
		read_skill(row, &mut skills, &mut paths, &measure);
	}

	for row in rows.iter().filter(|r| r.kind == EDGE_ROW) {
		let ends = (parse_field(&row.edge_from).map(SkillId), parse_field(&row.edge_to).map(SkillId));
		match ends {
			(Some(a), Some(b)) if skills.contains(a) && skills.contains(b) => {
				if !connections.insert(a, b) {
					debug!("edge {a}-{b} is a loop or a duplicate, dropped");
				}
			}
			_ => warn!("dropping edge {:?}-{:?}", row.edge_from, row.edge_to),
		}
	}

	for row in rows.iter().filter(|r| ![PATH_ROW, SKILL_ROW, EDGE_ROW].contains(&r.kind.as_str())) {
		warn!("unknown row type {:?} ignored", row.kind);
	}

	repair_membership(&mut skills, &mut paths, &connections, &file_paths);

	info!(
		"read {} skills, {} paths, {} connections",
		skills.len(),
		paths.len(),
		connections.len()
	);
	Ok(SkillTree::from_parts(skills, paths, connections, config))
}

fn read_skill(row: &Row, skills: &mut SkillRegistry, paths: &mut PathRegistry, measure: &dyn LabelMeasure) {
	let Some(id) = parse_field(&row.id).map(SkillId) else {
		warn!("skill row without a usable id: {:?}", row.id);
		return;
	};
	let coord = |field: &str, axis: &str| {
		parse_field::<f64>(field).filter(|v| v.is_finite()).unwrap_or_else(|| {
			warn!("skill {id}: bad {axis} {field:?}, using 0");
			0.0
		})
	};
	let position = Vec2::new(coord(&row.x, "x"), coord(&row.y, "y"));
	let radius = parse_field::<f64>(&row.radius)
		.filter(|r| r.is_finite() && *r > 0.0)
		.unwrap_or_else(|| label_radius(&row.name, measure));

	if !skills.insert_with_id(id, position, row.name.clone(), radius) {
		warn!("skill {id} is a duplicate or out of range, ignored");
		return;
	}
	match parse_field(&row.path_id).map(PathId) {
		Some(path) if paths.contains(path) => {
			paths.add_skill(path, id, skills);
		}
		_ => debug!("skill {id}: path {:?} not declared, left for repair", row.path_id),
	}
}

/// Gives every skill a path after a raw load.
///
/// Paths flow along connections first; components still without one take
/// the declared paths that came in empty, in file order, and then fresh
/// ones. Last, paths bridged by a connection are merged, paths that are not
/// connected are split, and empty paths are dropped.
fn repair_membership(
	skills: &mut SkillRegistry,
	paths: &mut PathRegistry,
	connections: &Connections,
	file_paths: &[PathId],
) {
	fn path_of(skills: &SkillRegistry, id: SkillId) -> Option<PathId> {
		skills.get(id).and_then(|s| s.path)
	}

	let mut changed = true;
	while changed {
		changed = false;
		for edge in connections.iter() {
			match (path_of(skills, edge.a), path_of(skills, edge.b)) {
				(Some(p), None) => changed |= paths.add_skill(p, edge.b, skills),
				(None, Some(p)) => changed |= paths.add_skill(p, edge.a, skills),
				_ => {}
			}
		}
	}

	let mut unused: VecDeque<PathId> = file_paths
		.iter()
		.copied()
		.filter(|&p| paths.get(p).is_some_and(|p| p.is_empty()))
		.collect();
	let mut seen = HashSet::new();
	for start in skills.ids() {
		if seen.contains(&start) || path_of(skills, start).is_some() {
			continue;
		}
		let component = connectivity::reachable(start, connections, &mut seen, |_| true);
		let path = unused.pop_front().unwrap_or_else(|| paths.create(None));
		debug!("ungrouped component of {} skills placed in path {path}", component.len());
		for skill in component {
			paths.add_skill(path, skill, skills);
		}
	}

	for edge in connections.iter() {
		if let (Some(pa), Some(pb)) = (path_of(skills, edge.a), path_of(skills, edge.b)) {
			if pa != pb {
				warn!("paths {pa} and {pb} share a connection, merging");
				paths.merge(pa, pb, skills);
				paths.discard(pb, skills);
			}
		}
	}
	for path in paths.ids() {
		connectivity::repair(path, connections, paths, skills);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const HEADER: &str = "type,id,name,x,y,radius,path_id,path_color,edge_from,edge_to\n";

	fn load_str(body: &str) -> SkillTree {
		match from_csv_str(&format!("{HEADER}{body}"), TreeConfig::default()) {
			Ok(tree) => tree,
			Err(err) => panic!("load failed: {err}"),
		}
	}

	#[test]
	fn writes_the_fixed_header_and_row_shapes() {
		let mut tree = SkillTree::default();
		let a = tree.create_skill(Vec2::new(1.0, 2.5), "Fire");
		let b = tree.create_skill(Vec2::new(-3.25, 0.0), "Ice, cold");
		tree.connect(a, b);
		let Ok(text) = to_csv_string(&tree) else {
			panic!("write failed");
		};
		let lines: Vec<_> = text.lines().collect();
		assert_eq!(lines[0], HEADER.trim_end());
		let color = tree.path(PathId(0)).map(|p| p.color.to_string()).unwrap_or_default();
		assert_eq!(lines[1], format!("path,0,,,,,,{color},,"));
		assert_eq!(lines[2], "skill,0,Fire,1.000,2.500,30,0,,,");
		assert_eq!(lines[3], "skill,1,\"Ice, cold\",-3.250,0.000,30,0,,,");
		assert_eq!(lines[4], "edge,,,,,,,,0,1");
		assert_eq!(lines.len(), 5);
	}

	#[test]
	fn ungrouped_skills_get_an_adhoc_path_on_export() {
		let mut tree = SkillTree::default();
		let a = tree.create_skill(Vec2::ZERO, "A");
		let Some(p) = tree.path_of(a) else {
			panic!("new skill ungrouped");
		};
		tree.paths.remove_skill(p, a, &mut tree.skills);
		tree.paths.discard(p, &mut tree.skills);

		let Ok(text) = to_csv_string(&tree) else {
			panic!("write failed");
		};
		let lines: Vec<_> = text.lines().collect();
		assert_eq!(lines[1], format!("path,1,,,,,,{},,", PATH_COLORS[1]));
		assert_eq!(lines[2], "skill,0,A,0.000,0.000,30,1,,,");
		assert_eq!(tree.path_of(a), None);

		let reloaded = load_str(&lines[1..].join("\n"));
		assert_eq!(reloaded.path_of(a), Some(PathId(1)));
		assert_eq!(reloaded.path(PathId(1)).map(|p| p.color), Some(PATH_COLORS[1]));
	}

	#[test]
	fn restores_ids_colors_and_counters() {
		let tree = load_str(
			"path,4,,,,,,1;2;3,,\n\
			 skill,7,A,1.5,2,33,4,,,\n\
			 skill,9,B,0,0,30,4,,,\n\
			 edge,,,,,,,,7,9\n",
		);
		assert_eq!(tree.path(PathId(4)).map(|p| p.color), Some(Color::rgb(1, 2, 3)));
		assert_eq!(tree.path_of(SkillId(7)), Some(PathId(4)));
		assert_eq!(tree.path_of(SkillId(9)), Some(PathId(4)));
		assert_eq!(tree.skill(SkillId(7)).map(|s| (s.position, s.radius)), Some((Vec2::new(1.5, 2.0), 33.0)));
		assert_eq!(tree.skills().next_id(), SkillId(10));
		assert_eq!(tree.paths().next_id(), PathId(5));
		assert!(tree.connections().contains(SkillId(9), SkillId(7)));
	}

	#[test]
	fn bad_color_falls_back_to_palette() {
		let tree = load_str("path,0,,,,,,red;green,,\nskill,0,A,0,0,30,0,,,\n");
		let color = tree.path(PathId(0)).map(|p| p.color);
		assert!(color.is_some_and(|c| PATH_COLORS.contains(&c)));
	}

	#[test]
	fn undeclared_path_is_repaired() {
		let tree = load_str("skill,0,A,0,0,30,12,,,\n");
		let path = tree.path_of(SkillId(0));
		assert!(path.is_some());
		assert_eq!(path.and_then(|p| tree.path(p)).map(|p| p.len()), Some(1));
	}

	#[test]
	fn membership_flows_along_edges() {
		let tree = load_str(
			"path,0,,,,,,1;1;1,,\n\
			 skill,0,A,0,0,30,0,,,\n\
			 skill,1,B,0,0,30,,,,\n\
			 skill,2,C,0,0,30,,,,\n\
			 edge,,,,,,,,0,1\n\
			 edge,,,,,,,,2,1\n",
		);
		for id in 0..3 {
			assert_eq!(tree.path_of(SkillId(id)), Some(PathId(0)));
		}
		assert_eq!(tree.paths().len(), 1);
	}

	#[test]
	fn ungrouped_components_reuse_empty_declared_paths_in_file_order() {
		let tree = load_str(
			"path,5,,,,,,9;9;9,,\n\
			 path,2,,,,,,8;8;8,,\n\
			 skill,0,A,0,0,30,,,,\n\
			 skill,1,B,0,0,30,,,,\n\
			 skill,2,C,0,0,30,,,,\n\
			 skill,3,D,0,0,30,,,,\n\
			 edge,,,,,,,,0,1\n",
		);
		assert_eq!(tree.path_of(SkillId(0)), Some(PathId(5)));
		assert_eq!(tree.path_of(SkillId(1)), Some(PathId(5)));
		assert_eq!(tree.path_of(SkillId(2)), Some(PathId(2)));
		assert_eq!(tree.path(PathId(2)).map(|p| p.color), Some(Color::rgb(8, 8, 8)));
		let fresh = tree.path_of(SkillId(3));
		assert!(fresh.is_some_and(|p| p.0 >= 6));
		assert_eq!(tree.paths().len(), 3);
	}

	#[test]
	fn dangling_and_garbage_rows_are_dropped() {
		let tree = load_str(
			"skill,0,A,oops,,,,,,\n\
			 skill,zero,B,0,0,30,,,,\n\
			 edge,,,,,,,,0,77\n\
			 edge,,,,,,,,0,0\n\
			 node,1,,,,,,,,\n",
		);
		assert_eq!(tree.skills().len(), 1);
		assert!(tree.connections().is_empty());
		assert_eq!(tree.skill(SkillId(0)).map(|s| (s.position, s.radius)), Some((Vec2::ZERO, 30.0)));
	}

	#[test]
	fn inconsistent_paths_are_normalised() {
		let tree = load_str(
			"path,0,,,,,,1;1;1,,\n\
			 path,1,,,,,,2;2;2,,\n\
			 skill,0,A,0,0,30,0,,,\n\
			 skill,1,B,0,0,30,1,,,\n\
			 skill,2,C,0,0,30,0,,,\n\
			 edge,,,,,,,,0,1\n",
		);
		assert_eq!(tree.path_of(SkillId(0)), tree.path_of(SkillId(1)));
		assert_ne!(tree.path_of(SkillId(0)), tree.path_of(SkillId(2)));
		assert_eq!(tree.paths().len(), 2);
	}

	#[test]
	fn short_rows_are_accepted() {
		let tree = load_str("path,0\nskill,0,A,1,1,30,0\nskill,1,B\nedge,,,,,,,,0,1\n");
		assert_eq!(tree.skills().len(), 2);
		assert_eq!(tree.path_of(SkillId(0)), Some(PathId(0)));
		assert_eq!(tree.path_of(SkillId(1)), Some(PathId(0)));
		assert_eq!(tree.skill(SkillId(0)).map(|s| (s.position, s.radius)), Some((Vec2::new(1.0, 1.0), 30.0)));
		assert_eq!(tree.skill(SkillId(1)).map(|s| s.position), Some(Vec2::ZERO));
	}

	#[test]
	fn long_rows_keep_the_known_columns() {
		let tree = load_str("skill,0,A,2,3,30,,,,,extra,cells\n");
		assert_eq!(tree.skill(SkillId(0)).map(|s| s.position), Some(Vec2::new(2.0, 3.0)));
	}

	#[test]
	fn largest_ids_are_rejected_without_overflow() {
		let tree = load_str(
			"path,4294967295,,,,,,1;1;1,,\n\
			 skill,4294967295,Max,0,0,30,,,,\n\
			 skill,4294967294,Near,0,0,30,4294967295,,,\n",
		);
		assert_eq!(tree.skills().len(), 1);
		assert!(tree.skill(SkillId(u32::MAX)).is_none());
		assert_eq!(tree.skills().next_id(), SkillId(u32::MAX));
		assert!(!tree.paths().contains(PathId(u32::MAX)));
		let path = tree.path_of(SkillId(u32::MAX - 1));
		assert_eq!(path, Some(PathId(0)));
		assert!(to_csv_string(&tree).is_ok());
	}
}
