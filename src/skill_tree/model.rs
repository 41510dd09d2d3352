use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub};

/// Smallest radius a skill circle can have, whatever its label.
pub const MIN_RADIUS: f64 = 30.0;

/// Colors handed out to new paths.
pub const PATH_COLORS: &[Color] = &[
	Color::rgb(30, 144, 255),
	Color::rgb(50, 205, 50),
	Color::rgb(255, 99, 71),
	Color::rgb(147, 112, 219),
	Color::rgb(255, 140, 0),
	Color::rgb(0, 139, 139),
	Color::rgb(218, 165, 32),
	Color::rgb(255, 20, 147),
	Color::rgb(72, 61, 139),
	Color::rgb(0, 100, 0),
];

/// Stable identifier of a skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkillId(pub u32);

/// Stable identifier of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(pub u32);

impl fmt::Display for SkillId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl fmt::Display for PathId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// An opaque RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
}

impl Color {
	/// Builds a color from its channels.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses the `r;g;b` form used by the file format. Anything other than
	/// exactly three 8-bit integers is rejected.
	pub fn parse_triplet(s: &str) -> Option<Self> {
		let mut parts = s.split(';').map(|p| p.trim().parse::<u8>());
		let (r, g, b) = (parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?);
		if parts.next().is_some() {
			return None;
		}
		Some(Self { r, g, b })
	}

	/// CSS form for the canvas.
	pub fn css(&self) -> String {
		format!("rgb({}, {}, {})", self.r, self.g, self.b)
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{};{};{}", self.r, self.g, self.b)
	}
}

/// A 2D vector in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
	/// Horizontal component.
	pub x: f64,
	/// Vertical component, growing downwards.
	pub y: f64,
}

impl Vec2 {
	/// The zero vector.
	pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

	/// Builds a vector.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Squared length.
	pub fn length_sq(self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	/// Length.
	pub fn length(self) -> f64 {
		self.length_sq().sqrt()
	}
}

impl Add for Vec2 {
	type Output = Self;
	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl AddAssign for Vec2 {
	fn add_assign(&mut self, rhs: Self) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl Sub for Vec2 {
	type Output = Self;
	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Neg for Vec2 {
	type Output = Self;
	fn neg(self) -> Self {
		Self::new(-self.x, -self.y)
	}
}

impl Mul<f64> for Vec2 {
	type Output = Self;
	fn mul(self, k: f64) -> Self {
		Self::new(self.x * k, self.y * k)
	}
}

impl MulAssign<f64> for Vec2 {
	fn mul_assign(&mut self, k: f64) {
		self.x *= k;
		self.y *= k;
	}
}

/// A labeled node of the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Skill {
	/// Stable id, never reused.
	pub id: SkillId,
	/// Display text; may be empty.
	pub label: String,
	/// Center in world space.
	pub position: Vec2,
	/// Units per second.
	pub velocity: Vec2,
	/// Circle radius, at least [`MIN_RADIUS`].
	pub radius: f64,
	/// Owning path. Only changed through the path registry.
	pub path: Option<PathId>,
	/// Held by the pointer; the integrator leaves the position alone.
	pub dragging: bool,
}

impl Skill {
	pub(crate) fn new(id: SkillId, position: Vec2, label: String, radius: f64) -> Self {
		Self {
			id,
			label,
			position,
			velocity: Vec2::ZERO,
			radius,
			path: None,
			dragging: false,
		}
	}
}

/// A colored group of skills, meant to equal one connected component.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
	/// Stable id, never reused.
	pub id: PathId,
	/// Fill of every member.
	pub color: Color,
	pub(crate) members: Vec<SkillId>,
}

impl Path {
	pub(crate) fn new(id: PathId, color: Color) -> Self {
		Self {
			id,
			color,
			members: Vec::new(),
		}
	}

	/// Members in insertion order.
	pub fn members(&self) -> &[SkillId] {
		&self.members
	}

	/// Whether `skill` is a member.
	pub fn contains(&self, skill: SkillId) -> bool {
		self.members.contains(&skill)
	}

	/// Whether the path has no members.
	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	/// Number of members.
	pub fn len(&self) -> usize {
		self.members.len()
	}
}

/// An undirected edge. `(a, b)` and `(b, a)` are the same connection.
#[derive(Clone, Copy, Debug, Eq)]
pub struct Connection {
	/// One endpoint.
	pub a: SkillId,
	/// The other endpoint.
	pub b: SkillId,
}

impl Connection {
	/// The edge between `a` and `b`.
	pub fn new(a: SkillId, b: SkillId) -> Self {
		Self { a, b }
	}

	/// Whether `skill` is an endpoint.
	pub fn touches(&self, skill: SkillId) -> bool {
		self.a == skill || self.b == skill
	}

	/// The endpoint opposite to `skill`, if `skill` is an endpoint.
	pub fn other(&self, skill: SkillId) -> Option<SkillId> {
		if self.a == skill {
			Some(self.b)
		} else if self.b == skill {
			Some(self.a)
		} else {
			None
		}
	}
}

impl PartialEq for Connection {
	fn eq(&self, other: &Self) -> bool {
		(self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
	}
}

/// Text metrics used to size a skill circle around its label.
pub trait LabelMeasure {
	/// Rendered width of `text`.
	fn text_width(&self, text: &str) -> f64;
	/// Height of one rendered line.
	fn line_height(&self) -> f64;
}

/// Fixed-advance estimate of a small sans-serif font.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMeasure {
	/// Advance of every character.
	pub char_width: f64,
	/// Height of one line.
	pub line_height: f64,
}

impl Default for MonospaceMeasure {
	fn default() -> Self {
		Self {
			char_width: 8.0,
			line_height: 14.0,
		}
	}
}

impl LabelMeasure for MonospaceMeasure {
	fn text_width(&self, text: &str) -> f64 {
		text.chars().count() as f64 * self.char_width
	}

	fn line_height(&self) -> f64 {
		self.line_height
	}
}

/// Breaks `label` into lines no wider than `max_width`. A word longer than
/// the limit still gets a line of its own.
pub fn wrap_label(label: &str, measure: &dyn LabelMeasure, max_width: f64) -> Vec<String> {
	let mut lines = Vec::new();
	let mut current = String::new();
	for word in label.split(' ') {
		let candidate = if current.is_empty() {
			word.to_string()
		} else {
			format!("{current} {word}")
		};
		if current.is_empty() || measure.text_width(&candidate) < max_width {
			current = candidate;
		} else {
			lines.push(std::mem::replace(&mut current, word.to_string()));
		}
	}
	lines.push(current);
	lines
}

/// Radius that fits `label` once wrapped at the minimum circle's width.
pub fn label_radius(label: &str, measure: &dyn LabelMeasure) -> f64 {
	let lines = wrap_label(label, measure, MIN_RADIUS * 1.8);
	let widest = lines
		.iter()
		.map(|l| measure.text_width(l))
		.fold(0.0, f64::max);
	let by_width = (widest / 2.0 + 10.0).floor();
	let by_height = (lines.len() as f64 * measure.line_height() / 2.0 + 10.0).floor();
	MIN_RADIUS.max(by_width).max(by_height)
}
