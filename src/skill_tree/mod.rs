//! Skills, paths and connections: the editable graph behind the canvas.
//!
//! The canvas only issues commands on [`SkillTree`] and reads back a
//! [`Snapshot`]; everything here is plain data and runs without a DOM.

pub mod codec;
pub mod connectivity;
mod error;
pub mod layout;
mod model;
mod registry;
mod tree;

pub use error::{Result, SkillTreeError};
pub use layout::LayoutParams;
pub use model::{
	Color, Connection, LabelMeasure, MIN_RADIUS, MonospaceMeasure, PATH_COLORS, Path, PathId, Skill, SkillId,
	Vec2, label_radius, wrap_label,
};
pub use registry::{Connections, PathRegistry, SkillRegistry};
pub use tree::{EdgeView, SkillTree, SkillView, Snapshot, TreeConfig};
