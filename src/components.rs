/*!
Data-only components attached to scene entities:
- every node: Transform + Sortable + Visible + Meta
- drawable shapes additionally: Geometry + Renderable + Cullable
- instances: Instance
- nodes under animation: Animator
*/

pub mod renderable;
pub mod transform;

pub use renderable::{CullStrategy, Cullable, Geometry, Renderable, ShapeType};
pub use transform::Transform;

pub use crate::animation::{Animator, AnimatorStatus};
use crate::ecs::Entity;

/// Sort key among siblings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sortable {
	pub(crate) z_index: i32,
}

impl Sortable {
	pub fn z_index(&self) -> i32 {
		self.z_index
	}
}

/// The node's own visibility flag. Effective visibility also depends on every ancestor.
#[derive(Clone, Copy, Debug)]
pub struct Visible {
	pub(crate) visible: bool,
}

impl Default for Visible {
	fn default() -> Self {
		Self { visible: true }
	}
}

impl Visible {
	pub fn is_visible(&self) -> bool {
		self.visible
	}
}

/// User-facing identification used by the find helpers.
#[derive(Clone, Debug, Default)]
pub struct Meta {
	pub id: Option<String>,
	pub name: Option<String>,
	pub class_name: Option<String>,
}

/// Marks an instanced copy sharing the geometry of `source`.
#[derive(Clone, Copy, Debug)]
pub struct Instance {
	pub(crate) source: Entity,
}

impl Instance {
	pub fn source(&self) -> Entity {
		self.source
	}
}
