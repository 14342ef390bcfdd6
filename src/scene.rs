pub mod bounds;
pub mod factory;
pub mod graph;
mod hierarchy;
mod transforms;

use std::fmt;

use crate::aabb::SpatialIndex;
use crate::attrs::AttrValue;
use crate::components::{Meta, Renderable, Transform};
use crate::ecs::{Entity, World};
use crate::math::Aabb;

pub use bounds::DirtyRegion;
pub use factory::NodeConfig;
pub use graph::SceneGraph;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
	#[error("Entity {0} does not exist or was destroyed")]
	UnknownEntity(Entity),
	#[error("Attaching {child} under {parent} would create a cycle")]
	Cycle { child: Entity, parent: Entity },
	#[error("Shape config has no shape type")]
	MissingShapeType,
	#[error("Entity {0} is not a shape")]
	NotAShape(Entity),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// An attribute write waiting to be seen by the render backend.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeChange {
	pub entity: Entity,
	pub name: String,
	pub value: AttrValue,
}

/// Live scene: component storage, the node hierarchy and the spatial index of world bounds.
///
/// All mutation goes through methods of this type so dirty flags, the sort memo and the
/// spatial index stay consistent.
pub struct Scene {
	pub(crate) world: World,
	pub(crate) graph: SceneGraph,
	pub(crate) spatial_index: SpatialIndex,
	pub(crate) attribute_changes: Vec<AttributeChange>,
	/// Screen areas left by shapes removed from the drawn tree, still to be repainted.
	pub(crate) vacated: Vec<Aabb>,
	/// Timestamp of the latest animation update, in milliseconds.
	pub(crate) clock: f64,
}

impl Scene {
	pub fn new() -> Self {
		Self {
			world: World::new(),
			graph: SceneGraph::new(),
			spatial_index: SpatialIndex::new(),
			attribute_changes: Vec::new(),
			vacated: Vec::new(),
			clock: 0.,
		}
	}

	pub fn world(&self) -> &World {
		&self.world
	}

	pub fn graph(&self) -> &SceneGraph {
		&self.graph
	}

	pub fn spatial_index(&self) -> &SpatialIndex {
		&self.spatial_index
	}

	pub fn clock(&self) -> f64 {
		self.clock
	}

	pub fn contains(&self, entity: Entity) -> bool {
		self.world.is_alive(entity)
	}

	pub(crate) fn ensure_alive(&self, entity: Entity) -> SceneResult<()> {
		if self.world.is_alive(entity) {
			Ok(())
		} else {
			Err(SceneError::UnknownEntity(entity))
		}
	}

	pub(crate) fn transform(&self, entity: Entity) -> &Transform {
		self.world
			.get::<Transform>(entity)
			.unwrap_or_else(|| panic!("Entity {entity} has no Transform."))
	}

	pub(crate) fn transform_mut(&mut self, entity: Entity) -> &mut Transform {
		self.world
			.get_mut::<Transform>(entity)
			.unwrap_or_else(|| panic!("Entity {entity} has no Transform."))
	}

	pub fn renderable(&self, entity: Entity) -> Option<&Renderable> {
		self.world.get::<Renderable>(entity)
	}

	pub(crate) fn renderable_mut(&mut self, entity: Entity) -> Option<&mut Renderable> {
		self.world.get_mut::<Renderable>(entity)
	}

	pub fn meta(&self, entity: Entity) -> Option<&Meta> {
		self.world.get::<Meta>(entity)
	}

	/// Drains the attribute writes queued since the last call.
	pub fn take_attribute_changes(&mut self) -> Vec<AttributeChange> {
		std::mem::take(&mut self.attribute_changes)
	}

	fn label(&self, entity: Entity) -> (String, String) {
		let type_name = match self.renderable(entity) {
			Some(renderable) => renderable.shape_type.to_string(),
			None => "group".to_owned(),
		};
		let name = self
			.meta(entity)
			.and_then(|meta| meta.name.clone())
			.or_else(|| self.world.name(entity).map(str::to_owned))
			.unwrap_or_default();
		(type_name, name)
	}
}

impl Default for Scene {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for Scene {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.graph.roots().is_empty() {
			return write!(f, "(empty)");
		}

		self.graph.fmt_tree(f, |f, indent, entity| {
			let (type_name, name) = self.label(entity);
			#[cfg(feature = "owo")]
			let type_name = {
				use owo_colors::OwoColorize;
				type_name.magenta().to_string()
			};

			writeln!(f, "{}- [{}] {}", "  ".repeat(indent), type_name, name)
		})
	}
}
