use glam::Vec3;

use super::{Scene, SceneError, SceneResult};
use crate::aabb::update_local_aabb;
use crate::attrs::{Attributes, AttrsExt};
use crate::components::{Cullable, Geometry, Meta, Renderable, ShapeType, Sortable, Transform, Visible};
use crate::ecs::Entity;

/// Creation options of a group or a shape.
#[derive(Clone, Debug)]
pub struct NodeConfig {
	pub shape_type: Option<ShapeType>,
	pub id: Option<String>,
	pub name: Option<String>,
	pub class_name: Option<String>,
	pub z_index: i32,
	pub visible: bool,
	pub attrs: Attributes,
}

impl Default for NodeConfig {
	fn default() -> Self {
		Self {
			shape_type: None,
			id: None,
			name: None,
			class_name: None,
			z_index: 0,
			visible: true,
			attrs: Attributes::new(),
		}
	}
}

impl NodeConfig {
	pub fn group() -> Self {
		Self::default()
	}

	pub fn shape(shape_type: impl Into<ShapeType>) -> Self {
		Self {
			shape_type: Some(shape_type.into()),
			..Default::default()
		}
	}

	pub fn attrs(mut self, attrs: Attributes) -> Self {
		self.attrs.extend(attrs);
		self
	}

	pub fn id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
		self.class_name = Some(class_name.into());
		self
	}

	pub fn z_index(mut self, z_index: i32) -> Self {
		self.z_index = z_index;
		self
	}

	pub fn visible(mut self, visible: bool) -> Self {
		self.visible = visible;
		self
	}
}

impl Scene {
	/// Entity with the components every node carries. It starts as an unattached root.
	fn spawn_node(&mut self, config: &NodeConfig) -> Entity {
		let entity = self.world.spawn();

		let position = Vec3::new(
			config.attrs.number_or("x", 0.),
			config.attrs.number_or("y", 0.),
			config.attrs.number_or("z", 0.),
		);
		let mut transform = Transform::default();
		transform.local_position = position;
		transform.local_dirty = true;
		transform.dirty = true;

		self.world.add(entity, transform);
		self.world.add(entity, Sortable { z_index: config.z_index });
		self.world.add(entity, Visible { visible: config.visible });
		self.world.add(
			entity,
			Meta {
				id: config.id.clone(),
				name: config.name.clone(),
				class_name: config.class_name.clone(),
			},
		);
		self.graph.insert(entity);
		entity
	}

	pub fn spawn_group(&mut self, config: NodeConfig) -> Entity {
		self.spawn_node(&config)
	}

	pub fn spawn_shape(&mut self, config: NodeConfig) -> SceneResult<Entity> {
		let shape_type = config.shape_type.clone().ok_or(SceneError::MissingShapeType)?;
		let entity = self.spawn_node(&config);

		self.world.add(
			entity,
			Geometry {
				aabb: update_local_aabb(&shape_type, &config.attrs),
			},
		);
		self.world.add(entity, Renderable::new(shape_type, config.attrs));
		self.world.add(entity, Cullable::default());
		Ok(entity)
	}
}

#[cfg(test)]
mod tests {
	use glam::vec3;

	use super::*;
	use crate::attrs;

	#[test]
	fn shape_gets_drawable_components() {
		let mut scene = Scene::new();
		let group = scene.spawn_group(NodeConfig::group().name("layer"));
		let circle = scene
			.spawn_shape(NodeConfig::shape("circle").attrs(attrs! { "x" => 10., "y" => 20., "r" => 5. }))
			.unwrap();

		assert!(scene.world.has::<Transform>(group));
		assert!(!scene.world.has::<Renderable>(group));
		assert!(!scene.world.has::<Geometry>(group));

		assert!(scene.world.has::<Cullable>(circle));
		assert_eq!(scene.renderable(circle).unwrap().shape_type(), &ShapeType::Circle);
		assert!(scene.renderable(circle).unwrap().is_aabb_dirty());
		assert_eq!(scene.get_local_position(circle), vec3(10., 20., 0.));
		assert_eq!(scene.meta(group).unwrap().name.as_deref(), Some("layer"));
	}

	#[test]
	fn shape_without_type() {
		let mut scene = Scene::new();
		assert_eq!(scene.spawn_shape(NodeConfig::group()), Err(SceneError::MissingShapeType));
		assert!(scene.world.is_empty());
	}
}
