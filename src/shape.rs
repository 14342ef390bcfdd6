use std::ops::{Deref, DerefMut};

use crate::animation::{AnimationConfig, AnimatorStatus};
use crate::attrs::{AttrValue, Attributes};
use crate::components::ShapeType;
use crate::ecs::Entity;
use crate::group::Group;
use crate::scene::{Scene, SceneError, SceneResult};

/// Borrowed view of a drawable node. Every [`Group`] operation is available through `Deref`.
pub struct Shape<'a>(Group<'a>);

impl<'a> Shape<'a> {
	/// Fails with [`SceneError::NotAShape`] for group entities.
	pub fn new(scene: &'a mut Scene, entity: Entity) -> SceneResult<Self> {
		let group = Group::new(scene, entity)?;
		if group.scene.renderable(entity).is_none() {
			return Err(SceneError::NotAShape(entity));
		}
		Ok(Self(group))
	}

	pub fn shape_type(&self) -> &ShapeType {
		self.renderable_attrs().0
	}

	pub fn attr(&self, name: &str) -> Option<&AttrValue> {
		self.renderable_attrs().1.get(name)
	}

	pub fn attrs(&self) -> &Attributes {
		self.renderable_attrs().1
	}

	fn renderable_attrs(&self) -> (&ShapeType, &Attributes) {
		let renderable = self
			.scene
			.renderable(self.entity)
			.unwrap_or_else(|| panic!("Entity {} has no Renderable.", self.entity));
		(renderable.shape_type(), renderable.attrs())
	}

	pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) -> SceneResult<&mut Self> {
		self.0.scene.set_attribute(self.0.entity, name, value)?;
		Ok(self)
	}

	pub fn set_attrs(&mut self, attrs: Attributes) -> SceneResult<&mut Self> {
		self.0.scene.set_attributes(self.0.entity, attrs)?;
		Ok(self)
	}

	pub fn animate(&mut self, config: AnimationConfig) -> SceneResult<()> {
		self.0.scene.animate(self.0.entity, config)
	}

	pub fn stop_animation(&mut self, to_end: bool) {
		self.0.scene.stop_animation(self.0.entity, to_end);
	}

	pub fn pause_animation(&mut self) {
		self.0.scene.pause_animation(self.0.entity);
	}

	pub fn resume_animation(&mut self) {
		self.0.scene.resume_animation(self.0.entity);
	}

	pub fn animation_status(&self) -> AnimatorStatus {
		self.scene.animation_status(self.entity)
	}

	/// Unattached copy of this shape, of its subtree too when `deep`.
	pub fn clone_node(&mut self, deep: bool) -> SceneResult<Entity> {
		self.0.scene.clone_node(self.0.entity, deep)
	}

	/// Instance sharing this shape's geometry, placed next to it. The source is hidden.
	pub fn create_instance(&mut self) -> SceneResult<Entity> {
		self.0.scene.create_instance(self.0.entity)
	}

	/// Clips this shape by the geometry of `clip`, or removes the clip with `None`.
	pub fn set_clip(&mut self, clip: Option<Entity>) -> SceneResult<&mut Self> {
		self.0.scene.set_clip(self.0.entity, clip)?;
		Ok(self)
	}

	pub fn get_clip(&self) -> Option<Entity> {
		self.scene.renderable(self.entity)?.clip_path()
	}
}

impl<'a> Deref for Shape<'a> {
	type Target = Group<'a>;

	fn deref(&self) -> &Group<'a> {
		&self.0
	}
}

impl<'a> DerefMut for Shape<'a> {
	fn deref_mut(&mut self) -> &mut Group<'a> {
		&mut self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attrs;
	use crate::scene::NodeConfig;

	#[test]
	fn attributes_through_the_view() {
		let mut scene = Scene::new();
		let circle = scene
			.spawn_shape(NodeConfig::shape("circle").attrs(attrs! { "r" => 10. }))
			.unwrap();
		let group = scene.spawn_group(NodeConfig::group());
		assert!(matches!(Shape::new(&mut scene, group), Err(SceneError::NotAShape(_))));

		let mut shape = Shape::new(&mut scene, circle).unwrap();
		shape.set_attr("fill", "red").unwrap().set_attr("r", 12.).unwrap();
		assert_eq!(shape.shape_type(), &ShapeType::Circle);
		assert_eq!(shape.attr("fill"), Some(&AttrValue::from("red")));
		assert_eq!(shape.attr("r").and_then(AttrValue::as_number), Some(12.));
		shape.hide();
		assert!(!shape.is_visible());
	}
}
