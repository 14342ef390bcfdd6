use glam::{Mat3, Quat, Vec2, Vec3};

use crate::ecs::Entity;
use crate::math::{mat3_to_mat4, Aabb};
use crate::scene::{Scene, SceneResult};

/// Borrowed view of one node of a [`Scene`], exposing the group operations.
///
/// Transform and visibility methods panic if the entity was destroyed.
pub struct Group<'a> {
	pub(crate) scene: &'a mut Scene,
	pub(crate) entity: Entity,
}

impl<'a> Group<'a> {
	pub fn new(scene: &'a mut Scene, entity: Entity) -> SceneResult<Self> {
		scene.ensure_alive(entity)?;
		Ok(Self { scene, entity })
	}

	pub fn entity(&self) -> Entity {
		self.entity
	}

	pub fn scene(&mut self) -> &mut Scene {
		self.scene
	}

	/// Appends `child`, keeping its local transform.
	pub fn add(&mut self, child: Entity) -> SceneResult<()> {
		self.scene.attach(child, self.entity, None, true)
	}

	/// Inserts `child` before the child currently at `index`.
	pub fn add_at(&mut self, child: Entity, index: usize) -> SceneResult<()> {
		self.scene.attach(child, self.entity, Some(index), true)
	}

	/// Unlinks `child` if it is a child of this group, destroying it when `destroy` is set.
	/// Returns whether `child` was removed.
	pub fn remove(&mut self, child: Entity, destroy: bool) -> SceneResult<bool> {
		if self.scene.graph.parent(child) != Some(self.entity) {
			return Ok(false);
		}
		if destroy {
			self.scene.destroy(child)?;
		} else {
			self.scene.detach(child)?;
		}
		Ok(true)
	}

	pub fn remove_children(&mut self, destroy: bool) -> SceneResult<()> {
		for child in self.get_children() {
			self.remove(child, destroy)?;
		}
		Ok(())
	}

	/// First descendant (depth-first, self excluded) matching `predicate`.
	pub fn find(&self, predicate: impl FnMut(&Scene, Entity) -> bool) -> Option<Entity> {
		self.scene.find(self.entity, predicate)
	}

	pub fn find_all(&self, predicate: impl FnMut(&Scene, Entity) -> bool) -> Vec<Entity> {
		self.scene.find_all(self.entity, predicate)
	}

	pub fn find_by_id(&self, id: &str) -> Option<Entity> {
		self.scene.find_by_id(self.entity, id)
	}

	pub fn find_by_class_name(&self, class_name: &str) -> Vec<Entity> {
		self.scene.find_by_class_name(self.entity, class_name)
	}

	pub fn get_parent(&self) -> Option<Entity> {
		self.scene.graph.parent(self.entity)
	}

	pub fn get_children(&self) -> Vec<Entity> {
		self.scene.graph.children(self.entity).collect()
	}

	pub fn get_first(&self) -> Option<Entity> {
		self.scene.graph.children(self.entity).next()
	}

	pub fn get_last(&self) -> Option<Entity> {
		self.scene.graph.children(self.entity).last()
	}

	pub fn get_child_by_index(&self, index: usize) -> Option<Entity> {
		self.scene.graph.children(self.entity).nth(index)
	}

	/// Places the node at a world-space position.
	pub fn move_to(&mut self, position: Vec3) -> &mut Self {
		self.scene.set_position(self.entity, position);
		self
	}

	/// Moves by `offset` in world space.
	pub fn translate(&mut self, offset: Vec3) -> &mut Self {
		self.scene.translate(self.entity, offset);
		self
	}

	/// Multiplies the local scale.
	pub fn scale(&mut self, factor: Vec3) -> &mut Self {
		self.scene.scale_local(self.entity, factor);
		self
	}

	/// Rotates about the local z axis, in radians.
	pub fn rotate(&mut self, angle: f32) -> &mut Self {
		self.scene.rotate_local(self.entity, Quat::from_rotation_z(angle));
		self
	}

	/// Rotates about `pivot`, given in the parent's space, in radians.
	pub fn rotate_at_point(&mut self, pivot: Vec2, angle: f32) -> &mut Self {
		let around = Mat3::from_translation(pivot) * Mat3::from_angle(angle) * Mat3::from_translation(-pivot);
		let local = mat3_to_mat4(around) * self.scene.get_local_transform(self.entity);
		self.scene.set_local_transform(self.entity, local);
		self
	}

	pub fn get_position(&mut self) -> Vec3 {
		self.scene.get_position(self.entity)
	}

	pub fn get_local_position(&self) -> Vec3 {
		self.scene.get_local_position(self.entity)
	}

	pub fn set_z_index(&mut self, z_index: i32) -> &mut Self {
		self.scene.set_z_index(self.entity, z_index);
		self
	}

	pub fn get_z_index(&self) -> i32 {
		self.scene.z_index(self.entity)
	}

	pub fn to_front(&mut self) -> &mut Self {
		self.scene.to_front(self.entity);
		self
	}

	pub fn to_back(&mut self) -> &mut Self {
		self.scene.to_back(self.entity);
		self
	}

	pub fn show(&mut self) -> &mut Self {
		self.scene.show(self.entity);
		self
	}

	pub fn hide(&mut self) -> &mut Self {
		self.scene.hide(self.entity);
		self
	}

	/// Effective visibility, hidden if any ancestor is.
	pub fn is_visible(&self) -> bool {
		self.scene.is_visible(self.entity)
	}

	/// Union of the world bounds of this node and its descendants.
	pub fn get_bounds(&mut self) -> Option<Aabb> {
		self.scene.get_bounds(self.entity)
	}
}

#[cfg(test)]
mod tests {
	use std::f32::consts::FRAC_PI_2;

	use glam::vec3;

	use super::*;
	use crate::attrs;
	use crate::math::assert_vec3_close;
	use crate::scene::NodeConfig;

	fn rect(scene: &mut Scene) -> Entity {
		scene
			.spawn_shape(NodeConfig::shape("rect").attrs(attrs! { "width" => 10., "height" => 10. }))
			.unwrap()
	}

	#[test]
	fn children_navigation() {
		let mut scene = Scene::new();
		let root = scene.spawn_group(NodeConfig::group());
		let a = rect(&mut scene);
		let b = rect(&mut scene);
		let c = rect(&mut scene);

		let mut group = Group::new(&mut scene, root).unwrap();
		group.add(a).unwrap();
		group.add(c).unwrap();
		group.add_at(b, 1).unwrap();

		assert_eq!(group.get_children(), vec![a, b, c]);
		assert_eq!(group.get_first(), Some(a));
		assert_eq!(group.get_last(), Some(c));
		assert_eq!(group.get_child_by_index(1), Some(b));
		assert_eq!(group.get_child_by_index(3), None);

		assert!(group.remove(b, false).unwrap());
		assert!(!group.remove(b, false).unwrap());
		group.remove_children(true).unwrap();
		assert!(group.get_children().is_empty());
		assert!(scene.contains(b));
		assert!(!scene.contains(a));
	}

	#[test]
	fn rotate_about_pivot() {
		let mut scene = Scene::new();
		let shape = rect(&mut scene);
		let mut group = Group::new(&mut scene, shape).unwrap();
		group.move_to(vec3(20., 0., 0.));
		group.rotate_at_point(Vec2::new(10., 0.), FRAC_PI_2);

		assert_vec3_close(group.get_position(), vec3(10., 10., 0.));
		let rotated = scene.get_local_rotation(shape) * Vec3::X;
		assert_vec3_close(rotated, Vec3::Y);
	}

	#[test]
	fn chained_transforms() {
		let mut scene = Scene::new();
		let shape = rect(&mut scene);
		Group::new(&mut scene, shape)
			.unwrap()
			.translate(vec3(5., 5., 0.))
			.scale(vec3(2., 2., 1.))
			.set_z_index(4);

		assert_vec3_close(scene.get_position(shape), vec3(5., 5., 0.));
		assert_vec3_close(scene.get_local_scale(shape), vec3(2., 2., 1.));
		assert_eq!(scene.z_index(shape), 4);
	}
}
