use glam::{Mat4, Quat, Vec3};

use super::Scene;
use crate::components::Renderable;
use crate::ecs::Entity;

impl Scene {
	/// Marks the local matrix of `entity` stale, then its world matrix and those of its subtree.
	pub(crate) fn set_local_dirty(&mut self, entity: Entity) {
		self.transform_mut(entity).local_dirty = true;
		self.set_dirty(entity);
	}

	/// Marks the world matrix of `entity` and of every descendant stale, along with their
	/// world bounds.
	pub(crate) fn set_dirty(&mut self, entity: Entity) {
		let subtree: Vec<Entity> = std::iter::once(entity).chain(self.graph.descendants(entity)).collect();
		for node in subtree {
			self.transform_mut(node).dirty = true;
			if let Some(renderable) = self.world.get_mut::<Renderable>(node) {
				renderable.aabb_dirty = true;
			}
		}
		self.mark_clip_users_dirty(entity);
	}

	/// Brings the local and world matrices of `entity` up to date, parents first.
	pub(crate) fn sync_transform(&mut self, entity: Entity) {
		let transform = self.transform(entity);
		if !transform.dirty && !transform.local_dirty {
			// an ancestor change always dirties the whole subtree
			return;
		}

		let parent_world = self.graph.parent(entity).map(|parent| {
			self.sync_transform(parent);
			self.transform(parent).world_transform
		});

		let transform = self.transform_mut(entity);
		transform.compose_local();
		transform.compose_world(parent_world.as_ref());
	}

	pub fn set_local_position(&mut self, entity: Entity, position: Vec3) {
		self.transform_mut(entity).local_position = position;
		self.set_local_dirty(entity);
	}

	pub fn set_local_rotation(&mut self, entity: Entity, rotation: Quat) {
		self.transform_mut(entity).local_rotation = rotation.normalize();
		self.set_local_dirty(entity);
	}

	pub fn set_local_scale(&mut self, entity: Entity, scale: Vec3) {
		self.transform_mut(entity).local_scale = scale;
		self.set_local_dirty(entity);
	}

	/// Replaces the local RTS by the decomposition of `m`.
	pub fn set_local_transform(&mut self, entity: Entity, m: Mat4) {
		self.transform_mut(entity).set_local_matrix(m);
		self.set_local_dirty(entity);
	}

	/// Moves along `offset` expressed in the entity's own rotated frame.
	pub fn translate_local(&mut self, entity: Entity, offset: Vec3) {
		let transform = self.transform_mut(entity);
		transform.local_position += transform.local_rotation * offset;
		self.set_local_dirty(entity);
	}

	/// Moves by `offset` in world space.
	pub fn translate(&mut self, entity: Entity, offset: Vec3) {
		let position = self.get_position(entity) + offset;
		self.set_position(entity, position);
	}

	pub fn scale_local(&mut self, entity: Entity, factor: Vec3) {
		self.transform_mut(entity).local_scale *= factor;
		self.set_local_dirty(entity);
	}

	pub fn rotate_local(&mut self, entity: Entity, rotation: Quat) {
		let transform = self.transform_mut(entity);
		transform.local_rotation = (transform.local_rotation * rotation).normalize();
		self.set_local_dirty(entity);
	}

	/// Applies `rotation` in world space.
	pub fn rotate(&mut self, entity: Entity, rotation: Quat) {
		let local_rotation = match self.graph.parent(entity) {
			None => rotation * self.transform(entity).local_rotation,
			Some(parent) => {
				let parent_rotation = self.get_rotation(parent);
				let world_rotation = self.get_rotation(entity);
				parent_rotation.inverse() * rotation * world_rotation
			}
		};
		self.transform_mut(entity).local_rotation = local_rotation.normalize();
		self.set_local_dirty(entity);
	}

	/// Places the entity at a world-space position.
	pub fn set_position(&mut self, entity: Entity, position: Vec3) {
		let local_position = match self.graph.parent(entity) {
			None => position,
			Some(parent) => self.get_world_transform(parent).inverse().transform_point3(position),
		};
		self.set_local_position(entity, local_position);
	}

	/// Sets the world-space rotation.
	pub fn set_rotation(&mut self, entity: Entity, rotation: Quat) {
		let local_rotation = match self.graph.parent(entity) {
			None => rotation,
			Some(parent) => self.get_rotation(parent).inverse() * rotation,
		};
		self.set_local_rotation(entity, local_rotation);
	}

	pub fn get_local_position(&self, entity: Entity) -> Vec3 {
		self.transform(entity).local_position
	}

	pub fn get_local_rotation(&self, entity: Entity) -> Quat {
		self.transform(entity).local_rotation
	}

	pub fn get_local_scale(&self, entity: Entity) -> Vec3 {
		self.transform(entity).local_scale
	}

	pub fn get_local_transform(&mut self, entity: Entity) -> Mat4 {
		let transform = self.transform_mut(entity);
		transform.compose_local();
		transform.local_transform
	}

	pub fn get_world_transform(&mut self, entity: Entity) -> Mat4 {
		self.sync_transform(entity);
		self.transform(entity).world_transform
	}

	pub fn get_position(&mut self, entity: Entity) -> Vec3 {
		self.sync_transform(entity);
		self.transform(entity).position
	}

	pub fn get_rotation(&mut self, entity: Entity) -> Quat {
		self.sync_transform(entity);
		self.transform(entity).rotation
	}

	pub fn get_scale(&mut self, entity: Entity) -> Vec3 {
		self.sync_transform(entity);
		self.transform(entity).scaling
	}
}

#[cfg(test)]
mod tests {
	use std::f32::consts::FRAC_PI_2;

	use glam::vec3;

	use super::*;
	use crate::math::assert_vec3_close;
	use crate::scene::NodeConfig;

	#[test]
	fn root_world_is_local() {
		let mut scene = Scene::new();
		let e = scene.spawn_group(NodeConfig::group());
		scene.set_local_position(e, vec3(3., 4., 0.));
		scene.set_local_rotation(e, Quat::from_rotation_z(0.3));
		scene.set_local_scale(e, vec3(2., 1., 1.));

		let world = scene.get_world_transform(e);
		let local = scene.get_local_transform(e);
		assert!(world.abs_diff_eq(local, 1e-5));
	}

	#[test]
	fn translate_local_follows_rotation() {
		let mut scene = Scene::new();
		let e = scene.spawn_group(NodeConfig::group());
		scene.set_local_rotation(e, Quat::from_rotation_z(FRAC_PI_2));
		scene.translate_local(e, vec3(1., 0., 0.));
		assert_vec3_close(scene.get_local_position(e), vec3(0., 1., 0.));
	}

	#[test]
	fn world_rotation_under_rotated_parent() {
		let mut scene = Scene::new();
		let parent = scene.spawn_group(NodeConfig::group());
		let child = scene.spawn_group(NodeConfig::group());
		scene.attach(child, parent, None, true).unwrap();
		scene.set_local_rotation(parent, Quat::from_rotation_z(FRAC_PI_2));

		scene.rotate(child, Quat::from_rotation_z(FRAC_PI_2));
		let expected = Quat::from_rotation_z(std::f32::consts::PI);
		assert!(scene.get_rotation(child).dot(expected).abs() > 0.9999);

		scene.set_rotation(child, Quat::IDENTITY);
		assert!(scene.get_rotation(child).dot(Quat::IDENTITY).abs() > 0.9999);
	}

	#[test]
	fn set_position_round_trip() {
		let mut scene = Scene::new();
		let parent = scene.spawn_group(NodeConfig::group());
		let child = scene.spawn_group(NodeConfig::group());
		scene.set_local_position(parent, vec3(10., 5., 0.));
		scene.set_local_scale(parent, vec3(2., 2., 1.));
		scene.attach(child, parent, None, true).unwrap();
		scene.set_local_position(child, vec3(1., 1., 0.));

		let world = scene.get_position(child);
		assert_vec3_close(world, vec3(12., 7., 0.));

		scene.set_position(child, world);
		assert_vec3_close(scene.get_position(child), world);
		assert_vec3_close(scene.get_local_position(child), vec3(1., 1., 0.));

		scene.translate(child, vec3(2., 0., 0.));
		assert_vec3_close(scene.get_position(child), vec3(14., 7., 0.));
		assert_vec3_close(scene.get_local_position(child), vec3(2., 1., 0.));
	}

	#[test]
	fn lazy_until_read() {
		let mut scene = Scene::new();
		let parent = scene.spawn_group(NodeConfig::group());
		let child = scene.spawn_group(NodeConfig::group());
		scene.attach(child, parent, None, true).unwrap();
		scene.get_world_transform(child);

		scene.set_local_position(parent, vec3(1., 0., 0.));
		assert!(scene.transform(child).is_dirty());
		assert!(scene.transform(parent).is_local_dirty());

		assert_vec3_close(scene.get_position(child), vec3(1., 0., 0.));
		assert!(!scene.transform(child).is_dirty());
		assert!(!scene.transform(parent).is_dirty());
	}
}
