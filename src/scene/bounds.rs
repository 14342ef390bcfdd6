use glam::Vec2;

use super::Scene;
use crate::components::{Geometry, Renderable};
use crate::ecs::Entity;
use crate::math::Aabb;

/// Region to repaint this frame and every entity intersecting it.
#[derive(Clone, Debug, PartialEq)]
pub struct DirtyRegion {
	pub rect: Aabb,
	pub entities: Vec<Entity>,
}

impl Scene {
	/// Recomputes the world bounds of every renderable whose bounds are stale and refreshes the
	/// spatial index. The previous bounds are kept in `dirty_aabb` until the entity is painted.
	pub fn update_bounds(&mut self) {
		let stale: Vec<Entity> = self
			.world
			.entities_with::<Renderable>()
			.iter()
			.copied()
			.filter(|entity| self.renderable(*entity).map_or(false, Renderable::is_aabb_dirty))
			.collect();

		for entity in stale {
			let aabb = self.world_aabb(entity);

			let renderable = self
				.world
				.get_mut::<Renderable>(entity)
				.unwrap_or_else(|| panic!("Entity {entity} lost its Renderable."));
			renderable.dirty_aabb = match (renderable.dirty_aabb, renderable.aabb) {
				(Some(dirty), Some(old)) => Some(dirty.union(&old)),
				(dirty, old) => dirty.or(old),
			};
			renderable.aabb = aabb;
			renderable.aabb_dirty = false;
			renderable.dirty = true;
			let stale_node = renderable.spatial_node.take();

			if let Some(node) = stale_node {
				self.spatial_index.remove(&node);
			}
			if let Some(aabb) = aabb {
				let node = self.spatial_index.insert(entity, &aabb);
				if let Some(renderable) = self.renderable_mut(entity) {
					renderable.spatial_node = Some(node);
				}
			}
		}
	}

	/// Local geometry under the current world transform, cut down to the clip path if any.
	fn world_aabb(&mut self, entity: Entity) -> Option<Aabb> {
		let local = self.world.get::<Geometry>(entity)?.aabb?;
		let world = self.get_world_transform(entity);
		let aabb = local.transform(&world);

		let Some(clip) = self.renderable(entity).and_then(Renderable::clip_path) else {
			return Some(aabb);
		};
		if !self.contains(clip) {
			return Some(aabb);
		}
		let Some(clip_local) = self.world.get::<Geometry>(clip).and_then(Geometry::aabb) else {
			return Some(aabb);
		};
		let clip_world = world * self.get_local_transform(clip);
		aabb.intersection(&clip_local.transform(&clip_world))
	}

	/// Entities clipped by `clip` need fresh bounds whenever the clip moves or reshapes.
	pub(crate) fn mark_clip_users_dirty(&mut self, clip: Entity) {
		let users: Vec<Entity> = self
			.world
			.entities_with::<Renderable>()
			.iter()
			.copied()
			.filter(|user| self.renderable(*user).and_then(Renderable::clip_path) == Some(clip))
			.collect();
		for user in users {
			self.mark_aabb_dirty(user);
		}
	}

	/// Unions the current and previous bounds of every dirty entity among `entities`, then
	/// collects everything in the spatial index intersecting that union.
	///
	/// `None` when no dirty entity has any bounds, meaning there is nothing to repaint.
	pub fn merge_dirty_rectangles(&self, entities: &[Entity]) -> Option<DirtyRegion> {
		let rect = entities
			.iter()
			.filter_map(|entity| self.renderable(*entity))
			.filter(|renderable| renderable.dirty)
			.flat_map(|renderable| [renderable.aabb, renderable.dirty_aabb])
			.flatten()
			.reduce(|merged, aabb| merged.union(&aabb))?;

		let entities = self.spatial_index.search(&rect);
		Some(DirtyRegion { rect, entities })
	}

	/// Remembers the painted area of `entity` and its descendants before they leave the tree.
	pub(crate) fn vacate_subtree(&mut self, entity: Entity) {
		let regions: Vec<Aabb> = std::iter::once(entity)
			.chain(self.graph.descendants(entity))
			.filter_map(|node| self.renderable(node))
			.flat_map(|renderable| [renderable.aabb, renderable.dirty_aabb])
			.flatten()
			.collect();
		self.vacated.extend(regions);
	}

	/// Drains the areas left by detached or destroyed shapes.
	pub fn take_vacated_regions(&mut self) -> Vec<Aabb> {
		std::mem::take(&mut self.vacated)
	}

	/// Entities whose world bounds intersect `aabb`.
	pub fn search(&self, aabb: &Aabb) -> Vec<Entity> {
		self.spatial_index.search(aabb)
	}

	pub fn search_point(&self, point: Vec2) -> Vec<Entity> {
		self.spatial_index.search_point(point)
	}

	/// Union of the world bounds of `entity` and its descendants.
	pub fn get_bounds(&mut self, entity: Entity) -> Option<Aabb> {
		self.update_bounds();
		std::iter::once(entity)
			.chain(self.graph.descendants(entity))
			.filter_map(|node| self.renderable(node).and_then(Renderable::aabb))
			.reduce(|merged, aabb| merged.union(&aabb))
	}
}

#[cfg(test)]
mod tests {
	use glam::vec3;

	use super::*;
	use crate::attrs;
	use crate::math::{assert_close, assert_vec3_close};
	use crate::scene::NodeConfig;

	#[test]
	fn circle_world_bounds() {
		let mut scene = Scene::new();
		let circle = scene
			.spawn_shape(NodeConfig::shape("circle").attrs(attrs! { "r" => 10., "lineWidth" => 4. }))
			.unwrap();
		scene.update_bounds();

		let aabb = scene.renderable(circle).unwrap().aabb().unwrap();
		assert_vec3_close(aabb.half_extents, vec3(12., 12., 0.));
		assert_vec3_close(aabb.max() - aabb.min(), aabb.half_extents * 2.);
		assert!(!scene.renderable(circle).unwrap().is_aabb_dirty());
		assert!(scene.renderable(circle).unwrap().dirty_aabb().is_none());
		assert_eq!(scene.search_point(Vec2::new(11., 0.)), vec![circle]);
	}

	#[test]
	fn move_keeps_previous_bounds() {
		let mut scene = Scene::new();
		let rect = scene
			.spawn_shape(NodeConfig::shape("rect").attrs(attrs! { "width" => 10., "height" => 10. }))
			.unwrap();
		scene.update_bounds();
		scene.renderable_mut(rect).unwrap().mark_painted();

		scene.translate(rect, vec3(100., 0., 0.));
		scene.update_bounds();

		let renderable = scene.renderable(rect).unwrap();
		assert!(renderable.is_dirty());
		assert_vec3_close(renderable.dirty_aabb().unwrap().min(), vec3(0., 0., 0.));
		assert_vec3_close(renderable.aabb().unwrap().min(), vec3(100., 0., 0.));
		assert!(scene.search_point(Vec2::new(5., 5.)).is_empty());
		assert_eq!(scene.search_point(Vec2::new(105., 5.)), vec![rect]);
	}

	#[test]
	fn group_bounds_union() {
		let mut scene = Scene::new();
		let group = scene.spawn_group(NodeConfig::group());
		for x in [0., 50.] {
			let shape = scene
				.spawn_shape(NodeConfig::shape("rect").attrs(attrs! { "x" => x, "width" => 10., "height" => 20. }))
				.unwrap();
			scene.attach(shape, group, None, true).unwrap();
		}
		scene.translate(group, vec3(0., 5., 0.));

		let bounds = scene.get_bounds(group).unwrap();
		assert_vec3_close(bounds.min(), vec3(0., 5., 0.));
		assert_vec3_close(bounds.max(), vec3(60., 25., 0.));
	}

	#[test]
	fn clip_intersects_bounds() {
		let mut scene = Scene::new();
		let shape = scene
			.spawn_shape(NodeConfig::shape("rect").attrs(attrs! { "width" => 100., "height" => 100. }))
			.unwrap();
		let clip = scene
			.spawn_shape(NodeConfig::shape("circle").attrs(attrs! { "x" => 10., "y" => 10., "r" => 10. }))
			.unwrap();
		scene.set_clip(shape, Some(clip)).unwrap();

		let aabb = scene.get_bounds(shape).unwrap();
		assert_vec3_close(aabb.min(), vec3(0., 0., 0.));
		assert_close(aabb.max().x, 20.);

		scene.set_attribute(clip, "r", 5.).unwrap();
		assert!(scene.renderable(shape).unwrap().is_aabb_dirty());
		assert_close(scene.get_bounds(shape).unwrap().max().x, 15.);
	}
}
