use glam::Vec3;

use super::{AttributeChange, Scene, SceneError, SceneResult};
use crate::aabb::update_local_aabb;
use crate::attrs::{is_geometry_attribute, AttrValue, Attributes};
use crate::components::{Cullable, Geometry, Instance, Meta, Renderable, Sortable, Transform, Visible};
use crate::ecs::Entity;

impl Scene {
	/// Moves `entity` under `parent`, before the child at `index` or last.
	///
	/// Unless `child_is_local`, the entity's current transform is taken as world space and
	/// re-expressed in the parent's space, so it stays where it is on screen.
	pub fn attach(
		&mut self,
		entity: Entity,
		parent: Entity,
		index: Option<usize>,
		child_is_local: bool,
	) -> SceneResult<()> {
		self.ensure_alive(entity)?;
		self.ensure_alive(parent)?;

		let relocated = if child_is_local {
			None
		} else {
			let child_world = self.get_world_transform(entity);
			let parent_world = self.get_world_transform(parent);
			Some(parent_world.inverse() * child_world)
		};

		let old_parent = self.graph.parent(entity);
		self.graph.attach(entity, parent, index)?;
		if old_parent.is_some() {
			// The new parent may lie outside the drawn tree.
			self.vacate_subtree(entity);
		}

		if let Some(local) = relocated {
			self.transform_mut(entity).set_local_matrix(local);
		}
		self.set_local_dirty(entity);
		if let Some(old_parent) = old_parent {
			self.mark_aabb_dirty(old_parent);
		}
		self.mark_aabb_dirty(parent);
		Ok(())
	}

	/// Unlinks `entity` from its parent, baking its world transform into its local one.
	/// Returns the former parent.
	pub fn detach(&mut self, entity: Entity) -> SceneResult<Option<Entity>> {
		self.ensure_alive(entity)?;
		if self.graph.parent(entity).is_none() {
			return Ok(None);
		}

		self.vacate_subtree(entity);
		let world = self.get_world_transform(entity);
		let parent = self.graph.detach(entity);
		self.transform_mut(entity).set_local_matrix(world);
		self.set_local_dirty(entity);
		if let Some(parent) = parent {
			self.mark_aabb_dirty(parent);
		}
		Ok(parent)
	}

	/// Removes `entity` and its whole subtree from the scene.
	pub fn destroy(&mut self, entity: Entity) -> SceneResult<()> {
		self.ensure_alive(entity)?;
		self.detach(entity)?;

		let mut doomed: Vec<Entity> = self.graph.descendants(entity).collect();
		doomed.reverse();
		doomed.push(entity);

		for node in &doomed {
			if let Some(spatial_node) = self.renderable_mut(*node).and_then(|r| r.spatial_node.take()) {
				self.spatial_index.remove(&spatial_node);
			}
			self.graph.remove(*node)?;
			self.world.despawn(*node);
		}

		self.attribute_changes.retain(|change| !doomed.contains(&change.entity));
		let clip_users: Vec<Entity> = self
			.world
			.entities_with::<Renderable>()
			.iter()
			.copied()
			.filter(|user| {
				self.renderable(*user)
					.and_then(Renderable::clip_path)
					.map_or(false, |clip| doomed.contains(&clip))
			})
			.collect();
		for user in clip_users {
			if let Some(renderable) = self.renderable_mut(user) {
				renderable.clip_path = None;
				renderable.aabb_dirty = true;
			}
		}
		Ok(())
	}

	pub(crate) fn mark_aabb_dirty(&mut self, entity: Entity) {
		if let Some(renderable) = self.renderable_mut(entity) {
			renderable.aabb_dirty = true;
		}
	}

	/// Flags `entity` and its renderable descendants for repaint.
	pub(crate) fn mark_subtree_for_repaint(&mut self, entity: Entity) {
		let subtree: Vec<Entity> = std::iter::once(entity).chain(self.graph.descendants(entity)).collect();
		for node in subtree {
			if let Some(renderable) = self.renderable_mut(node) {
				renderable.dirty = true;
			}
		}
	}

	pub fn z_index(&self, entity: Entity) -> i32 {
		self.world.get::<Sortable>(entity).map_or(0, Sortable::z_index)
	}

	pub fn set_z_index(&mut self, entity: Entity, z_index: i32) {
		self.world
			.get_mut::<Sortable>(entity)
			.unwrap_or_else(|| panic!("Entity {entity} has no Sortable."))
			.z_index = z_index;
		self.graph.invalidate_sort();
		self.mark_subtree_for_repaint(entity);
	}

	fn siblings_and_self(&self, entity: Entity) -> Vec<Entity> {
		match self.graph.parent(entity) {
			Some(parent) => self.graph.children(parent).collect(),
			None => self.graph.roots().to_vec(),
		}
	}

	/// Puts `entity` above every current sibling. Saturates at `i32::MAX`.
	pub fn to_front(&mut self, entity: Entity) {
		let max = self
			.siblings_and_self(entity)
			.into_iter()
			.map(|sibling| self.z_index(sibling))
			.max()
			.unwrap_or(0);
		self.set_z_index(entity, max.saturating_add(1));
	}

	/// Puts `entity` below every current sibling. Saturates at `i32::MIN`.
	pub fn to_back(&mut self, entity: Entity) {
		let min = self
			.siblings_and_self(entity)
			.into_iter()
			.map(|sibling| self.z_index(sibling))
			.min()
			.unwrap_or(0);
		self.set_z_index(entity, min.saturating_sub(1));
	}

	pub fn show(&mut self, entity: Entity) {
		self.set_visible(entity, true);
	}

	pub fn hide(&mut self, entity: Entity) {
		self.set_visible(entity, false);
	}

	fn set_visible(&mut self, entity: Entity, visible: bool) {
		self.world
			.get_mut::<Visible>(entity)
			.unwrap_or_else(|| panic!("Entity {entity} has no Visible."))
			.visible = visible;
		self.mark_subtree_for_repaint(entity);
	}

	/// Effective visibility: the entity's own flag and every ancestor's.
	pub fn is_visible(&self, entity: Entity) -> bool {
		std::iter::once(entity)
			.chain(self.graph.ancestors(entity))
			.all(|node| self.world.get::<Visible>(node).map_or(true, Visible::is_visible))
	}

	pub fn get_attribute(&self, entity: Entity, name: &str) -> Option<&AttrValue> {
		self.renderable(entity)?.attrs.get(name)
	}

	pub fn attributes(&self, entity: Entity) -> Option<&Attributes> {
		Some(&self.renderable(entity)?.attrs)
	}

	/// Writes one attribute. `x`, `y` and `z` also move the entity; geometry attributes refresh
	/// the local bounds. The write is queued for the render backend.
	pub fn set_attribute(&mut self, entity: Entity, name: &str, value: impl Into<AttrValue>) -> SceneResult<()> {
		self.ensure_alive(entity)?;
		let value = value.into();

		if let ("x" | "y" | "z", Some(n)) = (name, value.as_number()) {
			let mut position = self.get_local_position(entity);
			match name {
				"x" => position.x = n,
				"y" => position.y = n,
				_ => position.z = n,
			}
			self.set_local_position(entity, position);
		}

		let Some(renderable) = self.renderable_mut(entity) else {
			return match name {
				"x" | "y" | "z" => Ok(()),
				_ => Err(SceneError::NotAShape(entity)),
			};
		};
		renderable.attrs.insert(name.to_owned(), value.clone());
		renderable.dirty = true;

		if is_geometry_attribute(name) {
			renderable.aabb_dirty = true;
			let aabb = update_local_aabb(&renderable.shape_type, &renderable.attrs);
			if let Some(geometry) = self.world.get_mut::<Geometry>(entity) {
				geometry.aabb = aabb;
			}
			self.mark_clip_users_dirty(entity);
		}

		self.attribute_changes.push(AttributeChange {
			entity,
			name: name.to_owned(),
			value,
		});
		Ok(())
	}

	pub fn set_attributes(&mut self, entity: Entity, attrs: Attributes) -> SceneResult<()> {
		for (name, value) in attrs {
			self.set_attribute(entity, &name, value)?;
		}
		Ok(())
	}

	/// Copies `entity` (and its subtree when `deep`) into new, unattached entities.
	pub fn clone_node(&mut self, entity: Entity, deep: bool) -> SceneResult<Entity> {
		self.ensure_alive(entity)?;
		let copy = self.world.spawn();

		let transform = self.transform(entity);
		let mut copied_transform = Transform::default();
		copied_transform.local_position = transform.local_position;
		copied_transform.local_rotation = transform.local_rotation;
		copied_transform.local_scale = transform.local_scale;
		copied_transform.local_dirty = true;
		copied_transform.dirty = true;

		let sortable = self.world.get::<Sortable>(entity).copied().unwrap_or_default();
		let visible = self.world.get::<Visible>(entity).copied().unwrap_or_default();
		let meta = self.world.get::<Meta>(entity).cloned().unwrap_or_default();
		let geometry = self.world.get::<Geometry>(entity).cloned();
		let renderable = self.renderable(entity).map(Renderable::duplicate);
		let cullable = self.world.get::<Cullable>(entity).cloned();

		self.world.add(copy, copied_transform);
		self.world.add(copy, sortable);
		self.world.add(copy, visible);
		self.world.add(copy, meta);
		if let Some(geometry) = geometry {
			self.world.add(copy, geometry);
		}
		if let Some(renderable) = renderable {
			self.world.add(copy, renderable);
		}
		if let Some(cullable) = cullable {
			self.world.add(copy, cullable);
		}
		self.graph.insert(copy);

		if deep {
			let children: Vec<Entity> = self.graph.children(entity).collect();
			for child in children {
				let child_copy = self.clone_node(child, true)?;
				self.attach(child_copy, copy, None, true)?;
			}
		}
		Ok(copy)
	}

	/// Instanced copy of a shape: shares its geometry, sits next to it, and hides the source.
	pub fn create_instance(&mut self, entity: Entity) -> SceneResult<Entity> {
		if self.renderable(entity).is_none() {
			self.ensure_alive(entity)?;
			return Err(SceneError::NotAShape(entity));
		}

		let instance = self.clone_node(entity, false)?;
		self.world.add(instance, Instance { source: entity });
		self.world
			.get_mut::<Visible>(instance)
			.unwrap_or_else(|| panic!("Entity {instance} has no Visible."))
			.visible = true;
		if let Some(parent) = self.graph.parent(entity) {
			self.attach(instance, parent, None, true)?;
		}
		self.hide(entity);
		Ok(instance)
	}

	/// Makes `clip` (an unattached shape, positioned in the clipped entity's space) clip
	/// `entity`, or removes the clip with `None`.
	pub fn set_clip(&mut self, entity: Entity, clip: Option<Entity>) -> SceneResult<()> {
		if let Some(clip) = clip {
			self.ensure_alive(clip)?;
			if !self.world.has::<Geometry>(clip) {
				return Err(SceneError::NotAShape(clip));
			}
		}
		let renderable = match self.renderable_mut(entity) {
			Some(renderable) => renderable,
			None => {
				self.ensure_alive(entity)?;
				return Err(SceneError::NotAShape(entity));
			}
		};
		renderable.clip_path = clip;
		renderable.aabb_dirty = true;
		renderable.dirty = true;
		Ok(())
	}

	/// Entities under `entity` (excluded), depth-first, matching `predicate`.
	pub fn find_all(&self, entity: Entity, mut predicate: impl FnMut(&Scene, Entity) -> bool) -> Vec<Entity> {
		self.graph
			.descendants(entity)
			.filter(|node| predicate(self, *node))
			.collect()
	}

	pub fn find(&self, entity: Entity, mut predicate: impl FnMut(&Scene, Entity) -> bool) -> Option<Entity> {
		self.graph.descendants(entity).find(|node| predicate(self, *node))
	}

	pub fn find_by_id(&self, entity: Entity, id: &str) -> Option<Entity> {
		self.find(entity, |scene, node| {
			scene.meta(node).and_then(|meta| meta.id.as_deref()) == Some(id)
		})
	}

	pub fn find_by_class_name(&self, entity: Entity, class_name: &str) -> Vec<Entity> {
		self.find_all(entity, |scene, node| {
			scene.meta(node).and_then(|meta| meta.class_name.as_deref()) == Some(class_name)
		})
	}

	/// Current local position, used by attribute animations reading `x`/`y`.
	pub(crate) fn position_attribute(&self, entity: Entity, name: &str) -> Option<AttrValue> {
		let position: Vec3 = self.get_local_position(entity);
		match name {
			"x" => Some(position.x.into()),
			"y" => Some(position.y.into()),
			"z" => Some(position.z.into()),
			_ => None,
		}
	}
}
