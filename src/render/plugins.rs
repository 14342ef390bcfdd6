use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{Frame, RenderResult, RenderingPlugin};
use crate::components::{CullStrategy, Cullable, Renderable};
use crate::ecs::Entity;
use crate::scene::{DirtyRegion, Scene};

/// Refreshes stale world bounds and narrows the frame to the merged dirty region.
///
/// With dirty rectangles disabled every entity is repainted. A dirty entity without any bounds
/// also forces a full repaint.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirtyCheckPlugin;

impl RenderingPlugin for DirtyCheckPlugin {
	fn prepare_entities(
		&mut self,
		scene: &mut Scene,
		frame: &mut Frame,
		entities: Vec<Entity>,
	) -> RenderResult<Vec<Entity>> {
		scene.update_bounds();
		let vacated = scene.take_vacated_regions().into_iter().reduce(|merged, aabb| merged.union(&aabb));

		if !frame.dirty_rectangle_enabled {
			frame.dirty_rectangle = None;
			return Ok(entities);
		}

		let dirty: Vec<Entity> = entities
			.iter()
			.copied()
			.filter(|entity| scene.renderable(*entity).map_or(false, Renderable::is_dirty))
			.collect();

		let unbounded = dirty.iter().any(|entity| {
			scene
				.renderable(*entity)
				.map_or(false, |r| r.aabb.is_none() && r.dirty_aabb.is_none())
		});
		if unbounded {
			frame.dirty_rectangle = None;
			return Ok(entities);
		}

		let region = match (scene.merge_dirty_rectangles(&dirty), vacated) {
			(None, None) => {
				frame.skip = true;
				return Ok(Vec::new());
			}
			(Some(region), None) => region,
			(region, Some(vacated)) => {
				let rect = region.map_or(vacated, |region| region.rect.union(&vacated));
				DirtyRegion {
					rect,
					entities: scene.search(&rect),
				}
			}
		};
		if frame.debug {
			debug!(
				"dirty rectangle min {} max {}, {} dirty, {} affected",
				region.rect.min(),
				region.rect.max(),
				dirty.len(),
				region.entities.len()
			);
		}

		let affected: HashSet<Entity> = region.entities.into_iter().chain(dirty).collect();
		frame.dirty_rectangle = Some(region.rect);
		Ok(entities.into_iter().filter(|entity| affected.contains(entity)).collect())
	}
}

/// Decides whether a cullable entity can be seen this frame.
pub trait CullingStrategy {
	fn is_visible(&self, scene: &Scene, entity: Entity, frame: &Frame) -> bool;
}

/// Culls entities whose world bounds lie outside the canvas.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewportCulling;

impl CullingStrategy for ViewportCulling {
	fn is_visible(&self, scene: &Scene, entity: Entity, frame: &Frame) -> bool {
		match scene.renderable(entity).and_then(Renderable::aabb) {
			Some(aabb) => aabb.intersects(&frame.viewport),
			None => true,
		}
	}
}

/// Drops hidden entities and those rejected by a culling strategy.
///
/// Dropped entities are not drawn this frame, so their repaint flags are cleared here.
pub struct CullingPlugin {
	strategies: Vec<Box<dyn CullingStrategy>>,
}

impl Default for CullingPlugin {
	fn default() -> Self {
		Self::new(vec![Box::new(ViewportCulling)])
	}
}

impl CullingPlugin {
	pub fn new(strategies: Vec<Box<dyn CullingStrategy>>) -> Self {
		Self { strategies }
	}

	pub fn add_strategy(&mut self, strategy: impl CullingStrategy + 'static) {
		self.strategies.push(Box::new(strategy));
	}

	fn passes(&self, scene: &Scene, entity: Entity, frame: &Frame) -> bool {
		match scene.world.get::<Cullable>(entity).map(Cullable::strategy) {
			None | Some(CullStrategy::Never) => true,
			Some(CullStrategy::Standard) => self
				.strategies
				.iter()
				.all(|strategy| strategy.is_visible(scene, entity, frame)),
		}
	}
}

impl RenderingPlugin for CullingPlugin {
	fn prepare_entities(
		&mut self,
		scene: &mut Scene,
		frame: &mut Frame,
		entities: Vec<Entity>,
	) -> RenderResult<Vec<Entity>> {
		let mut kept = Vec::with_capacity(entities.len());
		for entity in entities {
			let not_culled = self.passes(scene, entity, frame);
			if let Some(cullable) = scene.world.get_mut::<Cullable>(entity) {
				cullable.visible = not_culled;
			}

			if not_culled && scene.is_visible(entity) {
				kept.push(entity);
			} else if let Some(renderable) = scene.renderable_mut(entity) {
				renderable.mark_painted();
			}
		}
		Ok(kept)
	}
}

/// Orders the frame by the scene's memoized render order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SortPlugin;

impl RenderingPlugin for SortPlugin {
	fn prepare_entities(
		&mut self,
		scene: &mut Scene,
		_frame: &mut Frame,
		mut entities: Vec<Entity>,
	) -> RenderResult<Vec<Entity>> {
		let order: HashMap<Entity, usize> = scene
			.render_order()
			.iter()
			.enumerate()
			.map(|(index, entity)| (*entity, index))
			.collect();
		entities.sort_by_key(|entity| order.get(entity).copied().unwrap_or(usize::MAX));
		Ok(entities)
	}
}

#[cfg(test)]
mod tests {
	use glam::vec3;

	use super::*;
	use crate::attrs;
	use crate::config::CanvasConfig;
	use crate::scene::NodeConfig;

	fn rect(scene: &mut Scene, root: Entity, x: f32) -> Entity {
		let entity = scene
			.spawn_shape(NodeConfig::shape("rect").attrs(attrs! { "x" => x, "width" => 10., "height" => 10. }))
			.unwrap();
		scene.attach(entity, root, None, true).unwrap();
		entity
	}

	fn painted(scene: &mut Scene, entities: &[Entity]) {
		scene.update_bounds();
		for entity in entities {
			scene.renderable_mut(*entity).unwrap().mark_painted();
		}
	}

	#[test]
	fn dirty_check_narrows_to_region() {
		let mut scene = Scene::new();
		let root = scene.spawn_group(NodeConfig::group());
		let a = rect(&mut scene, root, 0.);
		let b = rect(&mut scene, root, 15.);
		let far = rect(&mut scene, root, 200.);
		painted(&mut scene, &[a, b, far]);

		scene.translate(a, vec3(10., 0., 0.));
		let mut frame = Frame::new(&CanvasConfig::default());
		let kept = DirtyCheckPlugin
			.prepare_entities(&mut scene, &mut frame, vec![a, b, far])
			.unwrap();

		assert_eq!(kept, vec![a, b]);
		let rect = frame.dirty_rectangle.unwrap();
		assert_eq!(rect.min(), vec3(0., 0., 0.));
		assert_eq!(rect.max(), vec3(20., 10., 0.));
	}

	#[test]
	fn dirty_check_skips_clean_frames() {
		let mut scene = Scene::new();
		let root = scene.spawn_group(NodeConfig::group());
		let a = rect(&mut scene, root, 0.);
		painted(&mut scene, &[a]);

		let mut frame = Frame::new(&CanvasConfig::default());
		let kept = DirtyCheckPlugin.prepare_entities(&mut scene, &mut frame, vec![a]).unwrap();
		assert!(kept.is_empty());
		assert!(frame.skip);
	}

	#[test]
	fn culling_drops_hidden_and_offscreen() {
		let mut scene = Scene::new();
		let root = scene.spawn_group(NodeConfig::group());
		let on = rect(&mut scene, root, 0.);
		let off = rect(&mut scene, root, 5000.);
		let hidden = rect(&mut scene, root, 20.);
		scene.hide(hidden);
		scene.update_bounds();

		let mut frame = Frame::new(&CanvasConfig::default());
		let kept = CullingPlugin::default()
			.prepare_entities(&mut scene, &mut frame, vec![on, off, hidden])
			.unwrap();

		assert_eq!(kept, vec![on]);
		assert!(!scene.world.get::<Cullable>(off).unwrap().is_visible());
		assert!(scene.world.get::<Cullable>(hidden).unwrap().is_visible());
		assert!(!scene.renderable(hidden).unwrap().is_dirty());
	}

	#[test]
	fn sort_follows_z_index() {
		let mut scene = Scene::new();
		let root = scene.spawn_group(NodeConfig::group());
		let a = rect(&mut scene, root, 0.);
		let b = rect(&mut scene, root, 0.);
		let c = rect(&mut scene, root, 0.);
		scene.set_z_index(a, 3);
		scene.set_z_index(b, 1);
		scene.set_z_index(c, 2);

		let mut frame = Frame::new(&CanvasConfig::default());
		let sorted = SortPlugin
			.prepare_entities(&mut scene, &mut frame, vec![a, b, c])
			.unwrap();
		assert_eq!(sorted, vec![b, c, a]);
	}
}
