use std::collections::HashMap;

use glam::Vec2;
use tracing::{debug, error};

use crate::components::Renderable;
use crate::config::{CanvasConfig, CanvasConfigPatch};
use crate::ecs::Entity;
use crate::group::Group;
use crate::math::Aabb;
use crate::render::{FrameStats, RenderError, RenderResult, RenderingPlugin, RenderingService};
use crate::scene::{NodeConfig, Scene, SceneResult};
use crate::shape::Shape;

/// Called once per tick with the scene and the frame timestamp, after animations advanced.
pub type FrameCallback = Box<dyn FnMut(&mut Scene, f64)>;

/// A drawing surface: the scene, its root group and the rendering pipeline that paints it.
///
/// Only descendants of the root group are drawn. The host drives frames by calling
/// [`Canvas::tick`] from its frame scheduler.
pub struct Canvas {
	scene: Scene,
	root: Entity,
	service: RenderingService,
	config: CanvasConfig,
	frame_callbacks: Vec<FrameCallback>,
	destroyed: bool,
}

impl Canvas {
	/// Canvas drawing through `backend`, after the built-in dirty check, culling and sort stages.
	pub fn new(config: CanvasConfig, backend: impl RenderingPlugin + 'static) -> RenderResult<Self> {
		Self::with_service(config, RenderingService::new(Box::new(backend)))
	}

	/// Canvas with a custom stage list.
	pub fn with_service(config: CanvasConfig, mut service: RenderingService) -> RenderResult<Self> {
		service.init(&config)?;

		let mut scene = Scene::new();
		let root = scene.spawn_group(NodeConfig::group().name("root"));
		debug!(
			"canvas {}x{} created with the {} renderer",
			config.width, config.height, config.renderer
		);

		Ok(Self {
			scene,
			root,
			service,
			config,
			frame_callbacks: Vec::new(),
			destroyed: false,
		})
	}

	pub fn root(&self) -> Entity {
		self.root
	}

	pub fn scene(&self) -> &Scene {
		&self.scene
	}

	pub fn scene_mut(&mut self) -> &mut Scene {
		&mut self.scene
	}

	pub fn config(&self) -> &CanvasConfig {
		&self.config
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}

	/// Region repainted by the latest frame, `None` after a full repaint.
	pub fn dirty_rectangle(&self) -> Option<Aabb> {
		self.service.dirty_rectangle()
	}

	/// Creates a shape and appends it to the root group.
	pub fn add_shape(&mut self, config: NodeConfig) -> SceneResult<Entity> {
		let entity = self.scene.spawn_shape(config)?;
		self.scene.attach(entity, self.root, None, true)?;
		Ok(entity)
	}

	/// Creates a group and appends it to the root group.
	pub fn add_group(&mut self, config: NodeConfig) -> SceneResult<Entity> {
		let entity = self.scene.spawn_group(config);
		self.scene.attach(entity, self.root, None, true)?;
		Ok(entity)
	}

	pub fn group(&mut self, entity: Entity) -> SceneResult<Group<'_>> {
		Group::new(&mut self.scene, entity)
	}

	pub fn shape(&mut self, entity: Entity) -> SceneResult<Shape<'_>> {
		Shape::new(&mut self.scene, entity)
	}

	pub fn root_group(&mut self) -> Group<'_> {
		Group {
			scene: &mut self.scene,
			entity: self.root,
		}
	}

	/// Merges `patch` into the config. A size change resizes the backend and repaints
	/// everything on the next tick.
	pub fn set_config(&mut self, patch: CanvasConfigPatch) -> RenderResult<()> {
		if self.destroyed {
			return Err(RenderError::Destroyed);
		}

		let old_size = (self.config.width, self.config.height);
		patch.apply(&mut self.config);
		let new_size = (self.config.width, self.config.height);

		if new_size != old_size {
			self.service.resize(new_size.0, new_size.1)?;
			self.scene.mark_subtree_for_repaint(self.root);
		}
		Ok(())
	}

	pub fn change_size(&mut self, width: u32, height: u32) -> RenderResult<()> {
		self.set_config(CanvasConfigPatch {
			width: Some(width),
			height: Some(height),
			..Default::default()
		})
	}

	pub fn on_frame(&mut self, callback: impl FnMut(&mut Scene, f64) + 'static) {
		self.frame_callbacks.push(Box::new(callback));
	}

	/// Runs one frame at `now` milliseconds: animations, frame callbacks, then the pipeline.
	///
	/// A failing stage aborts only this frame. It is logged and reported through
	/// [`FrameStats::aborted`], and shapes it did not get to stay dirty for the next tick.
	pub fn tick(&mut self, now: f64) -> RenderResult<FrameStats> {
		if self.destroyed {
			return Err(RenderError::Destroyed);
		}

		self.scene.update_animations(now);
		for callback in &mut self.frame_callbacks {
			callback(&mut self.scene, now);
		}

		match self.service.render(&mut self.scene, self.root, &self.config) {
			Ok(stats) => Ok(stats),
			Err(err) => {
				error!("Frame at {now}ms aborted: {err}");
				Ok(FrameStats {
					aborted: true,
					..Default::default()
				})
			}
		}
	}

	/// Tears down the pipeline and the spatial index. Later ticks fail with
	/// [`RenderError::Destroyed`]. Calling it twice is a no-op.
	pub fn destroy(&mut self) -> RenderResult<()> {
		if self.destroyed {
			return Ok(());
		}
		self.destroyed = true;
		self.frame_callbacks.clear();

		let result = self.service.destroy(&mut self.scene);
		self.scene.spatial_index.clear();
		for entity in self.scene.world.entities_with::<Renderable>().to_vec() {
			if let Some(renderable) = self.scene.renderable_mut(entity) {
				renderable.spatial_node = None;
			}
		}
		result
	}

	/// Top-most drawn shape under `point`.
	///
	/// Candidates come from the spatial index, must be effectively visible descendants of the
	/// root, and must pass the backend's precise hit test.
	pub fn pick(&mut self, point: Vec2) -> Option<Entity> {
		if self.destroyed {
			return None;
		}
		self.scene.update_bounds();

		let root = self.root;
		let mut candidates: Vec<Entity> = self
			.scene
			.search_point(point)
			.into_iter()
			.filter(|entity| *entity == root || self.scene.graph.ancestors(*entity).any(|a| a == root))
			.filter(|entity| self.scene.is_visible(*entity))
			.collect();

		let order: HashMap<Entity, usize> = self
			.scene
			.render_order()
			.iter()
			.enumerate()
			.map(|(index, entity)| (*entity, index))
			.collect();
		candidates.sort_by_key(|entity| std::cmp::Reverse(order.get(entity).copied().unwrap_or(0)));

		candidates
			.into_iter()
			.find(|entity| self.service.is_hit(&mut self.scene, *entity, point))
	}
}
