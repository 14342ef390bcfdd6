mod backend;
mod plugins;
pub mod recording;

use glam::{Mat4, Vec2, Vec3};
use tracing::debug;

use crate::attrs::{AttrValue, Attributes};
use crate::components::{Instance, Renderable, ShapeType, Sortable};
use crate::config::CanvasConfig;
use crate::ecs::Entity;
use crate::math::Aabb;
use crate::scene::Scene;

pub use backend::ShapeRendererPlugin;
pub use plugins::{CullingPlugin, CullingStrategy, DirtyCheckPlugin, SortPlugin, ViewportCulling};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
	#[error("Could not initialize rendering context: {0}")]
	ContextInit(String),
	#[error("Rendering context used before init or after destroy")]
	ContextNotInitialized,
	#[error("Failed to draw entity {entity}: {msg}")]
	Draw { entity: Entity, msg: String },
	#[error("Canvas has been destroyed")]
	Destroyed,
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Read-only view of a renderable entity handed to shape renderers.
pub struct EntityRef<'a> {
	pub entity: Entity,
	pub shape_type: &'a ShapeType,
	pub attrs: &'a Attributes,
	pub world_transform: Mat4,
	/// World-space bounds as of the last bounds update.
	pub aabb: Option<Aabb>,
	pub clip_path: Option<Entity>,
	/// Source shape when this entity is an instance.
	pub instance_of: Option<Entity>,
}

impl Scene {
	/// View of a renderable entity with its world transform brought up to date.
	pub fn entity_ref(&mut self, entity: Entity) -> Option<EntityRef<'_>> {
		if !self.world.has::<Renderable>(entity) {
			return None;
		}
		let world_transform = self.get_world_transform(entity);
		let renderable = self.world.get::<Renderable>(entity)?;
		Some(EntityRef {
			entity,
			shape_type: &renderable.shape_type,
			attrs: &renderable.attrs,
			world_transform,
			aabb: renderable.aabb,
			clip_path: renderable.clip_path,
			instance_of: self.world.get::<Instance>(entity).map(Instance::source),
		})
	}

	/// Renderable entities of the subtree rooted at `root`, pre-order.
	pub fn renderables(&self, root: Entity) -> Vec<Entity> {
		std::iter::once(root)
			.chain(self.graph.descendants(root))
			.filter(|entity| self.world.has::<Renderable>(*entity))
			.collect()
	}

	/// Memoized render order of the whole scene.
	pub fn render_order(&mut self) -> &[Entity] {
		let world = &self.world;
		self.graph
			.sort(|entity| world.get::<Sortable>(entity).map_or(0, Sortable::z_index))
	}
}

/// Owns the drawing surface of a backend.
pub trait ContextService {
	type Context;

	/// Ref impl: Create the surface described by the canvas config.
	fn init(&mut self, config: &CanvasConfig) -> RenderResult<()>;
	/// `None` before `init` and after `destroy`.
	fn context(&mut self) -> Option<&mut Self::Context>;
	fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;
	fn destroy(&mut self) -> RenderResult<()>;

	/// Clear `region`, or everything with `None`.
	fn clear(&mut self, _region: Option<&Aabb>) -> RenderResult<()> {
		Ok(())
	}
	/// Flush the frame.
	fn present(&mut self) -> RenderResult<()> {
		Ok(())
	}
}

/// Draws one shape type for a backend whose drawing context is `C`.
pub trait ShapeRenderer<C> {
	/// Allocate backend resources for a shape about to be drawn for the first time.
	fn init(&mut self, _ctx: &mut C, _entity: &EntityRef) -> RenderResult<()> {
		Ok(())
	}

	/// Issue the draw calls of the shape from its attributes and world transform.
	fn render(&mut self, ctx: &mut C, entity: &EntityRef) -> RenderResult<()>;

	/// Incremental update after an attribute write. Bounds are kept by the scene already.
	fn on_attribute_changed(
		&mut self,
		_ctx: &mut C,
		_entity: &EntityRef,
		_name: &str,
		_value: &AttrValue,
	) -> RenderResult<()> {
		Ok(())
	}

	/// Precise hit test, run after the bounding-box test passed.
	fn is_hit(&self, _entity: &EntityRef, _point: Vec2) -> bool {
		true
	}
}

/// Per-frame state shared by the hooks of one render call.
#[derive(Clone, Debug)]
pub struct Frame {
	/// Visible area of the canvas, in world units.
	pub viewport: Aabb,
	pub dirty_rectangle_enabled: bool,
	pub debug: bool,
	/// Region to clear and repaint, `None` for the whole canvas.
	pub dirty_rectangle: Option<Aabb>,
	/// Set when nothing needs repainting.
	pub skip: bool,
	pub drawn: usize,
}

impl Frame {
	pub fn new(config: &CanvasConfig) -> Self {
		Self {
			viewport: Aabb::from_min_max(Vec3::ZERO, Vec3::new(config.width as f32, config.height as f32, 0.)),
			dirty_rectangle_enabled: config.dirty_rectangle.enable,
			debug: config.dirty_rectangle.debug,
			dirty_rectangle: None,
			skip: false,
			drawn: 0,
		}
	}
}

/// One stage of the rendering pipeline. Every hook has a pass-through default.
pub trait RenderingPlugin {
	fn init(&mut self, _config: &CanvasConfig) -> RenderResult<()> {
		Ok(())
	}

	fn resize(&mut self, _width: u32, _height: u32) -> RenderResult<()> {
		Ok(())
	}

	/// Waterfall stage: receives the previous stage's list, returns a possibly filtered or
	/// reordered one. An empty list ends the waterfall.
	fn prepare_entities(
		&mut self,
		_scene: &mut Scene,
		_frame: &mut Frame,
		entities: Vec<Entity>,
	) -> RenderResult<Vec<Entity>> {
		Ok(entities)
	}

	fn begin_frame(&mut self, _scene: &mut Scene, _frame: &mut Frame, _entities: &[Entity]) -> RenderResult<()> {
		Ok(())
	}

	fn render_frame(&mut self, _scene: &mut Scene, _frame: &mut Frame, _entities: &[Entity]) -> RenderResult<()> {
		Ok(())
	}

	fn end_frame(&mut self, _scene: &mut Scene, _frame: &mut Frame, _entities: &[Entity]) -> RenderResult<()> {
		Ok(())
	}

	fn destroy(&mut self, _scene: &mut Scene) -> RenderResult<()> {
		Ok(())
	}

	/// `None` if this stage has no opinion.
	fn is_hit(&mut self, _scene: &mut Scene, _entity: Entity, _point: Vec2) -> Option<bool> {
		None
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FrameStats {
	/// Shapes drawn.
	pub drawn: usize,
	/// Nothing was dirty, no hook past `prepare_entities` ran.
	pub skipped: bool,
	/// A stage failed and the rest of the frame was dropped.
	pub aborted: bool,
}

/// Runs the plugin stages in order, once per frame.
pub struct RenderingService {
	plugins: Vec<Box<dyn RenderingPlugin>>,
	dirty_rectangle: Option<Aabb>,
}

impl RenderingService {
	/// Dirty check, culling and sorting stages followed by `backend`.
	pub fn new(backend: Box<dyn RenderingPlugin>) -> Self {
		let plugins: Vec<Box<dyn RenderingPlugin>> = vec![
			Box::new(DirtyCheckPlugin),
			Box::new(CullingPlugin::default()),
			Box::new(SortPlugin),
			backend,
		];
		Self::with_plugins(plugins)
	}

	pub fn with_plugins(plugins: Vec<Box<dyn RenderingPlugin>>) -> Self {
		Self {
			plugins,
			dirty_rectangle: None,
		}
	}

	/// Region cleared by the latest frame, `None` for a full repaint.
	pub fn dirty_rectangle(&self) -> Option<Aabb> {
		self.dirty_rectangle
	}

	pub fn init(&mut self, config: &CanvasConfig) -> RenderResult<()> {
		for plugin in &mut self.plugins {
			plugin.init(config)?;
		}
		Ok(())
	}

	pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
		for plugin in &mut self.plugins {
			plugin.resize(width, height)?;
		}
		Ok(())
	}

	/// Renders the renderables under `root`. A failing stage aborts the rest of the frame, and
	/// the region it cleared is repainted by the next one.
	pub fn render(&mut self, scene: &mut Scene, root: Entity, config: &CanvasConfig) -> RenderResult<FrameStats> {
		let mut frame = Frame::new(config);
		let mut entities = scene.renderables(root);

		for plugin in &mut self.plugins {
			entities = plugin.prepare_entities(scene, &mut frame, entities)?;
			if entities.is_empty() {
				break;
			}
		}
		self.dirty_rectangle = frame.dirty_rectangle;

		if frame.skip {
			debug!("nothing to repaint, frame skipped");
			return Ok(FrameStats {
				skipped: true,
				..Default::default()
			});
		}

		if let Err(err) = self.draw(scene, &mut frame, &entities) {
			// The cleared region may hold shapes that were not redrawn.
			match frame.dirty_rectangle {
				Some(rect) => scene.vacated.push(rect),
				None => scene.mark_subtree_for_repaint(root),
			}
			return Err(err);
		}

		Ok(FrameStats {
			drawn: frame.drawn,
			..Default::default()
		})
	}

	fn draw(&mut self, scene: &mut Scene, frame: &mut Frame, entities: &[Entity]) -> RenderResult<()> {
		for plugin in &mut self.plugins {
			plugin.begin_frame(scene, frame, entities)?;
		}
		if !entities.is_empty() {
			for plugin in &mut self.plugins {
				plugin.render_frame(scene, frame, entities)?;
			}
		}
		for plugin in &mut self.plugins {
			plugin.end_frame(scene, frame, entities)?;
		}
		Ok(())
	}

	/// First opinion of a stage, defaulting to a hit.
	pub fn is_hit(&mut self, scene: &mut Scene, entity: Entity, point: Vec2) -> bool {
		self.plugins
			.iter_mut()
			.find_map(|plugin| plugin.is_hit(scene, entity, point))
			.unwrap_or(true)
	}

	/// Tears down every stage, even if one fails. The first error is returned.
	pub fn destroy(&mut self, scene: &mut Scene) -> RenderResult<()> {
		let mut result = Ok(());
		for plugin in &mut self.plugins {
			let destroyed = plugin.destroy(scene);
			if result.is_ok() {
				result = destroyed;
			}
		}
		self.dirty_rectangle = None;
		result
	}
}
