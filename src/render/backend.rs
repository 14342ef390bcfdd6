use std::collections::{HashMap, HashSet};

use glam::Vec2;
use tracing::{debug, warn};

use super::{ContextService, Frame, RenderError, RenderResult, RenderingPlugin, ShapeRenderer};
use crate::components::ShapeType;
use crate::config::CanvasConfig;
use crate::ecs::Entity;
use crate::scene::Scene;

/// Last stage of the pipeline: owns the drawing context and dispatches every entity to the
/// renderer registered for its shape type.
pub struct ShapeRendererPlugin<S: ContextService> {
	context: S,
	renderers: HashMap<ShapeType, Box<dyn ShapeRenderer<S::Context>>>,
	warned: HashSet<ShapeType>,
}

impl<S: ContextService> ShapeRendererPlugin<S> {
	pub fn new(context: S) -> Self {
		Self {
			context,
			renderers: HashMap::new(),
			warned: HashSet::new(),
		}
	}

	pub fn with_renderer(
		mut self,
		shape_type: impl Into<ShapeType>,
		renderer: impl ShapeRenderer<S::Context> + 'static,
	) -> Self {
		self.register(shape_type, renderer);
		self
	}

	/// Replaces any renderer previously registered for `shape_type`.
	pub fn register(&mut self, shape_type: impl Into<ShapeType>, renderer: impl ShapeRenderer<S::Context> + 'static) {
		let shape_type = shape_type.into();
		self.warned.remove(&shape_type);
		self.renderers.insert(shape_type, Box::new(renderer));
	}

	pub fn context_service(&self) -> &S {
		&self.context
	}
}

impl<S: ContextService> RenderingPlugin for ShapeRendererPlugin<S> {
	fn init(&mut self, config: &CanvasConfig) -> RenderResult<()> {
		self.context.init(config)
	}

	fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
		self.context.resize(width, height)
	}

	/// Forwards queued attribute writes to already initialized shapes, then initializes the
	/// shapes drawn for the first time.
	fn prepare_entities(
		&mut self,
		scene: &mut Scene,
		_frame: &mut Frame,
		entities: Vec<Entity>,
	) -> RenderResult<Vec<Entity>> {
		let ctx = self.context.context().ok_or(RenderError::ContextNotInitialized)?;

		for change in scene.take_attribute_changes() {
			if !scene.renderable(change.entity).map_or(false, |r| r.is_inited()) {
				continue;
			}
			let Some(view) = scene.entity_ref(change.entity) else {
				continue;
			};
			if let Some(renderer) = self.renderers.get_mut(view.shape_type) {
				renderer.on_attribute_changed(ctx, &view, &change.name, &change.value)?;
			}
		}

		for &entity in &entities {
			if scene.renderable(entity).map_or(true, |r| r.is_inited()) {
				continue;
			}
			if let Some(view) = scene.entity_ref(entity) {
				if let Some(renderer) = self.renderers.get_mut(view.shape_type) {
					renderer.init(ctx, &view)?;
				}
			}
			if let Some(renderable) = scene.renderable_mut(entity) {
				renderable.inited = true;
			}
		}

		Ok(entities)
	}

	fn begin_frame(&mut self, _scene: &mut Scene, frame: &mut Frame, _entities: &[Entity]) -> RenderResult<()> {
		self.context.clear(frame.dirty_rectangle.as_ref())
	}

	/// Draws in list order. An error stops the frame, leaving the rest of the list dirty.
	fn render_frame(&mut self, scene: &mut Scene, frame: &mut Frame, entities: &[Entity]) -> RenderResult<()> {
		for &entity in entities {
			let ctx = self.context.context().ok_or(RenderError::ContextNotInitialized)?;
			let Some(view) = scene.entity_ref(entity) else {
				continue;
			};

			match self.renderers.get_mut(view.shape_type) {
				Some(renderer) => {
					renderer.render(ctx, &view)?;
					frame.drawn += 1;
				}
				None => {
					if self.warned.insert(view.shape_type.clone()) {
						warn!("No renderer registered for shape type {}, skipping its shapes", view.shape_type);
					}
				}
			}

			if let Some(renderable) = scene.renderable_mut(entity) {
				renderable.mark_painted();
			}
		}
		Ok(())
	}

	fn end_frame(&mut self, _scene: &mut Scene, frame: &mut Frame, _entities: &[Entity]) -> RenderResult<()> {
		debug!("frame done, {} shapes drawn", frame.drawn);
		self.context.present()
	}

	fn destroy(&mut self, _scene: &mut Scene) -> RenderResult<()> {
		self.renderers.clear();
		self.warned.clear();
		self.context.destroy()
	}

	fn is_hit(&mut self, scene: &mut Scene, entity: Entity, point: Vec2) -> Option<bool> {
		let view = scene.entity_ref(entity)?;
		let renderer = self.renderers.get(view.shape_type)?;
		Some(renderer.is_hit(&view, point))
	}
}
