//! Headless backend that records draw calls instead of rasterizing them.
//!
//! Used by the demo and the tests to observe exactly what the pipeline draws, and in what order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::{Mat4, Vec2};

use super::{ContextService, EntityRef, RenderError, RenderResult, ShapeRenderer, ShapeRendererPlugin};
use crate::attrs::{AttrValue, Attributes};
use crate::components::ShapeType;
use crate::config::CanvasConfig;
use crate::ecs::Entity;
use crate::math::Aabb;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	Init {
		entity: Entity,
		shape_type: ShapeType,
	},
	AttributeChanged {
		entity: Entity,
		name: String,
	},
	Clear(Option<Aabb>),
	Draw {
		entity: Entity,
		shape_type: ShapeType,
		world_transform: Mat4,
		attrs: Attributes,
	},
	Present,
	Resize {
		width: u32,
		height: u32,
	},
}

/// Shared log of draw commands. Clones append to the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingLog(Arc<Mutex<Vec<DrawCommand>>>);

impl RecordingLog {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, Vec<DrawCommand>> {
		self.0.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn push(&self, command: DrawCommand) {
		self.lock().push(command);
	}

	pub fn commands(&self) -> Vec<DrawCommand> {
		self.lock().clone()
	}

	/// Empties the log, returning what it held.
	pub fn take(&self) -> Vec<DrawCommand> {
		std::mem::take(&mut *self.lock())
	}

	/// Entities drawn since the log was last emptied, in draw order.
	pub fn drawn(&self) -> Vec<Entity> {
		self.lock()
			.iter()
			.filter_map(|command| match command {
				DrawCommand::Draw { entity, .. } => Some(*entity),
				_ => None,
			})
			.collect()
	}
}

pub struct RecordingContext {
	pub log: RecordingLog,
	pub width: u32,
	pub height: u32,
}

pub struct RecordingContextService {
	log: RecordingLog,
	context: Option<RecordingContext>,
}

impl RecordingContextService {
	pub fn new(log: RecordingLog) -> Self {
		Self { log, context: None }
	}

	pub fn is_initialized(&self) -> bool {
		self.context.is_some()
	}
}

impl ContextService for RecordingContextService {
	type Context = RecordingContext;

	fn init(&mut self, config: &CanvasConfig) -> RenderResult<()> {
		if config.width == 0 || config.height == 0 {
			return Err(RenderError::ContextInit(format!(
				"canvas size {}x{} is empty",
				config.width, config.height
			)));
		}
		self.context = Some(RecordingContext {
			log: self.log.clone(),
			width: config.width,
			height: config.height,
		});
		Ok(())
	}

	fn context(&mut self) -> Option<&mut RecordingContext> {
		self.context.as_mut()
	}

	fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
		let ctx = self.context.as_mut().ok_or(RenderError::ContextNotInitialized)?;
		ctx.width = width;
		ctx.height = height;
		ctx.log.push(DrawCommand::Resize { width, height });
		Ok(())
	}

	fn destroy(&mut self) -> RenderResult<()> {
		self.context = None;
		Ok(())
	}

	fn clear(&mut self, region: Option<&Aabb>) -> RenderResult<()> {
		self.log.push(DrawCommand::Clear(region.copied()));
		Ok(())
	}

	fn present(&mut self) -> RenderResult<()> {
		self.log.push(DrawCommand::Present);
		Ok(())
	}
}

/// Records every call it gets.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
	/// Fail the next draw call, once.
	pub fail_next: bool,
}

impl RecordingRenderer {
	pub fn failing_once() -> Self {
		Self { fail_next: true }
	}
}

impl ShapeRenderer<RecordingContext> for RecordingRenderer {
	fn init(&mut self, ctx: &mut RecordingContext, entity: &EntityRef) -> RenderResult<()> {
		ctx.log.push(DrawCommand::Init {
			entity: entity.entity,
			shape_type: entity.shape_type.clone(),
		});
		Ok(())
	}

	fn render(&mut self, ctx: &mut RecordingContext, entity: &EntityRef) -> RenderResult<()> {
		if std::mem::take(&mut self.fail_next) {
			return Err(RenderError::Draw {
				entity: entity.entity,
				msg: "recording renderer told to fail".to_owned(),
			});
		}
		ctx.log.push(DrawCommand::Draw {
			entity: entity.entity,
			shape_type: entity.shape_type.clone(),
			world_transform: entity.world_transform,
			attrs: entity.attrs.clone(),
		});
		Ok(())
	}

	fn on_attribute_changed(
		&mut self,
		ctx: &mut RecordingContext,
		entity: &EntityRef,
		name: &str,
		_value: &AttrValue,
	) -> RenderResult<()> {
		ctx.log.push(DrawCommand::AttributeChanged {
			entity: entity.entity,
			name: name.to_owned(),
		});
		Ok(())
	}

	fn is_hit(&self, entity: &EntityRef, point: Vec2) -> bool {
		entity.aabb.map_or(false, |aabb| aabb.contains_point(point.x, point.y))
	}
}

/// Backend with a [`RecordingRenderer`] for every built-in shape type.
pub fn recording_backend(log: &RecordingLog) -> ShapeRendererPlugin<RecordingContextService> {
	ShapeType::BUILTIN.into_iter().fold(
		ShapeRendererPlugin::new(RecordingContextService::new(log.clone())),
		|backend, shape_type| backend.with_renderer(shape_type, RecordingRenderer::default()),
	)
}
