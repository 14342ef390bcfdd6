mod json;

use std::fmt;
use std::str::FromStr;

pub use self::json::{JsonError, JsonObject, JsonResult};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error(transparent)]
	Parse(#[from] ::json::Error),
	#[error(transparent)]
	Json(#[from] JsonError),
	#[error("Unknown renderer {0:?}")]
	UnknownRenderer(String),
}

/// Backend family a canvas renders with.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RendererKind {
	#[default]
	Canvas,
	Svg,
	WebGl,
}

impl FromStr for RendererKind {
	type Err = ConfigError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		match name.to_ascii_lowercase().as_str() {
			"canvas" => Ok(RendererKind::Canvas),
			"svg" => Ok(RendererKind::Svg),
			"webgl" => Ok(RendererKind::WebGl),
			_ => Err(ConfigError::UnknownRenderer(name.to_owned())),
		}
	}
}

impl fmt::Display for RendererKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			RendererKind::Canvas => "canvas",
			RendererKind::Svg => "svg",
			RendererKind::WebGl => "webgl",
		})
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DirtyRectangleConfig {
	/// Repaint only the merged dirty region instead of the whole canvas.
	pub enable: bool,
	/// Log every merged dirty region.
	pub debug: bool,
}

impl Default for DirtyRectangleConfig {
	fn default() -> Self {
		Self {
			enable: true,
			debug: false,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct CanvasConfig {
	pub width: u32,
	pub height: u32,
	/// Identifier of the host surface the backend draws into.
	pub container: Option<String>,
	pub renderer: RendererKind,
	pub dirty_rectangle: DirtyRectangleConfig,
	pub offscreen_canvas: bool,
}

impl Default for CanvasConfig {
	fn default() -> Self {
		Self {
			width: 640,
			height: 480,
			container: None,
			renderer: RendererKind::default(),
			dirty_rectangle: DirtyRectangleConfig::default(),
			offscreen_canvas: false,
		}
	}
}

fn nested<T>(key: &str, res: JsonResult<T>) -> JsonResult<T> {
	res.map_err(|e| e.nested(key))
}

impl CanvasConfig {
	/// Reads a config object such as
	/// `{"width": 800, "renderer": "svg", "dirtyRectangle": {"enable": false}}`.
	/// Absent keys keep their default value.
	pub fn from_json(text: &str) -> Result<Self, ConfigError> {
		let value = ::json::parse(text)?;
		let obj = JsonObject::from_value("(root)", &value)?;
		let mut config = CanvasConfig::default();

		if obj.has("width") {
			config.width = obj.get_u32("width")?;
		}
		if obj.has("height") {
			config.height = obj.get_u32("height")?;
		}
		if obj.has("container") {
			config.container = Some(obj.get_str("container")?.to_owned());
		}
		if obj.has("renderer") {
			config.renderer = obj.get_str("renderer")?.parse()?;
		}
		if obj.has("dirtyRectangle") {
			let dirty = obj.get_object("dirtyRectangle")?;
			if dirty.has("enable") {
				config.dirty_rectangle.enable = nested("dirtyRectangle", dirty.get_bool("enable"))?;
			}
			if dirty.has("debug") {
				config.dirty_rectangle.debug = nested("dirtyRectangle", dirty.get_bool("debug"))?;
			}
		}
		if obj.has("offscreenCanvas") {
			config.offscreen_canvas = obj.get_bool("offscreenCanvas")?;
		}

		Ok(config)
	}
}

/// Partial update applied by `Canvas::set_config`.
#[derive(Clone, Debug, Default)]
pub struct CanvasConfigPatch {
	pub width: Option<u32>,
	pub height: Option<u32>,
	pub container: Option<String>,
	pub renderer: Option<RendererKind>,
	pub dirty_rectangle: Option<DirtyRectangleConfig>,
	pub offscreen_canvas: Option<bool>,
}

impl CanvasConfigPatch {
	pub fn apply(self, config: &mut CanvasConfig) {
		if let Some(width) = self.width {
			config.width = width;
		}
		if let Some(height) = self.height {
			config.height = height;
		}
		if let Some(container) = self.container {
			config.container = Some(container);
		}
		if let Some(renderer) = self.renderer {
			config.renderer = renderer;
		}
		if let Some(dirty_rectangle) = self.dirty_rectangle {
			config.dirty_rectangle = dirty_rectangle;
		}
		if let Some(offscreen_canvas) = self.offscreen_canvas {
			config.offscreen_canvas = offscreen_canvas;
		}
	}
}
