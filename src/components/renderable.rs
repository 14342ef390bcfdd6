use std::fmt;

use crate::aabb::SpatialNode;
use crate::attrs::{AttrValue, Attributes};
use crate::ecs::Entity;
use crate::math::Aabb;

/// Kind of drawable, selecting the local bounding-box rule and the backend shape renderer.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum ShapeType {
	Circle,
	Ellipse,
	Rect,
	Image,
	Line,
	Polyline,
	Polygon,
	Path,
	Text,
	Custom(String),
}

impl ShapeType {
	pub fn as_str(&self) -> &str {
		match self {
			ShapeType::Circle => "circle",
			ShapeType::Ellipse => "ellipse",
			ShapeType::Rect => "rect",
			ShapeType::Image => "image",
			ShapeType::Line => "line",
			ShapeType::Polyline => "polyline",
			ShapeType::Polygon => "polygon",
			ShapeType::Path => "path",
			ShapeType::Text => "text",
			ShapeType::Custom(name) => name,
		}
	}

	pub const BUILTIN: [ShapeType; 9] = [
		ShapeType::Circle,
		ShapeType::Ellipse,
		ShapeType::Rect,
		ShapeType::Image,
		ShapeType::Line,
		ShapeType::Polyline,
		ShapeType::Polygon,
		ShapeType::Path,
		ShapeType::Text,
	];
}

impl From<&str> for ShapeType {
	fn from(name: &str) -> Self {
		match name {
			"circle" => ShapeType::Circle,
			"ellipse" => ShapeType::Ellipse,
			"rect" => ShapeType::Rect,
			"image" => ShapeType::Image,
			"line" => ShapeType::Line,
			"polyline" => ShapeType::Polyline,
			"polygon" => ShapeType::Polygon,
			"path" => ShapeType::Path,
			"text" => ShapeType::Text,
			other => ShapeType::Custom(other.to_owned()),
		}
	}
}

impl fmt::Display for ShapeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Local, untransformed bounds derived from shape type and attributes.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
	pub(crate) aabb: Option<Aabb>,
}

impl Geometry {
	pub fn aabb(&self) -> Option<Aabb> {
		self.aabb
	}
}

#[derive(Clone, Debug)]
pub struct Renderable {
	pub(crate) shape_type: ShapeType,
	pub(crate) attrs: Attributes,
	/// World-space bounds.
	pub(crate) aabb: Option<Aabb>,
	pub(crate) aabb_dirty: bool,
	pub(crate) dirty: bool,
	/// Region painted before the pending repaint, kept until the shape is drawn again.
	pub(crate) dirty_aabb: Option<Aabb>,
	pub(crate) spatial_node: Option<SpatialNode>,
	pub(crate) inited: bool,
	pub(crate) clip_path: Option<Entity>,
}

impl Renderable {
	pub(crate) fn new(shape_type: ShapeType, attrs: Attributes) -> Self {
		Self {
			shape_type,
			attrs,
			aabb: None,
			aabb_dirty: true,
			dirty: true,
			dirty_aabb: None,
			spatial_node: None,
			inited: false,
			clip_path: None,
		}
	}

	/// Copy for a new entity: same type, attributes and clip, fresh bookkeeping.
	pub(crate) fn duplicate(&self) -> Self {
		let mut copy = Renderable::new(self.shape_type.clone(), self.attrs.clone());
		copy.clip_path = self.clip_path;
		copy
	}

	pub fn shape_type(&self) -> &ShapeType {
		&self.shape_type
	}

	pub fn attrs(&self) -> &Attributes {
		&self.attrs
	}

	pub fn attr(&self, name: &str) -> Option<&AttrValue> {
		self.attrs.get(name)
	}

	pub fn aabb(&self) -> Option<Aabb> {
		self.aabb
	}

	pub fn dirty_aabb(&self) -> Option<Aabb> {
		self.dirty_aabb
	}

	pub fn is_aabb_dirty(&self) -> bool {
		self.aabb_dirty
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	pub fn is_inited(&self) -> bool {
		self.inited
	}

	pub fn clip_path(&self) -> Option<Entity> {
		self.clip_path
	}

	pub(crate) fn mark_painted(&mut self) {
		self.dirty = false;
		self.dirty_aabb = None;
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CullStrategy {
	/// Tested against every registered culling strategy.
	#[default]
	Standard,
	/// Never culled.
	Never,
}

/// Result of the culling pass, distinct from the user-facing [`Visible`](super::Visible) flag.
#[derive(Clone, Debug)]
pub struct Cullable {
	pub(crate) visible: bool,
	pub(crate) strategy: CullStrategy,
}

impl Default for Cullable {
	fn default() -> Self {
		Self {
			visible: true,
			strategy: CullStrategy::Standard,
		}
	}
}

impl Cullable {
	pub fn is_visible(&self) -> bool {
		self.visible
	}

	pub fn strategy(&self) -> CullStrategy {
		self.strategy
	}
}
