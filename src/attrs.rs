//! Shape attributes: the style and geometry dictionary carried by every renderable.

use std::collections::BTreeMap;

use glam::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
	Number(f32),
	Bool(bool),
	String(String),
	Vec2(Vec2),
	Points(Vec<Vec2>),
}

impl AttrValue {
	pub fn as_number(&self) -> Option<f32> {
		match self {
			AttrValue::Number(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			AttrValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttrValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_vec2(&self) -> Option<Vec2> {
		match self {
			AttrValue::Vec2(v) => Some(*v),
			AttrValue::Points(points) if points.len() == 1 => Some(points[0]),
			_ => None,
		}
	}

	pub fn as_points(&self) -> Option<&[Vec2]> {
		match self {
			AttrValue::Points(points) => Some(points),
			_ => None,
		}
	}
}

impl From<f32> for AttrValue {
	fn from(n: f32) -> Self {
		AttrValue::Number(n)
	}
}

impl From<i32> for AttrValue {
	fn from(n: i32) -> Self {
		AttrValue::Number(n as f32)
	}
}

impl From<bool> for AttrValue {
	fn from(b: bool) -> Self {
		AttrValue::Bool(b)
	}
}

impl From<&str> for AttrValue {
	fn from(s: &str) -> Self {
		AttrValue::String(s.to_owned())
	}
}

impl From<String> for AttrValue {
	fn from(s: String) -> Self {
		AttrValue::String(s)
	}
}

impl From<Vec2> for AttrValue {
	fn from(v: Vec2) -> Self {
		AttrValue::Vec2(v)
	}
}

impl From<[f32; 2]> for AttrValue {
	fn from(v: [f32; 2]) -> Self {
		AttrValue::Vec2(Vec2::from(v))
	}
}

impl From<Vec<Vec2>> for AttrValue {
	fn from(points: Vec<Vec2>) -> Self {
		AttrValue::Points(points)
	}
}

impl From<Vec<[f32; 2]>> for AttrValue {
	fn from(points: Vec<[f32; 2]>) -> Self {
		AttrValue::Points(points.into_iter().map(Vec2::from).collect())
	}
}

pub type Attributes = BTreeMap<String, AttrValue>;

/// Attributes that change the local bounding box of a shape.
pub const GEOMETRY_ATTRIBUTES: &[&str] = &[
	"x",
	"y",
	"r",
	"rx",
	"ry",
	"width",
	"height",
	"lineWidth",
	"lineAppendWidth",
	"anchor",
	"x1",
	"y1",
	"x2",
	"y2",
	"points",
];

pub fn is_geometry_attribute(name: &str) -> bool {
	GEOMETRY_ATTRIBUTES.contains(&name)
}

/// Typed lookups on an attribute map.
pub trait AttrsExt {
	fn get_number(&self, key: &str) -> Option<f32>;
	fn get_str(&self, key: &str) -> Option<&str>;
	fn get_vec2(&self, key: &str) -> Option<Vec2>;
	fn get_points(&self, key: &str) -> Option<&[Vec2]>;

	fn number_or(&self, key: &str, default: f32) -> f32 {
		self.get_number(key).unwrap_or(default)
	}
}

impl AttrsExt for Attributes {
	fn get_number(&self, key: &str) -> Option<f32> {
		self.get(key)?.as_number()
	}

	fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key)?.as_str()
	}

	fn get_vec2(&self, key: &str) -> Option<Vec2> {
		self.get(key)?.as_vec2()
	}

	fn get_points(&self, key: &str) -> Option<&[Vec2]> {
		self.get(key)?.as_points()
	}
}

/// Builds an [`Attributes`] map: `attrs! { "r" => 10., "fill" => "#f00" }`.
#[macro_export]
macro_rules! attrs {
	($($key:expr => $value:expr),* $(,)?) => {{
		#[allow(unused_mut)]
		let mut attrs = $crate::attrs::Attributes::new();
		$(attrs.insert(::std::string::String::from($key), $crate::attrs::AttrValue::from($value));)*
		attrs
	}};
}
