//! Local bounding boxes from shape attributes, and the spatial index of world boxes.

mod spatial;

use glam::{vec3, Vec2, Vec3};

use crate::attrs::{Attributes, AttrsExt};
use crate::components::ShapeType;
use crate::math::Aabb;

pub use spatial::{SpatialIndex, SpatialNode};

/// Untransformed bounds of a shape, or `None` for shapes whose extent is not known to the core
/// (paths, text, custom shapes).
///
/// Stroke padding `lineWidth / 2 + lineAppendWidth` is added on x and y. Circles and ellipses are
/// anchored at their center by default, rects and images at their top-left corner.
pub fn update_local_aabb(shape_type: &ShapeType, attrs: &Attributes) -> Option<Aabb> {
	let padding = attrs.number_or("lineWidth", 0.) / 2. + attrs.number_or("lineAppendWidth", 0.);

	let (half_extents, default_anchor) = match shape_type {
		ShapeType::Circle => {
			let r = attrs.number_or("r", 0.);
			(Vec2::splat(r), 0.5)
		}
		ShapeType::Ellipse => (Vec2::new(attrs.number_or("rx", 0.), attrs.number_or("ry", 0.)), 0.5),
		ShapeType::Rect | ShapeType::Image => (
			Vec2::new(attrs.number_or("width", 0.), attrs.number_or("height", 0.)) / 2.,
			0.,
		),
		ShapeType::Line => {
			let a = Vec2::new(attrs.number_or("x1", 0.), attrs.number_or("y1", 0.));
			let b = Vec2::new(attrs.number_or("x2", 0.), attrs.number_or("y2", 0.));
			return points_aabb(&[a, b]).map(|aabb| aabb.pad(padding));
		}
		ShapeType::Polyline | ShapeType::Polygon => {
			return points_aabb(attrs.get_points("points")?).map(|aabb| aabb.pad(padding));
		}
		ShapeType::Path | ShapeType::Text | ShapeType::Custom(_) => return None,
	};

	let half_extents = half_extents.abs();
	let anchor = attrs.get_vec2("anchor").unwrap_or(Vec2::splat(default_anchor));
	let center = vec3(
		(1. - 2. * anchor.x) * half_extents.x,
		(1. - 2. * anchor.y) * half_extents.y,
		0.,
	);

	Some(Aabb::new(center, half_extents.extend(0.)).pad(padding))
}

fn points_aabb(points: &[Vec2]) -> Option<Aabb> {
	let first = points.first()?.extend(0.);
	let (min, max) = points
		.iter()
		.map(|p| p.extend(0.))
		.fold((first, first), |(min, max), p: Vec3| (min.min(p), max.max(p)));
	Some(Aabb::from_min_max(min, max))
}

#[cfg(test)]
mod tests {
	use glam::{vec2, vec3};

	use super::*;
	use crate::attrs;
	use crate::math::assert_vec3_close;

	#[test]
	fn circle_padded_by_stroke() {
		let aabb = update_local_aabb(&ShapeType::Circle, &attrs! { "r" => 10., "lineWidth" => 2. }).unwrap();
		assert_vec3_close(aabb.center, Vec3::ZERO);
		assert_vec3_close(aabb.half_extents, vec3(11., 11., 0.));
		assert_vec3_close(aabb.max() - aabb.min(), aabb.half_extents * 2.);
	}

	#[test]
	fn rect_anchored_top_left() {
		let aabb = update_local_aabb(&ShapeType::Rect, &attrs! { "width" => 20., "height" => 10. }).unwrap();
		assert_vec3_close(aabb.min(), Vec3::ZERO);
		assert_vec3_close(aabb.max(), vec3(20., 10., 0.));

		let centered = update_local_aabb(
			&ShapeType::Rect,
			&attrs! { "width" => 20., "height" => 10., "anchor" => [0.5, 0.5], "lineAppendWidth" => 1. },
		)
		.unwrap();
		assert_vec3_close(centered.center, Vec3::ZERO);
		assert_vec3_close(centered.half_extents, vec3(11., 6., 0.));
	}

	#[test]
	fn ellipse_and_line() {
		let ellipse = update_local_aabb(&ShapeType::Ellipse, &attrs! { "rx" => 4., "ry" => 2. }).unwrap();
		assert_vec3_close(ellipse.half_extents, vec3(4., 2., 0.));

		let line = update_local_aabb(
			&ShapeType::Line,
			&attrs! { "x1" => 10., "y1" => 5., "x2" => 0., "y2" => 15., "lineWidth" => 2. },
		)
		.unwrap();
		assert_vec3_close(line.min(), vec3(-1., 4., 0.));
		assert_vec3_close(line.max(), vec3(11., 16., 0.));
	}

	#[test]
	fn polygon_from_points() {
		let attrs = attrs! { "points" => vec![vec2(0., 0.), vec2(4., -2.), vec2(1., 3.)] };
		let aabb = update_local_aabb(&ShapeType::Polygon, &attrs).unwrap();
		assert_vec3_close(aabb.min(), vec3(0., -2., 0.));
		assert_vec3_close(aabb.max(), vec3(4., 3., 0.));

		assert!(update_local_aabb(&ShapeType::Polyline, &Attributes::new()).is_none());
	}

	#[test]
	fn unknown_extent() {
		assert!(update_local_aabb(&ShapeType::Path, &attrs! { "path" => "M0 0 L10 10" }).is_none());
		assert!(update_local_aabb(&ShapeType::Text, &attrs! { "text" => "hi" }).is_none());
	}
}
