use glam::{Mat3, Mat4, Vec3};

/// Axis-aligned bounding box stored as center and half extents.
///
/// Half extents are kept non-negative so `min() <= max()` holds componentwise.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
	pub center: Vec3,
	pub half_extents: Vec3,
}

impl Aabb {
	pub fn new(center: Vec3, half_extents: Vec3) -> Self {
		Self {
			center,
			half_extents: half_extents.abs(),
		}
	}

	/// Box spanning two corners, given in any order.
	pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
		let min = a.min(b);
		let max = a.max(b);
		Self {
			center: (min + max) * 0.5,
			half_extents: (max - min) * 0.5,
		}
	}

	pub fn min(&self) -> Vec3 {
		self.center - self.half_extents
	}

	pub fn max(&self) -> Vec3 {
		self.center + self.half_extents
	}

	pub fn width(&self) -> f32 {
		self.half_extents.x * 2.
	}

	pub fn height(&self) -> f32 {
		self.half_extents.y * 2.
	}

	pub fn union(&self, other: &Aabb) -> Aabb {
		Aabb::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
	}

	/// Touching boxes count as intersecting.
	pub fn intersects(&self, other: &Aabb) -> bool {
		let (a_min, a_max) = (self.min(), self.max());
		let (b_min, b_max) = (other.min(), other.max());
		a_min.cmple(b_max).all() && b_min.cmple(a_max).all()
	}

	pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
		if !self.intersects(other) {
			return None;
		}
		Some(Aabb::from_min_max(
			self.min().max(other.min()),
			self.max().min(other.max()),
		))
	}

	/// Point test in the xy plane.
	pub fn contains_point(&self, x: f32, y: f32) -> bool {
		let (min, max) = (self.min(), self.max());
		x >= min.x && x <= max.x && y >= min.y && y <= max.y
	}

	/// Grows the box in x and y by `amount` on every side.
	pub fn pad(&self, amount: f32) -> Aabb {
		Aabb::new(
			self.center,
			self.half_extents + Vec3::new(amount, amount, 0.),
		)
	}

	/// Bounding box of this box after applying `m`.
	///
	/// Uses the absolute value of the linear part, which gives the tight box around the
	/// transformed corners without visiting them.
	pub fn transform(&self, m: &Mat4) -> Aabb {
		let linear = Mat3::from_mat4(*m);
		let abs = Mat3::from_cols(linear.x_axis.abs(), linear.y_axis.abs(), linear.z_axis.abs());
		Aabb {
			center: m.transform_point3(self.center),
			half_extents: abs * self.half_extents,
		}
	}
}

#[cfg(test)]
mod tests {
	use glam::{vec3, Quat};

	use super::*;
	use crate::math::{assert_close, assert_vec3_close};

	#[test]
	fn min_max_consistent() {
		let aabb = Aabb::from_min_max(vec3(4., 5., 0.), vec3(-2., 1., 0.));
		assert_vec3_close(aabb.min(), vec3(-2., 1., 0.));
		assert_vec3_close(aabb.max(), vec3(4., 5., 0.));
		assert_vec3_close(aabb.max() - aabb.min(), aabb.half_extents * 2.);
	}

	#[test]
	fn union_and_intersection() {
		let a = Aabb::from_min_max(vec3(0., 0., 0.), vec3(10., 10., 0.));
		let b = Aabb::from_min_max(vec3(5., 5., 0.), vec3(20., 8., 0.));
		let c = Aabb::from_min_max(vec3(30., 30., 0.), vec3(40., 40., 0.));

		let u = a.union(&b);
		assert_vec3_close(u.min(), vec3(0., 0., 0.));
		assert_vec3_close(u.max(), vec3(20., 10., 0.));

		let i = a.intersection(&b).unwrap();
		assert_vec3_close(i.min(), vec3(5., 5., 0.));
		assert_vec3_close(i.max(), vec3(10., 8., 0.));

		assert!(a.intersection(&c).is_none());
		assert!(!a.intersects(&c));
	}

	#[test]
	fn transform_rotated_square() {
		let aabb = Aabb::new(Vec3::ZERO, vec3(1., 1., 0.));
		let m = Mat4::from_rotation_translation(
			Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
			vec3(10., 0., 0.),
		);
		let moved = aabb.transform(&m);

		assert_vec3_close(moved.center, vec3(10., 0., 0.));
		assert_close(moved.half_extents.x, std::f32::consts::SQRT_2);
		assert_close(moved.half_extents.y, std::f32::consts::SQRT_2);
		assert_close(moved.half_extents.z, 0.);
	}

	#[test]
	fn pad_only_grows_xy() {
		let aabb = Aabb::new(Vec3::ZERO, vec3(2., 3., 0.)).pad(1.5);
		assert_vec3_close(aabb.half_extents, vec3(3.5, 4.5, 0.));
		assert!(aabb.contains_point(3.5, -4.5));
		assert!(!aabb.contains_point(3.6, 0.));
	}
}
