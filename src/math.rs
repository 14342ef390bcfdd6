pub mod aabb;

use glam::{Mat3, Mat4, Vec4};

pub use aabb::Aabb;

/// Lifts a 2D affine matrix into 3D, leaving the z axis untouched.
pub fn mat3_to_mat4(m: Mat3) -> Mat4 {
	Mat4::from_cols(
		Vec4::new(m.x_axis.x, m.x_axis.y, 0., m.x_axis.z),
		Vec4::new(m.y_axis.x, m.y_axis.y, 0., m.y_axis.z),
		Vec4::Z,
		Vec4::new(m.z_axis.x, m.z_axis.y, 0., m.z_axis.z),
	)
}

#[cfg(test)]
pub(crate) fn assert_close(a: f32, b: f32) {
	assert!((a - b).abs() < 1e-4, "{a} is not close to {b}");
}

#[cfg(test)]
pub(crate) fn assert_vec3_close(a: glam::Vec3, b: glam::Vec3) {
	assert!(a.abs_diff_eq(b, 1e-4), "{a} is not close to {b}");
}
