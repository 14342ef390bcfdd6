use glam::{Mat4, Quat, Vec3};

/// Local RTS triple of a node, its composed local matrix, and the cached world equivalents.
///
/// `local_dirty` means the local matrix is stale, `dirty` means the world matrix is stale.
/// Both are cleared by the scene's lazy update, never by hand.
#[derive(Clone, Debug)]
pub struct Transform {
	pub(crate) local_position: Vec3,
	pub(crate) local_rotation: Quat,
	pub(crate) local_scale: Vec3,
	pub(crate) local_transform: Mat4,
	pub(crate) position: Vec3,
	pub(crate) rotation: Quat,
	pub(crate) scaling: Vec3,
	pub(crate) world_transform: Mat4,
	pub(crate) local_dirty: bool,
	pub(crate) dirty: bool,
}

impl Default for Transform {
	fn default() -> Self {
		Self {
			local_position: Vec3::ZERO,
			local_rotation: Quat::IDENTITY,
			local_scale: Vec3::ONE,
			local_transform: Mat4::IDENTITY,
			position: Vec3::ZERO,
			rotation: Quat::IDENTITY,
			scaling: Vec3::ONE,
			world_transform: Mat4::IDENTITY,
			local_dirty: false,
			dirty: false,
		}
	}
}

impl Transform {
	pub fn local_position(&self) -> Vec3 {
		self.local_position
	}

	pub fn local_rotation(&self) -> Quat {
		self.local_rotation
	}

	pub fn local_scale(&self) -> Vec3 {
		self.local_scale
	}

	pub fn is_local_dirty(&self) -> bool {
		self.local_dirty
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	/// Replaces the local RTS by the decomposition of `m`.
	pub(crate) fn set_local_matrix(&mut self, m: Mat4) {
		let (scale, rotation, translation) = m.to_scale_rotation_translation();
		self.local_scale = scale;
		self.local_rotation = rotation;
		self.local_position = translation;
		self.local_dirty = true;
		self.dirty = true;
	}

	pub(crate) fn compose_local(&mut self) {
		if self.local_dirty {
			self.local_transform =
				Mat4::from_scale_rotation_translation(self.local_scale, self.local_rotation, self.local_position);
			self.local_dirty = false;
		}
	}

	/// Must run after `compose_local` within the same update.
	pub(crate) fn compose_world(&mut self, parent_world: Option<&Mat4>) {
		debug_assert!(!self.local_dirty);
		if self.dirty {
			self.world_transform = match parent_world {
				Some(parent) => *parent * self.local_transform,
				None => self.local_transform,
			};
			let (scaling, rotation, position) = self.world_transform.to_scale_rotation_translation();
			self.scaling = scaling;
			self.rotation = rotation;
			self.position = position;
			self.dirty = false;
		}
	}
}
