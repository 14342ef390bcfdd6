mod world;

use std::fmt;

pub use world::{Component, World};

/// Opaque handle of a scene node. Components are attached to it in a [`World`].
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Entity(pub(crate) u32);

impl Entity {
	pub fn id(self) -> u32 {
		self.0
	}
}

impl fmt::Display for Entity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}
