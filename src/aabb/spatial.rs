use glam::Vec2;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use crate::ecs::Entity;
use crate::math::Aabb;

/// Handle of an entry in the [`SpatialIndex`]: the indexed xy rectangle and its entity.
pub type SpatialNode = GeomWithData<Rectangle<[f32; 2]>, Entity>;

/// R-tree over the xy extent of world bounding boxes.
#[derive(Default)]
pub struct SpatialIndex {
	tree: RTree<SpatialNode>,
}

fn envelope(aabb: &Aabb) -> AABB<[f32; 2]> {
	let (min, max) = (aabb.min(), aabb.max());
	AABB::from_corners([min.x, min.y], [max.x, max.y])
}

impl SpatialIndex {
	pub fn new() -> Self {
		Self { tree: RTree::new() }
	}

	pub(crate) fn insert(&mut self, entity: Entity, aabb: &Aabb) -> SpatialNode {
		let (min, max) = (aabb.min(), aabb.max());
		let node = SpatialNode::new(Rectangle::from_corners([min.x, min.y], [max.x, max.y]), entity);
		self.tree.insert(node);
		node
	}

	pub(crate) fn remove(&mut self, node: &SpatialNode) -> bool {
		self.tree.remove(node).is_some()
	}

	/// Entities whose box intersects `aabb`, touching edges included.
	pub fn search(&self, aabb: &Aabb) -> Vec<Entity> {
		self.tree
			.locate_in_envelope_intersecting(&envelope(aabb))
			.map(|node| node.data)
			.collect()
	}

	pub fn search_point(&self, point: Vec2) -> Vec<Entity> {
		self.tree
			.locate_in_envelope_intersecting(&AABB::from_point([point.x, point.y]))
			.map(|node| node.data)
			.collect()
	}

	pub fn len(&self) -> usize {
		self.tree.size()
	}

	pub fn is_empty(&self) -> bool {
		self.tree.size() == 0
	}

	pub fn clear(&mut self) {
		self.tree = RTree::new();
	}
}
