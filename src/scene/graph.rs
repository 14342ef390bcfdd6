use std::collections::HashMap;
use std::fmt;

use indextree::{Arena, NodeId};

use super::{SceneError, SceneResult};
use crate::ecs::Entity;

/// Parent/children links of the scene, plus the memoized render order.
///
/// Every entity is a node of the arena. Unparented nodes are roots, kept in creation order.
#[derive(Debug)]
pub struct SceneGraph {
	arena: Arena<Entity>,
	node_ids: HashMap<Entity, NodeId>,
	roots: Vec<Entity>,
	sorted: Vec<Entity>,
	sort_dirty: bool,
}

impl SceneGraph {
	pub fn new() -> Self {
		Self {
			arena: Arena::new(),
			node_ids: HashMap::new(),
			roots: Vec::new(),
			sorted: Vec::new(),
			sort_dirty: true,
		}
	}

	fn node_id(&self, entity: Entity) -> SceneResult<NodeId> {
		self.node_ids
			.get(&entity)
			.copied()
			.ok_or(SceneError::UnknownEntity(entity))
	}

	fn entity_of(&self, id: NodeId) -> Entity {
		*self.arena[id].get()
	}

	/// Registers `entity` as a new root.
	pub(crate) fn insert(&mut self, entity: Entity) {
		let id = self.arena.new_node(entity);
		if self.node_ids.insert(entity, id).is_some() {
			panic!("Entity {entity} inserted into the scene graph twice.");
		}
		self.roots.push(entity);
		self.sort_dirty = true;
	}

	/// Removes a node that has no children left.
	pub(crate) fn remove(&mut self, entity: Entity) -> SceneResult<()> {
		let id = self.node_id(entity)?;
		debug_assert!(id.children(&self.arena).next().is_none(), "removing a node with children");
		id.remove(&mut self.arena);
		self.node_ids.remove(&entity);
		self.roots.retain(|root| *root != entity);
		self.sort_dirty = true;
		Ok(())
	}

	pub fn contains(&self, entity: Entity) -> bool {
		self.node_ids.contains_key(&entity)
	}

	/// Moves `entity` under `parent`, before the child at `index` or last.
	pub(crate) fn attach(&mut self, entity: Entity, parent: Entity, index: Option<usize>) -> SceneResult<()> {
		let id = self.node_id(entity)?;
		let parent_id = self.node_id(parent)?;
		if entity == parent || parent_id.ancestors(&self.arena).any(|ancestor| ancestor == id) {
			return Err(SceneError::Cycle { child: entity, parent });
		}

		self.detach(entity);

		let sibling = index.and_then(|index| parent_id.children(&self.arena).nth(index));
		let result = match sibling {
			Some(sibling) => sibling.checked_insert_before(id, &mut self.arena),
			None => parent_id.checked_append(id, &mut self.arena),
		};
		result.map_err(|_| SceneError::Cycle { child: entity, parent })?;

		self.roots.retain(|root| *root != entity);
		self.sort_dirty = true;
		Ok(())
	}

	/// Unlinks `entity` from its parent, making it a root. Returns the former parent.
	pub(crate) fn detach(&mut self, entity: Entity) -> Option<Entity> {
		let parent = self.parent(entity)?;
		let id = self.node_ids[&entity];
		id.detach(&mut self.arena);
		self.roots.push(entity);
		self.sort_dirty = true;
		Some(parent)
	}

	pub fn parent(&self, entity: Entity) -> Option<Entity> {
		let id = self.node_ids.get(&entity)?;
		let parent = self.arena.get(*id)?.parent()?;
		Some(self.entity_of(parent))
	}

	pub fn children(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
		self.node_ids
			.get(&entity)
			.into_iter()
			.flat_map(|id| id.children(&self.arena))
			.map(|id| self.entity_of(id))
	}

	/// Parent, grandparent... up to the root, `entity` excluded.
	pub fn ancestors(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
		self.node_ids
			.get(&entity)
			.into_iter()
			.flat_map(|id| id.ancestors(&self.arena).skip(1))
			.map(|id| self.entity_of(id))
	}

	/// Pre-order subtree of `entity`, `entity` excluded.
	pub fn descendants(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
		self.node_ids
			.get(&entity)
			.into_iter()
			.flat_map(|id| id.descendants(&self.arena).skip(1))
			.map(|id| self.entity_of(id))
	}

	/// Unparented entities, in creation order.
	pub fn roots(&self) -> &[Entity] {
		&self.roots
	}

	/// Pre-order depth-first walk from `entity`. Returning `true` from `visitor` skips that
	/// node's subtree.
	pub fn visit(&self, entity: Entity, visitor: &mut impl FnMut(Entity) -> bool) {
		if visitor(entity) {
			return;
		}
		let children: Vec<Entity> = self.children(entity).collect();
		for child in children {
			self.visit(child, visitor);
		}
	}

	pub fn invalidate_sort(&mut self) {
		self.sort_dirty = true;
	}

	pub fn is_sort_dirty(&self) -> bool {
		self.sort_dirty
	}

	/// Render order: every child before its parent, siblings (and roots) by ascending z-index,
	/// ties kept in insertion order. Memoized until the tree or a z-index changes.
	pub fn sort(&mut self, z_index: impl Fn(Entity) -> i32) -> &[Entity] {
		if self.sort_dirty {
			let mut sorted = Vec::with_capacity(self.node_ids.len());
			let mut roots = self.roots.clone();
			roots.sort_by_key(|root| z_index(*root));
			for root in roots {
				self.flatten(root, &z_index, &mut sorted);
			}
			self.sorted = sorted;
			self.sort_dirty = false;
		}
		&self.sorted
	}

	fn flatten(&self, entity: Entity, z_index: &impl Fn(Entity) -> i32, out: &mut Vec<Entity>) {
		let mut children: Vec<Entity> = self.children(entity).collect();
		children.sort_by_key(|child| z_index(*child));
		for child in children {
			self.flatten(child, z_index, out);
		}
		out.push(entity);
	}

	/// Writes every tree, one line per node through `line(f, depth, entity)`.
	pub(crate) fn fmt_tree(
		&self,
		f: &mut fmt::Formatter<'_>,
		mut line: impl FnMut(&mut fmt::Formatter<'_>, usize, Entity) -> fmt::Result,
	) -> fmt::Result {
		for root in &self.roots {
			let Some(root_id) = self.node_ids.get(root) else {
				continue;
			};
			for edge in root_id.traverse(&self.arena) {
				if let indextree::NodeEdge::Start(id) = edge {
					let depth = id.ancestors(&self.arena).count() - 1;
					line(f, depth, self.entity_of(id))?;
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn graph_with(n: u32) -> (SceneGraph, Vec<Entity>) {
		let mut graph = SceneGraph::new();
		let entities: Vec<Entity> = (0..n).map(Entity).collect();
		for entity in &entities {
			graph.insert(*entity);
		}
		(graph, entities)
	}

	#[test]
	fn attach_is_bidirectional() {
		let (mut graph, e) = graph_with(4);
		graph.attach(e[1], e[0], None).unwrap();
		graph.attach(e[2], e[0], None).unwrap();
		graph.attach(e[3], e[0], Some(0)).unwrap();

		assert_eq!(graph.children(e[0]).collect::<Vec<_>>(), vec![e[3], e[1], e[2]]);
		assert_eq!(graph.parent(e[2]), Some(e[0]));
		assert_eq!(graph.roots(), &[e[0]]);

		// reattaching moves, never duplicates
		graph.attach(e[3], e[1], None).unwrap();
		assert_eq!(graph.children(e[0]).collect::<Vec<_>>(), vec![e[1], e[2]]);
		assert_eq!(graph.ancestors(e[3]).collect::<Vec<_>>(), vec![e[1], e[0]]);
		assert_eq!(graph.descendants(e[0]).collect::<Vec<_>>(), vec![e[1], e[3], e[2]]);

		assert_eq!(graph.detach(e[1]), Some(e[0]));
		assert_eq!(graph.parent(e[1]), None);
		assert_eq!(graph.roots(), &[e[0], e[1]]);
		assert_eq!(graph.detach(e[1]), None);
	}

	#[test]
	fn cycles_rejected() {
		let (mut graph, e) = graph_with(3);
		graph.attach(e[1], e[0], None).unwrap();
		graph.attach(e[2], e[1], None).unwrap();

		assert_eq!(
			graph.attach(e[0], e[2], None),
			Err(SceneError::Cycle { child: e[0], parent: e[2] })
		);
		assert!(graph.attach(e[0], e[0], None).is_err());
		assert_eq!(graph.parent(e[2]), Some(e[1]));
	}

	#[test]
	fn visit_prunes_on_true() {
		let (mut graph, e) = graph_with(5);
		graph.attach(e[1], e[0], None).unwrap();
		graph.attach(e[2], e[1], None).unwrap();
		graph.attach(e[3], e[0], None).unwrap();
		graph.attach(e[4], e[3], None).unwrap();

		let mut seen = Vec::new();
		graph.visit(e[0], &mut |entity| {
			seen.push(entity);
			entity == e[1]
		});
		assert_eq!(seen, vec![e[0], e[1], e[3], e[4]]);
	}

	#[test]
	fn sort_children_first_by_z() {
		let (mut graph, e) = graph_with(4);
		for child in &e[1..] {
			graph.attach(*child, e[0], None).unwrap();
		}
		let mut z = HashMap::from([(e[0], 0), (e[1], 3), (e[2], 1), (e[3], 2)]);

		assert_eq!(graph.sort(|entity| z[&entity]), &[e[2], e[3], e[1], e[0]]);
		assert!(!graph.is_sort_dirty());

		// memoized until invalidated
		z.insert(e[1], -1);
		assert_eq!(graph.sort(|entity| z[&entity]), &[e[2], e[3], e[1], e[0]]);
		graph.invalidate_sort();
		assert_eq!(graph.sort(|entity| z[&entity]), &[e[1], e[2], e[3], e[0]]);
	}

	#[test]
	fn remove_leaf() {
		let (mut graph, e) = graph_with(2);
		graph.attach(e[1], e[0], None).unwrap();
		graph.remove(e[1]).unwrap();
		assert!(!graph.contains(e[1]));
		assert_eq!(graph.children(e[0]).count(), 0);
		assert_eq!(graph.remove(e[1]), Err(SceneError::UnknownEntity(e[1])));
	}
}
