use std::any::TypeId;
use std::collections::HashMap;
use std::mem::{size_of, transmute, ManuallyDrop, MaybeUninit};

use super::Entity;

// to keep the provenance of the pointer in Vec (or any data struct that contains pointers),
// after transmutation they should be hosted in such a container for the compiler to properly reason
type VecBytes = [MaybeUninit<u8>; size_of::<Vec<()>>()];

/// type erased vec, only for World use. all methods unsafe as correctness solely dependent on usage
// so vec_bytes is aligned to the most
#[cfg_attr(target_pointer_width = "32", repr(align(4)))]
#[cfg_attr(target_pointer_width = "64", repr(align(8)))]
#[repr(C)]
struct AnyVec {
	vec_bytes: VecBytes,
	drop: fn(&mut VecBytes),
	swap_remove: fn(&mut VecBytes, usize),
}

impl Drop for AnyVec {
	fn drop(&mut self) {
		(self.drop)(&mut self.vec_bytes);
	}
}

impl AnyVec {
	// Self is inherently Send + Sync as a pack of bytes regardless of inner type, which is bad
	pub fn new<T: 'static + Send + Sync>() -> Self {
		let vec = ManuallyDrop::new(Vec::<T>::new());
		Self {
			// SAFETY: ManuallyDrop guaranteed to have same bit layout as inner, and inner is a proper Vec
			// provenance considerations present, see comment for VecBytes
			vec_bytes: unsafe { transmute::<ManuallyDrop<std::vec::Vec<T>>, VecBytes>(vec) },
			// SAFETY: only to be called once at end of lifetime, and vec_bytes contain a valid Vec throughout self lifetime
			drop: |vec_bytes| unsafe {
				let vec: Vec<T> = transmute(*vec_bytes);
				drop(vec);
			},
			// SAFETY: vec_bytes contain a valid Vec<T>, caller guarantees index in bounds
			swap_remove: |vec_bytes, index| unsafe {
				let vec: &mut Vec<T> = transmute(vec_bytes);
				drop(vec.swap_remove(index));
			},
		}
	}

	/// T MUST be the same as in new::<T>() for a same instance
	pub unsafe fn downcast_unchecked<T>(&self) -> &Vec<T> {
		transmute(&self.vec_bytes)
	}

	/// T MUST be the same as in new::<T>() for a same instance
	pub unsafe fn downcast_mut_unchecked<T>(&mut self) -> &mut Vec<T> {
		transmute(&mut self.vec_bytes)
	}

	/// Removes and drops the element at `index` without knowing its type.
	///
	/// # Safety
	///
	/// `index` must be in bounds.
	pub unsafe fn erase(&mut self, index: usize) {
		(self.swap_remove)(&mut self.vec_bytes, index);
	}
}

/// One component type: packed values, the owner of each row, and the row of each owner.
struct Column {
	data: AnyVec,
	owners: Vec<Entity>,
	rows: HashMap<Entity, usize>,
}

impl Column {
	fn new<T: Component>() -> Self {
		Self {
			data: AnyVec::new::<T>(),
			owners: Vec::new(),
			rows: HashMap::new(),
		}
	}

	/// Bookkeeping after a swap_remove at `row`: the last row has moved into `row`.
	fn forget_row(&mut self, row: usize) {
		self.owners.swap_remove(row);
		if let Some(moved) = self.owners.get(row) {
			self.rows.insert(*moved, row);
		}
	}

	fn erase(&mut self, entity: Entity) -> bool {
		let Some(row) = self.rows.remove(&entity) else {
			return false;
		};
		debug_assert!(row < self.owners.len());
		// SAFETY: rows only ever holds indices of live elements
		unsafe { self.data.erase(row) };
		self.forget_row(row);
		true
	}
}

/// Component storage of a scene: one type-erased column per component type, keyed by entity.
pub struct World {
	columns: HashMap<TypeId, Column>,
	names: HashMap<Entity, String>,
	next_id: u32,
}

pub trait Component: 'static + Send + Sync {}
impl<T: 'static + Send + Sync> Component for T {}

impl World {
	pub fn new() -> Self {
		Self {
			columns: HashMap::new(),
			names: HashMap::new(),
			next_id: 0,
		}
	}

	/// Allocates a fresh entity with a unique name `g_<id>`.
	pub fn spawn(&mut self) -> Entity {
		let entity = Entity(self.next_id);
		self.next_id += 1;
		self.names.insert(entity, format!("g_{}", entity.0));
		entity
	}

	/// Drops every component of `entity` and retires the handle. Returns `false` if it was not alive.
	pub fn despawn(&mut self, entity: Entity) -> bool {
		if self.names.remove(&entity).is_none() {
			return false;
		}
		for column in self.columns.values_mut() {
			column.erase(entity);
		}
		true
	}

	pub fn is_alive(&self, entity: Entity) -> bool {
		self.names.contains_key(&entity)
	}

	pub fn name(&self, entity: Entity) -> Option<&str> {
		self.names.get(&entity).map(String::as_str)
	}

	/// Number of live entities.
	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// Attaches `v` to `entity`, returning the component of the same type it replaces, if any.
	pub fn add<T: Component>(&mut self, entity: Entity, v: T) -> Option<T> {
		debug_assert!(self.is_alive(entity), "adding a component to dead entity {entity}");
		let column = self
			.columns
			.entry(TypeId::of::<T>())
			.or_insert_with(Column::new::<T>);
		// SAFETY: AnyVec in column must be of type T, enforced by hashing
		let values = unsafe { column.data.downcast_mut_unchecked::<T>() };

		match column.rows.get(&entity) {
			Some(&row) => Some(std::mem::replace(&mut values[row], v)),
			None => {
				column.rows.insert(entity, values.len());
				column.owners.push(entity);
				values.push(v);
				None
			}
		}
	}

	pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
		let column = self.columns.get(&TypeId::of::<T>())?;
		// SAFETY: AnyVec in column must be of type T, enforced by hashing
		let values = unsafe { column.data.downcast_unchecked::<T>() };

		let index = *column.rows.get(&entity)?;
		debug_assert!(index < values.len());
		// SAFETY: what has been inserted into rows should be a valid index
		Some(unsafe { values.get_unchecked(index) })
	}

	pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
		let column = self.columns.get_mut(&TypeId::of::<T>())?;
		let index = *column.rows.get(&entity)?;
		// SAFETY: AnyVec in column must be of type T, enforced by hashing
		let values = unsafe { column.data.downcast_mut_unchecked::<T>() };

		debug_assert!(index < values.len());
		// SAFETY: what has been inserted into rows should be a valid index
		Some(unsafe { values.get_unchecked_mut(index) })
	}

	pub fn has<T: Component>(&self, entity: Entity) -> bool {
		self.columns
			.get(&TypeId::of::<T>())
			.map_or(false, |column| column.rows.contains_key(&entity))
	}

	/// Detaches and returns the `T` of `entity`.
	pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
		let column = self.columns.get_mut(&TypeId::of::<T>())?;
		let row = column.rows.remove(&entity)?;
		// SAFETY: AnyVec in column must be of type T, enforced by hashing
		let value = unsafe { column.data.downcast_mut_unchecked::<T>() }.swap_remove(row);
		column.forget_row(row);
		Some(value)
	}

	/// Every entity currently owning a `T`, in storage order.
	pub fn entities_with<T: Component>(&self) -> &[Entity] {
		self.columns
			.get(&TypeId::of::<T>())
			.map_or(&[], |column| column.owners.as_slice())
	}
}

impl Default for World {
	fn default() -> Self {
		Self::new()
	}
}
