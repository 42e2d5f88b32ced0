// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Arena allocation for heap configurations and their interned vocabulary.
//!
//! A heap configuration is a hypergraph, and hypergraphs are full of cycles: selector edges point
//! back at their source, nonterminal edges attach to nodes that are attached to other edges, and
//! so on.  Rather than fight the borrow checker with reference-counted pointers, we store every
//! instance of a data type in a single vector (an _arena_) and refer to instances via their
//! index.  A [`Handle<T>`][`Handle`] is such an index, typed so that you cannot accidentally use a
//! node handle to look up a nonterminal edge.
//!
//! Unlike the arenas used for interning (which never forget anything), the arenas that hold the
//! elements of a heap configuration must support removal: the builder deletes nodes and edges
//! while it performs hyperedge replacement.  A removed slot is left empty and is never reused, so
//! handles stay stable for the lifetime of the arena, and, importantly, across clones.  That is
//! what lets a caller identify an edge in one configuration and then refer to the "same" edge in
//! a materialized copy.
//!
//! [`Handle`]: struct.Handle.html

use std::fmt::Debug;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;
use std::num::NonZeroU32;
use std::ops::Index;
use std::ops::IndexMut;

use bitvec::vec::BitVec;

//-------------------------------------------------------------------------------------------------
// Arenas and handles

/// A handle to an instance of type `T` that was allocated from an [`Arena`][].
///
/// #### Safety
///
/// Because of the type parameter `T`, the compiler can ensure that you don't use a handle for one
/// type to index into an arena of another type.  However, if you have multiple arenas for the
/// _same type_ (for instance, two unrelated heap configurations), we do not do anything to ensure
/// that you only use a handle with the corresponding arena.
#[repr(transparent)]
pub struct Handle<T> {
    index: NonZeroU32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: NonZeroU32) -> Handle<T> {
        Handle {
            index,
            _phantom: PhantomData,
        }
    }

    fn from_slot(slot: usize) -> Handle<T> {
        // Slot 0 is reserved in every arena, so a slot index is never zero.
        Handle::new(unsafe { NonZeroU32::new_unchecked(slot as u32) })
    }

    #[inline(always)]
    pub fn as_u32(self) -> u32 {
        self.index.get()
    }

    #[inline(always)]
    pub fn as_usize(self) -> usize {
        self.index.get() as usize
    }
}

// Normally we would #[derive] all of these traits, but the auto-derived implementations all
// require that T implement the trait as well.  We don't store any real instances of T inside of
// Handle, so our implementations do _not_ require that.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Handle<T> {
        Handle::new(self.index)
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.index.partial_cmp(&other.index)
    }
}

/// Manages the life cycle of instances of type `T`.  You can allocate new instances of `T` from
/// the arena, and remove them again.  Removing an instance leaves a hole; handles are never
/// recycled.
#[derive(Clone)]
pub struct Arena<T> {
    items: Vec<Option<T>>,
    live: usize,
}

impl<T> Arena<T> {
    /// Creates a new arena.
    pub fn new() -> Arena<T> {
        Arena {
            items: vec![None],
            live: 0,
        }
    }

    /// Adds a new instance to this arena, returning a stable handle to it.
    ///
    /// Note that we do not deduplicate instances of `T` in any way.  If you add two instances that
    /// have the same content, you will get distinct handles for each one.
    pub fn add(&mut self, item: T) -> Handle<T> {
        let slot = self.items.len();
        self.items.push(Some(item));
        self.live += 1;
        Handle::from_slot(slot)
    }

    /// Removes an instance from this arena, returning it if it was still present.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let removed = self.items.get_mut(handle.as_usize()).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// Returns whether the handle refers to an instance that is still present in this arena.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Dereferences a handle to an instance owned by this arena, if it has not been removed.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.as_usize()).and_then(Option::as_ref)
    }

    /// Dereferences a handle to an instance owned by this arena, returning a mutable reference to
    /// it if it has not been removed.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.as_usize()).and_then(Option::as_mut)
    }

    /// Returns an iterator of the handles of all live instances, in allocation order.  (Note that
    /// this iterator does not retain a reference to the arena!)
    pub fn iter_handles(&self) -> impl Iterator<Item = Handle<T>> {
        self.items
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, item)| item.is_some())
            .map(|(slot, _)| Handle::from_slot(slot))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Iterates over all live instances, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(slot, item)| item.as_ref().map(|item| (Handle::from_slot(slot), item)))
    }

    /// Returns the number of live instances stored in this arena.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns one more than the largest slot index ever handed out.  Useful for sizing
    /// [`HandleSet`][]s and [`SupplementalArena`][]s.
    ///
    /// [`HandleSet`]: struct.HandleSet.html
    /// [`SupplementalArena`]: struct.SupplementalArena.html
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena::new()
    }
}

/// Indexing **_panics_** if the instance has been removed.  Use [`get`][] if you don't know
/// whether it is still present.
///
/// [`get`]: #method.get
impl<T> Index<Handle<T>> for Arena<T> {
    type Output = T;
    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(item) => item,
            None => panic!("{:?} is not present in this arena", handle),
        }
    }
}

//-------------------------------------------------------------------------------------------------
// Supplemental arenas

/// A supplemental arena lets you store additional data about some data type that is itself stored
/// in an [`Arena`][].
///
/// We implement `Index` and `IndexMut` for a more ergonomic syntax.  Please note that when
/// indexing in an _immutable_ context, we **_panic_** if you try to access data for a handle that
/// doesn't exist in the arena.  (Use the [`get`][] method if you don't know whether the value
/// exists or not.)  In a _mutable_ context, we automatically create a `Default` instance of the
/// type if there isn't already an instance for that handle in the arena.
///
/// [`Arena`]: struct.Arena.html
/// [`get`]: #method.get
#[derive(Clone)]
pub struct SupplementalArena<H, T> {
    items: Vec<Option<T>>,
    _phantom: PhantomData<fn() -> H>,
}

impl<H, T> SupplementalArena<H, T> {
    /// Creates a new, empty supplemental arena.
    pub fn new() -> SupplementalArena<H, T> {
        SupplementalArena {
            items: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Returns the item belonging to a particular handle, if it exists.
    pub fn get(&self, handle: Handle<H>) -> Option<&T> {
        self.items.get(handle.as_usize()).and_then(Option::as_ref)
    }

    /// Stores the item belonging to a particular handle, returning the previous one.
    pub fn insert(&mut self, handle: Handle<H>, item: T) -> Option<T> {
        let index = handle.as_usize();
        if self.items.len() <= index {
            self.items.resize_with(index + 1, || None);
        }
        self.items[index].replace(item)
    }
}

impl<H, T> SupplementalArena<H, T>
where
    T: Default,
{
    /// Returns a mutable reference to the item belonging to a particular handle, creating it first
    /// (using the type's `Default` implementation) if it doesn't already exist.
    pub fn get_mut_or_default(&mut self, handle: Handle<H>) -> &mut T {
        let index = handle.as_usize();
        if self.items.len() <= index {
            self.items.resize_with(index + 1, || None);
        }
        self.items[index].get_or_insert_with(T::default)
    }
}

impl<H, T> Default for SupplementalArena<H, T> {
    fn default() -> SupplementalArena<H, T> {
        SupplementalArena::new()
    }
}

impl<H, T> Index<Handle<H>> for SupplementalArena<H, T> {
    type Output = T;
    fn index(&self, handle: Handle<H>) -> &T {
        match self.get(handle) {
            Some(item) => item,
            None => panic!("no supplemental data for {:?}", handle),
        }
    }
}

impl<H, T> IndexMut<Handle<H>> for SupplementalArena<H, T>
where
    T: Default,
{
    fn index_mut(&mut self, handle: Handle<H>) -> &mut T {
        self.get_mut_or_default(handle)
    }
}

//-------------------------------------------------------------------------------------------------
// Handle sets

/// Contains a set of handles, encoded efficiently using a bit set.
#[derive(Clone)]
pub struct HandleSet<T> {
    elements: BitVec<u32, bitvec::order::Lsb0>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> HandleSet<T> {
    /// Creates a new, empty handle set.
    pub fn new() -> HandleSet<T> {
        HandleSet::default()
    }

    /// Removes all elements from this handle set.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Returns whether this set contains a particular handle.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        let index = handle.as_usize();
        self.elements.get(index).map(|bit| *bit).unwrap_or(false)
    }

    /// Adds a handle to this set.
    pub fn add(&mut self, handle: Handle<T>) {
        let index = handle.as_usize();
        if self.elements.len() <= index {
            self.elements.resize(index + 1, false);
        }
        self.elements.set(index, true);
    }

    /// Removes a handle from this set.
    pub fn remove(&mut self, handle: Handle<T>) {
        let index = handle.as_usize();
        if self.elements.len() > index {
            self.elements.set(index, false);
        }
    }

    /// Returns an iterator over all of the handles in this set.
    pub fn iter(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.elements.iter_ones().map(Handle::from_slot)
    }
}

impl<T> Default for HandleSet<T> {
    fn default() -> HandleSet<T> {
        HandleSet {
            elements: BitVec::default(),
            _phantom: PhantomData,
        }
    }
}
