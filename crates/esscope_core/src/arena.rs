//! Arena allocation for syntax trees.
//!
//! Every node of a parsed or synthesized program lives in one bump arena.
//! Nodes reference each other with plain `&'a` references, so a resolved
//! identifier can point at its declaring node without copying it, and the
//! whole tree is freed at once when the arena is dropped.

use bumpalo::Bump;

/// The arena that owns all nodes of one or more syntax trees.
///
/// Values allocated here never run their destructors, so node payloads must
/// only hold references, `Copy` data, and `Cell`s.
pub struct AstArena {
    bump: Bump,
}

impl AstArena {
    /// Create a new arena with default capacity.
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Create a new arena with the specified initial capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// Get a reference to the underlying bump allocator.
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Allocate a value in the arena and return a shared reference to it.
    #[inline]
    pub fn alloc<T>(&self, val: T) -> &T {
        self.bump.alloc(val)
    }

    /// Allocate a string slice in the arena.
    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Move the elements of a vector into the arena as a slice.
    pub fn alloc_vec<T>(&self, items: Vec<T>) -> &[T] {
        if items.is_empty() {
            return &[];
        }
        self.bump.alloc_slice_fill_iter(items)
    }

    /// Returns the total bytes allocated in this arena.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for AstArena {
    fn default() -> Self {
        Self::new()
    }
}
