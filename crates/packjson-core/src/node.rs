//! Arena-resident node types behind strings, arrays and objects.
//!
//! Nodes store child values as raw packed words rather than `Value<'a>` so
//! that they carry no lifetime; the lifetime is reattached by the iterators in
//! [`crate::value`].

use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use crate::arena::Arena;

/// Length-prefixed string: `len` bytes follow the header, then a NUL.
#[repr(C)]
pub(crate) struct StrNode {
    len: usize,
}

impl StrNode {
    /// Copy `bytes` into the arena, NUL-terminated.
    pub(crate) fn alloc(arena: &Arena, bytes: &[u8]) -> NonNull<StrNode> {
        let header = mem::size_of::<StrNode>();
        let raw = arena.allocate(header + bytes.len() + 1, mem::align_of::<StrNode>());
        // SAFETY: `raw` points to `header + len + 1` writable bytes aligned for `StrNode`.
        unsafe {
            let node = raw.cast::<StrNode>();
            node.as_ptr().write(StrNode { len: bytes.len() });
            let data = raw.as_ptr().add(header);
            ptr::copy_nonoverlapping(bytes.as_ptr(), data, bytes.len());
            data.add(bytes.len()).write(0);
            node
        }
    }

    /// The string bytes, with the trailing NUL when `with_nul` is set.
    ///
    /// # Safety
    ///
    /// `node` must come from [`StrNode::alloc`] on an arena that outlives `'a`.
    pub(crate) unsafe fn bytes<'a>(node: NonNull<StrNode>, with_nul: bool) -> &'a [u8] {
        // SAFETY: the header and `len + 1` bytes after it were initialized by `alloc`.
        unsafe {
            let len = (*node.as_ptr()).len;
            let data = node.as_ptr().cast::<u8>().add(mem::size_of::<StrNode>());
            slice::from_raw_parts(data, len + usize::from(with_nul))
        }
    }
}

/// One array cell.
#[derive(Clone, Copy)]
#[repr(C)]
pub(crate) struct Element {
    pub(crate) next: Option<NonNull<Element>>,
    pub(crate) value: u64,
}

/// One object member.
#[derive(Clone, Copy)]
#[repr(C)]
pub(crate) struct Pair {
    pub(crate) next: Option<NonNull<Pair>>,
    pub(crate) key: NonNull<StrNode>,
    pub(crate) value: u64,
}

pub(crate) trait Linked {
    fn set_next(&mut self, next: NonNull<Self>);
}

impl Linked for Element {
    fn set_next(&mut self, next: NonNull<Self>) {
        self.next = Some(next);
    }
}

impl Linked for Pair {
    fn set_next(&mut self, next: NonNull<Self>) {
        self.next = Some(next);
    }
}

/// A singly linked list under construction, appended through its tail so the
/// final link order is the insertion order.
pub(crate) struct List<N> {
    head: Option<NonNull<N>>,
    tail: Option<NonNull<N>>,
}

impl<N: Linked> List<N> {
    pub(crate) fn new() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    pub(crate) fn append(&mut self, node: NonNull<N>) {
        match self.tail {
            // SAFETY: the tail is an arena node owned by this list alone until
            // the list is finished; no reference to it exists.
            Some(tail) => unsafe { (*tail.as_ptr()).set_next(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
    }

    pub(crate) fn head(&self) -> Option<NonNull<N>> {
        self.head
    }
}
