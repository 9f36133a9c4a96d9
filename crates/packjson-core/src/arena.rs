//! Bump-pointer arena built from a linked list of memory zones.
//!
//! Every string, array cell and object cell of a parsed tree is carved out of
//! an [`Arena`]. Allocation advances a cursor inside the current zone; when the
//! zone is exhausted a fresh one is pushed onto the list. Nothing is ever freed
//! individually: dropping the arena walks the zone list and releases every
//! block in one pass.
//!
//! # Zone layout
//!
//! ```text
//! +-------------+-----------------------------------------+
//! | Zone header | data area (capacity bytes)              |
//! +-------------+-----------------------------------------+
//!               ^ used bytes grow to the right
//! ```
//!
//! Requests larger than a standard zone get a dedicated zone that is linked
//! *behind* the current head, so the partially used head keeps serving small
//! requests.

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use tracing::debug;

/// Default size of a zone in bytes, header included.
pub const DEFAULT_ZONE_SIZE: usize = 4096;

/// Alignment of every zone block. Smaller alignments are satisfied for free,
/// larger ones by padding inside the data area.
const ZONE_ALIGN: usize = 16;

/// Smallest data area a configured zone may have.
const MIN_ZONE_CAPACITY: usize = 64;

#[repr(C)]
struct Zone {
    next: Option<NonNull<Zone>>,
    used: usize,
    layout: Layout,
}

const HEADER_SIZE: usize = (mem::size_of::<Zone>() + ZONE_ALIGN - 1) & !(ZONE_ALIGN - 1);

impl Zone {
    /// Allocate a zone whose data area holds `capacity` bytes.
    fn create(capacity: usize) -> NonNull<Zone> {
        let layout = HEADER_SIZE
            .checked_add(capacity)
            .and_then(|size| Layout::from_size_align(size, ZONE_ALIGN).ok())
            .unwrap_or_else(|| panic!("arena zone of {capacity} bytes exceeds the address space"));

        // SAFETY: `layout` has a non-zero size (it always includes the header).
        let raw = unsafe { alloc::alloc(layout) };
        let Some(zone) = NonNull::new(raw.cast::<Zone>()) else {
            alloc::handle_alloc_error(layout);
        };

        // SAFETY: the block is freshly allocated, large enough and aligned for a `Zone`.
        unsafe {
            zone.as_ptr().write(Zone {
                next: None,
                used: 0,
                layout,
            });
        }
        zone
    }

    /// Carve `size` bytes aligned to `align` out of `zone`, or `None` if it does not fit.
    ///
    /// # Safety
    ///
    /// `zone` must point to a live zone created by [`Zone::create`] that no
    /// reference currently aliases.
    unsafe fn bump(zone: NonNull<Zone>, size: usize, align: usize) -> Option<NonNull<u8>> {
        let header = zone.as_ptr();
        // SAFETY: guaranteed live by the caller.
        let (used, capacity) = unsafe { ((*header).used, (*header).layout.size() - HEADER_SIZE) };
        // SAFETY: the data area starts right after the header, inside the same block.
        let data = unsafe { header.cast::<u8>().add(HEADER_SIZE) };

        let cursor = (data as usize).wrapping_add(used);
        let padding = cursor.wrapping_neg() & (align - 1);
        let start = used.checked_add(padding)?;
        let end = start.checked_add(size)?;
        if end > capacity {
            return None;
        }

        // SAFETY: `start..end` lies inside the data area of this block.
        unsafe {
            (*header).used = end;
            Some(NonNull::new_unchecked(data.add(start)))
        }
    }
}

/// A growable bump allocator. See the [module docs](self).
///
/// The arena is single-writer: it is `Send` so a document can move between
/// threads, but not `Sync`, so two threads can never allocate from it at once.
pub struct Arena {
    head: Cell<Option<NonNull<Zone>>>,
    zone_size: usize,
    zones: Cell<usize>,
    allocated: Cell<usize>,
    reserved: Cell<usize>,
}

// SAFETY: the arena exclusively owns every zone it points to; moving it to
// another thread moves that ownership along. `Cell` keeps it `!Sync`.
unsafe impl Send for Arena {}

impl Arena {
    /// Create an empty arena. No memory is requested until the first allocation.
    pub const fn new() -> Self {
        Self::with_zone_size(DEFAULT_ZONE_SIZE)
    }

    /// Create an empty arena whose standard zones are `bytes` large (header included).
    ///
    /// Very small sizes are raised to a minimal usable zone.
    pub const fn with_zone_size(bytes: usize) -> Self {
        let floor = HEADER_SIZE + MIN_ZONE_CAPACITY;
        Self {
            head: Cell::new(None),
            zone_size: if bytes < floor { floor } else { bytes },
            zones: Cell::new(0),
            allocated: Cell::new(0),
            reserved: Cell::new(0),
        }
    }

    /// Allocate `size` writable bytes aligned to `align`.
    ///
    /// Never fails under normal operation: when the current zone is full a new
    /// one is acquired. If the host cannot provide memory the process aborts
    /// through [`std::alloc::handle_alloc_error`].
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    pub fn allocate(&self, size: usize, align: usize) -> NonNull<u8> {
        assert!(align.is_power_of_two(), "alignment must be a power of two, got {align}");

        if let Some(zone) = self.head.get() {
            // SAFETY: every zone on the list lives until the arena is dropped and
            // the arena never hands out references to zone headers.
            if let Some(ptr) = unsafe { Zone::bump(zone, size, align) } {
                self.allocated.set(self.allocated.get() + size);
                return ptr;
            }
        }
        self.allocate_slow(size, align)
    }

    #[cold]
    fn allocate_slow(&self, size: usize, align: usize) -> NonNull<u8> {
        let standard = self.zone_size - HEADER_SIZE;
        let needed = size
            .checked_add(align)
            .unwrap_or_else(|| panic!("arena request of {size} bytes overflows"));
        let dedicated = needed > standard;
        let capacity = if dedicated { needed } else { standard };

        let zone = Zone::create(capacity);
        match self.head.get() {
            Some(head) if dedicated => {
                // SAFETY: both zones are live and unaliased.
                unsafe {
                    (*zone.as_ptr()).next = (*head.as_ptr()).next;
                    (*head.as_ptr()).next = Some(zone);
                }
            }
            head => {
                // SAFETY: `zone` is freshly created and unaliased.
                unsafe { (*zone.as_ptr()).next = head };
                self.head.set(Some(zone));
            }
        }

        self.zones.set(self.zones.get() + 1);
        self.reserved.set(self.reserved.get() + capacity);
        debug!(capacity, dedicated, zones = self.zones.get(), "arena acquired zone");

        // SAFETY: `zone` is live; it was sized to hold `size` bytes at any alignment padding.
        match unsafe { Zone::bump(zone, size, align) } {
            Some(ptr) => {
                self.allocated.set(self.allocated.get() + size);
                ptr
            }
            None => unreachable!("fresh zone of {capacity} bytes cannot hold {size} bytes"),
        }
    }

    /// Move `value` into the arena. The value is never dropped.
    pub(crate) fn alloc<T: Copy>(&self, value: T) -> NonNull<T> {
        let ptr = self
            .allocate(mem::size_of::<T>(), mem::align_of::<T>())
            .cast::<T>();
        // SAFETY: freshly allocated, properly sized and aligned for `T`.
        unsafe { ptr.as_ptr().write(value) };
        ptr
    }

    /// Number of zones acquired so far.
    pub fn zone_count(&self) -> usize {
        self.zones.get()
    }

    /// Total bytes handed out by [`allocate`](Self::allocate), excluding padding.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.get()
    }

    /// Total data capacity of all zones.
    pub fn reserved_bytes(&self) -> usize {
        self.reserved.get()
    }

    /// Configured size of a standard zone, header included.
    pub fn zone_size(&self) -> usize {
        self.zone_size
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let mut cursor = self.head.take();
        while let Some(zone) = cursor {
            // SAFETY: each zone was allocated by `Zone::create` with the layout
            // stored in its header, and appears on the list exactly once.
            unsafe {
                let Zone { next, layout, .. } = zone.as_ptr().read();
                alloc::dealloc(zone.as_ptr().cast::<u8>(), layout);
                cursor = next;
            }
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("zone_size", &self.zone_size)
            .field("zones", &self.zones.get())
            .field("allocated", &self.allocated.get())
            .field("reserved", &self.reserved.get())
            .finish()
    }
}
