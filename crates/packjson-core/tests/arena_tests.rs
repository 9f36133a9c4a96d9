use packjson_core::{Arena, Document, DEFAULT_ZONE_SIZE};

// ============================================================================
// Construction
// ============================================================================

#[test]
fn new_arena_allocates_nothing() {
    let arena = Arena::new();
    assert_eq!(arena.zone_count(), 0);
    assert_eq!(arena.allocated_bytes(), 0);
    assert_eq!(arena.reserved_bytes(), 0);
    assert_eq!(arena.zone_size(), DEFAULT_ZONE_SIZE);
}

#[test]
fn default_matches_new() {
    let arena = Arena::default();
    assert_eq!(arena.zone_size(), DEFAULT_ZONE_SIZE);
    assert_eq!(arena.zone_count(), 0);
}

#[test]
fn tiny_zone_size_is_raised() {
    let arena = Arena::with_zone_size(1);
    assert!(arena.zone_size() > 64);
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn first_allocation_creates_a_zone() {
    let arena = Arena::new();
    arena.allocate(16, 8);
    assert_eq!(arena.zone_count(), 1);
    assert_eq!(arena.allocated_bytes(), 16);
}

#[test]
fn allocations_respect_alignment() {
    let arena = Arena::new();
    for align in [1usize, 2, 4, 8, 16, 32, 64, 128] {
        // Odd-sized filler to knock the cursor off alignment.
        arena.allocate(3, 1);
        let ptr = arena.allocate(24, align);
        assert_eq!(
            ptr.as_ptr() as usize % align,
            0,
            "allocation not aligned to {align}"
        );
    }
}

#[test]
fn allocations_are_writable_and_disjoint() {
    let arena = Arena::new();
    let ptrs: Vec<_> = (0..100u8)
        .map(|i| {
            let ptr = arena.allocate(32, 8);
            // SAFETY: 32 writable bytes were just handed out.
            unsafe { std::ptr::write_bytes(ptr.as_ptr(), i, 32) };
            ptr
        })
        .collect();

    for (i, ptr) in ptrs.iter().enumerate() {
        // SAFETY: each block stays valid while the arena lives.
        let block = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 32) };
        assert!(block.iter().all(|&b| b == i as u8), "block {i} was overwritten");
    }
}

#[test]
fn zero_sized_allocation_succeeds() {
    let arena = Arena::new();
    let ptr = arena.allocate(0, 8);
    assert_eq!(ptr.as_ptr() as usize % 8, 0);
}

#[test]
fn exhausted_zone_pushes_a_new_one() {
    let arena = Arena::with_zone_size(256);
    for _ in 0..64 {
        arena.allocate(32, 8);
    }
    assert!(arena.zone_count() > 1);
    assert_eq!(arena.allocated_bytes(), 64 * 32);
    assert!(arena.reserved_bytes() >= arena.allocated_bytes());
}

#[test]
fn oversized_request_gets_a_dedicated_zone() {
    let arena = Arena::with_zone_size(256);
    let big = 10 * 1024;
    let ptr = arena.allocate(big, 8);
    // SAFETY: `big` writable bytes were just handed out.
    unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0xAB, big) };
    assert_eq!(arena.zone_count(), 1);
    assert!(arena.reserved_bytes() >= big);
}

#[test]
fn oversized_request_keeps_current_zone_in_service() {
    let arena = Arena::with_zone_size(1024);
    arena.allocate(8, 8);
    assert_eq!(arena.zone_count(), 1);

    arena.allocate(64 * 1024, 8);
    assert_eq!(arena.zone_count(), 2);

    // Small requests keep going to the partially used standard zone.
    for _ in 0..8 {
        arena.allocate(8, 8);
    }
    assert_eq!(arena.zone_count(), 2);
}

#[test]
#[should_panic(expected = "power of two")]
fn non_power_of_two_alignment_panics() {
    let arena = Arena::new();
    arena.allocate(8, 3);
}

// ============================================================================
// Arena-backed documents
// ============================================================================

#[test]
fn document_reports_its_arena_usage() {
    let doc = Document::parse(br#"{"a":[1,2,3],"b":"text"}"#).unwrap();
    let arena = doc.arena();
    assert_eq!(arena.zone_count(), 1);
    assert!(arena.allocated_bytes() > 0);
}

#[test]
fn small_zones_grow_under_a_large_document() {
    let json = format!(
        "[{}]",
        (0..2000).map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    );
    let doc = Document::parse_with_arena(Arena::with_zone_size(512), json.as_bytes()).unwrap();
    assert!(doc.arena().zone_count() > 1);
    assert_eq!(doc.root().as_array().unwrap().count(), 2000);
}

#[test]
fn scalars_need_no_arena_memory() {
    for input in ["1", "true", "null", "-2.5e3"] {
        let doc = Document::parse_str(input).unwrap();
        assert_eq!(doc.arena().zone_count(), 0, "input {input} allocated");
    }
}

#[test]
fn failed_parse_leaves_arena_usable() {
    let arena = Arena::new();
    let err = packjson_core::parse_in(&arena, br#"["abc", "def", tru]"#).unwrap_err();
    assert_eq!(err.kind, packjson_core::ParseErrorKind::UnknownIdentifier);
    assert!(arena.allocated_bytes() > 0);

    let parsed = packjson_core::parse_in(&arena, b"[1]").unwrap();
    assert_eq!(parsed.value.at(0).unwrap().as_number().unwrap(), 1.0);
}

#[test]
fn document_moves_across_threads() {
    let doc = Document::parse_str(r#"{"key":"value"}"#).unwrap();
    let handle = std::thread::spawn(move || {
        doc.root()
            .get("key")
            .unwrap()
            .as_str()
            .unwrap()
            .to_owned()
    });
    assert_eq!(handle.join().unwrap(), "value");
}

#[test]
fn independent_documents_parse_concurrently() {
    let handles: Vec<_> = (0..4)
        .map(|t| {
            std::thread::spawn(move || {
                let json = format!("[{t},{t},{t}]");
                let doc = Document::parse_str(&json).unwrap();
                doc.root()
                    .as_array()
                    .unwrap()
                    .map(|v| v.as_number().unwrap())
                    .sum::<f64>()
            })
        })
        .collect();
    for (t, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), 3.0 * t as f64);
    }
}
