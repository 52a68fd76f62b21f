use skyline_atlas_core::prelude::*;

#[test]
fn sixteen_by_sixteen_walkthrough() {
    let mut sky = SkylineAllocator::new(16, 16);
    assert_eq!(sky.nodes(), &[Node::new(1, 1, 14)]);

    let r1 = sky.allocate(4, 4).expect("first 4x4");
    assert_eq!(r1, Region::new(1, 1, 4, 4));
    assert_eq!(sky.nodes(), &[Node::new(1, 5, 4), Node::new(5, 1, 10)]);

    // Bottom-left prefers the untouched segment over the raised one, and the
    // two equal-height segments fuse afterwards.
    let r2 = sky.allocate(4, 4).expect("second 4x4");
    assert_eq!(r2, Region::new(5, 1, 4, 4));
    assert_eq!(sky.nodes(), &[Node::new(1, 5, 8), Node::new(9, 1, 6)]);

    assert_eq!(sky.used(), 32);
    assert_eq!(sky.regions(), &[r1, r2]);
}

#[test]
fn full_size_allocation_exhausts_atlas() {
    let mut sky = SkylineAllocator::new(16, 16);
    assert_eq!(sky.allocate(14, 14), Some(Region::new(1, 1, 14, 14)));
    assert_eq!(sky.nodes(), &[Node::new(1, 15, 14)]);

    assert_eq!(sky.allocate(14, 14), None);
    assert_eq!(sky.allocate(1, 1), None);
    assert!(!sky.can_allocate(1, 1));
    // A failed allocation leaves the state untouched.
    assert_eq!(sky.nodes(), &[Node::new(1, 15, 14)]);
    assert_eq!(sky.used(), 196);
}

#[test]
fn oversized_requests_fail_on_empty_atlas() {
    let mut sky = SkylineAllocator::new(16, 16);
    assert_eq!(sky.allocate(15, 1), None);
    assert_eq!(sky.allocate(1, 15), None);
    assert_eq!(sky.allocate(u32::MAX, 1), None);
    assert_eq!(sky.allocate(1, u32::MAX), None);
    assert_eq!(sky.nodes(), &[Node::new(1, 1, 14)]);
    assert_eq!(sky.used(), 0);
}

#[test]
fn zero_sized_requests_are_rejected() {
    let mut sky = SkylineAllocator::new(16, 16);
    assert_eq!(sky.allocate(0, 4), None);
    assert_eq!(sky.allocate(4, 0), None);
    assert!(sky.regions().is_empty());
}

#[test]
fn equal_tiles_fill_the_bottom_row_first() {
    // 32 usable pixels across: four 8x8 tiles per row.
    let mut sky = SkylineAllocator::new(34, 1024);
    let placed: Vec<Region> = (0..9).map(|_| sky.allocate(8, 8).unwrap()).collect();

    for (i, r) in placed.iter().enumerate().take(4) {
        assert_eq!((r.x, r.y), (1 + 8 * i as u32, 1), "tile {i}");
    }
    for (i, r) in placed.iter().enumerate().skip(4).take(4) {
        assert_eq!((r.x, r.y), (1 + 8 * (i as u32 - 4), 9), "tile {i}");
    }
    assert_eq!((placed[8].x, placed[8].y), (1, 17));

    // After two complete rows plus one tile the skyline is two segments.
    assert_eq!(sky.nodes(), &[Node::new(1, 25, 8), Node::new(9, 17, 24)]);
}

#[test]
fn ties_on_top_edge_prefer_narrower_segment() {
    let mut sky = SkylineAllocator::new(20, 64);
    assert_eq!(sky.allocate(10, 4), Some(Region::new(1, 1, 10, 4)));
    assert_eq!(sky.allocate(4, 8), Some(Region::new(11, 1, 4, 8)));
    assert_eq!(sky.allocate(4, 4), Some(Region::new(15, 1, 4, 4)));
    assert_eq!(
        sky.nodes(),
        &[Node::new(1, 5, 10), Node::new(11, 9, 4), Node::new(15, 5, 4)]
    );

    // Both the first and the last segment give a top edge of 8; the last one
    // is narrower and wins even though it comes later.
    assert_eq!(sky.allocate(3, 3), Some(Region::new(15, 5, 3, 3)));
    assert_eq!(
        sky.nodes(),
        &[
            Node::new(1, 5, 10),
            Node::new(11, 9, 4),
            Node::new(15, 8, 3),
            Node::new(18, 5, 1),
        ]
    );
}

#[test]
fn exact_ties_keep_first_segment() {
    let mut sky = SkylineAllocator::new(22, 64);
    assert_eq!(sky.allocate(4, 4), Some(Region::new(1, 1, 4, 4)));
    assert_eq!(sky.allocate(12, 8), Some(Region::new(5, 1, 12, 8)));
    assert_eq!(sky.allocate(4, 4), Some(Region::new(17, 1, 4, 4)));
    assert_eq!(
        sky.nodes(),
        &[Node::new(1, 5, 4), Node::new(5, 9, 12), Node::new(17, 5, 4)]
    );

    assert_eq!(sky.allocate(2, 2), Some(Region::new(1, 5, 2, 2)));
}

#[test]
fn wide_rectangle_rests_on_tallest_spanned_segment() {
    let mut sky = SkylineAllocator::new(16, 32);
    sky.allocate(4, 10).unwrap();
    sky.allocate(4, 2).unwrap();
    // Spans the 10-tall and the 2-tall columns: must sit above the taller one.
    let r = sky.allocate(14, 3).unwrap();
    assert_eq!(r, Region::new(1, 11, 14, 3));
    assert_eq!(sky.nodes(), &[Node::new(1, 14, 14)]);
}

#[test]
fn clear_restores_initial_skyline() {
    let mut sky = SkylineAllocator::new(16, 16);
    sky.allocate(4, 4).unwrap();
    sky.allocate(6, 2).unwrap();
    sky.clear();
    assert_eq!(sky.nodes(), &[Node::new(1, 1, 14)]);
    assert!(sky.regions().is_empty());
    assert_eq!(sky.used(), 0);
    assert_eq!(sky.occupancy(), 0.0);

    assert_eq!(sky.allocate(14, 14), Some(Region::new(1, 1, 14, 14)));
    assert!((sky.occupancy() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn page_walkthrough_matches_allocator() {
    let mut page = AtlasPage::new(16, 16, 1).expect("valid page");
    assert_eq!(page.allocate(4, 4), Some(Region::new(1, 1, 4, 4)));
    assert_eq!(page.allocate(4, 4), Some(Region::new(5, 1, 4, 4)));
    assert_eq!(page.nodes(), &[Node::new(1, 5, 8), Node::new(9, 1, 6)]);

    let stats = page.stats();
    assert_eq!(stats.num_regions, 2);
    assert_eq!(stats.num_nodes, 2);
    assert_eq!(stats.used_area, 32);
    assert_eq!(stats.usable_area, 196);
    assert_eq!(stats.wasted_area(), 164);
    println!("{}", stats.summary());
}

#[test]
#[should_panic(expected = "at least 3x3")]
fn allocator_rejects_pages_without_usable_area() {
    let _ = SkylineAllocator::new(0, 0);
}

#[test]
fn smallest_allocator_holds_one_pixel() {
    let mut sky = SkylineAllocator::new(3, 3);
    assert_eq!(sky.allocate(1, 1), Some(Region::new(1, 1, 1, 1)));
    assert_eq!(sky.allocate(1, 1), None);
}
