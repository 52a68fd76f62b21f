use image::{DynamicImage, Rgba, RgbaImage};
use skyline_atlas_core::AtlasError;
use skyline_atlas_core::prelude::*;

fn session(w: u32, h: u32, depth: PixelDepth) -> AtlasSession {
    let cfg = AtlasConfig::builder()
        .with_dimensions(w, h)
        .depth(depth)
        .build();
    AtlasSession::new(cfg).expect("valid config")
}

#[test]
fn full_page_opens_another() {
    let mut s = session(64, 64, PixelDepth::Alpha);
    assert_eq!(s.num_pages(), 0);

    let (p0, r0) = s.append("a".into(), 40, 40).unwrap();
    assert_eq!((p0, r0), (0, Region::new(1, 1, 40, 40)));
    let (p1, r1) = s.append("b".into(), 40, 40).unwrap();
    assert_eq!((p1, r1), (1, Region::new(1, 1, 40, 40)));

    // Small items still go to the first page with room.
    let (p2, r2) = s.append("c".into(), 20, 20).unwrap();
    assert_eq!((p2, r2), (0, Region::new(41, 1, 20, 20)));

    assert_eq!(s.num_pages(), 2);
    assert_eq!(s.texture_count(), 3);
    assert_eq!(s.keys(), vec!["a", "b", "c"]);
    assert_eq!(s.get("b"), Some((1, r1)));
    assert!(s.contains("c"));
    assert!(!s.contains("d"));
}

#[test]
fn rejected_items_leave_session_unchanged() {
    let mut s = session(64, 64, PixelDepth::Alpha);
    s.append("a".into(), 10, 10).unwrap();

    assert!(matches!(
        s.append("huge".into(), 100, 10),
        Err(AtlasError::OutOfSpace { w: 100, h: 10 })
    ));
    assert!(matches!(
        s.append("a".into(), 5, 5),
        Err(AtlasError::DuplicateKey(k)) if k == "a"
    ));
    assert!(matches!(
        s.append("empty".into(), 0, 5),
        Err(AtlasError::InvalidInput(_))
    ));
    assert!(matches!(
        s.append_pixels("short".into(), 4, 4, &[0; 10], 4),
        Err(AtlasError::SourceTooShort { .. })
    ));

    assert_eq!(s.num_pages(), 1);
    assert_eq!(s.texture_count(), 1);
    assert_eq!(s.page(0).unwrap().regions().len(), 1);
}

#[test]
fn appended_pixels_land_in_their_region() {
    let mut s = session(32, 32, PixelDepth::Rgb);
    let src: Vec<u8> = (0..(3 * 2 * 3)).map(|v| v as u8 + 1).collect();
    let (page, region) = s.append_pixels("px".into(), 3, 2, &src, 9).unwrap();
    let back = s.page(page).unwrap().surface().read_region(&region).unwrap();
    assert_eq!(back, src);
}

#[test]
fn images_are_converted_to_session_depth() {
    let mut img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 128]));
    img.put_pixel(0, 0, Rgba([1, 2, 3, 4]));
    let dynimg = DynamicImage::ImageRgba8(img.clone());

    let mut rgba = session(16, 16, PixelDepth::Rgba);
    let (p, r) = rgba.append_image("sprite".into(), &dynimg).unwrap();
    assert_eq!((r.w, r.h), (4, 3));
    let back = rgba.page(p).unwrap().surface().read_region(&r).unwrap();
    assert_eq!(back, img.into_raw());

    let mut alpha = session(16, 16, PixelDepth::Alpha);
    let (p, r) = alpha.append_image("mask".into(), &dynimg).unwrap();
    let back = alpha.page(p).unwrap().surface().read_region(&r).unwrap();
    assert_eq!(back.len(), 12);
    assert_eq!(back[0], 4);
    assert!(back[1..].iter().all(|&a| a == 128));
}

#[test]
fn snapshot_groups_regions_by_page_in_insertion_order() {
    let mut s = session(64, 64, PixelDepth::Alpha);
    s.append("big".into(), 50, 50).unwrap();
    s.append("big2".into(), 50, 50).unwrap();
    s.append("small".into(), 8, 8).unwrap();

    let snaps = s.snapshot();
    assert_eq!(snaps.len(), 2);
    assert_eq!(snaps[0].id, 0);
    let keys0: Vec<&str> = snaps[0].regions.iter().map(|r| r.key.as_str()).collect();
    let keys1: Vec<&str> = snaps[1].regions.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys0, vec!["big", "small"]);
    assert_eq!(keys1, vec!["big2"]);
    assert_eq!(snaps[0].used, 2500 + 64);

    let stats = s.stats();
    assert_eq!(stats.num_pages, 2);
    assert_eq!(stats.num_regions, 3);
    assert_eq!(stats.used_area, 2500 * 2 + 64);
    assert_eq!(stats.total_usable_area, 2 * 62 * 62);
    assert!(stats.occupancy > 0.0 && stats.occupancy < 1.0);
    println!("{}", stats.summary());

    s.clear();
    assert_eq!(s.num_pages(), 0);
    assert!(s.keys().is_empty());
    assert_eq!(s.stats().occupancy, 0.0);
}

#[test]
fn pow2_config_rounds_page_size() {
    let cfg = AtlasConfig::builder()
        .with_dimensions(100, 60)
        .pow2(true)
        .build();
    let mut s = AtlasSession::new(cfg).unwrap();
    let (page, _) = s.append("x".into(), 100, 10).unwrap();
    let p = s.page(page).unwrap();
    assert_eq!((p.width(), p.height()), (128, 64));
}
