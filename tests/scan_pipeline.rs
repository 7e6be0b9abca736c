// End-to-end runs through the public API: still image in, capture source,
// screen buffer, hue classification, region enumeration out.

use angler_vision::{
    PixelColor, Rect, RegionEnumerator, ScreenBuffer, StillCaptureSource, VisionError,
};
use image::{Rgba, RgbaImage};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
// Max channel red, (g - b) / delta = 0.1, so the derived hue is exactly 6.
const HUE_SIX: Rgba<u8> = Rgba([250, 25, 0, 255]);

fn buffer_from(img: RgbaImage) -> ScreenBuffer {
    ScreenBuffer::new(Box::new(StillCaptureSource::new(img))).unwrap()
}

#[test]
fn single_block_is_found_with_exact_count_and_extent() {
    let mut img = RgbaImage::from_pixel(20, 20, BLACK);
    for y in 5..11 {
        for x in 7..13 {
            img.put_pixel(x, y, HUE_SIX);
        }
    }

    let buffer = buffer_from(img);
    let regions = RegionEnumerator::new(&buffer)
        .find_regions(10, 6, 10, Rect::new(0, 0, 20, 20))
        .unwrap();

    assert_eq!(regions.len(), 1);
    let region = regions[0];
    assert_eq!(region.connected_pixels, 36);
    assert_eq!((region.x, region.y), (7, 5));
    // Extents are max minus min, so a six pixel wide block spans five.
    assert_eq!((region.width, region.height), (5, 5));
    assert_eq!(region.center(), (9, 7));
}

#[test]
fn black_background_never_matches_any_hue_window() {
    let img = RgbaImage::from_pixel(20, 20, BLACK);
    let buffer = buffer_from(img);

    for target in [0, 6, 120, 355] {
        let regions = RegionEnumerator::new(&buffer)
            .find_regions(1, target, 15, Rect::new(0, 0, 20, 20))
            .unwrap();
        assert!(regions.is_empty(), "target hue {target} matched background");
    }
}

#[test]
fn buffer_pixels_round_trip_through_packed_values() {
    let mut img = RgbaImage::from_pixel(8, 8, BLACK);
    img.put_pixel(3, 2, Rgba([0x12, 0x34, 0x56, 0xFF]));

    let buffer = buffer_from(img);
    let color = buffer.get_pixel(3, 2).unwrap();
    assert_eq!(color, PixelColor::new(0x12, 0x34, 0x56));
    assert!(buffer.color_at(3, 2, 0x123456).unwrap());
    assert!(!buffer.color_at(3, 2, 0x123457).unwrap());
}

#[test]
fn find_first_offset_stepping_visits_matches_in_order() {
    let mut img = RgbaImage::from_pixel(8, 8, BLACK);
    img.put_pixel(5, 1, Rgba([0xAA, 0xBB, 0xCC, 0xFF]));
    img.put_pixel(2, 6, Rgba([0xAA, 0xBB, 0xCC, 0xFF]));

    let buffer = buffer_from(img);
    let first = buffer.find_first(0xAABBCC, 0).unwrap();
    assert_eq!(first, (5, 1));
    // Same offset, same answer.
    assert_eq!(buffer.find_first(0xAABBCC, 0), Some(first));

    let after_first = (first.1 * 8 + first.0 + 1) as usize;
    let second = buffer.find_first(0xAABBCC, after_first).unwrap();
    assert_eq!(second, (2, 6));
    assert_eq!(buffer.find_first(0xAABBCC, (second.1 * 8 + second.0 + 1) as usize), None);
}

#[test]
fn out_of_range_access_fails_instead_of_clamping() {
    let buffer = buffer_from(RgbaImage::from_pixel(8, 8, BLACK));
    assert!(matches!(
        buffer.get_pixel(8, 0),
        Err(VisionError::OutOfRange { .. })
    ));
    assert!(matches!(
        buffer.get_pixel(0, -1),
        Err(VisionError::OutOfRange { .. })
    ));
}
