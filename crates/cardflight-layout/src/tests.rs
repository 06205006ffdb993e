//! Tests for hand layout geometry.

use cardflight_core::enums::LayoutMode;
use cardflight_core::types::ContainerFrame;
use cardflight_core::DVec2;
use proptest::prelude::*;

use crate::hand::{compute_layout, compute_row_layout};

#[test]
fn test_card_and_container_dimensions() {
    let layout = compute_layout(1400.0, 800.0, 5);
    assert_eq!(layout.card_height, 80.0);
    assert_eq!(layout.card_width, 57.0); // round(80 * 0.714) = round(57.12)
    assert_eq!(layout.left_padding, 23.0); // round(800 * 0.714 * 0.04) = round(22.848)
    assert_eq!(layout.right_padding, 23.0);
    assert_eq!(layout.container_width, 1354.0);
    assert_eq!(layout.container_height, 80.0);
    assert_eq!(layout.between_card_margin, 6.0); // round(5.712)
    assert_eq!(layout.total_hand_width, 5.0 * 57.0 + 4.0 * 6.0);
}

#[test]
fn test_five_cards_are_centered() {
    let layout = compute_layout(1400.0, 800.0, 5);
    assert_eq!(layout.mode, LayoutMode::Centered);
    assert_eq!(layout.positions.len(), 5);

    let expected_first = (layout.container_width - layout.total_hand_width) / 2.0;
    assert_eq!(layout.positions[0].offset, expected_first);
    assert_eq!(expected_first, 522.5);

    for pair in layout.positions.windows(2) {
        let step = pair[1].offset - pair[0].offset;
        assert!((step - (layout.card_width + layout.between_card_margin)).abs() < 1e-9);
    }
    assert!(layout.positions.iter().all(|p| p.mode == LayoutMode::Centered));
    assert_eq!(layout.effective_margin, layout.between_card_margin);
    assert_eq!(layout.excess_space(), 1354.0 - 309.0);
    assert_eq!(layout.overlap_per_card(), 0.0);
}

#[test]
fn test_thirteen_cards_on_wide_viewport_still_fit() {
    // 13 * 57 + 12 * 6 = 813 px fits the 1354 px container.
    let layout = compute_layout(1400.0, 800.0, 13);
    assert_eq!(layout.total_hand_width, 813.0);
    assert_eq!(layout.mode, LayoutMode::Centered);
}

#[test]
fn test_thirteen_cards_on_narrow_viewport_overlap() {
    let layout = compute_layout(600.0, 800.0, 13);
    assert_eq!(layout.mode, LayoutMode::Overlapping);
    assert_eq!(layout.positions[0].offset, 0.0);

    let last = layout.positions.last().unwrap();
    assert!((last.offset - (layout.container_width - layout.card_width)).abs() < 1e-9);

    let spacing = (layout.container_width - layout.card_width) / 12.0;
    for (i, slot) in layout.positions.iter().enumerate() {
        assert_eq!(slot.index, i);
        assert_eq!(slot.mode, LayoutMode::Overlapping);
        assert!((slot.offset - i as f64 * spacing).abs() < 1e-9);
    }
    assert!(layout.effective_margin < 0.0, "overlap means a negative margin");
    assert!((layout.overlap_per_card() - (layout.card_width - spacing)).abs() < 1e-9);
    assert_eq!(layout.excess_space(), 0.0);
}

#[test]
fn test_large_hand_on_wide_viewport_overlaps() {
    // 25 * 57 + 24 * 6 = 1569 px exceeds 1354 px.
    let layout = compute_layout(1400.0, 800.0, 25);
    assert_eq!(layout.mode, LayoutMode::Overlapping);
    assert_eq!(layout.positions[0].offset, 0.0);
    let last = layout.positions[24].offset;
    assert!((last - (layout.container_width - layout.card_width)).abs() < 1e-9);
}

#[test]
fn test_single_card_too_wide_uses_centered_offset() {
    // Container narrower than one card: the mode flips but no division by zero.
    let layout = compute_layout(80.0, 800.0, 1);
    assert_eq!(layout.mode, LayoutMode::Overlapping);
    assert_eq!(layout.positions.len(), 1);
    let expected = (layout.container_width - layout.card_width) / 2.0;
    assert_eq!(layout.positions[0].offset, expected);
    assert!(layout.positions[0].offset.is_finite());
}

#[test]
fn test_single_card_fits() {
    let layout = compute_layout(1400.0, 800.0, 1);
    assert_eq!(layout.mode, LayoutMode::Centered);
    assert_eq!(layout.positions[0].offset, (1354.0 - 57.0) / 2.0);
}

#[test]
fn test_empty_hand() {
    let layout = compute_layout(1400.0, 800.0, 0);
    assert_eq!(layout.mode, LayoutMode::Centered);
    assert!(layout.positions.is_empty());
    assert_eq!(layout.total_hand_width, 0.0);
}

#[test]
fn test_slot_center_includes_padding() {
    let layout = compute_layout(1400.0, 800.0, 5);
    let frame = ContainerFrame::new(0.0, 700.0);
    let center = layout.slot_center(0, frame).unwrap();
    assert_eq!(center, DVec2::new(23.0 + 522.5 + 28.5, 740.0));
    assert!(layout.slot_center(5, frame).is_none());
}

#[test]
fn test_row_layout_matches_full_layout() {
    assert_eq!(compute_row_layout(900.0, 600.0, 6), compute_layout(900.0, 600.0, 6));
}

#[test]
fn test_layout_serializes() {
    let layout = compute_layout(1400.0, 800.0, 3);
    let json = serde_json::to_string(&layout).unwrap();
    assert!(json.contains(r#""mode":"Centered""#));
}

proptest! {
    #[test]
    fn prop_layout_is_deterministic(
        width in 100.0f64..4000.0,
        height in 100.0f64..3000.0,
        count in 0usize..60,
    ) {
        let a = compute_layout(width, height, count);
        let b = compute_layout(width, height, count);
        prop_assert_eq!(a.positions.len(), b.positions.len());
        for (pa, pb) in a.positions.iter().zip(&b.positions) {
            prop_assert_eq!(pa.offset.to_bits(), pb.offset.to_bits());
        }
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_mode_follows_width_rule(
        width in 100.0f64..4000.0,
        height in 100.0f64..3000.0,
        count in 1usize..60,
    ) {
        let layout = compute_layout(width, height, count);
        let centered = layout.total_hand_width <= layout.container_width;
        prop_assert_eq!(layout.mode == LayoutMode::Centered, centered);
        prop_assert_eq!(layout.positions.len(), count);
        prop_assert!(layout.positions.iter().all(|p| p.offset.is_finite()));
    }

    #[test]
    fn prop_overlapping_slots_stay_in_container(
        width in 200.0f64..1200.0,
        count in 2usize..60,
    ) {
        let layout = compute_layout(width, 800.0, count);
        if layout.mode == LayoutMode::Overlapping {
            let first = layout.positions[0].offset;
            let last = layout.positions[count - 1].offset;
            prop_assert_eq!(first, 0.0);
            prop_assert!((last - (layout.container_width - layout.card_width)).abs() < 1e-6);
        }
    }
}
