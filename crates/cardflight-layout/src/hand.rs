//! Slot geometry for a hand under the two packing modes.

use cardflight_core::enums::LayoutMode;
use cardflight_core::types::ContainerFrame;
use cardflight_core::DVec2;
use serde::{Deserialize, Serialize};

/// Card width / height.
pub const ASPECT_RATIO: f64 = 0.714;

/// Card height as a fraction of viewport height.
pub const CARD_HEIGHT_FRACTION: f64 = 0.10;

/// Per-side container padding as a fraction of `viewport_height * ASPECT_RATIO`.
pub const CONTAINER_PADDING_FRACTION: f64 = 0.04;

/// Between-card margin as a fraction of `viewport_height * ASPECT_RATIO`.
pub const CARD_MARGIN_FRACTION: f64 = 0.01;

/// Horizontal placement of one card, relative to the container's content edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotPosition {
    pub index: usize,
    /// Left edge offset in pixels.
    pub offset: f64,
    pub mode: LayoutMode,
}

/// Geometry of a hand. Never mutated after `compute_layout` returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub card_count: usize,
    pub card_width: f64,
    pub card_height: f64,
    /// Width available to cards after padding.
    pub container_width: f64,
    pub container_height: f64,
    pub left_padding: f64,
    pub right_padding: f64,
    pub between_card_margin: f64,
    /// Gap between neighbours actually used; negative when overlapping.
    pub effective_margin: f64,
    pub total_hand_width: f64,
    pub mode: LayoutMode,
    pub positions: Vec<SlotPosition>,
}

impl LayoutResult {
    /// Unused container width in Centered mode, zero otherwise.
    pub fn excess_space(&self) -> f64 {
        match self.mode {
            LayoutMode::Centered => self.container_width - self.total_hand_width,
            LayoutMode::Overlapping => 0.0,
        }
    }

    /// How much each card covers its left neighbour in Overlapping mode.
    pub fn overlap_per_card(&self) -> f64 {
        match self.mode {
            LayoutMode::Overlapping => (-self.effective_margin).max(0.0),
            LayoutMode::Centered => 0.0,
        }
    }

    /// Center of slot `index` given where the container sits on screen.
    pub fn slot_center(&self, index: usize, frame: ContainerFrame) -> Option<DVec2> {
        let slot = self.positions.get(index)?;
        Some(
            frame.origin
                + DVec2::new(
                    self.left_padding + slot.offset + self.card_width / 2.0,
                    self.card_height / 2.0,
                ),
        )
    }

    pub fn card_size(&self) -> DVec2 {
        DVec2::new(self.card_width, self.card_height)
    }
}

/// Compute the layout of a hand of `card_count` cards.
pub fn compute_layout(viewport_width: f64, viewport_height: f64, card_count: usize) -> LayoutResult {
    let card_height = (viewport_height * CARD_HEIGHT_FRACTION).round();
    let card_width = (card_height * ASPECT_RATIO).round();

    let padding = (viewport_height * ASPECT_RATIO * CONTAINER_PADDING_FRACTION).round();
    let container_width = viewport_width - (padding + padding);

    let between_card_margin = (viewport_height * ASPECT_RATIO * CARD_MARGIN_FRACTION).round();

    let total_hand_width = if card_count == 0 {
        0.0
    } else {
        card_count as f64 * card_width + (card_count - 1) as f64 * between_card_margin
    };

    let mode = if total_hand_width <= container_width {
        LayoutMode::Centered
    } else {
        LayoutMode::Overlapping
    };

    let (positions, effective_margin) = if mode == LayoutMode::Overlapping && card_count > 1 {
        let spacing = (container_width - card_width) / (card_count - 1) as f64;
        let positions = (0..card_count)
            .map(|index| SlotPosition {
                index,
                offset: index as f64 * spacing,
                mode,
            })
            .collect();
        (positions, spacing - card_width)
    } else {
        // A single card never overlaps anything; it sits at the centered offset.
        let first = (container_width - total_hand_width) / 2.0;
        let step = card_width + between_card_margin;
        let positions = (0..card_count)
            .map(|index| SlotPosition {
                index,
                offset: first + index as f64 * step,
                mode,
            })
            .collect();
        (positions, between_card_margin)
    };

    LayoutResult {
        viewport_width,
        viewport_height,
        card_count,
        card_width,
        card_height,
        container_width,
        container_height: card_height,
        left_padding: padding,
        right_padding: padding,
        between_card_margin,
        effective_margin,
        total_hand_width,
        mode,
        positions,
    }
}

/// Layout for one row of a two-row hand.
pub fn compute_row_layout(viewport_width: f64, viewport_height: f64, row_cards: usize) -> LayoutResult {
    compute_layout(viewport_width, viewport_height, row_cards)
}
