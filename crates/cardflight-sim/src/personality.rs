//! Per-card center of mass.
//!
//! Heavier-looking cards (court cards, tens, black suits) carry their mass
//! slightly toward the top edge, plus a small seeded jitter so no two cards
//! hang exactly alike. The result depends only on the id, the card size and
//! the engine seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use cardflight_core::constants::*;
use cardflight_core::types::CardId;
use cardflight_core::DVec2;

/// Offset from the card center to its center of mass (+y is down).
pub fn center_of_mass(id: &CardId, card_size: DVec2, seed: u64) -> DVec2 {
    let toward_top = rank_weight(id.rank()) + suit_weight(id.suit());

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ fnv1a(id.as_str().as_bytes()));
    let half = COM_JITTER / 2.0;
    let jitter_x = rng.gen_range(-half..=half);
    let jitter_y = rng.gen_range(-half..=half);

    DVec2::new(
        jitter_x * card_size.x,
        (jitter_y - toward_top) * card_size.y,
    )
}

fn rank_weight(rank: &str) -> f64 {
    match rank.to_ascii_uppercase().as_str() {
        "K" | "Q" | "J" => COM_FACE_CARD,
        "10" => COM_TEN,
        "7" | "8" | "9" => COM_MID_PIP,
        "A" => 0.0,
        _ => COM_LOW_PIP,
    }
}

fn suit_weight(suit: Option<char>) -> f64 {
    match suit.map(|c| c.to_ascii_uppercase()) {
        Some('S') | Some('C') => COM_BLACK_SUIT,
        _ => 0.0,
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
