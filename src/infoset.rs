//! Canonical infoset keying: board texture bits, SPR band, hand-strength
//! band, position, and betting context, composed into a deterministic
//! string key used both by the trainer and at runtime lookup.

use std::collections::BTreeSet;

use crate::cards::Card;
use crate::game::{HandState, EPS};

pub fn street_label(street_idx: u8) -> &'static str {
    match street_idx {
        0 => "preflop",
        1 => "flop",
        2 => "turn",
        _ => "river",
    }
}

pub fn position_label(acting_seat: usize) -> &'static str {
    if acting_seat == 1 {
        "IP"
    } else {
        "OOP"
    }
}

pub fn bet_state_label(to_call: f64) -> &'static str {
    if to_call > EPS {
        "facingBet"
    } else {
        "unopened"
    }
}

pub fn spr_band(spr: f64) -> &'static str {
    if spr < 1.0 {
        "0_1"
    } else if spr < 2.0 {
        "1_2"
    } else if spr < 4.0 {
        "2_4"
    } else if spr < 8.0 {
        "4_8"
    } else {
        "8_plus"
    }
}

pub fn hs_band(hs: f64) -> u8 {
    let clamped = hs.clamp(0.0, 0.999_999);
    (clamped * 10.0).floor() as u8
}

/// Board texture as a 4-bit `<paired><two_tone><monotone><connected>` field.
pub fn texture_bits(board: &[Card]) -> u8 {
    if board.len() < 2 {
        return 0;
    }

    let mut suit_counts = [0u8; 4];
    for card in board {
        suit_counts[suit_ordinal(card)] += 1;
    }
    let distinct_suits = suit_counts.iter().filter(|&&c| c > 0).count();
    let monotone = distinct_suits == 1;
    let two_tone = distinct_suits == 2;

    let mut rank_counts = [0u8; 15];
    for card in board {
        rank_counts[card.value() as usize] += 1;
    }
    let paired = rank_counts.iter().any(|&c| c >= 2);

    let distinct_ranks: BTreeSet<u8> = board.iter().map(|c| c.value()).collect();
    let ranks: Vec<u8> = distinct_ranks.into_iter().collect();
    let mut adjacent_within_two = 0;
    for w in ranks.windows(2) {
        if w[1] - w[0] <= 2 {
            adjacent_within_two += 1;
        }
    }
    let connected = adjacent_within_two >= 2;

    let mut bits = 0u8;
    bits |= (paired as u8) << 3;
    bits |= (two_tone as u8) << 2;
    bits |= (monotone as u8) << 1;
    bits |= connected as u8;
    bits
}

fn suit_ordinal(card: &Card) -> usize {
    match card.suit {
        crate::cards::Suit::Spades => 0,
        crate::cards::Suit::Hearts => 1,
        crate::cards::Suit::Diamonds => 2,
        crate::cards::Suit::Clubs => 3,
    }
}

/// Compose the canonical infoset key for the seat about to act.
pub fn infoset_key(state: &HandState, board: &[Card], hs: f64) -> String {
    let tex = texture_bits(board);
    let spr = spr_band(state.spr());
    let bet_state = bet_state_label(state.to_call());
    let band = hs_band(hs);
    format!(
        "{}|{}|tex={:04b}|spr={}|{}|r={}|hs={}",
        street_label(state.street_idx),
        position_label(state.to_act),
        tex,
        spr,
        bet_state,
        state.raises,
        band
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_board;
    use crate::config::EngineConfig;

    #[test]
    fn monotone_connected_flop_sets_all_wet_bits() {
        let board = parse_board("9h8h7h").unwrap();
        let bits = texture_bits(&board);
        assert_eq!(bits, 0b0111);
    }

    #[test]
    fn paired_dry_board() {
        let board = parse_board("KsKd3c").unwrap();
        let bits = texture_bits(&board);
        assert_eq!(bits & 0b1000, 0b1000);
    }

    #[test]
    fn key_is_deterministic_for_equivalent_states() {
        let config = EngineConfig::default();
        let state = HandState::new_preflop(&config);
        let board: Vec<Card> = vec![];
        let key1 = infoset_key(&state, &board, 0.55);
        let key2 = infoset_key(&state, &board, 0.55);
        assert_eq!(key1, key2);
    }

    #[test]
    fn hs_band_floors_into_0_9() {
        assert_eq!(hs_band(0.0), 0);
        assert_eq!(hs_band(0.999_999), 9);
        assert_eq!(hs_band(1.0), 9);
    }
}
