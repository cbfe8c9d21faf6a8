use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::card::Card;
use super::rank::ALL_RANKS;
use super::suit::ALL_SUITS;
use crate::error::{EngineError, EngineResult};

/// The 52-card deck minus whatever has already been dealt or shown.
pub struct Deck {
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new(exclude: Option<&[Card]>) -> Deck {
        let excluded: HashSet<Card> = exclude
            .map(|e| e.iter().copied().collect())
            .unwrap_or_default();
        let cards = ALL_RANKS
            .iter()
            .flat_map(|&r| ALL_SUITS.iter().map(move |&s| Card::new(r, s)))
            .filter(|c| !excluded.contains(c))
            .collect();
        Deck { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.cards.shuffle(rng);
        self
    }

    pub fn deal(&mut self, n: usize) -> EngineResult<Vec<Card>> {
        if n > self.cards.len() {
            return Err(EngineError::NotEnoughDeck {
                requested: n,
                available: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn excludes_dead_cards() {
        let ace_spades = super::Card::new(crate::cards::rank::Rank::Ace, crate::cards::suit::Suit::Spades);
        let deck = Deck::new(Some(&[ace_spades]));
        assert_eq!(deck.len(), 51);
        assert!(!deck.cards.contains(&ace_spades));
    }

    #[test]
    fn deal_shrinks_deck() {
        let mut deck = Deck::new(None);
        let dealt = deck.deal(5).unwrap();
        assert_eq!(dealt.len(), 5);
        assert_eq!(deck.len(), 47);
    }

    #[test]
    fn deal_too_many_errors() {
        let mut deck = Deck::new(None);
        assert!(deck.deal(53).is_err());
    }

    #[test]
    fn shuffle_preserves_size() {
        let mut deck = Deck::new(None);
        deck.shuffle(&mut thread_rng());
        assert_eq!(deck.len(), 52);
    }
}
