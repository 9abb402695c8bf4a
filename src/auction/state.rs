// Auction state: rotation order, round counter, and the nominated set.

use std::collections::HashSet;

use crate::catalog::PlayerCatalog;

/// Where the auction currently is in the nomination/bidding cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting on the nominator at this participant index.
    NominationPending { nominator: usize },
    /// Bids are being collected for the player with this catalog id.
    BiddingOpen { player_id: String },
    /// The nomination resolved; bids are being reset before advancing.
    RoundResolved,
    /// Every roster is full.
    AuctionComplete,
}

/// Round/turn bookkeeping for the auction.
///
/// Participant order is fixed for the auction's duration: each round, every
/// participant nominates exactly once, in order, for `roster_size` rounds.
/// The nominated set only ever grows.
#[derive(Debug, Clone)]
pub struct AuctionState {
    participant_count: usize,
    roster_size: usize,
    /// Current round, 1-based.
    pub round: usize,
    /// Index of the current nominator.
    pub nominator: usize,
    pub phase: Phase,
    nominated: HashSet<String>,
}

impl AuctionState {
    pub fn new(participant_count: usize, roster_size: usize) -> Self {
        AuctionState {
            participant_count,
            roster_size,
            round: 1,
            nominator: 0,
            phase: Phase::NominationPending { nominator: 0 },
            nominated: HashSet::new(),
        }
    }

    /// Whether the given player id is still available for nomination.
    pub fn is_available(&self, player_id: &str) -> bool {
        !self.nominated.contains(player_id)
    }

    /// Mark a player as nominated and move to the bidding phase.
    /// Returns false (and changes nothing) if the id was already taken.
    pub fn mark_nominated(&mut self, player_id: &str) -> bool {
        if !self.nominated.insert(player_id.to_string()) {
            return false;
        }
        self.phase = Phase::BiddingOpen {
            player_id: player_id.to_string(),
        };
        true
    }

    /// Number of nominations resolved or in flight.
    pub fn nominated_count(&self) -> usize {
        self.nominated.len()
    }

    /// The default nomination policy: the first not-yet-nominated player in
    /// catalog order. Deterministic given the remaining pool. `None` only if
    /// the catalog has fewer players than the auction needs.
    pub fn default_pick<'a>(&self, catalog: &'a PlayerCatalog) -> Option<&'a str> {
        catalog
            .players()
            .iter()
            .find(|p| self.is_available(&p.id))
            .map(|p| p.id.as_str())
    }

    /// Bid order for the active nomination: the nominator first, then every
    /// other participant in rotation order with wrap-around.
    pub fn bid_order(&self) -> Vec<usize> {
        (0..self.participant_count)
            .map(|offset| (self.nominator + offset) % self.participant_count)
            .collect()
    }

    /// Mark the active nomination resolved.
    pub fn mark_resolved(&mut self) {
        self.phase = Phase::RoundResolved;
    }

    /// Advance to the next nominator (and round, wrapping), or to
    /// `AuctionComplete` once every participant has nominated in every round.
    pub fn advance(&mut self) {
        self.nominator += 1;
        if self.nominator == self.participant_count {
            self.nominator = 0;
            self.round += 1;
        }
        if self.round > self.roster_size {
            self.phase = Phase::AuctionComplete;
        } else {
            self.phase = Phase::NominationPending {
                nominator: self.nominator,
            };
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::AuctionComplete
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
