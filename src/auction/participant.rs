// Participant bookkeeping: budget, bids, roster, and cumulative stats.

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Player;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BidError {
    /// The amount is outside `[0, max_bid()]`. Recovered locally: the
    /// participant's current bid is left at its last legal value.
    #[error("bid of {amount} exceeds max bid {max_bid}")]
    InvalidBid { amount: u32, max_bid: u32 },
}

// ---------------------------------------------------------------------------
// Cumulative stats
// ---------------------------------------------------------------------------

/// Running statistical totals for a roster, updated as players are won.
///
/// Counting stats are per-game sums. Shooting percentages are derived from
/// fractionally accumulated makes (`attempts * pct` per player, no per-player
/// rounding) so a multi-player roster doesn't compound rounding error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CumulativeStats {
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub steals: f64,
    pub blocks: f64,
    pub threes: f64,
    pub turnovers: f64,
    pub fg_makes: f64,
    pub fg_attempts: f64,
    pub ft_makes: f64,
    pub ft_attempts: f64,
}

impl CumulativeStats {
    /// Fold one player's season line into the totals.
    pub fn add_player(&mut self, player: &Player) {
        self.points += player.ppg;
        self.assists += player.apg;
        self.rebounds += player.rpg;
        self.steals += player.spg;
        self.blocks += player.bpg;
        self.threes += player.three_pg;
        self.turnovers += player.topg;
        self.fg_makes += player.fga * player.fg_pct;
        self.fg_attempts += player.fga;
        self.ft_makes += player.fta * player.ft_pct;
        self.ft_attempts += player.fta;
    }

    /// Overall field-goal percentage (fractional); 0.0 with no attempts.
    pub fn fg_pct(&self) -> f64 {
        if self.fg_attempts > 0.0 {
            self.fg_makes / self.fg_attempts
        } else {
            0.0
        }
    }

    /// Overall free-throw percentage (fractional); 0.0 with no attempts.
    pub fn ft_pct(&self) -> f64 {
        if self.ft_attempts > 0.0 {
            self.ft_makes / self.ft_attempts
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// One roster entry: the player and what they cost.
#[derive(Debug, Clone)]
pub struct RosterSpot {
    pub player: Player,
    pub winning_bid: u32,
}

/// A draft participant: budget, roster, running totals, and the automated
/// valuation profile. Created once when the league is assembled; mutated on
/// every accepted nomination, placed bid, and won player.
#[derive(Debug, Clone)]
pub struct Participant {
    pub name: String,
    pub automated: bool,
    /// Fixed aggression level; only consulted for automated bidders.
    pub aggression: u32,
    pub budget: u32,
    pub amount_spent: u32,
    /// Bid for the active nomination only; reset to 0 at round end.
    pub current_bid: u32,
    pub roster: Vec<RosterSpot>,
    pub totals: CumulativeStats,
    roster_size: usize,
}

impl Participant {
    pub fn new(name: String, automated: bool, aggression: u32, budget: u32, roster_size: usize) -> Self {
        Participant {
            name,
            automated,
            aggression,
            budget,
            amount_spent: 0,
            current_bid: 0,
            roster: Vec::with_capacity(roster_size),
            totals: CumulativeStats::default(),
            roster_size,
        }
    }

    /// Unfilled roster slots.
    pub fn players_remaining(&self) -> usize {
        self.roster_size.saturating_sub(self.roster.len())
    }

    pub fn roster_full(&self) -> bool {
        self.players_remaining() == 0
    }

    /// The hard bid ceiling: remaining budget minus a $1 reserve per
    /// unfilled roster slot. Never negative in a well-formed auction.
    pub fn max_bid(&self) -> u32 {
        self.budget
            .saturating_sub(self.amount_spent)
            .saturating_sub(self.players_remaining() as u32)
    }

    /// Record a bid for the active nomination. Fails with `InvalidBid` when
    /// the amount exceeds `max_bid()`, leaving `current_bid` untouched; the
    /// caller treats that as "bid not accepted", never as a clamp.
    pub fn place_bid(&mut self, amount: u32) -> Result<(), BidError> {
        let max_bid = self.max_bid();
        if amount > max_bid {
            return Err(BidError::InvalidBid { amount, max_bid });
        }
        self.current_bid = amount;
        Ok(())
    }

    /// Award a won player: spend the winning amount, append the roster spot,
    /// and fold the player's stats into the running totals.
    pub fn award_player(&mut self, player: Player, winning_amount: u32) {
        self.amount_spent += winning_amount;
        self.totals.add_player(&player);
        self.roster.push(RosterSpot {
            player,
            winning_bid: winning_amount,
        });
    }

    /// Clear the transient bid. Called unconditionally for every participant
    /// at the end of every resolved nomination; idempotent.
    pub fn reset_bid(&mut self) {
        self.current_bid = 0;
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
