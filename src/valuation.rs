// Automated-bidder valuation: maps a player's season stats and a bidder's
// situation to a bid ceiling.
//
// The model grades each counting stat on a logistic S-curve (sharp rise
// around an inflection point, saturation near a ceiling), so elite
// specialists are rewarded more than proportionally while marginal
// contributors stay cheap. Shooting efficiency, turnovers, and a small
// seeded jitter are layered on additively, then the score is scaled by a
// league-size-adjusted aggression baseline, discounted for low games
// played, floored for nominators, and capped at the bidder's max bid.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Deserialize;

use crate::catalog::Player;

// ---------------------------------------------------------------------------
// Tunable parameters
// ---------------------------------------------------------------------------

/// One logistic contribution curve: `ceiling / (1 + e^(-steepness * (x - inflection)))`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SCurve {
    pub inflection: f64,
    pub steepness: f64,
    pub ceiling: f64,
}

impl SCurve {
    fn grade(&self, x: f64) -> f64 {
        self.ceiling / (1.0 + (-self.steepness * (x - self.inflection)).exp())
    }
}

/// Tunable valuation constants. Every field has a default; the `[valuation]`
/// config section may override any subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValuationParams {
    /// Linear league-size coefficient in the aggression baseline.
    pub league_linear: f64,
    /// Quadratic dampening coefficient in the aggression baseline.
    pub league_quadratic: f64,
    /// Floor for the league-size multiplier so huge leagues never zero out bids.
    pub league_multiplier_floor: f64,

    pub points_curve: SCurve,
    pub assists_curve: SCurve,
    pub rebounds_curve: SCurve,
    pub threes_curve: SCurve,
    pub steals_curve: SCurve,
    pub blocks_curve: SCurve,

    /// FG attempts per game above which efficiency bonuses/penalties apply.
    pub fg_volume_attempts: f64,
    pub fg_bonus_pct: f64,
    pub fg_bonus: f64,
    pub fg_penalty_pct: f64,
    pub fg_penalty: f64,

    /// FT attempts per game above which efficiency bonuses/penalties apply.
    pub ft_volume_attempts: f64,
    pub ft_bonus_pct: f64,
    pub ft_bonus: f64,
    pub ft_penalty_pct: f64,
    pub ft_penalty: f64,

    /// Additive penalty per turnover per game.
    pub turnover_weight: f64,

    /// Half-width of the uniform jitter added to every valuation, so bots
    /// with identical profiles don't bid in lockstep. Deterministic given
    /// the engine seed.
    pub jitter: f64,

    /// Games played below this threshold triggers the reliability discount.
    pub games_threshold: u32,
    /// Multiplier applied when games played falls below the threshold.
    pub games_discount: f64,
}

impl Default for ValuationParams {
    fn default() -> Self {
        ValuationParams {
            league_linear: 0.09,
            league_quadratic: 0.004,
            league_multiplier_floor: 0.1,
            points_curve: SCurve {
                inflection: 20.0,
                steepness: 0.30,
                ceiling: 30.0,
            },
            assists_curve: SCurve {
                inflection: 7.0,
                steepness: 0.70,
                ceiling: 18.0,
            },
            rebounds_curve: SCurve {
                inflection: 9.0,
                steepness: 0.55,
                ceiling: 16.0,
            },
            threes_curve: SCurve {
                inflection: 2.2,
                steepness: 1.6,
                ceiling: 12.0,
            },
            steals_curve: SCurve {
                inflection: 1.7,
                steepness: 2.4,
                ceiling: 10.0,
            },
            blocks_curve: SCurve {
                inflection: 1.4,
                steepness: 2.2,
                ceiling: 10.0,
            },
            fg_volume_attempts: 12.0,
            fg_bonus_pct: 0.50,
            fg_bonus: 6.0,
            fg_penalty_pct: 0.42,
            fg_penalty: 6.0,
            ft_volume_attempts: 6.0,
            ft_bonus_pct: 0.85,
            ft_bonus: 3.0,
            ft_penalty_pct: 0.65,
            ft_penalty: 3.0,
            turnover_weight: 1.5,
            jitter: 1.5,
            games_threshold: 55,
            games_discount: 0.75,
        }
    }
}

impl ValuationParams {
    /// Check the tunables for values that would break the model's shape.
    /// Returns `(field, message)` for the first offending field.
    pub fn validate(&self) -> Result<(), (&'static str, String)> {
        if self.jitter < 0.0 || !self.jitter.is_finite() {
            return Err(("jitter", format!("must be >= 0, got {}", self.jitter)));
        }
        if !(0.0..=1.0).contains(&self.games_discount) {
            return Err((
                "games_discount",
                format!("must be in [0, 1], got {}", self.games_discount),
            ));
        }
        if self.league_multiplier_floor <= 0.0 {
            return Err((
                "league_multiplier_floor",
                format!("must be > 0, got {}", self.league_multiplier_floor),
            ));
        }
        let curves = [
            ("points_curve", &self.points_curve),
            ("assists_curve", &self.assists_curve),
            ("rebounds_curve", &self.rebounds_curve),
            ("threes_curve", &self.threes_curve),
            ("steals_curve", &self.steals_curve),
            ("blocks_curve", &self.blocks_curve),
        ];
        for (field, curve) in curves {
            if curve.steepness <= 0.0 || curve.ceiling <= 0.0 {
                return Err((
                    field,
                    format!(
                        "steepness and ceiling must be > 0, got steepness={} ceiling={}",
                        curve.steepness, curve.ceiling
                    ),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bid context
// ---------------------------------------------------------------------------

/// The bidder's situation at valuation time.
#[derive(Debug, Clone, Copy)]
pub struct BidContext {
    /// The bidder's fixed aggression level.
    pub aggression: u32,
    /// Number of participants in the auction.
    pub league_size: usize,
    /// The bidder's hard bid ceiling (`budget - spent - players_remaining`).
    pub max_bid: u32,
    /// Whether the bidder nominated this player (forces a $1 floor).
    pub is_nominator: bool,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// League-size- and aggression-adjusted baseline. The quadratic term dampens
/// extreme league sizes; the multiplier never drops below the configured floor.
fn aggression_baseline(aggression: u32, league_size: usize, params: &ValuationParams) -> f64 {
    let n = league_size as f64;
    let multiplier = (1.0 + params.league_linear * n - params.league_quadratic * n * n)
        .max(params.league_multiplier_floor);
    aggression as f64 * multiplier
}

/// Sum of the six logistic stat grades. Monotonically non-decreasing in
/// every input stat.
fn composite_score(player: &Player, params: &ValuationParams) -> f64 {
    params.points_curve.grade(player.ppg)
        + params.assists_curve.grade(player.apg)
        + params.rebounds_curve.grade(player.rpg)
        + params.threes_curve.grade(player.three_pg)
        + params.steals_curve.grade(player.spg)
        + params.blocks_curve.grade(player.bpg)
}

/// Additive shooting-efficiency layer: flat bonus for high-volume/high-
/// efficiency shooters, flat penalty for high-volume/low-efficiency ones.
fn shooting_adjustments(player: &Player, params: &ValuationParams) -> f64 {
    let mut adjustment = 0.0;
    if player.fga >= params.fg_volume_attempts {
        if player.fg_pct >= params.fg_bonus_pct {
            adjustment += params.fg_bonus;
        } else if player.fg_pct < params.fg_penalty_pct {
            adjustment -= params.fg_penalty;
        }
    }
    if player.fta >= params.ft_volume_attempts {
        if player.ft_pct >= params.ft_bonus_pct {
            adjustment += params.ft_bonus;
        } else if player.ft_pct < params.ft_penalty_pct {
            adjustment -= params.ft_penalty;
        }
    }
    adjustment
}

/// Compute an automated bidder's ceiling for a player.
///
/// Deterministic given the RNG state; the only randomness is the jitter
/// draw, which always consumes exactly one sample so call sequences stay
/// reproducible across runs with the same seed.
pub fn bid_ceiling(
    player: &Player,
    ctx: &BidContext,
    params: &ValuationParams,
    rng: &mut StdRng,
) -> u32 {
    let baseline = aggression_baseline(ctx.aggression, ctx.league_size, params);
    let composite = composite_score(player, params);

    let jitter = rng.gen_range(-params.jitter..=params.jitter);
    let adjustments =
        shooting_adjustments(player, params) - player.topg * params.turnover_weight + jitter;

    let mut score = (composite + adjustments) * (baseline / 100.0);

    if player.games < params.games_threshold {
        score *= params.games_discount;
    }

    // A nominator must always be willing to open bidding.
    if ctx.is_nominator && score < 1.0 {
        score = 1.0;
    }

    let value = score.max(0.0).round() as u32;
    value.min(ctx.max_bid)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
