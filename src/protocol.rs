// Channel message types between the engine and the outer I/O layer.
//
// Submissions flow inward (human nominations and bids); auction events flow
// outward to whatever presentation layer is listening. The engine never
// blocks on the event side: events are fire-and-forget.

use crate::catalog::Player;
use crate::ranking::Standing;

// ---------------------------------------------------------------------------
// Inbound: human submissions
// ---------------------------------------------------------------------------

/// A human participant's action, submitted while a window is open.
///
/// Submissions are only honored while the engine is waiting on that exact
/// participant for that exact action; anything late or mismatched is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Index of the submitting participant in the auction's fixed order.
    pub participant: usize,
    pub action: SubmissionAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionAction {
    /// Nominate the player with this catalog id.
    Nominate(String),
    /// Bid this amount on the active nomination.
    Bid(u32),
}

// ---------------------------------------------------------------------------
// Outbound: presentation events
// ---------------------------------------------------------------------------

/// Events emitted by the engine for a presentation layer. Fire-and-forget:
/// a slow or absent listener never stalls the auction.
#[derive(Debug, Clone)]
pub enum AuctionEvent {
    /// A new round of nominations has begun (1-based).
    RoundStarted { round: usize },
    /// The named participant is on the clock to nominate.
    NominationOpen { round: usize, nominator: String },
    /// A player has been nominated and bidding is about to open.
    PlayerNominated {
        player: Player,
        nominated_by: String,
    },
    /// A participant's bid for the active nomination changed.
    BidUpdated { participant: String, amount: u32 },
    /// The active nomination resolved to a winner.
    NominationResolved {
        winner: String,
        player: Player,
        amount: u32,
    },
    /// Standings were recomputed after a resolution.
    StandingsUpdated(Vec<Standing>),
    /// Every roster is full; final standings attached.
    AuctionComplete(Vec<Standing>),
}
