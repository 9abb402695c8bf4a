// The auction engine: nomination, bidding, and resolution over all rounds.
//
// Single-actor cooperative scheduling: exactly one nomination or bid is in
// flight at any time, and the only suspension points are the bounded human
// windows and the fixed automated-response delay. Every windowed wait has a
// fallback that fires exactly once on expiry; a legal submission cancels the
// wait the moment it arrives.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::auction::participant::Participant;
use crate::auction::state::AuctionState;
use crate::catalog::{Player, PlayerCatalog};
use crate::config::{AuctionSettings, ParticipantConfig, AGGRESSION_LEVELS};
use crate::protocol::{AuctionEvent, Submission, SubmissionAction};
use crate::ranking::{standings, Standing};
use crate::valuation::{bid_ceiling, BidContext, ValuationParams};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EngineError {
    /// A nomination resolved to an id the catalog doesn't know. This can
    /// only come from an internal index mismatch, so it aborts the auction.
    #[error("nominated player `{id}` not found in catalog")]
    UnknownPlayer { id: String },

    /// The catalog is too small to fill every roster.
    #[error("catalog has {available} players but the auction needs {needed}")]
    InsufficientPlayers { needed: usize, available: usize },

    /// No participant with an open roster slot at resolution time; the
    /// round/slot bookkeeping is corrupt.
    #[error("no participant with an open roster slot at resolution")]
    NoOpenRoster,
}

// ---------------------------------------------------------------------------
// Participant assembly
// ---------------------------------------------------------------------------

/// Build the participant list from config entries.
///
/// Aggression levels not set explicitly are assigned round-robin from the
/// fixed set, in file order, so a terse league file still gets varied bots.
pub fn build_participants(
    configs: &[ParticipantConfig],
    budget: u32,
    roster_size: usize,
) -> Vec<Participant> {
    configs
        .iter()
        .enumerate()
        .map(|(i, config)| {
            let aggression = config
                .aggression
                .unwrap_or(AGGRESSION_LEVELS[i % AGGRESSION_LEVELS.len()]);
            Participant::new(
                config.name.clone(),
                config.automated,
                aggression,
                budget,
                roster_size,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// AuctionEngine
// ---------------------------------------------------------------------------

/// Drives the full auction: for each round, each participant nominates once
/// and a bidding pass runs across all participants; resolution awards the
/// player, resets bids, and re-ranks.
pub struct AuctionEngine {
    settings: AuctionSettings,
    valuation: ValuationParams,
    catalog: PlayerCatalog,
    participants: Vec<Participant>,
    state: AuctionState,
    rng: StdRng,
    submissions: mpsc::Receiver<Submission>,
    events: mpsc::Sender<AuctionEvent>,
}

impl AuctionEngine {
    pub fn new(
        settings: AuctionSettings,
        valuation: ValuationParams,
        catalog: PlayerCatalog,
        participants: Vec<Participant>,
        seed: u64,
        submissions: mpsc::Receiver<Submission>,
        events: mpsc::Sender<AuctionEvent>,
    ) -> Self {
        let state = AuctionState::new(participants.len(), settings.roster_size);
        AuctionEngine {
            settings,
            valuation,
            catalog,
            participants,
            state,
            rng: StdRng::seed_from_u64(seed),
            submissions,
            events,
        }
    }

    /// Read-only view of the participants (used by tests and the binary
    /// after `run` is not an option since `run` consumes the engine).
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Run the auction to completion and return the final standings.
    ///
    /// Exactly `roster_size * participant_count` nominations resolve, each
    /// with exactly one winner, so every roster is full on return.
    pub async fn run(mut self) -> Result<Vec<Standing>, EngineError> {
        let needed = self.settings.roster_size * self.participants.len();
        if self.catalog.len() < needed {
            return Err(EngineError::InsufficientPlayers {
                needed,
                available: self.catalog.len(),
            });
        }

        info!(
            participants = self.participants.len(),
            roster_size = self.settings.roster_size,
            "auction starting"
        );

        while !self.state.is_complete() {
            if self.state.nominator == 0 {
                self.emit(AuctionEvent::RoundStarted {
                    round: self.state.round,
                });
            }
            self.run_nomination().await?;
            self.state.advance();
        }

        let final_standings = standings(&self.participants);
        info!("auction complete");
        self.emit(AuctionEvent::AuctionComplete(final_standings.clone()));
        Ok(final_standings)
    }

    // -- One nomination: pick a player, collect bids, resolve a winner. --

    async fn run_nomination(&mut self) -> Result<(), EngineError> {
        let nominator = self.state.nominator;
        self.emit(AuctionEvent::NominationOpen {
            round: self.state.round,
            nominator: self.participants[nominator].name.clone(),
        });

        let player_id = self.resolve_nomination(nominator).await?;
        let player = self
            .catalog
            .find_by_id(&player_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownPlayer {
                id: player_id.clone(),
            })?;

        self.state.mark_nominated(&player_id);
        info!(
            round = self.state.round,
            nominator = %self.participants[nominator].name,
            player = %player.name,
            "player nominated"
        );
        self.emit(AuctionEvent::PlayerNominated {
            player: player.clone(),
            nominated_by: self.participants[nominator].name.clone(),
        });

        self.collect_bids(nominator, &player).await;
        self.resolve(player)
    }

    /// Determine which player the current nominator puts up. Automated
    /// nominators use the default policy immediately; humans get a bounded
    /// window with the same policy as the expiry fallback.
    async fn resolve_nomination(&mut self, nominator: usize) -> Result<String, EngineError> {
        if !self.participants[nominator].automated {
            if let Some(id) = self.await_human_nomination(nominator).await {
                return Ok(id);
            }
            debug!(
                nominator = %self.participants[nominator].name,
                "nomination window expired, falling back to default pick"
            );
        }

        self.state
            .default_pick(&self.catalog)
            .map(str::to_string)
            .ok_or_else(|| EngineError::InsufficientPlayers {
                needed: self.state.nominated_count() + 1,
                available: self.catalog.len(),
            })
    }

    /// Wait for the nominator to submit a legal nomination, ignoring
    /// late/mismatched submissions and unknown or already-taken ids.
    /// Returns `None` on window expiry (or if the submission channel is
    /// gone, which the engine treats the same way).
    async fn await_human_nomination(&mut self, nominator: usize) -> Option<String> {
        let deadline = Instant::now() + self.settings.nomination_window;
        loop {
            match timeout_at(deadline, self.submissions.recv()).await {
                Ok(Some(Submission {
                    participant,
                    action: SubmissionAction::Nominate(id),
                })) if participant == nominator => {
                    if self.state.is_available(&id) && self.catalog.find_by_id(&id).is_some() {
                        return Some(id);
                    }
                    debug!(participant, id, "ignoring unavailable nomination");
                }
                Ok(Some(submission)) => {
                    debug!(?submission, "ignoring mismatched submission");
                }
                Ok(None) => return None,
                Err(_) => return None,
            }
        }
    }

    /// One bidding pass: nominator first, then the rest in rotation order.
    /// Full rosters are skipped entirely (their bid stays 0).
    async fn collect_bids(&mut self, nominator: usize, player: &Player) {
        let order = self.state.bid_order();
        let league_size = self.participants.len();

        for (position, &idx) in order.iter().enumerate() {
            if self.participants[idx].roster_full() {
                debug!(participant = %self.participants[idx].name, "roster full, skipping bidder");
                continue;
            }

            let is_nominator = position == 0;
            debug_assert_eq!(is_nominator, idx == nominator);
            let max_bid = self.participants[idx].max_bid();

            let amount = if self.participants[idx].automated {
                sleep(self.settings.bot_delay).await;
                let ctx = BidContext {
                    aggression: self.participants[idx].aggression,
                    league_size,
                    max_bid,
                    is_nominator,
                };
                Some(bid_ceiling(player, &ctx, &self.valuation, &mut self.rng))
            } else {
                self.await_human_bid(idx, max_bid).await
            };

            let amount = match amount {
                Some(amount) => amount,
                // The nominator's opening bid defaults to 1 when the window
                // lapses; everyone else's lapse is a pass at their previous
                // value (0 if none was ever accepted).
                None if is_nominator => 1.min(max_bid),
                None => continue,
            };

            match self.participants[idx].place_bid(amount) {
                Ok(()) => {
                    debug!(participant = %self.participants[idx].name, amount, "bid placed");
                    self.emit(AuctionEvent::BidUpdated {
                        participant: self.participants[idx].name.clone(),
                        amount,
                    });
                }
                Err(e) => {
                    // Legality is enforced before this point; treat as a pass.
                    warn!(participant = %self.participants[idx].name, %e, "bid not accepted");
                }
            }
        }
    }

    /// Wait for a legal bid from the given participant. Illegal amounts are
    /// rejected without cancelling the wait; the window keeps running until
    /// a legal value arrives or it expires (a pass).
    async fn await_human_bid(&mut self, bidder: usize, max_bid: u32) -> Option<u32> {
        let deadline = Instant::now() + self.settings.bidding_window;
        loop {
            match timeout_at(deadline, self.submissions.recv()).await {
                Ok(Some(Submission {
                    participant,
                    action: SubmissionAction::Bid(amount),
                })) if participant == bidder => {
                    if amount <= max_bid {
                        return Some(amount);
                    }
                    warn!(
                        participant = %self.participants[bidder].name,
                        amount,
                        max_bid,
                        "rejecting bid above ceiling"
                    );
                }
                Ok(Some(submission)) => {
                    debug!(?submission, "ignoring mismatched submission");
                }
                Ok(None) => return None,
                Err(_) => return None,
            }
        }
    }

    /// Resolve the active nomination: the winner is drawn uniformly from the
    /// open-slot participants tied at the maximum bid (a deliberate fairness
    /// rule, reproducible under the engine seed). Every bid is then reset
    /// before the next nomination, and standings are recomputed.
    fn resolve(&mut self, player: Player) -> Result<(), EngineError> {
        let open: Vec<usize> = (0..self.participants.len())
            .filter(|&i| !self.participants[i].roster_full())
            .collect();
        let top = open
            .iter()
            .map(|&i| self.participants[i].current_bid)
            .max()
            .ok_or(EngineError::NoOpenRoster)?;
        let tied: Vec<usize> = open
            .into_iter()
            .filter(|&i| self.participants[i].current_bid == top)
            .collect();

        let winner = tied[self.rng.gen_range(0..tied.len())];
        info!(
            winner = %self.participants[winner].name,
            player = %player.name,
            amount = top,
            tied = tied.len(),
            "nomination resolved"
        );
        self.emit(AuctionEvent::NominationResolved {
            winner: self.participants[winner].name.clone(),
            player: player.clone(),
            amount: top,
        });
        self.participants[winner].award_player(player, top);

        // Reset every bid unconditionally; skipping this would corrupt the
        // next nomination's resolution.
        for participant in &mut self.participants {
            participant.reset_bid();
        }
        self.state.mark_resolved();

        self.emit(AuctionEvent::StandingsUpdated(standings(&self.participants)));
        Ok(())
    }

    /// Fire-and-forget event emission: a missing or saturated listener is
    /// never allowed to stall the round loop.
    fn emit(&self, event: AuctionEvent) {
        if self.events.try_send(event).is_err() {
            debug!("presentation event dropped (no listener or buffer full)");
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_settings(roster_size: usize, budget: u32) -> AuctionSettings {
        AuctionSettings {
            roster_size,
            budget,
            nomination_window: Duration::from_secs(5),
            bidding_window: Duration::from_secs(5),
            bot_delay: Duration::from_millis(100),
        }
    }

    fn test_catalog(count: usize) -> PlayerCatalog {
        let players = (0..count)
            .map(|i| Player {
                id: format!("p{i:03}"),
                name: format!("Player {i}"),
                position: ["PG", "SG", "SF", "PF", "C"][i % 5].to_string(),
                ppg: 28.0 - (i as f64) * 0.4,
                apg: 9.0 - (i as f64) * 0.1,
                rpg: 11.0 - (i as f64) * 0.1,
                spg: 2.0 - (i as f64) * 0.02,
                bpg: 1.8 - (i as f64) * 0.02,
                topg: 1.0 + (i as f64) * 0.05,
                three_pg: 2.8 - (i as f64) * 0.04,
                fga: 18.0 - (i as f64) * 0.2,
                fg_pct: 0.55 - (i as f64) * 0.003,
                fta: 7.0 - (i as f64) * 0.1,
                ft_pct: 0.90 - (i as f64) * 0.004,
                games: 78,
            })
            .collect();
        PlayerCatalog::new(players).unwrap()
    }

    fn bot_configs(count: usize) -> Vec<ParticipantConfig> {
        (0..count)
            .map(|i| ParticipantConfig {
                name: format!("Bot {i}"),
                automated: true,
                aggression: None,
            })
            .collect()
    }

    fn channels() -> (
        mpsc::Sender<Submission>,
        mpsc::Receiver<Submission>,
        mpsc::Sender<AuctionEvent>,
        mpsc::Receiver<AuctionEvent>,
    ) {
        let (sub_tx, sub_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(4096);
        (sub_tx, sub_rx, event_tx, event_rx)
    }

    async fn run_bot_auction(
        participant_count: usize,
        roster_size: usize,
        seed: u64,
    ) -> (Vec<Standing>, Vec<AuctionEvent>) {
        let (_sub_tx, sub_rx, event_tx, mut event_rx) = channels();
        let settings = test_settings(roster_size, 200);
        let participants = build_participants(&bot_configs(participant_count), 200, roster_size);
        let engine = AuctionEngine::new(
            settings,
            ValuationParams::default(),
            test_catalog(participant_count * roster_size + 5),
            participants,
            seed,
            sub_rx,
            event_tx,
        );

        let final_standings = engine.run().await.expect("auction should complete");
        let mut events = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            events.push(event);
        }
        (final_standings, events)
    }

    #[test]
    fn build_participants_assigns_round_robin_aggression() {
        let participants = build_participants(&bot_configs(6), 200, 10);
        assert_eq!(participants[0].aggression, AGGRESSION_LEVELS[0]);
        assert_eq!(participants[3].aggression, AGGRESSION_LEVELS[3]);
        assert_eq!(participants[4].aggression, AGGRESSION_LEVELS[0]);
    }

    #[test]
    fn build_participants_honors_explicit_aggression() {
        let configs = vec![
            ParticipantConfig {
                name: "A".into(),
                automated: true,
                aggression: Some(52),
            },
            ParticipantConfig {
                name: "B".into(),
                automated: false,
                aggression: None,
            },
        ];
        let participants = build_participants(&configs, 200, 10);
        assert_eq!(participants[0].aggression, 52);
        assert!(!participants[1].automated);
    }

    #[tokio::test(start_paused = true)]
    async fn full_bot_auction_fills_every_roster() {
        let (final_standings, events) = run_bot_auction(4, 3, 11).await;

        assert_eq!(final_standings.len(), 4);
        let resolved = events
            .iter()
            .filter(|e| matches!(e, AuctionEvent::NominationResolved { .. }))
            .count();
        assert_eq!(resolved, 12);
        assert!(matches!(
            events.last(),
            Some(AuctionEvent::AuctionComplete(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn event_sequence_per_nomination() {
        let (_, events) = run_bot_auction(2, 1, 3).await;

        // RoundStarted, then per nomination: NominationOpen, PlayerNominated,
        // bids, NominationResolved, StandingsUpdated; AuctionComplete last.
        assert!(matches!(events[0], AuctionEvent::RoundStarted { round: 1 }));
        assert!(matches!(events[1], AuctionEvent::NominationOpen { .. }));
        assert!(matches!(events[2], AuctionEvent::PlayerNominated { .. }));
        let resolved_positions: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, AuctionEvent::NominationResolved { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(resolved_positions.len(), 2);
        for &pos in &resolved_positions {
            assert!(matches!(
                events[pos + 1],
                AuctionEvent::StandingsUpdated(_)
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn same_seed_reproduces_the_auction() {
        let (standings_a, events_a) = run_bot_auction(3, 2, 77).await;
        let (standings_b, events_b) = run_bot_auction(3, 2, 77).await;

        assert_eq!(events_a.len(), events_b.len());
        let winners = |events: &[AuctionEvent]| -> Vec<(String, String, u32)> {
            events
                .iter()
                .filter_map(|e| match e {
                    AuctionEvent::NominationResolved {
                        winner,
                        player,
                        amount,
                    } => Some((winner.clone(), player.id.clone(), *amount)),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(winners(&events_a), winners(&events_b));
        let ranks = |table: &[Standing]| -> Vec<(usize, u32)> {
            table.iter().map(|s| (s.participant, s.points)).collect()
        };
        assert_eq!(ranks(&standings_a), ranks(&standings_b));
    }

    #[tokio::test(start_paused = true)]
    async fn insufficient_catalog_aborts_before_starting() {
        let (_sub_tx, sub_rx, event_tx, _event_rx) = channels();
        let participants = build_participants(&bot_configs(4), 200, 5);
        let engine = AuctionEngine::new(
            test_settings(5, 200),
            ValuationParams::default(),
            test_catalog(10), // needs 20
            participants,
            1,
            sub_rx,
            event_tx,
        );
        let err = engine.run().await.unwrap_err();
        match err {
            EngineError::InsufficientPlayers { needed, available } => {
                assert_eq!(needed, 20);
                assert_eq!(available, 10);
            }
            other => panic!("expected InsufficientPlayers, got: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn budget_invariants_hold_throughout() {
        let (_sub_tx, sub_rx, event_tx, _event_rx) = channels();
        let settings = test_settings(4, 100);
        let participants = build_participants(&bot_configs(3), 100, 4);
        let engine = AuctionEngine::new(
            settings,
            ValuationParams::default(),
            test_catalog(20),
            participants,
            5,
            sub_rx,
            event_tx,
        );

        // Run to completion, then audit the books: the per-slot reserve
        // guarantees nobody overspent and every roster is exactly full.
        let final_standings = engine.run().await.unwrap();
        assert_eq!(final_standings.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn human_timeout_falls_back_to_default_pick() {
        let (_sub_tx, sub_rx, event_tx, mut event_rx) = channels();
        let configs = vec![
            ParticipantConfig {
                name: "Human".into(),
                automated: false,
                aggression: None,
            },
            ParticipantConfig {
                name: "Bot".into(),
                automated: true,
                aggression: Some(43),
            },
        ];
        let participants = build_participants(&configs, 50, 1);
        let engine = AuctionEngine::new(
            test_settings(1, 50),
            ValuationParams::default(),
            test_catalog(5),
            participants,
            9,
            sub_rx,
            event_tx,
        );

        // No submissions ever arrive: the human's windows all expire, the
        // default policy nominates p000, and the auction still completes.
        engine.run().await.unwrap();

        let mut nominated_ids = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            if let AuctionEvent::PlayerNominated { player, .. } = event {
                nominated_ids.push(player.id);
            }
        }
        assert_eq!(nominated_ids, vec!["p000".to_string(), "p001".to_string()]);
    }
}
