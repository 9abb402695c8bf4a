// Auction domain: participant bookkeeping, auction state, and the engine.

pub mod engine;
pub mod participant;
pub mod state;
