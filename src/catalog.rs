// Player catalog: read-only player records loaded from CSV, indexed by id.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to parse catalog {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("duplicate player id `{id}` in catalog")]
    DuplicateId { id: String },

    #[error("player `{id}`: field `{field}` out of range: {message}")]
    InvalidField {
        id: String,
        field: &'static str,
        message: String,
    },

    #[error("catalog is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Basketball positions used by the player pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

impl Position {
    /// Parse a position abbreviation into a Position enum.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PG" => Some(Position::PointGuard),
            "SG" => Some(Position::ShootingGuard),
            "SF" => Some(Position::SmallForward),
            "PF" => Some(Position::PowerForward),
            "C" => Some(Position::Center),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Player record
// ---------------------------------------------------------------------------

/// An immutable player record from the season-stats catalog.
///
/// All rate stats are per game; shooting percentages are fractional (0.0-1.0).
/// That fractional convention is used consistently across the catalog, the
/// valuation model, and cumulative roster stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier within the catalog.
    pub id: String,
    pub name: String,
    /// Position abbreviation as it appears in the data file (e.g. "PG").
    pub position: String,
    /// Points per game.
    pub ppg: f64,
    /// Assists per game.
    pub apg: f64,
    /// Rebounds per game.
    pub rpg: f64,
    /// Steals per game.
    pub spg: f64,
    /// Blocks per game.
    pub bpg: f64,
    /// Turnovers per game.
    pub topg: f64,
    /// Three-pointers made per game.
    pub three_pg: f64,
    /// Field-goal attempts per game.
    pub fga: f64,
    /// Field-goal percentage, fractional.
    pub fg_pct: f64,
    /// Free-throw attempts per game.
    pub fta: f64,
    /// Free-throw percentage, fractional.
    pub ft_pct: f64,
    /// Games played this season.
    pub games: u32,
}

impl Player {
    /// Parsed position enum; `None` if the data file carries an unknown
    /// abbreviation (the catalog loader rejects those up front).
    pub fn position_enum(&self) -> Option<Position> {
        Position::from_str_pos(&self.position)
    }
}

// ---------------------------------------------------------------------------
// PlayerCatalog
// ---------------------------------------------------------------------------

/// Read-only lookup of player records by identifier, preserving file order.
///
/// Catalog order matters: the engine's default nomination policy picks the
/// first not-yet-nominated player in this order.
#[derive(Debug, Clone)]
pub struct PlayerCatalog {
    players: Vec<Player>,
    index: HashMap<String, usize>,
}

impl PlayerCatalog {
    /// Build a catalog from already-parsed records, validating integrity:
    /// unique ids, known positions, fractional percentages, non-negative
    /// rate stats.
    pub fn new(players: Vec<Player>) -> Result<Self, CatalogError> {
        if players.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(players.len());
        for (i, player) in players.iter().enumerate() {
            validate_player(player)?;
            if index.insert(player.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId {
                    id: player.id.clone(),
                });
            }
        }

        Ok(PlayerCatalog { players, index })
    }

    /// Load a catalog from a CSV file with a header row matching the
    /// `Player` field names.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|_| CatalogError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        Self::from_reader(file, path)
    }

    /// Parse a catalog from any reader (used by `load` and by tests that
    /// feed in-memory CSV without touching the filesystem).
    pub fn from_reader<R: std::io::Read>(reader: R, path: &Path) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut players = Vec::new();
        for record in csv_reader.deserialize() {
            let player: Player = record.map_err(|e| CatalogError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            players.push(player);
        }
        Self::new(players)
    }

    /// Look up a player by id.
    pub fn find_by_id(&self, id: &str) -> Option<&Player> {
        self.index.get(id).map(|&i| &self.players[i])
    }

    /// All players in catalog order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_player(player: &Player) -> Result<(), CatalogError> {
    if player.position_enum().is_none() {
        return Err(CatalogError::InvalidField {
            id: player.id.clone(),
            field: "position",
            message: format!("unknown position `{}`", player.position),
        });
    }

    for (field, value) in [("fg_pct", player.fg_pct), ("ft_pct", player.ft_pct)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(CatalogError::InvalidField {
                id: player.id.clone(),
                field,
                message: format!("must be a fraction in [0, 1], got {value}"),
            });
        }
    }

    let rate_fields = [
        ("ppg", player.ppg),
        ("apg", player.apg),
        ("rpg", player.rpg),
        ("spg", player.spg),
        ("bpg", player.bpg),
        ("topg", player.topg),
        ("three_pg", player.three_pg),
        ("fga", player.fga),
        ("fta", player.fta),
    ];
    for (field, value) in rate_fields {
        if !value.is_finite() || value < 0.0 {
            return Err(CatalogError::InvalidField {
                id: player.id.clone(),
                field,
                message: format!("must be a non-negative number, got {value}"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
