use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::chess::{Color, GameLine, Position};
use crate::error::Result;
use crate::fen::normalize_fen;

/// Where a repertoire move was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSource {
    pub source_name: String,
    pub game_num: usize,
}

impl MoveSource {
    pub fn new(source_name: &str, game_num: usize) -> Self {
        MoveSource {
            source_name: source_name.to_string(),
            game_num,
        }
    }
}

impl fmt::Display for MoveSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.source_name, self.game_num)
    }
}

#[derive(Debug, Clone)]
struct MoveEntry {
    mv: String,
    source: MoveSource,
    hit_count: usize,
}

/// Two different repertoire moves for the same position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveConflict {
    pub fen: String,
    pub kept: String,
    pub kept_source: MoveSource,
    pub rejected: String,
    pub rejected_source: MoveSource,
}

/// The move the repertoire side plays in each position
///
/// Keyed by normalized FEN, so a position reached at a different move number
/// is still the same decision. The first move recorded for a position wins.
#[derive(Debug)]
pub struct MoveMap {
    color: Color,
    entries: HashMap<String, MoveEntry>,
}

impl MoveMap {
    pub fn new(color: Color) -> Self {
        MoveMap {
            color,
            entries: HashMap::new(),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Record the move played from `fen`
    pub fn record_move(
        &mut self,
        fen: &str,
        mv: &str,
        source: &MoveSource,
    ) -> Result<Option<MoveConflict>> {
        let key = normalize_fen(fen)?;

        let Some(entry) = self.entries.get_mut(&key) else {
            self.entries.insert(
                key,
                MoveEntry {
                    mv: mv.to_string(),
                    source: source.clone(),
                    hit_count: 0,
                },
            );
            return Ok(None);
        };

        entry.hit_count += 1;
        if entry.mv == mv {
            return Ok(None);
        }

        warn!(
            "move {} from {} conflicts with move {} from {}, keeping {}",
            mv, source, entry.mv, entry.source, entry.mv
        );
        Ok(Some(MoveConflict {
            fen: key,
            kept: entry.mv.clone(),
            kept_source: entry.source.clone(),
            rejected: mv.to_string(),
            rejected_source: source.clone(),
        }))
    }

    /// Record every repertoire-side move of a line
    pub fn record_line(
        &mut self,
        line: &GameLine,
        source: &MoveSource,
    ) -> Result<Vec<MoveConflict>> {
        let mut conflicts = Vec::new();

        for (position, mv) in line.positions.iter().zip(&line.moves) {
            if Position::turn(position) != self.color {
                continue;
            }
            if let Some(conflict) = self.record_move(&Position::fen(position), mv, source)? {
                conflicts.push(conflict);
            }
        }

        Ok(conflicts)
    }

    /// Repertoire move for a position, counters ignored
    pub fn move_for(&self, fen: &str) -> Option<&str> {
        let key = normalize_fen(fen).ok()?;
        self.entries.get(&key).map(|entry| entry.mv.as_str())
    }

    /// How many times the position was seen again after its first record
    pub fn hit_count(&self, fen: &str) -> usize {
        normalize_fen(fen)
            .ok()
            .and_then(|key| self.entries.get(&key))
            .map(|entry| entry.hit_count)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
