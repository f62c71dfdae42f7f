//! `shakmaty` backed rules adapter
//!
//! Legality, SAN parsing/encoding and FEN serialization are all delegated to
//! `shakmaty`; this module only translates between its types and ours.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, EnPassantMode};

use super::{Color, Position};
use crate::error::{Error, Result};

impl Position for Chess {
    fn fen(&self) -> String {
        Fen::from_position(self.clone(), EnPassantMode::Legal).to_string()
    }

    fn turn(&self) -> Color {
        match shakmaty::Position::turn(self) {
            shakmaty::Color::White => Color::White,
            shakmaty::Color::Black => Color::Black,
        }
    }
}

/// Play one SAN move, returning the canonical SAN label and the new position
pub fn play_san(pos: &Chess, text: &str) -> Result<(String, Chess)> {
    let san_error = |reason: String| Error::San {
        san: text.to_string(),
        reason,
    };

    let san_plus: SanPlus = text.parse().map_err(|e| san_error(format!("{}", e)))?;
    let m = san_plus.san.to_move(pos).map_err(|e| san_error(format!("{}", e)))?;

    let mut next = pos.clone();
    let label = SanPlus::from_move_and_play_unchecked(&mut next, &m);
    Ok((label.to_string(), next))
}

/// One unbranched line of play: `positions[0]` is the start position and
/// `positions[i + 1]` is the result of playing `moves[i]`.
#[derive(Debug, Clone)]
pub struct GameLine {
    pub moves: Vec<String>,
    pub positions: Vec<Chess>,
}

impl GameLine {
    pub fn new(start: Chess) -> Self {
        GameLine {
            moves: Vec::new(),
            positions: vec![start],
        }
    }

    /// Build a line from the standard starting position
    pub fn from_sans(sans: &[&str]) -> Result<Self> {
        let mut line = GameLine::new(Chess::default());
        for san in sans {
            line.push(san)?;
        }
        Ok(line)
    }

    /// Play a move at the end of the line
    pub fn push(&mut self, text: &str) -> Result<()> {
        let (label, next) = play_san(self.last_position(), text)?;
        self.moves.push(label);
        self.positions.push(next);
        Ok(())
    }

    /// Take back the last move, if any
    pub fn pop(&mut self) -> Option<String> {
        let mv = self.moves.pop()?;
        self.positions.pop();
        Some(mv)
    }

    pub fn start_position(&self) -> &Chess {
        &self.positions[0]
    }

    pub fn last_position(&self) -> &Chess {
        // never empty, the start position is always present
        &self.positions[self.positions.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::STARTING_FEN;

    #[test]
    fn test_default_position_fen() {
        let pos = Chess::default();
        assert_eq!(Position::fen(&pos), STARTING_FEN);
        assert_eq!(Position::turn(&pos), Color::White);
    }

    /// Labels come back canonical, with check markers
    #[test]
    fn test_play_san_canonical_label() {
        let line = GameLine::from_sans(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7"]).unwrap();
        assert_eq!(line.moves.last().map(String::as_str), Some("Qxf7#"));
        assert_eq!(line.positions.len(), line.moves.len() + 1);
    }

    #[test]
    fn test_play_san_rejects_illegal_move() {
        let result = play_san(&Chess::default(), "e5");
        assert!(result.is_err(), "1. e5 is not legal for white");

        match play_san(&Chess::default(), "not-a-move") {
            Err(Error::San { san, .. }) => assert_eq!(san, "not-a-move"),
            other => panic!("garbage must not parse, got {:?}", other.map(|(label, _)| label)),
        }
    }

    #[test]
    fn test_push_and_pop() {
        let mut line = GameLine::from_sans(&["d4", "d5"]).unwrap();
        assert_eq!(line.len(), 2);
        assert_eq!(line.pop().as_deref(), Some("d5"));
        assert_eq!(line.len(), 1);
        assert_eq!(Position::turn(line.last_position()), Color::Black);
        line.pop();
        assert!(line.is_empty());
        assert_eq!(line.pop(), None);
        assert_eq!(Position::fen(line.start_position()), STARTING_FEN);
    }

    /// Exact FEN carries the move counters
    #[test]
    fn test_fen_includes_counters() {
        let line = GameLine::from_sans(&["Nf3", "Nf6", "Ng1", "Ng8"]).unwrap();
        let fen = Position::fen(line.last_position());
        assert_eq!(fen, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 4 3");
    }
}
