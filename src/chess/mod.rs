//! Chess collaborator interface
//!
//! The DAG never inspects boards. Everything it needs from the rules engine
//! is the exact FEN of a position and whose turn it is.

pub mod rules;

use std::fmt;

pub use rules::GameLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Side to move from the second field of a FEN
    pub fn from_fen(fen: &str) -> Option<Color> {
        match fen.split(' ').nth(1)? {
            "w" => Some(Color::White),
            "b" => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Color::White => "white",
            Color::Black => "black",
        };
        write!(f, "{}", name)
    }
}

/// A position as seen by the DAG
pub trait Position {
    /// Exact FEN, halfmove clock and full-move number included
    fn fen(&self) -> String;

    /// Side to move
    fn turn(&self) -> Color;
}
