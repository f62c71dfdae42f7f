use std::fmt;

use crate::chess::Color;
use crate::fen::{normalize_fen, STARTING_FEN};

/// A contiguous, unbranched run of SAN moves between two cut points
///
/// An empty `start_fen` means the run starts at the root of the game, in
/// which case the record needs no `[FEN]` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRun {
    pub moves: Vec<String>,
    pub start_fen: String,
    pub start_turn: Color,
    pub start_move_num: u32,
}

impl Default for MoveRun {
    fn default() -> Self {
        MoveRun {
            moves: Vec::new(),
            start_fen: String::new(),
            start_turn: Color::White,
            start_move_num: 1,
        }
    }
}

impl MoveRun {
    /// Empty run starting at the root of the game
    pub fn new() -> Self {
        MoveRun::default()
    }

    /// Empty run starting at a given position
    pub fn starting_at(fen: &str, turn: Color, move_num: u32) -> Self {
        MoveRun {
            moves: Vec::new(),
            start_fen: fen.to_string(),
            start_turn: turn,
            start_move_num: move_num,
        }
    }

    /// Copy of this run extended by one move
    pub fn with_move(&self, mv: &str) -> MoveRun {
        let mut run = self.clone();
        run.moves.push(mv.to_string());
        run
    }

    /// Start FEN with counters normalized; the game root normalizes to the
    /// standard starting position
    pub fn normalized_start_fen(&self) -> Option<String> {
        if self.start_fen.is_empty() {
            return normalize_fen(STARTING_FEN).ok();
        }
        normalize_fen(&self.start_fen).ok()
    }

    /// Everything after the first move, as a run starting one ply later
    fn remainder(&self) -> MoveRun {
        let turn = self.start_turn.opposite();
        let move_num = if turn == Color::White {
            self.start_move_num + 1
        } else {
            self.start_move_num
        };

        MoveRun {
            moves: self.moves.iter().skip(1).cloned().collect(),
            start_fen: String::new(),
            start_turn: turn,
            start_move_num: move_num,
        }
    }
}

impl fmt::Display for MoveRun {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut move_num = self.start_move_num;
        let mut turn = self.start_turn;

        for (idx, mv) in self.moves.iter().enumerate() {
            if idx == 0 && turn == Color::Black {
                write!(f, "{}...", move_num)?;
            } else if turn == Color::White {
                if idx != 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}.", move_num)?;
            }
            write!(f, " {}", mv)?;

            turn = turn.opposite();
            if turn == Color::White {
                move_num += 1;
            }
        }

        Ok(())
    }
}

/// Alternative move runs recorded at one DAG node
///
/// With a single member it renders as plain movetext. With several members
/// the first recorded run is the main line and every other run becomes a
/// parenthesized variation of its first move.
#[derive(Debug, Clone, Default)]
pub struct MoveRunSet {
    runs: Vec<MoveRun>,
}

impl MoveRunSet {
    pub fn new() -> Self {
        MoveRunSet::default()
    }

    pub fn push(&mut self, run: MoveRun) {
        self.runs.push(run);
    }

    pub fn runs(&self) -> &[MoveRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// True when the runs can be written as one record: same start position
    /// (counters ignored), same side to move, same start move number and
    /// same length
    ///
    /// A shuffle can bring the board back to an earlier position at a later
    /// move number, so the position alone is not enough.
    pub fn can_merge(&self) -> bool {
        let Some(first) = self.runs.first() else {
            return true;
        };
        let Some(fen) = first.normalized_start_fen() else {
            return false;
        };

        self.runs.iter().all(|run| {
            run.start_turn == first.start_turn
                && run.start_move_num == first.start_move_num
                && run.moves.len() == first.moves.len()
                && run.normalized_start_fen().as_ref() == Some(&fen)
        })
    }

    /// Panics unless all runs share start position, turn, move number and
    /// length. A mismatch means phase 1 recorded runs that cannot be merged
    /// into one record.
    fn check_consistent(&self) {
        let first = &self.runs[0];
        let fen = first.normalized_start_fen().unwrap_or_else(|| {
            panic!("BUG: cannot parse move run start FEN '{}'", first.start_fen)
        });

        for run in &self.runs {
            let cur = run.normalized_start_fen().unwrap_or_else(|| {
                panic!("BUG: cannot parse move run start FEN '{}'", run.start_fen)
            });
            if cur != fen {
                panic!(
                    "BUG: move run start FEN does not match\n\t1st: {}\n\tcur: {}",
                    fen, cur
                );
            }
            if run.start_turn != first.start_turn {
                panic!(
                    "BUG: move run turn {} does not match {}",
                    run.start_turn, first.start_turn
                );
            }
            if run.start_move_num != first.start_move_num {
                panic!(
                    "BUG: move run start move number {} does not match {}",
                    run.start_move_num, first.start_move_num
                );
            }
            if run.moves.len() != first.moves.len() {
                panic!(
                    "BUG: move run length {} does not match {}",
                    run.moves.len(),
                    first.moves.len()
                );
            }
        }
    }
}

impl fmt::Display for MoveRunSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.runs.len() {
            0 => return Ok(()),
            1 => return write!(f, "{}", self.runs[0]),
            _ => {}
        }

        self.check_consistent();

        let main = &self.runs[0];
        let Some(first_move) = main.moves.first() else {
            return Ok(());
        };

        if main.start_turn == Color::Black {
            write!(f, "{}... {}", main.start_move_num, first_move)?;
        } else {
            write!(f, "{}. {}", main.start_move_num, first_move)?;
        }

        for run in self.runs.iter().skip(1) {
            write!(f, " ({})", run)?;
        }

        let rest = main.remainder();
        if !rest.moves.is_empty() {
            write!(f, " {}", rest)?;
        }

        Ok(())
    }
}
