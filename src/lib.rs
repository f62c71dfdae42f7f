//! Opening repertoire DAG
//!
//! Merges chess repertoire lines into a graph of unique positions and writes
//! it back as PGN, either one fully expanded record per line or consolidated
//! records that share branch points and transpositions.

pub mod chess;
pub mod dag;
pub mod error;
pub mod eval;
pub mod fen;
pub mod openings;
pub mod pgn;
pub mod repertoire;

pub use dag::{Dag, DagNode, MoveRun, MoveRunSet, NodeId, OutputMode, Provenance};
pub use error::{Error, Result};
pub use pgn::{PgnExporter, PgnLineReader};
