use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fen::normalize_fen;

/// Engine evaluation attached to an emitted record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvalAnnotation {
    /// Centipawns from white's point of view
    #[serde(default, rename = "cp")]
    pub score_cp: i32,
    /// Moves to mate, 0 when there is no forced mate
    #[serde(default)]
    pub mate: i32,
    #[serde(default)]
    pub best_move: String,
}

impl EvalAnnotation {
    /// PGN comment in `[%eval ...]` form
    pub fn comment(&self) -> String {
        if self.mate != 0 {
            return format!("{{ [%eval #{}] }}", self.mate);
        }
        format!("{{ [%eval {:.2}] }}", self.score_cp as f64 / 100.0)
    }
}

/// Position evaluation collaborator
///
/// Implementations swallow their own failures: an unavailable engine or cache
/// miss is `None`, never an error, so emission always completes.
pub trait Evaluator {
    fn evaluate(&self, fen: &str) -> Option<EvalAnnotation>;
}

/// Evaluator that never annotates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEval;

impl Evaluator for NoEval {
    fn evaluate(&self, _fen: &str) -> Option<EvalAnnotation> {
        None
    }
}

/// Evaluations read from a JSON file of previously computed results
///
/// ```json
/// { "<fen>": { "cp": 25, "mate": 0, "best_move": "Nf3" } }
/// ```
#[derive(Debug, Default)]
pub struct EvalCache {
    entries: HashMap<String, EvalAnnotation>,
}

impl EvalCache {
    pub fn new() -> Self {
        EvalCache::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entries: HashMap<String, EvalAnnotation> = serde_json::from_str(text)?;
        debug!(entries = entries.len(), "parsed eval cache");
        Ok(EvalCache { entries })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)?;
        EvalCache::from_json(&text)
    }

    pub fn insert(&mut self, fen: &str, annotation: EvalAnnotation) {
        self.entries.insert(fen.to_string(), annotation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Evaluator for EvalCache {
    fn evaluate(&self, fen: &str) -> Option<EvalAnnotation> {
        if let Some(annotation) = self.entries.get(fen) {
            return Some(annotation.clone());
        }

        let normalized = normalize_fen(fen).ok()?;
        self.entries.get(&normalized).cloned()
    }
}
