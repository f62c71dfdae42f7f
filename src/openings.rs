use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::fen::normalize_fen;

/// Opening name and ECO code for one book position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    pub name: String,
    pub eco: String,
}

/// Opening name lookup keyed by FEN
pub trait OpeningLookup {
    fn lookup(&self, fen: &str) -> Option<Opening>;
}

/// Static opening book
///
/// Table format is one entry per line:
/// ```text
/// <fen>;<eco>;<name>
/// ```
/// Lines that do not split into exactly three fields are ignored, which also
/// covers blank lines and headers.
///
/// Lookup tries the exact FEN first, then the FEN with its move counters
/// normalized, so book entries recorded at move 1 still match deeper
/// transpositions of the same position.
#[derive(Debug, Default)]
pub struct OpeningBook {
    entries: HashMap<String, Opening>,
}

impl OpeningBook {
    pub fn new() -> Self {
        OpeningBook::default()
    }

    /// Parse a book table from text
    pub fn parse(text: &str) -> Self {
        let mut book = OpeningBook::new();

        for row in text.lines() {
            let fields: Vec<&str> = row.split(';').collect();
            if fields.len() != 3 {
                continue;
            }
            book.insert(fields[0].trim(), fields[1].trim(), fields[2].trim());
        }

        debug!(entries = book.len(), "parsed opening book");
        book
    }

    /// Load a book table from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)?;
        Ok(OpeningBook::parse(&text))
    }

    pub fn insert(&mut self, fen: &str, eco: &str, name: &str) {
        self.entries.insert(
            fen.to_string(),
            Opening {
                name: name.to_string(),
                eco: eco.to_string(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OpeningLookup for OpeningBook {
    fn lookup(&self, fen: &str) -> Option<Opening> {
        if let Some(opening) = self.entries.get(fen) {
            return Some(opening.clone());
        }

        let normalized = normalize_fen(fen).ok()?;
        self.entries.get(&normalized).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SICILIAN: &str = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn sample_book() -> OpeningBook {
        OpeningBook::parse(&format!(
            "{};B20;Sicilian Defense\n\nnot;a valid row\n{} ; B27 ; Sicilian Defense: Hyperaccelerated\n",
            SICILIAN, "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        ))
    }

    #[test]
    fn test_parse_skips_malformed_rows() {
        let book = sample_book();
        assert_eq!(book.len(), 2, "only well formed rows should be kept");
        assert!(!book.is_empty());
    }

    #[test]
    fn test_exact_lookup() {
        let book = sample_book();
        let opening = book.lookup(SICILIAN).expect("Sicilian should be in the book");
        assert_eq!(opening.name, "Sicilian Defense");
        assert_eq!(opening.eco, "B20");
    }

    /// Fields are trimmed on parse
    #[test]
    fn test_trimmed_fields() {
        let book = sample_book();
        let opening = book
            .lookup("rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2")
            .unwrap();
        assert_eq!(opening.eco, "B27");
        assert_eq!(opening.name, "Sicilian Defense: Hyperaccelerated");
    }

    /// A book keyed on normalized FENs matches positions with real counters
    #[test]
    fn test_normalized_lookup() {
        let mut book = OpeningBook::new();
        book.insert(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "A00",
            "Start",
        );
        let opening = book.lookup("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 4 3");
        assert_eq!(opening.map(|o| o.name), Some("Start".to_string()));
    }

    #[test]
    fn test_lookup_miss() {
        let book = sample_book();
        assert!(book.lookup("8/8/8/8/8/8/8/8 w - - 0 1").is_none());
        assert!(book.lookup("not a fen").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{};B20;Sicilian Defense", SICILIAN).unwrap();

        let book = OpeningBook::load(file.path()).expect("book file should load");
        assert_eq!(book.len(), 1);

        let missing = OpeningBook::load("test/data/no-such-book.tsv");
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
