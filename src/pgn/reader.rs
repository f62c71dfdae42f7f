use std::fs::File;
use std::io::Read;
use std::mem;
use std::path::Path;

use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess};
use tracing::debug;

use crate::chess::GameLine;
use crate::error::{Error, Result};

/// One game from a PGN source, expanded into independent lines
///
/// `lines[0]` is the main line; every variation follows in the order it
/// starts in the movetext, each replayed from the game's start position.
#[derive(Debug, Clone)]
pub struct PgnGame {
    pub number: usize,
    pub lines: Vec<GameLine>,
}

enum GameFailure {
    Move(Error),
    Setup { fen: String, reason: String },
}

/// Visitor that replays the movetext and records every line of play
struct LineCollector {
    line: GameLine,
    slot: usize,
    outer: Vec<(GameLine, usize)>,
    lines: Vec<Option<GameLine>>,
    failure: Option<GameFailure>,
}

impl LineCollector {
    fn new() -> Self {
        LineCollector {
            line: GameLine::new(Chess::default()),
            slot: 0,
            outer: Vec::new(),
            lines: Vec::new(),
            failure: None,
        }
    }
}

impl Visitor for LineCollector {
    type Result = std::result::Result<Vec<GameLine>, GameFailure>;

    fn begin_game(&mut self) {
        self.line = GameLine::new(Chess::default());
        self.slot = 0;
        self.outer.clear();
        self.lines = vec![None];
        self.failure = None;
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        if key != b"FEN" {
            return;
        }

        let text = match value.decode_utf8() {
            Ok(text) => text.to_string(),
            Err(e) => {
                self.failure = Some(GameFailure::Setup {
                    fen: String::from_utf8_lossy(value.as_bytes()).to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        let position = Fen::from_ascii(text.as_bytes())
            .map_err(|e| e.to_string())
            .and_then(|fen| {
                fen.into_position::<Chess>(CastlingMode::Standard)
                    .map_err(|e| e.to_string())
            });
        match position {
            Ok(pos) => self.line = GameLine::new(pos),
            Err(reason) => {
                self.failure = Some(GameFailure::Setup { fen: text, reason });
            }
        }
    }

    fn end_headers(&mut self) -> Skip {
        Skip(self.failure.is_some())
    }

    fn san(&mut self, san_plus: SanPlus) {
        if self.failure.is_some() {
            return;
        }

        if let Err(e) = self.line.push(&san_plus.to_string()) {
            self.failure = Some(GameFailure::Move(e));
        }
    }

    fn begin_variation(&mut self) -> Skip {
        if self.failure.is_some() {
            return Skip(true);
        }

        // a variation replaces the move just played
        let mut variation = self.line.clone();
        variation.pop();

        let slot = self.lines.len();
        self.lines.push(None);
        let outer_line = mem::replace(&mut self.line, variation);
        self.outer.push((outer_line, self.slot));
        self.slot = slot;

        Skip(false)
    }

    fn end_variation(&mut self) {
        if let Some((outer_line, outer_slot)) = self.outer.pop() {
            let finished = mem::replace(&mut self.line, outer_line);
            self.lines[self.slot] = Some(finished);
            self.slot = outer_slot;
        }
    }

    fn end_game(&mut self) -> Self::Result {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }

        let main = mem::replace(&mut self.line, GameLine::new(Chess::default()));
        if let Some(slot) = self.lines.get_mut(0) {
            *slot = Some(main);
        }

        Ok(mem::take(&mut self.lines)
            .into_iter()
            .flatten()
            .filter(|line| !line.is_empty())
            .collect())
    }
}

/// Streaming PGN reader producing expanded lines of play
pub struct PgnLineReader<R: Read> {
    inner: BufferedReader<R>,
    collector: LineCollector,
    source_name: String,
    games_read: usize,
}

impl PgnLineReader<File> {
    /// Open a PGN file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        Ok(PgnLineReader::new(file, &path.display().to_string()))
    }
}

impl<'a> PgnLineReader<&'a [u8]> {
    /// Read PGN movetext held in memory
    pub fn from_text(source_name: &str, text: &'a str) -> Self {
        PgnLineReader::new(text.as_bytes(), source_name)
    }
}

impl<R: Read> PgnLineReader<R> {
    pub fn new(reader: R, source_name: &str) -> Self {
        PgnLineReader {
            inner: BufferedReader::new(reader),
            collector: LineCollector::new(),
            source_name: source_name.to_string(),
            games_read: 0,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Next game, or `None` at the end of the input
    pub fn next_game(&mut self) -> Result<Option<PgnGame>> {
        let Some(outcome) = self.inner.read_game(&mut self.collector)? else {
            return Ok(None);
        };
        self.games_read += 1;

        match outcome {
            Ok(lines) => {
                debug!(
                    source = %self.source_name,
                    game = self.games_read,
                    lines = lines.len(),
                    "read game"
                );
                Ok(Some(PgnGame {
                    number: self.games_read,
                    lines,
                }))
            }
            Err(GameFailure::Move(e)) => Err(Error::IllegalMove {
                source_name: self.source_name.clone(),
                game_num: self.games_read,
                source: Box::new(e),
            }),
            Err(GameFailure::Setup { fen, reason }) => Err(Error::BadSetup {
                source_name: self.source_name.clone(),
                game_num: self.games_read,
                fen,
                reason,
            }),
        }
    }

    /// Read every remaining game
    pub fn read_all(&mut self) -> Result<Vec<PgnGame>> {
        let mut games = Vec::new();
        while let Some(game) = self.next_game()? {
            games.push(game);
        }
        Ok(games)
    }
}
