use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use repdag::chess::{Color, Position};
use repdag::eval::{EvalCache, Evaluator, NoEval};
use repdag::openings::OpeningBook;
use repdag::repertoire::{MoveMap, MoveSource};
use repdag::{Dag, OutputMode, PgnExporter, PgnLineReader};

/// Opening repertoire builder
///
/// Reads existing repertoire PGN files (variations are expanded into separate
/// lines) and any extra lines given on the command line, merges them into a
/// graph of unique positions, and writes the result as PGN.
///
/// ## Usage Examples:
/// ```bash
/// # Consolidate a black repertoire
/// ./repdag --color black -i sicilian.pgn -o sicilian.out.pgn
///
/// # Add a new line and write one record per line
/// ./repdag --color white --format flattened -i rep.pgn -l "1. e4 e5 2. Nf3 Nc6 3. Bb5"
/// ```
#[derive(Parser)]
#[command(name = "repdag")]
#[command(about = "Merge repertoire lines into an opening DAG and write it as PGN")]
#[command(version = "0.1.0")]
struct Args {
    /// Side the repertoire is for
    #[arg(long, value_enum, value_name = "COLOR")]
    color: ColorArg,

    /// Record layout of the output
    #[arg(long, value_enum, default_value = "consolidated")]
    format: FormatArg,

    /// Existing repertoire PGN file (repeatable)
    #[arg(short, long = "input", value_name = "PGN")]
    inputs: Vec<PathBuf>,

    /// Extra line as SAN movetext, e.g. "1. d4 d5 2. c4" (repeatable)
    #[arg(short, long = "line", value_name = "MOVES")]
    lines: Vec<String>,

    /// Output PGN file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Force overwrite existing output file
    #[arg(short, long)]
    force: bool,

    /// Opening book table with `fen;eco;name` rows
    #[arg(long, value_name = "TSV")]
    book: Option<PathBuf>,

    /// Cached evaluations as JSON, keyed by FEN
    #[arg(long, value_name = "JSON")]
    evals: Option<PathBuf>,

    /// Annotator header value
    #[arg(long, default_value = "repdag")]
    annotator: String,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorArg {
    #[value(alias = "w")]
    White,
    #[value(alias = "b")]
    Black,
}

impl From<ColorArg> for Color {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::White => Color::White,
            ColorArg::Black => Color::Black,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Flattened,
    Consolidated,
}

impl From<FormatArg> for OutputMode {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Flattened => OutputMode::Flattened,
            FormatArg::Consolidated => OutputMode::Consolidated,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    // Check if output file exists and we're not forcing overwrite
    if let Some(path) = &args.output {
        if path.exists() && !args.force {
            eprintln!(
                "Error: Output file '{}' already exists. Use --force to overwrite.",
                path.display()
            );
            process::exit(1);
        }
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "repdag=debug" } else { "repdag=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> repdag::Result<()> {
    let color = Color::from(args.color);
    let mode = OutputMode::from(args.format);

    let book = match &args.book {
        Some(path) => OpeningBook::load(path)?,
        None => OpeningBook::new(),
    };
    info!(entries = book.len(), "opening book ready");

    let mut dag = Dag::new(color, mode, Box::new(book));
    let mut moves = MoveMap::new(color);
    let mut conflicts = 0;

    for input in &args.inputs {
        let mut reader = PgnLineReader::open(input)?;
        conflicts += ingest(&mut reader, &mut dag, &mut moves)?;
    }

    for (idx, text) in args.lines.iter().enumerate() {
        let name = format!("--line {}", idx + 1);
        let mut reader = PgnLineReader::from_text(&name, text);
        conflicts += ingest(&mut reader, &mut dag, &mut moves)?;
    }

    info!(
        nodes = dag.num_nodes(),
        leaves = dag.num_leaves(),
        repertoire_moves = moves.len(),
        conflicts,
        color = %color,
        mode = %mode,
        "built opening dag"
    );

    let evaluator: Box<dyn Evaluator> = match &args.evals {
        Some(path) => Box::new(EvalCache::load(path)?),
        None => Box::new(NoEval),
    };
    let exporter = PgnExporter::new()
        .with_annotator(&args.annotator)
        .with_evaluator(evaluator);

    match &args.output {
        Some(path) => {
            exporter.export(&mut dag, path)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            let records = exporter.export_to(&mut dag, &mut writer)?;
            info!(records, "wrote repertoire to stdout");
        }
    }

    Ok(())
}

/// Feed every line of every game into the DAG; returns the number of
/// repertoire move conflicts seen
fn ingest<R: Read>(
    reader: &mut PgnLineReader<R>,
    dag: &mut Dag,
    moves: &mut MoveMap,
) -> repdag::Result<usize> {
    let mut conflicts = 0;

    while let Some(game) = reader.next_game()? {
        let source = MoveSource::new(reader.source_name(), game.number);

        for line in &game.lines {
            let start = line.start_position().fen();
            if !dag.contains(&start) {
                warn!(
                    source = %source,
                    fen = %start,
                    "skipping line from a position not in the repertoire"
                );
                continue;
            }

            conflicts += moves.record_line(line, &source)?.len();
            dag.add_line(line);
        }
    }

    Ok(conflicts)
}
