use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local, Utc};
use tracing::info;

use crate::dag::Dag;
use crate::error::Result;
use crate::eval::{Evaluator, NoEval};

const DEFAULT_ANNOTATOR: &str = "repdag";

/// Per-record header values that come from the DAG
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader<'a> {
    pub event: &'a str,
    pub eco: &'a str,
    /// Start position when the record does not begin at the game root
    pub fen: Option<&'a str>,
}

impl<'a> RecordHeader<'a> {
    /// An empty `start_fen` means the record starts at the root
    pub fn new(event: &'a str, eco: &'a str, start_fen: &'a str) -> Self {
        RecordHeader {
            event,
            eco,
            fen: if start_fen.is_empty() {
                None
            } else {
                Some(start_fen)
            },
        }
    }
}

/// PGN writer for opening DAG records
///
/// Every record uses the same timestamp, taken when the exporter is built,
/// so repeated exports of the same DAG are identical.
pub struct PgnExporter {
    annotator: String,
    timestamp: DateTime<Utc>,
    evaluator: Box<dyn Evaluator>,
}

impl PgnExporter {
    pub fn new() -> Self {
        PgnExporter {
            annotator: DEFAULT_ANNOTATOR.to_string(),
            timestamp: Utc::now(),
            evaluator: Box::new(NoEval),
        }
    }

    pub fn with_annotator(mut self, annotator: &str) -> Self {
        self.annotator = annotator.to_string();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Export the DAG to a PGN file
    pub fn export(&self, dag: &mut Dag, output_path: &Path) -> Result<usize> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);

        let exported = self.export_to(dag, &mut writer)?;
        info!(records = exported, path = %output_path.display(), "wrote repertoire");

        Ok(exported)
    }

    /// Export the DAG to any writer
    pub fn export_to<W: Write>(&self, dag: &mut Dag, writer: &mut W) -> Result<usize> {
        let exported = dag.emit(self, writer)?;
        writer.flush()?;
        Ok(exported)
    }

    /// Write one complete record: headers, movetext, optional evaluation
    /// comment and the unknown-result terminator
    pub fn write_record<W: Write>(
        &self,
        writer: &mut W,
        header: &RecordHeader,
        body: &str,
        eval_fen: &str,
    ) -> io::Result<()> {
        self.write_headers(writer, header)?;

        let comment = self
            .evaluator
            .evaluate(eval_fen)
            .map(|eval| eval.comment());

        let mut movetext: Vec<&str> = Vec::new();
        if !body.is_empty() {
            movetext.push(body);
        }
        if let Some(comment) = comment.as_deref() {
            movetext.push(comment);
        }
        movetext.push("*");

        writeln!(writer)?;
        writeln!(writer, "{}", movetext.join(" "))?;
        writeln!(writer)?;
        writeln!(writer)?;

        Ok(())
    }

    fn write_headers<W: Write>(&self, writer: &mut W, header: &RecordHeader) -> io::Result<()> {
        let local = self.timestamp.with_timezone(&Local);

        // Seven Tag Roster first
        writeln!(writer, "[Event \"{}\"]", header.event)?;
        writeln!(writer, "[Site \"\"]")?;
        writeln!(writer, "[Date \"{}\"]", local.format("%Y.%m.%d"))?;
        writeln!(writer, "[Round \"1\"]")?;
        writeln!(writer, "[White \"\"]")?;
        writeln!(writer, "[Black \"\"]")?;
        writeln!(writer, "[Result \"*\"]")?;

        writeln!(writer, "[UTCDate \"{}\"]", self.timestamp.format("%Y.%m.%d"))?;
        writeln!(writer, "[UTCTime \"{}\"]", self.timestamp.format("%H:%M:%S"))?;
        writeln!(writer, "[Variant \"Standard\"]")?;
        writeln!(writer, "[ECO \"{}\"]", header.eco)?;
        writeln!(writer, "[Annotator \"{}\"]", self.annotator)?;

        if let Some(fen) = header.fen {
            writeln!(writer, "[FEN \"{}\"]", fen)?;
            writeln!(writer, "[SetUp \"1\"]")?;
        }

        Ok(())
    }
}

impl Default for PgnExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalAnnotation, EvalCache};
    use chrono::TimeZone;

    const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap()
    }

    fn render(exporter: &PgnExporter, header: &RecordHeader, body: &str, fen: &str) -> String {
        let mut out = Vec::new();
        exporter.write_record(&mut out, header, body, fen).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Headers come out in roster order, root records carry no FEN
    #[test]
    fn test_root_record_layout() {
        let exporter = PgnExporter::new().with_timestamp(fixed_time());
        let header = RecordHeader::new("King's Pawn Game", "C20", "");
        let text = render(&exporter, &header, "1. e4 e5", AFTER_E5);

        let local_date = fixed_time().with_timezone(&Local).format("%Y.%m.%d").to_string();
        let expected = format!(
            "[Event \"King's Pawn Game\"]\n[Site \"\"]\n[Date \"{}\"]\n[Round \"1\"]\n\
             [White \"\"]\n[Black \"\"]\n[Result \"*\"]\n[UTCDate \"2024.03.09\"]\n\
             [UTCTime \"17:04:05\"]\n[Variant \"Standard\"]\n[ECO \"C20\"]\n\
             [Annotator \"repdag\"]\n\n1. e4 e5 *\n\n\n",
            local_date
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_setup_tags_for_inner_records() {
        let exporter = PgnExporter::new()
            .with_timestamp(fixed_time())
            .with_annotator("me");
        let header = RecordHeader::new("", "", AFTER_E5);
        let text = render(&exporter, &header, "2. Nf3", AFTER_E5);

        assert!(text.contains(&format!("[FEN \"{}\"]\n[SetUp \"1\"]\n", AFTER_E5)));
        assert!(text.contains("[Annotator \"me\"]"));
        assert!(text.ends_with("\n2. Nf3 *\n\n\n"));
    }

    #[test]
    fn test_eval_comment_appended() {
        let mut cache = EvalCache::new();
        cache.insert(
            AFTER_E5,
            EvalAnnotation {
                score_cp: 34,
                mate: 0,
                best_move: "Nf3".to_string(),
            },
        );
        let exporter = PgnExporter::new()
            .with_timestamp(fixed_time())
            .with_evaluator(Box::new(cache));
        let header = RecordHeader::new("", "", "");

        let text = render(&exporter, &header, "1. e4 e5", AFTER_E5);
        assert!(text.ends_with("\n1. e4 e5 { [%eval 0.34] } *\n\n\n"));

        // a cache miss leaves the record without a comment
        let text = render(&exporter, &header, "1. d4", "8/8/8/8/8/8/8/8 w - - 0 1");
        assert!(text.ends_with("\n1. d4 *\n\n\n"));
    }

    #[test]
    fn test_empty_body() {
        let exporter = PgnExporter::new().with_timestamp(fixed_time());
        let text = render(&exporter, &RecordHeader::new("", "", ""), "", AFTER_E5);
        assert!(text.ends_with("\n\n*\n\n\n"));
    }
}
