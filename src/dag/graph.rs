use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use tracing::{debug, trace};

use super::move_run::MoveRun;
use super::naming;
use super::node::{DagNode, NodeId, Provenance};
use crate::chess::{Color, GameLine, Position};
use crate::error::Result;
use crate::fen::STARTING_FEN;
use crate::openings::OpeningLookup;
use crate::pgn::{PgnExporter, RecordHeader};

const ROOT: NodeId = NodeId(0);

/// How emitted records are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One fully expanded record per root-to-leaf path
    Flattened,
    /// One record per branch point, transposition or leaf, with converging
    /// runs nested as variations
    Consolidated,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            OutputMode::Flattened => "flattened",
            OutputMode::Consolidated => "consolidated",
        };
        write!(f, "{}", name)
    }
}

/// Deduplicated graph of every position reached by the ingested games
///
/// Nodes are keyed by exact FEN, so two move orders reaching the same
/// position (counters included) share one node. Build with [`Dag::add_game`],
/// then write it out with [`Dag::emit`].
pub struct Dag {
    nodes: Vec<DagNode>,
    node_map: HashMap<String, NodeId>,
    output_mode: OutputMode,
    repertoire_color: Color,
    openings: Box<dyn OpeningLookup>,
}

impl Dag {
    /// Create a DAG rooted at the standard starting position
    pub fn new(
        repertoire_color: Color,
        output_mode: OutputMode,
        openings: Box<dyn OpeningLookup>,
    ) -> Self {
        let root = DagNode::new(ROOT, STARTING_FEN.to_string(), Color::White, 1);

        let mut node_map = HashMap::new();
        node_map.insert(STARTING_FEN.to_string(), ROOT);

        Dag {
            nodes: vec![root],
            node_map,
            output_mode,
            repertoire_color,
            openings,
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> &DagNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DagNode> + '_ {
        self.nodes.iter()
    }

    /// Node for an exact FEN
    pub fn get(&self, fen: &str) -> Option<NodeId> {
        self.node_map.get(fen).copied()
    }

    pub fn contains(&self, fen: &str) -> bool {
        self.node_map.contains_key(fen)
    }

    /// Number of unique positions
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn repertoire_color(&self) -> Color {
        self.repertoire_color
    }

    /// Insert or link the position reached from `parent` by `mv`
    ///
    /// Without a parent this only resolves an existing position. Panics when
    /// the same parent and move resolve to two different positions, which
    /// means the rules engine was not deterministic or ingestion is broken.
    pub fn upsert<P: Position + ?Sized>(
        &mut self,
        parent: Option<NodeId>,
        position: &P,
        mv: &str,
    ) -> NodeId {
        let fen = position.fen();

        let Some(parent_id) = parent else {
            return match self.node_map.get(&fen) {
                Some(id) => *id,
                None => panic!("BUG: parentless insertion of unknown position {}", fen),
            };
        };

        if mv.is_empty() {
            panic!("BUG: empty move during node insertion");
        }

        let Some(existing) = self.get(&fen) else {
            return self.insert_node(parent_id, fen, position.turn(), mv);
        };

        match self.nodes[parent_id.0].child(mv) {
            Some(linked) if linked == existing => return existing,
            Some(linked) => panic!(
                "BUG: distinct dag nodes {} and {} for move {} from {}",
                linked.0, existing.0, mv, self.nodes[parent_id.0].fen
            ),
            None => {}
        }

        // known position, new parent
        self.nodes[parent_id.0]
            .children
            .insert(mv.to_string(), existing);
        self.nodes[existing.0].num_parents += 1;
        debug!(
            node = existing.0,
            parents = self.nodes[existing.0].num_parents,
            mv,
            "linked transposition"
        );

        // the new lineage may carry a better opening name
        if self.nodes[existing.0].provenance != Provenance::Direct {
            let book = self.openings.lookup(&fen);
            let (name, provenance) = naming::opening_name(
                book.as_ref(),
                &self.nodes[parent_id.0],
                mv,
                self.repertoire_color,
            );
            let node = &mut self.nodes[existing.0];
            if provenance.is_more_specific_than(node.provenance) {
                trace!(node = existing.0, name = %name, "upgraded opening name");
                node.opening_name = name;
                node.provenance = provenance;
            }
        }

        existing
    }

    fn insert_node(&mut self, parent_id: NodeId, fen: String, turn: Color, mv: &str) -> NodeId {
        if let Some(linked) = self.nodes[parent_id.0].child(mv) {
            panic!(
                "BUG: move {} from {} already leads to node {}",
                mv, self.nodes[parent_id.0].fen, linked.0
            );
        }

        let id = NodeId(self.nodes.len());
        let book = self.openings.lookup(&fen);
        let parent = &self.nodes[parent_id.0];

        let move_num = if turn == Color::White {
            parent.move_num + 1
        } else {
            parent.move_num
        };
        let (name, provenance) =
            naming::opening_name(book.as_ref(), parent, mv, self.repertoire_color);
        let eco = naming::opening_eco(book.as_ref(), parent);

        let mut node = DagNode::new(id, fen.clone(), turn, move_num);
        node.num_parents = 1;
        node.opening_name = name;
        node.provenance = provenance;
        node.eco = eco;
        trace!(node = id.0, fen = %fen, mv, "new position");

        self.nodes.push(node);
        self.node_map.insert(fen, id);
        self.nodes[parent_id.0].children.insert(mv.to_string(), id);

        id
    }

    /// Ingest one game: `positions[0]` is where the game starts and
    /// `positions[i + 1]` follows from `moves[i]`
    ///
    /// The start must already be in the DAG (the root, or a position reached
    /// by an earlier game). Returns the node of the last position.
    pub fn add_game<P: Position>(&mut self, moves: &[String], positions: &[P]) -> NodeId {
        if moves.len() > positions.len() {
            panic!(
                "BUG: malformed game with {} moves but {} positions",
                moves.len(),
                positions.len()
            );
        }

        let Some(start) = positions.first() else {
            return ROOT;
        };

        let mut node = self.upsert(None, start, "");
        for (mv, position) in moves.iter().zip(positions.iter().skip(1)) {
            node = self.upsert(Some(node), position, mv);
        }
        node
    }

    pub fn add_line(&mut self, line: &GameLine) -> NodeId {
        self.add_game(&line.moves, &line.positions)
    }

    /// Every root-to-leaf move sequence, one per path
    pub fn paths_to_leaves(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(ROOT, &mut prefix, &mut paths);
        paths
    }

    fn collect_paths(&self, id: NodeId, prefix: &mut Vec<String>, paths: &mut Vec<Vec<String>>) {
        let node = &self.nodes[id.0];
        if node.is_leaf() {
            paths.push(prefix.clone());
            return;
        }
        for (mv, child) in node.children() {
            prefix.push(mv.to_string());
            self.collect_paths(child, prefix, paths);
            prefix.pop();
        }
    }

    /// Write the DAG as PGN records
    ///
    /// Runs both passes from scratch each time, so calling it again without
    /// further ingestion produces the same records. Returns the number of
    /// records written.
    pub fn emit<W: Write>(&mut self, exporter: &PgnExporter, out: &mut W) -> Result<usize> {
        for node in &mut self.nodes {
            node.reset_phase_state();
        }

        self.compute_move_runs(ROOT, MoveRun::new());

        let mut records = 0;
        self.emit_node(ROOT, exporter, out, &mut records)?;
        debug!(records, mode = %self.output_mode, "emitted dag");

        Ok(records)
    }

    /// Branching or transposition node where a record boundary falls
    fn is_cut_point(&self, id: NodeId) -> bool {
        if self.output_mode != OutputMode::Consolidated || id == ROOT {
            return false;
        }
        let node = &self.nodes[id.0];
        node.num_children() > 1 || node.num_parents > 1
    }

    /// Phase 1: partition every path into per-node move runs
    fn compute_move_runs(&mut self, id: NodeId, mut run: MoveRun) {
        if self.nodes[id.0].is_leaf() {
            self.nodes[id.0].move_runs.push(run);
            return;
        }

        let consolidated = self.output_mode == OutputMode::Consolidated && id != ROOT;
        let already_computed = self.nodes[id.0].children_computed;

        if self.is_cut_point(id) || (consolidated && already_computed) {
            let node = &mut self.nodes[id.0];
            let next = MoveRun::starting_at(&node.fen, node.turn, node.move_num);
            node.move_runs.push(std::mem::replace(&mut run, next));
        }

        // a flattened lineage re-expands shared children so every leaf gets
        // its full history; consolidated visits each subgraph once
        if consolidated && already_computed {
            return;
        }

        let children: Vec<(String, NodeId)> = self.nodes[id.0]
            .children
            .iter()
            .map(|(mv, child)| (mv.clone(), *child))
            .collect();
        for (mv, child) in children {
            self.compute_move_runs(child, run.with_move(&mv));
        }

        self.nodes[id.0].children_computed = true;
    }

    /// Phase 2: write one record per leaf and, when consolidated, per cut point
    fn emit_node<W: Write>(
        &mut self,
        id: NodeId,
        exporter: &PgnExporter,
        out: &mut W,
        records: &mut usize,
    ) -> io::Result<()> {
        if self.nodes[id.0].emitted {
            return Ok(());
        }

        if self.nodes[id.0].is_leaf() {
            *records += self.emit_record(id, exporter, out)?;
            return Ok(());
        }

        if self.is_cut_point(id) {
            *records += self.emit_record(id, exporter, out)?;
        }

        let children: Vec<NodeId> = self.nodes[id.0].children.values().copied().collect();
        for child in children {
            self.emit_node(child, exporter, out, records)?;
        }

        Ok(())
    }

    fn emit_record<W: Write>(
        &mut self,
        id: NodeId,
        exporter: &PgnExporter,
        out: &mut W,
    ) -> io::Result<usize> {
        let node = &self.nodes[id.0];
        let runs = node.move_runs.runs();
        let mut written = 0;

        if self.output_mode == OutputMode::Consolidated && node.move_runs.can_merge() {
            if let Some(first) = runs.first() {
                let header = RecordHeader::new(&node.opening_name, &node.eco, &first.start_fen);
                exporter.write_record(out, &header, &node.move_runs.to_string(), &node.fen)?;
                written += 1;
            }
        } else {
            for run in runs {
                let header = RecordHeader::new(&node.opening_name, &node.eco, &run.start_fen);
                exporter.write_record(out, &header, &run.to_string(), &node.fen)?;
                written += 1;
            }
        }

        self.nodes[id.0].emitted = true;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openings::OpeningBook;

    fn dag(mode: OutputMode) -> Dag {
        Dag::new(Color::White, mode, Box::new(OpeningBook::new()))
    }

    fn line(sans: &[&str]) -> GameLine {
        GameLine::from_sans(sans).expect("test line should be legal")
    }

    #[test]
    fn test_new_dag_has_only_root() {
        let dag = dag(OutputMode::Consolidated);
        assert_eq!(dag.num_nodes(), 1);
        assert_eq!(dag.num_leaves(), 1);
        assert!(dag.contains(STARTING_FEN));
        assert_eq!(dag.node(dag.root()).num_parents(), 0);
        assert_eq!(dag.node(dag.root()).move_num(), 1);
    }

    /// Move numbers advance after black moves
    #[test]
    fn test_move_numbers() {
        let mut dag = dag(OutputMode::Flattened);
        let last = dag.add_line(&line(&["e4", "e5", "Nf3"]));
        assert_eq!(dag.node(last).move_num(), 2);
        assert_eq!(dag.node(last).turn(), Color::Black);

        let after_e5 = dag.get(line(&["e4", "e5"]).last_position().fen().as_str()).unwrap();
        assert_eq!(dag.node(after_e5).move_num(), 2);
        assert_eq!(dag.node(after_e5).turn(), Color::White);
    }

    #[test]
    fn test_cut_points_only_in_consolidated_mode() {
        for mode in [OutputMode::Flattened, OutputMode::Consolidated] {
            let mut dag = dag(mode);
            dag.add_line(&line(&["e4", "e5", "Nf3"]));
            dag.add_line(&line(&["e4", "e5", "Nc3"]));
            let branch = dag.get(&line(&["e4", "e5"]).last_position().fen()).unwrap();
            assert_eq!(dag.is_cut_point(branch), mode == OutputMode::Consolidated);
            assert!(!dag.is_cut_point(dag.root()), "root is never a cut point");
        }
    }

    #[test]
    fn test_paths_to_leaves() {
        let mut dag = dag(OutputMode::Consolidated);
        dag.add_line(&line(&["d4", "d5", "c4"]));
        dag.add_line(&line(&["d4", "Nf6"]));
        let paths = dag.paths_to_leaves();
        assert_eq!(
            paths,
            vec![
                vec!["d4".to_string(), "d5".to_string(), "c4".to_string()],
                vec!["d4".to_string(), "Nf6".to_string()],
            ]
        );
    }

    #[test]
    #[should_panic(expected = "malformed game")]
    fn test_more_moves_than_positions_panics() {
        let mut dag = dag(OutputMode::Flattened);
        let game = line(&["e4"]);
        let moves = vec!["e4".to_string(), "e5".to_string(), "Nf3".to_string()];
        dag.add_game(&moves, &game.positions);
    }

    #[test]
    #[should_panic(expected = "distinct dag nodes")]
    fn test_conflicting_identity_panics() {
        let mut dag = dag(OutputMode::Flattened);
        dag.add_line(&line(&["e4"]));
        dag.add_line(&line(&["d4"]));
        // relabel the d4 position as reached by e4
        let d4 = line(&["d4"]);
        dag.upsert(Some(dag.root()), d4.last_position(), "e4");
    }

    #[test]
    #[should_panic(expected = "parentless insertion")]
    fn test_unknown_start_panics() {
        let mut dag = dag(OutputMode::Flattened);
        let game = line(&["e4", "e5"]);
        dag.add_game(&game.moves[1..], &game.positions[1..]);
    }
}
