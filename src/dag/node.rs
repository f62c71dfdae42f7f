use indexmap::IndexMap;

use super::move_run::MoveRunSet;
use crate::chess::Color;

/// Index of a node in the DAG arena; also its creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a node's opening name came from, most specific first
///
/// The derived ordering is the ranking: a smaller value is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    /// Book entry for this position, or a book continuation
    Direct,
    /// Parent's name with one move suffix appended
    FromParent,
    /// Inherited unchanged from a suffixed ancestor
    FromAncestor,
}

impl Provenance {
    pub fn is_more_specific_than(self, other: Provenance) -> bool {
        self < other
    }
}

/// One unique position in the opening DAG
#[derive(Debug, Clone)]
pub struct DagNode {
    pub(crate) id: NodeId,
    pub(crate) fen: String,
    pub(crate) turn: Color,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) num_parents: usize,
    pub(crate) move_num: u32,
    pub(crate) opening_name: String,
    pub(crate) provenance: Provenance,
    pub(crate) eco: String,
    pub(crate) move_runs: MoveRunSet,
    pub(crate) children_computed: bool,
    pub(crate) emitted: bool,
}

impl DagNode {
    pub(crate) fn new(id: NodeId, fen: String, turn: Color, move_num: u32) -> Self {
        DagNode {
            id,
            fen,
            turn,
            children: IndexMap::new(),
            num_parents: 0,
            move_num,
            opening_name: String::new(),
            provenance: Provenance::Direct,
            eco: String::new(),
            move_runs: MoveRunSet::new(),
            children_computed: false,
            emitted: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Exact FEN, the node's identity
    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Children in the order they were first linked
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.children.iter().map(|(mv, id)| (mv.as_str(), *id))
    }

    pub fn child(&self, mv: &str) -> Option<NodeId> {
        self.children.get(mv).copied()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn num_parents(&self) -> usize {
        self.num_parents
    }

    pub fn move_num(&self) -> u32 {
        self.move_num
    }

    pub fn opening_name(&self) -> &str {
        &self.opening_name
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn eco(&self) -> &str {
        &self.eco
    }

    /// Runs recorded by the last emission pass
    pub fn move_runs(&self) -> &MoveRunSet {
        &self.move_runs
    }

    pub(crate) fn reset_phase_state(&mut self) {
        self.move_runs.clear();
        self.children_computed = false;
        self.emitted = false;
    }
}
