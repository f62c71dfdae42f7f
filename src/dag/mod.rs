pub mod graph;
pub mod move_run;
pub mod naming;
pub mod node;

pub use graph::{Dag, OutputMode};
pub use move_run::{MoveRun, MoveRunSet};
pub use node::{DagNode, NodeId, Provenance};
