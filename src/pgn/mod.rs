pub mod exporter;
pub mod reader;

pub use exporter::{PgnExporter, RecordHeader};
pub use reader::{PgnGame, PgnLineReader};
