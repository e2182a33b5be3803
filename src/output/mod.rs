pub mod formatter;

pub use formatter::{EventRecord, OutputFormatter, RunSummary};
