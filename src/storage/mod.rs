// storage/mod.rs
// Dataset output: the CSV file and the optional SQLite mirror

mod csv;
mod migrations;
mod pool;
mod row;
mod sqlite;
mod writer;

// Re-export commonly used items
pub use self::csv::CsvSink;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use row::{dataset_columns, flatten_row, rule_column, threat_column};
pub use sqlite::{update_run_stats, RunMetadata, RunStats, SqliteSink};
pub use writer::{spawn_writer, RowSink, WriterSummary};
