//! Engine: CLI arguments, entry-point handlers, storage, progress display.

pub mod arg_parser;
pub mod db_ops;
pub mod handlers;
pub mod progress;

pub use arg_parser::Cli;
pub use db_ops::{PeopleRow, PgStore, RecordStore, SqliteStore, Store};
pub use handlers::{handle_ingest, handle_migrate};
