pub mod config;
pub mod env;
pub mod logger;

pub use config::*;
pub use env::{PgSettings, StorageConfig, load_dotenv};
pub use logger::setup_logging;
