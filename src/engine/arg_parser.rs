use clap::Parser;

/// SWAPI people loader.
///
/// Storage is chosen by environment (or `.env`): SWAPI_STORAGE=sqlite|postgres,
/// SWAPI_SQLITE_PATH, POSTGRES_USER, POSTGRES_PASSWORD, POSTGRES_DB, POSTGRES_HOST, POSTGRES_PORT.
#[derive(Clone, Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Verbose output: debug logging and a progress bar.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
