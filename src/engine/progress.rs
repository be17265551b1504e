//! Progress bar for the chunk loop (verbose mode only).

use kdam::{Animation, Bar, BarExt};

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub unit: &'static str,
}

impl ProgressBarConfig {
    pub fn chunks(total: usize) -> Self {
        Self {
            total,
            desc: "Ingesting",
            unit: " chunks",
        }
    }
}

pub fn create_progress_bar(config: ProgressBarConfig) -> Bar {
    kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        unit = config.unit,
        animation = Animation::Classic
    )
}

/// Advance the bar if there is one. Display errors are ignored.
pub fn update_progress_bar(bar: Option<&mut Bar>, n: usize) {
    if let Some(bar) = bar {
        let _ = bar.update(n);
    }
}

/// Leave the finished bar on its own line so following log output starts clean.
pub fn finish_progress_bar(bar: Option<Bar>) {
    if let Some(mut bar) = bar {
        let _ = bar.refresh();
        eprintln!();
    }
}
