//! Shared terminal output helpers.
//!
//! Commands print through these so status lines, spinners, and icons stay
//! consistent across the CLI.

use console::{Emoji, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR] ");
pub static DOC: Emoji<'_, '_> = Emoji("📄 ", "");

/// Spinner shown while a request is in flight. The caller finishes or
/// clears it when the request resolves.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("progress bar template is a valid static string"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub fn success(message: impl AsRef<str>) {
    println!("{}{}", CHECK, style(message.as_ref()).green());
}

pub fn failure(message: impl AsRef<str>) {
    eprintln!("{}{}", CROSS, style(message.as_ref()).red());
}

pub fn note(message: impl AsRef<str>) {
    println!("  {}", style(message.as_ref()).dim());
}
