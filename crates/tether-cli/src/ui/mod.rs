//! Terminal UI utilities.
//!
//! Status lines for the operator, environment detection (CI, TTY), and the
//! yes/no prompt used when the preferred port is busy.

use std::sync::atomic::{AtomicBool, Ordering};

mod messages;
mod prompt;

pub use messages::{error, info, success, url_line, warning};
pub use prompt::confirm;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Whether a human is at the terminal to answer prompts.
pub fn is_interactive() -> bool {
    !is_ci() && console::user_attended_stderr() && console::Term::stdout().is_term()
}

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR, falls back to terminal detection.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }

    console::user_attended_stderr()
}

static COLORS: AtomicBool = AtomicBool::new(true);

/// Initialize color support based on environment and `--no-color`.
pub fn init_colors(no_color: bool) {
    COLORS.store(!no_color && should_use_color(), Ordering::Relaxed);
}

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}
