//! Terminal detection and capability utilities
//!
//! stdin carries the links and stdout the dry-run names, so only stderr is
//! checked when deciding how to draw diagnostics.

use is_terminal::IsTerminal;
use std::env;
use std::io::stderr;

/// Check if stderr is connected to an interactive terminal
pub fn stderr_is_terminal() -> bool {
    if !stderr().is_terminal() {
        return false;
    }

    // CI runners may allocate a TTY that nobody watches
    !is_ci_environment()
}

/// Check if the terminal supports ANSI escape codes for colors and spinners
pub fn supports_ansi() -> bool {
    if !stderr_is_terminal() {
        return false;
    }

    let term = env::var("TERM").unwrap_or_default();
    term_supports_ansi(&term)
}

fn term_supports_ansi(term: &str) -> bool {
    // Modern Windows consoles handle ANSI without TERM
    if cfg!(windows) {
        return term != "dumb";
    }
    !(term == "dumb" || term.is_empty())
}

/// Whether colored output was disabled through the environment
pub fn color_disabled() -> bool {
    env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

/// Detect if running in a CI environment
fn is_ci_environment() -> bool {
    let ci_vars = [
        "CI",
        "CONTINUOUS_INTEGRATION",
        "JENKINS_URL",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "TRAVIS",
        "CIRCLECI",
        "BUILDKITE",
        "DRONE",
        "TEAMCITY_VERSION",
        "TF_BUILD", // Azure DevOps
    ];

    ci_vars.iter().any(|var| env::var(var).is_ok())
}

/// Determine if the idle spinner should be drawn
pub fn spinner_enabled() -> bool {
    stderr_is_terminal() && supports_ansi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_values() {
        assert!(!term_supports_ansi("dumb"));
        assert!(term_supports_ansi("xterm-256color"));
        if cfg!(unix) {
            assert!(!term_supports_ansi(""));
        }
    }

    #[test]
    fn test_detection_does_not_panic() {
        let _ = stderr_is_terminal();
        let _ = supports_ansi();
        let _ = spinner_enabled();
        let _ = color_disabled();
    }
}
