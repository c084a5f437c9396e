//! Executable availability checks.
//!
//! A command is invocable when its first token is either a path to an
//! existing file the current user may execute, or a bare name that resolves
//! on `PATH`. Both checks go through the `which` crate, which performs the
//! permission test with `access(X_OK)` on Unix.
//!
//! Bare names missing from `PATH` fall back to an executable installed next
//! to the running binary, which is where `cargo install` and `cargo build`
//! place the companion `cmtl-probe`.

use std::path::{Path, PathBuf};

/// Returns `true` if the first token of `argv` can be invoked.
///
/// Empty, absent, or blank locators degrade to `false`; this never panics.
pub fn is_available(argv: Option<&[String]>) -> bool {
    let Some(locator) = argv.and_then(|argv| argv.first()) else {
        return false;
    };
    locator_available(locator)
}

/// Availability of a single executable locator.
pub fn locator_available(locator: &str) -> bool {
    let locator = locator.trim();
    if locator.is_empty() {
        return false;
    }

    if has_path_separator(locator) {
        let path = Path::new(locator);
        return path.is_file() && which::which(path).is_ok();
    }

    which::which(locator).is_ok()
}

/// Path of a bare `locator` found next to the running binary but not on `PATH`.
///
/// Returns `None` for path locators, for names `PATH` already resolves, and
/// when no executable of that name sits beside the current executable.
pub fn bundled_fallback(locator: &str) -> Option<PathBuf> {
    let locator = locator.trim();
    if locator.is_empty() || has_path_separator(locator) || which::which(locator).is_ok() {
        return None;
    }
    let exe = std::env::current_exe().ok()?;
    sibling_executable(exe.parent()?, locator)
}

/// Executable named `name` inside `dir`, with the platform suffix applied.
pub fn sibling_executable(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
    (candidate.is_file() && which::which(&candidate).is_ok()).then_some(candidate)
}

fn has_path_separator(locator: &str) -> bool {
    locator.contains('/') || (cfg!(windows) && locator.contains('\\'))
}
