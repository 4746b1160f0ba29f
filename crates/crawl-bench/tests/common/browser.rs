//! Chrome availability helpers for browser crawler tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Browser tests are skipped when `SKIP_BROWSER_TESTS` is set
pub fn should_skip() -> bool {
    std::env::var("SKIP_BROWSER_TESTS").is_ok()
}

#[macro_export]
macro_rules! skip_if_no_chrome {
    () => {
        if browser::should_skip() {
            eprintln!("Skipping test: SKIP_BROWSER_TESTS is set");
            return;
        }
    };
}

/// Explicit `CHROME_PATH`, else the newest Chrome for Testing in the
/// Puppeteer cache, else `None` for chromiumoxide's own detection
pub fn chrome_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CHROME_PATH").map(PathBuf::from) {
        return Some(path);
    }

    let home = std::env::var("HOME").ok()?;
    let cache = Path::new(&home).join(".cache/puppeteer/chrome");
    let mut versions: Vec<PathBuf> = std::fs::read_dir(cache)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    versions.sort_by(|a, b| b.cmp(a));

    versions.into_iter().find_map(|dir| {
        [
            "chrome-linux64/chrome",
            "chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
            "chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
        ]
        .iter()
        .map(|rel| dir.join(rel))
        .find(|p| p.exists())
    })
}

/// Whether a browser error means Chrome could not be started at all
pub fn is_launch_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["could not auto detect", "no such file", "websocket", "launch"]
        .iter()
        .any(|needle| message.contains(needle))
}
