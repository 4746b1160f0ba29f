//! Named benchmark presets
//!
//! A scenario fixes the crawl budget (pages, depth, iterations) so runs
//! against different sites stay comparable. The target URL always comes from
//! the resolved configuration.

use crate::config::{BenchmarkConfig, ConfigOverrides};
use crate::error::{BenchmarkError, Result};

/// A named crawl budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub max_pages: u32,
    pub max_depth: u32,
    pub iterations: u32,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "quick",
        description: "Smoke test: a handful of pages, one iteration",
        max_pages: 5,
        max_depth: 1,
        iterations: 1,
    },
    Scenario {
        name: "standard",
        description: "Typical small site crawl",
        max_pages: 20,
        max_depth: 2,
        iterations: 3,
    },
    Scenario {
        name: "deep",
        description: "Follow links several levels down",
        max_pages: 50,
        max_depth: 4,
        iterations: 3,
    },
    Scenario {
        name: "wide",
        description: "Many pages linked from the seed page",
        max_pages: 100,
        max_depth: 1,
        iterations: 3,
    },
    Scenario {
        name: "stress",
        description: "Large crawl repeated for stable averages",
        max_pages: 200,
        max_depth: 3,
        iterations: 5,
    },
];

impl Scenario {
    /// Look up a preset by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::InvalidConfig`] listing the known names when
    /// no preset matches.
    pub fn find(name: &str) -> Result<&'static Scenario> {
        let wanted = name.trim();
        SCENARIOS
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<_> = SCENARIOS.iter().map(|s| s.name).collect();
                BenchmarkError::InvalidConfig(format!(
                    "unknown scenario '{}', expected one of: {}",
                    wanted,
                    known.join(", ")
                ))
            })
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: None,
            max_pages: Some(self.max_pages),
            max_depth: Some(self.max_depth),
            iterations: Some(self.iterations),
            timeout_ms: None,
        }
    }

    pub fn apply(&self, config: &mut BenchmarkConfig) {
        self.overrides().apply(config);
    }
}

/// One line per preset, for `--list-scenarios`
pub fn describe_all() -> String {
    let width = SCENARIOS.iter().map(|s| s.name.len()).max().unwrap_or(0);
    SCENARIOS
        .iter()
        .map(|s| {
            format!(
                "{:<width$}  pages={:<4} depth={:<2} iterations={:<2} {}\n",
                s.name,
                s.max_pages,
                s.max_depth,
                s.iterations,
                s.description,
                width = width
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        let scenario = Scenario::find("Deep").unwrap();
        assert_eq!(scenario.name, "deep");
        assert_eq!(scenario.max_depth, 4);
    }

    #[test]
    fn test_unknown_scenario_lists_known_names() {
        let err = Scenario::find("huge").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("huge"));
        assert!(message.contains("quick"));
        assert!(message.contains("stress"));
    }

    #[test]
    fn test_apply_keeps_url_and_timeout() {
        let mut config = BenchmarkConfig {
            url: "https://docs.rs".to_string(),
            timeout_ms: 5_000,
            ..BenchmarkConfig::default()
        };
        Scenario::find("quick").unwrap().apply(&mut config);

        assert_eq!(config.url, "https://docs.rs");
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.iterations, 1);
    }

    #[test]
    fn test_all_presets_are_valid() {
        for scenario in SCENARIOS {
            let mut config = BenchmarkConfig::default();
            scenario.apply(&mut config);
            assert!(config.validate().is_ok(), "{} is invalid", scenario.name);
        }
    }

    #[test]
    fn test_describe_all_has_one_line_per_preset() {
        let listing = describe_all();
        assert_eq!(listing.lines().count(), SCENARIOS.len());
        assert!(listing.contains("standard"));
    }
}
