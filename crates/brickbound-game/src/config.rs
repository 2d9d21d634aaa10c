//! Text settings in `==Section==` / `key : value` form.
//!
//! The host hands the parsed settings to the session; everything the game
//! needs beyond the level grids lives here: world gravity, the starting
//! level, player spawn parameters, and per-level goal/tunnel routing.
//! Validation failures are fatal and happen before any gameplay starts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::level::BLOCK_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings line: {0:?}")]
    MalformedLine(String),
    #[error("missing required section [{0}]")]
    MissingSection(String),
    #[error("missing required key {section}.{key}")]
    MissingKey { section: String, key: String },
    #[error("invalid value for {section}.{key}: {value:?}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
    #[error("unknown identity id {0:?}")]
    UnknownIdentity(String),
    #[error(transparent)]
    Engine(#[from] brickbound_engine::EngineError),
}

/// Parsed settings: section name → key → value, insertion-blind.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("==") && line.ends_with("==") && line.len() > 4 {
                let tag = line[2..line.len() - 2].to_owned();
                sections.entry(tag.clone()).or_default();
                current = Some(tag);
                continue;
            }
            if let (Some(tag), Some((key, value))) = (&current, line.split_once(" : ")) {
                sections
                    .entry(tag.clone())
                    .or_default()
                    .insert(key.trim().to_owned(), value.trim().to_owned());
                continue;
            }
            return Err(ConfigError::MalformedLine(raw.to_owned()));
        }
        Ok(Self { sections })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    fn require(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        if !self.has_section(section) {
            return Err(ConfigError::MissingSection(section.to_owned()));
        }
        self.get(section, key).ok_or_else(|| ConfigError::MissingKey {
            section: section.to_owned(),
            key: key.to_owned(),
        })
    }

    fn get_f32(&self, section: &str, key: &str, default: f32) -> Result<f32, ConfigError> {
        match self.get(section, key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                section: section.to_owned(),
                key: key.to_owned(),
                value: value.to_owned(),
            }),
        }
    }

    /// Minimum requirements: a World section naming a start level, a Player
    /// section, and a per-level section for the start level (goal routing).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let start = self.require("World", "start")?;
        if !self.has_section("Player") {
            return Err(ConfigError::MissingSection("Player".to_owned()));
        }
        if !self.has_section(start) {
            return Err(ConfigError::MissingSection(start.to_owned()));
        }
        Ok(())
    }

    // -- Typed accessors with the stock defaults ---------------------------

    pub fn start_level(&self) -> Result<&str, ConfigError> {
        self.require("World", "start")
    }

    pub fn gravity(&self) -> Result<f32, ConfigError> {
        self.get_f32("World", "gravity", 300.0)
    }

    pub fn player_name(&self) -> &str {
        self.get("Player", "character").unwrap_or("mario")
    }

    pub fn player_health(&self) -> Result<f32, ConfigError> {
        self.get_f32("Player", "health", 5.0)
    }

    pub fn player_spawn(&self) -> Result<(f32, f32), ConfigError> {
        let x = self.get_f32("Player", "x", BLOCK_SIZE)?;
        let y = self.get_f32("Player", "y", BLOCK_SIZE)?;
        Ok((x, y))
    }

    pub fn player_mass(&self) -> Result<f32, ConfigError> {
        self.get_f32("Player", "mass", 80.0)
    }

    pub fn max_velocity(&self) -> Result<f32, ConfigError> {
        self.get_f32("Player", "max_velocity", 200.0)
    }

    /// Level the goal flag routes to; "END" finishes the session.
    pub fn level_goal(&self, level: &str) -> Option<&str> {
        self.get(level, "goal")
    }

    /// Sub-level a tunnel on this level routes to.
    pub fn level_tunnel(&self, level: &str) -> Option<&str> {
        self.get(level, "tunnel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
==World==
gravity : 200
start : level1.txt

==Player==
character : luigi
x : 30
y : 30
mass : 100
health : 3
max_velocity : 150

==level1.txt==
tunnel : level2.txt
goal : END
";

    #[test]
    fn parses_sections_and_keys() {
        let s = Settings::parse(SAMPLE).unwrap();
        assert_eq!(s.get("World", "gravity"), Some("200"));
        assert_eq!(s.start_level().unwrap(), "level1.txt");
        assert_eq!(s.player_name(), "luigi");
        assert_eq!(s.level_goal("level1.txt"), Some("END"));
        assert_eq!(s.level_tunnel("level1.txt"), Some("level2.txt"));
        s.validate().unwrap();
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let s = Settings::parse(
            "==World==\nstart : lvl\n\n==Player==\nname : x\n\n==lvl==\ngoal : END\n",
        )
        .unwrap();
        assert_eq!(s.gravity().unwrap(), 300.0);
        assert_eq!(s.player_name(), "mario");
        assert_eq!(s.player_health().unwrap(), 5.0);
        assert_eq!(s.player_spawn().unwrap(), (BLOCK_SIZE, BLOCK_SIZE));
        assert_eq!(s.player_mass().unwrap(), 80.0);
        assert_eq!(s.max_velocity().unwrap(), 200.0);
    }

    #[test]
    fn missing_start_is_fatal() {
        let s = Settings::parse("==World==\ngravity : 1\n\n==Player==\n").unwrap();
        assert!(matches!(
            s.validate(),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn missing_start_section_is_fatal() {
        let s = Settings::parse("==World==\nstart : lvl\n\n==Player==\n").unwrap();
        assert!(matches!(s.validate(), Err(ConfigError::MissingSection(_))));
    }

    #[test]
    fn malformed_line_is_fatal() {
        let err = Settings::parse("==World==\nthis line has no separator\n");
        assert!(matches!(err, Err(ConfigError::MalformedLine(_))));
    }

    #[test]
    fn loads_from_a_file() {
        let path = std::env::temp_dir().join(format!("bb_config_{}", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();
        let s = Settings::load(&path).unwrap();
        assert_eq!(s.start_level().unwrap(), "level1.txt");
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            Settings::load("no_such_settings_file"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn bad_number_is_fatal() {
        let s = Settings::parse("==World==\ngravity : heavy\nstart : lvl\n\n==Player==\n\n==lvl==\n")
            .unwrap();
        assert!(matches!(s.gravity(), Err(ConfigError::InvalidValue { .. })));
    }
}
