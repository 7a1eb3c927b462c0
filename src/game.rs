// Game identifiers
//
// Three shipped binaries are supported. Everything that differs between them
// is dispatched on the major version, never on string suffixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EventError;

/// Major version of the game binary. Each has its own native encoding of
/// board events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameVersion {
    Mp1,
    Mp2,
    Mp3,
}

impl GameVersion {
    pub fn number(self) -> u8 {
        match self {
            GameVersion::Mp1 => 1,
            GameVersion::Mp2 => 2,
            GameVersion::Mp3 => 3,
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MP{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Game {
    #[serde(rename = "MP1_USA")]
    Mp1Usa,
    #[serde(rename = "MP2_USA")]
    Mp2Usa,
    #[serde(rename = "MP3_USA")]
    Mp3Usa,
}

pub const ALL_GAMES: [Game; 3] = [Game::Mp1Usa, Game::Mp2Usa, Game::Mp3Usa];

impl Game {
    pub fn major(self) -> GameVersion {
        match self {
            Game::Mp1Usa => GameVersion::Mp1,
            Game::Mp2Usa => GameVersion::Mp2,
            Game::Mp3Usa => GameVersion::Mp3,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Game::Mp1Usa => "MP1_USA",
            Game::Mp2Usa => "MP2_USA",
            Game::Mp3Usa => "MP3_USA",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Game {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_GAMES
            .iter()
            .copied()
            .find(|game| game.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EventError::metadata(format!("Unrecognized game '{}'", wanted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn parses_ids_case_insensitively() {
        assert_eq!("mp2_usa".parse::<Game>().unwrap(), Game::Mp2Usa);
        assert_eq!(" MP3_USA ".parse::<Game>().unwrap(), Game::Mp3Usa);
        assert!("MP4_USA".parse::<Game>().is_err());
    }

    #[test]
    fn major_versions_are_distinct() {
        assert_eq!(Game::Mp1Usa.major().number(), 1);
        assert_eq!(Game::Mp3Usa.major().to_string(), "MP3");
    }
}
