use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The fixed board presets.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    /// Number of rows on the board.
    pub const fn rows(self) -> usize {
        match self {
            Self::Beginner => 8,
            Self::Intermediate | Self::Expert => 16,
        }
    }

    /// Number of columns on the board.
    pub const fn columns(self) -> usize {
        match self {
            Self::Beginner => 8,
            Self::Intermediate => 16,
            Self::Expert => 31,
        }
    }

    pub const fn mines(self) -> usize {
        match self {
            Self::Beginner => 10,
            Self::Intermediate => 40,
            Self::Expert => 99,
        }
    }

    pub const fn tiles(self) -> usize {
        self.rows() * self.columns()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Self::Beginner),
            2 => Ok(Self::Intermediate),
            3 => Ok(Self::Expert),
            other => Err(Error::InvalidDifficulty(other.to_string())),
        }
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(level) = trimmed.parse::<u8>() {
            return Self::try_from(level);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidDifficulty(s.to_owned()))
    }
}
