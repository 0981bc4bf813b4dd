use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Calm,
    Energetic,
    Sad,
    Anxious,
    Stressed,
    Anger,
}

impl Mood {
    pub fn all() -> [Mood; 7] {
        [
            Mood::Happy,
            Mood::Calm,
            Mood::Energetic,
            Mood::Sad,
            Mood::Anxious,
            Mood::Stressed,
            Mood::Anger,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Calm => "Calm",
            Mood::Energetic => "Energetic",
            Mood::Sad => "Sad",
            Mood::Anxious => "Anxious",
            Mood::Stressed => "Stressed",
            Mood::Anger => "Anger",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😄",
            Mood::Calm => "😌",
            Mood::Energetic => "⚡",
            Mood::Sad => "😢",
            Mood::Anxious => "😟",
            Mood::Stressed => "😫",
            Mood::Anger => "😠",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mood::all()
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown mood: {}", wanted))
    }
}
