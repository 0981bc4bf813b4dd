//! Actions the assistant can request from the host UI by embedding tags in
//! its replies.

use crate::palette::PaletteEntry;
use serde::{Deserialize, Serialize};

/// Modal panels. Only one can be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Panel {
    Diary,
    MoodTracker,
    MoodAnalytics,
    Settings,
}

impl Panel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Diary => "diary",
            Panel::MoodTracker => "mood-tracker",
            Panel::MoodAnalytics => "mood-analytics",
            Panel::Settings => "settings",
        }
    }
}

/// Floating widgets, toggled independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Widget {
    Pomodoro,
    Soundscape,
    Breathing,
    JamWithAastha,
}

impl Widget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Widget::Pomodoro => "pomodoro",
            Widget::Soundscape => "soundscape",
            Widget::Breathing => "breathing",
            Widget::JamWithAastha => "jam-with-aastha",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    OpenPanel(Panel),
    ToggleWidget(Widget),
    SetAccentColor(PaletteEntry),
    SaveFact(String),
}
