//! Slash commands accepted at the chat prompt.

use crate::ambient::BreathingPattern;
use shared::mood::Mood;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the companion.
    Chat(String),
    Reply { index: usize, text: String },
    Facts,
    /// Show the theme, or switch accent when a color is given.
    Theme(Option<String>),
    Mode,
    Mood { mood: Mood, note: Option<String> },
    Moods,
    /// Show today's page, or replace it with the given text.
    Diary(Option<String>),
    Analyze,
    /// `None` picks from the mood log; `Some("next")` asks for another.
    Jam(Option<String>),
    Sentiment(String),
    Pomodoro,
    /// Toggle breathing guidance, optionally switching pattern first.
    Breathe(Option<BreathingPattern>),
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  /facts                 what I remember about you
  /theme [color]         show theme tokens or switch accent
  /mode                  toggle dark/light
  /mood <Mood> [note]    log a mood (Happy, Calm, Energetic, Sad, Anxious, Stressed, Anger)
  /moods                 this week's moods
  /diary [text]          show or write today's page
  /analyze               moods from your diary
  /jam [song|next]       a song for your mood, a specific song, or another pick
  /sentiment <text>      classify some text
  /pomodoro              start or stop a 25/5 focus timer
  /breathe [box|4-7-8]   start or stop breathing guidance
  /history               numbered transcript
  /reply <n> <text>      reply to message n
  /quit";

fn rest(arg: &str) -> Option<String> {
    let arg = arg.trim();
    (!arg.is_empty()).then(|| arg.to_string())
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(body) = line.strip_prefix('/') else {
        return Command::Chat(line.to_string());
    };
    let (name, arg) = body.split_once(char::is_whitespace).unwrap_or((body, ""));

    match name.to_lowercase().as_str() {
        "facts" => Command::Facts,
        "theme" => Command::Theme(rest(arg)),
        "mode" => Command::Mode,
        "moods" => Command::Moods,
        "mood" => {
            let arg = arg.trim();
            let (mood, note) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
            match mood.parse::<Mood>() {
                Ok(mood) => Command::Mood { mood, note: rest(note) },
                Err(e) => Command::Invalid(e),
            }
        }
        "diary" => Command::Diary(rest(arg)),
        "analyze" => Command::Analyze,
        "jam" => Command::Jam(rest(arg)),
        "sentiment" => match rest(arg) {
            Some(text) => Command::Sentiment(text),
            None => Command::Invalid("usage: /sentiment <text>".into()),
        },
        "reply" => {
            let arg = arg.trim();
            let (index, text) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
            match (index.parse::<usize>(), rest(text)) {
                (Ok(index), Some(text)) if index > 0 => Command::Reply { index, text },
                _ => Command::Invalid("usage: /reply <n> <text>".into()),
            }
        }
        "pomodoro" => Command::Pomodoro,
        "breathe" => match rest(arg) {
            None => Command::Breathe(None),
            Some(name) => match BreathingPattern::parse(&name) {
                Some(pattern) => Command::Breathe(Some(pattern)),
                None => Command::Invalid("usage: /breathe [box|4-7-8]".into()),
            },
        },
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command: /{}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(parse("  hi there "), Command::Chat("hi there".into()));
        assert_eq!(parse("   "), Command::Empty);
    }

    #[test]
    fn test_mood_with_and_without_note() {
        assert_eq!(
            parse("/mood calm  after yoga"),
            Command::Mood {
                mood: Mood::Calm,
                note: Some("after yoga".into())
            }
        );
        assert_eq!(parse("/mood Sad"), Command::Mood { mood: Mood::Sad, note: None });
        assert!(matches!(parse("/mood meh"), Command::Invalid(_)));
    }

    #[test]
    fn test_reply_needs_index_and_text() {
        assert_eq!(
            parse("/reply 2 that's so true"),
            Command::Reply {
                index: 2,
                text: "that's so true".into()
            }
        );
        assert!(matches!(parse("/reply 0 hi"), Command::Invalid(_)));
        assert!(matches!(parse("/reply 2"), Command::Invalid(_)));
        assert!(matches!(parse("/reply x hi"), Command::Invalid(_)));
    }

    #[test]
    fn test_optional_arguments() {
        assert_eq!(parse("/theme"), Command::Theme(None));
        assert_eq!(parse("/theme sky blue"), Command::Theme(Some("sky blue".into())));
        assert_eq!(parse("/diary"), Command::Diary(None));
        assert_eq!(parse("/JAM next"), Command::Jam(Some("next".into())));
        assert!(matches!(parse("/sentiment"), Command::Invalid(_)));
        assert!(matches!(parse("/dance"), Command::Invalid(_)));
        assert_eq!(parse("/pomodoro"), Command::Pomodoro);
        assert_eq!(parse("/breathe"), Command::Breathe(None));
        assert_eq!(
            parse("/breathe 478"),
            Command::Breathe(Some(BreathingPattern::FourSevenEight))
        );
        assert!(matches!(parse("/breathe square"), Command::Invalid(_)));
        assert_eq!(parse("/quit"), Command::Quit);
    }
}
