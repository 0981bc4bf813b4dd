//! Pulls UI directives out of a finished assistant reply.
//!
//! Recognized tags are removed from the visible text. Anything that does not
//! match exactly (unclosed tags, empty color names) is left in place.

use regex::Regex;
use shared::directive::{Directive, Panel, Widget};
use shared::palette::resolve_accent;
use std::sync::LazyLock;

const SELF_CLOSING_TAGS: &[(&str, Target)] = &[
    ("<open_diary/>", Target::Panel(Panel::Diary)),
    ("<open_mood_tracker/>", Target::Panel(Panel::MoodTracker)),
    ("<open_mood_analytics/>", Target::Panel(Panel::MoodAnalytics)),
    ("<open_settings/>", Target::Panel(Panel::Settings)),
    ("<open_pomodoro/>", Target::Widget(Widget::Pomodoro)),
    ("<open_soundscape/>", Target::Widget(Widget::Soundscape)),
    ("<open_breathing/>", Target::Widget(Widget::Breathing)),
    ("<open_jam-with-aastha/>", Target::Widget(Widget::JamWithAastha)),
];

#[derive(Clone, Copy)]
enum Target {
    Panel(Panel),
    Widget(Widget),
}

impl Target {
    fn directive(self) -> Directive {
        match self {
            Target::Panel(p) => Directive::OpenPanel(p),
            Target::Widget(w) => Directive::ToggleWidget(w),
        }
    }
}

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<color>(.*?)</color>").expect("valid color regex"));

static FACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<save_fact>(.*?)</save_fact>").expect("valid fact regex"));

/// Returns the cleaned text and the directives found, in processing order:
/// panels and widgets (table order), then the color, then facts.
pub fn extract_directives(text: &str) -> (String, Vec<Directive>) {
    let mut cleaned = text.to_string();
    let mut directives = Vec::new();

    for (tag, target) in SELF_CLOSING_TAGS {
        if cleaned.contains(tag) {
            // Every copy is stripped; the action fires once.
            cleaned = cleaned.replace(tag, "");
            directives.push(target.directive());
        }
    }

    let color = COLOR_RE.captures(&cleaned).and_then(|caps| {
        let payload = caps.get(1)?.as_str().trim().to_string();
        Some((caps.get(0)?.range(), payload))
    });
    if let Some((span, payload)) = color {
        if !payload.is_empty() {
            match resolve_accent(&payload) {
                Some(entry) => directives.push(Directive::SetAccentColor(entry)),
                None => tracing::debug!("Ignoring unknown color '{}'", payload),
            }
            cleaned.replace_range(span, "");
        }
    }

    let facts: Vec<String> = FACT_RE
        .captures_iter(&cleaned)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|fact| !fact.is_empty())
        .collect();
    if FACT_RE.is_match(&cleaned) {
        cleaned = FACT_RE.replace_all(&cleaned, "").into_owned();
    }
    directives.extend(facts.into_iter().map(Directive::SaveFact));

    (cleaned.trim().to_string(), directives)
}
