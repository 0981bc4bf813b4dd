//! Pomodoro and breathing timers behind the widget toggles.
//!
//! Each timer runs as its own task and reports progress as lines on a
//! channel; the REPL prints them between prompts.

use std::time::Duration;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{sleep, Instant};

type Notices = UnboundedSender<String>;

/// Work-session milestones, as a percentage of the session.
const ENCOURAGEMENTS: [(u32, &str); 3] = [
    (25, "Great start! Keep up the momentum."),
    (50, "Halfway there! You're doing great."),
    (75, "Almost there! Finish strong."),
];

fn minutes(d: Duration) -> u64 {
    (d.as_secs() / 60).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pomodoro {
    pub work: Duration,
    pub rest: Duration,
}

impl Default for Pomodoro {
    fn default() -> Self {
        Self {
            work: Duration::from_secs(25 * 60),
            rest: Duration::from_secs(5 * 60),
        }
    }
}

impl Pomodoro {
    /// Alternate work and break sessions until aborted or nobody listens.
    pub async fn run(self, out: Notices) -> Result<(), SendError<String>> {
        let mut round = 1u32;
        loop {
            out.send(format!(
                "🍅 Focus session {} started ({} min)",
                round,
                minutes(self.work)
            ))?;
            let mut elapsed = Duration::ZERO;
            for (percent, message) in ENCOURAGEMENTS {
                let mark = self.work * percent / 100;
                sleep(mark - elapsed).await;
                elapsed = mark;
                out.send(format!("🍅 {}", message))?;
            }
            sleep(self.work - elapsed).await;

            out.send(format!("🍅 Enjoy your break! ({} min)", minutes(self.rest)))?;
            sleep(self.rest).await;
            round += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BreathingPattern {
    /// 4-4-4-4
    #[default]
    Box,
    /// 4-7-8
    FourSevenEight,
}

impl BreathingPattern {
    pub fn name(&self) -> &'static str {
        match self {
            BreathingPattern::Box => "Box Breathing",
            BreathingPattern::FourSevenEight => "4-7-8 Breathing",
        }
    }

    /// Cue and length in seconds of each phase.
    pub fn phases(&self) -> &'static [(&'static str, u64)] {
        match self {
            BreathingPattern::Box => &[("Inhale...", 4), ("Hold", 4), ("Exhale...", 4), ("Hold", 4)],
            BreathingPattern::FourSevenEight => &[("Inhale...", 4), ("Hold", 7), ("Exhale...", 8)],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "box" => Some(BreathingPattern::Box),
            "478" | "4-7-8" => Some(BreathingPattern::FourSevenEight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breathing {
    pub pattern: BreathingPattern,
    pub session: Duration,
}

impl Default for Breathing {
    fn default() -> Self {
        Self {
            pattern: BreathingPattern::default(),
            session: Duration::from_secs(60),
        }
    }
}

impl Breathing {
    /// Cue each phase in turn until the session time is used up.
    pub async fn run(self, out: Notices) -> Result<(), SendError<String>> {
        out.send(format!(
            "🌬️ {} for {} min",
            self.pattern.name(),
            minutes(self.session)
        ))?;
        let deadline = Instant::now() + self.session;
        'session: loop {
            for &(cue, secs) in self.pattern.phases() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break 'session;
                }
                out.send(format!("🌬️ {} ({}s)", cue, secs))?;
                sleep(Duration::from_secs(secs).min(remaining)).await;
            }
        }
        out.send("🌬️ Breathing session complete.".to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(line) = rx.try_recv() {
            out.push(line);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_pomodoro_milestones_then_break() {
        let (tx, mut rx) = unbounded_channel();
        let pomodoro = Pomodoro {
            work: Duration::from_secs(100),
            rest: Duration::from_secs(20),
        };
        let task = tokio::spawn(pomodoro.run(tx));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(drain(&mut rx), vec!["🍅 Focus session 1 started (1 min)"]);

        sleep(Duration::from_secs(50)).await;
        assert_eq!(
            drain(&mut rx),
            vec!["🍅 Great start! Keep up the momentum.", "🍅 Halfway there! You're doing great."]
        );

        sleep(Duration::from_secs(50)).await;
        assert_eq!(
            drain(&mut rx),
            vec!["🍅 Almost there! Finish strong.", "🍅 Enjoy your break! (1 min)"]
        );

        sleep(Duration::from_secs(20)).await;
        assert_eq!(drain(&mut rx), vec!["🍅 Focus session 2 started (1 min)"]);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_box_breathing_cycles_until_session_ends() {
        let (tx, mut rx) = unbounded_channel();
        let breathing = Breathing {
            pattern: BreathingPattern::Box,
            session: Duration::from_secs(20),
        };
        breathing.run(tx).await.unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                "🌬️ Box Breathing for 1 min",
                "🌬️ Inhale... (4s)",
                "🌬️ Hold (4s)",
                "🌬️ Exhale... (4s)",
                "🌬️ Hold (4s)",
                "🌬️ Inhale... (4s)",
                "🌬️ Breathing session complete.",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_four_seven_eight_phase_lengths() {
        let (tx, mut rx) = unbounded_channel();
        let started = Instant::now();
        Breathing {
            pattern: BreathingPattern::FourSevenEight,
            session: Duration::from_secs(19),
        }
        .run(tx)
        .await
        .unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(19));
        let lines = drain(&mut rx);
        assert_eq!(&lines[1..4], ["🌬️ Inhale... (4s)", "🌬️ Hold (7s)", "🌬️ Exhale... (8s)"]);
        assert_eq!(lines.len(), 5);
    }

    #[tokio::test]
    async fn test_timer_stops_when_nobody_listens() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        assert!(Pomodoro::default().run(tx).await.is_err());
    }

    #[test]
    fn test_pattern_names() {
        assert_eq!(BreathingPattern::parse(" BOX "), Some(BreathingPattern::Box));
        assert_eq!(BreathingPattern::parse("4-7-8"), Some(BreathingPattern::FourSevenEight));
        assert_eq!(BreathingPattern::parse("square"), None);
    }
}
