use crate::ambient::{Breathing, BreathingPattern, Pomodoro};
use agent_host::UiHost;
use shared::directive::{Panel, Widget};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Terminal stand-in for the panel and widget surface.
///
/// Pomodoro and breathing run as timer tasks that report on `notices`;
/// the other widgets only track whether they are on.
pub struct ConsoleHost {
    active_panel: Option<Panel>,
    notices: UnboundedSender<String>,
    pomodoro: Pomodoro,
    breathing: Breathing,
    timers: HashMap<Widget, JoinHandle<()>>,
    switched_on: BTreeSet<&'static str>,
}

impl ConsoleHost {
    pub fn new(notices: UnboundedSender<String>) -> Self {
        Self {
            active_panel: None,
            notices,
            pomodoro: Pomodoro::default(),
            breathing: Breathing::default(),
            timers: HashMap::new(),
            switched_on: BTreeSet::new(),
        }
    }

    pub fn active_panel(&self) -> Option<Panel> {
        self.active_panel
    }

    pub fn close_panel(&mut self) {
        self.active_panel = None;
    }

    /// Used by the next breathing session.
    pub fn set_breathing_pattern(&mut self, pattern: BreathingPattern) {
        self.breathing.pattern = pattern;
    }

    /// Returns false when the widget was already running and got stopped.
    fn toggle_timer(&mut self, widget: Widget) -> bool {
        if let Some(task) = self.timers.remove(&widget) {
            if !task.is_finished() {
                task.abort();
                return false;
            }
        }
        let notices = self.notices.clone();
        let task = match widget {
            Widget::Pomodoro => {
                let pomodoro = self.pomodoro;
                tokio::spawn(async move {
                    let _ = pomodoro.run(notices).await;
                })
            }
            _ => {
                let breathing = self.breathing;
                tokio::spawn(async move {
                    let _ = breathing.run(notices).await;
                })
            }
        };
        self.timers.insert(widget, task);
        true
    }
}

impl Drop for ConsoleHost {
    fn drop(&mut self) {
        for task in self.timers.values() {
            task.abort();
        }
    }
}

impl UiHost for ConsoleHost {
    fn open_panel(&mut self, panel: Panel) {
        self.active_panel = Some(panel);
        println!("[panel] {}", panel.as_str());
    }

    fn toggle_widget(&mut self, widget: Widget) {
        let name = widget.as_str();
        let on = match widget {
            Widget::Pomodoro | Widget::Breathing => self.toggle_timer(widget),
            Widget::Soundscape | Widget::JamWithAastha => {
                !self.switched_on.remove(name) && self.switched_on.insert(name)
            }
        };
        println!("[widget] {} {}", name, if on { "on" } else { "off" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_panel_replaces_and_closes() {
        let (tx, _rx) = unbounded_channel();
        let mut host = ConsoleHost::new(tx);
        host.open_panel(Panel::Diary);
        host.open_panel(Panel::Settings);
        assert_eq!(host.active_panel(), Some(Panel::Settings));
        host.close_panel();
        assert_eq!(host.active_panel(), None);
    }

    #[tokio::test]
    async fn test_plain_widgets_toggle() {
        let (tx, _rx) = unbounded_channel();
        let mut host = ConsoleHost::new(tx);
        host.toggle_widget(Widget::Soundscape);
        assert!(host.switched_on.contains("soundscape"));
        host.toggle_widget(Widget::Soundscape);
        assert!(host.switched_on.is_empty());
        assert!(host.timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pomodoro_starts_and_stops_on_toggle() {
        let (tx, mut rx) = unbounded_channel();
        let mut host = ConsoleHost::new(tx);

        host.toggle_widget(Widget::Pomodoro);
        sleep(Duration::from_secs(7 * 60)).await;
        assert!(rx.try_recv().unwrap().contains("Focus session 1"));
        assert!(rx.try_recv().unwrap().contains("Great start!"));

        host.toggle_widget(Widget::Pomodoro);
        assert!(host.timers.is_empty());
        sleep(Duration::from_secs(60 * 60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_breathing_restarts_on_next_toggle() {
        let (tx, mut rx) = unbounded_channel();
        let mut host = ConsoleHost::new(tx);
        host.set_breathing_pattern(BreathingPattern::FourSevenEight);

        host.toggle_widget(Widget::Breathing);
        sleep(Duration::from_secs(61)).await;
        let lines: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(lines[0], "🌬️ 4-7-8 Breathing for 1 min");
        assert_eq!(lines.last().unwrap(), "🌬️ Breathing session complete.");

        // The session ended by itself, so the toggle starts a new one
        host.toggle_widget(Widget::Breathing);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.try_recv().unwrap(), "🌬️ 4-7-8 Breathing for 1 min");
    }
}
