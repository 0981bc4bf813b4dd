use crate::commands::{self, Command, HELP};
use crate::console::ConsoleHost;
use agent_host::{Companion, Insights, TurnOutcome, UiHost, CONNECTION_APOLOGY};
use anyhow::Result;
use chrono::Utc;
use futures::future::AbortHandle;
use providers::{GeminiClient, RetryPolicy};
use services::wellness::{Diary, MoodLog};
use services::KeyValueStore;
use shared::agent_api::Role;
use shared::directive::{Panel, Widget};
use shared::mood::Mood;
use shared::palette::{resolve_accent, ACCENT_COLORS};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use uuid::Uuid;

/// Song suggestions: the last request and what was already suggested for it.
#[derive(Default)]
struct JamState {
    last_prompt: Option<String>,
    suggested: Vec<String>,
}

pub struct Repl {
    user_name: String,
    companion: Companion<GeminiClient, ConsoleHost>,
    insights: Insights<GeminiClient>,
    moods: MoodLog,
    diary: Diary,
    jam: JamState,
    /// Progress lines from running timers.
    notices: UnboundedReceiver<String>,
}

fn flush() {
    let _ = std::io::stdout().flush();
}

impl Repl {
    pub fn new(
        client: GeminiClient,
        retry: RetryPolicy,
        store: Arc<dyn KeyValueStore>,
        user_name: &str,
    ) -> Self {
        let (notices_tx, notices) = unbounded_channel();
        Self {
            user_name: user_name.to_string(),
            companion: Companion::new(
                client.clone(),
                retry.clone(),
                ConsoleHost::new(notices_tx),
                store.clone(),
                user_name,
            ),
            insights: Insights::new(client, retry),
            moods: MoodLog::new(store.clone()),
            diary: Diary::new(store),
            jam: JamState::default(),
            notices,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        if let Some(last) = self.companion.transcript().last() {
            println!("Aastha: {}", last.text);
        }
        println!("(type /help for commands, Ctrl-C stops a reply)");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            flush();
            let line = loop {
                tokio::select! {
                    line = lines.next_line() => break line?,
                    Some(notice) = self.notices.recv() => {
                        print!("\r{}\n> ", notice);
                        flush();
                    }
                    _ = tokio::signal::ctrl_c() => break None,
                }
            };
            let Some(line) = line else { break };
            if !self.handle(commands::parse(&line)).await? {
                break;
            }
        }
        println!("Take care, {}! 💜", self.user_name);
        Ok(())
    }

    /// Returns false when the session should end.
    async fn handle(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Empty => {}
            Command::Quit => return Ok(false),
            Command::Help => println!("{}", HELP),
            Command::Invalid(msg) => println!("{}", msg),
            Command::Chat(text) => self.chat(&text, None).await,
            Command::Reply { index, text } => {
                match self.companion.transcript().get(index - 1).map(|m| m.id) {
                    Some(id) => self.chat(&text, Some(id)).await,
                    None => println!("No message #{} (see /history)", index),
                }
            }
            Command::History => {
                for (i, msg) in self.companion.transcript().iter().enumerate() {
                    let who = match msg.role {
                        Role::User => self.user_name.as_str(),
                        Role::Assistant => "Aastha",
                    };
                    println!("{:>3}. {}: {}", i + 1, who, msg.text);
                }
            }
            Command::Facts => self.show_facts()?,
            Command::Theme(None) => self.show_theme(),
            Command::Theme(Some(name)) => match resolve_accent(&name) {
                Some(entry) => {
                    self.companion.dispatcher().theme().set_accent(entry)?;
                    println!("[theme] {}", entry.name);
                }
                None => {
                    let names: Vec<&str> = ACCENT_COLORS.iter().map(|e| e.name).collect();
                    println!("Unknown color. Try one of: {}", names.join(", "));
                }
            },
            Command::Mode => {
                let mode = self.companion.dispatcher().theme().toggle_mode();
                println!("[mode] {:?}", mode);
            }
            Command::Mood { mood, note } => {
                self.moods.log(&[mood], note.as_deref(), Utc::now())?;
                println!("Logged {} {}", mood.emoji(), mood);
            }
            Command::Moods => self.show_week()?,
            Command::Diary(None) => self.show_diary()?,
            Command::Diary(Some(text)) => {
                let entry = self.diary.write(Utc::now().date_naive(), &text, Utc::now())?;
                println!("Saved diary page for {}.", entry.id);
            }
            Command::Analyze => self.analyze_diary().await?,
            Command::Jam(arg) => self.jam(arg).await?,
            Command::Pomodoro => self.host().toggle_widget(Widget::Pomodoro),
            Command::Breathe(pattern) => {
                if let Some(pattern) = pattern {
                    self.host().set_breathing_pattern(pattern);
                }
                self.host().toggle_widget(Widget::Breathing);
            }
            Command::Sentiment(text) => {
                println!("Sentiment: {}", self.insights.analyze_sentiment(&text).await);
            }
        }
        Ok(true)
    }

    async fn chat(&mut self, text: &str, reply_to: Option<Uuid>) {
        let mut streamed = String::new();
        print!("Aastha: ");
        flush();

        let outcome = {
            let (handle, registration) = AbortHandle::new_pair();
            let send = self.companion.send(text, reply_to, Some(registration), |so_far| {
                if let Some(delta) = so_far.get(streamed.len()..) {
                    print!("{}", delta);
                    flush();
                }
                streamed.clear();
                streamed.push_str(so_far);
            });
            tokio::pin!(send);
            loop {
                tokio::select! {
                    outcome = &mut send => break outcome,
                    _ = tokio::signal::ctrl_c() => handle.abort(),
                }
            }
        };
        println!();

        match outcome {
            TurnOutcome::Ignored => {}
            TurnOutcome::Cancelled => println!("[cancelled]"),
            TurnOutcome::Failed(_) => println!("Aastha: {}", CONNECTION_APOLOGY),
            TurnOutcome::Replied { text, report } => {
                if text != streamed {
                    println!("Aastha: {}", text);
                }
                if let Some(entry) = report.accent {
                    println!("[theme] {}", entry.name);
                }
                if report.facts_added > 0 {
                    println!("[memory] {} new fact(s)", report.facts_added);
                    self.companion.replace_session(&self.user_name);
                }
                if let Some(panel) = self.host().active_panel() {
                    if let Err(e) = self.show_panel(panel) {
                        tracing::warn!("Could not show {}: {:#}", panel.as_str(), e);
                    }
                }
            }
        }
    }

    fn show_panel(&mut self, panel: Panel) -> Result<()> {
        match panel {
            Panel::Diary => self.show_diary()?,
            Panel::MoodTracker | Panel::MoodAnalytics => self.show_week()?,
            Panel::Settings => self.show_theme(),
        }
        self.host().close_panel();
        Ok(())
    }

    fn host(&mut self) -> &mut ConsoleHost {
        self.companion.dispatcher_mut().host_mut()
    }

    fn show_facts(&self) -> Result<()> {
        let facts = self.companion.dispatcher().facts().all()?;
        if facts.is_empty() {
            println!("Nothing remembered yet.");
        }
        for fact in facts {
            println!("- {}", fact);
        }
        Ok(())
    }

    fn show_theme(&self) {
        let theme = self.companion.dispatcher().theme();
        println!("Mode: {:?}", theme.mode());
        for (name, value) in theme.tokens().css_variables() {
            println!("  {}: {}", name, value);
        }
    }

    fn show_week(&self) -> Result<()> {
        for day in self.moods.weekly_summary(Utc::now().date_naive())? {
            let moods: Vec<String> = day
                .moods
                .iter()
                .map(|m| format!("{} {}", m.emoji(), m))
                .collect();
            println!("{}  {}", day.date.format("%a %b %e"), moods.join(", "));
        }
        Ok(())
    }

    fn show_diary(&self) -> Result<()> {
        match self.diary.get(Utc::now().date_naive())? {
            Some(entry) => println!("{}\n{}", entry.id, entry.content),
            None => println!("Today's page is empty. Write with /diary <text>."),
        }
        Ok(())
    }

    async fn analyze_diary(&self) -> Result<()> {
        let entries = self.diary.list()?;
        match self.insights.analyze_diary(&entries).await {
            Some(days) if days.is_empty() => println!("No diary entries to analyze yet."),
            Some(days) => {
                for day in days {
                    println!("{}  {} {}", day.date, day.mood.emoji(), day.mood);
                }
            }
            None => println!("Couldn't analyze your diary right now."),
        }
        Ok(())
    }

    async fn jam(&mut self, arg: Option<String>) -> Result<()> {
        let another = arg.as_deref().map_or(false, |a| a.eq_ignore_ascii_case("next"));
        let prompt = match (another, arg) {
            (true, _) => match &self.jam.last_prompt {
                Some(prompt) => prompt.clone(),
                None => {
                    println!("Ask for a song first.");
                    return Ok(());
                }
            },
            (false, Some(song)) => format!("Find the song \"{}\" in any language", song),
            (false, None) => match self.moods.dominant_mood()? {
                Some(mood) => mood_song_prompt(mood),
                None => {
                    println!("Log your mood first with /mood <Mood>!");
                    return Ok(());
                }
            },
        };
        if !another {
            self.jam.suggested.clear();
        }

        match self.insights.recommend_song(&prompt, &self.jam.suggested).await {
            Some(rec) => {
                println!("🎵 {}\n   {}", rec.name, rec.url);
                self.jam.suggested.push(rec.name);
            }
            None if another => println!("Couldn't find another suggestion. Try a new request!"),
            None => println!("Could not find that song. Try being more specific!"),
        }
        self.jam.last_prompt = Some(prompt);
        Ok(())
    }
}

fn mood_song_prompt(mood: Mood) -> String {
    format!("Suggest a song for someone feeling {}", mood)
}
