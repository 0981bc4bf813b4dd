//! First-run setup and the unlock prompt.
//!
//! Input comes line by line from any `BufRead`, so the flow runs the same on
//! a terminal and in tests. Passwords are held in `Zeroizing` buffers.

use anyhow::{bail, Result};
use services::auth::{load_user_config, save_user_config, SetupForm, UserConfig, SECURITY_QUESTIONS};
use services::KeyValueStore;
use std::io::{BufRead, Write};
use zeroize::Zeroizing;

/// Typed at the password prompt to start recovery.
const FORGOT: &str = "forgot";

pub struct Prompter<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = Zeroizing::new(String::new());
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed");
        }
        let trimmed = Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string());
        Ok(trimmed)
    }

    fn choose_question(&mut self) -> Result<&'static str> {
        self.say("Pick a security question:")?;
        for (i, q) in SECURITY_QUESTIONS.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, q))?;
        }
        loop {
            let pick = self.ask("Question number: ")?;
            match pick.trim().parse::<usize>() {
                Ok(n) if (1..=SECURITY_QUESTIONS.len()).contains(&n) => return Ok(SECURITY_QUESTIONS[n - 1]),
                _ => self.say(&format!("Enter a number from 1 to {}.", SECURITY_QUESTIONS.len()))?,
            }
        }
    }
}

/// Ask for everything a new account needs, repeating until it validates.
pub fn run_setup<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<UserConfig> {
    p.say("Welcome! Let's set things up.")?;
    loop {
        let name = p.ask("Your name: ")?;
        let password = p.ask("Password (6+ characters): ")?;
        let confirm = p.ask("Confirm password: ")?;
        let question = p.choose_question()?;
        let answer = p.ask("Answer: ")?;

        let form = SetupForm {
            user_name: &name,
            password: &password,
            confirm_password: &confirm,
            security_question: question,
            security_answer: &answer,
        };
        match UserConfig::from_setup(&form) {
            Ok(config) => return Ok(config),
            Err(e) => p.say(&e.to_string())?,
        }
    }
}

fn recover<R: BufRead, W: Write>(p: &mut Prompter<R, W>, config: &mut UserConfig) -> Result<bool> {
    p.say(&config.security_question.clone())?;
    let answer = p.ask("Answer: ")?;
    if !config.verify_security_answer(&answer) {
        p.say("That answer doesn't match.")?;
        return Ok(false);
    }
    loop {
        let new_password = p.ask("New password: ")?;
        match config.reset_password(&new_password) {
            Ok(()) => {
                p.say("Password reset.")?;
                return Ok(true);
            }
            Err(e) => p.say(&e.to_string())?,
        }
    }
}

/// Load the account, creating it on first run, and gate on the password.
pub fn authenticate<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    store: &dyn KeyValueStore,
) -> Result<UserConfig> {
    let mut config = match load_user_config(store)? {
        Some(config) if config.onboarding_complete => config,
        _ => {
            let config = run_setup(p)?;
            save_user_config(store, &config)?;
            tracing::info!("Created account for {}", config.user_name);
            return Ok(config);
        }
    };

    p.say(&format!("Welcome back, {}!", config.user_name))?;
    loop {
        let password = p.ask(&format!("Password (or '{}'): ", FORGOT))?;
        // A real password always wins over the recovery keyword
        if config.verify_password(&password) {
            return Ok(config);
        }
        if password.trim().eq_ignore_ascii_case(FORGOT) {
            if recover(p, &mut config)? {
                save_user_config(store, &config)?;
            }
            continue;
        }
        p.say("Incorrect password. Please try again.")?;
    }
}
