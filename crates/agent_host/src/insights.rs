//! One-shot helpers around the chat: song picks, sentiment, diary moods.
//!
//! Each call goes through the retry policy and degrades to a neutral result
//! instead of failing.

use crate::prompts::{diary_analysis_prompt, sentiment_prompt, song_prompt};
use providers::{RetryPolicy, TextCompletion};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use services::wellness::{DiaryEntry, DiaryMoodAnalysis};
use shared::mood::Mood;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const NEUTRAL_SENTIMENT: &str = "Neutral";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub url: String,
}

static RECOMMENDATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<recommendations>(.*?)</recommendations>").expect("valid recommendation regex")
});

/// Pull `Song by Artist` out of a reply and build a YouTube search link.
pub fn parse_recommendation(reply: &str) -> Option<Recommendation> {
    let name = RECOMMENDATION_RE.captures(reply)?.get(1)?.as_str();
    if name.trim().is_empty() {
        return None;
    }
    Some(Recommendation {
        name: name.to_string(),
        url: format!(
            "https://www.youtube.com/results?search_query={}",
            urlencoding::encode(name)
        ),
    })
}

fn diary_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "analysis": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": { "type": "STRING" },
                        "mood": { "type": "STRING" }
                    },
                    "required": ["date", "mood"]
                }
            }
        },
        "required": ["analysis"]
    })
}

#[derive(Deserialize)]
struct RawAnalysis {
    analysis: Vec<RawDayMood>,
}

#[derive(Deserialize)]
struct RawDayMood {
    date: String,
    mood: String,
}

/// Decode the schema-constrained reply. Days with a mood outside the known
/// set are dropped.
pub fn parse_diary_analysis(reply: &str) -> Option<Vec<DiaryMoodAnalysis>> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }
    let raw: RawAnalysis = match serde_json::from_str(reply) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Diary analysis reply was not valid JSON: {}", e);
            return None;
        }
    };
    Some(
        raw.analysis
            .into_iter()
            .filter_map(|day| match day.mood.parse::<Mood>() {
                Ok(mood) => Some(DiaryMoodAnalysis { date: day.date, mood }),
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", day.date, e);
                    None
                }
            })
            .collect(),
    )
}

pub struct Insights<C: TextCompletion> {
    client: C,
    retry: RetryPolicy,
}

impl<C: TextCompletion> Insights<C> {
    pub fn new(client: C, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn complete(&self, prompt: &str, schema: Option<serde_json::Value>) -> Option<String> {
        let result = self
            .retry
            .run(|| self.client.complete(prompt, schema.clone()))
            .await;
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!("Completion failed: {}", e);
                None
            }
        }
    }

    pub async fn recommend_song(&self, request: &str, exclude: &[String]) -> Option<Recommendation> {
        let reply = self.complete(&song_prompt(request, exclude), None).await?;
        let recommendation = parse_recommendation(&reply);
        if recommendation.is_none() {
            tracing::warn!("No <recommendations> tag in reply");
        }
        recommendation
    }

    pub async fn analyze_sentiment(&self, text: &str) -> String {
        match self.complete(&sentiment_prompt(text), None).await {
            Some(reply) => reply.trim().to_string(),
            None => NEUTRAL_SENTIMENT.to_string(),
        }
    }

    /// `Some(vec![])` when no entry has any text; `None` when the model call
    /// or its reply fails.
    pub async fn analyze_diary(&self, entries: &[DiaryEntry]) -> Option<Vec<DiaryMoodAnalysis>> {
        let by_date: BTreeMap<String, String> = entries
            .iter()
            .filter(|e| !e.content.trim().is_empty())
            .map(|e| (e.id.clone(), e.content.clone()))
            .collect();
        if by_date.is_empty() {
            return Some(Vec::new());
        }
        let reply = self
            .complete(&diary_analysis_prompt(&by_date), Some(diary_schema()))
            .await?;
        parse_diary_analysis(&reply)
    }
}
