//! Mood log and diary.

use crate::store::{load_json, save_json, KeyValueStore, KEY_DIARY, KEY_MOOD_LOG};
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::mood::Mood;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Oldest entries beyond this are dropped.
const MOOD_LOG_CAP: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Distinct moods logged on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub moods: Vec<Mood>,
}

pub struct MoodLog {
    store: Arc<dyn KeyValueStore>,
}

impl MoodLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Newest first.
    pub fn entries(&self) -> Result<Vec<MoodEntry>> {
        Ok(load_json(self.store.as_ref(), KEY_MOOD_LOG)?.unwrap_or_default())
    }

    /// Record one entry per mood, all sharing `now` and `note`.
    pub fn log(&self, moods: &[Mood], note: Option<&str>, now: DateTime<Utc>) -> Result<Vec<MoodEntry>> {
        let note = note.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        let new_entries: Vec<MoodEntry> = moods
            .iter()
            .map(|mood| MoodEntry {
                id: format!("{}-{}", now.timestamp_millis(), mood),
                mood: *mood,
                note: note.clone(),
                timestamp: now,
            })
            .collect();

        let mut all = new_entries.clone();
        all.extend(self.entries()?);
        all.truncate(MOOD_LOG_CAP);
        save_json(self.store.as_ref(), KEY_MOOD_LOG, &all)?;
        Ok(new_entries)
    }

    /// Most frequently logged mood; ties go to the most recently logged.
    pub fn dominant_mood(&self) -> Result<Option<Mood>> {
        let mut counts: Vec<(Mood, usize)> = Vec::new();
        for entry in self.entries()? {
            match counts.iter_mut().find(|(m, _)| *m == entry.mood) {
                Some((_, n)) => *n += 1,
                None => counts.push((entry.mood, 1)),
            }
        }
        let mut best: Option<(Mood, usize)> = None;
        for (mood, n) in counts {
            if best.map_or(true, |(_, top)| n > top) {
                best = Some((mood, n));
            }
        }
        Ok(best.map(|(mood, _)| mood))
    }

    /// The seven days ending at `today`, oldest first.
    pub fn weekly_summary(&self, today: NaiveDate) -> Result<Vec<DaySummary>> {
        let entries = self.entries()?;
        let summary = (0..7)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                let mut moods: Vec<Mood> = Vec::new();
                for entry in entries.iter().filter(|e| e.timestamp.date_naive() == date) {
                    if !moods.contains(&entry.mood) {
                        moods.push(entry.mood);
                    }
                }
                DaySummary { date, moods }
            })
            .collect();
        Ok(summary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// `YYYY-MM-DD`
    pub id: String,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryMoodAnalysis {
    pub date: String,
    pub mood: Mood,
}

pub fn diary_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// One entry per calendar day.
pub struct Diary {
    store: Arc<dyn KeyValueStore>,
}

impl Diary {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<BTreeMap<String, DiaryEntry>> {
        Ok(load_json(self.store.as_ref(), KEY_DIARY)?.unwrap_or_default())
    }

    /// Create or overwrite the page for `date`, keeping any mood already set.
    pub fn write(&self, date: NaiveDate, content: &str, now: DateTime<Utc>) -> Result<DiaryEntry> {
        let mut entries = self.load()?;
        let id = diary_key(date);
        let mood = entries.get(&id).and_then(|e| e.mood);
        let entry = DiaryEntry {
            id: id.clone(),
            content: content.to_string(),
            timestamp: now,
            mood,
        };
        entries.insert(id, entry.clone());
        save_json(self.store.as_ref(), KEY_DIARY, &entries)?;
        Ok(entry)
    }

    pub fn get(&self, date: NaiveDate) -> Result<Option<DiaryEntry>> {
        Ok(self.load()?.remove(&diary_key(date)))
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<DiaryEntry>> {
        Ok(self.load()?.into_values().rev().collect())
    }
}
