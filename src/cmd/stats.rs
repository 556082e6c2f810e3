// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::selector::due_words;
use crate::types::card::State;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(config: &Config, notebook: Option<String>, format: StatsFormat) -> Fallible<()> {
    let notebook = config.notebook_name(notebook);
    let db = Database::new(&config.database_path())?;
    let stats = get_stats(&db, &notebook, Timestamp::now())?;
    match format {
        StatsFormat::Text => {
            println!("Notebook:        {}", stats.notebook);
            println!("Words:           {}", stats.word_count);
            println!("  new:           {}", stats.new_count);
            println!("  learning:      {}", stats.learning_count);
            println!("  review:        {}", stats.review_count);
            println!("  relearning:    {}", stats.relearning_count);
            println!("Due now:         {}", stats.due_count);
            println!("Reviews today:   {}", stats.today_review_count);
        }
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    notebook: String,
    word_count: usize,
    new_count: usize,
    learning_count: usize,
    review_count: usize,
    relearning_count: usize,
    due_count: usize,
    today_review_count: usize,
}

fn get_stats(db: &Database, notebook: &str, now: Timestamp) -> Fallible<Stats> {
    let notes = db.list_notes(notebook)?;
    let count = |state: State| notes.iter().filter(|n| n.card.state == state).count();
    Ok(Stats {
        notebook: notebook.to_string(),
        word_count: notes.len(),
        new_count: count(State::New),
        learning_count: count(State::Learning),
        review_count: count(State::Review),
        relearning_count: count(State::Relearning),
        due_count: due_words(&notes, now).len(),
        today_review_count: db.review_count_on(notebook, now.local_date())?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::db::Action;
    use crate::helper::open_tmp_database;
    use crate::scheduler::Scheduler;
    use crate::session::ReviewSession;
    use crate::session::tests::TickingClock;
    use crate::types::card::Card;
    use crate::types::rating::Rating;

    #[test]
    fn test_get_stats() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let t0 = Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        for word in ["cheek", "people", "wrist"] {
            db.mark("default", word, Action::Learning, t0)?;
        }
        let cards: Vec<Card> = db
            .list_notes("default")?
            .into_iter()
            .map(|n| n.card)
            .collect();
        let mut session = ReviewSession::new(Scheduler::default(), TickingClock::new(t0), cards);
        session.rate(Rating::Easy)?;
        session.rate(Rating::Again)?;
        db.save_session("default", t0, t0, &session.results())?;

        let stats = get_stats(&db, "default", t0.plus_minutes(30))?;
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.new_count, 1);
        assert_eq!(stats.learning_count, 1);
        assert_eq!(stats.review_count, 1);
        assert_eq!(stats.relearning_count, 0);
        // The new word and the learning step are due, the review is not.
        assert_eq!(stats.due_count, 2);
        assert_eq!(stats.today_review_count, 2);
        Ok(())
    }

    #[test]
    fn test_stats_json() -> Fallible<()> {
        let (_dir, db) = open_tmp_database()?;
        let now = Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        let stats = get_stats(&db, "empty", now)?;
        let json = serde_json::to_value(&stats)?;
        assert_eq!(json["notebook"], "empty");
        assert_eq!(json["wordCount"], 0);
        assert_eq!(json["todayReviewCount"], 0);
        Ok(())
    }
}
