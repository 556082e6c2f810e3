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

use std::fs::create_dir_all;
use std::path::Path;

use chrono::NaiveDate;
use clap::ValueEnum;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::session::SessionResult;
use crate::types::card::Card;
use crate::types::card::State;
use crate::types::note::WordNote;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;
use crate::types::word_id::WordId;

/// What marking a word does to the notebook.
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    /// Record a lookup, adding the word if it is new.
    Learning,
    /// Take back one lookup.
    Learned,
    /// Remove the word and its review history.
    Delete,
}

/// One row of the review log.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub session_id: i64,
    pub word_id: WordId,
    pub reviewed_at: Timestamp,
    pub rating: Rating,
    pub previous_state: State,
    pub stability: f64,
    pub difficulty: f64,
    pub scheduled_days: u64,
    pub due: Timestamp,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(database_path: &Path) -> Fallible<Self> {
        if let Some(parent) = database_path.parent() {
            create_dir_all(parent)?;
        }
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {}.", database_path.display());
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    /// Record a lookup of a word, or undo one, or forget the word. Returns
    /// the note as it is afterwards, or `None` if it was deleted.
    pub fn mark(
        &mut self,
        notebook: &str,
        word: &str,
        action: Action,
        now: Timestamp,
    ) -> Fallible<Option<WordNote>> {
        let word = word.trim();
        if word.is_empty() {
            return fail("word must not be empty.");
        }
        let word_id = WordId::of(word);
        log::debug!("Marking {word} ({}) as {action:?}.", word_id.short());
        let tx = self.conn.transaction()?;
        let exists: bool = tx
            .query_row(
                "select 1 from notes where notebook = ? and word_id = ?;",
                (notebook, word_id),
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        match action {
            Action::Learning => {
                if exists {
                    let sql = "update notes set lookup_times = lookup_times + 1, last_lookup_at = ? where notebook = ? and word_id = ?;";
                    tx.execute(sql, (now, notebook, word_id))?;
                } else {
                    let sql = "insert into notes (notebook, word_id, word, lookup_times, created_at, last_lookup_at) values (?, ?, ?, 1, ?, ?);";
                    tx.execute(sql, (notebook, word_id, word, now, now))?;
                    insert_card(&tx, &Card::new(word_id, notebook, now))?;
                }
            }
            Action::Learned => {
                if !exists {
                    return fail(format!("{word} is not in notebook {notebook}."));
                }
                let sql = "update notes set lookup_times = max(lookup_times - 1, 0), last_lookup_at = ? where notebook = ? and word_id = ?;";
                tx.execute(sql, (now, notebook, word_id))?;
            }
            Action::Delete => {
                if !exists {
                    return fail(format!("{word} is not in notebook {notebook}."));
                }
                let sql = "delete from reviews where notebook = ? and word_id = ?;";
                let reviews = tx.execute(sql, (notebook, word_id))?;
                let sql = "delete from notes where notebook = ? and word_id = ?;";
                tx.execute(sql, (notebook, word_id))?;
                log::debug!("Deleted {word} and {reviews} reviews from {notebook}.");
            }
        }
        tx.commit()?;
        self.get_note(notebook, word)
    }

    pub fn get_note(&self, notebook: &str, word: &str) -> Fallible<Option<WordNote>> {
        let sql = format!("{SELECT_NOTES} where n.notebook = ? and n.word_id = ?;");
        let note = self
            .conn
            .query_row(&sql, (notebook, WordId::of(word)), read_note)
            .optional()?;
        Ok(note)
    }

    /// All the notes in a notebook, most recently added first.
    pub fn list_notes(&self, notebook: &str) -> Fallible<Vec<WordNote>> {
        let sql = format!("{SELECT_NOTES} where n.notebook = ?;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut notes = stmt
            .query_map([notebook], read_note)?
            .collect::<Result<Vec<WordNote>, _>>()?;
        notes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.word.cmp(&b.word))
        });
        Ok(notes)
    }

    pub fn list_notebooks(&self) -> Fallible<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("select distinct notebook from notes order by notebook;")?;
        let notebooks = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(notebooks)
    }

    /// Save a review session: the updated cards, and one log row per rating.
    pub fn save_session(
        &mut self,
        notebook: &str,
        started_at: Timestamp,
        ended_at: Timestamp,
        result: &SessionResult,
    ) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        let session_id = insert_session(&tx, notebook, started_at, ended_at)?;
        for review in &result.reviewed {
            let card = &review.card;
            if !update_card(&tx, card)? {
                log::warn!(
                    "Card {} was removed during the session, not saving it.",
                    card.word_id().short()
                );
                continue;
            }
            let record = ReviewRecord {
                session_id,
                word_id: card.word_id(),
                reviewed_at: review.reviewed_at,
                rating: review.rating,
                previous_state: review.previous_state,
                stability: card.stability,
                difficulty: card.difficulty,
                scheduled_days: card.scheduled_days,
                due: card.due,
            };
            insert_review(&tx, notebook, &record)?;
        }
        tx.commit()?;
        log::debug!(
            "Saved session {session_id} with {} reviews.",
            result.reviewed.len()
        );
        Ok(())
    }

    /// The review log of a notebook, oldest first.
    pub fn list_reviews(&self, notebook: &str) -> Fallible<Vec<ReviewRecord>> {
        let sql = "select session_id, word_id, reviewed_at, rating, previous_state, stability, difficulty, scheduled_days, due from reviews where notebook = ? order by review_id;";
        let mut stmt = self.conn.prepare(sql)?;
        let reviews = stmt
            .query_map([notebook], |row| {
                Ok(ReviewRecord {
                    session_id: row.get(0)?,
                    word_id: row.get(1)?,
                    reviewed_at: row.get(2)?,
                    rating: row.get(3)?,
                    previous_state: row.get(4)?,
                    stability: row.get(5)?,
                    difficulty: row.get(6)?,
                    scheduled_days: row.get::<_, i64>(7)? as u64,
                    due: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<ReviewRecord>, _>>()?;
        Ok(reviews)
    }

    /// The number of reviews on the given local date.
    pub fn review_count_on(&self, notebook: &str, date: NaiveDate) -> Fallible<usize> {
        let reviews = self.list_reviews(notebook)?;
        Ok(reviews
            .iter()
            .filter(|r| r.reviewed_at.local_date() == date)
            .count())
    }

    /// The number of new words first reviewed on the given local date.
    pub fn new_cards_reviewed_on(&self, notebook: &str, date: NaiveDate) -> Fallible<usize> {
        let reviews = self.list_reviews(notebook)?;
        Ok(reviews
            .iter()
            .filter(|r| r.previous_state == State::New && r.reviewed_at.local_date() == date)
            .count())
    }
}

const SELECT_NOTES: &str = "select n.word, n.lookup_times, n.created_at, n.last_lookup_at, c.word_id, c.notebook, c.due, c.stability, c.difficulty, c.elapsed_days, c.scheduled_days, c.reps, c.lapses, c.state, c.last_review from notes n join cards c on c.notebook = n.notebook and c.word_id = n.word_id";

fn read_note(row: &Row) -> rusqlite::Result<WordNote> {
    let word_id: WordId = row.get(4)?;
    let notebook: String = row.get(5)?;
    let due: Timestamp = row.get(6)?;
    let mut card = Card::new(word_id, notebook, due);
    card.stability = row.get(7)?;
    card.difficulty = row.get(8)?;
    card.elapsed_days = row.get::<_, i64>(9)? as u64;
    card.scheduled_days = row.get::<_, i64>(10)? as u64;
    card.reps = row.get::<_, i64>(11)? as u64;
    card.lapses = row.get::<_, i64>(12)? as u64;
    card.state = row.get(13)?;
    card.last_review = row.get(14)?;
    Ok(WordNote {
        word: row.get(0)?,
        lookup_times: row.get(1)?,
        created_at: row.get(2)?,
        last_lookup_at: row.get(3)?,
        card,
    })
}

fn insert_card(tx: &Transaction, card: &Card) -> Fallible<()> {
    let sql = "insert into cards (notebook, word_id, due, stability, difficulty, elapsed_days, scheduled_days, reps, lapses, state, last_review) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            card.notebook(),
            card.word_id(),
            card.due,
            card.stability,
            card.difficulty,
            card.elapsed_days as i64,
            card.scheduled_days as i64,
            card.reps as i64,
            card.lapses as i64,
            card.state,
            card.last_review,
        ),
    )?;
    Ok(())
}

/// Returns false if the card no longer exists.
fn update_card(tx: &Transaction, card: &Card) -> Fallible<bool> {
    let sql = "update cards set due = ?, stability = ?, difficulty = ?, elapsed_days = ?, scheduled_days = ?, reps = ?, lapses = ?, state = ?, last_review = ? where notebook = ? and word_id = ?;";
    let changed = tx.execute(
        sql,
        (
            card.due,
            card.stability,
            card.difficulty,
            card.elapsed_days as i64,
            card.scheduled_days as i64,
            card.reps as i64,
            card.lapses as i64,
            card.state,
            card.last_review,
            card.notebook(),
            card.word_id(),
        ),
    )?;
    Ok(changed > 0)
}

type SessionId = i64;

fn insert_session(
    tx: &Transaction,
    notebook: &str,
    started_at: Timestamp,
    ended_at: Timestamp,
) -> Fallible<SessionId> {
    let sql = "insert into sessions (notebook, started_at, ended_at) values (?, ?, ?) returning session_id;";
    let session_id: SessionId =
        tx.query_row(sql, (notebook, started_at, ended_at), |row| row.get(0))?;
    Ok(session_id)
}

fn insert_review(tx: &Transaction, notebook: &str, review: &ReviewRecord) -> Fallible<()> {
    let sql = "insert into reviews (session_id, notebook, word_id, reviewed_at, rating, previous_state, stability, difficulty, scheduled_days, due) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            review.session_id,
            notebook,
            review.word_id,
            review.reviewed_at,
            review.rating,
            review.previous_state,
            review.stability,
            review.difficulty,
            review.scheduled_days as i64,
            review.due,
        ),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["notes"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::helper::open_tmp_database;
    use crate::scheduler::Scheduler;
    use crate::session::ReviewSession;
    use crate::session::tests::TickingClock;

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_mark_learning() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        let note = db.mark("default", " People ", Action::Learning, now)?.unwrap();
        assert_eq!(note.word, "People");
        assert_eq!(note.lookup_times, 1);
        assert_eq!(note.created_at, now);
        assert_eq!(note.card.state, State::New);
        assert_eq!(note.card.due, now);
        assert_eq!(note.card.notebook(), "default");

        let later = now.plus_minutes(30);
        let note = db.mark("default", "people", Action::Learning, later)?.unwrap();
        assert_eq!(note.lookup_times, 2);
        assert_eq!(note.created_at, now);
        assert_eq!(note.last_lookup_at, later);
        // A repeated lookup does not reset the card.
        assert_eq!(note.card.due, now);
        Ok(())
    }

    #[test]
    fn test_mark_learned() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        db.mark("default", "cheek", Action::Learning, now)?;
        let note = db.mark("default", "cheek", Action::Learned, now)?.unwrap();
        assert_eq!(note.lookup_times, 0);
        let note = db.mark("default", "cheek", Action::Learned, now)?.unwrap();
        assert_eq!(note.lookup_times, 0);
        assert!(db.mark("default", "absent", Action::Learned, now).is_err());
        Ok(())
    }

    #[test]
    fn test_mark_delete() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        db.mark("default", "cheek", Action::Learning, now)?;
        db.mark("default", "people", Action::Learning, now)?;
        assert_eq!(db.mark("default", "cheek", Action::Delete, now)?, None);
        let words: Vec<String> = db
            .list_notes("default")?
            .into_iter()
            .map(|n| n.word)
            .collect();
        assert_eq!(words, vec!["people"]);
        assert!(db.mark("default", "cheek", Action::Delete, now).is_err());
        Ok(())
    }

    #[test]
    fn test_delete_removes_review_history() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        db.mark("default", "cheek", Action::Learning, now)?;
        db.mark("default", "people", Action::Learning, now)?;
        let cards: Vec<Card> = db
            .list_notes("default")?
            .into_iter()
            .map(|n| n.card)
            .collect();
        let mut session = ReviewSession::new(Scheduler::default(), TickingClock::new(now), cards);
        session.rate(Rating::Good)?;
        session.rate(Rating::Good)?;
        db.save_session("default", now, now, &session.results())?;
        let today = result_date(&db)?;
        assert_eq!(db.new_cards_reviewed_on("default", today)?, 2);

        db.mark("default", "cheek", Action::Delete, now)?;
        let reviews = db.list_reviews("default")?;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].word_id, WordId::of("people"));
        assert_eq!(db.new_cards_reviewed_on("default", today)?, 1);

        // A word added back starts with a clean history.
        let note = db.mark("default", "cheek", Action::Learning, now)?.unwrap();
        assert_eq!(note.card.state, State::New);
        assert_eq!(note.lookup_times, 1);
        assert_eq!(db.new_cards_reviewed_on("default", today)?, 1);
        Ok(())
    }

    #[test]
    fn test_mark_empty_word() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        assert!(db.mark("default", "   ", Action::Learning, t0()).is_err());
        Ok(())
    }

    #[test]
    fn test_notebooks_are_separate() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        db.mark("gre", "cheek", Action::Learning, now)?;
        db.mark("toefl", "cheek", Action::Learning, now)?;
        db.mark("toefl", "people", Action::Learning, now)?;
        assert_eq!(db.list_notebooks()?, vec!["gre", "toefl"]);
        assert_eq!(db.list_notes("gre")?.len(), 1);
        assert_eq!(db.list_notes("toefl")?.len(), 2);
        assert!(db.list_notes("missing")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_list_notes_newest_first() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        db.mark("default", "first", Action::Learning, now)?;
        db.mark("default", "second", Action::Learning, now.plus_minutes(1))?;
        db.mark("default", "third", Action::Learning, now.plus_days(1))?;
        let words: Vec<String> = db
            .list_notes("default")?
            .into_iter()
            .map(|n| n.word)
            .collect();
        assert_eq!(words, vec!["third", "second", "first"]);
        Ok(())
    }

    #[test]
    fn test_save_session() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        db.mark("default", "cheek", Action::Learning, now)?;
        db.mark("default", "people", Action::Learning, now)?;
        let cards: Vec<Card> = db
            .list_notes("default")?
            .into_iter()
            .map(|n| n.card)
            .collect();
        let mut session = ReviewSession::new(Scheduler::default(), TickingClock::new(now), cards);
        session.rate(Rating::Easy)?;
        session.skip()?;
        let result = session.results();
        db.save_session("default", now, now.plus_minutes(5), &result)?;

        let rated = &result.reviewed[0].card;
        let notes = db.list_notes("default")?;
        let saved = notes
            .iter()
            .find(|n| n.word_id() == rated.word_id())
            .unwrap();
        assert_eq!(&saved.card, rated);
        assert_eq!(saved.card.state, State::Review);
        let untouched = notes
            .iter()
            .find(|n| n.word_id() != rated.word_id())
            .unwrap();
        assert_eq!(untouched.card.state, State::New);

        let reviews = db.list_reviews("default")?;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, Rating::Easy);
        assert_eq!(reviews[0].previous_state, State::New);
        assert_eq!(reviews[0].due, rated.due);
        Ok(())
    }

    #[test]
    fn test_review_counts() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let now = t0();
        db.mark("default", "cheek", Action::Learning, now)?;
        let cards: Vec<Card> = db
            .list_notes("default")?
            .into_iter()
            .map(|n| n.card)
            .collect();
        let mut session = ReviewSession::new(Scheduler::default(), TickingClock::new(now), cards);
        session.rate(Rating::Good)?;
        db.save_session("default", now, now, &session.results())?;

        let cards: Vec<Card> = db
            .list_notes("default")?
            .into_iter()
            .map(|n| n.card)
            .collect();
        let mut session = ReviewSession::new(Scheduler::default(), TickingClock::new(now), cards);
        session.rate(Rating::Good)?;
        db.save_session("default", now, now, &session.results())?;

        let reviewed_on = result_date(&db)?;
        assert_eq!(db.review_count_on("default", reviewed_on)?, 2);
        assert_eq!(db.new_cards_reviewed_on("default", reviewed_on)?, 1);
        let other_day = reviewed_on.succ_opt().unwrap();
        assert_eq!(db.review_count_on("default", other_day)?, 0);
        assert_eq!(db.review_count_on("other", reviewed_on)?, 0);
        Ok(())
    }

    fn result_date(db: &Database) -> Fallible<NaiveDate> {
        Ok(db.list_reviews("default")?[0].reviewed_at.local_date())
    }

    #[test]
    fn test_reopen_keeps_data() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("wordflow.db");
        {
            let mut db = Database::new(&path)?;
            db.mark("default", "cheek", Action::Learning, t0())?;
        }
        let db = Database::new(&path)?;
        assert_eq!(db.list_notes("default")?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_state_is_an_error() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        db.mark("default", "cheek", Action::Learning, t0())?;
        db.conn.execute("update cards set state = 9;", [])?;
        let err = db.list_notes("default").unwrap_err();
        assert!(err.to_string().contains("invalid card state: 9"));
        Ok(())
    }
}
