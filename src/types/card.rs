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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::Difficulty;
use crate::fsrs::Stability;
use crate::types::timestamp::Timestamp;
use crate::types::word_id::WordId;

/// The learning state of a card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum State {
    /// Never reviewed.
    New,
    /// Reviewed, but still going through the short learning steps.
    Learning,
    /// Graduated to day-scale intervals.
    Review,
    /// Forgotten while in review, going through the learning steps again.
    Relearning,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::New => "New",
            State::Learning => "Learning",
            State::Review => "Review",
            State::Relearning => "Relearning",
        }
    }

    /// The integer tag used in the database.
    pub fn tag(self) -> i64 {
        match self {
            State::New => 0,
            State::Learning => 1,
            State::Review => 2,
            State::Relearning => 3,
        }
    }
}

impl TryFrom<i64> for State {
    type Error = ErrorReport;

    fn try_from(value: i64) -> Fallible<Self> {
        match value {
            0 => Ok(State::New),
            1 => Ok(State::Learning),
            2 => Ok(State::Review),
            3 => Ok(State::Relearning),
            _ => fail(format!("invalid card state: {value}")),
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for State {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.tag()))
    }
}

impl FromSql for State {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let value: i64 = FromSql::column_result(value)?;
        State::try_from(value).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The spaced repetition state of one word in one notebook.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Card {
    word_id: WordId,
    notebook: String,
    /// When the card next becomes eligible for review.
    pub due: Timestamp,
    /// Days until recall probability decays to the target retention.
    pub stability: Stability,
    /// Intrinsic difficulty of the word, in [1, 10] once reviewed.
    pub difficulty: Difficulty,
    /// Whole days between the previous review and the latest one.
    pub elapsed_days: u64,
    /// The interval, in days, chosen at the latest review.
    pub scheduled_days: u64,
    /// The number of reviews not rated `Again`.
    pub reps: u64,
    /// The number of times the card was forgotten while in review.
    pub lapses: u64,
    pub state: State,
    pub last_review: Option<Timestamp>,
}

impl Card {
    /// Create a card that has never been reviewed and is due immediately.
    pub fn new(word_id: WordId, notebook: impl Into<String>, now: Timestamp) -> Self {
        Self {
            word_id,
            notebook: notebook.into(),
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            state: State::New,
            last_review: None,
        }
    }

    pub fn word_id(&self) -> WordId {
        self.word_id
    }

    pub fn notebook(&self) -> &str {
        &self.notebook
    }

    pub fn is_new(&self) -> bool {
        self.state == State::New
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.due <= now
    }
}
