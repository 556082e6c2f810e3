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

use serde::Serialize;

use crate::types::card::Card;
use crate::types::timestamp::Timestamp;
use crate::types::word_id::WordId;

/// A word recorded in a notebook, together with its review card.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordNote {
    pub word: String,
    /// How many times the word was looked up, minus the times it was marked
    /// as learned.
    pub lookup_times: i64,
    pub created_at: Timestamp,
    pub last_lookup_at: Timestamp,
    pub card: Card,
}

impl WordNote {
    pub fn word_id(&self) -> WordId {
        self.card.word_id()
    }
}
