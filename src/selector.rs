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

use std::cmp::Ordering;
use std::cmp::Reverse;

use crate::types::note::WordNote;
use crate::types::timestamp::Timestamp;

/// The words due for review at `now`, in session order.
///
/// A word is due if its card has never been reviewed or its due date has
/// passed. New words come first. The rest are sorted by due date, most
/// overdue first. Ties go to the most recently added word, then to the word
/// id, so the order is total.
pub fn due_words(notes: &[WordNote], now: Timestamp) -> Vec<WordNote> {
    let mut due: Vec<WordNote> = notes
        .iter()
        .filter(|note| note.card.is_new() || note.card.is_due(now))
        .cloned()
        .collect();
    due.sort_by(session_order);
    due
}

fn session_order(a: &WordNote, b: &WordNote) -> Ordering {
    let key = |note: &WordNote| {
        let scheduled = !note.card.is_new();
        let due = if scheduled { Some(note.card.due) } else { None };
        (scheduled, due, Reverse(note.created_at), note.word_id())
    };
    key(a).cmp(&key(b))
}

/// Restrict an ordered list of due words to what fits in one session: at
/// most `new_cards_left` new words, and at most `max_reviews` words overall.
pub fn plan_session(
    ordered: Vec<WordNote>,
    max_reviews: usize,
    new_cards_left: usize,
) -> Vec<WordNote> {
    let mut new_cards = 0;
    ordered
        .into_iter()
        .filter(|note| {
            if note.card.is_new() {
                new_cards += 1;
                new_cards <= new_cards_left
            } else {
                true
            }
        })
        .take(max_reviews)
        .collect()
}
