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

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Outcomes;
use crate::scheduler::Scheduler;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

pub fn preview_word(config: &Config, notebook: Option<String>, word: &str) -> Fallible<()> {
    let notebook = config.notebook_name(notebook);
    let db = Database::new(&config.database_path())?;
    let Some(note) = db.get_note(&notebook, word)? else {
        return fail(format!("{} is not in notebook {notebook}.", word.trim()));
    };
    let scheduler = Scheduler::new(config.fsrs.clone());
    let now = Timestamp::now();
    println!("{} ({})", note.word, note.card.state);
    print!("{}", format_outcomes(&scheduler.repeat(&note.card, now), now));
    Ok(())
}

/// One line per rating: the interval it gives and the resulting memory state.
pub fn format_outcomes(outcomes: &Outcomes, now: Timestamp) -> String {
    let mut out = String::new();
    for (rating, card) in outcomes.iter() {
        out.push_str(&format!(
            "  {} {:<5} {:>6}  {:<10}  S={:.2} D={:.2}\n",
            rating.value(),
            rating.as_str(),
            format_interval(card, now),
            card.state.as_str(),
            card.stability,
            card.difficulty,
        ));
    }
    out
}

/// Days for scheduled cards, minutes for learning steps.
fn format_interval(card: &Card, now: Timestamp) -> String {
    if card.scheduled_days > 0 {
        format!("{}d", card.scheduled_days)
    } else {
        let reviewed_at = card.last_review.unwrap_or(now);
        format!("{}m", card.due.since(reviewed_at).num_minutes())
    }
}
