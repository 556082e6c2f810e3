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
use crate::scheduler::Scheduler;
use crate::types::note::WordNote;
use crate::types::timestamp::Timestamp;

pub fn list_words(config: &Config, notebook: Option<String>) -> Fallible<()> {
    let notebook = config.notebook_name(notebook);
    let db = Database::new(&config.database_path())?;
    let notes = db.list_notes(&notebook)?;
    if notes.is_empty() {
        println!("No words in {notebook}.");
        return Ok(());
    }
    let scheduler = Scheduler::new(config.fsrs.clone());
    print!("{}", render(&notes, &scheduler, Timestamp::now()));
    Ok(())
}

fn render(notes: &[WordNote], scheduler: &Scheduler, now: Timestamp) -> String {
    let width = notes
        .iter()
        .map(|note| note.word.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let mut out = format!(
        "{:<width$}  {:>7}  {:<10}  {:<16}  {:>6}\n",
        "WORD", "LOOKUPS", "STATE", "DUE", "RECALL"
    );
    for note in notes {
        let recall = match scheduler.retrievability(&note.card, now) {
            Some(r) => format!("{:.0}%", r * 100.0),
            None => "-".to_string(),
        };
        out.push_str(&format!(
            "{:<width$}  {:>7}  {:<10}  {:<16}  {:>6}\n",
            note.word,
            note.lookup_times,
            note.card.state.as_str(),
            note.card.due.to_string(),
            recall,
        ));
    }
    out
}
