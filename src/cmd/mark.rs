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
use crate::db::Action;
use crate::db::Database;
use crate::error::Fallible;
use crate::types::note::WordNote;
use crate::types::timestamp::Timestamp;

pub fn mark_word(
    config: &Config,
    notebook: Option<String>,
    word: &str,
    action: Action,
) -> Fallible<()> {
    let notebook = config.notebook_name(notebook);
    let mut db = Database::new(&config.database_path())?;
    let note = db.mark(&notebook, word, action, Timestamp::now())?;
    println!("{}", describe(&notebook, word, note.as_ref()));
    Ok(())
}

fn describe(notebook: &str, word: &str, note: Option<&WordNote>) -> String {
    match note {
        Some(note) => format!(
            "{} [{notebook}]: looked up {} times, {}.",
            note.word,
            note.lookup_times,
            note.card.state.as_str().to_lowercase()
        ),
        None => format!("Deleted {} from {notebook}.", word.trim()),
    }
}
