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

use std::fs::read_to_string;
use std::path::Path;

use crate::config::Config;
use crate::db::Action;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

/// Mark every word listed in a TSV file as looked up.
pub fn import_words(config: &Config, notebook: Option<String>, file: &Path) -> Fallible<()> {
    let notebook = config.notebook_name(notebook);
    let content = read_to_string(file)?;
    let words = read_words_tsv(&content);
    if words.is_empty() {
        return fail(format!("no words found in {}.", file.display()));
    }
    let mut db = Database::new(&config.database_path())?;
    let imported = import_into(&mut db, &notebook, &words, Timestamp::now());
    println!("Imported {imported}/{} words into {notebook}.", words.len());
    Ok(())
}

/// The first column of every non-blank line.
fn read_words_tsv(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.split('\t').next())
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns how many words were recorded. A word that fails is reported and
/// skipped.
fn import_into(db: &mut Database, notebook: &str, words: &[String], now: Timestamp) -> usize {
    let mut imported = 0;
    for word in words {
        match db.mark(notebook, word, Action::Learning, now) {
            Ok(_) => imported += 1,
            Err(e) => eprintln!("Failed to import {word}: {e}"),
        }
    }
    log::debug!("Imported {imported} of {} words into {notebook}.", words.len());
    imported
}
