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

use crate::config::Config;
use crate::db::Database;
use crate::db::ReviewRecord;
use crate::error::Fallible;
use crate::types::note::WordNote;

pub fn export_notebook(config: &Config, notebook: Option<String>) -> Fallible<()> {
    let notebook = config.notebook_name(notebook);
    let db = Database::new(&config.database_path())?;
    let export: Export = get_export(&db, &notebook)?;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    notebook: String,
    words: Vec<WordNote>,
    reviews: Vec<ReviewRecord>,
}

fn get_export(db: &Database, notebook: &str) -> Fallible<Export> {
    Ok(Export {
        notebook: notebook.to_string(),
        words: db.list_notes(notebook)?,
        reviews: db.list_reviews(notebook)?,
    })
}
