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

pub fn list_notebooks(config: &Config) -> Fallible<()> {
    let db = Database::new(&config.database_path())?;
    let names = notebook_names(db.list_notebooks()?, &config.notebook.default);
    for name in names {
        let marker = if name == config.notebook.default {
            "*"
        } else {
            " "
        };
        println!("{marker} {name}");
    }
    Ok(())
}

/// The notebooks in the database, plus the default one even if it is empty.
fn notebook_names(mut names: Vec<String>, default: &str) -> Vec<String> {
    if !names.iter().any(|name| name == default) {
        names.push(default.to_string());
        names.sort();
    }
    names
}

pub fn use_notebook(mut config: Config, notebook: String) -> Fallible<()> {
    let notebook = notebook.trim().to_string();
    if notebook.is_empty() {
        return fail("notebook name must not be empty.");
    }
    config.notebook.default = notebook;
    config.save()?;
    println!(
        "Default notebook is now {} ({}).",
        config.notebook.default,
        config.path().display()
    );
    Ok(())
}
