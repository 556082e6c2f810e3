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

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

use crate::cmd::exam::exam;
use crate::cmd::export::export_notebook;
use crate::cmd::import::import_words;
use crate::cmd::list::list_words;
use crate::cmd::mark::mark_word;
use crate::cmd::notebooks::list_notebooks;
use crate::cmd::notebooks::use_notebook;
use crate::cmd::preview::preview_word;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::config::Config;
use crate::db::Action;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a word you looked up.
    Mark {
        /// The word.
        word: String,
        /// What to do with the word.
        #[arg(long, default_value_t = Action::Learning, value_enum)]
        action: Action,
        /// The notebook. Defaults to the configured one.
        #[arg(short, long)]
        notebook: Option<String>,
    },
    /// Record every word in a TSV file. The word is the first column.
    Import {
        /// The file to read.
        file: PathBuf,
        #[arg(short, long)]
        notebook: Option<String>,
    },
    /// List the words in a notebook.
    List {
        #[arg(short, long)]
        notebook: Option<String>,
    },
    /// List the notebooks.
    Notebooks,
    /// Change the default notebook.
    Use {
        /// The notebook to make the default.
        notebook: String,
    },
    /// Review the words that are due.
    Exam {
        #[arg(short, long)]
        notebook: Option<String>,
    },
    /// Show what each rating would do to a word, without saving anything.
    Preview {
        word: String,
        #[arg(short, long)]
        notebook: Option<String>,
    },
    /// Print notebook statistics.
    Stats {
        #[arg(short, long)]
        notebook: Option<String>,
        /// Output format.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Export a notebook and its review history as JSON.
    Export {
        #[arg(short, long)]
        notebook: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let config = Config::load(cli.config)?;
    match cli.command {
        Command::Mark {
            word,
            action,
            notebook,
        } => mark_word(&config, notebook, &word, action),
        Command::Import { file, notebook } => import_words(&config, notebook, &file),
        Command::List { notebook } => list_words(&config, notebook),
        Command::Notebooks => list_notebooks(&config),
        Command::Use { notebook } => use_notebook(config, notebook),
        Command::Exam { notebook } => exam(&config, notebook),
        Command::Preview { word, notebook } => preview_word(&config, notebook, &word),
        Command::Stats { notebook, format } => print_stats(&config, notebook, format),
        Command::Export { notebook } => export_notebook(&config, notebook),
    }
}
