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

use std::fs::create_dir_all;
use std::fs::read_to_string;
use std::fs::rename;
use std::ffi::OsString;
use std::fs::write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::Parameters;

const CONFIG_FILENAME: &str = "config.toml";
const DATABASE_FILENAME: &str = "wordflow.db";

const NOTEBOOKS_DIRNAME: &str = "notebooks";

/// The directory holding the configuration file: `$WORDFLOW_HOME`, or
/// `wordflow` under the platform configuration directory.
pub fn config_dir() -> Fallible<PathBuf> {
    resolve_config_dir(std::env::var_os("WORDFLOW_HOME"), dirs::config_dir())
}

fn resolve_config_dir(home: Option<OsString>, system: Option<PathBuf>) -> Fallible<PathBuf> {
    match (home, system) {
        (Some(home), _) if !home.is_empty() => Ok(PathBuf::from(home)),
        (_, Some(system)) => Ok(system.join("wordflow")),
        _ => fail("cannot find a configuration directory, set WORDFLOW_HOME."),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookSettings {
    /// The notebook commands act on when none is given.
    pub default: String,
    /// The directory holding the notebook database. Defaults to `notebooks`
    /// next to the configuration file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basepath: Option<PathBuf>,
    pub max_reviews_per_session: usize,
    pub new_cards_per_day: usize,
}

impl Default for NotebookSettings {
    fn default() -> Self {
        Self {
            default: "default".to_string(),
            basepath: None,
            max_reviews_per_session: 50,
            new_cards_per_day: 20,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub notebook: NotebookSettings,
    pub fsrs: Parameters,
    /// Where the configuration was loaded from.
    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Load the configuration at `path`, or the defaults if there is no file
    /// there.
    pub fn load(path: Option<PathBuf>) -> Fallible<Self> {
        let path = match path {
            Some(path) => path,
            None => config_dir()?.join(CONFIG_FILENAME),
        };
        let mut config: Config = if path.exists() {
            log::debug!("Loading configuration from {}.", path.display());
            let content = read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            log::debug!("No configuration at {}, using defaults.", path.display());
            Config::default()
        };
        config.path = path;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.notebook.default.trim().is_empty() {
            return fail("notebook.default is required.");
        }
        if let Some(basepath) = &self.notebook.basepath {
            if basepath.as_os_str().is_empty() {
                return fail("notebook.basepath must not be empty.");
            }
        }
        if self.notebook.max_reviews_per_session == 0 {
            return fail("notebook.max_reviews_per_session must be positive.");
        }
        self.fsrs.validate()
    }

    /// Write the configuration back to where it was loaded from.
    pub fn save(&self) -> Fallible<()> {
        self.validate()?;
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        let tmp = self.path.with_extension("toml.tmp");
        write(&tmp, content)?;
        rename(&tmp, &self.path)?;
        log::debug!("Configuration saved to {}.", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database_path(&self) -> PathBuf {
        let basepath = match &self.notebook.basepath {
            Some(basepath) => basepath.clone(),
            None => self
                .path
                .parent()
                .unwrap_or(Path::new(""))
                .join(NOTEBOOKS_DIRNAME),
        };
        basepath.join(DATABASE_FILENAME)
    }

    /// The notebook to use: the one given on the command line, or the
    /// default.
    pub fn notebook_name(&self, notebook: Option<String>) -> String {
        notebook.unwrap_or_else(|| self.notebook.default.clone())
    }
}
