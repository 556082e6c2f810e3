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

use tempfile::TempDir;
use tempfile::tempdir;

use crate::db::Database;
use crate::error::Fallible;

/// Open a fresh database in a temporary directory. The directory is removed
/// when the returned handle is dropped.
pub fn open_tmp_database() -> Fallible<(TempDir, Database)> {
    let dir = tempdir()?;
    let db = Database::new(&dir.path().join("wordflow.db"))?;
    Ok((dir, db))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_tmp_database() -> Fallible<()> {
        let (dir, db) = open_tmp_database()?;
        assert!(dir.path().join("wordflow.db").exists());
        assert!(db.list_notebooks()?.is_empty());
        Ok(())
    }
}
