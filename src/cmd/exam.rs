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

use std::io::BufRead;
use std::io::Write;

use chrono::Duration;

use crate::cmd::preview::format_outcomes;
use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::scheduler::Scheduler;
use crate::selector::due_words;
use crate::selector::plan_session;
use crate::session::Clock;
use crate::session::Phase;
use crate::session::ReviewSession;
use crate::session::SessionResult;
use crate::session::SystemClock;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

pub fn exam(config: &Config, notebook: Option<String>) -> Fallible<()> {
    let notebook = config.notebook_name(notebook);
    let mut db = Database::new(&config.database_path())?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_exam(
        &mut db,
        config,
        &notebook,
        SystemClock,
        stdin.lock(),
        stdout.lock(),
    )?;
    Ok(())
}

/// Run an interactive review session over the due words of a notebook, and
/// save it. Returns `None` if nothing was due.
pub fn run_exam<C: Clock, R: BufRead, W: Write>(
    db: &mut Database,
    config: &Config,
    notebook: &str,
    clock: C,
    mut input: R,
    mut output: W,
) -> Fallible<Option<SessionResult>> {
    let now = clock.now();
    let notes = db.list_notes(notebook)?;
    let new_cards_left = config
        .notebook
        .new_cards_per_day
        .saturating_sub(db.new_cards_reviewed_on(notebook, now.local_date())?);
    let planned = plan_session(
        due_words(&notes, now),
        config.notebook.max_reviews_per_session,
        new_cards_left,
    );
    if planned.is_empty() {
        writeln!(output, "Nothing to review in {notebook}.")?;
        return Ok(None);
    }
    log::debug!(
        "{} of {} words planned for review in {notebook}.",
        planned.len(),
        notes.len()
    );

    let words: Vec<String> = planned.iter().map(|note| note.word.clone()).collect();
    let cards: Vec<Card> = planned.into_iter().map(|note| note.card).collect();
    let mut session = ReviewSession::new(Scheduler::new(config.fsrs.clone()), clock, cards);

    while let Phase::Presenting(index) = session.phase() {
        writeln!(output, "[{}/{}] {}", index + 1, session.total(), words[index])?;
        if let Some(outcomes) = session.preview() {
            write!(output, "{}", format_outcomes(&outcomes, now))?;
        }
        write!(output, "Rating (1-4), s to skip, q to quit: ")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "q" => break,
            "s" => session.skip()?,
            choice => match choice.parse::<i64>().map(Rating::try_from) {
                Ok(Ok(rating)) => session.rate(rating)?,
                _ => writeln!(output, "{}", input_help())?,
            },
        }
    }

    let result = session.results();
    let started_at = session.started_at();
    let ended_at = Timestamp::new(started_at.into_inner() + result.duration);
    if !result.reviewed.is_empty() {
        db.save_session(notebook, started_at, ended_at, &result)?;
    }
    writeln!(
        output,
        "Reviewed {}, skipped {}, in {}.",
        result.completed,
        result.skipped,
        format_duration(result.duration)
    )?;
    if let Some(rate) = success_rate(&result) {
        writeln!(output, "Success rate: {rate:.1}%")?;
    }
    Ok(Some(result))
}

/// The share of presented words that were rated rather than skipped.
fn success_rate(result: &SessionResult) -> Option<f64> {
    if result.completed == 0 {
        return None;
    }
    let presented = result.completed + result.skipped;
    Some(result.completed as f64 / presented as f64 * 100.0)
}

fn input_help() -> String {
    let ratings: Vec<String> = Rating::ALL
        .iter()
        .map(|rating| format!("{} = {}", rating.value(), rating.description()))
        .collect();
    format!("Enter {}, s = skip, q = quit.", ratings.join(", "))
}

fn format_duration(duration: Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    format!("{}m{:02}s", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::db::Action;
    use crate::helper::open_tmp_database;
    use crate::session::tests::TickingClock;
    use crate::types::card::State;

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap())
    }

    fn exam_with(
        db: &mut Database,
        config: &Config,
        input: &str,
    ) -> Fallible<(Option<SessionResult>, String)> {
        let mut output: Vec<u8> = Vec::new();
        let result = run_exam(
            db,
            config,
            "default",
            TickingClock::new(t0().plus_minutes(60)),
            Cursor::new(input.to_string()),
            &mut output,
        )?;
        Ok((result, String::from_utf8_lossy(&output).into_owned()))
    }

    fn state_of(db: &Database, word: &str) -> Fallible<State> {
        Ok(db.get_note("default", word)?.map(|n| n.card.state).unwrap_or(State::New))
    }

    #[test]
    fn test_nothing_due() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        let (result, output) = exam_with(&mut db, &Config::default(), "")?;
        assert_eq!(result, None);
        assert_eq!(output, "Nothing to review in default.\n");
        Ok(())
    }

    #[test]
    fn test_rate_and_save() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        db.mark("default", "alpha", Action::Learning, t0())?;
        db.mark("default", "beta", Action::Learning, t0().plus_minutes(1))?;
        let (result, output) = exam_with(&mut db, &Config::default(), "3\n4\n")?;
        let result = result.unwrap();
        assert_eq!(result.completed, 2);
        assert_eq!(result.skipped, 0);
        // Newest word first.
        assert!(output.contains("[1/2] beta"));
        assert!(output.contains("[2/2] alpha"));
        assert!(output.contains("Reviewed 2, skipped 0"));
        assert!(output.contains("Success rate: 100.0%"));
        assert_eq!(state_of(&db, "beta")?, State::Learning);
        assert_eq!(state_of(&db, "alpha")?, State::Review);
        assert_eq!(db.list_reviews("default")?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_skip_invalid_and_quit() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        for word in ["alpha", "beta", "gamma"] {
            db.mark("default", word, Action::Learning, t0())?;
        }
        let (result, output) = exam_with(&mut db, &Config::default(), "s\n7\nx\n1\nq\n")?;
        let result = result.unwrap();
        assert_eq!(result.skipped, 1);
        assert_eq!(result.completed, 1);
        assert_eq!(output.matches("Enter 1 = Complete failure").count(), 2);
        assert!(!output.contains("[3/3]"));
        assert!(output.contains("Success rate: 50.0%"));
        let reviews = db.list_reviews("default")?;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, Rating::Again);
        Ok(())
    }

    #[test]
    fn test_end_of_input_quits() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        db.mark("default", "alpha", Action::Learning, t0())?;
        let (result, output) = exam_with(&mut db, &Config::default(), "")?;
        let result = result.unwrap();
        assert_eq!(result.completed, 0);
        assert!(!output.contains("Success rate"));
        assert!(db.list_reviews("default")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_new_card_limit() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        for word in ["alpha", "beta", "gamma"] {
            db.mark("default", word, Action::Learning, t0())?;
        }
        let mut config = Config::default();
        config.notebook.new_cards_per_day = 2;
        let (result, _) = exam_with(&mut db, &config, "4\n4\n")?;
        assert_eq!(result.unwrap().completed, 2);
        // Both new words were used up today.
        let (result, output) = exam_with(&mut db, &config, "")?;
        assert_eq!(result, None);
        assert!(output.starts_with("Nothing to review"));
        Ok(())
    }

    #[test]
    fn test_max_reviews_per_session() -> Fallible<()> {
        let (_dir, mut db) = open_tmp_database()?;
        for word in ["alpha", "beta", "gamma"] {
            db.mark("default", word, Action::Learning, t0())?;
        }
        let mut config = Config::default();
        config.notebook.max_reviews_per_session = 1;
        let (result, output) = exam_with(&mut db, &config, "3\n")?;
        assert_eq!(result.unwrap().completed, 1);
        assert!(output.contains("[1/1]"));
        Ok(())
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(0)), "0m00s");
        assert_eq!(format_duration(Duration::seconds(125)), "2m05s");
    }
}
