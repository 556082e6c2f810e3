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

use chrono::Duration;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Outcomes;
use crate::scheduler::Scheduler;
use crate::types::card::Card;
use crate::types::card::State;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Where a session is. Rating a card schedules it and moves on in one step,
/// so a scored card is never observable as a phase of its own.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Showing the card at this position.
    Presenting(usize),
    /// Every card was rated or skipped.
    Complete,
}

/// One rating given during a session.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewedCard {
    /// The card after the review.
    pub card: Card,
    pub rating: Rating,
    pub reviewed_at: Timestamp,
    /// The state the card was in before the review.
    pub previous_state: State,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionResult {
    /// Rated cards, in the order they were rated.
    pub reviewed: Vec<ReviewedCard>,
    pub completed: usize,
    pub skipped: usize,
    pub duration: Duration,
}

/// Walks the learner through an ordered list of cards, one at a time.
pub struct ReviewSession<C: Clock = SystemClock> {
    scheduler: Scheduler,
    clock: C,
    cards: Vec<Card>,
    cursor: usize,
    reviewed: Vec<ReviewedCard>,
    skipped: usize,
    started_at: Timestamp,
}

impl<C: Clock> ReviewSession<C> {
    pub fn new(scheduler: Scheduler, clock: C, cards: Vec<Card>) -> Self {
        let started_at = clock.now();
        Self {
            scheduler,
            clock,
            cards,
            cursor: 0,
            reviewed: Vec::new(),
            skipped: 0,
            started_at,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.cursor < self.cards.len() {
            Phase::Presenting(self.cursor)
        } else {
            Phase::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == Phase::Complete
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.cursor)
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// What each rating would do to the current card.
    pub fn preview(&self) -> Option<Outcomes> {
        let card = self.current()?;
        Some(self.scheduler.repeat(card, self.clock.now()))
    }

    /// Rate the current card and move on to the next one.
    pub fn rate(&mut self, rating: Rating) -> Fallible<()> {
        let Phase::Presenting(index) = self.phase() else {
            return fail("review session is already complete.");
        };
        let now = self.clock.now();
        let card = &mut self.cards[index];
        let previous_state = card.state;
        *card = self.scheduler.next(card, now, rating);
        log::debug!(
            "{} {} S={:.2}d D={:.2} due={}",
            card.word_id().short(),
            rating,
            card.stability,
            card.difficulty,
            card.due.to_rfc3339(),
        );
        self.reviewed.push(ReviewedCard {
            card: card.clone(),
            rating,
            reviewed_at: now,
            previous_state,
        });
        self.cursor += 1;
        Ok(())
    }

    /// Move on to the next card without rating the current one.
    pub fn skip(&mut self) -> Fallible<()> {
        if self.is_complete() {
            return fail("review session is already complete.");
        }
        self.skipped += 1;
        self.cursor += 1;
        Ok(())
    }

    pub fn results(&self) -> SessionResult {
        SessionResult {
            reviewed: self.reviewed.clone(),
            completed: self.reviewed.len(),
            skipped: self.skipped,
            duration: self.clock.now().since(self.started_at),
        }
    }

    /// The session's cards, including the updates made by ratings.
    #[cfg(test)]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
