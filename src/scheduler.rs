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

use crate::fsrs::Difficulty;
use crate::fsrs::MAX_DIFFICULTY;
use crate::fsrs::MIN_DIFFICULTY;
use crate::fsrs::MIN_STABILITY;
use crate::fsrs::Parameters;
use crate::fsrs::R;
use crate::fsrs::Stability;
use crate::fsrs::initial_difficulty;
use crate::fsrs::initial_stability;
use crate::fsrs::interval;
use crate::fsrs::new_difficulty;
use crate::fsrs::new_stability;
use crate::fsrs::retrievability;
use crate::fsrs::short_term_stability;
use crate::types::card::Card;
use crate::types::card::State;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// Learning steps of a new card, in minutes, for `Again`, `Hard`, `Good`.
const NEW_STEPS: [i64; 3] = [1, 5, 10];

/// The step after failing a (re)learning step, in minutes.
const LEARNING_STEP: i64 = 5;

/// The step after a lapse, in minutes.
const RELEARNING_STEP: i64 = 5;

/// The four cards a review could produce, one per rating.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcomes {
    again: Card,
    hard: Card,
    good: Card,
    easy: Card,
}

impl Outcomes {
    pub fn get(&self, rating: Rating) -> &Card {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    pub fn into_card(self, rating: Rating) -> Card {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }

    /// The outcomes in rating order.
    pub fn iter(&self) -> impl Iterator<Item = (Rating, &Card)> {
        Rating::ALL.into_iter().map(|rating| (rating, self.get(rating)))
    }
}

enum Step {
    Minutes(i64),
    Days(u64),
}

struct Transition {
    state: State,
    stability: Stability,
    difficulty: Difficulty,
    step: Step,
}

/// Computes the next memory state of a card. Holds only its parameters, so
/// one instance can be shared freely across threads.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    params: Parameters,
}

impl Scheduler {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    /// What the card would become under each rating. The card itself is not
    /// modified.
    pub fn repeat(&self, card: &Card, now: Timestamp) -> Outcomes {
        let elapsed_days = match (card.state, card.last_review) {
            (State::New, _) | (_, None) => 0,
            (_, Some(last_review)) => now.whole_days_since(last_review),
        };
        let [again, hard, good, easy] = match card.state {
            State::New => self.first_review(),
            State::Learning | State::Relearning => self.learning_step(card),
            State::Review => self.review(card, elapsed_days),
        };
        let apply = |rating: Rating, t: Transition| -> Card {
            let mut next = card.clone();
            next.elapsed_days = elapsed_days;
            next.last_review = Some(now);
            next.state = t.state;
            next.stability = t.stability;
            next.difficulty = t.difficulty;
            match t.step {
                Step::Minutes(minutes) => {
                    next.scheduled_days = 0;
                    next.due = now.plus_minutes(minutes);
                }
                Step::Days(days) => {
                    next.scheduled_days = days;
                    next.due = now.plus_days(days);
                }
            }
            if rating != Rating::Again {
                next.reps += 1;
            } else if card.state == State::Review {
                next.lapses += 1;
            }
            next
        };
        Outcomes {
            again: apply(Rating::Again, again),
            hard: apply(Rating::Hard, hard),
            good: apply(Rating::Good, good),
            easy: apply(Rating::Easy, easy),
        }
    }

    /// The card after a review with the given rating.
    pub fn next(&self, card: &Card, now: Timestamp, rating: Rating) -> Card {
        self.repeat(card, now).into_card(rating)
    }

    /// The current probability of recalling the card, or `None` if it has
    /// never been reviewed.
    pub fn retrievability(&self, card: &Card, now: Timestamp) -> Option<R> {
        if card.state == State::New {
            return None;
        }
        let last_review = card.last_review?;
        let t = now.whole_days_since(last_review) as f64;
        Some(retrievability(t, card.stability))
    }

    fn first_review(&self) -> [Transition; 4] {
        let w = &self.params.weights;
        let learning = |rating: Rating, minutes: i64| Transition {
            state: State::Learning,
            stability: initial_stability(w, rating),
            difficulty: initial_difficulty(w, rating),
            step: Step::Minutes(minutes),
        };
        let easy_stability = initial_stability(w, Rating::Easy);
        [
            learning(Rating::Again, NEW_STEPS[0]),
            learning(Rating::Hard, NEW_STEPS[1]),
            learning(Rating::Good, NEW_STEPS[2]),
            Transition {
                state: State::Review,
                stability: easy_stability,
                difficulty: initial_difficulty(w, Rating::Easy),
                step: Step::Days(self.next_interval(easy_stability)),
            },
        ]
    }

    fn learning_step(&self, card: &Card) -> [Transition; 4] {
        let w = &self.params.weights;
        let sw = &self.params.short_term;
        let memory = |rating: Rating| -> (Stability, Difficulty) {
            let s = short_term_stability(sw, last_stability(card), rating);
            let d = new_difficulty(w, last_difficulty(card), rating);
            (s, d)
        };
        let (again_s, again_d) = memory(Rating::Again);
        let (hard_s, hard_d) = memory(Rating::Hard);
        let (good_s, good_d) = memory(Rating::Good);
        let (easy_s, easy_d) = memory(Rating::Easy);
        let [hard_interval, good_interval, easy_interval] =
            self.ordered_intervals(hard_s, good_s, easy_s);
        let graduate = |stability, difficulty, days| Transition {
            state: State::Review,
            stability,
            difficulty,
            step: Step::Days(days),
        };
        [
            Transition {
                state: card.state,
                stability: again_s,
                difficulty: again_d,
                step: Step::Minutes(LEARNING_STEP),
            },
            graduate(hard_s, hard_d, hard_interval),
            graduate(good_s, good_d, good_interval),
            graduate(easy_s, easy_d, easy_interval),
        ]
    }

    fn review(&self, card: &Card, elapsed_days: u64) -> [Transition; 4] {
        let w = &self.params.weights;
        let s = last_stability(card);
        let d = last_difficulty(card);
        let r = retrievability(elapsed_days as f64, s);
        let memory =
            |rating: Rating| (new_stability(w, d, s, r, rating), new_difficulty(w, d, rating));
        let (again_s, again_d) = memory(Rating::Again);
        let (hard_s, hard_d) = memory(Rating::Hard);
        let (good_s, good_d) = memory(Rating::Good);
        let (easy_s, easy_d) = memory(Rating::Easy);

        let [hard_interval, good_interval, easy_interval] =
            self.ordered_intervals(hard_s, good_s, easy_s);

        let review = |stability, difficulty, days| Transition {
            state: State::Review,
            stability,
            difficulty,
            step: Step::Days(days),
        };
        [
            Transition {
                state: State::Relearning,
                stability: again_s,
                difficulty: again_d,
                step: Step::Minutes(RELEARNING_STEP),
            },
            review(hard_s, hard_d, hard_interval),
            review(good_s, good_d, good_interval),
            review(easy_s, easy_d, easy_interval),
        ]
    }

    /// Bounded intervals for `Hard`, `Good` and `Easy`. Better ratings never
    /// get shorter intervals, and `Easy` is always past `Good`.
    fn ordered_intervals(
        &self,
        hard_s: Stability,
        good_s: Stability,
        easy_s: Stability,
    ) -> [u64; 3] {
        let hard = self.next_interval(hard_s);
        let good = self.next_interval(good_s);
        let hard = u64::min(hard, good);
        let good = u64::max(good, hard.saturating_add(1));
        let easy = u64::max(self.next_interval(easy_s), good.saturating_add(1));
        [self.bound(hard), self.bound(good), self.bound(easy)]
    }

    /// The interval, in whole days, for the given stability.
    fn next_interval(&self, s: Stability) -> u64 {
        let days = interval(self.params.request_retention, s).round();
        let days = days
            .max(self.params.minimum_interval as f64)
            .min(self.params.maximum_interval as f64);
        days as u64
    }

    /// Unlike `clamp`, never panics on parameters that skipped validation.
    fn bound(&self, days: u64) -> u64 {
        days.max(self.params.minimum_interval)
            .min(self.params.maximum_interval)
    }
}

fn last_stability(card: &Card) -> Stability {
    card.stability.max(MIN_STABILITY)
}

fn last_difficulty(card: &Card) -> Difficulty {
    card.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}
