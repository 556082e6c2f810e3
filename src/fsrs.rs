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

//! The FSRS-4.5 memory model: forgetting curve, initial values, and the
//! stability and difficulty update rules.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::rating::Rating;

/// Retrievability: probability of recall, in [0, 1].
pub type R = f64;
/// Stability: days until retrievability drops to 90%.
pub type S = f64;
/// Difficulty: in [1, 10].
pub type D = f64;
/// Time in days.
pub type T = f64;

pub type Stability = S;
pub type Difficulty = D;

pub type Weights = [f64; 17];

pub const DEFAULT_WEIGHTS: Weights = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61,
];

/// Weights of the short-term stability formula (FSRS-5 `w17`, `w18`).
pub type ShortTermWeights = [f64; 2];

pub const DEFAULT_SHORT_TERM_WEIGHTS: ShortTermWeights = [0.5425, 0.0912];

const DECAY: f64 = -0.5;
const FACTOR: f64 = 19.0 / 81.0;

pub const MIN_DIFFICULTY: D = 1.0;
pub const MAX_DIFFICULTY: D = 10.0;
pub const MIN_STABILITY: S = 0.1;

/// The longest interval a configuration may ask for: a thousand years.
pub const MAXIMUM_INTERVAL_LIMIT: u64 = 365_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// The recall probability intervals are chosen to hit.
    pub request_retention: f64,
    /// Lower bound of a day-scale interval.
    pub minimum_interval: u64,
    /// Upper bound of a day-scale interval.
    pub maximum_interval: u64,
    pub weights: Weights,
    /// Weights of the short-term formula used by (re)learning steps.
    pub short_term: ShortTermWeights,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            request_retention: 0.9,
            minimum_interval: 1,
            maximum_interval: 36500,
            weights: DEFAULT_WEIGHTS,
            short_term: DEFAULT_SHORT_TERM_WEIGHTS,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Fallible<()> {
        if !(self.request_retention > 0.0 && self.request_retention < 1.0) {
            return fail("fsrs.request_retention must be between 0 and 1.");
        }
        if self.minimum_interval < 1 {
            return fail("fsrs.minimum_interval must be at least one day.");
        }
        if self.minimum_interval > self.maximum_interval {
            return fail("fsrs.minimum_interval must not exceed fsrs.maximum_interval.");
        }
        if self.maximum_interval > MAXIMUM_INTERVAL_LIMIT {
            return fail(format!(
                "fsrs.maximum_interval must not exceed {MAXIMUM_INTERVAL_LIMIT} days."
            ));
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            return fail("fsrs.weights must be finite numbers.");
        }
        if self.short_term.iter().any(|w| !w.is_finite()) {
            return fail("fsrs.short_term must be finite numbers.");
        }
        Ok(())
    }
}

fn grade(rating: Rating) -> f64 {
    rating.value() as f64
}

/// Power-law forgetting curve.
pub fn retrievability(t: T, s: S) -> R {
    if s <= 0.0 {
        return 0.0;
    }
    (1.0 + FACTOR * t / s).powf(DECAY)
}

/// The raw interval, in days, after which retrievability falls to `r_d`.
pub fn interval(r_d: R, s: S) -> T {
    (s / FACTOR) * (r_d.powf(1.0 / DECAY) - 1.0)
}

pub fn initial_stability(w: &Weights, rating: Rating) -> S {
    let s = match rating {
        Rating::Again => w[0],
        Rating::Hard => w[1],
        Rating::Good => w[2],
        Rating::Easy => w[3],
    };
    s.max(MIN_STABILITY)
}

pub fn initial_difficulty(w: &Weights, rating: Rating) -> D {
    clamp_d(w[4] - w[5] * (grade(rating) - 3.0))
}

/// Difficulty after a review. Reverts towards the initial difficulty of a
/// `Good` first review.
pub fn new_difficulty(w: &Weights, d: D, rating: Rating) -> D {
    let next = d - w[6] * (grade(rating) - 3.0);
    clamp_d(w[7] * w[4] + (1.0 - w[7]) * next)
}

/// Stability after a review, given the retrievability at review time.
pub fn new_stability(w: &Weights, d: D, s: S, r: R, rating: Rating) -> S {
    if rating == Rating::Again {
        s_fail(w, d, s, r)
    } else {
        s_success(w, d, s, r, rating)
    }
}

fn s_success(w: &Weights, d: D, s: S, r: R, rating: Rating) -> S {
    let t_d = 11.0 - d;
    let t_s = s.powf(-w[9]);
    let t_r = f64::exp(w[10] * (1.0 - r)) - 1.0;
    let h = if rating == Rating::Hard { w[15] } else { 1.0 };
    let b = if rating == Rating::Easy { w[16] } else { 1.0 };
    let c = f64::exp(w[8]);
    s * (1.0 + t_d * t_s * t_r * h * b * c)
}

/// Post-lapse stability. Always below the stability before the lapse.
fn s_fail(w: &Weights, d: D, s: S, r: R) -> S {
    let d_f = d.powf(-w[12]);
    let s_f = (s + 1.0).powf(w[13]) - 1.0;
    let r_f = f64::exp(w[14] * (1.0 - r));
    let [w17, w18] = DEFAULT_SHORT_TERM_WEIGHTS;
    let ceiling = s / f64::exp(w17 * w18);
    f64::min(w[11] * d_f * s_f * r_f, ceiling)
}

/// Stability after a same-day learning step.
pub fn short_term_stability(sw: &ShortTermWeights, s: S, rating: Rating) -> S {
    (s * f64::exp(sw[0] * (grade(rating) - 3.0 + sw[1]))).max(MIN_STABILITY)
}

fn clamp_d(d: D) -> D {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_retrievability_at_zero() {
        assert!(approx(retrievability(0.0, 3.0), 1.0));
    }

    #[test]
    fn test_retrievability_at_stability() {
        assert!(approx(retrievability(10.0, 10.0), 0.9));
        assert!(retrievability(20.0, 10.0) < 0.9);
    }

    #[test]
    fn test_retrievability_power_law() {
        // Exponential decay would give 0.9^3 = 0.729 here.
        let r = retrievability(30.0, 10.0);
        assert!(approx(r, (1.0 + FACTOR * 3.0).powf(-0.5)));
        assert!(r > 0.75);
    }

    #[test]
    fn test_interval_at_target_retention() {
        assert!(approx(interval(0.9, 5.0), 5.0));
        assert!(interval(0.8, 5.0) > 5.0);
    }

    #[test]
    fn test_initial_values() {
        let w = &DEFAULT_WEIGHTS;
        assert!(approx(initial_stability(w, Rating::Again), 0.4));
        assert!(approx(initial_stability(w, Rating::Easy), 5.8));
        assert!(approx(initial_difficulty(w, Rating::Again), 6.81));
        assert!(approx(initial_difficulty(w, Rating::Hard), 5.87));
        assert!(approx(initial_difficulty(w, Rating::Good), 4.93));
        assert!(approx(initial_difficulty(w, Rating::Easy), 3.99));
    }

    #[test]
    fn test_new_difficulty() {
        let w = &DEFAULT_WEIGHTS;
        assert!(approx(new_difficulty(w, 5.0, Rating::Again), 6.7021));
        assert!(approx(new_difficulty(w, 5.0, Rating::Good), 4.9993));
        assert!(approx(new_difficulty(w, 5.0, Rating::Easy), 4.1479));
    }

    #[test]
    fn test_difficulty_clamped() {
        let w = &DEFAULT_WEIGHTS;
        let mut d = initial_difficulty(w, Rating::Again);
        for _ in 0..100 {
            d = new_difficulty(w, d, Rating::Again);
        }
        assert!(d <= 10.0);
        let mut d = initial_difficulty(w, Rating::Easy);
        for _ in 0..100 {
            d = new_difficulty(w, d, Rating::Easy);
        }
        assert!(d >= 1.0);
    }

    #[test]
    fn test_new_stability() {
        let w = &DEFAULT_WEIGHTS;
        let r = retrievability(10.0, 10.0);
        assert!((new_stability(w, 5.0, 10.0, r, Rating::Good) - 29.008576880106).abs() < 1e-6);
        assert!((new_stability(w, 5.0, 10.0, r, Rating::Hard) - 15.512487295231).abs() < 1e-6);
        assert!((new_stability(w, 5.0, 10.0, r, Rating::Easy) - 59.612385657079).abs() < 1e-6);
        assert!((new_stability(w, 5.0, 10.0, r, Rating::Again) - 2.874332436210).abs() < 1e-6);
    }

    #[test]
    fn test_lapse_never_grows_stability() {
        let w = &DEFAULT_WEIGHTS;
        for s in [0.1, 0.5, 1.0, 3.0, 100.0] {
            assert!(new_stability(w, 1.0, s, 0.2, Rating::Again) < s);
        }
    }

    #[test]
    fn test_short_term_stability() {
        let sw = &DEFAULT_SHORT_TERM_WEIGHTS;
        let s = 2.4;
        assert!(short_term_stability(sw, s, Rating::Good) > s);
        assert!(short_term_stability(sw, s, Rating::Again) < s);
    }

    #[test]
    fn test_validate() {
        assert!(Parameters::default().validate().is_ok());
        let params = Parameters {
            request_retention: 1.0,
            ..Parameters::default()
        };
        assert!(params.validate().is_err());
        let params = Parameters {
            minimum_interval: 10,
            maximum_interval: 5,
            ..Parameters::default()
        };
        assert!(params.validate().is_err());
        let mut params = Parameters::default();
        params.weights[3] = f64::NAN;
        assert!(params.validate().is_err());
        let mut params = Parameters::default();
        params.short_term[1] = f64::INFINITY;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_maximum_interval_limit() {
        let params = Parameters {
            maximum_interval: MAXIMUM_INTERVAL_LIMIT,
            ..Parameters::default()
        };
        assert!(params.validate().is_ok());
        for maximum_interval in [MAXIMUM_INTERVAL_LIMIT + 1, 1_000_000_000, u64::MAX] {
            let params = Parameters {
                maximum_interval,
                ..Parameters::default()
            };
            assert!(params.validate().is_err(), "{maximum_interval}");
        }
    }
}
