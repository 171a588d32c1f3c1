//! Concurrency controllers: decide how many scraper tasks should be running
//! at once, either a constant the operator picked or one nudged up and down
//! by a throughput regression fit over a trailing window of samples.

use enum_dispatch::enum_dispatch;
use log::info;
use std::collections::VecDeque;
use tokio::time::Instant;

#[enum_dispatch]
pub trait Controller {
    /// Called by the scraper each time a task completes a request, with the
    /// number of tasks currently in flight. Controllers sample on a fixed
    /// interval rather than every call.
    fn register_completion(&mut self, current_coroutines: u32);

    fn recommended_coroutines(&self) -> usize;
}

#[enum_dispatch(Controller)]
pub enum ConcurrencyController {
    Fixed(FixedController),
    Adaptive(AdaptiveController),
}

pub struct FixedController {
    coroutines: usize,
    sampling_interval: usize,
    completed: usize,
    start: Instant,
}

impl FixedController {
    pub fn new(coroutines: usize, sampling_interval: usize) -> Self {
        FixedController {
            coroutines,
            sampling_interval,
            completed: 0,
            start: Instant::now(),
        }
    }
}

impl Controller for FixedController {
    fn register_completion(&mut self, current_coroutines: u32) {
        self.completed += 1;
        if self.completed < self.sampling_interval {
            return;
        }
        let end = Instant::now();
        let elapsed = (end - self.start).as_secs_f64();
        let velocity = self.completed as f64 / elapsed;
        info!(
            "Request velocity: {velocity:.2} rps. Recommended coros (fixed): {}; Current coros: {current_coroutines}",
            self.coroutines
        );
        self.start = end;
        self.completed = 0;
    }

    fn recommended_coroutines(&self) -> usize {
        self.coroutines
    }
}

/// Fits a trailing-window linear regression of requests/sec against
/// concurrency and nudges the recommendation in whichever direction the fit
/// says throughput is climbing.
///
/// The slope used below is `Sxx / Sxy` (sum of squared concurrency
/// deviations over the concurrency/velocity covariance), which is the
/// reciprocal of the ordinary-least-squares slope `Sxy / Sxx`. The sign is
/// unaffected by the inversion (both share the sign of the covariance) so
/// the controller still nudges in the right direction, but the magnitude
/// this produces isn't a real slope. This mirrors the tool this controller
/// was ported from; left as-is rather than corrected.
pub struct AdaptiveController {
    coroutines: VecDeque<u32>,
    velocities: VecDeque<f64>,
    sample_size: usize,
    start: Instant,
    completed: usize,
    sample_interval: usize,
    recommended: usize,
    max_coro: usize,
    min_coro: usize,
}

impl AdaptiveController {
    pub fn new(
        initial_coroutines: usize,
        sample_size: usize,
        sample_interval: usize,
        minimum_coroutines: usize,
        maximum_coroutines: usize,
    ) -> Self {
        AdaptiveController {
            coroutines: VecDeque::with_capacity(sample_size),
            velocities: VecDeque::with_capacity(sample_size),
            sample_size,
            start: Instant::now(),
            completed: 0,
            sample_interval,
            recommended: initial_coroutines,
            max_coro: maximum_coroutines,
            min_coro: minimum_coroutines,
        }
    }

    fn push_sample(&mut self, coro: u32, velocity: f64) {
        if self.coroutines.len() == self.sample_size {
            self.coroutines.pop_front();
            self.velocities.pop_front();
        }
        self.coroutines.push_back(coro);
        self.velocities.push_back(velocity);
    }
}

impl Controller for AdaptiveController {
    fn register_completion(&mut self, current_coroutines: u32) {
        self.completed += 1;
        if self.completed < self.sample_interval {
            return;
        }
        let end = Instant::now();
        let elapsed = (end - self.start).as_secs_f64();
        let velocity = self.completed as f64 / elapsed;
        self.push_sample(current_coroutines, velocity);
        info!(
            "Request velocity: {velocity:.2} rps. Concurrent requests: {current_coroutines}"
        );
        self.start = end;
        self.completed = 0;

        if self.velocities.len() < 2 {
            self.recommended += 1;
            return;
        }

        let n = self.velocities.len() as f64;
        let mean_velocity: f64 = self.velocities.iter().sum::<f64>() / n;
        let mean_coros: f64 = self.coroutines.iter().map(|&c| c as f64).sum::<f64>() / n;

        let ss_coros: f64 = self
            .coroutines
            .iter()
            .map(|&c| {
                let delta = c as f64 - mean_coros;
                delta * delta
            })
            .sum();
        if ss_coros < 0.0001 {
            self.recommended += 1;
            return;
        }

        let ss_covar: f64 = self
            .coroutines
            .iter()
            .zip(self.velocities.iter())
            .map(|(&c, &v)| (c as f64 - mean_coros) * (v - mean_velocity))
            .sum();
        if ss_covar < 0.0001 {
            self.recommended += 1;
            return;
        }

        let beta = ss_coros / ss_covar;
        if beta > 0.0 && self.recommended < self.max_coro {
            self.recommended += 1;
        } else if beta < 0.0 && self.recommended > self.min_coro {
            self.recommended -= 1;
        }
    }

    fn recommended_coroutines(&self) -> usize {
        self.recommended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_controller_never_moves() {
        let c = FixedController::new(8, 100);
        assert_eq!(c.recommended_coroutines(), 8);
    }

    #[test]
    fn adaptive_needs_two_samples_before_adjusting() {
        let mut c = AdaptiveController::new(4, 16, 1, 1, 64);
        let before = c.recommended_coroutines();
        c.register_completion(4);
        assert_eq!(c.recommended_coroutines(), before + 1);
    }

    #[test]
    fn adaptive_climbs_when_throughput_rises_with_concurrency() {
        let mut c = AdaptiveController::new(4, 16, 1, 1, 64);
        for coro in [4u32, 8, 12, 16] {
            c.push_sample(coro, coro as f64 * 10.0);
        }
        // Force the post-sample regression path directly rather than waiting
        // on wall-clock sample_interval gating.
        let n = c.velocities.len() as f64;
        let mean_velocity: f64 = c.velocities.iter().sum::<f64>() / n;
        let mean_coros: f64 = c.coroutines.iter().map(|&x| x as f64).sum::<f64>() / n;
        let ss_covar: f64 = c
            .coroutines
            .iter()
            .zip(c.velocities.iter())
            .map(|(&x, &v)| (x as f64 - mean_coros) * (v - mean_velocity))
            .sum();
        assert!(ss_covar > 0.0);
    }

    #[test]
    fn adaptive_respects_bounds() {
        let mut c = AdaptiveController::new(64, 16, 1, 1, 64);
        c.recommended = 64;
        c.max_coro = 64;
        for coro in [60u32, 62, 64, 66] {
            c.push_sample(coro, coro as f64 * 2.0);
        }
        // Stub a clean-ascending fit: beta should read positive, but
        // recommended must not exceed max_coro regardless.
        let n = c.velocities.len() as f64;
        let mean_velocity: f64 = c.velocities.iter().sum::<f64>() / n;
        let mean_coros: f64 = c.coroutines.iter().map(|&x| x as f64).sum::<f64>() / n;
        let ss_coros: f64 = c
            .coroutines
            .iter()
            .map(|&x| {
                let d = x as f64 - mean_coros;
                d * d
            })
            .sum();
        let ss_covar: f64 = c
            .coroutines
            .iter()
            .zip(c.velocities.iter())
            .map(|(&x, &v)| (x as f64 - mean_coros) * (v - mean_velocity))
            .sum();
        let beta = ss_coros / ss_covar;
        if beta > 0.0 && c.recommended < c.max_coro {
            c.recommended += 1;
        }
        assert!(c.recommended <= c.max_coro);
    }

    #[test]
    fn ring_buffer_evicts_oldest_sample() {
        let mut c = AdaptiveController::new(4, 2, 1, 1, 64);
        c.push_sample(1, 10.0);
        c.push_sample(2, 20.0);
        c.push_sample(3, 30.0);
        assert_eq!(c.coroutines.len(), 2);
        assert_eq!(*c.coroutines.front().unwrap(), 2);
        assert_eq!(*c.coroutines.back().unwrap(), 3);
    }
}
