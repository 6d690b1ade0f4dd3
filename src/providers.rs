//! Built-in providers registered by
//! [`SessionBuilder::with_default_providers`](crate::SessionBuilder::with_default_providers).
//!
//! | Tag       | Requirements                         | Value                                  |
//! |-----------|--------------------------------------|----------------------------------------|
//! | `rate`    | `iterations`, `time_since_begin`     | publishes per second since last sample |
//! | `eta`     | `time_since_begin`, `percentage`     | remaining time from elapsed time       |
//! | `eta_new` | `iterations`, `percentage`, `rate`   | remaining time from the current rate   |
//!
//! None of them ever fails: an undefined ratio keeps the previous value.

use std::time::Duration;

use crate::{
    provider::Provider,
    stats::{Params, Stat, Value},
    tag::Tag,
};

static RATE_TAG: Tag = Tag::RATE;
static ETA_TAG: Tag = Tag::ETA;
static ETA_NEW_TAG: Tag = Tag::ETA_NEW;

static RATE_REQUIREMENTS: [Tag; 2] = [Tag::ITERATIONS, Tag::TIME_SINCE_BEGIN];
static ETA_REQUIREMENTS: [Tag; 2] = [Tag::TIME_SINCE_BEGIN, Tag::PERCENTAGE];
static ETA_NEW_REQUIREMENTS: [Tag; 3] = [Tag::ITERATIONS, Tag::PERCENTAGE, Tag::RATE];

/// Returns `x` when it is a usable, non-negative number.
fn usable(x: f64) -> Option<f64> {
    (x.is_finite() && x >= 0.0).then_some(x)
}

/// Finite-difference rate of `publish` calls.
///
/// Keeps the previous `(iterations, time_since_begin)` sample and divides the
/// difference of both. A zero or negative time step leaves the value alone.
#[derive(Debug, Default)]
pub struct RateProvider {
    previous: Option<(f64, f64)>,
}

impl RateProvider {
    /// Creates the provider with no previous sample.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Provider for RateProvider {
    fn tag(&self) -> &Tag {
        &RATE_TAG
    }

    fn requirements(&self) -> &[Tag] {
        &RATE_REQUIREMENTS
    }

    fn on_begin(&mut self, params: &Params<'_>, value: &mut Stat) {
        self.previous = params.number(0).zip(params.number(1));
        *value = Some(Value::Number(0.0));
    }

    fn on_validated(&mut self, params: &Params<'_>, value: &mut Stat) {
        let (Some(iterations), Some(elapsed)) = (params.number(0), params.number(1)) else {
            return;
        };

        let Some((prev_iterations, prev_elapsed)) = self.previous else {
            self.previous = Some((iterations, elapsed));
            return;
        };

        let dt = elapsed - prev_elapsed;
        if dt <= 0.0 {
            return;
        }

        if let Some(rate) = usable((iterations - prev_iterations) / dt) {
            *value = Some(Value::Number(rate));
        }
        self.previous = Some((iterations, elapsed));
    }
}

/// Remaining time extrapolated from the elapsed time and the percentage.
#[derive(Debug, Default)]
pub struct EtaProvider;

impl EtaProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Provider for EtaProvider {
    fn tag(&self) -> &Tag {
        &ETA_TAG
    }

    fn requirements(&self) -> &[Tag] {
        &ETA_REQUIREMENTS
    }

    fn on_validated(&mut self, params: &Params<'_>, value: &mut Stat) {
        let (Some(elapsed), Some(percentage)) = (params.number(0), params.number(1)) else {
            return;
        };
        if percentage == 0.0 {
            return;
        }

        let eta = elapsed * (100.0 - percentage) / percentage;
        if let Some(eta) = usable(eta).and_then(|s| Duration::try_from_secs_f64(s).ok()) {
            *value = Some(Value::Duration(eta));
        }
    }
}

/// Remaining time derived from the iterations still expected and the
/// current [`rate`](RateProvider).
#[derive(Debug, Default)]
pub struct EtaNewProvider;

impl EtaNewProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Provider for EtaNewProvider {
    fn tag(&self) -> &Tag {
        &ETA_NEW_TAG
    }

    fn requirements(&self) -> &[Tag] {
        &ETA_NEW_REQUIREMENTS
    }

    fn on_validated(&mut self, params: &Params<'_>, value: &mut Stat) {
        let (Some(iterations), Some(percentage), Some(rate)) =
            (params.number(0), params.number(1), params.number(2))
        else {
            return;
        };
        if percentage == 0.0 || rate == 0.0 {
            return;
        }

        let remaining_iterations = iterations * (100.0 - percentage) / percentage;
        let eta = remaining_iterations / rate;
        if let Some(eta) = usable(eta).and_then(|s| Duration::try_from_secs_f64(s).ok()) {
            *value = Some(Value::Duration(eta));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{EtaNewProvider, EtaProvider, RateProvider};
    use crate::{
        provider::Provider,
        stats::{Params, Stat, Value},
    };

    fn number(n: f64) -> Stat {
        Some(Value::Number(n))
    }

    fn secs(s: u64) -> Stat {
        Some(Value::Duration(Duration::from_secs(s)))
    }

    /// Rate Finite Difference
    /// The rate is the iteration delta over the elapsed-time delta.
    #[allow(clippy::float_cmp)]
    #[test]
    fn test_rate_finite_difference() {
        let mut rate = RateProvider::new();
        let mut value = None;

        rate.on_begin(&Params::new(&[number(0.0), secs(0)]), &mut value);
        assert_eq!(value, number(0.0));

        rate.on_publish(&Params::new(&[number(10.0), secs(2)]), &mut value);
        assert_eq!(value, number(5.0));

        rate.on_publish(&Params::new(&[number(40.0), secs(5)]), &mut value);
        assert_eq!(value, number(10.0));
    }

    /// Rate Degeneracy
    /// A zero time step keeps the previous rate instead of dividing by zero.
    #[test]
    fn test_rate_zero_time_step_keeps_value() {
        let mut rate = RateProvider::new();
        let mut value = None;

        rate.on_begin(&Params::new(&[number(0.0), secs(0)]), &mut value);
        rate.on_publish(&Params::new(&[number(4.0), secs(2)]), &mut value);
        rate.on_publish(&Params::new(&[number(9.0), secs(2)]), &mut value);

        assert_eq!(value, number(2.0));
    }

    #[test]
    fn test_rate_invalidated_resets() {
        let mut rate = RateProvider::new();
        let mut value = number(3.0);
        rate.on_publish(&Params::new(&[number(1.0), None]), &mut value);
        assert!(value.is_none());
    }

    /// ETA Extrapolation
    /// Ten seconds for 25% leaves thirty seconds; 0% keeps the old value.
    #[test]
    fn test_eta() {
        let mut eta = EtaProvider::new();
        let mut value = None;

        eta.on_publish(&Params::new(&[secs(10), number(0.0)]), &mut value);
        assert!(value.is_none(), "0% must not produce a value");

        eta.on_publish(&Params::new(&[secs(10), number(25.0)]), &mut value);
        assert_eq!(value, secs(30));

        eta.on_publish(&Params::new(&[secs(11), number(0.0)]), &mut value);
        assert_eq!(value, secs(30), "degenerate update keeps previous value");

        eta.on_end(&Params::new(&[secs(40), number(100.0)]), &mut value);
        assert_eq!(value, secs(0));
    }

    #[test]
    fn test_eta_new() {
        let mut eta = EtaNewProvider::new();
        let mut value = None;

        // 20 iterations got us to 50%, 20 more at 4 per second.
        eta.on_publish(
            &Params::new(&[number(20.0), number(50.0), number(4.0)]),
            &mut value,
        );
        assert_eq!(value, secs(5));

        eta.on_publish(
            &Params::new(&[number(21.0), number(55.0), number(0.0)]),
            &mut value,
        );
        assert_eq!(value, secs(5));
    }
}
