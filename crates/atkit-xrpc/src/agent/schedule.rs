//! Refresh scheduling decisions.

use std::time::Duration;

use chrono::TimeDelta;

/// When the next background refresh should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSchedule {
    /// The token is inside the margin; refresh now.
    Immediate,
    /// Arm a one-shot timer for this delay.
    After(Duration),
}

/// Decide when to refresh a token with `time_to_expiry` remaining.
///
/// Inside `margin` the refresh is immediate. Otherwise the timer fires at
/// `min(time_to_expiry - margin, interval)`, so long-lived tokens are still
/// refreshed at least once per `interval`.
pub fn refresh_schedule(
    time_to_expiry: TimeDelta,
    margin: Duration,
    interval: Duration,
) -> RefreshSchedule {
    // Negative remaining time means already expired
    let remaining = time_to_expiry.to_std().unwrap_or(Duration::ZERO);

    if remaining < margin {
        RefreshSchedule::Immediate
    } else {
        RefreshSchedule::After((remaining - margin).min(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGIN: Duration = Duration::from_secs(60);
    const INTERVAL: Duration = Duration::from_secs(3600);

    #[test]
    fn near_expiry_refreshes_immediately() {
        assert_eq!(
            refresh_schedule(TimeDelta::seconds(30), MARGIN, INTERVAL),
            RefreshSchedule::Immediate
        );
    }

    #[test]
    fn long_lived_token_is_capped_at_interval() {
        assert_eq!(
            refresh_schedule(TimeDelta::hours(2), MARGIN, INTERVAL),
            RefreshSchedule::After(INTERVAL)
        );
    }

    #[test]
    fn short_lived_token_fires_before_margin() {
        assert_eq!(
            refresh_schedule(TimeDelta::minutes(30), MARGIN, INTERVAL),
            RefreshSchedule::After(Duration::from_secs(29 * 60))
        );
    }

    #[test]
    fn expired_token_refreshes_immediately() {
        assert_eq!(
            refresh_schedule(TimeDelta::seconds(-5), MARGIN, INTERVAL),
            RefreshSchedule::Immediate
        );
        assert_eq!(
            refresh_schedule(TimeDelta::zero(), MARGIN, INTERVAL),
            RefreshSchedule::Immediate
        );
    }
}
