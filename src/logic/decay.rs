//! Inactivity decay.

use crate::config::DecayConfig;
use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Points lost to inactivity between `last_active_at` and `now`.
///
/// Zero inside the grace period, then `max(weeks, floor(points * rate * weeks))`
/// where `weeks` counts started weeks past grace, capped at `min(max_loss, points)`.
/// Must be fed the profile as it was *before* the current award.
pub fn decay(
    current_points: f64,
    last_active_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &DecayConfig,
) -> f64 {
    let Some(last_active_at) = last_active_at else {
        return 0.0;
    };
    if !current_points.is_finite() || current_points <= 0.0 {
        return 0.0;
    }
    let inactive_days = (now - last_active_at).num_seconds() as f64 / SECONDS_PER_DAY;
    if inactive_days <= config.grace_days {
        return 0.0;
    }
    let weeks = ((inactive_days - config.grace_days) / 7.0).ceil();
    let percent_loss = (current_points * config.percent_per_week * weeks).floor();
    let loss = weeks.max(percent_loss);
    config.max_loss.min(current_points.min(loss))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days))
    }

    #[test]
    fn no_decay_without_activity_or_points() {
        let cfg = DecayConfig::default();
        assert_eq!(decay(200.0, None, now(), &cfg), 0.0);
        assert_eq!(decay(0.0, days_ago(90), now(), &cfg), 0.0);
    }

    #[test]
    fn no_decay_inside_grace_period() {
        let cfg = DecayConfig::default();
        assert_eq!(decay(500.0, days_ago(14), now(), &cfg), 0.0);
        assert_eq!(decay(500.0, days_ago(3), now(), &cfg), 0.0);
    }

    #[test]
    fn forty_days_inactive_on_two_hundred_points() {
        // 26 days past grace -> 4 started weeks -> floor(200 * 0.04) = 8
        let cfg = DecayConfig::default();
        assert_eq!(decay(200.0, days_ago(40), now(), &cfg), 8.0);
    }

    #[test]
    fn minimum_loss_is_one_point_per_week() {
        // 50 * 0.01 * 1 = 0.5 -> floor 0, min loss 1
        let cfg = DecayConfig::default();
        assert_eq!(decay(50.0, days_ago(15), now(), &cfg), 1.0);
    }

    #[test]
    fn loss_is_capped_by_points_and_max() {
        let cfg = DecayConfig::default();
        assert_eq!(decay(3.0, days_ago(200), now(), &cfg), 3.0);
        assert_eq!(decay(10_000.0, days_ago(60), now(), &cfg), 50.0);
    }

    #[test]
    fn decay_never_decreases_with_longer_inactivity() {
        let cfg = DecayConfig::default();
        let mut previous = 0.0;
        for days in 0..400 {
            let loss = decay(730.0, days_ago(days), now(), &cfg);
            assert!(loss >= previous, "day {days}: {loss} < {previous}");
            assert!(loss <= 50.0);
            previous = loss;
        }
    }
}
