//! Per-day quotas that steer action and hour selection
//!
//! Records of a day are produced in order, and the running count decides
//! which action the next record gets: the first slice of the day is Allow,
//! then Deny, then Bypass, and whatever remains is Log-only. The first
//! `rush_hours_threshold` share of the day lands inside the rush-hour window.

use rand::Rng;

use crate::config::Conditions;
use crate::models::Action;

/// Early-morning hours used outside the rush-hour quota
const EARLY_HOURS: (u32, u32) = (0, 9);
/// Late-evening hours used outside the rush-hour quota
const LATE_HOURS: (u32, u32) = (19, 23);

/// Allow stays this far under its quota so the share is below the limit
const ALLOW_MARGIN: f64 = 0.9;
/// Deny stays this far under its quota so the share is below the limit
const DENY_MARGIN: f64 = 0.8;
/// Bypass overshoots its quota so the share is above the minimum
const BYPASS_MARGIN: f64 = 1.1;

#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    lines_per_day: f64,
    allow_quota: f64,
    deny_quota: f64,
    bypass_quota: f64,
    rush_quota: f64,
    rush_hours: (u32, u32),
}

impl DayPlan {
    pub fn new(conditions: &Conditions, lines_per_day: f64) -> Self {
        let quota = |share: f64| (share * lines_per_day).floor();

        DayPlan {
            lines_per_day,
            allow_quota: quota(conditions.allow_limit),
            deny_quota: quota(conditions.deny_limit),
            bypass_quota: quota(conditions.bypass_min),
            rush_quota: quota(conditions.rush_hours_threshold),
            rush_hours: conditions.rush_hour_range(),
        }
    }

    pub fn lines_per_day(&self) -> f64 {
        self.lines_per_day
    }

    /// True once `produced` records cover the day's share
    pub fn is_complete(&self, produced: usize) -> bool {
        produced as f64 >= self.lines_per_day
    }

    pub fn in_rush_quota(&self, produced: usize) -> bool {
        (produced as f64) < self.rush_quota
    }

    /// Action for the record following `produced` earlier records of the day
    pub fn action_for(&self, produced: usize) -> Action {
        let n = produced as f64;
        if n < self.allow_quota * ALLOW_MARGIN {
            Action::Allow
        } else if n < self.allow_quota + self.deny_quota * DENY_MARGIN {
            Action::Deny
        } else if n <= self.allow_quota + self.deny_quota + self.bypass_quota * BYPASS_MARGIN {
            Action::Bypass
        } else {
            Action::LogOnly
        }
    }

    /// Hour of day for the record following `produced` earlier records
    pub fn hour_for<R: Rng + ?Sized>(&self, rng: &mut R, produced: usize) -> u32 {
        let off_peak = if rng.gen_bool(0.5) { EARLY_HOURS } else { LATE_HOURS };
        let hour = rng.gen_range(off_peak.0..=off_peak.1);

        if self.in_rush_quota(produced) {
            rng.gen_range(self.rush_hours.0..=self.rush_hours.1)
        } else {
            hour
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn actions(plan: &DayPlan, count: usize) -> Vec<Action> {
        (0..count).map(|n| plan.action_for(n)).collect()
    }

    #[test]
    fn test_ten_lines_per_day_mix() {
        let plan = DayPlan::new(&Conditions::default(), 10.0);
        let mix = actions(&plan, 10);

        use Action::*;
        assert_eq!(
            mix,
            vec![Allow, Allow, Allow, Allow, Allow, Deny, Bypass, Bypass, LogOnly, LogOnly]
        );
    }

    #[test]
    fn test_hundred_lines_per_day_ratios() {
        let plan = DayPlan::new(&Conditions::default(), 100.0);
        let mix = actions(&plan, 100);
        let count = |a: Action| mix.iter().filter(|&&m| m == a).count();

        // Deny starts after the full allow quota, not the trimmed one
        assert_eq!(count(Action::Allow), 45);
        assert_eq!(count(Action::Deny), 13);
        assert_eq!(count(Action::Bypass), 19);
        assert_eq!(count(Action::LogOnly), 23);
    }

    #[test]
    fn test_single_line_day_is_bypass() {
        let plan = DayPlan::new(&Conditions::default(), 1.0);
        assert_eq!(plan.action_for(0), Action::Bypass);
    }

    #[test]
    fn test_is_complete_uses_real_share() {
        let plan = DayPlan::new(&Conditions::default(), 1.5);
        assert!(!plan.is_complete(0));
        assert!(!plan.is_complete(1));
        assert!(plan.is_complete(2));
    }

    #[test]
    fn test_rush_quota_hours() {
        let plan = DayPlan::new(&Conditions::default(), 10.0);
        let mut rng = StdRng::seed_from_u64(42);

        for produced in 0..7 {
            let hour = plan.hour_for(&mut rng, produced);
            assert!((9..=18).contains(&hour), "hour {} inside quota", hour);
        }
        for produced in 7..10 {
            let hour = plan.hour_for(&mut rng, produced);
            assert!(hour <= 9 || (19..=23).contains(&hour), "hour {} off peak", hour);
        }
    }

    #[test]
    fn test_zero_threshold_never_rush() {
        let conditions = Conditions {
            rush_hours_threshold: 0.0,
            ..Conditions::default()
        };
        let plan = DayPlan::new(&conditions, 50.0);
        assert!(!plan.in_rush_quota(0));
    }
}
