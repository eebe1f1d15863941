//! Star milestones over a learner's cumulative points.

use serde::Serialize;

/// A points threshold and the star rating it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    /// Cumulative points needed.
    pub points: i64,
    /// Stars granted on reaching `points`.
    pub stars: u8,
}

/// Milestones in ascending order.
pub const MILESTONES: [Milestone; 5] = [
    Milestone { points: 1000, stars: 1 },
    Milestone { points: 2000, stars: 2 },
    Milestone { points: 3000, stars: 3 },
    Milestone { points: 4000, stars: 4 },
    Milestone { points: 5000, stars: 5 },
];

const TOP_MILESTONE: Milestone = MILESTONES[MILESTONES.len() - 1];

/// Progress from the previous milestone towards the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MilestoneProgress {
    /// Points earned since the previous milestone.
    pub current: i64,
    /// Width of the band between the previous and the next milestone.
    pub needed: i64,
    /// `current / needed` as a percentage, clamped to `0..=100`.
    pub percentage: u8,
}

/// Star rating (0–5) for a cumulative total.
#[must_use]
pub fn star_rating(total_points: i64) -> u8 {
    MILESTONES
        .iter()
        .rev()
        .find(|m| total_points >= m.points)
        .map_or(0, |m| m.stars)
}

/// The smallest milestone strictly above `total_points`, or the top
/// milestone once it has been reached.
#[must_use]
pub fn next_milestone(total_points: i64) -> Milestone {
    MILESTONES
        .iter()
        .find(|m| m.points > total_points)
        .copied()
        .unwrap_or(TOP_MILESTONE)
}

/// How far `total_points` has travelled towards the next milestone.
#[must_use]
pub fn progress_to_next_milestone(total_points: i64) -> MilestoneProgress {
    let next = next_milestone(total_points);
    let previous = MILESTONES
        .iter()
        .rev()
        .find(|m| m.points < next.points)
        .map_or(0, |m| m.points);

    let needed = next.points - previous;
    let current = (total_points - previous).max(0);
    let percentage = (current.saturating_mul(100) / needed).clamp(0, 100);

    MilestoneProgress {
        current,
        needed,
        // Clamped to 0..=100 above.
        percentage: u8::try_from(percentage).unwrap_or(100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_rating_boundaries() {
        assert_eq!(star_rating(0), 0);
        assert_eq!(star_rating(999), 0);
        assert_eq!(star_rating(1000), 1);
        assert_eq!(star_rating(2999), 2);
        assert_eq!(star_rating(4000), 4);
        assert_eq!(star_rating(5000), 5);
        assert_eq!(star_rating(120_000), 5);
    }

    #[test]
    fn test_star_rating_is_zero_for_negative_totals() {
        assert_eq!(star_rating(-250), 0);
    }

    #[test]
    fn test_star_rating_is_monotonic() {
        let mut previous = star_rating(-10);
        for total in (-10..7000).step_by(7) {
            let stars = star_rating(total);
            assert!(stars >= previous, "rating dropped at {total}");
            previous = stars;
        }
    }

    #[test]
    fn test_next_milestone_is_strictly_greater() {
        assert_eq!(next_milestone(0), Milestone { points: 1000, stars: 1 });
        assert_eq!(next_milestone(1000), Milestone { points: 2000, stars: 2 });
        assert_eq!(next_milestone(4999), Milestone { points: 5000, stars: 5 });
    }

    #[test]
    fn test_next_milestone_caps_at_top() {
        assert_eq!(next_milestone(5000), TOP_MILESTONE);
        assert_eq!(next_milestone(9000), TOP_MILESTONE);
    }

    #[test]
    fn test_progress_towards_first_milestone_starts_from_zero() {
        let progress = progress_to_next_milestone(250);

        assert_eq!(progress.current, 250);
        assert_eq!(progress.needed, 1000);
        assert_eq!(progress.percentage, 25);
    }

    #[test]
    fn test_progress_between_milestones_uses_band_width() {
        let progress = progress_to_next_milestone(1500);

        assert_eq!(progress.current, 500);
        assert_eq!(progress.needed, 1000);
        assert_eq!(progress.percentage, 50);
    }

    #[test]
    fn test_progress_past_top_milestone_is_clamped() {
        let progress = progress_to_next_milestone(8000);

        assert_eq!(progress.needed, 1000);
        assert_eq!(progress.percentage, 100);
    }

    #[test]
    fn test_progress_for_negative_total_is_zero() {
        let progress = progress_to_next_milestone(-40);

        assert_eq!(progress.current, 0);
        assert_eq!(progress.percentage, 0);
    }
}
