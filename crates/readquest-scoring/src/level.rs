//! Points issued for completing a level.

/// Flat part of every level award.
pub const LEVEL_BASE_POINTS: u32 = 100;

/// Additional points per level number.
pub const LEVEL_WEIGHT: u32 = 50;

/// Points awarded for finishing `level_number`.
///
/// `_step_count` is accepted so callers can pass the level's step count
/// today; it does not influence the result.
#[must_use]
pub fn points_for_level(level_number: u32, _step_count: u32) -> u32 {
    LEVEL_BASE_POINTS.saturating_add(level_number.saturating_mul(LEVEL_WEIGHT))
}

/// Ledger reason recorded for a level award.
#[must_use]
pub fn level_award_reason(level_number: u32) -> String {
    format!("Seviye {level_number} tamamlandı")
}
