#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Constrained random allocation of a total value into bounded parts.
//!
//! The engine produces `part_count` integer parts that sum exactly to the
//! requested total. When the total lies outside the range the requested
//! bounds can reach, the bound on the violated side is relaxed just enough to
//! keep it reachable. The first `min_strict_count` slots stay inside the
//! requested bounds whenever the total allows it. When no split satisfies the
//! slot bounds the engine retries a bounded number of times and then falls
//! back to an equal split, which still preserves the exact sum.

use fuel_slips_core::{
    AdjustmentKind, AllocationRequest, AllocationResult, BoundAdjustment, DEFAULT_MAX_ATTEMPTS,
};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, warn};

/// Pure system that partitions totals into randomized bounded parts.
#[derive(Clone, Copy, Debug)]
pub struct AllocationEngine {
    max_attempts: u32,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl AllocationEngine {
    /// Creates an engine that gives up after `max_attempts` dead-ended draws.
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Number of attempts made before the equal-split fallback.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Partitions `request.total_value()` into `request.part_count()` parts.
    pub fn allocate<R>(&self, request: &AllocationRequest, rng: &mut R) -> AllocationResult
    where
        R: Rng + ?Sized,
    {
        let total = request.total_value();
        if total <= 0 {
            warn!(total, "allocating a non-positive total; parts will not be positive");
        }

        let (effective, adjustment) = resolve_effective_bounds(request);
        if let Some(adjustment) = adjustment {
            warn!(
                kind = ?adjustment.kind(),
                original = adjustment.original(),
                adjusted = adjustment.adjusted(),
                floor = adjustment.floor(),
                ceiling = adjustment.ceiling(),
                "total is outside the reachable range; relaxing bounds for unconstrained parts"
            );
        }

        let slots = slot_bounds(request, effective);
        for attempt in 1..=self.max_attempts {
            match draw_parts(total, &slots, rng) {
                Some(mut parts) => {
                    parts.shuffle(rng);
                    debug!(attempt, parts = parts.len(), "allocation succeeded");
                    return AllocationResult::exact(parts, adjustment, attempt);
                }
                None => debug!(attempt, "allocation attempt dead-ended; retrying"),
            }
        }

        warn!(
            attempts = self.max_attempts,
            total, "no split satisfied the bounds; falling back to an equal split"
        );
        AllocationResult::approximate(
            equal_split(total, request.part_count()),
            adjustment,
            self.max_attempts,
        )
    }
}

/// Inclusive bounds a single slot must respect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SlotBounds {
    min: i64,
    max: i64,
}

fn resolve_effective_bounds(request: &AllocationRequest) -> (SlotBounds, Option<BoundAdjustment>) {
    let count = i64::from(request.part_count());
    let total = request.total_value();
    let original = SlotBounds {
        min: request.min_part(),
        max: request.max_part(),
    };
    let floor = original.min.saturating_mul(count);
    let ceiling = original.max.saturating_mul(count);

    if total < floor {
        let adjusted = total.div_euclid(count);
        let adjustment = BoundAdjustment::new(
            AdjustmentKind::LoweredMinimum,
            original.min,
            adjusted,
            total,
            floor,
            ceiling,
        );
        return (
            SlotBounds {
                min: adjusted,
                max: original.max,
            },
            Some(adjustment),
        );
    }

    if total > ceiling {
        let adjusted = div_ceil(total, count);
        let adjustment = BoundAdjustment::new(
            AdjustmentKind::RaisedMaximum,
            original.max,
            adjusted,
            total,
            floor,
            ceiling,
        );
        return (
            SlotBounds {
                min: original.min,
                max: adjusted,
            },
            Some(adjustment),
        );
    }

    (original, None)
}

fn div_ceil(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// Bounds per slot: strict slots first, trailing slots after.
///
/// Strict slots keep the requested bounds only while, together with the
/// relaxed trailing slots, they can still reach the total. Otherwise every
/// slot takes the relaxed bounds.
fn slot_bounds(request: &AllocationRequest, effective: SlotBounds) -> Vec<SlotBounds> {
    let original = SlotBounds {
        min: request.min_part(),
        max: request.max_part(),
    };
    let strict = request.effective_strict_count();
    let trailing = request.part_count() - strict;

    let floor = i128::from(original.min) * i128::from(strict)
        + i128::from(effective.min) * i128::from(trailing);
    let ceiling = i128::from(original.max) * i128::from(strict)
        + i128::from(effective.max) * i128::from(trailing);
    let strict_bounds = if (floor..=ceiling).contains(&i128::from(request.total_value())) {
        original
    } else {
        debug!(
            strict,
            "requested bounds cannot reach the total; strict parts use relaxed bounds"
        );
        effective
    };

    (0..request.part_count())
        .map(|slot| {
            if slot < strict {
                strict_bounds
            } else {
                effective
            }
        })
        .collect()
}

/// Draws one candidate split, or `None` when the draw path dead-ends.
///
/// Every slot but the last draws uniformly from the range that still lets the
/// slots after it complete within their bounds; the last slot takes the exact
/// remaining balance.
fn draw_parts<R>(total: i64, slots: &[SlotBounds], rng: &mut R) -> Option<Vec<i64>>
where
    R: Rng + ?Sized,
{
    let (last, leading) = slots.split_last()?;

    let mut rest_min: i128 = slots.iter().skip(1).map(|slot| i128::from(slot.min)).sum();
    let mut rest_max: i128 = slots.iter().skip(1).map(|slot| i128::from(slot.max)).sum();
    let mut remaining = i128::from(total);
    let mut parts = Vec::with_capacity(slots.len());

    for (index, slot) in leading.iter().enumerate() {
        let max_possible = i128::from(slot.max).min(remaining - rest_min);
        let min_possible = i128::from(slot.min).max(remaining - rest_max);
        if min_possible > max_possible {
            return None;
        }

        let low = i64::try_from(min_possible).ok()?;
        let high = i64::try_from(max_possible).ok()?;
        let part = rng.gen_range(low..=high);
        parts.push(part);
        remaining -= i128::from(part);

        let next = slots[index + 1];
        rest_min -= i128::from(next.min);
        rest_max -= i128::from(next.max);
    }

    let balance = i64::try_from(remaining).ok()?;
    if balance < last.min || balance > last.max {
        return None;
    }
    parts.push(balance);
    Some(parts)
}

fn equal_split(total: i64, part_count: u32) -> Vec<i64> {
    let count = i64::from(part_count);
    let share = total.div_euclid(count);
    let mut parts = vec![share; part_count as usize];
    if let Some(last) = parts.last_mut() {
        *last += total - share * count;
    }
    parts
}
