#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized, monotonically spaced date sequences within a month window.

use chrono::{Days, NaiveDate};
use fuel_slips_core::{
    DateSequence, DateSequenceRequest, Notice, WindowTooShort, MAX_GAP_COERCION_DAYS,
};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, warn};

/// Longest offset from the window start at which the first date may land.
const SEED_OFFSET_CAP_DAYS: u64 = 14;
/// Share of the window, in percent, available to the first-date offset.
const SEED_OFFSET_WINDOW_PERCENT: u64 = 5;

/// Weighted bands the extra days of a gap are drawn from.
///
/// Bounds are expressed in quarters of the spread between the minimum and
/// maximum gap.
const EXTRA_REGIMES: [ExtraRegime; 3] = [
    ExtraRegime {
        weight: 30,
        lower_quarters: 0,
        upper_quarters: 1,
    },
    ExtraRegime {
        weight: 40,
        lower_quarters: 1,
        upper_quarters: 3,
    },
    ExtraRegime {
        weight: 30,
        lower_quarters: 3,
        upper_quarters: 4,
    },
];

#[derive(Clone, Copy, Debug)]
struct ExtraRegime {
    weight: u32,
    lower_quarters: u64,
    upper_quarters: u64,
}

impl ExtraRegime {
    fn sample<R>(&self, spread: u64, rng: &mut R) -> u64
    where
        R: Rng + ?Sized,
    {
        let low = spread * self.lower_quarters / 4;
        let high = spread * self.upper_quarters / 4;
        rng.gen_range(low..=high)
    }
}

/// Pure system that lays out dates inside a window with bounded gaps.
#[derive(Debug, Default)]
pub struct DateSequencer {
    gap_workspace: Vec<u64>,
}

impl DateSequencer {
    /// Creates a sequencer with an empty gap workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces `request.count()` strictly increasing dates inside the window.
    ///
    /// Returns [`WindowTooShort`] when the window cannot hold the requested
    /// number of dates at the minimum gap; a shorter sequence is never
    /// returned as a success.
    pub fn sequence<R>(
        &mut self,
        request: &DateSequenceRequest,
        rng: &mut R,
    ) -> Result<DateSequence, WindowTooShort>
    where
        R: Rng + ?Sized,
    {
        let start = request.window_start().first_day();
        let end = request.window_end().last_day();
        let total = u64::try_from(request.window_days()).unwrap_or(0);
        let count = request.count();
        let gap_count = u64::from(count - 1);
        let min_gap = u64::from(request.min_gap_days());
        let required = min_gap.saturating_mul(gap_count);

        if total < required {
            warn!(
                count,
                min_gap,
                required,
                available = total,
                "date window is too short for the requested spacing"
            );
            return Err(WindowTooShort::new(request, saturating_days(required)));
        }

        let mut notices = Vec::new();
        let max_gap = resolve_max_gap(request, &mut notices);
        let slack = total - required;

        let offset = sample_seed_offset(total, slack, rng);
        self.prepare_gaps(gap_count, min_gap, max_gap, slack - offset, rng);

        let first = start + Days::new(offset);
        let mut dates = walk_gaps(first, &self.gap_workspace, end, count);
        if dates.len() < count as usize {
            let produced = dates.len() as u32;
            warn!(
                produced,
                requested = count,
                "random spacing fell short; spacing dates evenly"
            );
            notices.push(Notice::EvenSpacingFallback {
                produced,
                requested: count,
            });
            dates = even_spacing(start, end, count, total, min_gap, max_gap);
        }

        let repaired = repair_gaps(&mut dates, min_gap);
        if repaired > 0 {
            warn!(repaired, "pushed dates forward to honour the minimum gap");
            notices.push(Notice::GapsRepaired { count: repaired });
        }

        dates.retain(|date| *date <= end);
        if dates.len() < count as usize {
            return Err(WindowTooShort::new(request, saturating_days(required)));
        }
        dates.truncate(count as usize);

        debug!(
            count,
            first = %dates[0],
            last = %dates[dates.len() - 1],
            "date sequence ready"
        );
        Ok(DateSequence::new(dates, notices))
    }

    /// Fills the workspace with `gap_count` shuffled gaps whose extra days
    /// never exceed `budget` in total.
    fn prepare_gaps<R>(
        &mut self,
        gap_count: u64,
        min_gap: u64,
        max_gap: u64,
        budget: u64,
        rng: &mut R,
    ) where
        R: Rng + ?Sized,
    {
        let spread = max_gap - min_gap;
        let mut remaining = budget;

        self.gap_workspace.clear();
        for _ in 0..gap_count {
            let extra = sample_extra(spread, rng).min(remaining);
            remaining -= extra;
            self.gap_workspace.push(min_gap + extra);
        }
        self.gap_workspace.shuffle(rng);
    }
}

fn saturating_days(days: u64) -> i64 {
    i64::try_from(days).unwrap_or(i64::MAX)
}

fn resolve_max_gap(request: &DateSequenceRequest, notices: &mut Vec<Notice>) -> u64 {
    let requested = request.max_gap_days();
    if requested > request.min_gap_days() {
        return u64::from(requested);
    }

    let coerced = request.min_gap_days().saturating_add(MAX_GAP_COERCION_DAYS);
    warn!(
        requested,
        coerced, "maximum gap does not exceed the minimum; widening it"
    );
    notices.push(Notice::MaxGapCoerced { requested, coerced });
    u64::from(coerced)
}

fn sample_seed_offset<R>(total: u64, slack: u64, rng: &mut R) -> u64
where
    R: Rng + ?Sized,
{
    let cap = (total * SEED_OFFSET_WINDOW_PERCENT / 100)
        .min(SEED_OFFSET_CAP_DAYS)
        .min(slack);
    rng.gen_range(0..=cap)
}

fn sample_extra<R>(spread: u64, rng: &mut R) -> u64
where
    R: Rng + ?Sized,
{
    if spread == 0 {
        return 0;
    }

    match EXTRA_REGIMES.choose_weighted(rng, |regime| regime.weight) {
        Ok(regime) => regime.sample(spread, rng),
        Err(_) => rng.gen_range(0..=spread),
    }
}

fn walk_gaps(first: NaiveDate, gaps: &[u64], end: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count as usize);
    if first > end {
        return dates;
    }

    let mut current = first;
    dates.push(current);
    for gap in gaps {
        match current.checked_add_days(Days::new(*gap)) {
            Some(next) if next <= end => {
                current = next;
                dates.push(current);
            }
            _ => break,
        }
    }
    dates
}

fn even_spacing(
    start: NaiveDate,
    end: NaiveDate,
    count: u32,
    total: u64,
    min_gap: u64,
    max_gap: u64,
) -> Vec<NaiveDate> {
    let gap_count = u64::from(count - 1);
    let gap = if gap_count == 0 {
        min_gap
    } else {
        (total / gap_count).clamp(min_gap, max_gap)
    };

    let mut dates = Vec::with_capacity(count as usize);
    let mut current = start;
    dates.push(current);
    while dates.len() < count as usize {
        match current.checked_add_days(Days::new(gap)) {
            Some(next) if next <= end => {
                current = next;
                dates.push(current);
            }
            _ => break,
        }
    }
    dates
}

/// Pushes any date closer than `min_gap` to its predecessor forward and
/// returns how many dates moved.
fn repair_gaps(dates: &mut [NaiveDate], min_gap: u64) -> u32 {
    let mut repaired = 0;
    for index in 1..dates.len() {
        let Some(earliest) = dates[index - 1].checked_add_days(Days::new(min_gap)) else {
            break;
        };
        if dates[index] < earliest {
            dates[index] = earliest;
            repaired += 1;
        }
    }
    repaired
}
