#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the fuel slip generator.
//!
//! This crate defines the values exchanged between the pure generation
//! systems, the batch planner, and the adapters. Systems receive validated
//! requests, draw from a caller-supplied random source, and answer with
//! results that carry every non-fatal adjustment as a [`Notice`] so callers
//! can decide whether to continue.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub mod config;

pub use config::{FuelType, GenerationConfig, OilCompany, PumpTemplate, ValidatedConfig};

/// Number of allocation attempts made before falling back to an equal split.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
/// Minimum day gap applied when the configuration omits one.
pub const DEFAULT_MIN_GAP_DAYS: u32 = 5;
/// Maximum day gap applied when the configuration omits one.
pub const DEFAULT_MAX_GAP_DAYS: u32 = 25;
/// Days added to the minimum gap when a maximum gap does not exceed it.
pub const MAX_GAP_COERCION_DAYS: u32 = 5;
/// Display format used for slip dates unless configured otherwise.
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";
/// Prefix attached to every receipt number.
pub const RECEIPT_PREFIX: &str = "RCPT";
/// Helpline number printed on every slip.
pub const TELE_NUMBER: &str = "1800-XXX-XXXX";
/// Vehicle category printed on every slip.
pub const VEHICLE_TYPE: &str = "Car";
/// Offsets applied to the approximate unit rate, chosen with equal odds.
pub const RATE_VARIATIONS: [f64; 2] = [-0.01, 0.03];

/// Label of the random stream consumed by the allocation engine.
pub const RNG_STREAM_ALLOCATION: &str = "allocation";
/// Label of the random stream consumed by the date sequencer.
pub const RNG_STREAM_DATES: &str = "dates";
/// Label of the random stream consumed by record enrichment.
pub const RNG_STREAM_ENRICHMENT: &str = "enrichment";

/// Static constraint violations rejected before any generation starts.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The total amount must be strictly positive.
    #[error("total amount must be greater than zero, got {0}")]
    NonPositiveTotal(i64),
    /// A per-part bound was zero or negative.
    #[error("{field} must be greater than zero, got {value}")]
    NonPositiveBound {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied for the field.
        value: i64,
    },
    /// The upper per-part bound does not exceed the lower one.
    #[error("maximum amount ({max}) must be greater than minimum amount ({min})")]
    InvertedBounds {
        /// Lower bound supplied.
        min: i64,
        /// Upper bound supplied.
        max: i64,
    },
    /// A count that must be at least one was zero.
    #[error("{0} must be at least one")]
    ZeroCount(&'static str),
    /// The strict count was outside `1..=count`.
    #[error("minimum slip count {strict} must lie within 1..={count}")]
    StrictCountOutOfRange {
        /// Strict count supplied.
        strict: u32,
        /// Total number of parts requested.
        count: u32,
    },
    /// A month name could not be parsed.
    #[error("unknown month `{0}`")]
    UnknownMonth(String),
    /// A month and year did not form a representable calendar month.
    #[error("month {month} of year {year} is not a valid calendar month")]
    InvalidCalendarMonth {
        /// Year supplied.
        year: i32,
        /// One-based month supplied.
        month: u32,
    },
    /// The window ends before it starts.
    #[error("date window ends ({end}) before it starts ({start})")]
    ReversedWindow {
        /// First month of the window.
        start: CalendarMonth,
        /// Last month of the window.
        end: CalendarMonth,
    },
    /// The approximate unit rate was not finite or could vary down to zero.
    #[error("approximate rate must stay positive after price variation, got {0}")]
    NonPositiveRate(f64),
    /// The date display format contained unsupported specifiers.
    #[error("date format `{0}` is not a valid strftime pattern")]
    InvalidDateFormat(String),
}

/// Checks that `format` renders a calendar date.
///
/// Specifiers chrono rejects outright, and time or zone specifiers a bare
/// date cannot fill, are both refused.
pub fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    use chrono::format::StrftimeItems;
    use std::fmt::Write as _;

    let mut rendered = String::new();
    write!(
        rendered,
        "{}",
        NaiveDate::default().format_with_items(StrftimeItems::new(format))
    )
    .map_err(|_| ConfigError::InvalidDateFormat(format.to_owned()))
}

/// Checks that every varied unit rate drawn from `approx_rate` stays positive
/// once rounded to two decimals.
pub fn validate_approx_rate(approx_rate: f64) -> Result<(), ConfigError> {
    let lowest = RATE_VARIATIONS
        .iter()
        .map(|variation| ((approx_rate + variation) * 100.0).round())
        .fold(f64::INFINITY, f64::min);
    if !approx_rate.is_finite() || lowest <= 0.0 {
        return Err(ConfigError::NonPositiveRate(approx_rate));
    }
    Ok(())
}

/// Request to partition a total value into bounded integer parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationRequest {
    total_value: i64,
    part_count: u32,
    min_part: i64,
    max_part: i64,
    min_strict_count: u32,
}

impl AllocationRequest {
    /// Creates a request after checking its static constraints.
    ///
    /// `total_value` is not validated: zero and negative totals are passed
    /// through to the engine unchanged.
    pub fn new(
        total_value: i64,
        part_count: u32,
        min_part: i64,
        max_part: i64,
        min_strict_count: u32,
    ) -> Result<Self, ConfigError> {
        if part_count == 0 {
            return Err(ConfigError::ZeroCount("part count"));
        }
        if min_part <= 0 {
            return Err(ConfigError::NonPositiveBound {
                field: "minimum part",
                value: min_part,
            });
        }
        if max_part < min_part {
            return Err(ConfigError::InvertedBounds {
                min: min_part,
                max: max_part,
            });
        }

        Ok(Self {
            total_value,
            part_count,
            min_part,
            max_part,
            min_strict_count,
        })
    }

    /// Total value the parts must sum to.
    #[must_use]
    pub const fn total_value(&self) -> i64 {
        self.total_value
    }

    /// Number of parts to produce.
    #[must_use]
    pub const fn part_count(&self) -> u32 {
        self.part_count
    }

    /// Requested lower bound for each part.
    #[must_use]
    pub const fn min_part(&self) -> i64 {
        self.min_part
    }

    /// Requested upper bound for each part.
    #[must_use]
    pub const fn max_part(&self) -> i64 {
        self.max_part
    }

    /// Strict count exactly as requested.
    #[must_use]
    pub const fn min_strict_count(&self) -> u32 {
        self.min_strict_count
    }

    /// Strict count clamped into `1..=part_count`; out-of-range values become `part_count`.
    #[must_use]
    pub const fn effective_strict_count(&self) -> u32 {
        if self.min_strict_count == 0 || self.min_strict_count > self.part_count {
            self.part_count
        } else {
            self.min_strict_count
        }
    }
}

/// Which per-part bound was relaxed to keep a total reachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentKind {
    /// The total was below `min_part * count`; the minimum was lowered.
    LoweredMinimum,
    /// The total was above `max_part * count`; the maximum was raised.
    RaisedMaximum,
}

/// Record of a per-part bound relaxed before allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundAdjustment {
    kind: AdjustmentKind,
    original: i64,
    adjusted: i64,
    total: i64,
    floor: i64,
    ceiling: i64,
}

impl BoundAdjustment {
    /// Creates a new adjustment record.
    #[must_use]
    pub const fn new(
        kind: AdjustmentKind,
        original: i64,
        adjusted: i64,
        total: i64,
        floor: i64,
        ceiling: i64,
    ) -> Self {
        Self {
            kind,
            original,
            adjusted,
            total,
            floor,
            ceiling,
        }
    }

    /// Bound that was relaxed.
    #[must_use]
    pub const fn kind(&self) -> AdjustmentKind {
        self.kind
    }

    /// Bound value before the adjustment.
    #[must_use]
    pub const fn original(&self) -> i64 {
        self.original
    }

    /// Bound value used for the unconstrained parts.
    #[must_use]
    pub const fn adjusted(&self) -> i64 {
        self.adjusted
    }

    /// Requested total that triggered the adjustment.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    /// Smallest reachable total under the original bounds.
    #[must_use]
    pub const fn floor(&self) -> i64 {
        self.floor
    }

    /// Largest reachable total under the original bounds.
    #[must_use]
    pub const fn ceiling(&self) -> i64 {
        self.ceiling
    }

    /// Absolute distance the bound moved.
    #[must_use]
    pub const fn delta(&self) -> i64 {
        (self.adjusted - self.original).abs()
    }
}

impl fmt::Display for BoundAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = match self.kind {
            AdjustmentKind::LoweredMinimum => "minimum amount lowered",
            AdjustmentKind::RaisedMaximum => "maximum amount raised",
        };
        write!(
            f,
            "total {} is outside the reachable range {}-{}; {bound} from {} to {} (by {})",
            self.total,
            self.floor,
            self.ceiling,
            self.original,
            self.adjusted,
            self.delta()
        )
    }
}

/// Outcome of a single allocation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationResult {
    parts: Vec<i64>,
    is_approximate: bool,
    adjustment: Option<BoundAdjustment>,
    attempts: u32,
}

impl AllocationResult {
    /// Creates a result whose parts honour their slot bounds.
    #[must_use]
    pub fn exact(parts: Vec<i64>, adjustment: Option<BoundAdjustment>, attempts: u32) -> Self {
        Self {
            parts,
            is_approximate: false,
            adjustment,
            attempts,
        }
    }

    /// Creates a result produced by the equal-split fallback.
    #[must_use]
    pub fn approximate(
        parts: Vec<i64>,
        adjustment: Option<BoundAdjustment>,
        attempts: u32,
    ) -> Self {
        Self {
            parts,
            is_approximate: true,
            adjustment,
            attempts,
        }
    }

    /// Generated parts in their final, shuffled order.
    #[must_use]
    pub fn parts(&self) -> &[i64] {
        &self.parts
    }

    /// Consumes the result and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> Vec<i64> {
        self.parts
    }

    /// Whether per-part bounds were sacrificed to keep the exact sum.
    #[must_use]
    pub const fn is_approximate(&self) -> bool {
        self.is_approximate
    }

    /// Bound relaxation applied before generation, if any.
    #[must_use]
    pub const fn adjustment(&self) -> Option<BoundAdjustment> {
        self.adjustment
    }

    /// Number of generation attempts consumed.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Sum of all parts.
    #[must_use]
    pub fn sum(&self) -> i64 {
        self.parts.iter().sum()
    }

    /// Non-fatal adjustments a caller should be shown.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Some(adjustment) = self.adjustment {
            notices.push(Notice::BoundRelaxed(adjustment));
        }
        if self.is_approximate {
            notices.push(Notice::ApproximateFallback {
                attempts: self.attempts,
            });
        }
        notices
    }
}

/// A calendar month within a specific year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarMonth {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl CalendarMonth {
    /// Creates the month `month` (one-based) of `year`.
    pub fn new(year: i32, month: u32) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidCalendarMonth { year, month };
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;
        Ok(Self {
            first_day,
            last_day,
        })
    }

    /// Parses an English month name such as `"March"` or `"mar"`.
    pub fn from_name(year: i32, name: &str) -> Result<Self, ConfigError> {
        let month: chrono::Month = name
            .trim()
            .parse()
            .map_err(|_| ConfigError::UnknownMonth(name.to_owned()))?;
        Self::new(year, month.number_from_month())
    }

    /// Calendar year of the month.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// One-based month number.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    /// First day of the month.
    #[must_use]
    pub const fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Last day of the month.
    #[must_use]
    pub const fn last_day(&self) -> NaiveDate {
        self.last_day
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day.format("%B %Y"))
    }
}

/// Request for an ordered run of dates inside a month window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateSequenceRequest {
    window_start: CalendarMonth,
    window_end: CalendarMonth,
    count: u32,
    min_gap_days: u32,
    max_gap_days: u32,
}

impl DateSequenceRequest {
    /// Creates a request after checking its static constraints.
    ///
    /// A maximum gap that does not exceed the minimum is accepted here and
    /// coerced by the sequencer.
    pub fn new(
        window_start: CalendarMonth,
        window_end: CalendarMonth,
        count: u32,
        min_gap_days: u32,
        max_gap_days: u32,
    ) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroCount("date count"));
        }
        if min_gap_days == 0 {
            return Err(ConfigError::ZeroCount("minimum gap days"));
        }
        if window_end < window_start {
            return Err(ConfigError::ReversedWindow {
                start: window_start,
                end: window_end,
            });
        }

        Ok(Self {
            window_start,
            window_end,
            count,
            min_gap_days,
            max_gap_days,
        })
    }

    /// First month of the window.
    #[must_use]
    pub const fn window_start(&self) -> CalendarMonth {
        self.window_start
    }

    /// Last month of the window, inclusive of its final day.
    #[must_use]
    pub const fn window_end(&self) -> CalendarMonth {
        self.window_end
    }

    /// Number of dates requested.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Minimum distance between consecutive dates.
    #[must_use]
    pub const fn min_gap_days(&self) -> u32 {
        self.min_gap_days
    }

    /// Requested maximum distance between consecutive dates.
    #[must_use]
    pub const fn max_gap_days(&self) -> u32 {
        self.max_gap_days
    }

    /// Days between the first day of the start month and the last day of the end month.
    #[must_use]
    pub fn window_days(&self) -> i64 {
        (self.window_end.last_day() - self.window_start.first_day()).num_days()
    }
}

/// Successfully sequenced dates together with the adjustments made on the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateSequence {
    dates: Vec<NaiveDate>,
    notices: Vec<Notice>,
}

impl DateSequence {
    /// Creates a sequence from strictly increasing dates.
    #[must_use]
    pub fn new(dates: Vec<NaiveDate>, notices: Vec<Notice>) -> Self {
        debug_assert!(
            dates.windows(2).all(|pair| pair[0] < pair[1]),
            "date sequences must be strictly increasing"
        );
        Self { dates, notices }
    }

    /// Dates in ascending order.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Adjustments applied while sequencing.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Consumes the sequence and returns its dates.
    #[must_use]
    pub fn into_dates(self) -> Vec<NaiveDate> {
        self.dates
    }
}

/// Failure signal returned when a window cannot hold the requested dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error(
    "date window spans {available_days} days but {count} dates at a {min_gap_days}-day minimum gap need {required_days}"
)]
pub struct WindowTooShort {
    count: u32,
    min_gap_days: u32,
    required_days: i64,
    available_days: i64,
}

impl WindowTooShort {
    /// Creates a failure signal for `request` given the days it needed.
    #[must_use]
    pub fn new(request: &DateSequenceRequest, required_days: i64) -> Self {
        Self {
            count: request.count(),
            min_gap_days: request.min_gap_days(),
            required_days,
            available_days: request.window_days(),
        }
    }

    /// Days the requested spacing needs.
    #[must_use]
    pub const fn required_days(&self) -> i64 {
        self.required_days
    }

    /// Days the window offers.
    #[must_use]
    pub const fn available_days(&self) -> i64 {
        self.available_days
    }
}

/// Non-fatal adjustment made while planning a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A per-part bound was relaxed so the total stays reachable.
    BoundRelaxed(BoundAdjustment),
    /// Allocation retries ran out and an equal split was used instead.
    ApproximateFallback {
        /// Attempts made before falling back.
        attempts: u32,
    },
    /// The maximum gap did not exceed the minimum and was widened.
    MaxGapCoerced {
        /// Maximum gap as configured.
        requested: u32,
        /// Maximum gap actually used.
        coerced: u32,
    },
    /// Randomized spacing fell short and even spacing was used instead.
    EvenSpacingFallback {
        /// Dates the randomized pass produced.
        produced: u32,
        /// Dates requested.
        requested: u32,
    },
    /// Dates closer than the minimum gap were pushed forward.
    GapsRepaired {
        /// Number of dates moved.
        count: u32,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoundRelaxed(adjustment) => write!(f, "{adjustment}"),
            Self::ApproximateFallback { attempts } => write!(
                f,
                "no split satisfied the bounds after {attempts} attempts; amounts were approximated with an equal split"
            ),
            Self::MaxGapCoerced { requested, coerced } => write!(
                f,
                "maximum gap of {requested} days did not exceed the minimum; using {coerced} days"
            ),
            Self::EvenSpacingFallback {
                produced,
                requested,
            } => write!(
                f,
                "random spacing placed {produced} of {requested} dates; dates were spaced evenly instead"
            ),
            Self::GapsRepaired { count } => {
                write!(f, "{count} dates were pushed forward to honour the minimum gap")
            }
        }
    }
}

/// An amount paired with the date it is issued on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedAmount {
    date: NaiveDate,
    amount: i64,
}

impl DatedAmount {
    /// Pairs `amount` with `date`.
    #[must_use]
    pub const fn new(date: NaiveDate, amount: i64) -> Self {
        Self { date, amount }
    }

    /// Issue date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Amount in whole currency units.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.amount
    }
}

/// Synthetic identifiers printed on a slip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipIdentifiers {
    /// Receipt number drawn from the run's receipt sequence.
    pub receipt_number: String,
    /// Forecourt controller identifier.
    pub fcc_id: String,
    /// Fuel intake point identifier.
    pub fip_id: String,
    /// Nozzle identifier.
    pub nozzle_id: String,
}

/// Fields shared by every slip in a run, already normalised for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipParticulars {
    /// Fuel dispensed.
    pub fuel_type: FuelType,
    /// Vehicle category.
    pub vehicle_type: String,
    /// Uppercase vehicle registration, possibly empty.
    pub vehicle_number: String,
    /// Uppercase customer name, possibly empty.
    pub customer_name: String,
    /// Station name printed in the slip header.
    pub station_name: String,
    /// Station address, possibly empty.
    pub station_address: String,
    /// Helpline number.
    pub tele_number: String,
}

/// Unit price and dispensed quantity derived for a slip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// Price per unit rounded to two decimals.
    pub rate: f64,
    /// Quantity dispensed, `amount / rate` rounded to two decimals.
    pub quantity: f64,
}

/// Fully enriched slip handed to the form-filling collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipRecord {
    date: NaiveDate,
    display_date: String,
    amount: i64,
    #[serde(flatten)]
    pricing: Pricing,
    #[serde(flatten)]
    identifiers: SlipIdentifiers,
    #[serde(flatten)]
    particulars: SlipParticulars,
}

impl SlipRecord {
    /// Assembles a slip from its paired amount and derived fields.
    #[must_use]
    pub fn new(
        pair: DatedAmount,
        display_date: String,
        pricing: Pricing,
        identifiers: SlipIdentifiers,
        particulars: SlipParticulars,
    ) -> Self {
        Self {
            date: pair.date(),
            display_date,
            amount: pair.amount(),
            pricing,
            identifiers,
            particulars,
        }
    }

    /// Issue date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Issue date formatted for display.
    #[must_use]
    pub fn display_date(&self) -> &str {
        &self.display_date
    }

    /// Amount in whole currency units.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.amount
    }

    /// Price per unit.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.pricing.rate
    }

    /// Quantity dispensed.
    #[must_use]
    pub const fn quantity(&self) -> f64 {
        self.pricing.quantity
    }

    /// Synthetic identifiers.
    #[must_use]
    pub const fn identifiers(&self) -> &SlipIdentifiers {
        &self.identifiers
    }

    /// Run-wide display fields.
    #[must_use]
    pub const fn particulars(&self) -> &SlipParticulars {
        &self.particulars
    }
}
