#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pairing of amounts with dates and derivation of the remaining slip fields.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use fuel_slips_core::{
    validate_approx_rate, validate_date_format, ConfigError, DatedAmount, Pricing,
    SlipIdentifiers, SlipParticulars, SlipRecord, ValidatedConfig, RATE_VARIATIONS, RECEIPT_PREFIX,
    TELE_NUMBER, VEHICLE_TYPE,
};
use rand::{distributions::Alphanumeric, Rng};
use tracing::debug;

/// Caller-owned source of consecutive receipt numbers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptSequence {
    next: u64,
}

impl ReceiptSequence {
    /// Starts the sequence at `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Starts the sequence at the current wall-clock time in milliseconds.
    #[must_use]
    pub fn from_clock() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self::starting_at(millis)
    }

    /// Number the next issued receipt will carry.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Issues the next receipt number.
    pub fn issue(&mut self) -> String {
        let number = self.next;
        self.next = self.next.saturating_add(1);
        format!("{RECEIPT_PREFIX}{number}")
    }
}

/// Raised when amounts and dates of different lengths are paired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot pair {amounts} amounts with {dates} dates")]
pub struct PairingError {
    amounts: usize,
    dates: usize,
}

/// Zips amounts with dates index for index.
pub fn pair(amounts: &[i64], dates: &[NaiveDate]) -> Result<Vec<DatedAmount>, PairingError> {
    if amounts.len() != dates.len() {
        return Err(PairingError {
            amounts: amounts.len(),
            dates: dates.len(),
        });
    }

    Ok(dates
        .iter()
        .zip(amounts)
        .map(|(date, amount)| DatedAmount::new(*date, *amount))
        .collect())
}

/// Draws a unit rate close to `approx_rate`, rounded to two decimals.
pub fn unit_rate<R>(approx_rate: f64, rng: &mut R) -> f64
where
    R: Rng + ?Sized,
{
    let variation = RATE_VARIATIONS[usize::from(rng.gen_bool(0.5))];
    round_to_cents(approx_rate + variation)
}

/// Quantity dispensed for `amount` at `rate`, rounded to two decimals.
#[must_use]
pub fn quantity_for(amount: i64, rate: f64) -> f64 {
    round_to_cents(amount as f64 / rate)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn random_code<R>(prefix: &str, length: usize, rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    let mut code = String::with_capacity(prefix.len() + length);
    code.push_str(prefix);
    code.extend((0..length).map(|_| char::from(rng.sample(Alphanumeric))));
    code
}

/// Derives per-slip fields for paired amounts.
#[derive(Clone, Debug, PartialEq)]
pub struct Enricher {
    approx_rate: f64,
    date_format: String,
    particulars: SlipParticulars,
}

impl Enricher {
    /// Creates an enricher after checking the rate and the date display format.
    pub fn new(
        approx_rate: f64,
        date_format: impl Into<String>,
        particulars: SlipParticulars,
    ) -> Result<Self, ConfigError> {
        validate_approx_rate(approx_rate)?;
        let date_format = date_format.into();
        validate_date_format(&date_format)?;
        Ok(Self {
            approx_rate,
            date_format,
            particulars,
        })
    }

    /// Builds an enricher whose run-wide fields come from `config`.
    pub fn from_config(config: &ValidatedConfig) -> Result<Self, ConfigError> {
        let particulars = SlipParticulars {
            fuel_type: config.fuel_type(),
            vehicle_type: VEHICLE_TYPE.to_owned(),
            vehicle_number: config.vehicle_number().trim().to_uppercase(),
            customer_name: config.customer_name().trim().to_uppercase(),
            station_name: format!("{} {} Pump", config.oil_company(), config.fuel_type()),
            station_address: config.station_address().trim().to_owned(),
            tele_number: TELE_NUMBER.to_owned(),
        };
        Self::new(config.approx_rate(), config.date_format(), particulars)
    }

    /// Run-wide fields attached to every slip.
    #[must_use]
    pub const fn particulars(&self) -> &SlipParticulars {
        &self.particulars
    }

    /// Enriches every pair in order, issuing one receipt number each.
    pub fn enrich<R>(
        &self,
        pairs: &[DatedAmount],
        receipts: &mut ReceiptSequence,
        rng: &mut R,
    ) -> Vec<SlipRecord>
    where
        R: Rng + ?Sized,
    {
        let records: Vec<SlipRecord> = pairs
            .iter()
            .map(|pair| self.enrich_one(*pair, receipts, rng))
            .collect();
        debug!(
            records = records.len(),
            next_receipt = receipts.peek(),
            "enriched slips"
        );
        records
    }

    /// Enriches a single pair.
    pub fn enrich_one<R>(
        &self,
        pair: DatedAmount,
        receipts: &mut ReceiptSequence,
        rng: &mut R,
    ) -> SlipRecord
    where
        R: Rng + ?Sized,
    {
        let rate = unit_rate(self.approx_rate, rng);
        let pricing = Pricing {
            rate,
            quantity: quantity_for(pair.amount(), rate),
        };
        let identifiers = SlipIdentifiers {
            receipt_number: receipts.issue(),
            fcc_id: random_code("FCC", 6, rng),
            fip_id: random_code("FIP", 4, rng),
            nozzle_id: random_code("N", 2, rng),
        };
        let display_date = pair.date().format(&self.date_format).to_string();

        SlipRecord::new(
            pair,
            display_date,
            pricing,
            identifiers,
            self.particulars.clone(),
        )
    }
}
