//! Run configuration as supplied by a configuration source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    validate_approx_rate, validate_date_format, AllocationRequest, CalendarMonth, ConfigError,
    DateSequenceRequest, DEFAULT_DATE_FORMAT, DEFAULT_MAX_GAP_DAYS, DEFAULT_MIN_GAP_DAYS,
};

/// Oil company whose branding appears on the slips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OilCompany {
    /// Bharat Petroleum.
    #[serde(rename = "Bharat Petroleum")]
    BharatPetroleum,
    /// Indian Oil.
    #[serde(rename = "Indian Oil")]
    IndianOil,
    /// Hindustan Petroleum.
    #[serde(rename = "HP Oil")]
    HpOil,
    /// Essar Oil.
    #[serde(rename = "Essar Oil")]
    EssarOil,
}

impl OilCompany {
    /// Name printed on the slip.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::BharatPetroleum => "Bharat Petroleum",
            Self::IndianOil => "Indian Oil",
            Self::HpOil => "HP Oil",
            Self::EssarOil => "Essar Oil",
        }
    }
}

impl fmt::Display for OilCompany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Fuel dispensed on the slips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    /// Petrol.
    Petrol,
    /// Diesel.
    Diesel,
    /// Compressed natural gas.
    #[serde(rename = "CNG")]
    Cng,
}

impl FuelType {
    /// Name printed on the slip.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Petrol => "Petrol",
            Self::Diesel => "Diesel",
            Self::Cng => "CNG",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Visual template the form collaborator selects before filling a slip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PumpTemplate {
    /// First template.
    #[default]
    #[serde(rename = "template-1")]
    Template1,
    /// Second template.
    #[serde(rename = "template-2")]
    Template2,
    /// Third template.
    #[serde(rename = "template-3")]
    Template3,
    /// Fourth template.
    #[serde(rename = "template-4")]
    Template4,
}

fn default_min_gap_days() -> u32 {
    DEFAULT_MIN_GAP_DAYS
}

fn default_max_gap_days() -> u32 {
    DEFAULT_MAX_GAP_DAYS
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_owned()
}

/// Raw run configuration, deserialised from a configuration source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Amount all slips must add up to.
    pub total_amount: i64,
    /// Number of slips to generate.
    pub slip_count: u32,
    /// Slips that must honour the original per-slip bounds; defaults to `slip_count`.
    #[serde(default)]
    pub min_slip_count: Option<u32>,
    /// Lower bound for a single slip amount.
    pub min_amount: i64,
    /// Upper bound for a single slip amount.
    pub max_amount: i64,
    /// English name of the first month of the date window.
    pub from_month: String,
    /// Year of the first month of the date window.
    pub from_year: i32,
    /// English name of the last month of the date window.
    pub to_month: String,
    /// Year of the last month of the date window.
    pub to_year: i32,
    /// Minimum days between consecutive slips.
    #[serde(default = "default_min_gap_days")]
    pub min_gap_days: u32,
    /// Preferred maximum days between consecutive slips.
    #[serde(default = "default_max_gap_days")]
    pub max_gap_days: u32,
    /// Approximate fuel price per unit.
    pub approx_rate: f64,
    /// Oil company branding.
    pub oil_company: OilCompany,
    /// Fuel dispensed.
    pub fuel_type: FuelType,
    /// Template selected on the form.
    #[serde(default)]
    pub pump_template: PumpTemplate,
    /// Customer name; empty to omit.
    #[serde(default)]
    pub customer_name: String,
    /// Station address; empty to omit.
    #[serde(default)]
    pub station_address: String,
    /// Vehicle registration; empty to omit.
    #[serde(default)]
    pub vehicle_number: String,
    /// Master seed; a fresh one is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// First receipt number; the wall clock is used when absent.
    #[serde(default)]
    pub receipt_start: Option<u64>,
    /// strftime pattern used to display slip dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Whether the form collaborator should capture debug screenshots.
    #[serde(default)]
    pub take_debug_screenshots: bool,
}

impl GenerationConfig {
    /// Checks every static constraint and builds the requests the systems consume.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        if self.total_amount <= 0 {
            return Err(ConfigError::NonPositiveTotal(self.total_amount));
        }
        if self.slip_count == 0 {
            return Err(ConfigError::ZeroCount("slip count"));
        }
        if self.min_amount <= 0 {
            return Err(ConfigError::NonPositiveBound {
                field: "minimum amount",
                value: self.min_amount,
            });
        }
        if self.max_amount <= self.min_amount {
            return Err(ConfigError::InvertedBounds {
                min: self.min_amount,
                max: self.max_amount,
            });
        }

        let strict = self.min_slip_count.unwrap_or(self.slip_count);
        if strict == 0 || strict > self.slip_count {
            return Err(ConfigError::StrictCountOutOfRange {
                strict,
                count: self.slip_count,
            });
        }

        validate_approx_rate(self.approx_rate)?;
        validate_date_format(&self.date_format)?;

        let allocation = AllocationRequest::new(
            self.total_amount,
            self.slip_count,
            self.min_amount,
            self.max_amount,
            strict,
        )?;
        let dates = DateSequenceRequest::new(
            CalendarMonth::from_name(self.from_year, &self.from_month)?,
            CalendarMonth::from_name(self.to_year, &self.to_month)?,
            self.slip_count,
            self.min_gap_days,
            self.max_gap_days,
        )?;

        Ok(ValidatedConfig {
            allocation,
            dates,
            approx_rate: self.approx_rate,
            oil_company: self.oil_company,
            fuel_type: self.fuel_type,
            pump_template: self.pump_template,
            customer_name: self.customer_name.clone(),
            station_address: self.station_address.clone(),
            vehicle_number: self.vehicle_number.clone(),
            seed: self.seed,
            receipt_start: self.receipt_start,
            date_format: self.date_format.clone(),
            take_debug_screenshots: self.take_debug_screenshots,
        })
    }
}

/// Configuration whose static constraints have been checked.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedConfig {
    allocation: AllocationRequest,
    dates: DateSequenceRequest,
    approx_rate: f64,
    oil_company: OilCompany,
    fuel_type: FuelType,
    pump_template: PumpTemplate,
    customer_name: String,
    station_address: String,
    vehicle_number: String,
    seed: Option<u64>,
    receipt_start: Option<u64>,
    date_format: String,
    take_debug_screenshots: bool,
}

impl ValidatedConfig {
    /// Allocation request derived from the amount settings.
    #[must_use]
    pub const fn allocation(&self) -> &AllocationRequest {
        &self.allocation
    }

    /// Date request derived from the window settings.
    #[must_use]
    pub const fn dates(&self) -> &DateSequenceRequest {
        &self.dates
    }

    /// Approximate fuel price per unit.
    #[must_use]
    pub const fn approx_rate(&self) -> f64 {
        self.approx_rate
    }

    /// Oil company branding.
    #[must_use]
    pub const fn oil_company(&self) -> OilCompany {
        self.oil_company
    }

    /// Fuel dispensed.
    #[must_use]
    pub const fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    /// Template selected on the form.
    #[must_use]
    pub const fn pump_template(&self) -> PumpTemplate {
        self.pump_template
    }

    /// Customer name as configured.
    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Station address as configured.
    #[must_use]
    pub fn station_address(&self) -> &str {
        &self.station_address
    }

    /// Vehicle registration as configured.
    #[must_use]
    pub fn vehicle_number(&self) -> &str {
        &self.vehicle_number
    }

    /// Master seed, if one was configured.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// First receipt number, if one was configured.
    #[must_use]
    pub const fn receipt_start(&self) -> Option<u64> {
        self.receipt_start
    }

    /// strftime pattern used to display slip dates.
    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Whether debug screenshots were requested.
    #[must_use]
    pub const fn take_debug_screenshots(&self) -> bool {
        self.take_debug_screenshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        total_amount = 10000
        slip_count = 4
        min_amount = 1500
        max_amount = 3500
        from_month = "January"
        from_year = 2024
        to_month = "December"
        to_year = 2024
        approx_rate = 94.5
        oil_company = "Indian Oil"
        fuel_type = "Petrol"
        pump_template = "template-2"
        customer_name = "ravi kumar"
    "#;

    fn sample() -> GenerationConfig {
        toml::from_str(SAMPLE).expect("sample config parses")
    }

    #[test]
    fn parses_and_applies_defaults() {
        let config = sample();
        assert_eq!(config.min_slip_count, None);
        assert_eq!(config.min_gap_days, DEFAULT_MIN_GAP_DAYS);
        assert_eq!(config.max_gap_days, DEFAULT_MAX_GAP_DAYS);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(config.oil_company, OilCompany::IndianOil);
        assert_eq!(config.pump_template, PumpTemplate::Template2);

        let validated = config.validate().expect("sample config validates");
        assert_eq!(validated.allocation().min_strict_count(), 4);
        assert_eq!(validated.dates().count(), 4);
        assert_eq!(validated.dates().window_days(), 365);
    }

    #[test]
    fn rejects_unknown_fields() {
        let with_extra = format!("{SAMPLE}\nbrowser_count = 3\n");
        assert!(toml::from_str::<GenerationConfig>(&with_extra).is_err());
    }

    #[test]
    fn rejects_max_not_above_min() {
        let mut config = sample();
        config.max_amount = config.min_amount;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedBounds {
                min: 1500,
                max: 1500
            })
        );
    }

    #[test]
    fn rejects_non_positive_total() {
        let mut config = sample();
        config.total_amount = 0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveTotal(0)));
    }

    #[test]
    fn rejects_strict_count_above_slip_count() {
        let mut config = sample();
        config.min_slip_count = Some(5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::StrictCountOutOfRange {
                strict: 5,
                count: 4
            })
        );
    }

    #[test]
    fn rejects_unknown_month_and_bad_rate() {
        let mut config = sample();
        config.to_month = "Decembruary".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownMonth(_))
        ));

        let mut config = sample();
        config.approx_rate = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveRate(_))
        ));

        let mut config = sample();
        config.approx_rate = 0.01;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveRate(0.01)));
    }

    #[test]
    fn rejects_date_format_with_time_of_day() {
        let mut config = sample();
        config.date_format = "%d/%m/%Y %H:%M".to_owned();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDateFormat("%d/%m/%Y %H:%M".to_owned()))
        );
    }
}
