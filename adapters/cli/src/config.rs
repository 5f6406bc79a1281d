use std::{fs, path::Path};

use anyhow::{Context, Result};
use fuel_slips_core::GenerationConfig;

/// Reads and parses the TOML run configuration at `path`.
pub(crate) fn load_config(path: &Path) -> Result<GenerationConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    parse_config(&contents)
        .with_context(|| format!("failed to parse configuration {}", path.display()))
}

fn parse_config(contents: &str) -> Result<GenerationConfig> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuel_slips_core::{FuelType, OilCompany, PumpTemplate};

    const SAMPLE: &str = r#"
total_amount = 42000
slip_count = 14
min_amount = 2000
max_amount = 4000
from_month = "April"
from_year = 2024
to_month = "March"
to_year = 2025
approx_rate = 94.72
oil_company = "HP Oil"
fuel_type = "CNG"
pump_template = "template-3"
customer_name = "meera iyer"
seed = 99
"#;

    #[test]
    fn sample_configuration_parses_with_defaults() {
        let config = parse_config(SAMPLE).expect("sample parses");

        assert_eq!(config.total_amount, 42_000);
        assert_eq!(config.oil_company, OilCompany::HpOil);
        assert_eq!(config.fuel_type, FuelType::Cng);
        assert_eq!(config.pump_template, PumpTemplate::Template3);
        assert_eq!(config.min_gap_days, 5);
        assert_eq!(config.max_gap_days, 25);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.receipt_start, None);

        let validated = config.validate().expect("sample validates");
        assert_eq!(validated.allocation().min_strict_count(), 14);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let sample = format!("{SAMPLE}\nslips_per_day = 3\n");
        assert!(parse_config(&sample).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = load_config(Path::new("/nonexistent/fuel-slips.toml"))
            .expect_err("file does not exist");
        assert!(format!("{error:#}").contains("/nonexistent/fuel-slips.toml"));
    }
}
