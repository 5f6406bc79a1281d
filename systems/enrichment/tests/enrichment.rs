use chrono::NaiveDate;
use fuel_slips_core::{FuelType, GenerationConfig, OilCompany, PumpTemplate, DEFAULT_DATE_FORMAT};
use fuel_slips_system_enrichment::{pair, Enricher, ReceiptSequence};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn config() -> GenerationConfig {
    GenerationConfig {
        total_amount: 6_000,
        slip_count: 3,
        min_slip_count: None,
        min_amount: 1_000,
        max_amount: 3_000,
        from_month: "March".to_owned(),
        from_year: 2024,
        to_month: "May".to_owned(),
        to_year: 2024,
        min_gap_days: 5,
        max_gap_days: 25,
        approx_rate: 102.25,
        oil_company: OilCompany::BharatPetroleum,
        fuel_type: FuelType::Diesel,
        pump_template: PumpTemplate::Template3,
        customer_name: "  asha menon ".to_owned(),
        station_address: "MG Road, Pune".to_owned(),
        vehicle_number: "mh12ab1234".to_owned(),
        seed: Some(9),
        receipt_start: Some(500),
        date_format: DEFAULT_DATE_FORMAT.to_owned(),
        take_debug_screenshots: false,
    }
}

fn dates() -> Vec<NaiveDate> {
    vec![
        NaiveDate::from_ymd_opt(2024, 3, 4).expect("date"),
        NaiveDate::from_ymd_opt(2024, 3, 19).expect("date"),
        NaiveDate::from_ymd_opt(2024, 4, 7).expect("date"),
    ]
}

#[test]
fn pairs_amounts_with_dates_in_order() {
    let pairs = pair(&[1_800, 2_600, 1_600], &dates()).expect("equal lengths");

    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0].amount(), 1_800);
    assert_eq!(pairs[0].date(), dates()[0]);
    assert_eq!(pairs[2].amount(), 1_600);
    assert_eq!(pairs[2].date(), dates()[2]);
}

#[test]
fn enriched_slips_carry_normalised_fields() {
    let validated = config().validate().expect("config validates");
    let enricher = Enricher::from_config(&validated).expect("enricher");
    let pairs = pair(&[1_800, 2_600, 1_600], &dates()).expect("equal lengths");
    let mut receipts = ReceiptSequence::starting_at(500);
    let mut rng = ChaCha8Rng::seed_from_u64(77);

    let records = enricher.enrich(&pairs, &mut receipts, &mut rng);

    assert_eq!(records.len(), 3);
    let receipts_issued: Vec<&str> = records
        .iter()
        .map(|record| record.identifiers().receipt_number.as_str())
        .collect();
    assert_eq!(receipts_issued, ["RCPT500", "RCPT501", "RCPT502"]);
    assert_eq!(receipts.peek(), 503);

    let first = &records[0];
    assert_eq!(first.display_date(), "04/03/2024");
    assert_eq!(first.amount(), 1_800);
    assert!(first.rate() == 102.24 || first.rate() == 102.28);
    let expected_quantity = (1_800.0 / first.rate() * 100.0).round() / 100.0;
    assert_eq!(first.quantity(), expected_quantity);

    let particulars = first.particulars();
    assert_eq!(particulars.station_name, "Bharat Petroleum Diesel Pump");
    assert_eq!(particulars.customer_name, "ASHA MENON");
    assert_eq!(particulars.vehicle_number, "MH12AB1234");
    assert_eq!(particulars.vehicle_type, "Car");
    assert_eq!(particulars.tele_number, "1800-XXX-XXXX");
    assert_eq!(particulars.fuel_type, FuelType::Diesel);

    let identifiers = first.identifiers();
    assert!(identifiers.fcc_id.starts_with("FCC") && identifiers.fcc_id.len() == 9);
    assert!(identifiers.fip_id.starts_with("FIP") && identifiers.fip_id.len() == 7);
    assert!(identifiers.nozzle_id.starts_with('N') && identifiers.nozzle_id.len() == 3);
}

#[test]
fn identical_seeds_replay_identical_slips() {
    let validated = config().validate().expect("config validates");
    let enricher = Enricher::from_config(&validated).expect("enricher");
    let pairs = pair(&[1_800, 2_600, 1_600], &dates()).expect("equal lengths");

    let first = enricher.enrich(
        &pairs,
        &mut ReceiptSequence::starting_at(1),
        &mut ChaCha8Rng::seed_from_u64(5),
    );
    let second = enricher.enrich(
        &pairs,
        &mut ReceiptSequence::starting_at(1),
        &mut ChaCha8Rng::seed_from_u64(5),
    );

    assert_eq!(first, second, "enrichment diverged between runs");
}

#[test]
fn custom_date_format_is_applied() {
    let mut config = config();
    config.date_format = "%Y-%m-%d".to_owned();
    let validated = config.validate().expect("config validates");
    let enricher = Enricher::from_config(&validated).expect("enricher");
    let pairs = pair(&[2_000], &dates()[..1]).expect("equal lengths");

    let records = enricher.enrich(
        &pairs,
        &mut ReceiptSequence::starting_at(1),
        &mut ChaCha8Rng::seed_from_u64(0),
    );

    assert_eq!(records[0].display_date(), "2024-03-04");
}
