use std::num::NonZeroUsize;

use fuel_slips_batch::{receipts_for, PlanError, Planner, SeedContext, SlipJob};
use fuel_slips_core::{
    AdjustmentKind, FuelType, GenerationConfig, Notice, OilCompany, PumpTemplate,
    DEFAULT_DATE_FORMAT,
};
use fuel_slips_system_allocation::AllocationEngine;
use fuel_slips_system_enrichment::ReceiptSequence;

fn config() -> GenerationConfig {
    GenerationConfig {
        total_amount: 25_000,
        slip_count: 10,
        min_slip_count: None,
        min_amount: 1_500,
        max_amount: 3_500,
        from_month: "January".to_owned(),
        from_year: 2024,
        to_month: "December".to_owned(),
        to_year: 2024,
        min_gap_days: 5,
        max_gap_days: 25,
        approx_rate: 96.72,
        oil_company: OilCompany::IndianOil,
        fuel_type: FuelType::Petrol,
        pump_template: PumpTemplate::Template2,
        customer_name: "ravi kumar".to_owned(),
        station_address: "Ring Road, Delhi".to_owned(),
        vehicle_number: "dl3c ab 1234".to_owned(),
        seed: Some(2024),
        receipt_start: Some(1_000),
        date_format: DEFAULT_DATE_FORMAT.to_owned(),
        take_debug_screenshots: true,
    }
}

fn run(config: &GenerationConfig, seed: u64) -> Result<fuel_slips_batch::SlipBatch, PlanError> {
    let validated = config.validate()?;
    let mut planner = Planner::default();
    let plan = planner.plan_amounts(&validated, SeedContext::new(seed))?;
    plan.enrich(&validated, &mut receipts_for(&validated))
}

#[test]
fn batch_sums_to_total_with_consecutive_receipts() {
    let batch = run(&config(), 11).expect("batch plans");

    assert_eq!(batch.len(), 10);
    assert_eq!(batch.total_amount(), 25_000);
    assert!(!batch.is_approximate());
    assert!(batch.notices().is_empty());

    let receipts: Vec<String> = batch
        .iter()
        .map(|record| record.identifiers().receipt_number.clone())
        .collect();
    let expected: Vec<String> = (1_000..1_010).map(|n| format!("RCPT{n}")).collect();
    assert_eq!(receipts, expected);

    for window in batch.records().windows(2) {
        assert!(window[0].date() < window[1].date());
    }
    for record in &batch {
        assert!((1_500..=3_500).contains(&record.amount()));
    }
}

#[test]
fn identical_seeds_replay_identical_batches() {
    let first = run(&config(), 0xbeef).expect("batch plans");
    let second = run(&config(), 0xbeef).expect("batch plans");

    assert_eq!(first, second, "batch diverged between runs");
    assert_eq!(first.master_seed(), 0xbeef);
}

#[test]
fn plan_is_reviewable_before_enrichment() {
    let validated = config().validate().expect("config validates");
    let mut planner = Planner::default();
    let plan = planner
        .plan_amounts(&validated, SeedContext::new(3))
        .expect("plan");

    assert_eq!(plan.pairs().len(), 10);
    assert_eq!(plan.allocation().sum(), 25_000);
    assert_eq!(plan.seeds().master_seed(), 3);

    let pairs = plan.pairs().to_vec();
    let mut receipts = ReceiptSequence::starting_at(1);
    let batch = plan.enrich(&validated, &mut receipts).expect("enrich");
    let enriched: Vec<(chrono::NaiveDate, i64)> = batch
        .iter()
        .map(|record| (record.date(), record.amount()))
        .collect();
    let planned: Vec<(chrono::NaiveDate, i64)> = pairs
        .iter()
        .map(|pair| (pair.date(), pair.amount()))
        .collect();
    assert_eq!(enriched, planned);
    assert_eq!(receipts.peek(), 11);
}

#[test]
fn unreachable_total_relaxes_bounds_and_stays_exact() {
    let mut config = config();
    config.total_amount = 5_000;
    config.min_amount = 1_000;
    config.max_amount = 2_000;

    let batch = run(&config, 1).expect("batch plans");

    assert!(!batch.is_approximate());
    assert_eq!(batch.total_amount(), 5_000);
    assert!(batch.iter().all(|record| record.amount() == 500));
    match batch.notices() {
        [Notice::BoundRelaxed(adjustment)] => {
            assert_eq!(adjustment.kind(), AdjustmentKind::LoweredMinimum);
            assert_eq!(adjustment.adjusted(), 500);
        }
        other => panic!("unexpected notices {other:?}"),
    }
}

#[test]
fn exhausted_attempts_mark_the_batch_approximate() {
    let validated = config().validate().expect("config validates");
    let mut planner = Planner::new(AllocationEngine::new(0));
    let plan = planner
        .plan_amounts(&validated, SeedContext::new(4))
        .expect("plan");

    assert!(plan.allocation().is_approximate());
    assert_eq!(plan.notices(), &[Notice::ApproximateFallback { attempts: 0 }]);

    let batch = plan
        .enrich(&validated, &mut ReceiptSequence::starting_at(1))
        .expect("enrich");
    assert!(batch.is_approximate());
    assert!(batch.iter().all(|record| record.amount() == 2_500));
}

#[test]
fn short_window_stops_the_run() {
    let mut config = config();
    config.to_month = "January".to_owned();

    match run(&config, 5) {
        Err(PlanError::WindowTooShort(failure)) => {
            assert_eq!(failure.required_days(), 45);
            assert_eq!(failure.available_days(), 30);
        }
        other => panic!("expected a window failure, got {other:?}"),
    }
}

#[test]
fn invalid_configuration_is_reported() {
    let mut config = config();
    config.max_amount = config.min_amount;

    assert!(matches!(run(&config, 0), Err(PlanError::Config(_))));
}

#[test]
fn partition_covers_the_batch_in_order() {
    let batch = run(&config(), 8).expect("batch plans");
    let slices = batch.partition(NonZeroUsize::new(4).expect("non-zero"));

    let sizes: Vec<usize> = slices.iter().map(|slice| slice.job.records.len()).collect();
    assert_eq!(sizes, [3, 3, 2, 2]);
    for (index, slice) in slices.iter().enumerate() {
        assert_eq!(slice.index, index);
        assert_eq!(slice.workers, 4);
        assert_eq!(slice.job.settings, batch.settings());
    }

    let rejoined: Vec<_> = slices
        .into_iter()
        .flat_map(|slice| slice.job.records)
        .collect();
    assert_eq!(rejoined.as_slice(), batch.records());
}

#[test]
fn surplus_workers_receive_no_slice() {
    let mut config = config();
    config.slip_count = 3;
    config.total_amount = 7_500;

    let batch = run(&config, 9).expect("batch plans");
    let slices = batch.partition(NonZeroUsize::new(8).expect("non-zero"));

    assert_eq!(slices.len(), 3);
    assert!(slices.iter().all(|slice| slice.job.records.len() == 1));
    assert!(slices.iter().all(|slice| slice.workers == 3));
}

#[test]
fn job_serialises_for_the_form_collaborator() {
    let batch = run(&config(), 21).expect("batch plans");
    let json = serde_json::to_value(batch.job()).expect("serialise job");

    assert_eq!(json["settings"]["pumpTemplate"], "template-2");
    assert_eq!(json["settings"]["oilCompany"], "Indian Oil");
    assert_eq!(json["settings"]["takeDebugScreenshots"], true);
    let first = &json["records"][0];
    assert_eq!(first["receiptNumber"], "RCPT1000");
    assert_eq!(first["stationName"], "Indian Oil Petrol Pump");
    assert_eq!(first["vehicleNumber"], "DL3C AB 1234");

    let decoded: SlipJob = serde_json::from_value(json).expect("deserialise job");
    assert_eq!(decoded, batch.job());
}
