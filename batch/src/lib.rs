#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative run state for a fuel slip batch.
//!
//! A run moves through two stages. [`Planner::plan_amounts`] allocates the
//! total, lays out dates and pairs them into an [`AmountPlan`] the operator
//! can review. [`AmountPlan::enrich`] then derives every remaining slip field
//! and yields the finished [`SlipBatch`], which is handed to rendering
//! workers whole or split into [`WorkerSlice`]s.

mod seeds;

use std::num::NonZeroUsize;

use fuel_slips_core::{
    AllocationResult, ConfigError, DatedAmount, Notice, OilCompany, PumpTemplate, SlipRecord,
    ValidatedConfig, WindowTooShort, RNG_STREAM_ALLOCATION, RNG_STREAM_DATES,
    RNG_STREAM_ENRICHMENT,
};
use fuel_slips_system_allocation::AllocationEngine;
use fuel_slips_system_date_sequencing::DateSequencer;
use fuel_slips_system_enrichment::{pair, Enricher, PairingError, ReceiptSequence};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use seeds::{derive_labeled_seed, SeedContext};

/// Errors that stop a run before a batch is produced.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The configuration could not be turned into requests.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The date window cannot hold the requested slips.
    #[error(transparent)]
    WindowTooShort(#[from] WindowTooShort),
    /// Amounts and dates disagreed in length.
    #[error(transparent)]
    Pairing(#[from] PairingError),
}

/// Runs the generation systems in order and owns their reusable state.
#[derive(Debug, Default)]
pub struct Planner {
    allocation: AllocationEngine,
    sequencer: DateSequencer,
}

impl Planner {
    /// Creates a planner around the provided allocation engine.
    #[must_use]
    pub fn new(allocation: AllocationEngine) -> Self {
        Self {
            allocation,
            sequencer: DateSequencer::new(),
        }
    }

    /// Allocates amounts, sequences dates and pairs them.
    pub fn plan_amounts(
        &mut self,
        config: &ValidatedConfig,
        seeds: SeedContext,
    ) -> Result<AmountPlan, PlanError> {
        let request = config.allocation();
        let allocation = self
            .allocation
            .allocate(request, &mut seeds.stream(RNG_STREAM_ALLOCATION));
        let sequence = self
            .sequencer
            .sequence(config.dates(), &mut seeds.stream(RNG_STREAM_DATES))?;

        let mut notices = allocation.notices();
        notices.extend_from_slice(sequence.notices());
        let pairs = pair(allocation.parts(), sequence.dates())?;

        info!(
            seed = seeds.master_seed(),
            slips = pairs.len(),
            total = allocation.sum(),
            approximate = allocation.is_approximate(),
            notices = notices.len(),
            "planned amounts"
        );

        Ok(AmountPlan {
            seeds,
            allocation,
            pairs,
            notices,
        })
    }
}

/// Amounts paired with dates, awaiting review before enrichment.
#[derive(Clone, Debug, PartialEq)]
pub struct AmountPlan {
    seeds: SeedContext,
    allocation: AllocationResult,
    pairs: Vec<DatedAmount>,
    notices: Vec<Notice>,
}

impl AmountPlan {
    /// Dated amounts in issue order.
    #[must_use]
    pub fn pairs(&self) -> &[DatedAmount] {
        &self.pairs
    }

    /// Adjustments made while planning.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Allocation the amounts came from.
    #[must_use]
    pub const fn allocation(&self) -> &AllocationResult {
        &self.allocation
    }

    /// Seeds the plan was drawn from.
    #[must_use]
    pub const fn seeds(&self) -> SeedContext {
        self.seeds
    }

    /// Derives every remaining slip field and finishes the batch.
    pub fn enrich(
        self,
        config: &ValidatedConfig,
        receipts: &mut ReceiptSequence,
    ) -> Result<SlipBatch, PlanError> {
        let enricher = Enricher::from_config(config)?;
        let first_receipt = receipts.peek();
        let records = enricher.enrich(
            &self.pairs,
            receipts,
            &mut self.seeds.stream(RNG_STREAM_ENRICHMENT),
        );

        info!(
            slips = records.len(),
            first_receipt,
            next_receipt = receipts.peek(),
            "enriched batch"
        );

        Ok(SlipBatch {
            master_seed: self.seeds.master_seed(),
            approximate: self.allocation.is_approximate(),
            settings: RenderSettings::from_config(config),
            records,
            notices: self.notices,
        })
    }
}

/// Receipt sequence a run should use: the configured start or the clock.
#[must_use]
pub fn receipts_for(config: &ValidatedConfig) -> ReceiptSequence {
    config
        .receipt_start()
        .map_or_else(ReceiptSequence::from_clock, ReceiptSequence::starting_at)
}

/// Run-wide settings the form-filling collaborator needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    /// Template selected before filling each slip.
    pub pump_template: PumpTemplate,
    /// Company whose branding is printed.
    pub oil_company: OilCompany,
    /// Whether intermediate screenshots are captured.
    pub take_debug_screenshots: bool,
}

impl RenderSettings {
    /// Extracts the rendering settings from `config`.
    #[must_use]
    pub const fn from_config(config: &ValidatedConfig) -> Self {
        Self {
            pump_template: config.pump_template(),
            oil_company: config.oil_company(),
            take_debug_screenshots: config.take_debug_screenshots(),
        }
    }
}

/// Ordered slips handed to the collaborator together with its settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipJob {
    /// Rendering settings.
    pub settings: RenderSettings,
    /// Slips in issue order.
    pub records: Vec<SlipRecord>,
}

/// Contiguous share of a batch assigned to one worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerSlice {
    /// Zero-based position of the slice.
    pub index: usize,
    /// Number of slices the batch was split into.
    pub workers: usize,
    /// Slips the worker renders.
    pub job: SlipJob,
}

/// Finished, in-order batch of slips computed ahead of rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct SlipBatch {
    master_seed: u64,
    approximate: bool,
    settings: RenderSettings,
    records: Vec<SlipRecord>,
    notices: Vec<Notice>,
}

impl SlipBatch {
    /// Slips in issue order.
    #[must_use]
    pub fn records(&self) -> &[SlipRecord] {
        &self.records
    }

    /// Iterates the slips in issue order.
    pub fn iter(&self) -> std::slice::Iter<'_, SlipRecord> {
        self.records.iter()
    }

    /// Number of slips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no slips.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all slip amounts.
    #[must_use]
    pub fn total_amount(&self) -> i64 {
        self.records.iter().map(SlipRecord::amount).sum()
    }

    /// Adjustments made while planning.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Seed that replays this batch.
    #[must_use]
    pub const fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Whether amounts came from the equal-split fallback.
    #[must_use]
    pub const fn is_approximate(&self) -> bool {
        self.approximate
    }

    /// Rendering settings shared by every slip.
    #[must_use]
    pub const fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// Whole batch as a single job.
    #[must_use]
    pub fn job(&self) -> SlipJob {
        SlipJob {
            settings: self.settings,
            records: self.records.clone(),
        }
    }

    /// Splits the batch into at most `workers` contiguous, non-empty slices.
    ///
    /// Earlier slices take one extra slip when the batch does not divide
    /// evenly.
    #[must_use]
    pub fn partition(&self, workers: NonZeroUsize) -> Vec<WorkerSlice> {
        let requested = workers.get();
        let slices = requested.min(self.records.len());
        if slices < requested {
            warn!(
                requested,
                slices, "fewer slips than workers; some workers stay idle"
            );
        }
        if slices == 0 {
            return Vec::new();
        }

        let base = self.records.len() / slices;
        let leftover = self.records.len() % slices;
        let mut start = 0;
        (0..slices)
            .map(|index| {
                let size = base + usize::from(index < leftover);
                let records = self.records[start..start + size].to_vec();
                start += size;
                WorkerSlice {
                    index,
                    workers: slices,
                    job: SlipJob {
                        settings: self.settings,
                        records,
                    },
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a SlipBatch {
    type Item = &'a SlipRecord;
    type IntoIter = std::slice::Iter<'a, SlipRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
