use crate::infra::TracingCacheInvalidator;
use chrono::Utc;
use clap::Args;
use std::fmt::Write as _;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tikrar_pairing::config::{AppConfig, PairingConfig};
use tikrar_pairing::error::AppError;
use tikrar_pairing::workflows::cohort::{CohortCsvImporter, CohortId, MemberId};
use tikrar_pairing::workflows::pairing::{BulkAllocationReport, PairingService};
use tikrar_pairing::workflows::store::InMemoryCohortStore;

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// Cohort roster CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Cohort id the roster belongs to
    #[arg(long)]
    pub(crate) cohort: String,
    /// Shuffle seed; overrides APP_PAIRING_SEED
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Actor recorded as the creator of every pairing
    #[arg(long, default_value = "cli")]
    pub(crate) actor: String,
}

pub(crate) fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let mut pairing = AppConfig::load()?.pairing;
    if args.seed.is_some() {
        pairing.shuffle_seed = args.seed;
    }

    let file = std::fs::File::open(&args.csv)?;
    let report = allocate_from_reader(
        file,
        &CohortId::new(args.cohort),
        &MemberId::new(args.actor),
        pairing,
    )?;
    print!("{}", format_allocation_report(&report));
    Ok(())
}

pub(crate) fn allocate_from_reader<R: Read>(
    reader: R,
    cohort_id: &CohortId,
    actor: &MemberId,
    config: PairingConfig,
) -> Result<BulkAllocationReport, AppError> {
    let seed = CohortCsvImporter::from_reader(reader, cohort_id, Utc::now())?;
    let store = Arc::new(InMemoryCohortStore::new());
    store
        .seed_cohort(seed)
        .map_err(|err| AppError::Pairing(err.into()))?;

    let service = PairingService::new(store, Arc::new(TracingCacheInvalidator), config);
    Ok(service.run_bulk_allocation(cohort_id, actor)?)
}

pub(crate) fn format_allocation_report(report: &BulkAllocationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Bulk allocation for cohort {}", report.cohort_id);
    let _ = writeln!(
        out,
        "Pairs created: {} | Members left unpaired: {}",
        report.paired_count, report.unpaired_count
    );

    if !report.analysis.is_empty() {
        let _ = writeln!(out, "\nPairs");
        for row in &report.analysis {
            let outcome = match (&row.pairing_id, &row.error) {
                (Some(id), _) => id.to_string(),
                (None, Some(error)) => format!("not saved: {error}"),
                (None, None) => "not saved".to_string(),
            };
            let _ = writeln!(
                out,
                "- {} & {} | score {} | {} | {}",
                row.first_name, row.second_name, row.score, row.match_type, outcome
            );
        }
    }

    if report.unpaired.is_empty() {
        let _ = writeln!(out, "\nUnpaired: none");
    } else {
        let unpaired: Vec<&str> = report.unpaired.iter().map(MemberId::as_str).collect();
        let _ = writeln!(out, "\nUnpaired: {}", unpaired.join(", "));
    }

    out
}
