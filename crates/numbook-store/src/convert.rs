use crate::error::Result;
use crate::plan::{plan_outputs, OutputPlan};
use crate::vcf::{label_batch, remove_temp_files, write_cards};
use numbook_core::{ContactLabeler, ContactName, OutputBase, PerFileLimit, PhoneRules};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub contact_name: ContactName,
    pub output_base: OutputBase,
    pub per_file: PerFileLimit,
    pub rules: PhoneRules,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    pub total: usize,
    pub invalid: usize,
    /// Card files written, in batch order.
    pub files: Vec<PathBuf>,
    /// Files that existed before the run and were replaced.
    pub overwritten: Vec<PathBuf>,
}

impl ConversionReport {
    pub fn has_contacts(&self) -> bool {
        self.total > 0
    }
}

/// Plans and writes every batch. Stops at the first failed write; files already
/// renamed into place stay complete.
pub fn run_conversion(job: &ConversionJob) -> Result<ConversionReport> {
    let plan = plan_outputs(
        &job.input_dir,
        &job.output_dir,
        &job.output_base,
        job.per_file,
        &job.rules,
    )?;
    write_plan(job, plan)
}

fn write_plan(job: &ConversionJob, plan: OutputPlan) -> Result<ConversionReport> {
    let mut report = ConversionReport {
        total: plan.total,
        invalid: plan.invalid,
        files: Vec::with_capacity(plan.batches.len()),
        overwritten: plan.conflicts.into_iter().collect(),
    };
    if plan.total == 0 {
        return Ok(report);
    }

    remove_temp_files(&job.output_dir)?;
    let mut labeler = ContactLabeler::new(job.contact_name.as_str(), plan.total);
    for planned in plan.batches {
        let cards = label_batch(&planned.batch, &mut labeler);
        write_cards(&planned.path, &cards)?;
        report.files.push(planned.path);
    }
    Ok(report)
}
