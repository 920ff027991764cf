use crate::error::{Result, StoreError};
use crate::sources::{list_source_files, parse_sources};
use numbook_core::{
    dedup_preserving_order, split_batches, Batch, CanonicalNumber, OutputBase, PerFileLimit,
    PhoneRules,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    pub batch: Batch,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPlan {
    pub batches: Vec<PlannedBatch>,
    /// Unique valid numbers across every batch.
    pub total: usize,
    /// Planned paths that already exist; they are overwritten, not skipped.
    pub conflicts: BTreeSet<PathBuf>,
    pub invalid: usize,
}

impl OutputPlan {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

pub fn plan_outputs(
    input_dir: &Path,
    output_dir: &Path,
    base: &OutputBase,
    per_file: PerFileLimit,
    rules: &PhoneRules,
) -> Result<OutputPlan> {
    let files = list_source_files(input_dir)?;
    if files.is_empty() {
        return Err(StoreError::InputAbsent(input_dir.to_path_buf()));
    }

    let parsed = parse_sources(&files, rules)?;
    let numbers = dedup_preserving_order(parsed.numbers);
    let total = numbers.len();
    if total == 0 {
        return Ok(OutputPlan {
            invalid: parsed.invalid,
            ..OutputPlan::default()
        });
    }

    let (batches, conflicts) = plan_batches(numbers, per_file, base, output_dir, Path::exists);
    Ok(OutputPlan {
        batches,
        total,
        conflicts,
        invalid: parsed.invalid,
    })
}

/// Chunks `numbers` and names each batch under `output_dir`. `exists` decides
/// which planned paths count as conflicts.
pub fn plan_batches<F>(
    numbers: Vec<CanonicalNumber>,
    per_file: PerFileLimit,
    base: &OutputBase,
    output_dir: &Path,
    exists: F,
) -> (Vec<PlannedBatch>, BTreeSet<PathBuf>)
where
    F: Fn(&Path) -> bool,
{
    let mut conflicts = BTreeSet::new();
    let batches = split_batches(numbers, per_file)
        .into_iter()
        .map(|batch| {
            let path = output_dir.join(batch.file_name(base.as_str()));
            if exists(&path) {
                conflicts.insert(path.clone());
            }
            PlannedBatch { batch, path }
        })
        .collect();
    (batches, conflicts)
}

#[cfg(test)]
mod tests {
    use super::plan_batches;
    use numbook_core::{OutputBase, PerFileLimit, PhoneRules};
    use std::path::Path;

    #[test]
    fn plan_batches_names_and_flags_without_touching_disk() {
        let rules = PhoneRules::default();
        let numbers = (1..=5)
            .filter_map(|n| rules.normalize(&format!("0811 {n}{n}{n} {n}{n}{n}{n}")))
            .collect::<Vec<_>>();
        assert_eq!(numbers.len(), 5);
        let base = OutputBase::new("Kontak").expect("base");
        let out = Path::new("/out");

        let (batches, conflicts) = plan_batches(
            numbers,
            PerFileLimit::new(2).expect("limit"),
            &base,
            out,
            |path| path.ends_with("Kontak 2.vcf"),
        );
        let sizes: Vec<usize> = batches.iter().map(|b| b.batch.numbers.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(batches[2].path, out.join("Kontak 3.vcf"));
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts.contains(&out.join("Kontak 2.vcf")));
    }
}
