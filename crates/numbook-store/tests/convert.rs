use numbook_core::{ContactName, OutputBase, PerFileLimit, PhoneRules};
use numbook_store::{run_conversion, ConversionJob};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn job(temp: &TempDir, per_file: usize) -> ConversionJob {
    let input_dir = temp.path().join("in");
    let output_dir = temp.path().join("out");
    fs::create_dir_all(&input_dir).expect("mkdir in");
    fs::create_dir_all(&output_dir).expect("mkdir out");
    ConversionJob {
        input_dir,
        output_dir,
        contact_name: ContactName::new("Budi Santoso").expect("name"),
        output_base: OutputBase::new("Kontak").expect("base"),
        per_file: PerFileLimit::new(per_file).expect("limit"),
        rules: PhoneRules::default(),
    }
}

fn card_names(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read card file")
        .split("\r\n")
        .filter_map(|line| line.strip_prefix("FN:"))
        .map(str::to_string)
        .collect()
}

#[test]
fn conversion_writes_numbered_cards_across_files() {
    let temp = TempDir::new().expect("tempdir");
    let job = job(&temp, 2);
    let lines: Vec<String> = (1..=12).map(|idx| format!("0811 000 {idx:04}")).collect();
    fs::write(job.input_dir.join("numbers.txt"), lines.join("\n")).expect("write source");

    let report = run_conversion(&job).expect("convert");
    assert_eq!(report.total, 12);
    assert_eq!(report.invalid, 0);
    assert_eq!(report.files.len(), 6);
    assert_eq!(report.files[0], job.output_dir.join("Kontak 1.vcf"));

    assert_eq!(
        card_names(&report.files[0]),
        vec!["Budi Santoso 01", "Budi Santoso 02"]
    );
    assert_eq!(
        card_names(&report.files[5]),
        vec!["Budi Santoso 11", "Budi Santoso 12"]
    );

    let data = fs::read_to_string(&report.files[0]).expect("read");
    assert!(data.starts_with(
        "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Budi Santoso 01\r\nN:Santoso 01;Budi;;;\r\nUID:"
    ));
    assert!(data.contains("TEL;TYPE=CELL:+62 8110 000001\r\nEND:VCARD\r\n\r\n"));
    assert_eq!(data.matches("BEGIN:VCARD").count(), 2);
}

#[test]
fn conversion_without_valid_numbers_writes_nothing() {
    let temp = TempDir::new().expect("tempdir");
    let job = job(&temp, 2);
    fs::write(job.input_dir.join("numbers.txt"), "nothing here\n\n").expect("write source");

    let report = run_conversion(&job).expect("convert");
    assert!(!report.has_contacts());
    assert_eq!(report.invalid, 2);
    assert!(report.files.is_empty());
    assert_eq!(fs::read_dir(&job.output_dir).expect("read out").count(), 0);
}

#[test]
fn conversion_overwrites_conflicting_files_and_sweeps_temporaries() {
    let temp = TempDir::new().expect("tempdir");
    let job = job(&temp, 5);
    fs::write(job.input_dir.join("numbers.txt"), "0811 111 1111\n").expect("write source");
    fs::write(job.output_dir.join("Kontak 1.vcf"), "stale").expect("seed");
    fs::write(job.output_dir.join(".numbook-x1y2z3.tmp"), "orphan").expect("orphan");

    let report = run_conversion(&job).expect("convert");
    assert_eq!(report.overwritten, vec![job.output_dir.join("Kontak 1.vcf")]);
    let data = fs::read_to_string(job.output_dir.join("Kontak 1.vcf")).expect("read");
    assert!(data.contains("FN:Budi Santoso 1\r\n"));
    assert!(!job.output_dir.join(".numbook-x1y2z3.tmp").exists());
}

#[test]
fn conversion_fails_when_output_dir_vanished() {
    let temp = TempDir::new().expect("tempdir");
    let job = job(&temp, 5);
    fs::write(job.input_dir.join("numbers.txt"), "0811 111 1111\n").expect("write source");
    fs::remove_dir_all(&job.output_dir).expect("remove out");

    assert!(run_conversion(&job).is_err());
    assert!(!job.output_dir.exists());
}
