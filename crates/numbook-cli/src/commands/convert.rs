use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use anyhow::{Context as _, Result};
use clap::Args;
use numbook_core::{ContactName, OutputBase, PerFileLimit};
use numbook_store::{run_conversion, ConversionJob};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Directory holding the .txt source files
    pub input: PathBuf,
    /// Directory receiving the .vcf files
    #[arg(long)]
    pub out: PathBuf,
    /// Base contact name; contacts become "<name> 1", "<name> 2", ...
    #[arg(long)]
    pub name: String,
    /// Base file name; files become "<base> 1.vcf", "<base> 2.vcf", ...
    #[arg(long)]
    pub base: String,
    /// Maximum number of contacts per file
    #[arg(long)]
    pub per_file: String,
}

pub fn convert(ctx: &Context<'_>, args: ConvertArgs) -> Result<()> {
    let contact_name = ContactName::new(&args.name).with_context(|| "parse contact name")?;
    let output_base = OutputBase::new(&args.base).with_context(|| "parse output file name")?;
    let per_file =
        PerFileLimit::parse(&args.per_file).with_context(|| "parse contacts per file")?;

    if !args.input.is_dir() {
        return Err(not_found(format!(
            "input directory {}",
            args.input.display()
        )));
    }
    fs::create_dir_all(&args.out)
        .with_context(|| format!("create output directory {}", args.out.display()))?;
    debug!(
        input = %args.input.display(),
        output = %args.out.display(),
        per_file = %per_file,
        "converting directory"
    );

    let job = ConversionJob {
        input_dir: args.input,
        output_dir: args.out,
        contact_name,
        output_base,
        per_file,
        rules: ctx.rules.clone(),
    };
    let report = run_conversion(&job)
        .with_context(|| format!("convert {}", job.input_dir.display()))?;
    if !report.has_contacts() {
        return Err(invalid_input(format!(
            "no valid phone numbers in {} ({} line(s) skipped)",
            job.input_dir.display(),
            report.invalid
        )));
    }
    info!(
        total = report.total,
        invalid = report.invalid,
        files = report.files.len(),
        "conversion finished"
    );

    if ctx.json {
        return print_json(&report);
    }

    println!("Valid contacts: {}", report.total);
    println!("Skipped lines (invalid): {}", report.invalid);
    for path in &report.files {
        println!("Wrote {}", path.display());
    }
    if !report.overwritten.is_empty() {
        println!("Overwritten files: {}", report.overwritten.len());
    }
    Ok(())
}
