use crate::commands::{print_json, Context};
use crate::error::not_found;
use anyhow::{Context as _, Result};
use clap::Args;
use numbook_core::{dedup_preserving_order, CanonicalNumber};
use numbook_store::sources::parse_sources;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Text file with one number per line
    pub file: PathBuf,
    /// Keep only the first occurrence of each number
    #[arg(long)]
    pub unique: bool,
}

#[derive(Debug, Serialize)]
struct NormalizeReport {
    numbers: Vec<CanonicalNumber>,
    invalid: usize,
}

pub fn normalize(ctx: &Context<'_>, args: NormalizeArgs) -> Result<()> {
    if !args.file.is_file() {
        return Err(not_found(format!("file {}", args.file.display())));
    }
    let parsed = parse_sources(std::slice::from_ref(&args.file), &ctx.rules)
        .with_context(|| format!("read {}", args.file.display()))?;
    let numbers = if args.unique {
        dedup_preserving_order(parsed.numbers)
    } else {
        parsed.numbers
    };

    if ctx.json {
        return print_json(&NormalizeReport {
            numbers,
            invalid: parsed.invalid,
        });
    }

    for number in &numbers {
        println!("{number}");
    }
    if parsed.invalid > 0 {
        eprintln!("skipped {} invalid line(s)", parsed.invalid);
    }
    Ok(())
}
