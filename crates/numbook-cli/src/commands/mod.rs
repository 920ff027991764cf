use anyhow::Result;
use numbook_config::AppConfig;
use numbook_core::PhoneRules;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

pub mod convert;
pub mod normalize;
pub mod replay;

pub struct Context<'a> {
    pub config: &'a AppConfig,
    pub rules: PhoneRules,
    /// `--sessions-dir`, falling back to the configured value.
    pub sessions_dir: Option<PathBuf>,
    pub json: bool,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
