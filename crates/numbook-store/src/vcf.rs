use crate::error::{Result, StoreError};
use numbook_core::{Batch, CanonicalNumber, ContactLabeler, RecordId};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

// Fixed and short, so a temporary name never outgrows the final one.
const TEMP_PREFIX: &str = ".numbook-";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCard {
    pub display_name: String,
    pub number: CanonicalNumber,
    pub uid: RecordId,
}

/// Builds one card per number, drawing display names from the run-wide labeler.
pub fn label_batch(batch: &Batch, labeler: &mut ContactLabeler) -> Vec<ContactCard> {
    batch
        .numbers
        .iter()
        .map(|number| ContactCard {
            display_name: labeler.next_label(),
            number: number.clone(),
            uid: RecordId::new(),
        })
        .collect()
}

pub fn render_cards(cards: &[ContactCard]) -> String {
    let mut out = String::new();
    for card in cards {
        let (given, family) = split_display_name(&card.display_name);
        out.push_str("BEGIN:VCARD\r\n");
        out.push_str("VERSION:3.0\r\n");
        out.push_str(&format!(
            "FN:{}\r\n",
            escape_vcard_value(&card.display_name)
        ));
        out.push_str(&format!(
            "N:{};{};;;\r\n",
            escape_vcard_value(family),
            escape_vcard_value(given)
        ));
        out.push_str(&format!("UID:{}\r\n", card.uid));
        out.push_str(&format!(
            "TEL;TYPE=CELL:{}\r\n",
            escape_vcard_value(card.number.as_str())
        ));
        out.push_str("END:VCARD\r\n\r\n");
    }
    out
}

/// Writes `cards` to `path` so that the file is either complete or absent.
pub fn write_cards(path: &Path, cards: &[ContactCard]) -> Result<()> {
    let data = render_cards(cards);
    write_atomic(path, |writer| writer.write_all(data.as_bytes()))
}

/// Runs `write` against a hidden temporary file next to `path` and renames it
/// into place once it succeeds. The temporary file is removed on any failure.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if path.file_name().is_none() {
        return Err(StoreError::InvalidDataPath(path.to_path_buf()));
    }

    let persist = || -> io::Result<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            write(&mut writer)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|err| err.error)?;
        Ok(())
    };

    persist().map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn is_temp_file_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// Deletes temporary files left behind by an interrupted write.
pub fn remove_temp_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if is_temp_file_name(&entry.file_name().to_string_lossy()) {
            let path = entry.path();
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

fn split_display_name(name: &str) -> (&str, &str) {
    match name.split_once(char::is_whitespace) {
        Some((given, family)) => (given, family.trim()),
        None => (name, ""),
    }
}

fn escape_vcard_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\n"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            _ => out.push(ch),
        }
    }
    out
}
