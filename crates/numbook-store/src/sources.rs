use crate::error::Result;
use numbook_core::{is_source_file_name, CanonicalNumber, PhoneRules};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Numbers extracted from a set of source files, in file-then-line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSources {
    pub numbers: Vec<CanonicalNumber>,
    pub invalid: usize,
}

/// Lists `*.txt` files directly inside `dir`, sorted by path.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if is_source_file_name(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn parse_sources(files: &[PathBuf], rules: &PhoneRules) -> Result<ParsedSources> {
    let mut parsed = ParsedSources::default();
    for path in files {
        let bytes = fs::read(path)?;
        let text = decode_lossy(&bytes);
        for line in split_lines(&text) {
            match rules.normalize(line) {
                Some(number) => parsed.numbers.push(number),
                None => parsed.invalid += 1,
            }
        }
    }
    Ok(parsed)
}

/// Splits on `\n`, `\r\n` and a lone `\r`. A trailing terminator does not
/// produce an empty final line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(&['\r', '\n'][..]) {
            Some(pos) => {
                let line = &rest[..pos];
                let width = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[pos + width..];
                Some(line)
            }
            None => Some(std::mem::take(&mut rest)),
        }
    })
}

// Undecodable bytes are dropped rather than replaced so they cannot split a number.
fn decode_lossy(bytes: &[u8]) -> Cow<'_, str> {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => Cow::Borrowed(text),
        Cow::Owned(text) => Cow::Owned(text.replace(char::REPLACEMENT_CHARACTER, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::{list_source_files, parse_sources, split_lines};
    use numbook_core::PhoneRules;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn list_source_files_filters_and_sorts() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("b.txt"), "").expect("write b");
        fs::write(temp.path().join("a.TXT"), "").expect("write a");
        fs::write(temp.path().join("c.csv"), "").expect("write c");
        fs::create_dir(temp.path().join("d.txt")).expect("mkdir");

        let files = list_source_files(temp.path()).expect("list");
        let names: Vec<String> = files
            .iter()
            .map(|path| path.file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.TXT", "b.txt"]);
    }

    #[test]
    fn parse_sources_drops_invalid_utf8_bytes() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("numbers.txt");
        fs::write(&path, b"08\xff11 111 1111\r\nnope\n").expect("write");

        let parsed = parse_sources(&[path], &PhoneRules::default()).expect("parse");
        assert_eq!(parsed.invalid, 1);
        assert_eq!(parsed.numbers.len(), 1);
        assert_eq!(parsed.numbers[0].as_str(), "+62 8111 111111");
    }

    #[test]
    fn split_lines_accepts_every_line_ending() {
        let lines: Vec<&str> = split_lines("a\r\nb\rc\nd\r\r\ne").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d", "", "e"]);
        assert_eq!(split_lines("a\r").collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(split_lines("").count(), 0);
    }

    #[test]
    fn parse_sources_reads_carriage_return_files() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("mac.txt");
        fs::write(&path, "0811 111 1111\r0822 222 2222\r0833 333 3333\r").expect("write");

        let parsed = parse_sources(&[path], &PhoneRules::default()).expect("parse");
        assert_eq!(parsed.invalid, 0);
        let numbers: Vec<&str> = parsed.numbers.iter().map(|n| n.as_str()).collect();
        assert_eq!(
            numbers,
            vec!["+62 8111 111111", "+62 8222 222222", "+62 8333 333333"]
        );
    }

    #[test]
    fn parse_sources_counts_windows_lines_once() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("win.txt");
        fs::write(&path, "0811 111 1111\r\nnope\r\n0822 222 2222\r\n").expect("write");

        let parsed = parse_sources(&[path], &PhoneRules::default()).expect("parse");
        assert_eq!(parsed.numbers.len(), 2);
        assert_eq!(parsed.invalid, 1);
    }
}
