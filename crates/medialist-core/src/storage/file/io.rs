//! Line-oriented file access
//!
//! Three write modes are used by the file stores:
//! - append a single line (inserts)
//! - read, filter, write a temp file, rename over the original (removals)
//! - whole-file atomic write (used by the filter step)
//!
//! A missing file reads as empty; it is created on first write.

use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::storage::error::{IoOp, StoreError, StoreResult};

/// A non-blank line and its 1-based line number
///
/// The raw bytes are kept so rewrites carry a line over exactly as it was
/// read, even when it is not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub raw: Vec<u8>,
}

impl Line {
    /// The line as text, without a trailing carriage return
    ///
    /// Invalid UTF-8 makes the line malformed.
    pub fn text(&self) -> Result<&str, String> {
        std::str::from_utf8(strip_cr(&self.raw))
            .map_err(|e| format!("invalid UTF-8 after byte {}", e.valid_up_to()))
    }

    /// The line as text with invalid bytes replaced, for matching keys
    ///
    /// Numeric fields never contain the replacement character, so a key
    /// that parses from this is the key that was written.
    pub fn lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(strip_cr(&self.raw))
    }
}

fn strip_cr(bytes: &[u8]) -> &[u8] {
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Read every non-blank line of a file
///
/// Lines are split on `\n` and decoded one by one, so a bad byte in one
/// record does not hide the others.
pub fn read_lines(path: &Path) -> StoreResult<Vec<Line>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::from_io(e, path.to_path_buf(), IoOp::Read)),
    };

    Ok(content
        .split(|&b| b == b'\n')
        .enumerate()
        .filter(|(_, raw)| !raw.iter().all(u8::is_ascii_whitespace))
        .map(|(idx, raw)| Line {
            number: idx + 1,
            raw: raw.to_vec(),
        })
        .collect())
}

/// Append one record line, creating the file if needed
///
/// If the file does not end in a newline (an interrupted append, or a
/// hand edit) a newline is written first so the new record never merges
/// into the previous one.
pub fn append_line(path: &Path, line: &str) -> StoreResult<()> {
    ensure_parent(path)?;

    let write_err = |e| StoreError::from_io(e, path.to_path_buf(), IoOp::Write);

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(write_err)?;

    let len = file.metadata().map_err(write_err)?.len();
    let mut record = String::with_capacity(line.len() + 2);
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(write_err)?;
        file.read_exact(&mut last).map_err(write_err)?;
        if last[0] != b'\n' {
            record.push('\n');
        }
    }
    record.push_str(line);
    record.push('\n');

    file.write_all(record.as_bytes()).map_err(write_err)?;
    file.sync_data().map_err(write_err)?;
    Ok(())
}

/// Keep only the lines matching `keep`, replacing the file atomically
///
/// `keep` sees each line's [`Line::lossy`] text; kept lines are written
/// back byte for byte. Returns the number of lines dropped. When nothing
/// is dropped the file is left untouched. Blank lines are not carried
/// over.
pub fn rewrite_filtered<F>(path: &Path, mut keep: F) -> StoreResult<usize>
where
    F: FnMut(&str) -> bool,
{
    let lines = read_lines(path)?;
    let total = lines.len();

    let mut kept: Vec<u8> = Vec::new();
    let mut kept_count = 0;
    for line in lines.iter().filter(|line| keep(&line.lossy())) {
        kept.extend_from_slice(&line.raw);
        kept.push(b'\n');
        kept_count += 1;
    }
    let removed = total - kept_count;

    if removed == 0 {
        return Ok(0);
    }

    atomic_write(path, &kept)?;
    debug!("Rewrote {:?}, dropped {} line(s)", path, removed);
    Ok(removed)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// A crash before the rename leaves the original untouched; after it, the
/// new content is fully in place.
pub fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    ensure_parent(path)?;

    let temp_path = temp_path_for(path);
    let write_err = |e| StoreError::from_io(e, temp_path.clone(), IoOp::Write);

    let mut file = File::create(&temp_path).map_err(write_err)?;
    file.write_all(data).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        StoreError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source,
        }
    })?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let lines = read_lines(&temp_dir.path().join("absent.csv")).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_read_skips_blank_lines_and_keeps_numbers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        fs::write(&path, "1,2\n\n   \n3,4\r\n").unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].number, 4);
        assert_eq!(lines[1].text().unwrap(), "3,4");
    }

    #[test]
    fn test_invalid_utf8_only_affects_its_own_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        fs::write(&path, b"1,90,0,Good\n2,95,0,Bad \xff title\n\xfe\xff\n3,80,0,Fine\n").unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text().unwrap(), "1,90,0,Good");
        assert!(lines[1].text().is_err());
        assert!(lines[1].lossy().starts_with("2,95,0,Bad "));
        assert!(lines[2].text().is_err());
        assert_eq!(lines[3].text().unwrap(), "3,80,0,Fine");
    }

    #[test]
    fn test_rewrite_filtered_keeps_untouched_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        fs::write(&path, b"1,10\r\n2,\xff\n\xfe\xff\n3,30\n").unwrap();

        let removed = rewrite_filtered(&path, |line| line != "3,30").unwrap();

        assert_eq!(removed, 1);
        assert_eq!(fs::read(&path).unwrap(), b"1,10\r\n2,\xff\n\xfe\xff\n".to_vec());
    }

    #[test]
    fn test_append_creates_file_and_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("data.csv");

        append_line(&path, "1,2").unwrap();
        append_line(&path, "3,4").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1,2\n3,4\n");
    }

    #[test]
    fn test_append_repairs_missing_trailing_newline() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        fs::write(&path, "1,2").unwrap();

        append_line(&path, "3,4").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1,2\n3,4\n");
    }

    #[test]
    fn test_rewrite_filtered_drops_matching_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        fs::write(&path, "1,10\n2,20\n1,30\n").unwrap();

        let removed = rewrite_filtered(&path, |line| !line.starts_with("1,")).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "2,20\n");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_rewrite_filtered_noop_leaves_file_alone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        fs::write(&path, "1,10\n\n2,20\n").unwrap();

        let removed = rewrite_filtered(&path, |_| true).unwrap();

        assert_eq!(removed, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1,10\n\n2,20\n");
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        fs::write(&path, "old\n").unwrap();

        atomic_write(&path, b"new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_failed_rename_leaves_original_untouched() {
        let temp_dir = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file
        let path = temp_dir.path().join("data.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "original\n").unwrap();

        let err = atomic_write(&path, b"new\n").unwrap_err();

        assert!(matches!(err, StoreError::AtomicWriteFailed { .. }), "{err}");
        assert!(path.is_dir());
        assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "original\n");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        let path = Path::new("/data/list_movie.csv");
        assert_eq!(temp_path_for(path), PathBuf::from("/data/list_movie.csv.tmp"));
    }
}
