//! Zip archive reading
//!
//! Entries are read fully into memory. Entry names that would escape the
//! archive root are dropped, never written or resolved.

use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

use super::ExtractError;
use crate::validation::normalize_path;

/// A file entry read from an archive, path already normalized
#[derive(Debug)]
pub(crate) struct ArchiveEntry {
    pub path: String,
    /// None when the entry is larger than the size limit
    pub bytes: Option<Vec<u8>>,
    pub size: u64,
}

/// Read every file entry of a zip archive held in memory
pub(crate) fn read_zip_bytes(
    bytes: &[u8],
    max_file_bytes: Option<u64>,
) -> Result<Vec<ArchiveEntry>, ExtractError> {
    read_zip(Cursor::new(bytes), max_file_bytes)
}

pub(crate) fn read_zip<R: Read + Seek>(
    reader: R,
    max_file_bytes: Option<u64>,
) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let raw_name = file.name().to_string();
        let path = match file
            .enclosed_name()
            .and_then(|p| p.to_str().map(str::to_string))
            .map(|p| normalize_path(&p))
        {
            Some(Ok(path)) => path,
            _ => {
                tracing::warn!("dropping archive entry outside root: {}", raw_name);
                continue;
            }
        };

        let size = file.size();
        let bytes = match max_file_bytes {
            Some(limit) if size > limit => None,
            _ => {
                let mut buf = Vec::with_capacity(initial_capacity(size));
                file.read_to_end(&mut buf).map_err(|source| ExtractError::Io {
                    path: raw_name.clone(),
                    source,
                })?;
                Some(buf)
            }
        };

        entries.push(ArchiveEntry { path, bytes, size });
    }

    Ok(entries)
}

/// Largest up-front buffer for one entry; the header size is untrusted
const MAX_PREALLOC: u64 = 1 << 20;

fn initial_capacity(declared_size: u64) -> usize {
    declared_size.min(MAX_PREALLOC) as usize
}

/// Common single top-level directory of all entries, if there is one
///
/// `project-main/src/a.ts` and `project-main/README.md` share
/// `project-main`; a top-level file means there is no common root.
pub(crate) fn common_root(paths: &[&str]) -> Option<String> {
    let mut root: Option<&str> = None;
    for path in paths {
        let (first, rest) = path.split_once('/')?;
        if rest.is_empty() {
            return None;
        }
        match root {
            None => root = Some(first),
            Some(r) if r == first => {}
            Some(_) => return None,
        }
    }
    root.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_read_entries() {
        let bytes = zip_of(&[("src/a.ts", b"export const a = 1;"), ("b.py", b"x = 1")]);
        let entries = read_zip_bytes(&bytes, None).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.ts", "b.py"]);
        assert_eq!(entries[1].bytes.as_deref(), Some(&b"x = 1"[..]));
    }

    #[test]
    fn test_declared_size_does_not_drive_allocation() {
        assert_eq!(initial_capacity(12), 12);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOC as usize);

        // Entries bigger than the cap still read in full
        let big = vec![b'x'; (MAX_PREALLOC as usize) + 10];
        let bytes = zip_of(&[("big.js", big.as_slice())]);
        let entries = read_zip_bytes(&bytes, None).unwrap();
        assert_eq!(entries[0].bytes.as_ref().map(Vec::len), Some(big.len()));
    }

    #[test]
    fn test_escaping_entries_are_dropped() {
        let bytes = zip_of(&[("../evil.js", b"bad"), ("ok.js", b"good")]);
        let entries = read_zip_bytes(&bytes, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "ok.js");
    }

    #[test]
    fn test_oversized_entries_keep_no_content() {
        let bytes = zip_of(&[("big.py", &[b'a'; 64])]);
        let entries = read_zip_bytes(&bytes, Some(16)).unwrap();
        assert!(entries[0].bytes.is_none());
        assert_eq!(entries[0].size, 64);
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let err = read_zip_bytes(b"definitely not a zip", None).unwrap_err();
        assert!(matches!(err, ExtractError::Archive(_)));
    }

    #[test]
    fn test_common_root() {
        assert_eq!(
            common_root(&["proj/src/a.ts", "proj/README.md"]).as_deref(),
            Some("proj")
        );
        assert_eq!(common_root(&["proj/a.ts", "other/b.ts"]), None);
        assert_eq!(common_root(&["proj/a.ts", "top.ts"]), None);
        assert_eq!(common_root(&[]), None);
    }
}
