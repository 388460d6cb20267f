//! Common I/O code using sync I/O.

use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use noodles::bgzf;

/// Returns whether the path looks like a gzip or bgzip file.
pub fn is_gz<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    [Some(Some("gz")), Some(Some("bgz"))].contains(&path.as_ref().extension().map(|s| s.to_str()))
}

/// Directory that a temporary sibling of `path` must be created in.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Write a file at `path` such that no partial file is ever left there.
///
/// The data is written into a temporary file next to `path`, bgzip compressed if `path` ends in
/// `.gz` or `.bgz`.  `func` returns whether to keep the result; the temporary file is moved to
/// `path` only then.  If `func` fails or returns `false`, the temporary file is removed.
///
/// Returns whether the file was written.
pub fn write_atomically<P, F>(path: P, func: F) -> Result<bool, anyhow::Error>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> Result<bool, anyhow::Error>,
{
    let path = path.as_ref();
    let tmp = tempfile::Builder::new()
        .prefix(".mgsync-")
        .tempfile_in(parent_dir(path))
        .map_err(|e| anyhow::anyhow!("could not create temporary file for {:?}: {}", path, e))?;
    let file = tmp.reopen()?;

    let keep = if is_gz(path) {
        tracing::trace!("Writing {:?} as bgzip", path);
        let mut writer = bgzf::io::Writer::new(BufWriter::new(file));
        let keep = func(&mut writer)?;
        let mut inner = writer
            .finish()
            .map_err(|e| anyhow::anyhow!("problem finishing bgzip stream: {}", e))?;
        inner.flush()?;
        keep
    } else {
        tracing::trace!("Writing {:?} as plain text", path);
        let mut writer = BufWriter::new(file);
        let keep = func(&mut writer)?;
        writer.flush()?;
        keep
    };

    if keep {
        tmp.persist(path)
            .map_err(|e| anyhow::anyhow!("could not move output to {:?}: {}", path, e))?;
        tracing::debug!("Wrote {:?}", path);
    } else {
        tracing::debug!("Discarding output for {:?}", path);
    }

    Ok(keep)
}
