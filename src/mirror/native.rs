//! In-process mirror backend with archive-style (`rsync -a --delete`)
//! semantics.
use std::collections::BTreeMap;
use std::fs::{File, Metadata};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use walkdir::WalkDir;

use super::{ExcludeSet, Mirror};
use crate::resources::fs;

/// Copies with `std::fs`, walking trees with `walkdir`.
///
/// Files whose size and modification time already match the source are not
/// rewritten, only their permission bits are refreshed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeMirror;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Symlink,
}

impl From<std::fs::FileType> for EntryKind {
    fn from(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Dir
        } else {
            Self::File
        }
    }
}

impl Mirror for NativeMirror {
    fn name(&self) -> &'static str {
        "native"
    }

    fn copy_file(&self, source: &Path, destination: &Path) -> Result<()> {
        if !source.is_file() {
            bail!("source is not a file: {}", source.display());
        }
        if destination.is_dir() && !destination.is_symlink() {
            bail!("destination is a directory: {}", destination.display());
        }
        sync_file(source, destination)
    }

    fn copy_tree(&self, source: &Path, destination: &Path, excludes: &ExcludeSet) -> Result<()> {
        if !source.is_dir() {
            bail!("source is not a directory: {}", source.display());
        }
        let wanted = scan(source, excludes)?;
        prune(destination, &wanted, excludes)?;

        for (rel, kind) in &wanted {
            let src = source.join(rel);
            let dst = destination.join(rel);
            match kind {
                EntryKind::Dir => {
                    if !dst.is_dir() {
                        fs::create_dir_all(&dst)?;
                    }
                }
                EntryKind::File => sync_file(&src, &dst)?,
                EntryKind::Symlink => sync_symlink(&src, &dst)?,
            }
        }

        // Deepest first, so creating children does not disturb a parent's
        // restored modification time.
        for (rel, kind) in wanted.iter().rev() {
            if *kind == EntryKind::Dir {
                let src = source.join(rel);
                let meta = std::fs::metadata(&src)
                    .with_context(|| format!("reading metadata of {}", src.display()))?;
                copy_dir_metadata(&meta, &destination.join(rel))?;
            }
        }
        Ok(())
    }
}

fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Every non-excluded entry below `root`, keyed by relative path.  The root
/// itself is included under the empty path.
fn scan(root: &Path, excludes: &ExcludeSet) -> Result<BTreeMap<PathBuf, EntryKind>> {
    let mut entries = BTreeMap::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !excludes.is_excluded(relative(root, e.path())));
    for entry in walker {
        let entry = entry.with_context(|| format!("reading {}", root.display()))?;
        let kind = if entry.depth() == 0 {
            EntryKind::Dir
        } else {
            EntryKind::from(entry.file_type())
        };
        entries.insert(relative(root, entry.path()).to_path_buf(), kind);
    }
    Ok(entries)
}

/// Delete destination entries that are absent from the source or whose type
/// differs.  Excluded entries are left alone.
fn prune(root: &Path, wanted: &BTreeMap<PathBuf, EntryKind>, excludes: &ExcludeSet) -> Result<()> {
    if !root.is_dir() {
        return Ok(());
    }
    let walker = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !excludes.is_excluded(relative(root, e.path())));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e)
                if e.io_error()
                    .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound) =>
            {
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", root.display())),
        };
        let rel = relative(root, entry.path());
        if wanted.get(rel) != Some(&EntryKind::from(entry.file_type())) {
            fs::remove_any(entry.path())?;
        }
    }
    Ok(())
}

/// Copy `source` over `destination` unless the quick check says it is
/// current.  The new content is staged in a sibling temp file and renamed
/// into place, so a failed copy leaves the old destination intact.
fn sync_file(source: &Path, destination: &Path) -> Result<()> {
    let meta = std::fs::metadata(source)
        .with_context(|| format!("reading metadata of {}", source.display()))?;

    if is_up_to_date(&meta, destination) {
        std::fs::set_permissions(destination, meta.permissions())
            .with_context(|| format!("setting permissions on {}", destination.display()))?;
        return Ok(());
    }

    let tmp = staging_path(destination);
    fs::remove_any(&tmp)?;
    let staged = stage(source, &meta, &tmp).and_then(|()| {
        std::fs::rename(&tmp, destination).with_context(|| {
            format!("renaming {} to {}", tmp.display(), destination.display())
        })
    });
    if staged.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    staged
}

fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    destination.with_file_name(format!(".{name}.thunderize-tmp"))
}

fn stage(source: &Path, meta: &Metadata, tmp: &Path) -> Result<()> {
    std::fs::copy(source, tmp)
        .with_context(|| format!("copying {} to {}", source.display(), tmp.display()))?;
    set_mtime(meta, tmp)?;
    std::fs::set_permissions(tmp, meta.permissions())
        .with_context(|| format!("setting permissions on {}", tmp.display()))
}

fn is_up_to_date(source: &Metadata, destination: &Path) -> bool {
    let Ok(dest) = destination.symlink_metadata() else {
        return false;
    };
    dest.is_file()
        && dest.len() == source.len()
        && matches!(
            (dest.modified(), source.modified()),
            (Ok(a), Ok(b)) if a == b
        )
}

fn set_mtime(source: &Metadata, destination: &Path) -> Result<()> {
    let modified = source
        .modified()
        .context("reading modification time")?;
    File::open(destination)
        .and_then(|f| f.set_modified(modified))
        .with_context(|| format!("setting modification time on {}", destination.display()))
}

fn copy_dir_metadata(source: &Metadata, destination: &Path) -> Result<()> {
    #[cfg(unix)]
    set_mtime(source, destination)?;
    std::fs::set_permissions(destination, source.permissions())
        .with_context(|| format!("setting permissions on {}", destination.display()))
}

#[cfg(unix)]
fn sync_symlink(source: &Path, destination: &Path) -> Result<()> {
    let target = std::fs::read_link(source)
        .with_context(|| format!("reading link {}", source.display()))?;
    if std::fs::read_link(destination).is_ok_and(|current| current == target) {
        return Ok(());
    }
    fs::remove_any(destination)?;
    std::os::unix::fs::symlink(&target, destination)
        .with_context(|| format!("creating link {}", destination.display()))
}

#[cfg(not(unix))]
fn sync_symlink(source: &Path, destination: &Path) -> Result<()> {
    sync_file(source, destination)
}
