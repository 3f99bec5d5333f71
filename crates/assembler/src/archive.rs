//! Delivery container construction.

use crate::error::{AssemblerError, AssemblerResult};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build the delivery ZIP from the package directory.
///
/// Entries are rooted at the package folder name and walked in sorted
/// order, so identical inputs produce identically-ordered archives.
/// Compression is CPU-bound and runs off the async runtime.
pub async fn build_archive(
    working_dir: &Path,
    package_dir: &Path,
    archive_path: &Path,
) -> AssemblerResult<u64> {
    let working_dir = working_dir.to_path_buf();
    let package_dir = package_dir.to_path_buf();
    let archive_path = archive_path.to_path_buf();
    tokio::task::spawn_blocking(move || build_zip(&working_dir, &package_dir, &archive_path))
        .await
        .map_err(|e| AssemblerError::ArchiveIo(format!("archive task failed: {e}")))?
}

fn build_zip(working_dir: &Path, package_dir: &Path, archive_path: &Path) -> AssemblerResult<u64> {
    let file = File::create(archive_path).map_err(archive_io)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for entry in WalkDir::new(package_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| AssemblerError::ArchiveIo(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(working_dir)
            .map_err(|e| AssemblerError::ArchiveIo(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name.is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            zip.add_directory(name.as_str(), options).map_err(zip_io)?;
        } else {
            zip.start_file(name.as_str(), options).map_err(zip_io)?;
            let mut source = File::open(entry.path()).map_err(archive_io)?;
            io::copy(&mut source, &mut zip).map_err(archive_io)?;
        }
    }

    let mut file = zip.finish().map_err(zip_io)?;
    file.flush().map_err(archive_io)?;
    Ok(file.metadata().map_err(archive_io)?.len())
}

fn archive_io(e: io::Error) -> AssemblerError {
    AssemblerError::ArchiveIo(e.to_string())
}

fn zip_io(e: zip::result::ZipError) -> AssemblerError {
    AssemblerError::ArchiveIo(e.to_string())
}
