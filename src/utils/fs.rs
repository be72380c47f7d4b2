use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::utils::error::Result;

/// Check if a path exists and is a directory
pub fn is_directory<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().is_dir()
}

/// Create a directory and any parent directories if they don't exist
pub fn create_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    fs::create_dir_all(path.as_ref())?;
    Ok(())
}

/// Read a file to string
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(fs::read_to_string(path.as_ref())?)
}

/// Read a file as raw bytes
pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    Ok(fs::read(path.as_ref())?)
}

/// Write bytes to a file, creating parent directories if they don't exist
pub fn write_bytes<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        create_directory(parent)?;
    }

    fs::write(path.as_ref(), contents)?;
    Ok(())
}

/// List all files below a directory, recursively, in a stable order
pub fn list_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !dir.as_ref().is_dir() {
        return Ok(files);
    }

    for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
        let entry = entry.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
