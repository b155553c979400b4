//! Directory and file management primitives.
//!
//! Each operation checks existence first and reports what happened instead of
//! silently overwriting. Interactive prompting lives in the `dir` command.

use crate::error::{MedleyError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Result of a create operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

/// Menu choices of the interactive manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    CreateDirectory,
    DeleteDirectory,
    CreateFile,
    DeleteFile,
}

impl std::str::FromStr for FileAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "create_d" => Ok(FileAction::CreateDirectory),
            "delete_d" => Ok(FileAction::DeleteDirectory),
            "create_f" => Ok(FileAction::CreateFile),
            "delete_f" => Ok(FileAction::DeleteFile),
            _ => Err(
                "Invalid option. Please type 'create_d', 'delete_d', 'create_f', or 'delete_f'."
                    .to_string(),
            ),
        }
    }
}

/// Create `path` and any missing parents.
#[instrument]
pub fn create_directory(path: &Path) -> Result<CreateOutcome> {
    if path.exists() {
        return Ok(CreateOutcome::AlreadyExists(path.to_path_buf()));
    }
    std::fs::create_dir_all(path)?;
    info!("Created directory {}", path.display());
    Ok(CreateOutcome::Created(path.to_path_buf()))
}

/// Rename an existing directory.
#[instrument]
pub fn rename_directory(from: &Path, to: &Path) -> Result<PathBuf> {
    if !from.is_dir() {
        return Err(MedleyError::NotFound(format!(
            "Directory '{}'",
            from.display()
        )));
    }
    if to.exists() {
        return Err(MedleyError::InvalidInput(format!(
            "'{}' already exists",
            to.display()
        )));
    }
    std::fs::rename(from, to)?;
    info!("Renamed {} to {}", from.display(), to.display());
    Ok(to.to_path_buf())
}

/// Recursively delete a directory.
#[instrument]
pub fn delete_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(MedleyError::NotFound(format!(
            "Directory '{}'",
            path.display()
        )));
    }
    std::fs::remove_dir_all(path)?;
    info!("Deleted directory {}", path.display());
    Ok(())
}

/// Create an empty file named `name` inside `dir`.
#[instrument]
pub fn create_file(dir: &Path, name: &str) -> Result<CreateOutcome> {
    let path = file_in(dir, name)?;
    if path.exists() {
        return Ok(CreateOutcome::AlreadyExists(path));
    }
    std::fs::File::create(&path)?;
    info!("Created file {}", path.display());
    Ok(CreateOutcome::Created(path))
}

/// Delete the file `name` inside `dir`.
#[instrument]
pub fn delete_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = file_in(dir, name)?;
    if !path.is_file() {
        return Err(MedleyError::NotFound(format!("File '{}'", path.display())));
    }
    std::fs::remove_file(&path)?;
    info!("Deleted file {}", path.display());
    Ok(path)
}

fn file_in(dir: &Path, name: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(MedleyError::NotFound(format!(
            "Directory '{}'",
            dir.display()
        )));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(MedleyError::InvalidInput("File name is empty".to_string()));
    }
    Ok(dir.join(name))
}
