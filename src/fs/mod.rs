//! File system operations abstraction for testing
//!
//! The create workflow writes its per-region results through this trait so
//! tests can assert on the artifact without touching disk, using the
//! `mockall`-generated `MockFileSystemOperations`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use serverless_project_manager::fs::{FileSystemOperations, StandardFileSystem};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fs_ops: Arc<dyn FileSystemOperations> = Arc::new(StandardFileSystem);
//!     fs_ops.create_dir_all("/tmp/projects").await?;
//!     fs_ops.write("/tmp/projects/results.json", b"{}").await?;
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use std::path::Path;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Trait for file system operations that can be mocked in tests
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait::async_trait]
pub trait FileSystemOperations: Send + Sync {
    /// Create a directory and all its parent directories
    async fn create_dir_all(&self, path: &str) -> Result<()>;

    /// Write data to a file, creating the file if it doesn't exist
    async fn write(&self, path: &str, contents: &[u8]) -> Result<()>;
}

/// Standard implementation that uses actual file system operations
pub struct StandardFileSystem;

#[async_trait::async_trait]
impl FileSystemOperations for StandardFileSystem {
    async fn create_dir_all(&self, path: &str) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("failed to create directory {path}"))
    }

    async fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("failed to write {path}"))
    }
}

/// Write `contents` to `path`, creating missing parent directories first
pub async fn write_creating_parents(
    fs_ops: &dyn FileSystemOperations,
    path: &Path,
    contents: &[u8],
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_ops.create_dir_all(&parent.to_string_lossy()).await?;
    }
    fs_ops.write(&path.to_string_lossy(), contents).await
}
