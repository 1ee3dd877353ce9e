//! File Storage - 文件系统产物存储实现
//!
//! 实现 ArtifactStoragePort trait
//!
//! 目录布局：
//! - `{temp_root}/{item}/temp_{item}_{index}.wav` 句子音频
//! - `{output_root}/{item}.wav|.srt|.mp4` 最终产物
//! - `{title_image_root}/{item}.png` 标题图片

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{ArtifactStoragePort, OutputPaths, StorageError};
use crate::domain::job::JobId;

/// 文件系统产物存储
pub struct FileArtifactStorage {
    temp_root: PathBuf,
    output_root: PathBuf,
    title_image_root: PathBuf,
}

impl FileArtifactStorage {
    /// 创建新的文件存储（目录在 prepare 时创建）
    pub fn new(
        temp_root: impl AsRef<Path>,
        output_root: impl AsRef<Path>,
        title_image_root: impl AsRef<Path>,
    ) -> Self {
        Self {
            temp_root: temp_root.as_ref().to_path_buf(),
            output_root: output_root.as_ref().to_path_buf(),
            title_image_root: title_image_root.as_ref().to_path_buf(),
        }
    }

    /// 获取输出根目录
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}

#[async_trait]
impl ArtifactStoragePort for FileArtifactStorage {
    fn temp_dir(&self, item_id: &JobId) -> PathBuf {
        self.temp_root.join(item_id.as_str())
    }

    fn clip_path(&self, item_id: &JobId, index: usize) -> PathBuf {
        self.temp_dir(item_id)
            .join(format!("temp_{}_{}.wav", item_id, index))
    }

    fn output_paths(&self, item_id: &JobId) -> OutputPaths {
        OutputPaths {
            audio: self.output_root.join(format!("{}.wav", item_id)),
            subtitles: self.output_root.join(format!("{}.srt", item_id)),
            video: self.output_root.join(format!("{}.mp4", item_id)),
        }
    }

    fn title_image_path(&self, item_id: &JobId) -> PathBuf {
        self.title_image_root.join(format!("{}.png", item_id))
    }

    async fn prepare(&self, item_id: &JobId) -> Result<PathBuf, StorageError> {
        let dir = self.temp_dir(item_id);
        fs::create_dir_all(&dir).await?;
        fs::create_dir_all(&self.output_root).await?;
        Ok(dir)
    }

    async fn write_durable(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::debug!(path = %path.display(), size = data.len(), "File written");
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn release(&self, item_id: &JobId) -> Result<u64, StorageError> {
        let dir = self.temp_dir(item_id);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(0);
        }

        let mut removed = 0u64;
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        fs::remove_dir_all(&dir).await?;

        tracing::debug!(item_id = %item_id, files = removed, "Temp dir released");
        Ok(removed)
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}
