//! Artifact Storage Port - 出站端口
//!
//! 管理单个条目运行期间的临时文件和最终产物路径

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::job::JobId;

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err.to_string())
    }
}

/// 条目的最终产物路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// 合并音轨（WAV）
    pub audio: PathBuf,
    /// 字幕文件（SRT）
    pub subtitles: PathBuf,
    /// 最终视频（MP4）
    pub video: PathBuf,
}

/// Artifact Storage Port
#[async_trait]
pub trait ArtifactStoragePort: Send + Sync {
    /// 条目的临时目录
    fn temp_dir(&self, item_id: &JobId) -> PathBuf;

    /// 句子音频的临时路径（文件名包含条目 ID 和从 0 开始的序号）
    fn clip_path(&self, item_id: &JobId, index: usize) -> PathBuf;

    /// 最终产物路径（由条目 ID 决定）
    fn output_paths(&self, item_id: &JobId) -> OutputPaths;

    /// 标题叠加图片路径（由外部流程生成，可能不存在）
    fn title_image_path(&self, item_id: &JobId) -> PathBuf;

    /// 准备临时目录和输出目录
    async fn prepare(&self, item_id: &JobId) -> Result<PathBuf, StorageError>;

    /// 写入文件并刷盘
    async fn write_durable(&self, path: &std::path::Path, data: &[u8]) -> Result<(), StorageError>;

    /// 删除单个文件（不存在时忽略）
    async fn remove_file(&self, path: &std::path::Path) -> Result<(), StorageError>;

    /// 删除条目的临时目录，返回删除的文件数
    async fn release(&self, item_id: &JobId) -> Result<u64, StorageError>;

    /// 检查文件是否存在
    async fn exists(&self, path: &std::path::Path) -> bool;
}
