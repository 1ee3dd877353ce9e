//! Pipeline Orchestrator - 条目级流水线编排
//!
//! 每个条目按 过滤 → 合成 → 字幕 → 合并 → 渲染 顺序执行：
//! - 条目之间严格串行（运行锁）
//! - 同一条目不会被并发处理（占用表）
//! - 单个条目失败只影响自身，批处理继续
//! - 状态只在成功/失败边界写入

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::audio_merger::AudioMerger;
use super::script_builder::ScriptBuilder;
use super::video_composer::{RenderRequest, VideoComposer};
use super::PipelineError;
use crate::application::ports::{
    ArtifactStoragePort, FilterWordRepositoryPort, JobClaimPort, JobRepositoryPort, OutputPaths,
    RepositoryError,
};
use crate::domain::job::{ContentItem, JobId, JobStatus, RunMode};
use crate::domain::{generate_cues, render_srt, ContentFilter, FilterConfig, Sentence};

/// 编排配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 句间间隔（毫秒），字幕和音轨共用
    pub gap_ms: u64,
    pub filter: FilterConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            gap_ms: crate::domain::DEFAULT_GAP_MS,
            filter: FilterConfig::default(),
        }
    }
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 条目不存在
    NotFound,
    /// 当前状态在该模式下不可运行（如已完成）
    NotEligible(JobStatus),
    /// 已有运行在处理该条目
    AlreadyRunning,
}

/// 单个条目的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Done {
        item_id: JobId,
        video: PathBuf,
    },
    Failed {
        item_id: JobId,
        error: String,
    },
    Skipped {
        item_id: JobId,
        reason: SkipReason,
    },
    /// 流水线已结束但状态写入失败，条目保持原状态
    PersistenceFailed {
        item_id: JobId,
        pipeline_succeeded: bool,
        error: String,
    },
}

/// 批处理报告
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
    pub persistence_errors: usize,
    /// 是否因关闭信号提前结束
    pub cancelled: bool,
}

impl BatchReport {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Done { .. } => self.done += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::PersistenceFailed { .. } => self.persistence_errors += 1,
        }
    }
}

/// 编排器错误（批处理入口级别）
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("No job found for url: {0}")]
    UrlNotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct PipelineOrchestrator {
    job_repo: Arc<dyn JobRepositoryPort>,
    filter_repo: Arc<dyn FilterWordRepositoryPort>,
    storage: Arc<dyn ArtifactStoragePort>,
    claims: Arc<dyn JobClaimPort>,
    script_builder: ScriptBuilder,
    merger: AudioMerger,
    composer: VideoComposer,
    config: OrchestratorConfig,
    run_lock: Mutex<()>,
    shutdown: CancellationToken,
}

impl PipelineOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_repo: Arc<dyn JobRepositoryPort>,
        filter_repo: Arc<dyn FilterWordRepositoryPort>,
        storage: Arc<dyn ArtifactStoragePort>,
        claims: Arc<dyn JobClaimPort>,
        script_builder: ScriptBuilder,
        merger: AudioMerger,
        composer: VideoComposer,
        config: OrchestratorConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            job_repo,
            filter_repo,
            storage,
            claims,
            script_builder,
            merger,
            composer,
            config,
            run_lock: Mutex::new(()),
            shutdown,
        }
    }

    /// 批量处理未处理条目
    pub async fn process_unprocessed(&self) -> Result<BatchReport, OrchestratorError> {
        self.run_batch(JobStatus::Unprocessed, RunMode::Fresh).await
    }

    /// 批量重试失败条目
    pub async fn retry_failed(&self) -> Result<BatchReport, OrchestratorError> {
        self.run_batch(JobStatus::Failed, RunMode::Retry).await
    }

    /// 按来源 URL 处理单个条目
    pub async fn generate_single(&self, url: &str) -> Result<ItemOutcome, OrchestratorError> {
        let record = self
            .job_repo
            .find_by_url(url)
            .await?
            .ok_or_else(|| OrchestratorError::UrlNotFound(url.to_string()))?;
        Ok(self.process_item(&record.id, RunMode::Single).await)
    }

    async fn run_batch(
        &self,
        status: JobStatus,
        mode: RunMode,
    ) -> Result<BatchReport, OrchestratorError> {
        let jobs = self.job_repo.list(Some(status)).await?;
        let mut report = BatchReport {
            total: jobs.len(),
            ..Default::default()
        };

        tracing::info!(count = jobs.len(), mode = ?mode, "Batch started");

        for job in jobs {
            if self.shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, stopping batch between items");
                report.cancelled = true;
                break;
            }
            let outcome = self.process_item(&job.id, mode).await;
            report.record(&outcome);
        }

        tracing::info!(
            total = report.total,
            done = report.done,
            failed = report.failed,
            skipped = report.skipped,
            persistence_errors = report.persistence_errors,
            cancelled = report.cancelled,
            "Batch finished"
        );

        Ok(report)
    }

    /// 处理单个条目
    pub async fn process_item(&self, item_id: &JobId, mode: RunMode) -> ItemOutcome {
        let run_id = Uuid::new_v4().to_string();

        if self.claims.try_claim(item_id, &run_id).is_err() {
            tracing::info!(item_id = %item_id, "Item already running, skipping");
            return ItemOutcome::Skipped {
                item_id: item_id.clone(),
                reason: SkipReason::AlreadyRunning,
            };
        }

        let outcome = {
            let _guard = self.run_lock.lock().await;
            self.run_claimed(item_id, mode, &run_id).await
        };

        self.claims.release(item_id);
        outcome
    }

    async fn run_claimed(&self, item_id: &JobId, mode: RunMode, run_id: &str) -> ItemOutcome {
        // 持锁后重新读取状态，保证同一条目不会被重复处理
        let record = match self.job_repo.find_by_id(item_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return ItemOutcome::Skipped {
                    item_id: item_id.clone(),
                    reason: SkipReason::NotFound,
                };
            }
            Err(e) => {
                tracing::error!(item_id = %item_id, error = %e, "Failed to load job");
                return ItemOutcome::PersistenceFailed {
                    item_id: item_id.clone(),
                    pipeline_succeeded: false,
                    error: e.to_string(),
                };
            }
        };

        if !record.status.is_runnable(mode) {
            tracing::debug!(item_id = %item_id, status = %record.status, "Item not eligible");
            return ItemOutcome::Skipped {
                item_id: item_id.clone(),
                reason: SkipReason::NotEligible(record.status),
            };
        }

        tracing::info!(item_id = %item_id, run_id = %run_id, mode = ?mode, "Processing item");

        let outputs = self.storage.output_paths(item_id);
        let result = self.run_pipeline(&record.content_item(), &outputs).await;

        let outcome = match result {
            Ok(()) => match self.job_repo.mark_done(item_id).await {
                Ok(()) => {
                    tracing::info!(item_id = %item_id, video = %outputs.video.display(), "Item done");
                    ItemOutcome::Done {
                        item_id: item_id.clone(),
                        video: outputs.video.clone(),
                    }
                }
                Err(e) => {
                    // 产物保留在磁盘上，由运维人员处理
                    tracing::error!(
                        item_id = %item_id,
                        audio = %outputs.audio.display(),
                        subtitles = %outputs.subtitles.display(),
                        video = %outputs.video.display(),
                        error = %e,
                        "Pipeline succeeded but state could not be persisted"
                    );
                    ItemOutcome::PersistenceFailed {
                        item_id: item_id.clone(),
                        pipeline_succeeded: true,
                        error: e.to_string(),
                    }
                }
            },
            Err(e) => {
                tracing::warn!(
                    item_id = %item_id,
                    class = e.class().as_str(),
                    error = %e,
                    "Item failed"
                );
                self.discard_outputs(&outputs).await;
                match self.job_repo.mark_failed(item_id, &e.to_string()).await {
                    Ok(()) => ItemOutcome::Failed {
                        item_id: item_id.clone(),
                        error: e.to_string(),
                    },
                    Err(persist_err) => {
                        tracing::error!(
                            item_id = %item_id,
                            error = %persist_err,
                            "Failed to persist failure state"
                        );
                        ItemOutcome::PersistenceFailed {
                            item_id: item_id.clone(),
                            pipeline_succeeded: false,
                            error: persist_err.to_string(),
                        }
                    }
                }
            }
        };

        match self.storage.release(item_id).await {
            Ok(removed) => {
                tracing::debug!(item_id = %item_id, removed, "Temporary artifacts released")
            }
            Err(e) => {
                tracing::warn!(item_id = %item_id, error = %e, "Failed to release temporary artifacts")
            }
        }

        outcome
    }

    /// 完整流水线（不写状态）
    async fn run_pipeline(
        &self,
        item: &ContentItem,
        outputs: &OutputPaths,
    ) -> Result<(), PipelineError> {
        self.storage.prepare(&item.id).await?;

        let words = self.filter_repo.list().await?;
        let filter = ContentFilter::new(words, self.config.filter.clone());

        let mut sentences: Vec<Sentence> = Vec::new();
        if let Some(title) = filter.filter_title(&item.title) {
            sentences.push(title);
        }
        sentences.extend(filter.filter(&item.raw_text));
        if sentences.is_empty() {
            return Err(PipelineError::EmptyScript);
        }

        tracing::debug!(item_id = %item.id, sentences = sentences.len(), "Content filtered");

        let built = self.script_builder.build(&item.id, &sentences).await?;

        let cues = generate_cues(&built.script, self.config.gap_ms);
        self.storage
            .write_durable(&outputs.subtitles, render_srt(&cues).as_bytes())
            .await?;

        let narration = self
            .merger
            .merge(&built.clips, self.config.gap_ms, &outputs.audio)
            .await?;

        let expected_ms = built.script.total_duration_ms(self.config.gap_ms);
        if narration.total_duration_ms.abs_diff(expected_ms) > built.clips.len() as u64 {
            tracing::warn!(
                item_id = %item.id,
                expected_ms,
                actual_ms = narration.total_duration_ms,
                "Merged audio drifts from subtitle timeline"
            );
        }

        let title_image = self.storage.title_image_path(&item.id);
        self.composer
            .render(RenderRequest {
                item_id: &item.id,
                narration: &narration,
                subtitles: &outputs.subtitles,
                title_image: Some(&title_image),
                output: &outputs.video,
            })
            .await?;

        Ok(())
    }

    /// 失败时删除不完整的产物
    async fn discard_outputs(&self, outputs: &OutputPaths) {
        for path in [&outputs.audio, &outputs.subtitles, &outputs.video] {
            if let Err(e) = self.storage.remove_file(path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output");
            }
        }
    }
}
