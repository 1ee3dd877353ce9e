//! 流水线测试用的替身实现和组装工具

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::{
    AudioMerger, BackgroundClip, BackgroundPool, OrchestratorConfig, PipelineOrchestrator,
    ScriptBuilder, VideoComposer, VideoComposerConfig,
};
use crate::application::ports::{
    AudioCodecPort, JobRecord, JobRepositoryPort, MediaBackendPort, MediaInfo, NewJob, PcmAudio,
    RenderError, RenderPlan, SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError,
};
use crate::domain::job::JobId;
use crate::infrastructure::adapters::{FakeTtsClient, FileArtifactStorage, SymphoniaCodec};
use crate::infrastructure::memory::InMemoryJobClaims;
use crate::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteFilterWordRepository, SqliteJobRepository,
};

pub(crate) fn fake_engine() -> Arc<dyn TtsEnginePort> {
    Arc::new(FakeTtsClient::with_defaults(Arc::new(SymphoniaCodec::new())))
}

pub(crate) fn temp_storage() -> (TempDir, Arc<FileArtifactStorage>) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileArtifactStorage::new(
        dir.path().join("temp"),
        dir.path().join("out"),
        dir.path().join("titles"),
    );
    (dir, Arc::new(storage))
}

pub(crate) fn silent_wav(sample_rate: u32, channels: u16, duration_ms: u64) -> Vec<u8> {
    SymphoniaCodec::new()
        .encode_wav(&PcmAudio::silence(sample_rate, channels, duration_ms))
        .unwrap()
}

/// 记录渲染计划的媒体后端，可按条目 ID 模拟编码失败
#[derive(Default)]
pub(crate) struct RecordingBackend {
    plans: Mutex<Vec<RenderPlan>>,
    fail_for: Mutex<Option<String>>,
}

impl RecordingBackend {
    pub(crate) fn failing_for(item_id: &str) -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            fail_for: Mutex::new(Some(item_id.to_string())),
        }
    }

    pub(crate) fn plans(&self) -> Vec<RenderPlan> {
        self.plans.lock().unwrap().clone()
    }

    pub(crate) fn clear_failure(&self) {
        *self.fail_for.lock().unwrap() = None;
    }
}

#[async_trait]
impl MediaBackendPort for RecordingBackend {
    async fn probe(&self, _path: &Path) -> Result<MediaInfo, RenderError> {
        Ok(MediaInfo {
            duration_secs: 600.0,
            width: Some(1080),
            height: Some(1920),
        })
    }

    async fn render(&self, plan: &RenderPlan) -> Result<(), RenderError> {
        let stem = plan
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        if self.fail_for.lock().unwrap().as_deref() == Some(stem.as_str()) {
            return Err(RenderError::BackendFailed("simulated encoder crash".to_string()));
        }

        tokio::fs::write(&plan.output, b"mp4").await.unwrap();
        self.plans.lock().unwrap().push(plan.clone());
        Ok(())
    }
}

/// 对包含指定文本的句子返回 ServiceUnavailable
struct UnavailableEngine {
    trigger: String,
    inner: Arc<dyn TtsEnginePort>,
}

#[async_trait]
impl TtsEnginePort for UnavailableEngine {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        if request.text.contains(&self.trigger) {
            return Err(TtsError::ServiceUnavailable { attempts: 3 });
        }
        self.inner.synthesize(request).await
    }

    async fn duration(&self, audio_path: &Path) -> Result<u64, TtsError> {
        self.inner.duration(audio_path).await
    }
}

#[derive(Default)]
pub(crate) struct HarnessOptions {
    /// 渲染该条目时模拟编码失败
    pub fail_render_for: Option<String>,
    /// 合成包含该文本的句子时模拟 TTS 全部不可用
    pub unavailable_text: Option<String>,
}

/// 内存数据库 + 临时目录 + 假 TTS + 记录型后端组装成的完整编排器
pub(crate) struct Harness {
    _dir: TempDir,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub storage: Arc<FileArtifactStorage>,
    pub backend: Arc<RecordingBackend>,
    pub jobs: Arc<SqliteJobRepository>,
    pub filter_repo: Arc<SqliteFilterWordRepository>,
    pub claims: Arc<InMemoryJobClaims>,
    pub shutdown: CancellationToken,
}

impl Harness {
    pub(crate) async fn new(options: HarnessOptions) -> Self {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let jobs = Arc::new(SqliteJobRepository::new(pool.clone()));
        let filter_repo = Arc::new(SqliteFilterWordRepository::new(pool));

        let (dir, storage) = temp_storage();
        let codec: Arc<dyn AudioCodecPort> = Arc::new(SymphoniaCodec::new());

        let engine: Arc<dyn TtsEnginePort> = match options.unavailable_text {
            Some(trigger) => Arc::new(UnavailableEngine {
                trigger,
                inner: fake_engine(),
            }),
            None => fake_engine(),
        };

        let backend = Arc::new(match options.fail_render_for {
            Some(id) => RecordingBackend::failing_for(&id),
            None => RecordingBackend::default(),
        });

        let pool = BackgroundPool::new(vec![BackgroundClip {
            path: PathBuf::from("backgrounds/bg.mp4"),
            duration_secs: 600.0,
            width: Some(1080),
        }]);

        let claims = Arc::new(InMemoryJobClaims::new());
        let shutdown = CancellationToken::new();
        let orchestrator = PipelineOrchestrator::new(
            jobs.clone(),
            filter_repo.clone(),
            storage.clone(),
            claims.clone(),
            ScriptBuilder::new(engine, storage.clone(), Default::default()),
            AudioMerger::new(codec, storage.clone()),
            VideoComposer::new(
                backend.clone(),
                storage.clone(),
                pool,
                VideoComposerConfig::default(),
            ),
            OrchestratorConfig::default(),
            shutdown.clone(),
        );

        Self {
            _dir: dir,
            orchestrator: Arc::new(orchestrator),
            storage,
            backend,
            jobs,
            filter_repo,
            claims,
            shutdown,
        }
    }

    /// 登记条目，来源 URL 为 `https://example.com/{id}`
    pub(crate) async fn register(&self, id: &str, title: &str, content: &str) -> JobId {
        let job = NewJob {
            id: JobId::new(id).unwrap(),
            source: "test".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            score: 1,
            author: "tester".to_string(),
            created_at: Utc::now(),
            source_url: format!("https://example.com/{}", id),
        };
        self.jobs.register(&job).await.unwrap();
        job.id
    }

    pub(crate) async fn job(&self, id: &JobId) -> JobRecord {
        self.jobs.find_by_id(id).await.unwrap().unwrap()
    }
}
