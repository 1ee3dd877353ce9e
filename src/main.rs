//! StoryReel - 帖子转短视频流水线
//!
//! 启动顺序：配置 → 日志 → 数据库 → 适配器 → 背景池 → Worker → HTTP

use std::sync::Arc;

use storyreel::application::pipeline::{
    AudioMerger, BackgroundPool, OrchestratorConfig, PipelineOrchestrator, ScriptBuilder,
    VideoComposer,
};
use storyreel::application::ports::{
    AudioCodecPort, FilterWordRepositoryPort, JobCommand, JobQueuePort, TtsEnginePort,
};
use storyreel::config::{load_config, print_config, AppConfig, TtsEngineKind};
use storyreel::infrastructure::adapters::{
    FakeTtsClient, FfmpegBackend, FileArtifactStorage, HttpTtsClient, SymphoniaCodec,
};
use storyreel::infrastructure::http::{AppState, HttpServer, ServerConfig};
use storyreel::infrastructure::memory::{InMemoryJobClaims, InMemoryJobQueue};
use storyreel::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, SqliteFilterWordRepository, SqliteJobRepository,
};
use storyreel::infrastructure::worker::JobWorker;
use tokio_util::sync::CancellationToken;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},storyreel={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("StoryReel v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // 确保数据目录存在
    for dir in [
        &config.storage.temp_dir,
        &config.storage.output_dir,
        &config.storage.title_image_dir,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let pool = create_pool(&config.database.pool_config()).await?;
    run_migrations(&pool).await?;

    let job_repo = Arc::new(SqliteJobRepository::new(pool.clone()));
    let filter_repo = Arc::new(SqliteFilterWordRepository::new(pool));

    let seeded = filter_repo.seed(&config.filter.default_words).await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "Seeded default filter words");
    }

    // 适配器
    let codec: Arc<dyn AudioCodecPort> = Arc::new(SymphoniaCodec::new());
    let tts_engine: Arc<dyn TtsEnginePort> = match config.tts.engine {
        TtsEngineKind::Http => Arc::new(HttpTtsClient::new(
            config.tts.http_client_config(),
            codec.clone(),
        )?),
        TtsEngineKind::Fake => {
            tracing::warn!("Using offline TTS engine, narration will be silent");
            Arc::new(FakeTtsClient::with_defaults(codec.clone()))
        }
    };
    let storage = Arc::new(FileArtifactStorage::new(
        &config.storage.temp_dir,
        &config.storage.output_dir,
        &config.storage.title_image_dir,
    ));
    let backend = Arc::new(FfmpegBackend::new(config.video.ffmpeg_config()));

    // 背景池为空时无法渲染任何条目
    let pool = BackgroundPool::scan(&config.video.background_dir, backend.as_ref()).await?;
    if pool.is_empty() {
        anyhow::bail!(
            "No usable background videos in {}",
            config.video.background_dir.display()
        );
    }

    // 编排器
    let shutdown = CancellationToken::new();
    let claims = Arc::new(InMemoryJobClaims::new());
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        job_repo.clone(),
        filter_repo.clone(),
        storage.clone(),
        claims.clone(),
        ScriptBuilder::new(tts_engine, storage.clone(), config.tts.script_builder_config()),
        AudioMerger::new(codec, storage.clone()),
        VideoComposer::new(backend, storage.clone(), pool, config.video.composer_config()),
        OrchestratorConfig {
            gap_ms: config.pipeline.gap_ms,
            filter: config.filter.filter_config(),
        },
        shutdown.clone(),
    ));

    // 后台 Worker
    let (queue, queue_rx) = InMemoryJobQueue::channel(config.pipeline.queue_capacity);
    let queue = Arc::new(queue);
    let worker = JobWorker::new(queue_rx, orchestrator, shutdown.clone());
    let worker_handle = tokio::spawn(worker.run());

    if config.pipeline.process_on_startup {
        queue.submit(JobCommand::ProcessUnmade)?;
    }

    // 关闭信号
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            return;
        }
        tracing::info!("Received shutdown signal");
        signal_token.cancel();
    });

    // HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(job_repo, filter_repo, storage, claims, queue);
    let server = HttpServer::new(server_config, state);

    server
        .run_with_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    // 当前条目完成后 Worker 退出
    shutdown.cancel();
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "JobWorker task failed");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
