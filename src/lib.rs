//! StoryReel - 帖子转短视频流水线
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Job Context: 视频任务状态机
//! - 内容过滤、TTS 分块、脚本、字幕时间轴
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, AudioCodec, MediaBackend, ArtifactStorage, Repositories, JobControl）
//! - Pipeline: ScriptBuilder, AudioMerger, VideoComposer, PipelineOrchestrator
//! - Commands / Queries: 控制 API 的 CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 控制 API
//! - Memory: 运行中条目登记、命令队列
//! - Worker: JobWorker 后台流水线
//! - Persistence: SQLite 任务状态和过滤词
//! - Adapters: TTS Client, 音频编解码, ffmpeg 后端, 文件存储

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
