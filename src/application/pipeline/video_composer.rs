//! Video Composer - 视频合成
//!
//! 负责选择并裁剪背景、计算标题叠加时长、筛选需要烧录的字幕，
//! 最终编码交给 MediaBackendPort。

use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::audio_merger::MergedAudioTrack;
use crate::application::ports::{
    ArtifactStoragePort, EncodingSettings, MediaBackendPort, RenderError, RenderPlan,
    TitleOverlay,
};
use crate::domain::job::JobId;
use crate::domain::{first_cue_duration_ms, parse_srt, render_srt, SubtitleCue};

// ============================================================================
// Background Pool
// ============================================================================

/// 背景视频
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundClip {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub width: Option<u32>,
}

/// 背景视频池
#[derive(Debug, Clone, Default)]
pub struct BackgroundPool {
    clips: Vec<BackgroundClip>,
}

impl BackgroundPool {
    pub fn new(clips: Vec<BackgroundClip>) -> Self {
        Self { clips }
    }

    /// 扫描目录下的 mp4 文件并探测时长
    ///
    /// 探测失败的文件跳过并记录警告。
    pub async fn scan(dir: &Path, backend: &dyn MediaBackendPort) -> Result<Self, RenderError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| RenderError::Io(format!("{}: {}", dir.display(), e)))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RenderError::Io(e.to_string()))?
        {
            let path = entry.path();
            let is_mp4 = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("mp4"))
                .unwrap_or(false);
            if is_mp4 {
                paths.push(path);
            }
        }
        paths.sort();

        let mut clips = Vec::with_capacity(paths.len());
        for path in paths {
            match backend.probe(&path).await {
                Ok(info) => clips.push(BackgroundClip {
                    path,
                    duration_secs: info.duration_secs,
                    width: info.width,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable background");
                }
            }
        }

        tracing::info!(count = clips.len(), dir = %dir.display(), "Background pool loaded");
        Ok(Self { clips })
    }

    pub fn clips(&self) -> &[BackgroundClip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// 在足够长的背景中随机选择一个
    pub fn select<R: Rng + ?Sized>(
        &self,
        required_secs: f64,
        rng: &mut R,
    ) -> Result<&BackgroundClip, RenderError> {
        if self.clips.is_empty() {
            return Err(RenderError::NoBackgrounds);
        }

        let candidates: Vec<&BackgroundClip> = self
            .clips
            .iter()
            .filter(|clip| clip.duration_secs >= required_secs)
            .collect();

        if candidates.is_empty() {
            let longest_secs = self
                .clips
                .iter()
                .map(|clip| clip.duration_secs)
                .fold(0.0, f64::max);
            return Err(RenderError::BackgroundTooShort {
                required_secs,
                longest_secs,
            });
        }

        Ok(candidates[rng.gen_range(0..candidates.len())])
    }
}

/// 在 [0, clip - required] 内均匀选择裁剪起点
pub fn pick_trim_start<R: Rng + ?Sized>(clip_secs: f64, required_secs: f64, rng: &mut R) -> f64 {
    let slack = clip_secs - required_secs;
    if slack <= 0.0 {
        return 0.0;
    }
    rng.gen_range(0.0..=slack)
}

// ============================================================================
// Render Context
// ============================================================================

/// 单次渲染的上下文
///
/// 统计字幕出现次数，前 `suppressed` 次不烧录文字（标题已由图片展示）。
/// 每次渲染新建，不跨渲染共享。
#[derive(Debug)]
pub struct RenderContext {
    cue_activations: usize,
    suppressed: usize,
}

impl RenderContext {
    pub fn new(suppressed: usize) -> Self {
        Self {
            cue_activations: 0,
            suppressed,
        }
    }

    /// 记录一次字幕出现，返回是否需要渲染文字
    pub fn admit(&mut self, _cue: &SubtitleCue) -> bool {
        self.cue_activations += 1;
        self.cue_activations > self.suppressed
    }

    pub fn activations(&self) -> usize {
        self.cue_activations
    }
}

// ============================================================================
// Video Composer
// ============================================================================

/// 配置
#[derive(Debug, Clone)]
pub struct VideoComposerConfig {
    pub encoding: EncodingSettings,
    /// 不烧录文字的前置字幕条数
    pub suppressed_leading_cues: usize,
}

impl Default for VideoComposerConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingSettings {
                fps: 60,
                video_codec: "libx264".to_string(),
                video_bitrate: "8000k".to_string(),
                audio_codec: "aac".to_string(),
                subtitle_style: "FontName=Tahoma,Bold=1,FontSize=13,PrimaryColour=&H00FFFFFF,Alignment=10".to_string(),
            },
            suppressed_leading_cues: 2,
        }
    }
}

/// 渲染请求
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub item_id: &'a JobId,
    pub narration: &'a MergedAudioTrack,
    /// 已写入磁盘的字幕文件（标题时长以它为准）
    pub subtitles: &'a Path,
    pub title_image: Option<&'a Path>,
    pub output: &'a Path,
}

pub struct VideoComposer {
    backend: Arc<dyn MediaBackendPort>,
    storage: Arc<dyn ArtifactStoragePort>,
    pool: BackgroundPool,
    config: VideoComposerConfig,
}

impl VideoComposer {
    pub fn new(
        backend: Arc<dyn MediaBackendPort>,
        storage: Arc<dyn ArtifactStoragePort>,
        pool: BackgroundPool,
        config: VideoComposerConfig,
    ) -> Self {
        Self {
            backend,
            storage,
            pool,
            config,
        }
    }

    pub fn pool(&self) -> &BackgroundPool {
        &self.pool
    }

    /// 渲染视频，返回实际执行的渲染计划
    pub async fn render(&self, request: RenderRequest<'_>) -> Result<RenderPlan, RenderError> {
        let required_secs = request.narration.total_duration_secs();
        let (background, trim_start_secs) = {
            let mut rng = rand::thread_rng();
            let clip = self.pool.select(required_secs, &mut rng)?.clone();
            let start = pick_trim_start(clip.duration_secs, required_secs, &mut rng);
            (clip, start)
        };

        let srt = tokio::fs::read_to_string(request.subtitles)
            .await
            .map_err(|e| {
                RenderError::MissingAsset(format!("{}: {}", request.subtitles.display(), e))
            })?;

        let title = self.title_overlay(request.item_id, request.title_image, &srt).await?;
        let burn_subtitles = self.write_burn_subtitles(request.item_id, &srt).await?;

        let plan = RenderPlan {
            background: background.path.clone(),
            background_width: background.width,
            trim_start_secs,
            duration_secs: required_secs,
            narration: request.narration.path.clone(),
            title,
            burn_subtitles,
            output: request.output.to_path_buf(),
            encoding: self.config.encoding.clone(),
        };

        tracing::info!(
            item_id = %request.item_id,
            background = %background.path.display(),
            trim_start_secs,
            duration_secs = required_secs,
            "Rendering video"
        );

        self.backend.render(&plan).await?;
        Ok(plan)
    }

    /// 标题叠加：时长从字幕文件的第一条读回
    async fn title_overlay(
        &self,
        item_id: &JobId,
        image: Option<&Path>,
        srt: &str,
    ) -> Result<Option<TitleOverlay>, RenderError> {
        let Some(image) = image else {
            return Ok(None);
        };
        if !self.storage.exists(image).await {
            tracing::warn!(
                item_id = %item_id,
                path = %image.display(),
                "Title image missing, rendering without overlay"
            );
            return Ok(None);
        }

        let duration_ms = first_cue_duration_ms(srt)
            .map_err(|e| RenderError::MissingAsset(format!("subtitle title cue: {}", e)))?;

        Ok(Some(TitleOverlay {
            image: image.to_path_buf(),
            duration_secs: duration_ms as f64 / 1000.0,
        }))
    }

    /// 写出需要烧录的字幕（跳过前置条目）
    async fn write_burn_subtitles(
        &self,
        item_id: &JobId,
        srt: &str,
    ) -> Result<Option<PathBuf>, RenderError> {
        let cues = parse_srt(srt).map_err(|e| RenderError::MissingAsset(e.to_string()))?;
        let burned = select_burned_cues(&cues, self.config.suppressed_leading_cues);
        if burned.is_empty() {
            return Ok(None);
        }

        let path = self
            .storage
            .temp_dir(item_id)
            .join(format!("burn_{}.srt", item_id));
        self.storage
            .write_durable(&path, render_srt(&burned).as_bytes())
            .await
            .map_err(|e| RenderError::Io(e.to_string()))?;
        Ok(Some(path))
    }
}

/// 用新的渲染上下文筛选需要烧录的字幕
pub fn select_burned_cues(cues: &[SubtitleCue], suppressed: usize) -> Vec<SubtitleCue> {
    let mut context = RenderContext::new(suppressed);
    cues.iter()
        .filter(|cue| context.admit(cue))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::test_support::{temp_storage, RecordingBackend};
    use crate::domain::{generate_cues, Script, ScriptEntry};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clip(name: &str, secs: f64) -> BackgroundClip {
        BackgroundClip {
            path: PathBuf::from(name),
            duration_secs: secs,
            width: Some(1080),
        }
    }

    #[test]
    fn test_only_long_enough_background_selected() {
        let pool = BackgroundPool::new(vec![clip("short.mp4", 30.0), clip("long.mp4", 45.0)]);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = pool.select(40.0, &mut rng).unwrap();
            assert_eq!(chosen.path, PathBuf::from("long.mp4"));
        }
    }

    #[test]
    fn test_background_too_short() {
        let pool = BackgroundPool::new(vec![clip("a.mp4", 30.0), clip("b.mp4", 35.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        match pool.select(40.0, &mut rng) {
            Err(RenderError::BackgroundTooShort {
                required_secs,
                longest_secs,
            }) => {
                assert_eq!(required_secs, 40.0);
                assert_eq!(longest_secs, 35.0);
            }
            other => panic!("expected BackgroundTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            BackgroundPool::default().select(1.0, &mut rng),
            Err(RenderError::NoBackgrounds)
        ));
    }

    #[test]
    fn test_trim_start_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let start = pick_trim_start(45.0, 40.0, &mut rng);
            assert!((0.0..=5.0).contains(&start));
        }
        assert_eq!(pick_trim_start(40.0, 40.0, &mut rng), 0.0);
    }

    #[test]
    fn test_first_two_cues_suppressed_per_render() {
        let script = Script::from(vec![
            ScriptEntry::new("title", 1000),
            ScriptEntry::new("first", 1000),
            ScriptEntry::new("second", 1000),
            ScriptEntry::new("third", 1000),
        ]);
        let cues = generate_cues(&script, 100);

        let burned = select_burned_cues(&cues, 2);
        let texts: Vec<&str> = burned.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "third"]);

        // 第二次渲染使用新的计数器，结果相同
        let again = select_burned_cues(&cues, 2);
        assert_eq!(again, burned);
    }

    async fn render_fixture(
        with_image: bool,
    ) -> (tempfile::TempDir, Arc<RecordingBackend>, Result<RenderPlan, RenderError>) {
        let (dir, storage) = temp_storage();
        let id = JobId::new("video").unwrap();
        storage.prepare(&id).await.unwrap();
        let outputs = storage.output_paths(&id);

        let script = Script::from(vec![
            ScriptEntry::new("title", 2345),
            ScriptEntry::new("one", 1000),
            ScriptEntry::new("two", 1000),
        ]);
        let srt = render_srt(&generate_cues(&script, 100));
        storage
            .write_durable(&outputs.subtitles, srt.as_bytes())
            .await
            .unwrap();

        let image = dir.path().join("title.png");
        if with_image {
            tokio::fs::write(&image, b"png").await.unwrap();
        }

        let narration = MergedAudioTrack {
            path: outputs.audio.clone(),
            total_duration_ms: script.total_duration_ms(100),
            sample_rate: 16000,
            channels: 1,
        };

        let backend = Arc::new(RecordingBackend::default());
        let composer = VideoComposer::new(
            backend.clone(),
            storage.clone(),
            BackgroundPool::new(vec![clip("bg.mp4", 60.0)]),
            VideoComposerConfig::default(),
        );

        let result = composer
            .render(RenderRequest {
                item_id: &id,
                narration: &narration,
                subtitles: &outputs.subtitles,
                title_image: Some(&image),
                output: &outputs.video,
            })
            .await;

        (dir, backend, result)
    }

    #[tokio::test]
    async fn test_render_plan_uses_subtitle_file_for_title() {
        let (_dir, backend, result) = render_fixture(true).await;
        let plan = result.unwrap();

        assert_eq!(plan.duration_secs, 4.545);
        assert!(plan.trim_start_secs >= 0.0 && plan.trim_start_secs <= 60.0 - 4.545);
        let title = plan.title.as_ref().unwrap();
        assert_eq!(title.duration_secs, 2.345);

        // 只有第三条字幕被烧录
        let burn = tokio::fs::read_to_string(plan.burn_subtitles.as_ref().unwrap())
            .await
            .unwrap();
        let cues = parse_srt(&burn).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "two");

        assert_eq!(backend.plans().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_title_image_is_recoverable() {
        let (_dir, _backend, result) = render_fixture(false).await;
        assert!(result.unwrap().title.is_none());
    }
}
