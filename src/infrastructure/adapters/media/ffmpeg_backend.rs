//! FFmpeg Backend - 基于 ffmpeg/ffprobe 子进程的媒体后端
//!
//! 实现 MediaBackendPort trait
//!
//! 渲染输入：
//! - 0: 背景视频（`-ss` 裁剪起点，`-t` 旁白时长）
//! - 1: 合并后的旁白 WAV（替换背景原声）
//! - 2: 标题图片（可选，循环输入）

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::application::ports::{MediaBackendPort, MediaInfo, RenderError, RenderPlan};

/// 失败时保留的 stderr 行数
const STDERR_TAIL_LINES: usize = 8;

/// FFmpeg 后端配置
#[derive(Debug, Clone)]
pub struct FfmpegBackendConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// 单次渲染超时（秒）
    pub render_timeout_secs: u64,
}

impl Default for FfmpegBackendConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            render_timeout_secs: 1800,
        }
    }
}

/// FFmpeg 媒体后端
pub struct FfmpegBackend {
    config: FfmpegBackendConfig,
}

impl FfmpegBackend {
    pub fn new(config: FfmpegBackendConfig) -> Self {
        Self { config }
    }
}

/// FFprobe JSON 输出
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// 解析 ffprobe 输出
fn parse_probe_output(path: &Path, stdout: &[u8]) -> Result<MediaInfo, RenderError> {
    let failed = |message: String| RenderError::ProbeFailed {
        path: path.display().to_string(),
        message,
    };

    let probe: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| failed(format!("invalid ffprobe output: {}", e)))?;

    let duration_secs = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| failed("missing duration".to_string()))?;

    let video = probe.streams.iter().find(|s| s.codec_type == "video");

    Ok(MediaInfo {
        duration_secs,
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
    })
}

/// 转义滤镜参数中的路径
///
/// 滤镜图和滤镜选项各反转义一次，所以需要转义两层。
fn escape_filter_path(path: &Path) -> String {
    let option_level = escape_chars(&path.to_string_lossy(), &['\\', ':', '\'']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 构建滤镜图，输出标签为 `[v]`
fn build_filter_graph(plan: &RenderPlan) -> String {
    let mut filters = Vec::new();
    let mut video = "[0:v]".to_string();

    if let Some(title) = &plan.title {
        let width = plan
            .background_width
            .map(|w| w.to_string())
            .unwrap_or_else(|| "iw".to_string());
        filters.push(format!("[2:v]scale={}:-1[title]", width));
        filters.push(format!(
            "{}[title]overlay=(W-w)/2:(H-h)/2:enable='between(t,0,{:.3})'[ov]",
            video, title.duration_secs
        ));
        video = "[ov]".to_string();
    }

    match &plan.burn_subtitles {
        Some(srt) => filters.push(format!(
            "{}subtitles=filename={}:force_style='{}'[v]",
            video,
            escape_filter_path(srt),
            plan.encoding.subtitle_style
        )),
        None => filters.push(format!("{}null[v]", video)),
    }

    filters.join(";")
}

/// 构建 ffmpeg 渲染参数
pub fn build_render_args(plan: &RenderPlan) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-v".into(), "error".into()];

    args.extend([
        "-ss".to_string(),
        format!("{:.3}", plan.trim_start_secs),
        "-t".to_string(),
        format!("{:.3}", plan.duration_secs),
        "-i".to_string(),
        plan.background.to_string_lossy().to_string(),
    ]);

    args.extend(["-i".to_string(), plan.narration.to_string_lossy().to_string()]);

    if let Some(title) = &plan.title {
        args.extend([
            "-loop".to_string(),
            "1".to_string(),
            "-t".to_string(),
            format!("{:.3}", title.duration_secs),
            "-i".to_string(),
            title.image.to_string_lossy().to_string(),
        ]);
    }

    args.extend([
        "-filter_complex".to_string(),
        build_filter_graph(plan),
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-r".to_string(),
        plan.encoding.fps.to_string(),
        "-c:v".to_string(),
        plan.encoding.video_codec.clone(),
        "-b:v".to_string(),
        plan.encoding.video_bitrate.clone(),
        "-c:a".to_string(),
        plan.encoding.audio_codec.clone(),
        "-shortest".to_string(),
        plan.output.to_string_lossy().to_string(),
    ]);

    args
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl MediaBackendPort for FfmpegBackend {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, RenderError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(RenderError::ProbeFailed {
                path: path.display().to_string(),
                message: "file not found".to_string(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RenderError::ProbeFailed {
                path: path.display().to_string(),
                message: format!("cannot run {}: {}", self.config.ffprobe_path.display(), e),
            })?;

        if !output.status.success() {
            return Err(RenderError::ProbeFailed {
                path: path.display().to_string(),
                message: stderr_tail(&output.stderr),
            });
        }

        parse_probe_output(path, &output.stdout)
    }

    async fn render(&self, plan: &RenderPlan) -> Result<(), RenderError> {
        let args = build_render_args(plan);
        tracing::debug!(args = %args.join(" "), "Running ffmpeg");

        let child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RenderError::BackendFailed(format!(
                    "cannot run {}: {}",
                    self.config.ffmpeg_path.display(),
                    e
                ))
            })?;

        let timeout_secs = self.config.render_timeout_secs;
        let output = match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result.map_err(|e| RenderError::Io(e.to_string()))?,
            Err(_) => {
                // 超时后子进程随 future 一起被丢弃并终止
                tracing::warn!(timeout_secs, output = %plan.output.display(), "ffmpeg timed out");
                return Err(RenderError::Timeout(timeout_secs));
            }
        };

        if !output.status.success() {
            return Err(RenderError::BackendFailed(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        tracing::info!(output = %plan.output.display(), "ffmpeg render completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{EncodingSettings, TitleOverlay};

    fn plan(title: bool, burn: bool) -> RenderPlan {
        RenderPlan {
            background: PathBuf::from("/bg/minecraft.mp4"),
            background_width: Some(1080),
            trim_start_secs: 12.5,
            duration_secs: 42.125,
            narration: PathBuf::from("/out/abc.wav"),
            title: title.then(|| TitleOverlay {
                image: PathBuf::from("/titles/abc.png"),
                duration_secs: 3.2,
            }),
            burn_subtitles: burn.then(|| PathBuf::from("/tmp/abc/burn_abc.srt")),
            output: PathBuf::from("/out/abc.mp4"),
            encoding: EncodingSettings {
                fps: 60,
                video_codec: "libx264".to_string(),
                video_bitrate: "8000k".to_string(),
                audio_codec: "aac".to_string(),
                subtitle_style: "FontName=Tahoma".to_string(),
            },
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    #[test]
    fn test_render_args_with_title_and_subtitles() {
        let args = build_render_args(&plan(true, true));

        assert_eq!(value_after(&args, "-ss"), Some("12.500"));
        assert_eq!(value_after(&args, "-t"), Some("42.125"));
        assert_eq!(value_after(&args, "-loop"), Some("1"));
        assert_eq!(value_after(&args, "-r"), Some("60"));
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-b:v"), Some("8000k"));
        assert_eq!(value_after(&args, "-c:a"), Some("aac"));
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().map(|s| s.as_str()), Some("/out/abc.mp4"));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 3);

        let graph = value_after(&args, "-filter_complex").unwrap();
        assert!(graph.contains("[2:v]scale=1080:-1[title]"));
        assert!(graph.contains("enable='between(t,0,3.200)'"));
        assert!(graph.contains("[ov]subtitles=filename=/tmp/abc/burn_abc.srt"));
        assert!(graph.ends_with("[v]"));
    }

    #[test]
    fn test_render_args_without_title() {
        let args = build_render_args(&plan(false, false));

        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
        assert!(!args.contains(&"-loop".to_string()));
        assert_eq!(value_after(&args, "-filter_complex"), Some("[0:v]null[v]"));
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new("C:/clips/it's.srt")),
            "C\\\\:/clips/it\\\\\\'s.srt"
        );
        assert_eq!(
            escape_filter_path(Path::new("/tmp/a,b [x];c.srt")),
            "/tmp/a\\,b \\[x\\]\\;c.srt"
        );
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "format": {"duration": "93.400000"},
            "streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 1080, "height": 1920}
            ]
        }"#;
        let info = parse_probe_output(Path::new("bg.mp4"), json).unwrap();
        assert!((info.duration_secs - 93.4).abs() < 1e-9);
        assert_eq!(info.width, Some(1080));
        assert_eq!(info.height, Some(1920));

        let err = parse_probe_output(Path::new("bg.mp4"), br#"{"format": {}}"#).unwrap_err();
        assert!(matches!(err, RenderError::ProbeFailed { .. }));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let backend = FfmpegBackend::new(FfmpegBackendConfig::default());
        let err = backend
            .probe(Path::new("/nonexistent/background.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::ProbeFailed { .. }));
    }
}
