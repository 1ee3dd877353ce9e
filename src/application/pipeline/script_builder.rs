//! Script Builder - 逐句合成并测量时长
//!
//! 句子按顺序合成，每句音频写入 `temp_{item}_{index}.wav`，
//! 序号随片段一路传递到合并阶段，不依赖目录枚举顺序。

use std::path::PathBuf;
use std::sync::Arc;

use super::PipelineError;
use crate::application::ports::{ArtifactStoragePort, SynthesisRequest, TtsEnginePort};
use crate::domain::job::JobId;
use crate::domain::{Script, ScriptEntry, Sentence};

/// 单句合成产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedClip {
    /// 在脚本中的位置（从 0 开始）
    pub index: usize,
    pub path: PathBuf,
    pub duration_ms: u64,
}

/// 构建结果
#[derive(Debug, Clone)]
pub struct BuiltScript {
    pub script: Script,
    /// 与 script 一一对应
    pub clips: Vec<SynthesizedClip>,
    /// 因输入无效被跳过的句子数
    pub skipped: usize,
}

/// 配置
#[derive(Debug, Clone)]
pub struct ScriptBuilderConfig {
    pub voice: String,
    pub speed: f32,
}

impl Default for ScriptBuilderConfig {
    fn default() -> Self {
        Self {
            voice: "en_us_006".to_string(),
            speed: 1.15,
        }
    }
}

pub struct ScriptBuilder {
    tts_engine: Arc<dyn TtsEnginePort>,
    storage: Arc<dyn ArtifactStoragePort>,
    config: ScriptBuilderConfig,
}

impl ScriptBuilder {
    pub fn new(
        tts_engine: Arc<dyn TtsEnginePort>,
        storage: Arc<dyn ArtifactStoragePort>,
        config: ScriptBuilderConfig,
    ) -> Self {
        Self {
            tts_engine,
            storage,
            config,
        }
    }

    /// 逐句合成
    ///
    /// 空文本和无效音色只跳过当前句子；其余 TTS 错误终止整个条目。
    pub async fn build(
        &self,
        item_id: &JobId,
        sentences: &[Sentence],
    ) -> Result<BuiltScript, PipelineError> {
        let mut script = Script::new();
        let mut clips = Vec::with_capacity(sentences.len());
        let mut skipped = 0;

        for (sentence_index, sentence) in sentences.iter().enumerate() {
            let request = SynthesisRequest::new(sentence.as_str(), &self.config.voice)
                .with_speed(self.config.speed);

            let audio = match self.tts_engine.synthesize(request).await {
                Ok(audio) => audio,
                Err(e) if e.is_invalid_input() => {
                    tracing::warn!(
                        item_id = %item_id,
                        sentence_index,
                        error = %e,
                        "Skipping sentence"
                    );
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    return Err(PipelineError::Synthesis {
                        index: sentence_index,
                        source: e,
                    });
                }
            };

            // 序号取脚本位置，跳过的句子不占序号
            let index = clips.len();
            let path = self.storage.clip_path(item_id, index);
            self.storage.write_durable(&path, &audio.audio_data).await?;

            let measured = self
                .tts_engine
                .duration(&path)
                .await
                .map_err(|e| PipelineError::Synthesis {
                    index: sentence_index,
                    source: e,
                })?;
            let duration_ms = if measured == 0 {
                audio.duration_ms
            } else {
                measured
            };

            tracing::debug!(
                item_id = %item_id,
                index,
                duration_ms,
                chunks = audio.chunk_count,
                "Sentence synthesized"
            );

            script.push(ScriptEntry::new(sentence.as_str(), duration_ms));
            clips.push(SynthesizedClip {
                index,
                path,
                duration_ms,
            });
        }

        if script.is_empty() {
            return Err(PipelineError::EmptyScript);
        }

        Ok(BuiltScript {
            script,
            clips,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::test_support::{fake_engine, temp_storage};
    use crate::application::ports::{SynthesizedAudio, TtsError};
    use async_trait::async_trait;
    use std::path::Path;

    fn sentences(texts: &[&str]) -> Vec<Sentence> {
        texts.iter().filter_map(|t| Sentence::new(t)).collect()
    }

    #[tokio::test]
    async fn test_build_is_index_aligned() {
        let (_dir, storage) = temp_storage();
        let builder = ScriptBuilder::new(fake_engine(), storage.clone(), Default::default());
        let id = JobId::new("abc").unwrap();
        storage.prepare(&id).await.unwrap();

        let input = sentences(&["The title", "one two three", "four five six seven"]);
        let built = builder.build(&id, &input).await.unwrap();

        assert_eq!(built.script.len(), 3);
        assert_eq!(built.clips.len(), 3);
        for (i, (entry, clip)) in built.script.entries().iter().zip(&built.clips).enumerate() {
            assert_eq!(clip.index, i);
            assert_eq!(entry.text, input[i].as_str());
            assert_eq!(entry.duration_ms, clip.duration_ms);
            assert!(entry.duration_ms > 0);
            assert!(clip.path.ends_with(format!("temp_abc_{}.wav", i)));
            assert!(clip.path.exists());
        }
    }

    /// 对包含 "bad" 的文本返回 EmptyText，对包含 "down" 的返回 ServiceUnavailable
    struct SelectiveEngine;

    #[async_trait]
    impl TtsEnginePort for SelectiveEngine {
        async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
            if request.text.contains("bad") {
                return Err(TtsError::EmptyText);
            }
            if request.text.contains("down") {
                return Err(TtsError::ServiceUnavailable { attempts: 3 });
            }
            fake_engine().synthesize(request).await
        }

        async fn duration(&self, audio_path: &Path) -> Result<u64, TtsError> {
            fake_engine().duration(audio_path).await
        }
    }

    #[tokio::test]
    async fn test_invalid_input_skips_sentence() {
        let (_dir, storage) = temp_storage();
        let builder = ScriptBuilder::new(Arc::new(SelectiveEngine), storage.clone(), Default::default());
        let id = JobId::new("skip").unwrap();
        storage.prepare(&id).await.unwrap();

        let built = builder
            .build(&id, &sentences(&["first ok", "bad one", "third ok"]))
            .await
            .unwrap();

        assert_eq!(built.skipped, 1);
        assert_eq!(built.script.len(), 2);
        assert_eq!(built.clips[1].index, 1);
        assert_eq!(built.script.entries()[1].text, "third ok");
    }

    #[tokio::test]
    async fn test_transient_failure_aborts() {
        let (_dir, storage) = temp_storage();
        let builder = ScriptBuilder::new(Arc::new(SelectiveEngine), storage.clone(), Default::default());
        let id = JobId::new("abort").unwrap();
        storage.prepare(&id).await.unwrap();

        let err = builder
            .build(&id, &sentences(&["first ok", "service down"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_all_skipped_is_empty_script() {
        let (_dir, storage) = temp_storage();
        let builder = ScriptBuilder::new(Arc::new(SelectiveEngine), storage.clone(), Default::default());
        let id = JobId::new("empty").unwrap();
        storage.prepare(&id).await.unwrap();

        let err = builder.build(&id, &sentences(&["bad", "bad again"])).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyScript));
    }
}
