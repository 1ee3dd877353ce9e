//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait，支持多端点故障切换
//!
//! 外部 TTS API:
//! POST {endpoint}
//! Request: {"text": "...", "voice": "en_us_006"}  (JSON)
//! Response (inline): {"data": "<base64>"}
//! Response (nested): {"audio": "data:audio/mpeg;base64,<base64>"}
//!
//! 可用性探测: GET 端点源站根路径，HTTP 200 视为可用

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::ports::{
    AudioCodecPort, PcmAudio, SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError,
};
use crate::domain::split_into_chunks;

/// 音色不可用时服务返回的占位内容
const ERROR_SENTINEL: &str = "error";

/// 端点响应格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `{"data": "<base64>"}`
    Inline,
    /// `{"audio": "data:audio/mpeg;base64,<base64>"}`
    Nested,
}

/// TTS 端点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsEndpoint {
    pub url: String,
    pub shape: ResponseShape,
}

impl TtsEndpoint {
    pub fn new(url: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            url: url.into(),
            shape,
        }
    }

    /// 探测地址：端点源站根路径
    pub fn probe_url(&self) -> Result<String, TtsError> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| TtsError::InvalidResponse(format!("Invalid endpoint url {}: {}", self.url, e)))?;
        Ok(format!("{}/", url.origin().ascii_serialization()))
    }
}

/// 默认端点列表
pub fn default_endpoints() -> Vec<TtsEndpoint> {
    vec![
        TtsEndpoint::new(
            "https://tiktok-tts.weilnet.workers.dev/api/generation",
            ResponseShape::Inline,
        ),
        TtsEndpoint::new("https://tiktoktts.com/api/tiktok-tts", ResponseShape::Nested),
    ]
}

/// TTS 请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

#[derive(Debug, Deserialize)]
struct InlineBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedBody {
    audio: Option<String>,
}

/// 按端点格式解析出的音频载荷
#[derive(Debug, Clone, PartialEq, Eq)]
enum AudioPayload {
    Inline { base64: String },
    Nested { base64: String },
}

impl AudioPayload {
    /// 按端点格式解析响应体
    fn parse(shape: ResponseShape, body: &[u8]) -> Result<Self, TtsError> {
        let invalid = |e: serde_json::Error| TtsError::InvalidResponse(format!("Malformed body: {}", e));

        let payload = match shape {
            ResponseShape::Inline => {
                let body: InlineBody = serde_json::from_slice(body).map_err(invalid)?;
                let data = body
                    .data
                    .ok_or_else(|| TtsError::InvalidResponse("Missing `data` field".to_string()))?;
                AudioPayload::Inline { base64: data }
            }
            ResponseShape::Nested => {
                let body: NestedBody = serde_json::from_slice(body).map_err(invalid)?;
                let audio = body
                    .audio
                    .ok_or_else(|| TtsError::InvalidResponse("Missing `audio` field".to_string()))?;
                // 去掉 data URI 前缀
                let data = match audio.split_once(',') {
                    Some((_, data)) => data.to_string(),
                    None => audio,
                };
                AudioPayload::Nested { base64: data }
            }
        };

        if payload.base64().trim() == ERROR_SENTINEL {
            return Err(TtsError::InvalidVoice(
                "voice is unavailable on this endpoint".to_string(),
            ));
        }
        Ok(payload)
    }

    fn base64(&self) -> &str {
        match self {
            AudioPayload::Inline { base64 } | AudioPayload::Nested { base64 } => base64,
        }
    }

    fn decode(&self) -> Result<Vec<u8>, TtsError> {
        STANDARD
            .decode(self.base64().trim())
            .map_err(|e| TtsError::InvalidResponse(format!("Invalid base64 audio: {}", e)))
    }
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// 可互换的端点（按顺序轮换）
    pub endpoints: Vec<TtsEndpoint>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 探测轮数，也是请求失败后换端点重试的上限
    pub max_attempts: u32,
    /// 探测轮之间的等待时间
    pub retry_delay: Duration,
    /// 单次请求字符上限
    pub chunk_limit: usize,
    /// 允许的音色（为空时不限制）
    pub allowed_voices: Vec<String>,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            timeout_secs: 60,
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            chunk_limit: crate::domain::DEFAULT_CHUNK_LIMIT,
            allowed_voices: Vec::new(),
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(endpoints: Vec<TtsEndpoint>) -> Self {
        Self {
            endpoints,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay = delay;
        self
    }
}

/// 端点选择状态（进程内唯一，由锁保护）
#[derive(Debug, Default)]
struct EndpointState {
    current: usize,
    probes: u64,
    requests: u64,
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
    codec: Arc<dyn AudioCodecPort>,
    state: Mutex<EndpointState>,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig, codec: Arc<dyn AudioCodecPort>) -> Result<Self, TtsError> {
        if config.endpoints.is_empty() {
            return Err(TtsError::ServiceUnavailable { attempts: 0 });
        }
        for endpoint in &config.endpoints {
            endpoint.probe_url()?;
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            codec,
            state: Mutex::new(EndpointState::default()),
        })
    }

    /// 当前端点下标
    pub async fn current_endpoint(&self) -> usize {
        self.state.lock().await.current
    }

    async fn probe(&self, endpoint: &TtsEndpoint) -> bool {
        let url = match endpoint.probe_url() {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.client.get(&url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "TTS endpoint probe failed");
                false
            }
        }
    }

    /// 选择可用端点
    ///
    /// 每轮先探测当前端点，失败则轮换到下一个再探测；
    /// 整个过程持有状态锁，轮换结果对后续调用可见。
    async fn select_endpoint(&self) -> Result<(usize, TtsEndpoint), TtsError> {
        let mut state = self.state.lock().await;
        let count = self.config.endpoints.len();

        for attempt in 1..=self.config.max_attempts {
            let endpoint = &self.config.endpoints[state.current];
            state.probes += 1;
            if self.probe(endpoint).await {
                return Ok((state.current, endpoint.clone()));
            }

            state.current = (state.current + 1) % count;
            let endpoint = &self.config.endpoints[state.current];
            tracing::info!(endpoint = %endpoint.url, attempt, "Rotated TTS endpoint");
            state.probes += 1;
            if self.probe(endpoint).await {
                return Ok((state.current, endpoint.clone()));
            }

            tracing::warn!(attempt, max_attempts = self.config.max_attempts, "TTS service not available");
            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(TtsError::ServiceUnavailable {
            attempts: self.config.max_attempts,
        })
    }

    /// 请求失败后从 `failed` 轮换到下一个端点；其他调用已轮换过则不动
    async fn rotate_from(&self, failed: usize) {
        let mut state = self.state.lock().await;
        if state.current == failed {
            state.current = (failed + 1) % self.config.endpoints.len();
            tracing::info!(
                endpoint = %self.config.endpoints[state.current].url,
                "Rotated TTS endpoint after request failure"
            );
        }
    }

    /// 每块一个任务并发请求，结果按块顺序返回
    async fn request_chunks(
        &self,
        endpoint: &TtsEndpoint,
        chunks: &[String],
        voice: &str,
    ) -> Result<Vec<Vec<u8>>, TtsError> {
        let tasks: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                tokio::spawn(request_chunk(
                    self.client.clone(),
                    endpoint.clone(),
                    chunk.clone(),
                    voice.to_string(),
                ))
            })
            .collect();

        // join_all 按提交顺序返回结果，与完成顺序无关
        let mut encoded = Vec::with_capacity(tasks.len());
        for result in futures_util::future::join_all(tasks).await {
            let data = result.map_err(|e| TtsError::Io(format!("Chunk task failed: {}", e)))??;
            encoded.push(data);
        }

        self.state.lock().await.requests += encoded.len() as u64;
        Ok(encoded)
    }

    fn check_voice(&self, voice: &str) -> Result<(), TtsError> {
        if voice.trim().is_empty() {
            return Err(TtsError::InvalidVoice("no voice selected".to_string()));
        }
        if !self.config.allowed_voices.is_empty()
            && !self.config.allowed_voices.iter().any(|v| v == voice)
        {
            return Err(TtsError::InvalidVoice(voice.to_string()));
        }
        Ok(())
    }
}

/// 请求单个文本块，返回编码后的音频字节
async fn request_chunk(
    client: Client,
    endpoint: TtsEndpoint,
    text: String,
    voice: String,
) -> Result<Vec<u8>, TtsError> {
    let response = client
        .post(&endpoint.url)
        .json(&TtsHttpRequest {
            text: &text,
            voice: &voice,
        })
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                TtsError::Timeout
            } else if e.is_connect() {
                TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
            } else {
                TtsError::NetworkError(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(TtsError::NetworkError(format!("HTTP {}: {}", status, error_text)));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TtsError::InvalidResponse(format!("Failed to read body: {}", e)))?;

    AudioPayload::parse(endpoint.shape, &body)?.decode()
}

/// 解码各块音频并按顺序拼接、变速、编码为 WAV
fn assemble(
    codec: &dyn AudioCodecPort,
    encoded: &[Vec<u8>],
    speed: f32,
) -> Result<(Vec<u8>, u64), TtsError> {
    let mut merged: Option<PcmAudio> = None;
    for data in encoded {
        let pcm = codec.decode(data)?;
        match merged.as_mut() {
            None => merged = Some(pcm),
            Some(track) => {
                let pcm = codec.conform(&pcm, track.sample_rate, track.channels)?;
                track.append(&pcm)?;
            }
        }
    }

    let merged = merged.ok_or_else(|| TtsError::InvalidResponse("No audio returned".to_string()))?;
    let adjusted = codec.change_speed(&merged, speed)?;
    let wav = codec.encode_wav(&adjusted)?;
    Ok((wav, adjusted.duration_ms()))
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        if request.text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }
        self.check_voice(&request.voice)?;

        let chunks = split_into_chunks(&request.text, self.config.chunk_limit);

        // 端点每轮只选择一次，所有块共用；请求失败则换端点重试
        let mut attempt = 0;
        let (endpoint, encoded) = loop {
            attempt += 1;
            let (index, endpoint) = self.select_endpoint().await?;

            tracing::debug!(
                endpoint = %endpoint.url,
                attempt,
                text_len = request.text.len(),
                chunks = chunks.len(),
                voice = %request.voice,
                "Sending TTS request"
            );

            match self.request_chunks(&endpoint, &chunks, &request.voice).await {
                Ok(encoded) => break (endpoint, encoded),
                Err(e) if e.is_endpoint_failure() => {
                    tracing::warn!(
                        endpoint = %endpoint.url,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "TTS request failed"
                    );
                    self.rotate_from(index).await;
                    if attempt >= self.config.max_attempts {
                        return Err(TtsError::ServiceUnavailable {
                            attempts: self.config.max_attempts,
                        });
                    }
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        let codec = self.codec.clone();
        let speed = request.speed;
        let (audio_data, duration_ms) =
            tokio::task::spawn_blocking(move || assemble(codec.as_ref(), &encoded, speed))
                .await
                .map_err(|e| TtsError::Io(format!("Audio assembly failed: {}", e)))??;

        tracing::info!(
            endpoint = %endpoint.url,
            chunks = chunks.len(),
            duration_ms,
            audio_size = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_data,
            duration_ms,
            endpoint: Some(endpoint.url),
            chunk_count: chunks.len(),
        })
    }

    async fn duration(&self, audio_path: &Path) -> Result<u64, TtsError> {
        let data = match tokio::fs::read(audio_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(TtsError::Io(e.to_string())),
        };
        Ok(self.codec.duration_ms(&data)?)
    }

    async fn health_check(&self) -> bool {
        let endpoint = {
            let state = self.state.lock().await;
            self.config.endpoints[state.current].clone()
        };
        self.probe(&endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::SymphoniaCodec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn codec() -> Arc<dyn AudioCodecPort> {
        Arc::new(SymphoniaCodec::new())
    }

    /// 固定电平的 16kHz 单声道 WAV 的 base64
    fn wav_b64(ms: u64, level: f32) -> String {
        let frames = crate::application::ports::frames_for_ms(16000, ms);
        let pcm = PcmAudio::new(vec![level; frames], 16000, 1);
        STANDARD.encode(SymphoniaCodec::new().encode_wav(&pcm).unwrap())
    }

    async fn mount_probe(server: &MockServer, status: u16) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    fn client_for(endpoints: Vec<TtsEndpoint>) -> HttpTtsClient {
        let config = HttpTtsClientConfig::new(endpoints)
            .with_timeout(5)
            .with_retry(3, Duration::ZERO);
        HttpTtsClient::new(config, codec()).unwrap()
    }

    #[test]
    fn test_probe_url_is_origin() {
        let endpoint = TtsEndpoint::new(
            "https://tiktok-tts.weilnet.workers.dev/api/generation",
            ResponseShape::Inline,
        );
        assert_eq!(
            endpoint.probe_url().unwrap(),
            "https://tiktok-tts.weilnet.workers.dev/"
        );
        let local = TtsEndpoint::new("http://127.0.0.1:8080/api/tts", ResponseShape::Nested);
        assert_eq!(local.probe_url().unwrap(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_parse_payload_shapes() {
        let inline = AudioPayload::parse(ResponseShape::Inline, br#"{"success":true,"data":"QUJD"}"#)
            .unwrap();
        assert_eq!(inline.decode().unwrap(), b"ABC");

        let nested =
            AudioPayload::parse(ResponseShape::Nested, br#"{"audio":"data:audio/mpeg;base64,QUJD"}"#)
                .unwrap();
        assert_eq!(nested.decode().unwrap(), b"ABC");

        let sentinel = AudioPayload::parse(ResponseShape::Inline, br#"{"data":"error"}"#).unwrap_err();
        assert!(matches!(sentinel, TtsError::InvalidVoice(_)));

        let missing = AudioPayload::parse(ResponseShape::Nested, br#"{"data":"QUJD"}"#).unwrap_err();
        assert!(matches!(missing, TtsError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_synthesize_inline_endpoint() {
        let server = MockServer::start().await;
        mount_probe(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/api/generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": wav_b64(500, 0.1) })))
            .mount(&server)
            .await;

        let client = client_for(vec![TtsEndpoint::new(
            format!("{}/api/generation", server.uri()),
            ResponseShape::Inline,
        )]);

        let audio = client
            .synthesize(SynthesisRequest::new("hello world", "en_us_006"))
            .await
            .unwrap();
        assert_eq!(audio.duration_ms, 500);
        assert_eq!(audio.chunk_count, 1);
        assert_eq!(&audio.audio_data[0..4], b"RIFF");
    }

    /// 按请求文本的首字母返回不同时长和电平的音频，首块延迟最长
    struct ChunkResponder;

    impl Respond for ChunkResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            let text = body["text"].as_str().unwrap_or_default();
            let (ms, level, delay) = match text.chars().next() {
                Some('a') => (100, 0.1, 300),
                Some('b') => (200, 0.2, 150),
                _ => (300, 0.3, 0),
            };
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": wav_b64(ms, level) }))
                .set_delay(Duration::from_millis(delay))
        }
    }

    #[tokio::test]
    async fn test_long_text_chunks_reassembled_in_order() {
        let server = MockServer::start().await;
        mount_probe(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/api/generation"))
            .respond_with(ChunkResponder)
            .mount(&server)
            .await;

        let text = [
            vec!["aaaa"; 60].join(" "),
            vec!["bbbb"; 60].join(" "),
            vec!["cccc"; 10].join(" "),
        ]
        .join(" ");
        assert!(text.chars().count() > 600);

        let client = client_for(vec![TtsEndpoint::new(
            format!("{}/api/generation", server.uri()),
            ResponseShape::Inline,
        )]);
        let audio = client
            .synthesize(SynthesisRequest::new(text, "en_us_006"))
            .await
            .unwrap();

        assert_eq!(audio.chunk_count, 3);
        assert_eq!(audio.duration_ms, 600);

        let pcm = SymphoniaCodec::new().decode(&audio.audio_data).unwrap();
        assert!((pcm.samples[800] - 0.1).abs() < 0.01);
        assert!((pcm.samples[1600 + 1600] - 0.2).abs() < 0.01);
        assert!((pcm.samples[4800 + 2400] - 0.3).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_failover_to_second_endpoint() {
        let down = MockServer::start().await;
        mount_probe(&down, 503).await;

        let up = MockServer::start().await;
        mount_probe(&up, 200).await;
        Mock::given(method("POST"))
            .and(path("/api/tiktok-tts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "audio": format!("data:audio/mpeg;base64,{}", wav_b64(300, 0.1)) }),
            ))
            .mount(&up)
            .await;

        let second_url = format!("{}/api/tiktok-tts", up.uri());
        let client = client_for(vec![
            TtsEndpoint::new(format!("{}/api/generation", down.uri()), ResponseShape::Inline),
            TtsEndpoint::new(second_url.clone(), ResponseShape::Nested),
        ]);

        let first = client
            .synthesize(SynthesisRequest::new("first call", "en_us_006"))
            .await
            .unwrap();
        assert_eq!(first.endpoint.as_deref(), Some(second_url.as_str()));
        assert_eq!(client.current_endpoint().await, 1);

        // 轮换结果保留，第二次调用不再探测故障端点
        client
            .synthesize(SynthesisRequest::new("second call", "en_us_006"))
            .await
            .unwrap();
        assert_eq!(down.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_request_failure_moves_to_next_endpoint() {
        // 探测通过但合成请求失败
        let flaky = MockServer::start().await;
        mount_probe(&flaky, 200).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&flaky)
            .await;

        let healthy = MockServer::start().await;
        mount_probe(&healthy, 200).await;
        Mock::given(method("POST"))
            .and(path("/api/tiktok-tts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "audio": format!("data:audio/mpeg;base64,{}", wav_b64(400, 0.1)) }),
            ))
            .mount(&healthy)
            .await;

        let healthy_url = format!("{}/api/tiktok-tts", healthy.uri());
        let client = client_for(vec![
            TtsEndpoint::new(format!("{}/api/generation", flaky.uri()), ResponseShape::Inline),
            TtsEndpoint::new(healthy_url.clone(), ResponseShape::Nested),
        ]);

        let audio = client
            .synthesize(SynthesisRequest::new("hello there", "en_us_006"))
            .await
            .unwrap();
        assert_eq!(audio.endpoint.as_deref(), Some(healthy_url.as_str()));
        assert_eq!(audio.duration_ms, 400);
        assert_eq!(client.current_endpoint().await, 1);

        let posts = |requests: Vec<Request>| {
            requests.iter().filter(|r| r.method.as_str() == "POST").count()
        };
        assert_eq!(posts(flaky.received_requests().await.unwrap()), 1);
        assert_eq!(posts(healthy.received_requests().await.unwrap()), 1);
    }

    #[tokio::test]
    async fn test_failing_requests_exhaust_attempt_budget() {
        let a = MockServer::start().await;
        mount_probe(&a, 200).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&a)
            .await;
        let b = MockServer::start().await;
        mount_probe(&b, 200).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&b)
            .await;

        let client = client_for(vec![
            TtsEndpoint::new(format!("{}/api/generation", a.uri()), ResponseShape::Inline),
            TtsEndpoint::new(format!("{}/api/tiktok-tts", b.uri()), ResponseShape::Nested),
        ]);

        let err = client
            .synthesize(SynthesisRequest::new("still failing", "en_us_006"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::ServiceUnavailable { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_all_endpoints_down_is_service_unavailable() {
        let a = MockServer::start().await;
        mount_probe(&a, 503).await;
        let b = MockServer::start().await;
        mount_probe(&b, 500).await;

        let client = client_for(vec![
            TtsEndpoint::new(format!("{}/api/generation", a.uri()), ResponseShape::Inline),
            TtsEndpoint::new(format!("{}/api/tiktok-tts", b.uri()), ResponseShape::Nested),
        ]);

        let err = client
            .synthesize(SynthesisRequest::new("nobody home", "en_us_006"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::ServiceUnavailable { attempts: 3 }));
        assert_eq!(a.received_requests().await.unwrap().len(), 3);
        assert_eq!(b.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_error_sentinel_is_invalid_voice() {
        let server = MockServer::start().await;
        mount_probe(&server, 200).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "error" })))
            .mount(&server)
            .await;

        let client = client_for(vec![TtsEndpoint::new(
            format!("{}/api/generation", server.uri()),
            ResponseShape::Inline,
        )]);
        let err = client
            .synthesize(SynthesisRequest::new("some text", "en_us_006"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_unknown_voice_rejected_without_network() {
        let mut config = HttpTtsClientConfig::new(vec![TtsEndpoint::new(
            "http://127.0.0.1:9/api/generation",
            ResponseShape::Inline,
        )]);
        config.allowed_voices = vec!["en_us_006".to_string()];
        let client = HttpTtsClient::new(config, codec()).unwrap();

        let err = client
            .synthesize(SynthesisRequest::new("text", "xx_unknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::InvalidVoice(_)));

        let err = client
            .synthesize(SynthesisRequest::new("  ", "en_us_006"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::EmptyText));
    }
}
