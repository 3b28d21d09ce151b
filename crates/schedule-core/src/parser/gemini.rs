//! Gemini `generateContent` client.

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::response::parse_model_output;
use super::ScheduleParser;
use crate::domain::ParsedDraft;
use crate::error::{ParserError, ParserResult};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Image descriptions run longer than JSON answers
const IMAGE_MAX_OUTPUT_TOKENS: u32 = 512;

const IMAGE_PROMPT: &str = "\
この画像からイベントや予定に関する情報を読み取ってください。
特に以下の情報を抽出してください：
- イベント名やタイトル
- 日付や時間
- 場所
- その他の重要な情報

抽出した情報を自然な日本語の予定説明文として出力してください。
例：「12月10日 14:00から 東京ホールでコンサート」";

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    256
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_model(),
            endpoint: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }

    pub fn generate_url(&self) -> String {
        let endpoint = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        format!("{}/models/{}:generateContent", endpoint.trim_end_matches('/'), self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

/// Prompt asking for a JSON draft of `text`, anchored at `now`
pub fn text_prompt(text: &str, now: DateTime<Utc>) -> String {
    format!(
        "\
あなたはスケジュール管理アシスタントです。
ユーザーの入力テキストから以下の情報を抽出してください：

1. タスク/イベントの内容
2. 日時（あれば）
3. 所要時間（あれば）
4. 場所（あれば）- 駅名、施設名、店名、住所など場所に関する情報
5. サブタスク（複数のステップや項目が含まれている場合は分解してください）

入力テキスト: \"{text}\"
現在時刻: {now}

以下のJSON形式で返してください（コードブロックなし、JSONのみ）：
{{
  \"title\": \"タスクのタイトル\",
  \"scheduledDate\": \"ISO8601形式の日時（例：2024-01-20T15:00:00）またはnull\",
  \"estimatedDurationMinutes\": 所要時間（分）またはnull,
  \"location\": \"場所名またはnull\",
  \"subtasks\": [
    {{
      \"title\": \"サブタスク1\",
      \"scheduledDate\": \"ISO8601形式の日時またはnull\",
      \"estimatedDurationMinutes\": 所要時間（分）またはnull,
      \"location\": \"場所名またはnull\"
    }}
  ]
}}

注意：
- 箇条書き、番号付きリスト、「〜して〜する」のような複数ステップがある場合は、subtasksに分解してください
- サブタスクがない場合はsubtasksは空配列[]にしてください
- 親タスクは全体を表す抽象的なタイトルにしてください",
        text = text,
        now = now.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

pub struct GeminiParser {
    client: Client,
    config: GeminiConfig,
    /// Offset for dates the model returns without one
    offset: FixedOffset,
}

impl GeminiParser {
    pub fn new(config: GeminiConfig, offset: FixedOffset) -> Self {
        Self {
            client: Client::new(),
            config,
            offset,
        }
    }

    async fn generate(&self, parts: Vec<Part<'_>>, max_output_tokens: u32) -> ParserResult<Option<String>> {
        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.config.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ParserError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "gemini request failed");
            return Err(ParserError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ParserError::Network(e.to_string()))?;
        Ok(body.first_text())
    }
}

#[async_trait(?Send)]
impl ScheduleParser for GeminiParser {
    async fn parse_text(&self, text: &str) -> ParserResult<ParsedDraft> {
        let prompt = text_prompt(text, Utc::now());
        let output = self
            .generate(vec![Part::Text { text: &prompt }], self.config.max_output_tokens)
            .await?
            .unwrap_or_default();
        tracing::debug!("gemini text output: {}", output);
        Ok(parse_model_output(&output, text, self.offset))
    }

    async fn parse_image(&self, bytes: &[u8], mime: &str) -> ParserResult<ParsedDraft> {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        let parts = vec![
            Part::Text { text: IMAGE_PROMPT },
            Part::InlineData {
                inline_data: InlineData { mime_type: mime, data },
            },
        ];
        let description = self
            .generate(parts, IMAGE_MAX_OUTPUT_TOKENS.max(self.config.max_output_tokens))
            .await?
            .ok_or(ParserError::EmptyResponse)?;
        tracing::info!("gemini image description: {}", description);
        self.parse_text(&description).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_config_defaults_from_json() {
        let config: GeminiConfig = serde_json::from_value(json!({ "api_key": "k" })).unwrap();
        assert_eq!(config, GeminiConfig::new("k"));
        assert_eq!(
            config.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_wire_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "hi" },
                    Part::InlineData {
                        inline_data: InlineData { mime_type: "image/png", data: "AAAA".into() },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.5, top_p: 0.95, max_output_tokens: 256 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(value["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_first_text() {
        let body: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"title\":\"x\"}" }] } }]
        }))
        .unwrap();
        assert_eq!(body.first_text().as_deref(), Some("{\"title\":\"x\"}"));

        let empty: GenerateResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert_eq!(empty.first_text(), None);
    }

    #[test]
    fn test_text_prompt_embeds_input_and_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 19, 3, 0, 0).unwrap();
        let prompt = text_prompt("明日15時に会議", now);
        assert!(prompt.contains("入力テキスト: \"明日15時に会議\""));
        assert!(prompt.contains("現在時刻: 2024-01-19T03:00:00.000Z"));
        assert!(prompt.contains("\"subtasks\": ["));
    }
}
