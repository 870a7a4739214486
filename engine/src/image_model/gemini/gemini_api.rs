use std::{fmt, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use color_eyre::{Result, eyre::WrapErr};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

mod error;
pub use error::GeminiApiError;

use crate::{
    GenerationRequest,
    image_model::InputImage,
    request::Model,
    response::{GenerationResponse, Part},
};

pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

// The payload is megabytes of base64, keep it out of debug logs
impl fmt::Debug for InlineData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineData")
            .field("mime_type", &self.mime_type)
            .field("data", &format_args!("<{} base64 chars>", self.data.len()))
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<&'static str>,
    pub image_config: ImageConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    pub image_size: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_level: &'static str,
    pub include_thoughts: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSearch {
    pub search_types: SearchTypes,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTypes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_search: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_search: Option<Empty>,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<ResponseContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl From<&InputImage> for RequestPart {
    fn from(img: &InputImage) -> Self {
        RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: img.mime_type.clone(),
                data: BASE64.encode(&img.data),
            },
        }
    }
}

impl From<ResponsePart> for Part {
    fn from(part: ResponsePart) -> Self {
        let ResponsePart {
            text,
            inline_data,
            thought,
        } = part;
        match (inline_data, text) {
            (Some(InlineData { mime_type, data }), _) => Part::InlineData {
                mime_type,
                data,
                thought,
            },
            (None, Some(text)) => Part::Text { text, thought },
            (None, None) => Part::Other,
        }
    }
}

impl From<ResponseBody> for GenerationResponse {
    fn from(body: ResponseBody) -> Self {
        let finish_reasons = body
            .candidates
            .iter()
            .filter_map(|c| c.finish_reason.clone())
            .collect();
        let parts = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(Part::from).collect())
            .unwrap_or_default();

        GenerationResponse {
            parts,
            finish_reasons,
            block_reason: body.prompt_feedback.and_then(|f| f.block_reason),
        }
    }
}

/// Maps a request onto the `generateContent` schema
pub fn build_body(
    request: &GenerationRequest,
    edit: Option<&InputImage>,
    references: &[InputImage],
) -> RequestBody {
    let mut parts: Vec<RequestPart> = vec![];
    if let Some(img) = edit {
        parts.push(img.into());
    }
    parts.push(RequestPart::Text {
        text: request.prompt.clone(),
    });
    parts.extend(references.iter().map(RequestPart::from));

    let tools = request.is_grounded().then(|| {
        vec![Tool {
            google_search: GoogleSearch {
                search_types: SearchTypes {
                    web_search: request.web_search.then_some(Empty {}),
                    image_search: request.image_search.then_some(Empty {}),
                },
            },
        }]
    });

    RequestBody {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["TEXT", "IMAGE"],
            image_config: ImageConfig {
                aspect_ratio: request.effective_aspect_ratio().map(|r| r.to_string()),
                image_size: request.resolution.to_string(),
            },
            thinking_config: request.thinking.map(|level| ThinkingConfig {
                thinking_level: level.provider_name(),
                include_thoughts: false,
            }),
        },
        tools,
    }
}

pub async fn generate_content(
    body: &RequestBody,
    model: Model,
    api_key: &str,
    client: &Client,
) -> Result<ResponseBody> {
    let url = format!("{API_BASE}/models/{}:generateContent", model.id());
    debug!("POST {url}\n{body:#?}");

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(60 * 5))
        .header("x-goog-api-key", api_key)
        .json(body)
        .send()
        .await
        .wrap_err("Request to the Gemini API failed")?;

    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        Err(GeminiApiError::from_body(status.as_u16(), &text))?;
    }

    let body: ResponseBody =
        serde_json::from_str(&text).wrap_err("Couldn't parse the Gemini response")?;
    debug!("Response: {body:#?}");
    Ok(body)
}
