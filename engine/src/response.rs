use std::{
    fs,
    path::{Path, PathBuf},
};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Local};
use color_eyre::Result;
use log::{debug, warn};

use crate::Error;

pub const DEFAULT_OUTPUT_PREFIX: &str = "nanobanana";

/// What came back from one generation call, with the provider envelope
/// already flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub parts: Vec<Part>,
    pub finish_reasons: Vec<String>,
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text {
        text: String,
        thought: bool,
    },
    InlineData {
        mime_type: String,
        /// base64, as received
        data: String,
        thought: bool,
    },
    Other,
}

impl Part {
    pub fn is_thought(&self) -> bool {
        match self {
            Part::Text { thought, .. } | Part::InlineData { thought, .. } => *thought,
            Part::Other => false,
        }
    }
}

impl GenerationResponse {
    fn reasons(&self) -> Vec<String> {
        let mut reasons = self.finish_reasons.clone();
        if let Some(block) = &self.block_reason {
            reasons.push(format!("blocked: {block}"));
        }
        reasons
    }
}

pub fn default_output_path(dir: Option<&Path>, now: DateTime<Local>) -> PathBuf {
    let name = format!(
        "{DEFAULT_OUTPUT_PREFIX}_{}.png",
        now.format("%Y%m%d_%H%M%S")
    );
    match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Prints the text parts and writes the first decodable image to `output`.
pub fn save_first_image(response: &GenerationResponse, output: &Path) -> Result<PathBuf> {
    if response.parts.is_empty() {
        Err(Error::NoContentParts {
            reasons: response.reasons(),
        })?;
    }

    for (idx, part) in response.parts.iter().enumerate() {
        if part.is_thought() {
            debug!("Skipping thought part {idx}");
            continue;
        }

        match part {
            Part::Text { text, .. } => println!("Gemini: {text}"),
            Part::InlineData {
                mime_type, data, ..
            } => {
                let bytes = match decode_image(data) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Couldn't decode part {idx} ({mime_type}): {e}");
                        continue;
                    }
                };
                // The bytes are written as received, the output extension doesn't pick a codec
                fs::write(output, &bytes).map_err(|source| Error::SaveImage {
                    path: output.to_path_buf(),
                    source,
                })?;
                println!("Image saved to: {}", output.display());
                return Ok(output.to_path_buf());
            }
            Part::Other => debug!("Ignoring part {idx} without text or image"),
        }
    }

    Err(Error::NoImageGenerated {
        reasons: response.reasons(),
    }
    .into())
}

/// Returns the raw image bytes once they are known to decode.
fn decode_image(data: &str) -> Result<Vec<u8>> {
    let bytes = BASE64.decode(data)?;
    image::load_from_memory(&bytes)?;
    Ok(bytes)
}
