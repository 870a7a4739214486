use std::path::PathBuf;

use thiserror::Error;

pub const API_KEY_URL: &str = "https://aistudio.google.com/apikey";

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "GEMINI_API_KEY environment variable not set.\nGet your API key at: {}",
        API_KEY_URL
    )]
    MissingApiKey,

    #[error(
        "The following options are not supported with the Gemini 3 Pro model: {}",
        flags.join(", ")
    )]
    UnsupportedWithPro { flags: Vec<String> },

    #[error("Too many reference images: {count} given, at most {max} are supported")]
    TooManyReferences { count: usize, max: usize },

    #[error("Couldn't read image {}: {source}", path.display())]
    ReadImage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unrecognized image format: {}", path.display())]
    UnsupportedImage { path: PathBuf },

    #[error("Response contained no content parts{}", describe_reasons(reasons))]
    NoContentParts { reasons: Vec<String> },

    #[error("No image was generated{}", describe_reasons(reasons))]
    NoImageGenerated { reasons: Vec<String> },

    #[error("Couldn't save image to {}: {source}", path.display())]
    SaveImage {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn describe_reasons(reasons: &[String]) -> String {
    if reasons.is_empty() {
        String::new()
    } else {
        format!(" (finish reasons: {})", reasons.join(", "))
    }
}
