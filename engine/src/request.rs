use std::path::PathBuf;

use color_eyre::Result;
use strum::{Display, EnumIter, EnumString};

use crate::Error;

pub const MAX_REFERENCES: usize = 14;

#[derive(Debug, Clone, Copy, Display, Hash, PartialEq, Eq, EnumIter, Default)]
pub enum Model {
    #[default]
    #[strum(to_string = "Gemini 3.1 Flash")]
    Flash,
    #[strum(to_string = "Gemini 3 Pro")]
    Pro,
}

impl Model {
    pub fn id(&self) -> &'static str {
        match self {
            Model::Flash => "gemini-3.1-flash-image-preview",
            Model::Pro => "gemini-3-pro-image-preview",
        }
    }

    /// Above this many references the model starts losing fidelity to them.
    pub fn reference_hint_limit(&self) -> usize {
        match self {
            Model::Flash => 10,
            Model::Pro => 6,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    EnumString,
    EnumIter,
    clap::ValueEnum,
    Hash,
    PartialEq,
    Eq,
    Default,
)]
pub enum AspectRatio {
    #[default]
    #[strum(serialize = "1:1")]
    #[value(name = "1:1")]
    Square,
    #[strum(serialize = "2:3")]
    #[value(name = "2:3")]
    Portrait2x3,
    #[strum(serialize = "3:2")]
    #[value(name = "3:2")]
    Landscape3x2,
    #[strum(serialize = "3:4")]
    #[value(name = "3:4")]
    Portrait3x4,
    #[strum(serialize = "4:3")]
    #[value(name = "4:3")]
    Landscape4x3,
    #[strum(serialize = "4:5")]
    #[value(name = "4:5")]
    Portrait4x5,
    #[strum(serialize = "5:4")]
    #[value(name = "5:4")]
    Landscape5x4,
    #[strum(serialize = "9:16")]
    #[value(name = "9:16")]
    Portrait9x16,
    #[strum(serialize = "16:9")]
    #[value(name = "16:9")]
    Landscape16x9,
    #[strum(serialize = "21:9")]
    #[value(name = "21:9")]
    Ultrawide21x9,
    #[strum(serialize = "1:4")]
    #[value(name = "1:4")]
    Tall1x4,
    #[strum(serialize = "4:1")]
    #[value(name = "4:1")]
    Wide4x1,
    #[strum(serialize = "1:8")]
    #[value(name = "1:8")]
    Tall1x8,
    #[strum(serialize = "8:1")]
    #[value(name = "8:1")]
    Wide8x1,
}

impl AspectRatio {
    /// Banner and strip formats only the Flash model can render.
    pub fn is_extreme(&self) -> bool {
        matches!(
            self,
            AspectRatio::Tall1x4
                | AspectRatio::Wide4x1
                | AspectRatio::Tall1x8
                | AspectRatio::Wide8x1
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    EnumString,
    EnumIter,
    clap::ValueEnum,
    Hash,
    PartialEq,
    Eq,
    Default,
)]
pub enum Resolution {
    #[strum(serialize = "0.5K")]
    #[value(name = "0.5K")]
    Half,
    #[default]
    #[strum(serialize = "1K")]
    #[value(name = "1K")]
    One,
    #[strum(serialize = "2K")]
    #[value(name = "2K")]
    Two,
    #[strum(serialize = "4K")]
    #[value(name = "4K")]
    Four,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    EnumString,
    EnumIter,
    clap::ValueEnum,
    Hash,
    PartialEq,
    Eq,
)]
#[strum(serialize_all = "lowercase")]
pub enum ThinkingLevel {
    Minimal,
    High,
}

impl ThinkingLevel {
    pub fn provider_name(&self) -> &'static str {
        match self {
            ThinkingLevel::Minimal => "MINIMAL",
            ThinkingLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("{count} reference images given; {model} keeps high fidelity only up to {limit}")]
    ReferenceFidelity {
        count: usize,
        limit: usize,
        model: Model,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub edit: Option<PathBuf>,
    pub references: Vec<PathBuf>,
    /// `None` means "default for the mode", see [`GenerationRequest::effective_aspect_ratio`].
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Resolution,
    pub model: Model,
    pub web_search: bool,
    pub image_search: bool,
    pub thinking: Option<ThinkingLevel>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn is_edit(&self) -> bool {
        self.edit.is_some()
    }

    pub fn is_grounded(&self) -> bool {
        self.web_search || self.image_search
    }

    /// Edits keep the input ratio unless one was asked for explicitly.
    pub fn effective_aspect_ratio(&self) -> Option<AspectRatio> {
        match (self.aspect_ratio, self.is_edit()) {
            (Some(ratio), _) => Some(ratio),
            (None, true) => None,
            (None, false) => Some(AspectRatio::default()),
        }
    }

    /// Rejects flag combinations the selected model can't serve and returns
    /// non-fatal warnings for the rest.
    pub fn validate(&self) -> Result<Vec<Warning>> {
        if self.model == Model::Pro {
            let flags = self.unsupported_pro_flags();
            if !flags.is_empty() {
                Err(Error::UnsupportedWithPro { flags })?;
            }
        }

        let count = self.references.len();
        if count > MAX_REFERENCES {
            Err(Error::TooManyReferences {
                count,
                max: MAX_REFERENCES,
            })?;
        }

        let mut warnings = vec![];
        let limit = self.model.reference_hint_limit();
        if count > limit {
            warnings.push(Warning::ReferenceFidelity {
                count,
                limit,
                model: self.model,
            });
        }
        Ok(warnings)
    }

    fn unsupported_pro_flags(&self) -> Vec<String> {
        let mut flags = vec![];
        if self.resolution == Resolution::Half {
            flags.push(format!("-r {}", self.resolution));
        }
        if let Some(ratio) = self.aspect_ratio.filter(AspectRatio::is_extreme) {
            flags.push(format!("-a {ratio}"));
        }
        if self.image_search {
            flags.push("-i".to_string());
        }
        if let Some(level) = self.thinking {
            flags.push(format!("-t {level}"));
        }
        flags
    }
}
