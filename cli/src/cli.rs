use std::{ffi::OsString, path::PathBuf};

use engine::{
    GenerationRequest,
    request::{AspectRatio, Model, Resolution, ThinkingLevel},
};

const EXAMPLES: &str = indoc::indoc! {r#"
    Examples:
      nanobanana "a cat wearing a hat"                     Generate new image
      nanobanana "sunset over mountains" -a 16:9           Widescreen landscape
      nanobanana "portrait photo" -r 4K -o portrait.png    High-res with custom output
      nanobanana "add sunglasses" -e photo.png             Edit existing image
      nanobanana "visualize today's weather in NYC" -s     Use Google Search grounding
      nanobanana "a Timareta butterfly" -i                 Use Image Search grounding
      nanobanana "a cat in this style" -ref style.png      Use reference image
      nanobanana "complex prompt" -t high                  Use high thinking level
      nanobanana "a dog" -p                                Use 3 Pro model
"#};

/// Nano Banana - Generate and edit images with Gemini 3 Pro and 3.1 Flash
#[derive(Debug, clap::Parser)]
#[command(name = "nanobanana", version, after_help = EXAMPLES)]
pub struct Cli {
    /// Text prompt for generation or edit instruction
    pub prompt: String,

    /// Edit existing image instead of generating new
    #[arg(short, long, value_name = "FILE")]
    pub edit: Option<PathBuf>,

    /// One or more reference images to guide generation
    #[arg(long = "reference", visible_alias = "ref", value_name = "FILE", num_args = 1..)]
    pub references: Vec<PathBuf>,

    /// Output path (default: nanobanana_TIMESTAMP.png)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Aspect ratio (default: 1:1, edits keep the input ratio)
    #[arg(short, long, value_name = "RATIO")]
    pub aspect_ratio: Option<AspectRatio>,

    /// Resolution
    #[arg(short, long, value_name = "RES", default_value_t = Resolution::One)]
    pub resolution: Resolution,

    /// Use Google Search grounding
    #[arg(short, long)]
    pub search: bool,

    /// Use Google Image Search grounding
    #[arg(short, long)]
    pub image_search: bool,

    /// Use Gemini 3 Pro model instead of 3.1 Flash
    #[arg(short, long)]
    pub pro: bool,

    /// Thinking level
    #[arg(short, long, value_name = "LEVEL")]
    pub thinking: Option<ThinkingLevel>,
}

impl Cli {
    pub fn into_request(self) -> (GenerationRequest, Option<PathBuf>) {
        let Cli {
            prompt,
            edit,
            references,
            output,
            aspect_ratio,
            resolution,
            search,
            image_search,
            pro,
            thinking,
        } = self;

        let request = GenerationRequest {
            prompt,
            edit,
            references,
            aspect_ratio,
            resolution,
            model: if pro { Model::Pro } else { Model::Flash },
            web_search: search,
            image_search,
            thinking,
        };
        (request, output)
    }
}

/// clap has no multi-letter short flags, so `-ref` is spelled out here.
/// Everything after `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut positional_only = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if positional_only {
                arg
            } else if arg == "--" {
                positional_only = true;
                arg
            } else if arg == "-ref" {
                "--reference".into()
            } else {
                arg
            }
        })
        .collect()
}

/// Parses the command line. On failure the error comes with the exit code to
/// use: 0 for `--help`/`--version`, 1 for usage errors.
pub fn parse_cli<I, T>(args: I) -> Result<Cli, (clap::Error, i32)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    <Cli as clap::Parser>::try_parse_from(normalize_args(args)).map_err(|e| {
        let code = if e.use_stderr() { 1 } else { 0 };
        (e, code)
    })
}
