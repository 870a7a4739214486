use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, ensure, eyre},
};
use engine::{
    Error, GenerationRequest, ImgModBox,
    request::Model,
    response::{default_output_path, save_first_image},
};
use log::{info, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub mod cli;

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Where images go when no `-o` is given
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)?;
    Ok(ron::from_str(&src)?)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join("nanobanana.ron"))
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        Ok(Config::default())
    } else {
        load_ron_file(&path).wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }
}

/// The environment wins over the config file.
pub fn resolve_api_key(lookup: impl Fn(&str) -> Option<String>, cfg: &Config) -> Result<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .chain(cfg.api_key.clone())
        .find(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::MissingApiKey.into())
}

/// Validates, generates and saves. Returns the path of the written image.
///
/// `make_model` is only called once the request passed validation.
pub async fn run(
    request: &GenerationRequest,
    output: Option<PathBuf>,
    cfg: &Config,
    make_model: impl FnOnce(Model) -> Result<ImgModBox>,
) -> Result<PathBuf> {
    for warning in request.validate()? {
        warn!("{warning}");
    }

    let model = make_model(request.model)?;
    ensure!(
        model.model() == request.model,
        "Asked for {} but got a client for {}",
        request.model,
        model.model()
    );
    info!("Generating with {}", model.model());
    let output = output
        .unwrap_or_else(|| default_output_path(cfg.output_dir.as_deref(), chrono::Local::now()));

    let response = model.generate(request).await?;
    save_first_image(&response, &output)
}

#[cfg(test)]
mod test {
    use std::{collections::HashMap, io::Cursor, pin::Pin};

    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
    use engine::{
        image_model::ImageModel,
        request::Resolution,
        response::{GenerationResponse, Part},
    };
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;

    use super::*;

    struct CannedModel {
        model: Model,
        response: GenerationResponse,
    }

    fn canned(parts: Vec<Part>) -> impl FnOnce(Model) -> Result<ImgModBox> {
        move |model| {
            let model: ImgModBox = Box::new(CannedModel {
                model,
                response: GenerationResponse {
                    parts,
                    ..Default::default()
                },
            });
            Ok(model)
        }
    }

    impl ImageModel for CannedModel {
        fn generate<'a>(
            &'a self,
            _request: &'a GenerationRequest,
        ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>> {
            Box::pin(async move { Ok(self.response.clone()) })
        }

        fn model(&self) -> Model {
            self.model
        }
    }

    fn png_part() -> Part {
        let img = RgbImage::from_pixel(2, 2, Rgb([10, 200, 10]));
        let mut buf = Cursor::new(vec![]);
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        Part::InlineData {
            mime_type: "image/png".into(),
            data: BASE64.encode(buf.into_inner()),
            thought: false,
        }
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn api_key_lookup_order() {
        let cfg = Config {
            api_key: Some("from-config".into()),
            output_dir: None,
        };
        assert_eq!(
            resolve_api_key(env(&[("GOOGLE_API_KEY", "g"), ("GEMINI_API_KEY", "m")]), &cfg)
                .unwrap(),
            "m"
        );
        assert_eq!(
            resolve_api_key(env(&[("GOOGLE_API_KEY", "g")]), &cfg).unwrap(),
            "g"
        );
        assert_eq!(resolve_api_key(env(&[]), &cfg).unwrap(), "from-config");
    }

    #[test]
    fn missing_api_key_mentions_signup_url() {
        let err =
            resolve_api_key(env(&[("GEMINI_API_KEY", "")]), &Config::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MissingApiKey)));
        assert!(err.to_string().contains("https://aistudio.google.com/apikey"));
    }

    #[test]
    fn config_from_ron() -> Result<()> {
        let cfg: Config =
            ron::from_str(r#"(api_key: Some("abc"), output_dir: Some("/tmp/imgs"))"#)?;
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/imgs")));

        let empty: Config = ron::from_str("()")?;
        assert_eq!(empty, Config::default());
        Ok(())
    }

    #[tokio::test]
    async fn saves_to_given_output() -> Result<()> {
        let dir = TempDir::new()?;
        let output = dir.path().join("exact.png");
        let saved = run(
            &GenerationRequest::new("a cat"),
            Some(output.clone()),
            &Config::default(),
            canned(vec![png_part()]),
        )
        .await?;
        assert_eq!(saved, output);
        assert!(output.exists());
        Ok(())
    }

    #[tokio::test]
    async fn saves_to_timestamped_default() -> Result<()> {
        let dir = TempDir::new()?;
        let cfg = Config {
            api_key: None,
            output_dir: Some(dir.path().to_path_buf()),
        };
        let saved = run(
            &GenerationRequest::new("a cat"),
            None,
            &cfg,
            canned(vec![png_part()]),
        )
        .await?;
        assert_eq!(saved.parent(), Some(dir.path()));
        let name = saved.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("nanobanana_"), "{name}");
        assert!(name.ends_with(".png"), "{name}");
        assert_eq!(name.len(), "nanobanana_YYYYmmdd_HHMMSS.png".len());
        assert!(saved.exists());
        Ok(())
    }

    #[tokio::test]
    async fn validation_runs_before_generation() {
        let request = GenerationRequest {
            model: Model::Pro,
            resolution: Resolution::Half,
            ..GenerationRequest::new("a cat")
        };
        let make_model =
            |_: Model| -> Result<ImgModBox> { panic!("model created for invalid request") };
        let err = run(&request, None, &Config::default(), make_model)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("-r 0.5K"));
    }

    #[tokio::test]
    async fn fidelity_warning_still_generates() -> Result<()> {
        let dir = TempDir::new()?;
        let request = GenerationRequest {
            model: Model::Pro,
            references: (0..7).map(|i| PathBuf::from(format!("r{i}.png"))).collect(),
            ..GenerationRequest::new("a cat")
        };
        run(
            &request,
            Some(dir.path().join("out.png")),
            &Config::default(),
            canned(vec![png_part()]),
        )
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn empty_response_fails() {
        let err = run(
            &GenerationRequest::new("a cat"),
            None,
            &Config::default(),
            canned(vec![]),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NoContentParts { .. })
        ));
    }

    #[tokio::test]
    async fn client_must_match_requested_model() {
        let request = GenerationRequest {
            model: Model::Pro,
            ..GenerationRequest::new("a cat")
        };
        let make_flash = |_: Model| canned(vec![png_part()])(Model::Flash);
        let err = run(&request, None, &Config::default(), make_flash)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Gemini 3 Pro"), "{err}");
    }
}
