use std::{
    fs,
    path::{Path, PathBuf},
    pin::Pin,
};

use color_eyre::Result;

pub mod gemini;
pub use gemini::Gemini;

use crate::{Error, GenerationRequest, ImgModBox, request::Model, response::GenerationResponse};

impl Model {
    pub fn make(&self, api_key: String) -> ImgModBox {
        Box::new(Gemini::new(*self, api_key))
    }
}

/// An image file that goes into the request, either as edit source or as reference.
#[derive(Debug, Clone)]
pub struct InputImage {
    pub path: PathBuf,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InputImage {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|source| Error::ReadImage {
            path: path.to_path_buf(),
            source,
        })?;
        let format = image::guess_format(&data).map_err(|_| Error::UnsupportedImage {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            mime_type: format.to_mime_type().to_string(),
            data,
        })
    }
}

pub trait ImageModel {
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>>;

    fn model(&self) -> Model;
}
