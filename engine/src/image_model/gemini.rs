use std::pin::Pin;

use color_eyre::Result;
use log::info;

use crate::{
    GenerationRequest,
    image_model::{ImageModel, InputImage},
    request::Model,
    response::GenerationResponse,
};

pub mod gemini_api;

#[derive(Clone)]
pub struct Gemini {
    model: Model,
    api_key: String,
    client: reqwest::Client,
}

impl Gemini {
    pub fn new(model: Model, api_key: String) -> Self {
        Self {
            model,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

impl ImageModel for Gemini {
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResponse>> + Send + 'a>> {
        Box::pin(async move {
            let edit = request
                .edit
                .as_deref()
                .map(InputImage::load)
                .transpose()?;
            let references = request
                .references
                .iter()
                .map(|path| InputImage::load(path))
                .collect::<Result<Vec<_>>>()?;

            let body = gemini_api::build_body(request, edit.as_ref(), &references);
            info!("Sending request to {}", self.model.id());
            let response =
                gemini_api::generate_content(&body, self.model, &self.api_key, &self.client)
                    .await?;
            Ok(response.into())
        })
    }

    fn model(&self) -> Model {
        self.model
    }
}
