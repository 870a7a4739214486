use crate::image_model::ImageModel;

pub mod error;
pub mod image_model;
pub mod request;
pub mod response;

pub use error::Error;
pub use request::GenerationRequest;

pub type ImgModBox = Box<dyn ImageModel + Send>;
