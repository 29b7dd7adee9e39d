mod compatible;
mod factory;
mod http;
mod image;
mod traits;
mod types;

pub use compatible::OpenAiCompatibleProvider;
pub use factory::chat_provider;
pub use http::{api_error, sanitize_api_error};
pub use image::ImageGenerationProvider;
pub use traits::GenerationProvider;
pub use types::{Artifact, GenerationRequest, ImageAttachment, ProviderTier};
