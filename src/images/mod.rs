//! Image sources: where the pictures on the cards come from.
//!
//! The game only needs one capability: "give me N distinct images". Any
//! failure, whatever its cause, fails the whole batch.
//!
//! - `ImageSource`: the async contract the session controller calls
//! - `CatApiClient`: TheCatAPI over HTTP

pub mod cat_api;

use async_trait::async_trait;

use crate::cards::CardImage;
use crate::core::ImageSourceError;

pub use cat_api::CatApiClient;

/// Something that can supply a batch of distinct images.
///
/// Implementations should return at least `count` distinct images; extra
/// images are ignored by the caller, too few fail the session start.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch `count` images.
    async fn fetch(&self, count: usize) -> Result<Vec<CardImage>, ImageSourceError>;
}

#[async_trait]
impl<S: ImageSource + ?Sized> ImageSource for std::sync::Arc<S> {
    async fn fetch(&self, count: usize) -> Result<Vec<CardImage>, ImageSourceError> {
        (**self).fetch(count).await
    }
}
