//! Image generation, variations and edits (`/v1/images/*`).

use std::path::Path;

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, FormPostable, Postable};
use crate::form::{FormData, FormFile};
use crate::model::{Images as ImagesResponse, Params};

#[derive(Debug)]
pub struct Images<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Images<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Postable> Images<T> {
    pub async fn create(&self, prompt: &str, mut params: Params) -> Result<ImagesResponse, ClientError> {
        params.insert("prompt".to_string(), prompt.into());
        self.resource.post("/v1/images/generations", &params).await
    }
}

impl<T: FormPostable> Images<T> {
    /// Variations of the image at `image`.
    pub async fn create_variation(
        &self,
        image: impl AsRef<Path>,
        params: Params,
    ) -> Result<ImagesResponse, ClientError> {
        let form = FormData::new()
            .file("image", FormFile::open(image)?)
            .params(params);
        self.resource.post_form("/v1/images/variations", form).await
    }

    /// Edit the image at `image` following `prompt`, optionally restricted
    /// to the transparent areas of `mask`.
    pub async fn edit(
        &self,
        image: impl AsRef<Path>,
        prompt: &str,
        mask: Option<impl AsRef<Path>>,
        params: Params,
    ) -> Result<ImagesResponse, ClientError> {
        let mut form = FormData::new()
            .file("image", FormFile::open(image)?)
            .text("prompt", prompt);
        if let Some(mask) = mask {
            form = form.file("mask", FormFile::open(mask)?);
        }

        self.resource
            .post_form("/v1/images/edits", form.params(params))
            .await
    }
}
