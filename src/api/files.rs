//! Files (`/v1/files`).

use std::path::Path;

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, FormPostable, Gettable};
use crate::form::{FormData, FormFile};
use crate::model::{File, FileList};

#[derive(Debug)]
pub struct Files<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Files<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: FormPostable> Files<T> {
    /// Upload the file at `path` for the given `purpose`.
    ///
    /// The path is checked locally first; a missing file never reaches the
    /// network.
    pub async fn create(&self, path: impl AsRef<Path>, purpose: &str) -> Result<File, ClientError> {
        let form = FormData::new()
            .file("file", FormFile::open(path)?)
            .text("purpose", purpose);
        self.resource.post_form("/v1/files", form).await
    }
}

impl<T: Gettable> Files<T> {
    pub async fn list(&self) -> Result<FileList, ClientError> {
        self.resource.get("/v1/files").await
    }

    pub async fn fetch(&self, file_id: &str) -> Result<File, ClientError> {
        self.resource.get(&format!("/v1/files/{}", file_id)).await
    }

    pub async fn delete(&self, file_id: &str) -> Result<File, ClientError> {
        self.resource.delete(&format!("/v1/files/{}", file_id)).await
    }

    /// Raw contents of a stored file.
    pub async fn get_content(&self, file_id: &str) -> Result<String, ClientError> {
        self.resource
            .transport()
            .get(&format!("/v1/files/{}/content", file_id))
            .await
    }
}
