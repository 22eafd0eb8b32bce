use std::path::Path;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::client::OpenAI;
use crate::error::LLMError;
use crate::transport::{path_segment, Api};
use crate::types::{Deleted, FileObject, ListPage};

const FALLBACK_FILE_NAME: &str = "file";

/// `files` namespace.
pub struct Files<'c> {
    client: &'c OpenAI,
}

impl<'c> Files<'c> {
    pub(crate) fn new(client: &'c OpenAI) -> Self {
        Self { client }
    }

    /// Uploads the file at `path` as a `multipart/form-data` POST with a
    /// `file` part and a `purpose` field (e.g. `"fine-tune"`).
    pub async fn create(
        &self,
        path: impl AsRef<Path>,
        purpose: &str,
    ) -> Result<FileObject, LLMError> {
        let path = path.as_ref();
        let contents = self.client.file_system().read_bytes(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        log::debug!(
            "Uploading {} ({} bytes) with purpose {purpose}",
            path.display(),
            contents.len()
        );

        let part = Part::bytes(contents).file_name(file_name);
        let form = Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        self.client.transport().post_multipart("files", form).await
    }

    /// Raw contents of an uploaded file.
    pub async fn content(&self, file_id: &str) -> Result<Bytes, LLMError> {
        let path = format!("files/{}/content", path_segment(file_id)?);
        self.client.transport().get_bytes(&path, Api::Stable).await
    }

    pub async fn delete(&self, file_id: &str) -> Result<Deleted, LLMError> {
        let path = format!("files/{}", path_segment(file_id)?);
        self.client.transport().delete_json(&path, Api::Stable).await
    }

    pub async fn retrieve(&self, file_id: &str) -> Result<FileObject, LLMError> {
        let path = format!("files/{}", path_segment(file_id)?);
        self.client.transport().get_json(&path, Api::Stable).await
    }

    pub async fn list(&self) -> Result<ListPage<FileObject>, LLMError> {
        self.client.transport().get_json("files", Api::Stable).await
    }
}
