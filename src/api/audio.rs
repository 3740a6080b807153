//! Speech synthesis, transcription and translation (`/v1/audio/*`).

use serde_json::Value;
use std::path::Path;

use super::resource::Resource;
use crate::client::{ApiClient, ClientError, FormPostable, Postable};
use crate::form::{FormData, FormFile};
use crate::model::{Params, Speech, Transcription};

const DEFAULT_SPEECH_FORMAT: &str = "mp3";

#[derive(Debug)]
pub struct Audio<T = ApiClient> {
    resource: Resource<T>,
}

impl<T> Audio<T> {
    pub(crate) fn new(resource: Resource<T>) -> Self {
        Self { resource }
    }
}

impl<T: Postable> Audio<T> {
    /// Synthesize `input` with `voice`. The service defaults to mp3 when no
    /// `response_format` is given, either here or in `params`.
    pub async fn speech(
        &self,
        model: &str,
        input: &str,
        voice: &str,
        response_format: Option<&str>,
        mut params: Params,
    ) -> Result<Speech, ClientError> {
        let format = match response_format {
            Some(format) => Some(format.to_string()),
            None => take_response_format(&mut params)?,
        };

        params.insert("model".to_string(), model.into());
        params.insert("input".to_string(), input.into());
        params.insert("voice".to_string(), voice.into());
        if let Some(format) = &format {
            params.insert("response_format".to_string(), format.as_str().into());
        }

        let data = self
            .resource
            .transport()
            .post_raw("/v1/audio/speech", &params)
            .await?;

        Ok(Speech {
            format: format.unwrap_or_else(|| DEFAULT_SPEECH_FORMAT.to_string()),
            data,
        })
    }
}

fn take_response_format(params: &mut Params) -> Result<Option<String>, ClientError> {
    match params.remove("response_format") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(format)) => Ok(Some(format)),
        Some(other) => Err(ClientError::Precondition(format!(
            "response_format must be a string, got {}",
            other
        ))),
    }
}

impl<T: FormPostable> Audio<T> {
    pub async fn transcribe(
        &self,
        file: impl AsRef<Path>,
        model: &str,
        params: Params,
    ) -> Result<Transcription, ClientError> {
        let form = audio_form(file.as_ref(), model, params)?;
        self.resource.post_form("/v1/audio/transcriptions", form).await
    }

    /// Transcribe into English.
    pub async fn translate(
        &self,
        file: impl AsRef<Path>,
        model: &str,
        params: Params,
    ) -> Result<Transcription, ClientError> {
        let form = audio_form(file.as_ref(), model, params)?;
        self.resource.post_form("/v1/audio/translations", form).await
    }
}

fn audio_form(file: &Path, model: &str, params: Params) -> Result<FormData, ClientError> {
    Ok(FormData::new()
        .file("file", FormFile::open(file)?)
        .text("model", model)
        .params(params))
}
