//! Multipart form bodies for file-bearing endpoints.
//!
//! Files are referenced by path and only read when the form is encoded, but
//! the path is resolved and checked up front so a missing file fails locally
//! before any request is made.

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::client::ClientError;
use crate::model::Params;

/// A local file to upload as one form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    path: PathBuf,
    file_name: String,
    mime: String,
}

impl FormFile {
    /// Resolve `path` to an absolute path and check that it is a regular file.
    ///
    /// A leading `~` expands to the home directory; relative paths are
    /// resolved against the current working directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = expand_path(path.as_ref())?;

        let metadata = std::fs::metadata(&path).map_err(|source| ClientError::File {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(ClientError::File {
                path,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            path,
            file_name,
            mime,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    async fn into_part(self) -> Result<Part, ClientError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ClientError::File {
                path: self.path.clone(),
                source,
            })?;

        Ok(Part::bytes(data)
            .file_name(self.file_name)
            .mime_str(&self.mime)?)
    }
}

/// Value of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FormFile),
}

/// Ordered multipart form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: impl Into<String>, file: FormFile) -> Self {
        self.fields.push((name.into(), FormValue::File(file)));
        self
    }

    /// Add every parameter as a text field. Strings are sent as-is, `null`
    /// is skipped, anything else is sent as its JSON text.
    pub fn params(mut self, params: Params) -> Self {
        for (name, value) in params {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.fields.push((name, FormValue::Text(text)));
        }
        self
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    /// Encode as a `reqwest` multipart form, reading file contents from disk.
    pub async fn into_multipart(self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File(file) => form.part(name, file.into_part().await?),
            };
        }
        Ok(form)
    }
}

fn expand_path(path: &Path) -> Result<PathBuf, ClientError> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().ok_or_else(|| ClientError::File {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "home directory is unknown",
                ),
            })?;
            home.join(rest)
        }
        Err(_) => path.to_path_buf(),
    };

    std::path::absolute(&expanded).map_err(|source| ClientError::File {
        path: expanded,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_open_resolves_absolute_path() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG").unwrap();

        let form_file = FormFile::open(file.path()).unwrap();
        assert!(form_file.path().is_absolute());
        assert_eq!(form_file.mime(), "image/png");
        assert!(form_file.file_name().ends_with(".png"));
    }

    #[test]
    fn test_relative_path_is_made_absolute() {
        let dir = std::env::current_dir().unwrap();
        let expanded = expand_path(Path::new("uploads/train.jsonl")).unwrap();
        assert_eq!(expanded, dir.join("uploads/train.jsonl"));
    }

    #[test]
    fn test_tilde_expands_to_home_directory() {
        let home = dirs::home_dir().unwrap();
        let expanded = expand_path(Path::new("~/uploads/train.jsonl")).unwrap();
        assert_eq!(expanded, home.join("uploads/train.jsonl"));
        assert!(expanded.is_absolute());
    }

    #[test]
    fn test_tilde_user_prefix_is_not_expanded() {
        let dir = std::env::current_dir().unwrap();
        let expanded = expand_path(Path::new("~alice/train.jsonl")).unwrap();
        assert_eq!(expanded, dir.join("~alice/train.jsonl"));
    }

    #[test]
    fn test_missing_file_is_local_error() {
        let err = FormFile::open("/definitely/not/here.jsonl").unwrap_err();
        match err {
            ClientError::File { path, source } => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.jsonl"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FormFile::open(dir.path()),
            Err(ClientError::File { .. })
        ));
    }

    #[test]
    fn test_params_become_text_fields() {
        let params = json!({"n": 2, "size": "256x256", "user": null})
            .as_object()
            .cloned()
            .unwrap();
        let form = FormData::new().text("prompt", "a cat").params(params);

        let fields: Vec<(&str, &FormValue)> =
            form.fields().iter().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], ("prompt", &FormValue::Text("a cat".into())));
        assert!(fields.contains(&("n", &FormValue::Text("2".into()))));
        assert!(fields.contains(&("size", &FormValue::Text("256x256".into()))));
    }

    #[tokio::test]
    async fn test_file_deleted_after_open_fails_on_encode() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let form_file = FormFile::open(file.path()).unwrap();
        drop(file);

        let result = FormData::new().file("file", form_file).into_multipart().await;
        assert!(matches!(result, Err(ClientError::File { .. })));
    }
}
