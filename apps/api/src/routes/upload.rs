//! Multipart form reading shared by the interview and screening handlers.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::errors::AppError;
use crate::screening::screener::Document;

/// A multipart body split into text fields and uploaded files.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    /// `(field name, document)` in upload order.
    pub files: Vec<(String, Document)>,
}

impl UploadForm {
    /// A text field, trimmed; missing fields read as empty.
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Files uploaded under `name`.
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Document> + 'a {
        self.files
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, document)| document)
    }
}

/// Reads every part. Parts carrying a filename are files; the rest are text.
pub async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content = field.bytes().await?;
                form.files.push((name, Document { file_name, content }));
            }
            None => {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }
    }

    Ok(form)
}
