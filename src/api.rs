use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::error::ValidationError;
use crate::export::Section;
use crate::fields::{LabelFields, OcrParsed, TranslatedFields};
use crate::history::HistoryRecord;
use crate::languages::Lang;

/// HTTP client for the four collaborator services, all reached under one
/// operator-configured base address.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

/// A completed OCR call: the raw recognized text plus the parsed fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OcrOutcome {
    pub raw_text: String,
    pub parsed: OcrParsed,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: HashMap<String, TranslatedFields>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemsResponse {
    items: Vec<HistoryRecord>,
}

impl ApiClient {
    /// The base address must be non-empty; trailing slashes are trimmed.
    /// No further validation happens here.
    pub fn new(base: &str) -> Result<Self, ValidationError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(ValidationError::MissingApiBase);
        }
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn ocr(&self, file_name: &str, bytes: Vec<u8>) -> Result<OcrOutcome> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(self.url("/api/ocr"))
            .multipart(form)
            .send()
            .await?;
        let body = read_success("OCR", response).await?;
        serde_json::from_str(&body).with_context(|| "failed to parse OCR response")
    }

    pub async fn translate(
        &self,
        targets: &[Lang],
        fields: &TranslatedFields,
    ) -> Result<HashMap<Lang, TranslatedFields>> {
        let codes = targets.iter().map(Lang::code).collect::<Vec<_>>();
        let body = json!({ "targets": codes, "fields": fields });
        let response = self
            .http
            .post(self.url("/api/translate"))
            .json(&body)
            .send()
            .await?;
        let body = read_success("Translation", response).await?;
        let parsed: TranslateResponse =
            serde_json::from_str(&body).with_context(|| "failed to parse translation response")?;

        let mut translations = HashMap::new();
        for (code, translated) in parsed.translations {
            match Lang::parse(&code) {
                Some(lang) => {
                    translations.insert(lang, translated);
                }
                None => {
                    tracing::warn!("ignoring translation for unknown language '{}'", code);
                }
            }
        }
        Ok(translations)
    }

    pub async fn pdf(&self, fields: &LabelFields) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(self.url("/api/pdf"))
            .json(&crate::export::single_payload(fields))
            .send()
            .await?;
        read_success_bytes("PDF", response).await
    }

    pub async fn pdf_sections(&self, sections: &[Section]) -> Result<Vec<u8>> {
        let body = json!({ "sections": sections });
        let response = self
            .http
            .post(self.url("/api/pdf/sections"))
            .json(&body)
            .send()
            .await?;
        read_success_bytes("PDF", response).await
    }

    pub async fn history(&self) -> Result<Vec<HistoryRecord>> {
        let response = self.http.get(self.url("/api/history")).send().await?;
        parse_items(response).await
    }

    pub async fn history_add(&self, record: &HistoryRecord) -> Result<Vec<HistoryRecord>> {
        let response = self
            .http
            .post(self.url("/api/history"))
            .json(record)
            .send()
            .await?;
        parse_items(response).await
    }

    pub async fn history_delete(&self, id: &str) -> Result<Vec<HistoryRecord>> {
        let response = self
            .http
            .delete(self.url(&format!("/api/history/{}", id)))
            .send()
            .await?;
        parse_items(response).await
    }

    pub async fn history_clear(&self) -> Result<Vec<HistoryRecord>> {
        let response = self.http.delete(self.url("/api/history")).send().await?;
        parse_items(response).await
    }
}

async fn parse_items(response: reqwest::Response) -> Result<Vec<HistoryRecord>> {
    let body = read_success("History", response).await?;
    let parsed: ItemsResponse =
        serde_json::from_str(&body).with_context(|| "failed to parse history response")?;
    Ok(parsed.items)
}

async fn read_success(kind: &str, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_success() {
        return Ok(body);
    }
    Err(anyhow!(
        "{} API error ({}): {}",
        kind,
        status,
        extract_api_error(&body).unwrap_or(body)
    ))
}

async fn read_success_bytes(kind: &str, response: reqwest::Response) -> Result<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!(
            "{} API error ({}): {}",
            kind,
            status,
            extract_api_error(&body).unwrap_or(body)
        ));
    }
    Ok(response.bytes().await?.to_vec())
}

/// Pulls the collaborator's error detail out of a JSON body when present.
fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
        error: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .detail
        .or(parsed.error)
        .filter(|message| !message.trim().is_empty())
}
