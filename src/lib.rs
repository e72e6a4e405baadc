use anyhow::{anyhow, Context, Result};
use std::path::Path;

pub mod api;
pub mod error;
pub mod export;
pub mod fields;
pub mod history;
pub mod languages;
pub mod logging;
pub mod render;
pub mod session;
pub mod settings;

pub use api::{ApiClient, OcrOutcome};
pub use error::ValidationError;
pub use export::Section;
pub use fields::{Field, LabelFields, PartialFields, TranslatedFields};
pub use history::HistoryRecord;
pub use languages::{LabelCatalog, Lang};
pub use render::{render, render_lang, RenderedLabel};
pub use session::LabelSession;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_base: Option<String>,
    pub file: Option<String>,
    pub langs: Option<String>,
    pub translate: bool,
    pub pdf_out: Option<String>,
    pub sections_out: Option<String>,
    pub settings_path: Option<String>,
    pub show_enabled_languages: bool,
}

/// One-shot pipeline: optional OCR of a scan, optional translation of the
/// selected languages, optional PDF exports, and finally the rendered
/// preview text.
pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let catalog = LabelCatalog::load()?;

    let selection = match config.langs.as_deref() {
        Some(codes) => parse_selection_codes(codes)?,
        None => parse_selection(&settings.system_languages)?,
    };

    if config.show_enabled_languages {
        let lines = selection
            .iter()
            .map(|lang| format!("{}\t{}", lang.code(), lang.display_name()))
            .collect::<Vec<_>>();
        return Ok(lines.join("\n"));
    }

    let mut session = LabelSession::new();
    session.select_languages(&selection);

    let api_base = config
        .api_base
        .clone()
        .unwrap_or_else(|| settings.api_base.clone());

    let needs_network = config.file.is_some()
        || config.translate
        || config.pdf_out.is_some()
        || config.sections_out.is_some();

    if needs_network {
        let client = ApiClient::new(&api_base)?;

        if let Some(file) = config.file.as_deref() {
            analyze_file(&mut session, &client, file).await?;
        }

        if config.translate {
            let (order, subset) = session.translation_request()?;
            let token = session.begin_request();
            let translations = client.translate(&order, &subset).await?;
            session.apply_translations(token, &order, translations);
        }

        if let Some(path) = config.pdf_out.as_deref() {
            let bytes = client.pdf(session.fields()).await?;
            std::fs::write(path, bytes)
                .with_context(|| format!("failed to write PDF: {}", path))?;
        }

        if let Some(path) = config.sections_out.as_deref() {
            let sections = export::sections(&session, &catalog)?;
            let bytes = client.pdf_sections(&sections).await?;
            std::fs::write(path, bytes)
                .with_context(|| format!("failed to write PDF: {}", path))?;
        }
    }

    Ok(preview(&session, &catalog))
}

/// OCR a scan and apply the result, then record the analysis in the
/// history service. History failures only log; the analysis itself stands.
pub async fn analyze_file(
    session: &mut LabelSession,
    client: &ApiClient,
    file: &str,
) -> Result<()> {
    let path = Path::new(file);
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("invalid file path: {}", path.display()))?;

    let token = session.begin_request();
    let outcome = client.ocr(&file_name, bytes).await?;
    if !session.apply_ocr(token, outcome.raw_text, outcome.parsed) {
        return Ok(());
    }

    let title = history_title(session.fields());
    let record = HistoryRecord::capture(
        session.fields(),
        session.raw_text(),
        title,
        history::timestamp_meta(),
    );
    if let Err(err) = client.history_add(&record).await {
        tracing::warn!("failed to record history: {:#}", err);
    }
    Ok(())
}

pub fn history_title(fields: &LabelFields) -> String {
    let name = fields.product_name.trim();
    if name.is_empty() {
        "Untitled analysis".to_string()
    } else {
        name.to_string()
    }
}

/// The active-language preview when a translation is cached, the source
/// preview otherwise.
pub fn preview(session: &LabelSession, catalog: &LabelCatalog) -> String {
    match session.active() {
        Some(lang) if session.has_translation(lang) => {
            render_lang(session.fields(), lang, session.translation(lang), catalog).to_text()
        }
        _ => render(session.fields(), catalog).to_text(),
    }
}

/// Parses a comma-separated list of catalog language codes.
pub fn parse_selection_codes(codes: &str) -> Result<Vec<Lang>> {
    let codes = codes
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    parse_selection(&codes)
}

pub fn parse_selection(codes: &[String]) -> Result<Vec<Lang>> {
    codes
        .iter()
        .map(|code| {
            Lang::parse(code)
                .ok_or_else(|| anyhow!("unknown language code '{}' (expected en, de, fr, it, es)", code))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_codes_parse_and_reject_unknown() {
        assert_eq!(
            parse_selection_codes("en, de").expect("parse"),
            vec![Lang::En, Lang::De]
        );
        assert!(parse_selection_codes("en,ko").is_err());
        assert_eq!(parse_selection_codes("").expect("parse"), Vec::<Lang>::new());
    }

    #[test]
    fn history_title_falls_back_for_unnamed_products() {
        let mut fields = LabelFields::default();
        assert_eq!(history_title(&fields), "Untitled analysis");
        fields.set(Field::ProductName, "  Aqua Cream  ");
        assert_eq!(history_title(&fields), "Aqua Cream");
    }

    #[test]
    fn preview_uses_active_translation_when_cached() {
        let catalog = LabelCatalog::load().expect("catalog");
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::De]);
        assert!(preview(&session, &catalog).starts_with("YJN Partners CPSR Label Example"));

        let token = session.begin_request();
        let mut translated = TranslatedFields::default();
        translated.set(Field::ProductName, "Aqua Creme".to_string());
        let mut translations = std::collections::HashMap::new();
        translations.insert(Lang::De, translated);
        assert!(session.apply_translations(token, &[Lang::De], translations));
        assert!(preview(&session, &catalog).contains("1. Produktname:"));
    }
}
