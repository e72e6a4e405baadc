use serde::Serialize;

use crate::error::ValidationError;
use crate::fields::LabelFields;
use crate::languages::LabelCatalog;
use crate::render;
use crate::session::LabelSession;

/// One language's rendered label for the multi-section PDF service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub text: String,
}

/// The single-language PDF payload: all eleven fields as a flat JSON map,
/// raw passthrough. Fallback substitution is a rendering concern and does
/// not apply here.
pub fn single_payload(fields: &LabelFields) -> serde_json::Value {
    // LabelFields serializes to exactly the flat map the PDF service takes.
    serde_json::to_value(fields).unwrap_or_else(|_| serde_json::Value::Null)
}

/// The multi-language PDF payload: one section per selected language, in
/// selection order. Every selected language must already have a cached
/// translation; otherwise the export is rejected before any request is
/// issued.
pub fn sections(
    session: &LabelSession,
    catalog: &LabelCatalog,
) -> Result<Vec<Section>, ValidationError> {
    let selection = session.selection();
    if selection.is_empty() {
        return Err(ValidationError::EmptyLanguageSelection);
    }
    for lang in selection {
        if !session.has_translation(*lang) {
            return Err(ValidationError::MissingTranslation(*lang));
        }
    }
    Ok(selection
        .iter()
        .map(|lang| {
            let rendered = render::render_lang(
                session.fields(),
                *lang,
                session.translation(*lang),
                catalog,
            );
            Section {
                title: lang.display_name().to_string(),
                text: rendered.to_text(),
            }
        })
        .collect())
}
