use std::collections::HashMap;

use tracing::warn;

use crate::error::ValidationError;
use crate::fields::{Field, LabelFields, OcrParsed, PartialFields, TranslatedFields};
use crate::history::HistoryRecord;
use crate::languages::Lang;

/// A token identifying the session state at the time a request was issued.
/// Responses arriving after a newer field mutation carry a stale token and
/// are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// The whole editing state of one label: the field record, the raw OCR
/// text, the per-language translation cache, the target-language selection
/// and the active preview language.
///
/// Field mutation is the only write path; every mutation clears the entire
/// translation cache so translations can never go stale silently.
#[derive(Debug, Default)]
pub struct LabelSession {
    fields: LabelFields,
    raw_text: String,
    translations: HashMap<Lang, TranslatedFields>,
    selection: Vec<Lang>,
    active: Option<Lang>,
    generation: u64,
}

impl LabelSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &LabelFields {
        &self.fields
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn selection(&self) -> &[Lang] {
        &self.selection
    }

    pub fn active(&self) -> Option<Lang> {
        self.active
    }

    pub fn translation(&self, lang: Lang) -> Option<&TranslatedFields> {
        self.translations.get(&lang)
    }

    pub fn has_translation(&self, lang: Lang) -> bool {
        self.translations.contains_key(&lang)
    }

    /// Captures the current generation; pass the token back when applying
    /// the matching OCR or translation response.
    pub fn begin_request(&self) -> RequestToken {
        RequestToken(self.generation)
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.fields.set(field, value);
        self.mark_mutated();
    }

    /// Replaces the whole record; absent fields fall back to their
    /// documented defaults.
    pub fn replace_fields(&mut self, partial: PartialFields) {
        self.fields = LabelFields::from_partial(partial);
        self.mark_mutated();
    }

    /// Applies a completed OCR result. Returns false (and changes nothing)
    /// when the token is stale, i.e. the fields were edited or another
    /// request was applied since the request was issued.
    pub fn apply_ocr(&mut self, token: RequestToken, raw_text: String, parsed: OcrParsed) -> bool {
        if token.0 != self.generation {
            warn!("dropping stale OCR response");
            return false;
        }
        self.raw_text = raw_text;
        self.fields = LabelFields::from_ocr(parsed);
        self.mark_mutated();
        true
    }

    /// Restores a history record as the current field set.
    pub fn restore_history(&mut self, record: &HistoryRecord) {
        self.raw_text = record.raw_text.clone();
        self.fields = record.restore();
        self.mark_mutated();
    }

    /// Clears all cached translations and resets the active language.
    pub fn invalidate(&mut self) {
        self.translations.clear();
        self.active = None;
    }

    /// Replaces the target-language selection. The active language is kept
    /// when still selected, otherwise reassigned to the first element of
    /// the new selection (or cleared when the selection is empty).
    pub fn select_languages(&mut self, langs: &[Lang]) {
        let mut selection = Vec::new();
        for lang in langs {
            if !selection.contains(lang) {
                selection.push(*lang);
            }
        }
        self.selection = selection;
        self.enforce_active();
    }

    /// No-op unless the language is currently selected.
    pub fn set_active(&mut self, lang: Lang) {
        if self.selection.contains(&lang) {
            self.active = Some(lang);
        }
    }

    /// Builds the translation request payload: the selected target
    /// languages (in selection order) and the translatable subset of the
    /// current fields. Rejected before any network interaction when the
    /// selection is empty.
    pub fn translation_request(&self) -> Result<(Vec<Lang>, TranslatedFields), ValidationError> {
        if self.selection.is_empty() {
            return Err(ValidationError::EmptyLanguageSelection);
        }
        Ok((self.selection.clone(), self.fields.translatable_subset()))
    }

    /// Replaces the cache for exactly the supplied languages and activates
    /// the first language of the originating request. Returns false (and
    /// changes nothing) when the token is stale.
    pub fn apply_translations(
        &mut self,
        token: RequestToken,
        order: &[Lang],
        mut translations: HashMap<Lang, TranslatedFields>,
    ) -> bool {
        if token.0 != self.generation {
            warn!("dropping stale translation response");
            return false;
        }
        self.translations.clear();
        for lang in order {
            if let Some(translated) = translations.remove(lang) {
                self.translations.insert(*lang, translated);
            }
        }
        self.active = order.first().copied();
        self.enforce_active();
        true
    }

    fn mark_mutated(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.invalidate();
    }

    fn enforce_active(&mut self) {
        match self.active {
            Some(lang) if self.selection.contains(&lang) => {}
            _ => self.active = self.selection.first().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translations_for(langs: &[Lang]) -> HashMap<Lang, TranslatedFields> {
        langs
            .iter()
            .map(|lang| {
                let mut translated = TranslatedFields::default();
                translated.set(Field::ProductName, format!("name-{}", lang));
                (*lang, translated)
            })
            .collect()
    }

    #[test]
    fn set_field_clears_all_translations_and_active_language() {
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::En, Lang::De]);
        let token = session.begin_request();
        assert!(session.apply_translations(
            token,
            &[Lang::En, Lang::De],
            translations_for(&[Lang::En, Lang::De]),
        ));
        assert!(session.has_translation(Lang::En));
        assert!(session.has_translation(Lang::De));
        assert_eq!(session.active(), Some(Lang::En));

        session.set_field(Field::ProductName, "Aqua Cream");
        assert!(!session.has_translation(Lang::En));
        assert!(!session.has_translation(Lang::De));
        assert_eq!(session.active(), None);
    }

    #[test]
    fn selection_change_reassigns_active_deterministically() {
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::En, Lang::De, Lang::Fr]);
        session.set_active(Lang::En);
        assert_eq!(session.active(), Some(Lang::En));

        session.select_languages(&[Lang::De, Lang::Fr]);
        assert_eq!(session.active(), Some(Lang::De));

        session.select_languages(&[]);
        assert_eq!(session.active(), None);
    }

    #[test]
    fn set_active_ignores_unselected_languages() {
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::En]);
        session.set_active(Lang::De);
        assert_eq!(session.active(), Some(Lang::En));
    }

    #[test]
    fn selection_drops_duplicates_keeps_order() {
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::De, Lang::En, Lang::De]);
        assert_eq!(session.selection(), &[Lang::De, Lang::En]);
    }

    #[test]
    fn translation_request_rejects_empty_selection() {
        let session = LabelSession::new();
        assert_eq!(
            session.translation_request(),
            Err(ValidationError::EmptyLanguageSelection)
        );
    }

    #[test]
    fn stale_translation_response_is_dropped() {
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::En]);
        let token = session.begin_request();
        // Edit while the request is in flight.
        session.set_field(Field::ProductName, "Edited");
        assert!(!session.apply_translations(token, &[Lang::En], translations_for(&[Lang::En])));
        assert!(!session.has_translation(Lang::En));
    }

    #[test]
    fn stale_ocr_response_is_dropped() {
        let mut session = LabelSession::new();
        let token = session.begin_request();
        session.set_field(Field::ProductName, "Edited");
        assert!(!session.apply_ocr(token, "raw".to_string(), OcrParsed::default()));
        assert_eq!(session.fields().product_name, "Edited");
        assert_eq!(session.raw_text(), "");
    }

    #[test]
    fn apply_translations_replaces_not_merges() {
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::En, Lang::De]);
        let token = session.begin_request();
        assert!(session.apply_translations(
            token,
            &[Lang::En, Lang::De],
            translations_for(&[Lang::En, Lang::De]),
        ));
        let token = session.begin_request();
        assert!(session.apply_translations(token, &[Lang::De], translations_for(&[Lang::De])));
        assert!(!session.has_translation(Lang::En));
        assert!(session.has_translation(Lang::De));
        assert_eq!(session.active(), Some(Lang::De));
    }

    #[test]
    fn ocr_application_invalidates_translations() {
        let mut session = LabelSession::new();
        session.select_languages(&[Lang::En]);
        let token = session.begin_request();
        assert!(session.apply_translations(token, &[Lang::En], translations_for(&[Lang::En])));

        let token = session.begin_request();
        let parsed = OcrParsed {
            product_name: Some("Scanned".to_string()),
            ..OcrParsed::default()
        };
        assert!(session.apply_ocr(token, "raw text".to_string(), parsed));
        assert!(!session.has_translation(Lang::En));
        assert_eq!(session.fields().product_name, "Scanned");
        assert_eq!(session.raw_text(), "raw text");
    }
}
