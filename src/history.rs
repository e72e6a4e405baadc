use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::fields::{LabelFields, PartialFields};

/// One persisted analysis. The identifier is assigned by the history
/// service; a freshly captured record carries none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub meta: String,
    pub raw_text: String,
    pub form: PartialFields,
}

impl HistoryRecord {
    /// Snapshots the current fields into a record ready for upload.
    pub fn capture(
        fields: &LabelFields,
        raw_text: impl Into<String>,
        title: impl Into<String>,
        meta: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            meta: meta.into(),
            raw_text: raw_text.into(),
            form: PartialFields::from(fields),
        }
    }

    /// Rebuilds a field record from the stored snapshot, applying the same
    /// default substitution as an OCR replacement.
    pub fn restore(&self) -> LabelFields {
        LabelFields::from_partial(self.form.clone())
    }
}

/// Trims a history listing to the configured limit. The service returns
/// newest first, so the oldest entries drop. Zero means unlimited.
pub fn clamp_to_limit(mut items: Vec<HistoryRecord>, limit: usize) -> Vec<HistoryRecord> {
    if limit > 0 && items.len() > limit {
        items.truncate(limit);
    }
    items
}

/// Display timestamp for freshly captured records.
pub fn timestamp_meta() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
