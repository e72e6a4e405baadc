use quick_xml::escape::escape;

use crate::fields::{Field, LabelFields, TranslatedFields, DEFAULT_ORIGIN, DEFAULT_RESPONSIBLE_PERSON};
use crate::languages::{LabelCatalog, LabelPack, Lang};

/// One caption/value pair of the rendered label. `warning` marks the
/// missing-distributor substitution and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    pub label: String,
    pub value: String,
    pub warning: bool,
}

/// The label document: a title plus the eleven numbered lines in fixed
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLabel {
    pub title: String,
    pub lines: Vec<LabelLine>,
}

impl RenderedLabel {
    /// Plain line-joined text, the form used for previews and for the
    /// section bodies of multi-language export.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(1 + self.lines.len() * 3);
        lines.push(self.title.as_str());
        for line in &self.lines {
            lines.push("");
            lines.push(line.label.as_str());
            lines.push(line.value.as_str());
        }
        lines.join("\n")
    }

    /// Markup-safe copy. The title and each caption/value are escaped on
    /// their own; the composed document is never escaped as a whole.
    pub fn to_segments(&self) -> RenderedLabel {
        RenderedLabel {
            title: escape(self.title.as_str()).into_owned(),
            lines: self
                .lines
                .iter()
                .map(|line| LabelLine {
                    label: escape(line.label.as_str()).into_owned(),
                    value: escape(line.value.as_str()).into_owned(),
                    warning: line.warning,
                })
                .collect(),
        }
    }
}

/// Renders the source-language label: every field shows its own value or
/// its documented fallback.
pub fn render(fields: &LabelFields, catalog: &LabelCatalog) -> RenderedLabel {
    let pack = catalog.source();
    build(pack, |field| source_value(fields, field, pack))
}

/// Renders the label in a target language. Translatable values come from
/// `translated` when present, otherwise the pack's pending placeholder.
/// Ingredients and the responsible person always come from the source
/// fields.
pub fn render_lang(
    fields: &LabelFields,
    lang: Lang,
    translated: Option<&TranslatedFields>,
    catalog: &LabelCatalog,
) -> RenderedLabel {
    let pack = catalog.pack(lang);
    build(pack, |field| {
        if !field.is_translatable() {
            return source_value(fields, field, pack);
        }
        match translated.and_then(|translated| translated.value_for(field)) {
            Some(value) => fallback_value(field, value, pack),
            None => (pack.pending.clone(), false),
        }
    })
}

fn build(pack: &LabelPack, mut value_of: impl FnMut(Field) -> (String, bool)) -> RenderedLabel {
    let lines = Field::LABEL_ORDER
        .into_iter()
        .map(|field| {
            let (value, warning) = value_of(field);
            LabelLine {
                label: pack.caption(field).to_string(),
                value,
                warning,
            }
        })
        .collect();
    RenderedLabel {
        title: pack.title.clone(),
        lines,
    }
}

fn source_value(fields: &LabelFields, field: Field, pack: &LabelPack) -> (String, bool) {
    fallback_value(field, fields.get(field), pack)
}

fn fallback_value(field: Field, raw: &str, pack: &LabelPack) -> (String, bool) {
    if field == Field::Distributor {
        let value = normalize_whitespace(raw);
        return if value.is_empty() {
            (pack.distributor_warning.clone(), true)
        } else {
            (value, false)
        };
    }
    let fallback = match field {
        Field::ExpiryDate | Field::BatchLot => pack.package.as_str(),
        Field::EuResponsiblePerson => DEFAULT_RESPONSIBLE_PERSON,
        Field::CountryOfOrigin => DEFAULT_ORIGIN,
        _ => pack.missing.as_str(),
    };
    if raw.is_empty() {
        (fallback.to_string(), false)
    } else {
        (raw.to_string(), false)
    }
}

/// Collapses runs of whitespace to single spaces and trims the ends.
fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::LabelFields;

    fn catalog() -> LabelCatalog {
        LabelCatalog::load().expect("catalog")
    }

    fn empty_fields() -> LabelFields {
        LabelFields {
            eu_responsible_person: String::new(),
            country_of_origin: String::new(),
            ..LabelFields::default()
        }
    }

    fn line(label: &RenderedLabel, field: Field, pack: &LabelPack) -> LabelLine {
        let caption = pack.caption(field);
        label
            .lines
            .iter()
            .find(|line| line.label == caption)
            .expect("line")
            .clone()
    }

    #[test]
    fn empty_fields_render_documented_fallbacks() {
        let catalog = catalog();
        let rendered = render(&empty_fields(), &catalog);
        let pack = catalog.source();

        assert_eq!(rendered.title, "YJN Partners CPSR Label Example");
        assert_eq!(rendered.lines.len(), 11);

        let expect = [
            (Field::ProductName, "N/A"),
            (Field::FunctionClaim, "N/A"),
            (Field::UsageInstructions, "N/A"),
            (Field::WarningsPrecautions, "N/A"),
            (Field::InciIngredients, "N/A"),
            (Field::ExpiryDate, "Shown on the package"),
            (Field::EuResponsiblePerson, DEFAULT_RESPONSIBLE_PERSON),
            (Field::Distributor, "Distributor info required."),
            (Field::CountryOfOrigin, "Made in Korea"),
            (Field::BatchLot, "Shown on the package"),
            (Field::NetContent, "N/A"),
        ];
        for (field, value) in expect {
            assert_eq!(line(&rendered, field, pack).value, value, "{:?}", field);
        }
        for rendered_line in &rendered.lines {
            let is_distributor = rendered_line.label == pack.caption(Field::Distributor);
            assert_eq!(rendered_line.warning, is_distributor);
        }
    }

    #[test]
    fn distributor_whitespace_is_normalized_and_not_flagged() {
        let catalog = catalog();
        let mut fields = empty_fields();
        fields.set(Field::Distributor, "  ACME   GmbH \n Berlin  ");
        let rendered = render(&fields, &catalog);
        let distributor = line(&rendered, Field::Distributor, catalog.source());
        assert_eq!(distributor.value, "ACME GmbH Berlin");
        assert!(!distributor.warning);
    }

    #[test]
    fn whitespace_only_distributor_is_a_warning() {
        let catalog = catalog();
        let mut fields = empty_fields();
        fields.set(Field::Distributor, "   \t ");
        let rendered = render(&fields, &catalog);
        let distributor = line(&rendered, Field::Distributor, catalog.source());
        assert!(distributor.warning);
        assert_eq!(distributor.value, "Distributor info required.");
    }

    #[test]
    fn example_label_renders_as_documented() {
        let catalog = catalog();
        let mut fields = empty_fields();
        fields.set(Field::ProductName, "Aqua Cream");
        let rendered = render(&fields, &catalog);
        let pack = catalog.source();

        assert_eq!(rendered.title, "YJN Partners CPSR Label Example");
        assert_eq!(line(&rendered, Field::ProductName, pack).value, "Aqua Cream");
        let distributor = line(&rendered, Field::Distributor, pack);
        assert_eq!(distributor.value, "Distributor info required.");
        assert!(distributor.warning);
        assert_eq!(
            line(&rendered, Field::CountryOfOrigin, pack).value,
            "Made in Korea"
        );
    }

    #[test]
    fn translated_mode_uses_pack_captions_and_pending_placeholder() {
        let catalog = catalog();
        let mut fields = empty_fields();
        fields.set(Field::ProductName, "Aqua Cream");
        fields.set(Field::InciIngredients, "Aqua, Glycerin");

        let mut translated = TranslatedFields::default();
        translated.set(Field::ProductName, "Aqua Creme".to_string());

        let rendered = render_lang(&fields, Lang::De, Some(&translated), &catalog);
        let pack = catalog.pack(Lang::De);

        assert_eq!(rendered.title, pack.title);
        assert_eq!(line(&rendered, Field::ProductName, pack).value, "Aqua Creme");
        // Not part of the response: placeholder, not an error.
        assert_eq!(
            line(&rendered, Field::UsageInstructions, pack).value,
            pack.pending
        );
        // Never taken from the translation.
        assert_eq!(
            line(&rendered, Field::InciIngredients, pack).value,
            "Aqua, Glycerin"
        );
        assert_eq!(
            line(&rendered, Field::EuResponsiblePerson, pack).value,
            DEFAULT_RESPONSIBLE_PERSON
        );
    }

    #[test]
    fn translated_mode_without_cache_renders_all_pending() {
        let catalog = catalog();
        let rendered = render_lang(&empty_fields(), Lang::Fr, None, &catalog);
        let pack = catalog.pack(Lang::Fr);
        assert_eq!(line(&rendered, Field::ProductName, pack).value, pack.pending);
        let distributor = line(&rendered, Field::Distributor, pack);
        assert_eq!(distributor.value, pack.pending);
        assert!(!distributor.warning);
    }

    #[test]
    fn empty_translated_value_falls_back() {
        let catalog = catalog();
        let mut translated = TranslatedFields::default();
        translated.set(Field::ProductName, String::new());
        translated.set(Field::Distributor, "  ".to_string());
        let rendered = render_lang(&empty_fields(), Lang::Es, Some(&translated), &catalog);
        let pack = catalog.pack(Lang::Es);
        assert_eq!(line(&rendered, Field::ProductName, pack).value, pack.missing);
        let distributor = line(&rendered, Field::Distributor, pack);
        assert_eq!(distributor.value, pack.distributor_warning);
        assert!(distributor.warning);
    }

    #[test]
    fn to_text_matches_line_joined_layout() {
        let catalog = catalog();
        let mut fields = empty_fields();
        fields.set(Field::ProductName, "Aqua Cream");
        let text = render(&fields, &catalog).to_text();
        assert!(text.starts_with(
            "YJN Partners CPSR Label Example\n\n1. Product Name:\nAqua Cream\n\n2. Product Function:\nN/A"
        ));
        assert!(text.ends_with("11. Nominal Quantities:\nN/A"));
    }

    #[test]
    fn segments_escape_values_individually() {
        let catalog = catalog();
        let mut fields = empty_fields();
        fields.set(Field::ProductName, "Cream <new & improved>");
        let rendered = render(&fields, &catalog);
        let segments = rendered.to_segments();
        assert_eq!(segments.title, "YJN Partners CPSR Label Example");
        let product = segments
            .lines
            .iter()
            .find(|segment| segment.label.starts_with("1."))
            .expect("product segment");
        assert_eq!(product.value, "Cream &lt;new &amp; improved&gt;");
    }

    #[test]
    fn segments_escape_the_title() {
        let rendered = RenderedLabel {
            title: "A & B <Label>".to_string(),
            lines: Vec::new(),
        };
        assert_eq!(rendered.to_segments().title, "A &amp; B &lt;Label&gt;");
    }
}
