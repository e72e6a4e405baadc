use serde::{Deserialize, Serialize};

/// Default EU responsible person printed on every label that does not
/// override it.
pub const DEFAULT_RESPONSIBLE_PERSON: &str =
    "YJN Europe s.r.o.\n6F, M.R. Stefanika, 010 01, Zilina, Slovak Republic";

/// Default country-of-origin statement.
pub const DEFAULT_ORIGIN: &str = "Made in Korea";

/// The eleven editable label attributes, in wire-name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ProductName,
    FunctionClaim,
    UsageInstructions,
    WarningsPrecautions,
    InciIngredients,
    Distributor,
    EuResponsiblePerson,
    CountryOfOrigin,
    BatchLot,
    ExpiryDate,
    NetContent,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::ProductName,
        Field::FunctionClaim,
        Field::UsageInstructions,
        Field::WarningsPrecautions,
        Field::InciIngredients,
        Field::Distributor,
        Field::EuResponsiblePerson,
        Field::CountryOfOrigin,
        Field::BatchLot,
        Field::ExpiryDate,
        Field::NetContent,
    ];

    /// Numbered label order (1..=11) used by the renderer.
    pub const LABEL_ORDER: [Field; 11] = [
        Field::ProductName,
        Field::FunctionClaim,
        Field::UsageInstructions,
        Field::WarningsPrecautions,
        Field::InciIngredients,
        Field::ExpiryDate,
        Field::EuResponsiblePerson,
        Field::Distributor,
        Field::CountryOfOrigin,
        Field::BatchLot,
        Field::NetContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ProductName => "product_name",
            Field::FunctionClaim => "function_claim",
            Field::UsageInstructions => "usage_instructions",
            Field::WarningsPrecautions => "warnings_precautions",
            Field::InciIngredients => "inci_ingredients",
            Field::Distributor => "distributor",
            Field::EuResponsiblePerson => "eu_responsible_person",
            Field::CountryOfOrigin => "country_of_origin",
            Field::BatchLot => "batch_lot",
            Field::ExpiryDate => "expiry_date",
            Field::NetContent => "net_content",
        }
    }

    pub fn parse(name: &str) -> Option<Field> {
        let name = name.trim().to_lowercase();
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
    }

    /// Ingredients and the responsible person are never translated; they are
    /// always rendered from the source fields.
    pub fn is_translatable(&self) -> bool {
        !matches!(self, Field::InciIngredients | Field::EuResponsiblePerson)
    }
}

/// The canonical editable record. Always fully populated; an absent value is
/// the empty string, never a missing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelFields {
    pub product_name: String,
    pub function_claim: String,
    pub usage_instructions: String,
    pub warnings_precautions: String,
    pub inci_ingredients: String,
    pub distributor: String,
    pub eu_responsible_person: String,
    pub country_of_origin: String,
    pub batch_lot: String,
    pub expiry_date: String,
    pub net_content: String,
}

impl Default for LabelFields {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            function_claim: String::new(),
            usage_instructions: String::new(),
            warnings_precautions: String::new(),
            inci_ingredients: String::new(),
            distributor: String::new(),
            eu_responsible_person: DEFAULT_RESPONSIBLE_PERSON.to_string(),
            country_of_origin: DEFAULT_ORIGIN.to_string(),
            batch_lot: String::new(),
            expiry_date: String::new(),
            net_content: String::new(),
        }
    }
}

impl LabelFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::ProductName => &self.product_name,
            Field::FunctionClaim => &self.function_claim,
            Field::UsageInstructions => &self.usage_instructions,
            Field::WarningsPrecautions => &self.warnings_precautions,
            Field::InciIngredients => &self.inci_ingredients,
            Field::Distributor => &self.distributor,
            Field::EuResponsiblePerson => &self.eu_responsible_person,
            Field::CountryOfOrigin => &self.country_of_origin,
            Field::BatchLot => &self.batch_lot,
            Field::ExpiryDate => &self.expiry_date,
            Field::NetContent => &self.net_content,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::ProductName => self.product_name = value,
            Field::FunctionClaim => self.function_claim = value,
            Field::UsageInstructions => self.usage_instructions = value,
            Field::WarningsPrecautions => self.warnings_precautions = value,
            Field::InciIngredients => self.inci_ingredients = value,
            Field::Distributor => self.distributor = value,
            Field::EuResponsiblePerson => self.eu_responsible_person = value,
            Field::CountryOfOrigin => self.country_of_origin = value,
            Field::BatchLot => self.batch_lot = value,
            Field::ExpiryDate => self.expiry_date = value,
            Field::NetContent => self.net_content = value,
        }
    }

    /// Rebuilds the record from a partial snapshot. Absent (or empty) fields
    /// fall back to their documented defaults, not to the previous value.
    pub fn from_partial(partial: PartialFields) -> Self {
        let or_empty = |value: Option<String>| non_empty(value).unwrap_or_default();
        Self {
            product_name: or_empty(partial.product_name),
            function_claim: or_empty(partial.function_claim),
            usage_instructions: or_empty(partial.usage_instructions),
            warnings_precautions: or_empty(partial.warnings_precautions),
            inci_ingredients: or_empty(partial.inci_ingredients),
            distributor: or_empty(partial.distributor),
            eu_responsible_person: non_empty(partial.eu_responsible_person)
                .unwrap_or_else(|| DEFAULT_RESPONSIBLE_PERSON.to_string()),
            country_of_origin: non_empty(partial.country_of_origin)
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            batch_lot: or_empty(partial.batch_lot),
            expiry_date: or_empty(partial.expiry_date),
            net_content: or_empty(partial.net_content),
        }
    }

    /// Applies an OCR result. The upstream `description` and
    /// `function_claim` are composed with " / " when both are present.
    pub fn from_ocr(parsed: OcrParsed) -> Self {
        let function_claim = compose_function_claim(
            parsed.description.as_deref().unwrap_or(""),
            parsed.function_claim.as_deref().unwrap_or(""),
        );
        Self::from_partial(PartialFields {
            product_name: parsed.product_name,
            function_claim: Some(function_claim),
            usage_instructions: parsed.usage_instructions,
            warnings_precautions: parsed.warnings_precautions,
            inci_ingredients: parsed.inci_ingredients,
            distributor: None,
            eu_responsible_person: parsed.responsible_person,
            country_of_origin: parsed.country_of_origin,
            batch_lot: parsed.batch_lot,
            expiry_date: parsed.expiry_date,
            net_content: parsed.net_content,
        })
    }

    /// The translatable subset sent to the translation collaborator.
    pub fn translatable_subset(&self) -> TranslatedFields {
        let mut subset = TranslatedFields::default();
        for field in Field::ALL {
            if field.is_translatable() {
                subset.set(field, self.get(field).to_string());
            }
        }
        subset
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Concatenates the free-text description and the function claim.
pub fn compose_function_claim(description: &str, function_claim: &str) -> String {
    match (description.is_empty(), function_claim.is_empty()) {
        (false, false) => format!("{} / {}", description, function_claim),
        (false, true) => description.to_string(),
        (true, false) => function_claim.to_string(),
        (true, true) => String::new(),
    }
}

/// A possibly incomplete field snapshot, as delivered by the OCR parser or
/// stored in a history record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_claim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings_precautions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inci_ingredients: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eu_responsible_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_lot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_content: Option<String>,
}

impl From<&LabelFields> for PartialFields {
    fn from(fields: &LabelFields) -> Self {
        Self {
            product_name: Some(fields.product_name.clone()),
            function_claim: Some(fields.function_claim.clone()),
            usage_instructions: Some(fields.usage_instructions.clone()),
            warnings_precautions: Some(fields.warnings_precautions.clone()),
            inci_ingredients: Some(fields.inci_ingredients.clone()),
            distributor: Some(fields.distributor.clone()),
            eu_responsible_person: Some(fields.eu_responsible_person.clone()),
            country_of_origin: Some(fields.country_of_origin.clone()),
            batch_lot: Some(fields.batch_lot.clone()),
            expiry_date: Some(fields.expiry_date.clone()),
            net_content: Some(fields.net_content.clone()),
        }
    }
}

/// The parsed block of an OCR response. All fields optional/nullable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OcrParsed {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub function_claim: Option<String>,
    pub usage_instructions: Option<String>,
    pub warnings_precautions: Option<String>,
    pub inci_ingredients: Option<String>,
    pub net_content: Option<String>,
    pub expiry_date: Option<String>,
    pub batch_lot: Option<String>,
    pub country_of_origin: Option<String>,
    pub responsible_person: Option<String>,
}

/// A translated rendition of the translatable fields, keyed per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_claim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings_precautions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_lot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_content: Option<String>,
}

impl TranslatedFields {
    pub fn value_for(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::ProductName => &self.product_name,
            Field::FunctionClaim => &self.function_claim,
            Field::UsageInstructions => &self.usage_instructions,
            Field::WarningsPrecautions => &self.warnings_precautions,
            Field::Distributor => &self.distributor,
            Field::CountryOfOrigin => &self.country_of_origin,
            Field::BatchLot => &self.batch_lot,
            Field::ExpiryDate => &self.expiry_date,
            Field::NetContent => &self.net_content,
            Field::InciIngredients | Field::EuResponsiblePerson => &None,
        };
        value.as_deref()
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::ProductName => &mut self.product_name,
            Field::FunctionClaim => &mut self.function_claim,
            Field::UsageInstructions => &mut self.usage_instructions,
            Field::WarningsPrecautions => &mut self.warnings_precautions,
            Field::Distributor => &mut self.distributor,
            Field::CountryOfOrigin => &mut self.country_of_origin,
            Field::BatchLot => &mut self.batch_lot,
            Field::ExpiryDate => &mut self.expiry_date,
            Field::NetContent => &mut self.net_content,
            Field::InciIngredients | Field::EuResponsiblePerson => return,
        };
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fully_populated() {
        let fields = LabelFields::default();
        assert_eq!(fields.eu_responsible_person, DEFAULT_RESPONSIBLE_PERSON);
        assert_eq!(fields.country_of_origin, DEFAULT_ORIGIN);
        assert_eq!(fields.product_name, "");
    }

    #[test]
    fn from_partial_falls_back_to_defaults_not_previous_values() {
        let partial = PartialFields {
            product_name: Some("Aqua Cream".to_string()),
            country_of_origin: Some(String::new()),
            ..PartialFields::default()
        };
        let fields = LabelFields::from_partial(partial);
        assert_eq!(fields.product_name, "Aqua Cream");
        assert_eq!(fields.country_of_origin, DEFAULT_ORIGIN);
        assert_eq!(fields.eu_responsible_person, DEFAULT_RESPONSIBLE_PERSON);
        assert_eq!(fields.distributor, "");
    }

    #[test]
    fn ocr_composition_joins_description_and_claim() {
        assert_eq!(
            compose_function_claim("Moisturizing", "Soothing"),
            "Moisturizing / Soothing"
        );
        assert_eq!(compose_function_claim("", "Soothing"), "Soothing");
        assert_eq!(compose_function_claim("Moisturizing", ""), "Moisturizing");
        assert_eq!(compose_function_claim("", ""), "");
    }

    #[test]
    fn from_ocr_applies_composition_and_defaults() {
        let parsed = OcrParsed {
            product_name: Some("Aqua Cream".to_string()),
            description: Some("Moisturizing".to_string()),
            function_claim: Some("Soothing".to_string()),
            responsible_person: None,
            ..OcrParsed::default()
        };
        let fields = LabelFields::from_ocr(parsed);
        assert_eq!(fields.function_claim, "Moisturizing / Soothing");
        assert_eq!(fields.eu_responsible_person, DEFAULT_RESPONSIBLE_PERSON);
        assert_eq!(fields.country_of_origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn translatable_subset_excludes_inci_and_responsible_person() {
        let mut fields = LabelFields::default();
        fields.set(Field::InciIngredients, "Aqua, Glycerin");
        fields.set(Field::ProductName, "Aqua Cream");
        let subset = fields.translatable_subset();
        assert_eq!(subset.value_for(Field::ProductName), Some("Aqua Cream"));
        assert_eq!(subset.value_for(Field::InciIngredients), None);
        assert_eq!(subset.value_for(Field::EuResponsiblePerson), None);
    }

    #[test]
    fn wire_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::parse(field.as_str()), Some(field));
        }
        assert_eq!(Field::parse("nonsense"), None);
    }
}
