use thiserror::Error;

use crate::languages::Lang;

/// Input-validation failures. All of these are raised before any network
/// call and leave the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please select a file first")]
    MissingFile,
    #[error("please enter the API base URL")]
    MissingApiBase,
    #[error("select at least one target language before translating")]
    EmptyLanguageSelection,
    #[error("translation for '{0}' is required before export")]
    MissingTranslation(Lang),
}
