use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use crate::fields::Field;

/// Closed catalog of export languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    De,
    Fr,
    It,
    Es,
}

impl Lang {
    pub const ALL: [Lang; 5] = [Lang::En, Lang::De, Lang::Fr, Lang::It, Lang::Es];

    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::De => "de",
            Lang::Fr => "fr",
            Lang::It => "it",
            Lang::Es => "es",
        }
    }

    /// Section title used for multi-language export.
    pub fn display_name(&self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::De => "Deutsch",
            Lang::Fr => "Français",
            Lang::It => "Italiano",
            Lang::Es => "Español",
        }
    }

    pub fn parse(code: &str) -> Option<Lang> {
        let code = code.trim().to_lowercase();
        Lang::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Caption and fallback strings for one rendering language.
#[derive(Debug, Clone)]
pub struct LabelPack {
    pub title: String,
    pub pending: String,
    pub missing: String,
    pub package: String,
    pub distributor_warning: String,
    captions: HashMap<String, String>,
}

impl LabelPack {
    pub fn caption(&self, field: Field) -> &str {
        // Coverage is validated at load, see `LabelCatalog::load`.
        self.captions
            .get(field.as_str())
            .map(String::as_str)
            .unwrap_or(field.as_str())
    }
}

/// All label packs: one per catalog language plus the source-language pack
/// used when no target language is requested.
#[derive(Debug, Clone)]
pub struct LabelCatalog {
    source: LabelPack,
    packs: HashMap<Lang, LabelPack>,
}

impl LabelCatalog {
    pub fn load() -> Result<Self> {
        let source = parse_pack("source", include_str!("source.toml"))?;
        let mut packs = HashMap::new();
        for (lang, raw) in [
            (Lang::En, include_str!("en.toml")),
            (Lang::De, include_str!("de.toml")),
            (Lang::Fr, include_str!("fr.toml")),
            (Lang::It, include_str!("it.toml")),
            (Lang::Es, include_str!("es.toml")),
        ] {
            packs.insert(lang, parse_pack(lang.code(), raw)?);
        }
        Ok(LabelCatalog { source, packs })
    }

    pub fn source(&self) -> &LabelPack {
        &self.source
    }

    pub fn pack(&self, lang: Lang) -> &LabelPack {
        // The map is populated for every catalog language in `load`.
        self.packs.get(&lang).unwrap_or(&self.source)
    }
}

#[derive(Debug, Deserialize)]
struct PackFile {
    label: PackSection,
}

#[derive(Debug, Deserialize)]
struct PackSection {
    title: String,
    pending: String,
    captions: HashMap<String, String>,
    fallbacks: PackFallbacks,
}

#[derive(Debug, Deserialize)]
struct PackFallbacks {
    missing: String,
    package: String,
    distributor_warning: String,
}

fn parse_pack(name: &str, raw: &str) -> Result<LabelPack> {
    let parsed: PackFile = toml::from_str(raw)
        .with_context(|| format!("failed to parse label pack '{}'", name))?;
    let pack = LabelPack {
        title: parsed.label.title,
        pending: parsed.label.pending,
        missing: parsed.label.fallbacks.missing,
        package: parsed.label.fallbacks.package,
        distributor_warning: parsed.label.fallbacks.distributor_warning,
        captions: parsed.label.captions,
    };
    validate_pack(name, &pack)?;
    Ok(pack)
}

fn validate_pack(name: &str, pack: &LabelPack) -> Result<()> {
    for value in [
        &pack.title,
        &pack.pending,
        &pack.missing,
        &pack.package,
        &pack.distributor_warning,
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!("label pack '{}' has an empty string entry", name));
        }
    }
    for field in Field::ALL {
        let caption = pack.captions.get(field.as_str());
        if caption.map(|value| value.trim().is_empty()).unwrap_or(true) {
            return Err(anyhow!(
                "label pack '{}' is missing a caption for '{}'",
                name,
                field.as_str()
            ));
        }
    }
    for key in pack.captions.keys() {
        if Field::parse(key).is_none() {
            return Err(anyhow!(
                "label pack '{}' has a caption for unknown field '{}'",
                name,
                key
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_language_and_field() {
        let catalog = LabelCatalog::load().expect("catalog");
        for lang in Lang::ALL {
            let pack = catalog.pack(lang);
            for field in Field::ALL {
                assert!(!pack.caption(field).is_empty());
            }
            assert!(!pack.pending.is_empty());
            assert!(!pack.distributor_warning.is_empty());
        }
        assert_eq!(
            catalog.source().title,
            "YJN Partners CPSR Label Example"
        );
    }

    #[test]
    fn lang_codes_round_trip() {
        for lang in Lang::ALL {
            assert_eq!(Lang::parse(lang.code()), Some(lang));
        }
        assert_eq!(Lang::parse(" EN "), Some(Lang::En));
        assert_eq!(Lang::parse("ko"), None);
    }

    #[test]
    fn display_names_match_catalog() {
        assert_eq!(Lang::En.display_name(), "English");
        assert_eq!(Lang::De.display_name(), "Deutsch");
        assert_eq!(Lang::Es.display_name(), "Español");
    }
}
