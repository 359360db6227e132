use anyhow::{anyhow, Result};
use isolang::Language as IsoLanguage;
use serde::{Deserialize, Serialize};

/// Language utilities for language tag handling
///
/// Requests carry either bare ISO 639 codes ("en", "hin") or BCP-47 style
/// tags with a region ("hi-IN"). Everything here works on the primary
/// subtag and leaves the region untouched.
/// A language a provider can translate to or from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Language {
    /// Tag as the provider expects it ("hi-IN", "fr")
    pub code: String,
    /// English display name
    pub name: String,
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Build from a tag, resolving the name through ISO 639
    pub fn from_tag(tag: &str) -> Result<Self> {
        Ok(Self::new(tag, get_language_name(tag)?))
    }
}

/// Extract the primary language subtag, lowercased ("hi-IN" -> "hi")
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn lookup(primary: &str) -> Option<IsoLanguage> {
    match primary.len() {
        2 => IsoLanguage::from_639_1(primary),
        3 => IsoLanguage::from_639_3(primary).or_else(|| part2b_to_part2t(primary).and_then(IsoLanguage::from_639_3)),
        _ => None,
    }
}

// ISO 639-2/B codes that differ from their 639-2/T form
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "per" => Some("fas"),
        "may" => Some("msa"),
        "bur" => Some("mya"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Validate a language tag ("en", "eng", "hi-IN", "od-IN")
pub fn validate_language_tag(tag: &str) -> Result<()> {
    let primary = primary_subtag(tag);
    if primary.is_empty() {
        return Err(anyhow!("Language tag cannot be empty"));
    }
    // "od" is the Odia tag used by Indic translation APIs (ISO uses "or")
    if primary == "od" || lookup(&primary).is_some() {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", tag))
    }
}

/// Normalize a tag to its ISO 639-3 code ("hi-IN" -> "hin")
pub fn normalize_to_part3(tag: &str) -> Result<String> {
    let primary = match primary_subtag(tag).as_str() {
        "od" => "or".to_string(),
        other => other.to_string(),
    };
    lookup(&primary)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", tag))
}

/// Check if two tags name the same language, ignoring region
pub fn language_tags_match(tag1: &str, tag2: &str) -> bool {
    match (normalize_to_part3(tag1), normalize_to_part3(tag2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a tag
pub fn get_language_name(tag: &str) -> Result<String> {
    let part3 = normalize_to_part3(tag)?;
    let lang = IsoLanguage::from_639_3(&part3)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", part3))?;
    Ok(lang.to_name().to_string())
}

/// Display name for prompts, falling back to the raw tag
pub fn display_name(tag: &str) -> String {
    get_language_name(tag).unwrap_or_else(|_| tag.to_string())
}
