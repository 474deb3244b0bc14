use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};

/// Language utilities for ISO language codes and per-language rendering
/// profiles.
///
/// A target language decides three things downstream: which script metric
/// the reflow uses, which font is drawn with, and which quirks of the
/// translation engine's output have to be cleaned up.

/// ISO 639-2/B codes that differ from their ISO 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a 2- or 3-letter code to an ISO language
fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let part2t = match PART2B_TO_PART2T.iter().find(|(b, _)| *b == normalized) {
                Some((_, t)) => *t,
                None => normalized.as_str(),
            };
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible.
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists.
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Script metric used for wrapping and font selection
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    /// CJK: wide glyphs take two columns and break anywhere
    Fullwidth,
    /// Proportional Latin-like scripts, broken at whitespace
    Latin,
}

/// Target-language specific behaviour of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageProfile {
    /// ISO 639-1 code (or 639-2/T when no 2-letter code exists)
    pub code: String,

    /// English name, used in translation prompts
    pub name: String,

    /// Script used for reflow and font lookup
    pub script: Script,

    /// Prefixes the engine prepends to its output that must be removed
    pub strip_prefixes: Vec<&'static str>,

    /// Translated chunks starting with one of these are dropped entirely
    pub drop_chunk_prefixes: Vec<&'static str>,

    /// Maximum share of characters outside the target script before a
    /// translation is rejected
    pub max_foreign_ratio: Option<f32>,
}

impl LanguageProfile {
    /// Build the profile for a target language code
    pub fn for_language(code: &str) -> Result<Self> {
        let code = normalize_to_part1_or_part2t(code)?;
        let name = get_language_name(&code)?;

        let profile = match code.as_str() {
            "ja" => Self {
                script: Script::Fullwidth,
                strip_prefixes: Vec::new(),
                drop_chunk_prefixes: vec!["「この版"],
                max_foreign_ratio: Some(0.8),
                code,
                name,
            },
            "zh" | "ko" => Self {
                script: Script::Fullwidth,
                strip_prefixes: Vec::new(),
                drop_chunk_prefixes: Vec::new(),
                max_foreign_ratio: None,
                code,
                name,
            },
            "vi" => Self {
                script: Script::Latin,
                strip_prefixes: vec!["vi: ", "vi "],
                drop_chunk_prefixes: Vec::new(),
                max_foreign_ratio: None,
                code,
                name,
            },
            _ => Self {
                script: Script::Latin,
                strip_prefixes: Vec::new(),
                drop_chunk_prefixes: Vec::new(),
                max_foreign_ratio: None,
                code,
                name,
            },
        };

        Ok(profile)
    }

    /// Whether `c` belongs to the profile's target script.
    /// Only meaningful for profiles with a purity threshold.
    pub fn is_native_char(&self, c: char) -> bool {
        match self.code.as_str() {
            "ja" => matches!(c,
                '\u{3040}'..='\u{309F}'   // Hiragana
                | '\u{30A0}'..='\u{30FF}' // Katakana
                | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
                | '\u{3400}'..='\u{4DBF}' // CJK extension A
            ),
            _ => true,
        }
    }
}
