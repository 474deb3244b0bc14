/*!
 * Text clean-up around the translation engine.
 *
 * OCR output carries line breaks and table/citation punctuation that confuse
 * the engine, and engines decorate their output with language tags or
 * boilerplate. This module normalizes both sides.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language_utils::LanguageProfile;

/// Characters replaced by a space before and after translation
static NOISE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n|\t|\[|\]|/|\|").unwrap()
});

/// Marker for chunks that must not be sent to the engine
const URL_MARKER: &str = "http";

/// Normalizes text before and after translation
pub struct TextCleaner;

impl TextCleaner {
    /// Replace line breaks, tabs, brackets, slashes and pipes with spaces
    pub fn sanitize(text: &str) -> String {
        NOISE_REGEX.replace_all(text, " ").into_owned()
    }

    /// Whether a chunk holds a URL and must be kept verbatim
    pub fn contains_url(text: &str) -> bool {
        text.contains(URL_MARKER)
    }

    /// Clean one translated chunk according to the target language's engine
    /// quirks. Returns `None` when the chunk is boilerplate to be dropped.
    pub fn clean_chunk(profile: &LanguageProfile, translated: &str) -> Option<String> {
        if profile
            .drop_chunk_prefixes
            .iter()
            .any(|prefix| translated.starts_with(prefix))
        {
            return None;
        }

        if profile.strip_prefixes.is_empty() {
            return Some(translated.to_string());
        }

        let mut cleaned = translated.to_string();
        for prefix in &profile.strip_prefixes {
            cleaned = cleaned.replace(prefix, "");
        }
        Some(cleaned.trim().to_string())
    }

    /// Share of characters outside the profile's target script
    pub fn foreign_ratio(profile: &LanguageProfile, text: &str) -> f32 {
        let total = text.chars().count();
        if total == 0 {
            return 0.0;
        }
        let foreign = text.chars().filter(|c| !profile.is_native_char(*c)).count();
        foreign as f32 / total as f32
    }

    /// Whether a translation is mostly in the wrong script for the profile
    pub fn is_script_mismatch(profile: &LanguageProfile, text: &str) -> bool {
        match profile.max_foreign_ratio {
            Some(max) => Self::foreign_ratio(profile, text) > max,
            None => false,
        }
    }
}
