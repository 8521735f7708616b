//! Free-text language label → ISO 639-1 code.
//!
//! Lookup order: the static table (English names, native names, ISO 639-2
//! codes, regional variants), then a bare ISO 639-1 code or `xx-yy` tag,
//! then the label with qualifiers stripped (`English (SDH)`,
//! `Spanish - European`), then its first word. Labels that still don't
//! match are rejected; callers drop those captions.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

static LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        // English names
        ("afrikaans", "af"),
        ("albanian", "sq"),
        ("amharic", "am"),
        ("arabic", "ar"),
        ("armenian", "hy"),
        ("azerbaijani", "az"),
        ("basque", "eu"),
        ("belarusian", "be"),
        ("bengali", "bn"),
        ("bosnian", "bs"),
        ("breton", "br"),
        ("bulgarian", "bg"),
        ("burmese", "my"),
        ("catalan", "ca"),
        ("chinese", "zh"),
        ("croatian", "hr"),
        ("czech", "cs"),
        ("danish", "da"),
        ("dutch", "nl"),
        ("english", "en"),
        ("esperanto", "eo"),
        ("estonian", "et"),
        ("filipino", "tl"),
        ("finnish", "fi"),
        ("french", "fr"),
        ("galician", "gl"),
        ("georgian", "ka"),
        ("german", "de"),
        ("greek", "el"),
        ("gujarati", "gu"),
        ("hebrew", "he"),
        ("hindi", "hi"),
        ("hungarian", "hu"),
        ("icelandic", "is"),
        ("indonesian", "id"),
        ("indonesia", "id"),
        ("irish", "ga"),
        ("italian", "it"),
        ("japanese", "ja"),
        ("kannada", "kn"),
        ("kazakh", "kk"),
        ("khmer", "km"),
        ("korean", "ko"),
        ("kurdish", "ku"),
        ("latvian", "lv"),
        ("lithuanian", "lt"),
        ("macedonian", "mk"),
        ("malay", "ms"),
        ("malayalam", "ml"),
        ("marathi", "mr"),
        ("mongolian", "mn"),
        ("nepali", "ne"),
        ("norwegian", "no"),
        ("persian", "fa"),
        ("farsi", "fa"),
        ("polish", "pl"),
        ("portuguese", "pt"),
        ("punjabi", "pa"),
        ("romanian", "ro"),
        ("russian", "ru"),
        ("serbian", "sr"),
        ("sinhala", "si"),
        ("slovak", "sk"),
        ("slovenian", "sl"),
        ("somali", "so"),
        ("spanish", "es"),
        ("swahili", "sw"),
        ("swedish", "sv"),
        ("tagalog", "tl"),
        ("tamil", "ta"),
        ("telugu", "te"),
        ("thai", "th"),
        ("turkish", "tr"),
        ("ukrainian", "uk"),
        ("urdu", "ur"),
        ("uzbek", "uz"),
        ("vietnamese", "vi"),
        ("welsh", "cy"),
        // Regional variants
        ("portuguese (br)", "pt-br"),
        ("portuguese (brazil)", "pt-br"),
        ("portuguese-br", "pt-br"),
        ("brazilian portuguese", "pt-br"),
        ("brazilian", "pt-br"),
        ("chinese (traditional)", "zh-tw"),
        ("chinese traditional", "zh-tw"),
        ("chinese (simplified)", "zh"),
        ("chinese simplified", "zh"),
        ("chinese bg code", "zh"),
        // Native names
        ("العربية", "ar"),
        ("اَلْعَرَبِيَّةُ", "ar"),
        ("বাংলা", "bn"),
        ("中文", "zh"),
        ("dansk", "da"),
        ("deutsch", "de"),
        ("español", "es"),
        ("français", "fr"),
        ("italiano", "it"),
        ("日本語", "ja"),
        ("한국어", "ko"),
        ("nederlands", "nl"),
        ("norsk", "no"),
        ("polski", "pl"),
        ("português", "pt"),
        ("русский", "ru"),
        ("suomi", "fi"),
        ("svenska", "sv"),
        ("türkçe", "tr"),
        ("اردو", "ur"),
        // ISO 639-2 codes
        ("ara", "ar"),
        ("bul", "bg"),
        ("chi", "zh"),
        ("zho", "zh"),
        ("cze", "cs"),
        ("ces", "cs"),
        ("dan", "da"),
        ("dut", "nl"),
        ("nld", "nl"),
        ("eng", "en"),
        ("est", "et"),
        ("fin", "fi"),
        ("fre", "fr"),
        ("fra", "fr"),
        ("ger", "de"),
        ("deu", "de"),
        ("gre", "el"),
        ("ell", "el"),
        ("heb", "he"),
        ("hin", "hi"),
        ("hrv", "hr"),
        ("hun", "hu"),
        ("ind", "id"),
        ("ita", "it"),
        ("jpn", "ja"),
        ("kor", "ko"),
        ("nor", "no"),
        ("per", "fa"),
        ("fas", "fa"),
        ("pol", "pl"),
        ("por", "pt"),
        ("pob", "pt-br"),
        ("rum", "ro"),
        ("ron", "ro"),
        ("rus", "ru"),
        ("slv", "sl"),
        ("spa", "es"),
        ("srp", "sr"),
        ("swe", "sv"),
        ("tha", "th"),
        ("tur", "tr"),
        ("ukr", "uk"),
        ("vie", "vi"),
    ]
    .into_iter()
    .collect()
});

/// ISO 639-1 codes accepted as-is.
static CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    LABELS
        .values()
        .copied()
        .map(|code| code.split('-').next().unwrap_or(code))
        .collect()
});

/// Normalize a free-text label. `None` means the label is unmappable and
/// the caption should be dropped.
#[must_use]
pub fn label_to_language_code(label: &str) -> Option<String> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }

    if let Some(code) = LABELS.get(label.as_str()) {
        return Some((*code).to_string());
    }

    if let Some(code) = as_code(&label) {
        return Some(code);
    }

    let stripped = strip_qualifiers(&label);
    if stripped != label {
        if let Some(code) = LABELS.get(stripped) {
            return Some((*code).to_string());
        }
    }

    let first_word = stripped
        .split(|c: char| !c.is_alphabetic())
        .find(|w| !w.is_empty())?;
    LABELS.get(first_word).map(|code| (*code).to_string())
}

/// Normalize a caption name as found on a provider site.
///
/// Names show up as `English.srt`, `en:hi` or just `French`; only the part
/// before the extension or colon is used. `site_map` is consulted before the
/// shared table, with lowercase keys.
#[must_use]
pub fn normalize_site_label(name: &str, site_map: &HashMap<&str, &str>) -> Option<String> {
    let label = if let Some((head, _)) = name.split_once(".srt") {
        head
    } else if let Some((head, _)) = name.split_once(':') {
        head
    } else {
        name
    };
    let label = label.trim().to_lowercase();

    site_map
        .get(label.as_str())
        .map(|code| (*code).to_string())
        .or_else(|| label_to_language_code(&label))
}

/// `en`, `EN`, `pt-BR`, `pt_br` → code when the primary subtag is known.
fn as_code(label: &str) -> Option<String> {
    let normalized = label.replace('_', "-");
    let mut parts = normalized.split('-');
    let primary = parts.next()?;
    let region = parts.next();
    if parts.next().is_some() || primary.len() != 2 || !CODES.contains(primary) {
        return None;
    }
    match region {
        None => Some(primary.to_string()),
        Some(region) if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(format!("{primary}-{region}"))
        }
        Some(_) => None,
    }
}

/// Drop `(…)`, ` - …` and `, …` qualifiers.
fn strip_qualifiers(label: &str) -> &str {
    let cut = [label.find('('), label.find(" - "), label.find(',')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(label.len());
    label[..cut].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookups() {
        assert_eq!(label_to_language_code("french").as_deref(), Some("fr"));
        assert_eq!(label_to_language_code("French").as_deref(), Some("fr"));
        assert_eq!(label_to_language_code("  GERMAN ").as_deref(), Some("de"));
        assert_eq!(label_to_language_code("Portuguese (BR)").as_deref(), Some("pt-br"));
        assert_eq!(label_to_language_code("Brazilian Portuguese").as_deref(), Some("pt-br"));
        assert_eq!(label_to_language_code("eng").as_deref(), Some("en"));
        assert_eq!(label_to_language_code("Español").as_deref(), Some("es"));
    }

    #[test]
    fn unmappable_labels_are_rejected() {
        assert_eq!(label_to_language_code("Klingon"), None);
        assert_eq!(label_to_language_code(""), None);
        assert_eq!(label_to_language_code("   "), None);
        assert_eq!(label_to_language_code("xx"), None);
    }

    #[test]
    fn bare_codes_pass_through() {
        assert_eq!(label_to_language_code("en").as_deref(), Some("en"));
        assert_eq!(label_to_language_code("pt-BR").as_deref(), Some("pt-br"));
        assert_eq!(label_to_language_code("zh_TW").as_deref(), Some("zh-tw"));
        assert_eq!(label_to_language_code("en-abc"), None);
    }

    #[test]
    fn qualifiers_are_stripped() {
        assert_eq!(label_to_language_code("English (SDH)").as_deref(), Some("en"));
        assert_eq!(label_to_language_code("Spanish - Latin American").as_deref(), Some("es"));
        assert_eq!(label_to_language_code("English SDH").as_deref(), Some("en"));
        assert_eq!(label_to_language_code("Klingon (SDH)"), None);
    }

    #[test]
    fn site_labels() {
        let site: HashMap<&str, &str> =
            [("chinese - hong kong", "zh"), ("english - sdh", "en")].into_iter().collect();
        assert_eq!(normalize_site_label("English.srt", &site).as_deref(), Some("en"));
        assert_eq!(normalize_site_label("fr:hi", &site).as_deref(), Some("fr"));
        assert_eq!(normalize_site_label("Chinese - Hong Kong", &site).as_deref(), Some("zh"));
        assert_eq!(normalize_site_label("Klingon.srt", &site), None);
    }
}
