//! Location name normalisation.
//!
//! Report families spell the same state differently (`TAMILNADU`,
//! `Tamil Nadu`, `Tamilnadu`). Facts and chunks pass every state, district
//! and block name through [`clean_name`] so that downstream filters see one
//! spelling per place.

use crate::models::Location;

/// Which part of a location a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    State,
    District,
    Block,
}

/// Known misspellings and variants of state names, matched case-insensitively.
const STATE_ALIASES: &[(&str, &str)] = &[
    ("Andman Nicobar", "Andaman and Nicobar Islands"),
    ("Andaman And Nicobar Islands", "Andaman and Nicobar Islands"),
    ("Jammu And Kashmir", "Jammu and Kashmir"),
    ("Jammu Kashmir", "Jammu and Kashmir"),
    ("Dadra And Nagar Haveli", "Dadra and Nagar Haveli"),
    ("Daman And Diu", "Daman and Diu"),
    ("Damandiu", "Daman and Diu"),
    ("Lakshdweep", "Lakshadweep"),
    ("Kerela", "Kerala"),
    ("Telengana", "Telangana"),
    ("Tamilnadu", "Tamil Nadu"),
    ("Arunachal", "Arunachal Pradesh"),
];

/// Trim, drop placeholders, title-case shouting names and apply state aliases.
///
/// Returns `None` for empty input and the literals `null` / `none`.
pub fn clean_name(raw: Option<&str>, kind: NameKind) -> Option<String> {
    let name = raw?.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("null") || name.eq_ignore_ascii_case("none") {
        return None;
    }
    let mut name = if is_all_caps(name) {
        title_case(name)
    } else {
        name.to_string()
    };
    if kind == NameKind::State {
        if let Some((_, canonical)) = STATE_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(&name))
        {
            name = canonical.to_string();
        }
    }
    Some(name)
}

/// Clean every part of a location. A state that cleans to nothing keeps its raw text.
pub fn clean_location(loc: &Location) -> Location {
    Location {
        state: clean_name(Some(&loc.state), NameKind::State).unwrap_or_else(|| loc.state.clone()),
        district: clean_name(loc.district.as_deref(), NameKind::District),
        block: clean_name(loc.block.as_deref(), NameKind::Block),
    }
}

/// True when the text has at least one cased character and no lowercase ones.
pub fn is_all_caps(s: &str) -> bool {
    s.chars().any(|c| c.is_uppercase()) && !s.chars().any(|c| c.is_lowercase())
}

/// Word-wise title case: a letter following a non-letter is uppercased,
/// every other letter is lowercased (`"JAMMU & KASHMIR"` → `"Jammu & Kashmir"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Serial-number debris that leaks into district columns (`"1"`, `"12"`).
pub fn is_numeric_placeholder(name: &str) -> bool {
    name.len() <= 2 && !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}
