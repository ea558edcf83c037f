//! Variable auto-naming
//!
//! Components that the caller did not name get a variable derived from their label
//! or IRI, camel-cased and made unique against the names already in use.

use crate::component::Component;
use crate::expr::BindingTable;

/// Pick a fresh variable name for a component
///
/// The base is the label in the preferred language, else the last IRI segment
/// (prefixed with the component kind when that segment is a bare number). An
/// optional suffix is appended before camel-casing. Collisions are resolved by
/// appending `1`, or incrementing a trailing number.
pub fn auto_name(
    component: &Component,
    suffix: Option<&str>,
    languages: &[String],
    table: &BindingTable,
) -> String {
    let mut base = component
        .label(languages)
        .map(|l| l.value.clone())
        .filter(|v| !v.is_empty())
        .or_else(|| component.iri().map(|iri| iri_local_part(component, iri)))
        .unwrap_or_default();

    if let Some(suffix) = suffix {
        base = format!("{} {}", base, suffix);
    }

    let mut name = camel_case(&base);
    if name.is_empty() {
        name = camel_case("tmp var1");
    }

    while table.is_taken(&name) {
        name = bump(&name);
    }
    name
}

fn iri_local_part(component: &Component, iri: &str) -> String {
    let local = match iri.rfind('#') {
        Some(pos) => &iri[pos + 1..],
        None => iri.rsplit('/').next().unwrap_or(iri),
    };

    let is_number = local
        .parse::<i64>()
        .map(|n| n.to_string() == local)
        .unwrap_or(false);

    if is_number {
        format!("{}{}", component.kind(), local)
    } else {
        local.to_string()
    }
}

/// `raum` -> `raum1`, `raum1` -> `raum2`, `raum09` -> `raum10`
fn bump(name: &str) -> String {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];
    match digits.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
        Some(next) => {
            let next = next.to_string();
            let width = digits.len().max(next.len());
            format!("{}{:0>width$}", stem, next, width = width)
        }
        None => format!("{}1", name),
    }
}

/// Fold accented letters to ASCII, split on anything non-alphanumeric and camel-case
pub fn camel_case(text: &str) -> String {
    let folded = fold_diacritics(text);
    let mut out = String::with_capacity(folded.len());

    let words = folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty());

    for (i, word) in words.enumerate() {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

fn fold_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let folded = match c {
            'ä' | 'à' | 'á' | 'â' | 'ã' | 'å' => "a",
            'Ä' | 'À' | 'Á' | 'Â' | 'Ã' | 'Å' => "A",
            'ö' | 'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "o",
            'Ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => "O",
            'ü' | 'ù' | 'ú' | 'û' => "u",
            'Ü' | 'Ù' | 'Ú' | 'Û' => "U",
            'é' | 'è' | 'ê' | 'ë' => "e",
            'É' | 'È' | 'Ê' | 'Ë' => "E",
            'ï' | 'ì' | 'í' | 'î' => "i",
            'Ï' | 'Ì' | 'Í' | 'Î' => "I",
            'ç' => "c",
            'Ç' => "C",
            'ñ' => "n",
            'Ñ' => "N",
            'ß' => "ss",
            'æ' => "ae",
            'Æ' => "AE",
            'œ' => "oe",
            'Œ' => "OE",
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(folded);
    }
    out
}
