// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text normalisation for extracted cells.
//
// Person cells regularly run into neighbouring columns: product codes,
// dates, and amounts follow the name on the same line. Tokens are
// classified by an ordered rule table and the name is cut at the first
// token that is not name-like.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Classification of a single token's bare (alphanumeric-only) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Name,
    HeaderWord,
    ProductCode,
    DateLike,
    NumericLike,
    NoLetters,
    Empty,
}

/// Column header vocabulary that leaks into body cells.
const HEADER_WORDS: &[&str] = &[
    "nm", "nmsentra", "sentra", "customer", "customername", "name", "kd", "produk", "plafon",
    "angsuran", "angs", "saldo", "saldotabung", "tabungan", "kettabungan", "ket", "current",
    "month", "level", "an", "header", "kolom", "sisa", "best", "effort", "nama", "co",
];

const PRODUCT_CODE: &str = r"(?:PM|SL|TP|PL|RM|KM|P)[A-Z0-9]{1,4}|\d{1,4}[A-Z]{1,3}";

static PRODUCT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i)^(?:{PRODUCT_CODE})$")).expect("hardcoded product regex is valid")
});

static PRODUCT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i)(?:{PRODUCT_CODE})$")).expect("hardcoded suffix regex is valid")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$|^\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}$")
        .expect("hardcoded date regex is valid")
});

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?\d{1,3}(?:[.,]\d{3})*(?:[.,]\d+)?$")
        .expect("hardcoded numeric regex is valid")
});

static IIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:11s|1is|i1s)\b").expect("hardcoded IIS regex is valid")
});

static NAME_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\s'’-]+$").expect("hardcoded name regex is valid")
});

fn is_header_word(bare: &str) -> bool {
    HEADER_WORDS.iter().any(|h| h.eq_ignore_ascii_case(bare))
}

fn is_product_code(bare: &str) -> bool {
    PRODUCT_CODE_RE.is_match(bare)
}

fn is_date_like(bare: &str) -> bool {
    DATE_RE.is_match(bare)
}

fn is_numeric_like(bare: &str) -> bool {
    NUMERIC_RE.is_match(bare)
}

fn has_no_letters(bare: &str) -> bool {
    !bare.chars().any(char::is_alphabetic)
}

/// Ordered classification rules; the first match wins, `Name` otherwise.
const TOKEN_RULES: &[(TokenClass, fn(&str) -> bool)] = &[
    (TokenClass::HeaderWord, is_header_word),
    (TokenClass::ProductCode, is_product_code),
    (TokenClass::DateLike, is_date_like),
    (TokenClass::NumericLike, is_numeric_like),
    (TokenClass::NoLetters, has_no_letters),
];

/// Characters outside letters and digits removed.
pub fn bare_form(token: &str) -> String {
    token.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Classify a bare token against [`TOKEN_RULES`].
pub fn classify_token(bare: &str) -> TokenClass {
    if bare.is_empty() {
        return TokenClass::Empty;
    }
    TOKEN_RULES
        .iter()
        .find(|(_, matches)| matches(bare))
        .map_or(TokenClass::Name, |(class, _)| *class)
}

fn is_lone_bu(name: &str) -> bool {
    name.eq_ignore_ascii_case("bu")
}

/// Pipes become spaces; whitespace is collapsed and trimmed.
pub fn clean_group_name(raw: &str) -> String {
    raw.replace('|', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the leading run of name-like tokens, then tidy the result.
///
/// Tokens are NFKC-normalised first, so full-width digits and letters are
/// classified like their ASCII forms. A bare honorific ("BU") on its own is
/// not a name and yields `""`. Applying the cleaner to its own output
/// changes nothing.
pub fn clean_person_name(raw: &str) -> String {
    let tokens: Vec<String> = raw
        .replace('|', " ")
        .split_whitespace()
        .flat_map(|token| {
            let folded: String = token.nfkc().collect();
            folded.split_whitespace().map(str::to_owned).collect::<Vec<_>>()
        })
        .collect();
    let kept: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .take_while(|token| classify_token(&bare_form(token)) == TokenClass::Name)
        .collect();
    if matches!(kept.as_slice(), [only] if is_lone_bu(only)) {
        return String::new();
    }

    let name = fix_name(&kept.join(" "));
    if is_lone_bu(&name) {
        return String::new();
    }
    name
}

/// Trailing punctuation, recognised OCR confusions, glued product codes,
/// and casing.
pub fn fix_name(name: &str) -> String {
    let mut current = name.trim().to_string();
    loop {
        let trimmed = current.trim_end_matches([']', '.', ',', ';', ':', '_']).trim_end();
        let corrected = IIS_RE.replace_all(trimmed, "IIS");
        let stripped = strip_product_suffix(&corrected);
        if stripped == current {
            break;
        }
        current = stripped;
    }

    if NAME_LIKE_RE.is_match(&current) {
        title_case(&current)
    } else {
        current
    }
}

/// Drop a product code at the end of `name` when what remains still reads
/// as a name.
///
/// The code may follow a space, `-` or `_`, or be glued onto the last word.
/// Glued codes must carry a digit ("SANTOSOPM31") or a two-letter product
/// prefix on a stem of at least three letters ("SANTOSOPMDA"); a bare `P`
/// glued onto letters is part of the name ("SAPUTRA").
fn strip_product_suffix(name: &str) -> String {
    let Some(found) = PRODUCT_SUFFIX_RE.find(name) else {
        return name.to_string();
    };
    let prefix = &name[..found.start()];
    let code = found.as_str();

    let separated = prefix.ends_with(is_code_separator);
    if !separated && prefix.ends_with(char::is_alphabetic) && !is_glued_code(prefix, code) {
        return name.to_string();
    }

    let remainder = prefix.trim_end_matches(is_code_separator).trim();
    let name_like = !remainder.is_empty()
        && !is_lone_bu(remainder)
        && remainder
            .split_whitespace()
            .all(|token| classify_token(&bare_form(token)) == TokenClass::Name);
    if name_like {
        remainder.to_string()
    } else {
        name.to_string()
    }
}

fn is_code_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '_'
}

/// Two-letter product prefixes; `P` alone is too common inside names.
const GLUED_PREFIXES: &[&str] = &["PM", "SL", "TP", "PL", "RM", "KM"];

fn is_glued_code(prefix: &str, code: &str) -> bool {
    if code.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    let stem = prefix.rsplit(is_code_separator).next().unwrap_or_default();
    code.len() >= 4
        && stem.chars().count() >= 3
        && GLUED_PREFIXES
            .iter()
            .any(|p| code.get(..2).is_some_and(|head| head.eq_ignore_ascii_case(p)))
}

/// Capitalise the first letter of each word and lowercase the rest.
///
/// Words start after whitespace or `-`; apostrophes continue a word.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            if c != '\'' && c != '’' {
                at_word_start = true;
            }
        }
    }
    out
}
