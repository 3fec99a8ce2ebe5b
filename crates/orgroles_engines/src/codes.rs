#![forbid(unsafe_code)]

use orgroles_kernel_contracts::catalog::{
    CatalogCode, LocalizedText, CATALOG_CODE_MAX_LEN, LOCALIZED_TEXT_MAX_LEN,
};
use orgroles_kernel_contracts::ContractViolation;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgRolesConfig {
    /// Language entries tried, in order, when deriving a code from localized text.
    pub code_source_langs: &'static [&'static str],
    pub code_max_len: usize,
    pub text_max_len: usize,
}

impl OrgRolesConfig {
    pub fn mvp_v1() -> Self {
        Self {
            code_source_langs: &["fr", "en"],
            code_max_len: CATALOG_CODE_MAX_LEN,
            text_max_len: LOCALIZED_TEXT_MAX_LEN,
        }
    }
}

/// Lowercase, strip diacritics, collapse runs of non-alphanumerics into one `_`, trim `_`.
pub fn slugify(input: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if out.len() > max_len {
        out.truncate(max_len);
        while out.ends_with('_') {
            out.pop();
        }
    }
    out
}

pub fn derive_code(
    source: &LocalizedText,
    config: &OrgRolesConfig,
) -> Result<CatalogCode, ContractViolation> {
    let text = source
        .first_available(config.code_source_langs)
        .ok_or(ContractViolation::InvalidValue {
            field: "catalog_code",
            reason: "cannot derive a code from empty localized text",
        })?;
    let slug = slugify(text, config.code_max_len);
    if slug.is_empty() {
        return Err(ContractViolation::InvalidValue {
            field: "catalog_code",
            reason: "derived code is empty; supply an explicit code",
        });
    }
    CatalogCode::new(slug)
}

/// First of `base`, `base_2`, `base_3`, ... for which `taken` is false.
pub fn disambiguate(
    base: &CatalogCode,
    config: &OrgRolesConfig,
    taken: impl Fn(&str) -> bool,
) -> Result<CatalogCode, ContractViolation> {
    if !taken(base.as_str()) {
        return Ok(base.clone());
    }
    let mut n: u32 = 2;
    loop {
        let suffix = format!("_{n}");
        let room = config.code_max_len.saturating_sub(suffix.len());
        let mut stem = base.as_str().to_string();
        if stem.len() > room {
            stem.truncate(room);
            while stem.ends_with('_') {
                stem.pop();
            }
        }
        let candidate = format!("{stem}{suffix}");
        if !taken(&candidate) {
            return CatalogCode::new(candidate);
        }
        n = n.checked_add(1).ok_or(ContractViolation::InvalidValue {
            field: "catalog_code",
            reason: "disambiguation counter exhausted",
        })?;
    }
}
