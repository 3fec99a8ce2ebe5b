#![forbid(unsafe_code)]

pub mod codes;
pub mod modules;
pub mod projection;
pub mod tasks;
pub mod templates;

use orgroles_kernel_contracts::catalog::LocalizedText;
use orgroles_kernel_contracts::ContractViolation;
use serde::Serialize;

/// Compiled-in bilingual text used by the static registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaticText {
    pub fr: &'static str,
    pub en: &'static str,
}

impl StaticText {
    pub const fn new(fr: &'static str, en: &'static str) -> Self {
        Self { fr, en }
    }

    pub fn to_localized(&self) -> Result<LocalizedText, ContractViolation> {
        LocalizedText::from_pairs([("fr", self.fr), ("en", self.en)])
    }
}
