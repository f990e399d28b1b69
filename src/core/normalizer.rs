use crate::domain::model::{CanonicalIdentifier, Scheme};
use crate::utils::error::{LookupError, Result};

/// Both canonical forms of one user-entered number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub body: String,
    pub enterprise: CanonicalIdentifier,
    pub vat: CanonicalIdentifier,
}

/// 將使用者輸入轉成 10 位數字本體
///
/// Whitespace is dropped, a leading two-letter country prefix is stripped and the usual
/// `.`/`-` separators are removed. No checksum is verified.
pub fn normalize_body(input: &str) -> Result<String> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.is_empty() {
        return Err(LookupError::EmptyInput);
    }

    let without_prefix = match compact.get(..2) {
        Some(prefix) if prefix.chars().all(|c| c.is_ascii_alphabetic()) => &compact[2..],
        _ => compact.as_str(),
    };

    let digits: String = without_prefix
        .chars()
        .filter(|c| !matches!(c, '.' | '-'))
        .collect();

    if digits.len() != 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LookupError::InvalidFormat {
            input: input.trim().to_string(),
        });
    }

    Ok(digits)
}

pub fn normalize(input: &str) -> Result<NormalizedInput> {
    let body = normalize_body(input)?;

    Ok(NormalizedInput {
        enterprise: CanonicalIdentifier::new(Scheme::Enterprise, &body)?,
        vat: CanonicalIdentifier::new(Scheme::Vat, &body)?,
        body,
    })
}
