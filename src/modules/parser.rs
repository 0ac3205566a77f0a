use bigdecimal::{BigDecimal, Zero};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::OnceLock};

// how a vendor writes its price column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceFormat {
    // "$19.99": symbol and whitespace removed, the rest must be a number
    StripSymbol { symbol: String },

    // "Now £24.00": the first integer or decimal in the text
    FirstNumber,
}

// what happens to a row whose price cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnPriceFailure {
    Abort,
    ZeroFill,
    Skip,
}

impl FromStr for OnPriceFailure {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_lowercase().as_str() {
            "abort" => Ok(OnPriceFailure::Abort),
            "zero" | "zero_fill" | "zerofill" => Ok(OnPriceFailure::ZeroFill),
            "skip" => Ok(OnPriceFailure::Skip),
            other => Err(format!(
                "`{}` is not a price failure policy, expected abort, zero or skip",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceParseOutcome {
    Parsed(BigDecimal),
    Failed(String),
}

impl PriceParseOutcome {
    // Ok(None) skips the row, Err aborts the run with the reason
    pub fn resolve(self, policy: OnPriceFailure) -> Result<Option<(BigDecimal, bool)>, String> {
        match (self, policy) {
            (PriceParseOutcome::Parsed(value), _) => Ok(Some((value, false))),
            (PriceParseOutcome::Failed(reason), OnPriceFailure::Abort) => Err(reason),
            (PriceParseOutcome::Failed(_), OnPriceFailure::ZeroFill) => {
                Ok(Some((BigDecimal::zero(), true)))
            }
            (PriceParseOutcome::Failed(_), OnPriceFailure::Skip) => Ok(None),
        }
    }
}

fn first_number() -> &'static Regex {
    static FIRST_NUMBER: OnceLock<Regex> = OnceLock::new();
    // ascii digits only, `\d` would also match digits BigDecimal cannot read
    FIRST_NUMBER
        .get_or_init(|| Regex::new(r"[0-9]+(\.[0-9]+)?").expect("price pattern is valid"))
}

pub fn parse_price(raw: &str, format: &PriceFormat) -> PriceParseOutcome {
    match format {
        PriceFormat::StripSymbol { symbol } => {
            let stripped = if symbol.is_empty() {
                raw.trim().to_string()
            } else {
                raw.replace(symbol.as_str(), "").trim().to_string()
            };
            match BigDecimal::from_str(&stripped) {
                Ok(value) => PriceParseOutcome::Parsed(value),
                Err(_) => PriceParseOutcome::Failed(format!("`{}` is not a number", raw)),
            }
        }
        PriceFormat::FirstNumber => match first_number().find(raw) {
            // the pattern only matches digits with an optional fraction
            Some(found) => match BigDecimal::from_str(found.as_str()) {
                Ok(value) => PriceParseOutcome::Parsed(value),
                Err(error) => PriceParseOutcome::Failed(error.to_string()),
            },
            None => PriceParseOutcome::Failed(format!("no number in `{}`", raw)),
        },
    }
}

// "Black/White/Red" -> "Black", "/Black" -> ""
// only an empty column falls back
pub fn primary_color(raw: &str, fallback: Option<&str>) -> Option<String> {
    if raw.is_empty() {
        return fallback.map(str::to_string);
    }
    Some(raw.split('/').next().unwrap_or_default().trim().to_string())
}
