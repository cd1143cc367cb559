//! Keyword specs: which call expressions carry a message.
//!
//! A spec has the form `name[.prop][:keyArgPos[,pluralArgPos]]`:
//!
//! - `t` matches `t("...")`
//! - `this.t` matches `this.t("...")`
//! - `i18n.t` matches `i18n.t("...")`
//! - `tc:0,1` matches `tc("...", n)` and reads plurality from argument 1

use std::{fmt, str::FromStr};

use super::ExtractError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    /// Dotted callee text, e.g. `t`, `this.t`, `$i18n.t`.
    pub callee: String,
    /// Position of the argument holding the message text.
    pub key_arg: usize,
    /// Position of the argument deciding plurality, if any.
    pub plural_arg: Option<usize>,
}

impl Keyword {
    pub fn new(callee: impl Into<String>) -> Self {
        Self {
            callee: callee.into(),
            key_arg: 0,
            plural_arg: None,
        }
    }

    pub fn matches(&self, callee: &str) -> bool {
        self.callee == callee
    }
}

fn parse_position(spec: &str, raw: &str) -> Result<usize, ExtractError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ExtractError::InvalidKeyword {
            spec: spec.to_string(),
            reason: format!("argument position {:?} is not a number", raw),
        })
}

impl FromStr for Keyword {
    type Err = ExtractError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (callee, positions) = match spec.split_once(':') {
            Some((callee, positions)) => (callee.trim(), Some(positions)),
            None => (spec.trim(), None),
        };

        let valid_callee = !callee.is_empty()
            && callee.split('.').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            });
        if !valid_callee {
            return Err(ExtractError::InvalidKeyword {
                spec: spec.to_string(),
                reason: "callee must be `name`, `this.prop` or `object.prop`".to_string(),
            });
        }

        let mut keyword = Keyword::new(callee);
        if let Some(positions) = positions {
            let mut parts = positions.split(',');
            if let Some(key_arg) = parts.next() {
                keyword.key_arg = parse_position(spec, key_arg)?;
            }
            if let Some(plural_arg) = parts.next() {
                keyword.plural_arg = Some(parse_position(spec, plural_arg)?);
            }
            if parts.next().is_some() {
                return Err(ExtractError::InvalidKeyword {
                    spec: spec.to_string(),
                    reason: "expected at most two argument positions".to_string(),
                });
            }
        }
        Ok(keyword)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.callee, self.key_arg)?;
        if let Some(plural_arg) = self.plural_arg {
            write!(f, ",{}", plural_arg)?;
        }
        Ok(())
    }
}
