//! Dialect-independent representation of a message argument.
//!
//! Each dialect analyzes its argument/attribute expression into a
//! `ValueSource` tree, which is then flattened into candidate strings:
//!
//! ```ignore
//! t("home")            → Literal("home")                   → ["home"]
//! t("a" + "b")         → Concat(Literal("a"), Literal("b")) → ["ab"]
//! t(c ? "x" : "y")     → Conditional { .. }                 → ["x", "y"]
//! t(name)              → Unresolvable(Identifier("name"))   → Err
//! ```
//!
//! A parallel tri-state (`Numeric`) tells whether an argument certainly is a
//! number, which decides plurality for keywords with a plural argument.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    /// A static string.
    Literal(String),

    /// String concatenation: every left candidate followed by every right one.
    Concat(Box<ValueSource>, Box<ValueSource>),

    /// A two-way conditional: candidates of both branches.
    Conditional {
        consequent: Box<ValueSource>,
        alternate: Box<ValueSource>,
    },

    /// Anything that is not a literal.
    Unresolvable(UnresolvableReason),
}

/// Why an expression has no static value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvableReason {
    /// A variable: `t(name)`, `__($name)`.
    Identifier(String),
    /// A property access: `t(obj.key)`.
    MemberAccess,
    /// A template or string with interpolations: `` t(`hi ${x}`) ``, `__("hi $x")`.
    Interpolation,
    /// A function or method call: `t(getKey())`.
    Call,
    /// Escapes that spell out bytes which are not UTF-8: `__("\xff")`.
    InvalidUtf8,
    /// Any other expression kind.
    UnsupportedExpression { expr_type: String },
}

impl fmt::Display for UnresolvableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvableReason::Identifier(name) => write!(f, "variable \"{}\"", name),
            UnresolvableReason::MemberAccess => write!(f, "member access"),
            UnresolvableReason::Interpolation => write!(f, "string interpolation"),
            UnresolvableReason::Call => write!(f, "function call"),
            UnresolvableReason::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            UnresolvableReason::UnsupportedExpression { expr_type } => {
                write!(f, "unsupported expression: {}", expr_type)
            }
        }
    }
}

impl ValueSource {
    pub fn literal(value: impl Into<String>) -> Self {
        ValueSource::Literal(value.into())
    }

    pub fn concat(left: ValueSource, right: ValueSource) -> Self {
        ValueSource::Concat(Box::new(left), Box::new(right))
    }

    pub fn conditional(consequent: ValueSource, alternate: ValueSource) -> Self {
        ValueSource::Conditional {
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    pub fn unsupported(expr_type: impl Into<String>) -> Self {
        ValueSource::Unresolvable(UnresolvableReason::UnsupportedExpression {
            expr_type: expr_type.into(),
        })
    }

    /// Flatten into every string the expression can evaluate to.
    ///
    /// Candidates keep first-seen order and are deduplicated.
    pub fn resolve(&self) -> Result<Vec<String>, UnresolvableReason> {
        let mut candidates = match self {
            ValueSource::Literal(s) => vec![s.clone()],

            ValueSource::Concat(left, right) => {
                let left = left.resolve()?;
                let right = right.resolve()?;
                left.iter()
                    .flat_map(|l| right.iter().map(move |r| format!("{}{}", l, r)))
                    .collect()
            }

            ValueSource::Conditional {
                consequent,
                alternate,
            } => {
                let mut values = consequent.resolve()?;
                values.extend(alternate.resolve()?);
                values
            }

            ValueSource::Unresolvable(reason) => return Err(reason.clone()),
        };

        let mut seen = std::collections::HashSet::new();
        candidates.retain(|c| seen.insert(c.clone()));
        Ok(candidates)
    }
}

/// Whether an expression evaluates to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    Certain,
    Never,
    Unknown,
}

impl Numeric {
    /// `a + b` where `+` also concatenates strings.
    pub fn plus(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Certain, Numeric::Certain) => Numeric::Certain,
            (Numeric::Never, _) | (_, Numeric::Never) => Numeric::Never,
            _ => Numeric::Unknown,
        }
    }

    /// `c ? a : b`
    pub fn either(self, other: Numeric) -> Numeric {
        if self == other { self } else { Numeric::Unknown }
    }

    /// Unknown counts as plural.
    pub fn is_plural(self) -> bool {
        self != Numeric::Never
    }
}
