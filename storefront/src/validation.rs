//! Field validation rules
//!
//! Every rule is a pure predicate over a single candidate value. A failing
//! rule yields a [`FieldViolation`] naming the field and the reason; entity
//! validation collects all violations into [`ValidationErrors`] so a write can
//! be rejected before it reaches the store.
//!
//! ```rust
//! use storefront::validation;
//!
//! assert!(validation::name("Laptop").is_ok());
//! assert!(validation::name("laptop").is_err());
//! assert!(validation::rating(3.0).is_ok());
//! assert!(validation::rating(6.0).is_err());
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use url::{Host, Url};

/// Inclusive bounds for product ratings
pub const RATING_RANGE: (f64, f64) = (1.0, 5.0);

/// Inclusive bounds for stocked quantities
pub const QUANTITY_RANGE: (f64, f64) = (1.0, 1000.0);

/// Inclusive bounds for prices
pub const PRICE_RANGE: (f64, f64) = (0.01, 1000.0);

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Roles a user may hold
pub const ROLES: &[&str] = &["user", "admin"];

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]{2,}$").expect("email pattern is valid")
});

/// A single failed field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field, as it appears on the wire
    pub field: &'static str,
    /// Human-readable reason
    pub reason: String,
}

impl FieldViolation {
    /// Create a new violation
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// All violations found while validating one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a rule; passing rules are ignored
    pub fn record(&mut self, outcome: Result<(), FieldViolation>) {
        if let Err(violation) = outcome {
            self.0.push(violation);
        }
    }

    /// Add a violation directly
    pub fn push(&mut self, violation: FieldViolation) {
        self.0.push(violation);
    }

    /// Merge another collector into this one
    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Recorded violations
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Whether a given field failed
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<FieldViolation>> for ValidationErrors {
    fn from(violations: Vec<FieldViolation>) -> Self {
        Self(violations)
    }
}

impl From<FieldViolation> for ValidationErrors {
    fn from(violation: FieldViolation) -> Self {
        Self(vec![violation])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Product name: non-empty, at least two characters, not entirely lowercase
pub fn name(value: &str) -> Result<(), FieldViolation> {
    if value.is_empty() {
        return Err(FieldViolation::new("name", "must not be empty"));
    }
    if value.chars().count() < 2 {
        return Err(FieldViolation::new("name", "must be at least 2 characters"));
    }
    // Strings without cased characters count as lowercase
    if value == value.to_lowercase() {
        return Err(FieldViolation::new("name", "must not be entirely lowercase"));
    }
    Ok(())
}

/// Well-formed http, https or ftp URL whose host has a top-level domain
///
/// A missing scheme is read as `http://`.
pub fn avatar_url(value: &str) -> Result<(), FieldViolation> {
    if is_url(value.trim()) {
        Ok(())
    } else {
        Err(FieldViolation::new("avatarUrl", "must be a valid URL"))
    }
}

/// Integer rating in [1, 5]
pub fn rating(value: f64) -> Result<(), FieldViolation> {
    integer_in_range("rating", value, RATING_RANGE)
}

/// Integer quantity in [1, 1000]
pub fn quantity(value: f64) -> Result<(), FieldViolation> {
    integer_in_range("quantity", value, QUANTITY_RANGE)
}

/// Decimal price in [0.01, 1000.00]
pub fn price(value: f64) -> Result<(), FieldViolation> {
    let (min, max) = PRICE_RANGE;
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(FieldViolation::new(
            "price",
            format!("must be a decimal between {:.2} and {:.2}", min, max),
        ))
    }
}

/// Free text that must contain something besides whitespace
pub fn required_text(field: &'static str, value: &str) -> Result<(), FieldViolation> {
    if value.trim().is_empty() {
        Err(FieldViolation::new(field, "is required"))
    } else {
        Ok(())
    }
}

/// Any finite number
pub fn finite(field: &'static str, value: f64) -> Result<(), FieldViolation> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FieldViolation::new(field, "must be a number"))
    }
}

/// Email address
pub fn email(value: &str) -> Result<(), FieldViolation> {
    if EMAIL_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(FieldViolation::new("email", "must be a valid email"))
    }
}

/// Password strength: minimum length plus at least one letter and one digit
pub fn password(value: &str) -> Result<(), FieldViolation> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FieldViolation::new(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    let has_letter = value.chars().any(|c| c.is_alphabetic());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(FieldViolation::new(
            "password",
            "must contain at least one letter and one number",
        ));
    }
    Ok(())
}

/// One of the known user roles
pub fn role(value: &str) -> Result<(), FieldViolation> {
    if ROLES.contains(&value) {
        Ok(())
    } else {
        Err(FieldViolation::new(
            "role",
            format!("must be one of: {}", ROLES.join(", ")),
        ))
    }
}

fn integer_in_range(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), FieldViolation> {
    if value.is_finite() && value.fract() == 0.0 && value >= min && value <= max {
        Ok(())
    } else {
        Err(FieldViolation::new(
            field,
            format!("must be an integer between {} and {}", min, max),
        ))
    }
}

fn is_url(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    let candidate: Cow<'_, str> = if value.contains("://") {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("http://{}", value))
    };

    let Ok(parsed) = Url::parse(&candidate) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https" | "ftp") {
        return false;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => has_top_level_domain(domain),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}

fn has_top_level_domain(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.');
    match domain.rsplit_once('.') {
        Some((rest, tld)) => {
            !rest.is_empty()
                && !rest.split('.').any(str::is_empty)
                && (tld.starts_with("xn--")
                    || (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())))
        }
        None => false,
    }
}
