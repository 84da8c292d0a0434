use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::UrnError;

// ---------------------------------------------------------------------------
// Urn
// ---------------------------------------------------------------------------

/// A six-segment structured resource name:
/// `urn:<domain>:<partition>:<tenant>:<owner>:<class>:<id>`.
///
/// `class` and `id` are required; the other segments are optional and
/// serialize as empty strings. The canonical string form produced by
/// `Display` is the exact inverse of [`Urn::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Urn {
    pub id: String,
    pub domain: String,
    pub partition: Option<String>,
    pub tenant: Option<String>,
    pub owner: Option<String>,
    pub class: String,
}

impl Urn {
    /// Build a URN from its required fields, with an empty domain.
    ///
    /// # Errors
    ///
    /// [`UrnError::MissingClass`] / [`UrnError::MissingId`] when the
    /// respective field is empty.
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Result<Self, UrnError> {
        let id = id.into();
        let class = class.into();
        if class.is_empty() {
            return Err(UrnError::MissingClass);
        }
        if id.is_empty() {
            return Err(UrnError::MissingId);
        }

        Ok(Self {
            id,
            domain: String::new(),
            partition: None,
            tenant: None,
            owner: None,
            class,
        })
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the owner from another resource: the owner segment becomes that
    /// resource's own identifier.
    pub fn with_owner_of(mut self, owner: &dyn UrnGenerator) -> Self {
        self.owner = Some(owner.urn_id());
        self
    }

    /// Whether `value` matches the six-segment URN grammar.
    ///
    /// This is a shape check only: the class segment may be empty here even
    /// though [`Urn::parse`] rejects it.
    pub fn is_urn(value: &str) -> bool {
        let Some(rest) = value.strip_prefix("urn:") else {
            return false;
        };

        let segments: Vec<&str> = rest.splitn(6, ':').collect();
        if segments.len() != 6 {
            return false;
        }

        let id = segments[5];
        !id.is_empty() && !id.starts_with(char::is_whitespace)
    }

    /// Parse a canonical URN string. An empty domain segment stays empty;
    /// see [`Urn::parse_with_default_domain`] to substitute a default.
    ///
    /// # Errors
    ///
    /// [`UrnError::InvalidUrn`] when the grammar does not match,
    /// [`UrnError::MissingClass`] when the class segment is empty.
    pub fn parse(value: &str) -> Result<Self, UrnError> {
        Self::parse_with_default_domain(value, "")
    }

    /// Parse a canonical URN string, substituting `default_domain` for an
    /// empty domain segment.
    ///
    /// The five leading segments may not contain colons; the identifier is
    /// the remainder of the string and may.
    pub fn parse_with_default_domain(value: &str, default_domain: &str) -> Result<Self, UrnError> {
        if !Self::is_urn(value) {
            return Err(UrnError::InvalidUrn(value.to_string()));
        }

        // is_urn guarantees the prefix and the segment count.
        let rest = value.strip_prefix("urn:").unwrap_or(value);
        let segments: Vec<&str> = rest.splitn(6, ':').collect();
        let [domain, partition, tenant, owner, class, id] = segments[..] else {
            return Err(UrnError::InvalidUrn(value.to_string()));
        };

        if class.is_empty() {
            return Err(UrnError::MissingClass);
        }

        Ok(Self {
            id: id.to_string(),
            domain: if domain.is_empty() {
                default_domain.to_string()
            } else {
                domain.to_string()
            },
            partition: optional(partition),
            tenant: optional(tenant),
            owner: optional(owner),
            class: class.to_string(),
        })
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "urn:{}:{}:{}:{}:{}:{}",
            self.domain,
            self.partition.as_deref().unwrap_or(""),
            self.tenant.as_deref().unwrap_or(""),
            self.owner.as_deref().unwrap_or(""),
            self.class,
            self.id
        )
    }
}

impl FromStr for Urn {
    type Err = UrnError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

fn optional(segment: &str) -> Option<String> {
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

// ---------------------------------------------------------------------------
// UrnGenerator
// ---------------------------------------------------------------------------

/// The "produce a URN describing myself" capability.
///
/// Types opt in by implementing [`urn_id`]; everything else has a default.
/// The URN class defaults to the snake_case of the implementing type's short
/// name and can be overridden by reimplementing [`urn_class`].
///
/// [`urn_id`]: UrnGenerator::urn_id
/// [`urn_class`]: UrnGenerator::urn_class
pub trait UrnGenerator {
    /// The resource identifier.
    fn urn_id(&self) -> String;

    /// The resource partition, if applicable.
    fn urn_partition(&self) -> Option<String> {
        None
    }

    /// The resource tenant, if applicable.
    fn urn_tenant(&self) -> Option<String> {
        None
    }

    /// The resource owner identifier, if applicable.
    fn urn_owner(&self) -> Option<String> {
        None
    }

    /// The URN class name registered for this type.
    fn urn_class() -> String
    where
        Self: Sized,
    {
        derive_urn_class(std::any::type_name::<Self>())
    }

    /// Assemble the URN for this resource. The domain is left empty for the
    /// caller to set.
    fn urn(&self) -> Urn
    where
        Self: Sized,
    {
        Urn {
            id: self.urn_id(),
            domain: String::new(),
            partition: self.urn_partition(),
            tenant: self.urn_tenant(),
            owner: self.urn_owner(),
            class: Self::urn_class(),
        }
    }
}

/// Derive a URN class name from a Rust type name: module path and generic
/// parameters are stripped, then upper-camel-case word boundaries become
/// underscores (`OrderLine` → `order_line`).
pub fn derive_urn_class(type_name: &str) -> String {
    let short = type_name.split('<').next().unwrap_or(type_name);
    let short = short.rsplit("::").next().unwrap_or(short);

    let mut out = String::with_capacity(short.len() + 4);
    let mut prev_lower = false;
    for ch in short.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = ch.is_ascii_lowercase();
        out.push(ch.to_ascii_lowercase());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests (unit)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_from_type_names() {
        assert_eq!(derive_urn_class("Book"), "book");
        assert_eq!(derive_urn_class("OrderLine"), "order_line");
        assert_eq!(derive_urn_class("crate::model::OrderLine"), "order_line");
        assert_eq!(derive_urn_class("HTTPServer"), "httpserver");
        assert_eq!(derive_urn_class("Wrapper<inner::Thing>"), "wrapper");
    }

    #[test]
    fn id_may_contain_colons() {
        let urn = Urn::parse("urn:::::path:a:b:c").expect("valid urn");
        assert_eq!(urn.class, "path");
        assert_eq!(urn.id, "a:b:c");
    }

    #[test]
    fn whitespace_led_id_is_rejected() {
        assert!(!Urn::is_urn("urn:::::klass: padded"));
        assert!(Urn::parse("urn:::::klass: padded").is_err());
    }
}
