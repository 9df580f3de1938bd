//! Cache key construction.
//!
//! Every key is `namespace:discriminator`. Namespaces group the keys that a
//! mutation invalidates together; the discriminator tells apart the responses
//! inside one namespace.

use std::fmt;

use url::form_urlencoded;

/// Separator between namespace and discriminator.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Families of cached responses that are invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// A single post, discriminated by post id.
    Post,
    /// Post listings, discriminated by the normalized query.
    Posts,
    /// A user profile, discriminated by user id.
    User,
    /// Reviews attached to a post, discriminated by post id.
    Reviews,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Post,
        Namespace::Posts,
        Namespace::User,
        Namespace::Reviews,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Post => "post",
            Namespace::Posts => "posts",
            Namespace::User => "user",
            Namespace::Reviews => "reviews",
        }
    }

    /// Prefix shared by every key in this namespace, separator included.
    pub fn prefix(self) -> String {
        format!("{}{}", self.as_str(), NAMESPACE_SEPARATOR)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-qualified cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace segment of the key (everything before the first separator).
    pub fn namespace(&self) -> &str {
        self.0
            .split_once(NAMESPACE_SEPARATOR)
            .map_or(self.0.as_str(), |(namespace, _)| namespace)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the key for `discriminator` inside `namespace`.
pub fn make_key(namespace: Namespace, discriminator: &str) -> CacheKey {
    CacheKey(format!(
        "{}{}{}",
        namespace.as_str(),
        NAMESPACE_SEPARATOR,
        discriminator
    ))
}

/// Canonical form of a raw query string.
///
/// Pairs are decoded, sorted by name then value, and re-encoded, so two
/// queries naming the same parameters in a different order produce the same
/// discriminator. Empty values are kept (`?q=` differs from no `q`).
pub fn canonical_query(raw: &str) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(raw.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    pairs.sort();

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Discriminator built from explicit fields, in the order given.
///
/// Callers pass fields in a fixed order; `None` values are encoded as `-`
/// so that an absent field never collides with a present one.
pub fn field_discriminator<'a>(
    fields: impl IntoIterator<Item = (&'a str, Option<String>)>,
) -> String {
    fields
        .into_iter()
        .map(|(name, value)| format!("{name}={}", value.as_deref().unwrap_or("-")))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_namespace_and_discriminator() {
        let key = make_key(Namespace::Post, "42");
        assert_eq!(key.as_str(), "post:42");
        assert_eq!(key.namespace(), "post");
    }

    #[test]
    fn namespace_prefixes_do_not_overlap() {
        let post = make_key(Namespace::Post, "1");
        let posts = make_key(Namespace::Posts, "list");
        assert!(post.as_str().starts_with(&Namespace::Post.prefix()));
        assert!(!posts.as_str().starts_with(&Namespace::Post.prefix()));
    }

    #[test]
    fn query_order_does_not_change_key() {
        assert_eq!(
            canonical_query("sort=likes&page=2&limit=10"),
            canonical_query("limit=10&page=2&sort=likes")
        );
    }

    #[test]
    fn different_queries_produce_different_keys() {
        assert_ne!(canonical_query("page=1"), canonical_query("page=2"));
        assert_ne!(canonical_query("q="), canonical_query(""));
    }

    #[test]
    fn canonical_query_normalizes_encoding() {
        assert_eq!(canonical_query("q=a%20b"), canonical_query("q=a+b"));
    }

    #[test]
    fn field_discriminator_marks_absent_values() {
        let with_author = field_discriminator([
            ("page", Some("1".to_string())),
            ("author", Some("x".to_string())),
        ]);
        let without_author =
            field_discriminator([("page", Some("1".to_string())), ("author", None)]);
        assert_eq!(with_author, "page=1&author=x");
        assert_eq!(without_author, "page=1&author=-");
    }
}
