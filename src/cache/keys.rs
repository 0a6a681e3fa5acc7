//! Cache key derivation
//!
//! A key is the operation tag followed by every response-affecting parameter
//! in a fixed order: `<tag>:<name>=<value>:<name>=<value>`. Names and values
//! are percent-encoded, so `:` and `=` only ever appear as delimiters and two
//! different parameter lists cannot produce the same key.

use gifhost::Order;

/// Separator between the tag and each parameter
pub const DELIMITER: char = ':';

/// Logical operations whose responses are cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    UserProfile,
    UserGifs,
    Search,
    Trending,
}

impl Operation {
    /// Namespace tag that prefixes every key of this operation
    pub fn tag(&self) -> &'static str {
        match self {
            Operation::UserProfile => "user_profile",
            Operation::UserGifs => "user_gifs",
            Operation::Search => "search",
            Operation::Trending => "trending",
        }
    }

    pub fn all() -> [Operation; 4] {
        [
            Operation::UserProfile,
            Operation::UserGifs,
            Operation::Search,
            Operation::Trending,
        ]
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Build a key from an operation and its ordered parameters
pub fn cache_key(operation: Operation, params: &[(&str, String)]) -> String {
    let mut key = String::from(operation.tag());
    for (name, value) in params {
        key.push(DELIMITER);
        key.push_str(&urlencoding::encode(name));
        key.push('=');
        key.push_str(&urlencoding::encode(value));
    }
    key
}

/// Usernames are case-insensitive upstream
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_string()
}

pub fn user_profile(username: &str) -> String {
    cache_key(
        Operation::UserProfile,
        &[("username", normalize_username(username))],
    )
}

pub fn user_gifs(username: &str, page: u32, count: u32, order: Order) -> String {
    cache_key(
        Operation::UserGifs,
        &[
            ("username", normalize_username(username)),
            ("page", page.to_string()),
            ("count", count.to_string()),
            ("order", order.as_str().to_string()),
        ],
    )
}

pub fn search(query: &str, page: u32, count: u32, order: Order) -> String {
    cache_key(
        Operation::Search,
        &[
            ("q", normalize_query(query)),
            ("page", page.to_string()),
            ("count", count.to_string()),
            ("order", order.as_str().to_string()),
        ],
    )
}

pub fn trending() -> String {
    cache_key(Operation::Trending, &[("type", "gifs".to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(user_profile("CatLover"), "user_profile:username=catlover");
        assert_eq!(
            search("cats", 2, 40, Order::Top),
            "search:q=cats:page=2:count=40:order=top"
        );
        assert_eq!(trending(), "trending:type=gifs");
    }

    #[test]
    fn test_identical_requests_share_a_key() {
        assert_eq!(
            search("  cats ", 1, 80, Order::Trending),
            search("cats", 1, 80, Order::Trending)
        );
        assert_eq!(
            user_gifs(" CatLover", 3, 80, Order::Latest),
            user_gifs("catlover", 3, 80, Order::Latest)
        );
    }

    #[test]
    fn test_each_parameter_changes_the_key() {
        let base = search("cats", 1, 80, Order::Trending);
        assert_ne!(base, search("dogs", 1, 80, Order::Trending));
        assert_ne!(base, search("cats", 2, 80, Order::Trending));
        assert_ne!(base, search("cats", 1, 40, Order::Trending));
        assert_ne!(base, search("cats", 1, 80, Order::Latest));

        let base = user_gifs("catlover", 1, 80, Order::Latest);
        assert_ne!(base, user_gifs("doglover", 1, 80, Order::Latest));
        assert_ne!(base, user_gifs("catlover", 1, 80, Order::Top28));
    }

    #[test]
    fn test_operations_never_collide() {
        // Same parameter values under different tags
        assert_ne!(
            search("catlover", 1, 80, Order::Latest),
            user_gifs("catlover", 1, 80, Order::Latest)
        );
        let tags: std::collections::HashSet<&str> =
            Operation::all().iter().map(Operation::tag).collect();
        assert_eq!(tags.len(), Operation::all().len());
    }

    #[test]
    fn test_delimiters_in_values_are_escaped() {
        let injected = search("cats:page=2", 1, 80, Order::Trending);
        let plain = search("cats", 2, 80, Order::Trending);
        assert_ne!(injected, plain);
        assert_eq!(
            injected,
            "search:q=cats%3Apage%3D2:page=1:count=80:order=trending"
        );

        let key = cache_key(Operation::UserProfile, &[("a=b", "c:d".to_string())]);
        assert_eq!(key.matches(DELIMITER).count(), 1);
        assert_eq!(key.matches('=').count(), 1);
    }

    #[test]
    fn test_unicode_queries() {
        let key = search("été", 1, 80, Order::Top);
        assert!(key.is_ascii());
        assert_ne!(key, search("ete", 1, 80, Order::Top));
    }
}
