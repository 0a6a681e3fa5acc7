//! Records returned by the upstream API

use crate::Error;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Public watch page prefix for a GIF id
const WATCH_URL_PREFIX: &str = "https://www.redgifs.com/watch/";

/// Sort order accepted by the search endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Trending,
    #[default]
    Latest,
    Top,
    Top28,
}

impl Order {
    /// Wire representation used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Trending => "trending",
            Order::Latest => "latest",
            Order::Top => "top",
            Order::Top28 => "top28",
        }
    }

    /// All supported orders
    pub fn all() -> [Order; 4] {
        [Order::Trending, Order::Latest, Order::Top, Order::Top28]
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trending" => Ok(Order::Trending),
            "latest" => Ok(Order::Latest),
            "top" => Ok(Order::Top),
            "top28" => Ok(Order::Top28),
            _ => Err(Error::InvalidOrder(s.to_string())),
        }
    }
}

/// Rendition URLs of a GIF
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaUrls {
    #[serde(default)]
    pub sd: Option<String>,
    #[serde(default)]
    pub hd: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub vthumbnail: Option<String>,
}

/// A single GIF as returned by the upstream API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gif {
    pub id: String,
    /// Unix timestamp in seconds
    #[serde(default)]
    pub create_date: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_audio: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: u64,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verified: bool,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub urls: MediaUrls,
    #[serde(default, rename = "userName")]
    pub username: Option<String>,
    #[serde(default)]
    pub avg_color: Option<String>,
}

impl Gif {
    /// Public watch page for this GIF
    pub fn web_url(&self) -> String {
        format!("{}{}", WATCH_URL_PREFIX, self.id)
    }

    /// Creation time, if the upstream supplied a valid one
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.create_date
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// A creator profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub followers: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub following: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gifs: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published_gifs: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// `/v1/users/{name}` answers either with the bare profile or wrapped in `user`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserEnvelope {
    Wrapped { user: User },
    Bare(User),
}

impl From<UserEnvelope> for User {
    fn from(envelope: UserEnvelope) -> Self {
        match envelope {
            UserEnvelope::Wrapped { user } => user,
            UserEnvelope::Bare(user) => user,
        }
    }
}

/// One page of a creator's GIFs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatorSearch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gifs: Vec<Gif>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<User>,
}

impl CreatorSearch {
    /// The creator whose GIFs were listed
    pub fn creator(&self) -> Option<&User> {
        self.users.first()
    }
}

/// One page of tag/keyword search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GifSearch {
    #[serde(default, alias = "searchText")]
    pub searched_for: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gifs: Vec<Gif>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingGifs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub gifs: Vec<Gif>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemporaryToken {
    pub token: String,
    #[serde(default)]
    pub session: Option<String>,
}

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Tags arrive either as plain strings or as `{"name": ...}` objects
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;

    raw.unwrap_or_default()
        .into_iter()
        .map(|value| match value {
            Value::String(tag) => Ok(tag),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| de::Error::custom("tag object without a name")),
            _ => Err(de::Error::custom(
                "expected string or object in tags array",
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_round_trip_names() {
        for order in Order::all() {
            assert_eq!(order.as_str().parse::<Order>().unwrap(), order);
        }
        assert_eq!(Order::Top28.to_string(), "top28");
    }

    #[test]
    fn test_order_parse_is_case_insensitive() {
        assert_eq!(" Latest ".parse::<Order>().unwrap(), Order::Latest);
        assert_eq!("TRENDING".parse::<Order>().unwrap(), Order::Trending);
        assert!("newest".parse::<Order>().is_err());
        assert!("".parse::<Order>().is_err());
    }

    #[test]
    fn test_gif_deserialize() {
        let json = r##"{
            "id": "happyfluffycat",
            "createDate": 1700000000,
            "hasAudio": true,
            "width": 1080,
            "height": 1920,
            "likes": 12,
            "tags": ["Cute", {"name": "Cats"}],
            "verified": false,
            "views": null,
            "duration": 8.5,
            "published": true,
            "urls": {"sd": "https://media.example/sd.mp4", "hd": "https://media.example/hd.mp4"},
            "userName": "catlover",
            "avgColor": "#1f1f1f"
        }"##;

        let gif: Gif = serde_json::from_str(json).unwrap();
        assert_eq!(gif.id, "happyfluffycat");
        assert_eq!(gif.tags, vec!["Cute".to_string(), "Cats".to_string()]);
        assert_eq!(gif.views, None);
        assert_eq!(gif.username.as_deref(), Some("catlover"));
        assert_eq!(gif.urls.sd.as_deref(), Some("https://media.example/sd.mp4"));
        assert!(gif.urls.poster.is_none());
        assert_eq!(
            gif.created_at().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
        assert_eq!(gif.web_url(), "https://www.redgifs.com/watch/happyfluffycat");
    }

    #[test]
    fn test_gif_deserialize_nulls() {
        let json = r#"{"id": "x", "likes": null, "tags": null, "urls": null, "width": null}"#;
        let gif: Gif = serde_json::from_str(json).unwrap();
        assert_eq!(gif.likes, 0);
        assert_eq!(gif.width, 0);
        assert!(gif.tags.is_empty());
        assert_eq!(gif.urls, MediaUrls::default());
        assert!(gif.created_at().is_none());
    }

    #[test]
    fn test_tags_reject_numbers() {
        let json = r#"{"id": "x", "tags": [1, 2]}"#;
        assert!(serde_json::from_str::<Gif>(json).is_err());
    }

    #[test]
    fn test_user_envelope_forms() {
        let bare = r#"{"username": "catlover", "followers": 10, "publishedGifs": 4}"#;
        let wrapped = r#"{"user": {"username": "catlover", "followers": 10, "publishedGifs": 4}}"#;

        let from_bare: User = serde_json::from_str::<UserEnvelope>(bare).unwrap().into();
        let from_wrapped: User = serde_json::from_str::<UserEnvelope>(wrapped).unwrap().into();

        assert_eq!(from_bare, from_wrapped);
        assert_eq!(from_bare.published_gifs, 4);
    }

    #[test]
    fn test_creator_search_creator() {
        let json = r#"{"page": 1, "pages": 3, "total": 200, "gifs": [], "users": [{"username": "catlover"}]}"#;
        let result: CreatorSearch = serde_json::from_str(json).unwrap();
        assert_eq!(result.creator().map(|u| u.username.as_str()), Some("catlover"));

        let empty: CreatorSearch = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(empty.creator().is_none());
    }

    #[test]
    fn test_gif_search_null_gifs() {
        let json = r#"{"searchText": "cats", "page": 2, "pages": 2, "total": 0, "gifs": null, "tags": ["cats"]}"#;
        let result: GifSearch = serde_json::from_str(json).unwrap();
        assert_eq!(result.searched_for.as_deref(), Some("cats"));
        assert!(result.gifs.is_empty());
        assert_eq!(result.tags, vec!["cats".to_string()]);
    }
}
