//! Response payloads
//!
//! These are what clients receive and what the cache stores. Upstream
//! records are flattened into snake_case with nulls where data is missing.

use gifhost::{CreatorSearch, Gif, GifSearch, User};
use serde::{Deserialize, Serialize};

/// Creator profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub gifs: u64,
    pub published_gifs: u64,
    pub verified: bool,
    pub views: u64,
    pub profile_image_url: Option<String>,
    pub url: Option<String>,
    pub poster: Option<String>,
    pub thumbnail: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            name: user.name,
            description: user.description,
            followers: user.followers,
            following: user.following,
            gifs: user.gifs,
            published_gifs: user.published_gifs,
            verified: user.verified,
            views: user.views,
            profile_image_url: user.profile_image_url,
            url: user.url,
            poster: user.poster,
            thumbnail: user.thumbnail,
        }
    }
}

/// Rendition links of a GIF plus its watch page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifUrls {
    pub sd: Option<String>,
    pub hd: Option<String>,
    pub poster: Option<String>,
    pub thumbnail: Option<String>,
    pub vthumbnail: Option<String>,
    pub web_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifRecord {
    pub id: String,
    /// RFC 3339
    pub create_date: Option<String>,
    pub has_audio: bool,
    pub width: u32,
    pub height: u32,
    pub likes: u64,
    pub tags: Vec<String>,
    pub verified: bool,
    pub views: u64,
    pub duration: Option<f64>,
    pub published: bool,
    pub username: Option<String>,
    pub avg_color: Option<String>,
    pub urls: GifUrls,
}

impl From<Gif> for GifRecord {
    fn from(gif: Gif) -> Self {
        let web_url = gif.web_url();
        let create_date = gif.created_at().map(|d| d.to_rfc3339());

        Self {
            id: gif.id,
            create_date,
            has_audio: gif.has_audio,
            width: gif.width,
            height: gif.height,
            likes: gif.likes,
            tags: gif.tags,
            verified: gif.verified,
            views: gif.views.unwrap_or(0),
            duration: gif.duration,
            published: gif.published,
            username: gif.username,
            avg_color: gif.avg_color,
            urls: GifUrls {
                sd: gif.urls.sd,
                hd: gif.urls.hd,
                poster: gif.urls.poster,
                thumbnail: gif.urls.thumbnail,
                vthumbnail: gif.urls.vthumbnail,
                web_url,
            },
        }
    }
}

fn records(gifs: Vec<Gif>) -> Vec<GifRecord> {
    gifs.into_iter().map(GifRecord::from).collect()
}

/// One page of a creator's GIFs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGifsPage {
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub gifs: Vec<GifRecord>,
    pub creator: Option<UserProfile>,
}

impl From<CreatorSearch> for UserGifsPage {
    fn from(result: CreatorSearch) -> Self {
        let creator = result.creator().cloned().map(UserProfile::from);
        Self {
            page: result.page,
            pages: result.pages,
            total: result.total,
            gifs: records(result.gifs),
            creator,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub searched_for: Option<String>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub gifs: Vec<GifRecord>,
    pub tags: Vec<String>,
}

impl From<GifSearch> for SearchPage {
    fn from(result: GifSearch) -> Self {
        Self {
            searched_for: result.searched_for,
            page: result.page,
            pages: result.pages,
            total: result.total,
            gifs: records(result.gifs),
            tags: result.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingPage {
    pub gifs: Vec<GifRecord>,
}

impl From<Vec<Gif>> for TrendingPage {
    fn from(gifs: Vec<Gif>) -> Self {
        Self {
            gifs: records(gifs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gifhost::MediaUrls;

    fn sample_gif() -> Gif {
        Gif {
            id: "happyfluffycat".to_string(),
            create_date: Some(1_700_000_000),
            width: 640,
            height: 480,
            tags: vec!["Cats".to_string()],
            views: None,
            urls: MediaUrls {
                hd: Some("https://media.redgifs.com/HappyFluffyCat.mp4".to_string()),
                ..Default::default()
            },
            username: Some("catlover".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_gif_record_shape() {
        let record = GifRecord::from(sample_gif());
        assert_eq!(record.views, 0);
        assert_eq!(record.create_date.as_deref(), Some("2023-11-14T22:13:20+00:00"));
        assert_eq!(
            record.urls.web_url,
            "https://www.redgifs.com/watch/happyfluffycat"
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["urls"]["sd"], serde_json::Value::Null);
        assert_eq!(json["has_audio"], false);
        assert_eq!(json["tags"][0], "Cats");
    }

    #[test]
    fn test_user_gifs_page_carries_creator() {
        let result = CreatorSearch {
            page: 1,
            pages: 3,
            total: 200,
            gifs: vec![sample_gif()],
            users: vec![User {
                username: "catlover".to_string(),
                followers: 10,
                ..Default::default()
            }],
        };

        let page = UserGifsPage::from(result);
        assert_eq!(page.gifs.len(), 1);
        assert_eq!(page.creator.unwrap().followers, 10);

        let empty = UserGifsPage::from(CreatorSearch::default());
        assert!(empty.creator.is_none());
        let json = serde_json::to_value(&empty).unwrap();
        assert!(json["creator"].is_null());
    }

    #[test]
    fn test_search_page_defaults_to_empty_lists() {
        let page = SearchPage::from(GifSearch {
            searched_for: Some("cats".to_string()),
            ..Default::default()
        });
        assert!(page.gifs.is_empty());
        assert!(page.tags.is_empty());
        assert_eq!(page.searched_for.as_deref(), Some("cats"));
    }
}
