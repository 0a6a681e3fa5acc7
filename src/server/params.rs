//! Query parameter validation
//!
//! Raw query values arrive as optional strings so that every rejection can
//! be reported as a JSON 400 with a useful message. A blank value counts as
//! absent.

use super::error::ApiError;
use gifhost::Order;
use serde::Deserialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_COUNT: u32 = 80;
pub const MAX_COUNT: u32 = 150;

/// `page`, `count` and `order` as sent by the client
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<String>,
    pub count: Option<String>,
    pub order: Option<String>,
}

/// `/api/search` query string
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    pub count: Option<String>,
    pub order: Option<String>,
}

impl SearchQuery {
    fn listing(&self) -> ListingQuery {
        ListingQuery {
            page: self.page.clone(),
            count: self.count.clone(),
            order: self.order.clone(),
        }
    }
}

/// Validated paging parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub count: u32,
    pub order: Order,
}

impl ListingQuery {
    pub fn validate(&self, default_order: Order) -> Result<Paging, ApiError> {
        Ok(Paging {
            page: parse_page(self.page.as_deref())?,
            count: parse_count(self.count.as_deref())?,
            order: parse_order(self.order.as_deref(), default_order)?,
        })
    }
}

/// Validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub paging: Paging,
}

impl SearchQuery {
    pub fn validate(&self) -> Result<SearchParams, ApiError> {
        let query = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Query parameter 'q' is required".to_string()))?;

        Ok(SearchParams {
            query: query.to_string(),
            paging: self.listing().validate(Order::Trending)?,
        })
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_page(raw: Option<&str>) -> Result<u32, ApiError> {
    let Some(value) = present(raw) else {
        return Ok(DEFAULT_PAGE);
    };

    match value.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(ApiError::BadRequest(format!(
            "Invalid page '{}': must be an integer >= 1",
            value
        ))),
    }
}

pub fn parse_count(raw: Option<&str>) -> Result<u32, ApiError> {
    let Some(value) = present(raw) else {
        return Ok(DEFAULT_COUNT);
    };

    match value.parse::<u32>() {
        Ok(count) if (1..=MAX_COUNT).contains(&count) => Ok(count),
        _ => Err(ApiError::BadRequest(format!(
            "Invalid count '{}': must be between 1 and {}",
            value, MAX_COUNT
        ))),
    }
}

pub fn parse_order(raw: Option<&str>, default: Order) -> Result<Order, ApiError> {
    let Some(value) = present(raw) else {
        return Ok(default);
    };

    value.parse().map_err(|_| {
        let allowed: Vec<&str> = Order::all().iter().map(Order::as_str).collect();
        ApiError::BadRequest(format!(
            "Invalid order '{}': must be one of {}",
            value,
            allowed.join(", ")
        ))
    })
}

/// Trimmed username, rejecting blanks
pub fn parse_username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(page: Option<&str>, count: Option<&str>, order: Option<&str>) -> ListingQuery {
        ListingQuery {
            page: page.map(String::from),
            count: count.map(String::from),
            order: order.map(String::from),
        }
    }

    #[test]
    fn test_defaults() {
        let paging = ListingQuery::default().validate(Order::Latest).unwrap();
        assert_eq!(
            paging,
            Paging {
                page: 1,
                count: 80,
                order: Order::Latest
            }
        );

        let paging = listing(Some(""), Some(" "), None)
            .validate(Order::Trending)
            .unwrap();
        assert_eq!(paging.order, Order::Trending);
        assert_eq!(paging.count, DEFAULT_COUNT);
    }

    #[test]
    fn test_bounds() {
        assert!(parse_page(Some("0")).is_err());
        assert!(parse_page(Some("-1")).is_err());
        assert!(parse_page(Some("two")).is_err());
        assert_eq!(parse_page(Some("7")).unwrap(), 7);

        assert!(parse_count(Some("0")).is_err());
        assert!(parse_count(Some("151")).is_err());
        assert_eq!(parse_count(Some("1")).unwrap(), 1);
        assert_eq!(parse_count(Some("150")).unwrap(), 150);
    }

    #[test]
    fn test_order() {
        assert_eq!(parse_order(Some("TOP28"), Order::Latest).unwrap(), Order::Top28);
        let err = parse_order(Some("newest"), Order::Latest).unwrap_err();
        assert!(err.to_string().contains("trending, latest, top, top28"));
    }

    #[test]
    fn test_search_requires_query() {
        let missing = SearchQuery::default();
        assert!(matches!(missing.validate(), Err(ApiError::BadRequest(_))));

        let blank = SearchQuery {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());

        let ok = SearchQuery {
            q: Some("  cats ".to_string()),
            count: Some("40".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(ok.query, "cats");
        assert_eq!(ok.paging.count, 40);
        assert_eq!(ok.paging.order, Order::Trending);
    }

    #[test]
    fn test_username() {
        assert_eq!(parse_username("  CatLover ").unwrap(), "CatLover");
        assert!(parse_username(" ").is_err());
    }
}
