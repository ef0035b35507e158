use async_trait::async_trait;

use crate::error::LookupError;
use crate::fetcher::PageFetcher;
use crate::parser::extract_listings;
use crate::types::Listing;

/// Source of current listings for a category, filtered by name.
#[async_trait]
pub trait LotProvider: Send + Sync {
    async fn find_lots(&self, category: &str, name_filter: &str)
        -> Result<Vec<Listing>, LookupError>;
}

/// Scrapes the marketplace's category pages at `<base>/lots/<category>/`.
pub struct MarketplaceClient {
    fetcher: PageFetcher,
    base_url: String,
}

impl MarketplaceClient {
    pub fn new(fetcher: PageFetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The category key is opaque and used verbatim as a path segment.
    pub fn category_url(&self, category: &str) -> String {
        format!("{}/lots/{}/", self.base_url, category)
    }
}

#[async_trait]
impl LotProvider for MarketplaceClient {
    async fn find_lots(
        &self,
        category: &str,
        name_filter: &str,
    ) -> Result<Vec<Listing>, LookupError> {
        let html = self.fetcher.fetch(&self.category_url(category)).await?;
        extract_listings(&html, category, name_filter, &self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{extract::Path, http::StatusCode, routing::get, Router};
    use std::time::Duration;

    const PAGE: &str = r#"<html><body>
        <a class="tc-item" href="/lots/offer?id=7">
          <div class="tc-desc-text">Item Alpha</div>
          <div class="tc-price" data-s="120.5">120,5 ₽</div>
        </a>
        <a class="tc-item" href="/lots/offer?id=8">
          <div class="tc-desc-text">item beta</div>
          <div class="tc-price" data-s="80">80 ₽</div>
        </a>
    </body></html>"#;

    async fn client() -> MarketplaceClient {
        let app = Router::new().route(
            "/lots/:category/",
            get(|Path(category): Path<String>| async move {
                if category == "210" {
                    (StatusCode::OK, PAGE.to_string())
                } else {
                    (StatusCode::NOT_FOUND, String::new())
                }
            }),
        );
        let base = serve(app).await;
        let fetcher = PageFetcher::new("ua", Duration::from_secs(2)).unwrap();
        MarketplaceClient::new(fetcher, format!("{base}/"))
    }

    #[test]
    fn builds_category_url() {
        let fetcher = PageFetcher::new("ua", Duration::from_secs(1)).unwrap();
        let client = MarketplaceClient::new(fetcher, "https://funpay.com/");
        assert_eq!(client.category_url("210"), "https://funpay.com/lots/210/");
    }

    #[tokio::test]
    async fn finds_lots_with_absolute_links() {
        let client = client().await;
        let lots = client.find_lots("210", "ITEM").await.unwrap();
        assert_eq!(lots.len(), 2);
        assert_eq!(lots[0].name, "Item Alpha");
        assert!(lots[0].url.ends_with("/lots/offer?id=7"));
        assert!(lots[0].url.starts_with("http://127.0.0.1:"));
        assert_eq!(lots[1].category, "210");
    }

    #[tokio::test]
    async fn filter_without_hits_is_no_match() {
        let client = client().await;
        let err = client.find_lots("210", "gamma").await.unwrap_err();
        assert!(err.is_no_match());
    }

    #[tokio::test]
    async fn unknown_category_is_status_error() {
        let client = client().await;
        let err = client.find_lots("999", "").await.unwrap_err();
        assert!(matches!(err, LookupError::Status(s) if s == StatusCode::NOT_FOUND));
    }
}
