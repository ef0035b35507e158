pub mod telegram;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::types::Listing;

pub use telegram::TelegramNotifier;

/// Outbound message sink. One attempt per call; callers do not retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: i64, message: &str) -> Result<(), NotifyError>;
}

/// Human-readable match message: name, price, link.
pub fn match_message(listing: &Listing) -> String {
    format!(
        "💰 Найден лот!\n\n{}\nЦена: {:.2}\n{}",
        listing.name, listing.price, listing.url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_has_name_price_and_link() {
        let msg = match_message(&Listing {
            name: "item BBB".to_string(),
            price: 99.0,
            url: "https://funpay.com/lots/offer?id=2".to_string(),
            category: "cat".to_string(),
        });
        assert!(msg.starts_with("💰 Найден лот!\n\n"));
        assert!(msg.contains("item BBB"));
        assert!(msg.contains("Цена: 99.00"));
        assert!(msg.ends_with("https://funpay.com/lots/offer?id=2"));
    }
}
