pub mod listings;
pub mod price;

pub use listings::extract_listings;
