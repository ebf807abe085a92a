pub mod location;

pub use location::SiteKey;
