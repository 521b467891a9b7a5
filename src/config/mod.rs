//! Configuration module

mod site;

pub use site::CategoryConfig;
pub use site::SiteConfig;
