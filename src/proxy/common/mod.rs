// Common tools for request / response rewriting

pub mod body;
pub mod csrf;
pub mod headers;
