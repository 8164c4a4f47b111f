//! Well-known header names.

pub const ACCEPT: &str = "Accept";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const AUTHORIZATION: &str = "Authorization";
pub const CONNECTION: &str = "Connection";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const LOCATION: &str = "Location";
pub const RETRY_AFTER: &str = "Retry-After";
pub const SET_COOKIE: &str = "Set-Cookie";
pub const USER_AGENT: &str = "User-Agent";
