//! Session cookie reading and `Set-Cookie` rendering.

use http::header::COOKIE;
use http::HeaderMap;
use std::time::Duration;

pub const SESSION_COOKIE_NAME: &str = "profile.sid";

/// Attributes of the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    max_age: Duration,
    secure: bool,
}

impl SessionCookie {
    pub fn new(max_age: Duration, secure: bool) -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            max_age,
            secure,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finds the session id among all `Cookie` headers.
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.name && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }

    /// `Set-Cookie` value that stores `session_id`.
    pub fn issue(&self, session_id: &str) -> String {
        self.render(session_id, self.max_age.as_secs())
    }

    /// `Set-Cookie` value that makes the client drop the cookie.
    pub fn expire(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age_secs: u64) -> String {
        let mut parts = vec![
            format!("{}={value}", self.name),
            "Path=/".to_string(),
            "HttpOnly".to_string(),
        ];
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.push("SameSite=Lax".to_string());
        parts.push(format!("Max-Age={max_age_secs}"));
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::SessionCookie;
    use http::header::{HeaderValue, COOKIE};
    use http::HeaderMap;
    use std::time::Duration;

    #[test]
    fn issued_cookie_has_security_attributes() {
        let cookie = SessionCookie::new(Duration::from_secs(60), true);
        assert_eq!(
            cookie.issue("abc"),
            "profile.sid=abc; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=60"
        );
        let plain = SessionCookie::new(Duration::from_secs(60), false);
        assert!(!plain.expire().contains("Secure"));
        assert!(plain.expire().ends_with("Max-Age=0"));
    }

    #[test]
    fn read_scans_every_cookie_header() {
        let cookie = SessionCookie::new(Duration::from_secs(60), false);
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("a=1; profile.sid=xyz; b=2"));
        assert_eq!(cookie.read(&headers).as_deref(), Some("xyz"));

        let mut empty = HeaderMap::new();
        empty.append(COOKIE, HeaderValue::from_static("profile.sid="));
        assert_eq!(cookie.read(&empty), None);
    }
}
