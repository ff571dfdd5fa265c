//! Signed session tokens.
//!
//! A session is an HS256 JWT carried in an HttpOnly cookie, encoding the
//! user id, login and the group ids minted at login time. Permission
//! evaluation reads groups from this token only and never re-derives
//! them from storage per request.
//!
//! The middleware decodes the cookie once per request and stores a
//! [`Caller`] in the request extensions; handlers take it via the
//! [`Caller`] extractor. Missing, invalid or expired tokens degrade to
//! the anonymous caller with an empty group set — method- and row-level
//! checks decide what an anonymous caller may do.

mod claims;
mod extract;

pub use claims::{Claims, SessionError, SessionKeys};
pub use extract::{Caller, SessionLayerState, session_middleware};

/// Cookie attributes for issued and cleared session cookies.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value carrying a freshly signed token.
    #[must_use]
    pub fn issue(&self, token: &str, max_age_secs: i64) -> String {
        let mut cookie = format!(
            "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}",
            self.name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that clears the session.
    #[must_use]
    pub fn clear(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name)
    }

    /// Extract the raw token from a `Cookie` request header value.
    #[must_use]
    pub fn token_from_header(&self, header: &str) -> Option<String> {
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.name).then(|| value.to_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CookieSettings {
        CookieSettings {
            name: "trellis_session".to_owned(),
            secure: false,
        }
    }

    #[test]
    fn test_token_extracted_among_other_cookies() {
        let s = settings();
        let header = "theme=dark; trellis_session=abc.def.ghi; lang=en";
        assert_eq!(s.token_from_header(header), Some("abc.def.ghi".to_owned()));
    }

    #[test]
    fn test_missing_cookie_yields_none() {
        let s = settings();
        assert_eq!(s.token_from_header("theme=dark"), None);
        assert_eq!(s.token_from_header(""), None);
    }

    #[test]
    fn test_issue_and_clear_shapes() {
        let s = settings();
        let issued = s.issue("tok", 3600);
        assert!(issued.starts_with("trellis_session=tok;"));
        assert!(issued.contains("Max-Age=3600"));
        assert!(s.clear().contains("Max-Age=0"));
    }
}
