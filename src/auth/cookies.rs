// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie lookup and `Set-Cookie` helpers.
//!
//! Lookups only locate cookies; they never rebuild a cookie string that is
//! later forwarded. Forum session values are opaque and must travel exactly
//! as received.

/// Cookie the gateway sets so the frontend knows the forum user id.
pub const USER_ID_COOKIE: &str = "User-Id";

/// Find the value of cookie `name` in a `Cookie` request header.
///
/// Empty values count as absent.
pub fn find_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name && !value.is_empty()).then_some(value)
    })
}

/// The `name=value` part of a `Set-Cookie` header, attributes dropped.
pub fn set_cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or_default().trim()
}

/// Name and value of a `Set-Cookie` header.
pub fn parse_set_cookie(set_cookie: &str) -> Option<(&str, &str)> {
    let (name, value) = set_cookie_pair(set_cookie).split_once('=')?;
    Some((name.trim(), value))
}

/// First `Set-Cookie` header whose cookie name is exactly `name` and whose
/// value is non-empty.
pub fn find_set_cookie<'a>(set_cookies: &'a [String], name: &str) -> Option<&'a str> {
    set_cookies
        .iter()
        .map(String::as_str)
        .find(|header| matches!(parse_set_cookie(header), Some((n, v)) if n == name && !v.is_empty()))
}

/// Attributes for cookies issued by the gateway itself.
///
/// These cookies are always readable by frontend scripts and always
/// `SameSite=Strict`.
#[derive(Debug, Clone)]
pub struct CookieAttributes {
    pub secure: bool,
    pub path: String,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            secure: true,
            path: "/".to_string(),
        }
    }
}

impl CookieAttributes {
    /// Attributes for cookies the frontend must be able to read.
    pub fn frontend_readable(secure: bool) -> Self {
        Self {
            secure,
            ..Self::default()
        }
    }

    /// Build a `Set-Cookie` header value.
    pub fn build_set_cookie(&self, name: &str, value: &str) -> String {
        let mut cookie = format!("{name}={value}; Path={}", self.path);

        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Strict");

        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_cookie_locates_named_value() {
        let header = "theme=dark; express.sid=s%3Aabc.def=; User-Id=7";
        assert_eq!(find_cookie(header, "express.sid"), Some("s%3Aabc.def="));
        assert_eq!(find_cookie(header, "User-Id"), Some("7"));
        assert_eq!(find_cookie(header, "missing"), None);
    }

    #[test]
    fn find_cookie_ignores_empty_values_and_prefix_matches() {
        assert_eq!(find_cookie("express.sid=", "express.sid"), None);
        assert_eq!(find_cookie("express.sid.sig=abc", "express.sid"), None);
        assert_eq!(find_cookie("", "express.sid"), None);
    }

    #[test]
    fn find_set_cookie_matches_exact_name() {
        let cookies = vec![
            "express.sid.sig=zzz; Path=/".to_string(),
            "express.sid=s%3Anew; Path=/; HttpOnly; SameSite=Lax".to_string(),
        ];
        assert_eq!(
            find_set_cookie(&cookies, "express.sid"),
            Some("express.sid=s%3Anew; Path=/; HttpOnly; SameSite=Lax")
        );
        assert_eq!(find_set_cookie(&cookies, "other"), None);
    }

    #[test]
    fn find_set_cookie_skips_cleared_cookie() {
        let cookies = vec!["express.sid=; Max-Age=0".to_string()];
        assert_eq!(find_set_cookie(&cookies, "express.sid"), None);
    }

    #[test]
    fn set_cookie_pair_drops_attributes() {
        assert_eq!(
            set_cookie_pair("express.sid=s%3Aabc; Path=/; HttpOnly"),
            "express.sid=s%3Aabc"
        );
        assert_eq!(
            parse_set_cookie("express.sid=s%3Aabc; Path=/"),
            Some(("express.sid", "s%3Aabc"))
        );
        assert_eq!(parse_set_cookie("garbage"), None);
    }

    #[test]
    fn build_set_cookie_includes_attributes() {
        let cookie = CookieAttributes::frontend_readable(true).build_set_cookie("User-Id", "7");
        assert_eq!(cookie, "User-Id=7; Path=/; Secure; SameSite=Strict");

        let insecure = CookieAttributes::frontend_readable(false).build_set_cookie("User-Id", "7");
        assert_eq!(insecure, "User-Id=7; Path=/; SameSite=Strict");
    }
}
