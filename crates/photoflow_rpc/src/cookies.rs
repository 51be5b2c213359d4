//! Cookie jar parsing for the two formats accounts are onboarded with: an
//! exported Netscape cookie file, or a single `document.cookie`-style string
//! pasted from a browser devtools session.

use photoflow_protocol::{CookieJar, CookieRecord};

/// Parse a Netscape-format cookie file (`domain\tinclude_subdomains\tpath\t
/// secure\texpiry\tname\tvalue`, one cookie per line). Lines starting with
/// `#HttpOnly_` are treated as regular entries with that prefix stripped;
/// other `#`-prefixed lines are comments and are skipped, as are blank lines
/// and malformed rows.
pub fn parse_netscape_cookie_file(raw: &str) -> CookieJar {
    let mut cookies = Vec::new();
    for line in raw.lines() {
        let mut stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        let owned;
        if let Some(rest) = stripped.strip_prefix("#HttpOnly_") {
            owned = rest.to_string();
            stripped = &owned;
        } else if stripped.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = stripped.split('\t').collect();
        if parts.len() != 7 {
            continue;
        }
        let [domain, include_subdomains, path, secure, expiry, name, value] = parts[..] else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        cookies.push(CookieRecord {
            domain: domain.to_string(),
            include_subdomains: include_subdomains.eq_ignore_ascii_case("TRUE"),
            path: path.to_string(),
            secure: secure.eq_ignore_ascii_case("TRUE"),
            expires_at: expiry.parse().unwrap_or(0),
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    cookies
}

/// Parse a semicolon-separated `name=value; name2=value2` string, the shape
/// a browser's `document.cookie` produces. Cookies parsed this way carry
/// placeholder attributes (`domain`, secure, root path) since the source
/// string doesn't encode them.
pub fn parse_cookie_string(raw: &str, domain: &str) -> CookieJar {
    let mut cookies = Vec::new();
    for part in raw.split(';') {
        let segment = part.trim();
        let Some((name, value)) = segment.split_once('=') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            continue;
        }
        cookies.push(CookieRecord {
            domain: domain.to_string(),
            include_subdomains: true,
            path: "/".to_string(),
            secure: true,
            expires_at: 0,
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    cookies
}

/// Render a jar as a `Cookie:` header value.
pub fn cookie_header(jar: &CookieJar) -> String {
    jar.iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netscape_strips_httponly_prefix() {
        let raw = "#HttpOnly_.google.com\tTRUE\t/\tTRUE\t0\tSID\tabc123";
        let jar = parse_netscape_cookie_file(raw);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar[0].name, "SID");
        assert!(jar[0].include_subdomains);
    }

    #[test]
    fn netscape_skips_comments_and_malformed_lines() {
        let raw = "# a comment\n\nnot\\tenough\\tfields\n.google.com\tTRUE\t/\tFALSE\t100\tfoo\tbar";
        let jar = parse_netscape_cookie_file(raw);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar[0].expires_at, 100);
        assert!(!jar[0].secure);
    }

    #[test]
    fn cookie_string_splits_on_semicolons() {
        let jar = parse_cookie_string(" SID=abc ; HSID = def;", ".google.com");
        assert_eq!(jar.len(), 2);
        assert_eq!(jar[1].name, "HSID");
        assert_eq!(jar[1].value, "def");
    }

    #[test]
    fn header_joins_name_value_pairs() {
        let jar = parse_cookie_string("a=1;b=2", ".google.com");
        assert_eq!(cookie_header(&jar), "a=1; b=2");
    }
}
