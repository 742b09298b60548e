//! Path and query canonicalization.
//!
//! Two spellings of the same resource must map to the same record key, so the
//! path+query part of every URL goes through [`canonicalize`] before it is
//! looked up or stored.

use percent_encoding::percent_decode_str;

/// Characters allowed unescaped in a path, besides the unreserved set.
const PATH_SAFE: &[u8] = b"/:@!$&'()*+,;=";
/// Characters allowed unescaped in a query, besides the unreserved set.
const QUERY_SAFE: &[u8] = b"/:@!$&'()*+,;=?";

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Escapes kept as-is by [`fold_case`]: decoding them would change where the
/// path splits into segments or where the query starts.
const STRUCTURAL_ESCAPES: [&[u8; 2]; 3] = [b"2F", b"25", b"3F"];

/// Canonicalize a path with an optional `?query` suffix.
///
/// - percent-escapes of unreserved characters are decoded, all other escapes
///   use upper-case hex, and bytes outside the allowed set are escaped,
/// - `.` and `..` segments are resolved,
/// - an empty path becomes `/`,
/// - a trailing `?` with an empty query is dropped.
///
/// Case is never changed, and query parameters keep their order.
///
/// ```
/// use urldb_store::canonicalize;
/// assert_eq!(canonicalize("/a/./b/../%7euser?q=%3d"), "/a/~user?q=%3D");
/// assert_eq!(canonicalize(""), "/");
/// ```
pub fn canonicalize(path_and_query: &str) -> String {
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };
    let mut path = normalize_escapes(path, PATH_SAFE);
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    let mut out = remove_dot_segments(&path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(&normalize_escapes(query, QUERY_SAFE));
    }
    out
}

/// Lower-case a (percent-encoded) path for domains with case-insensitive
/// paths.
///
/// Escaped text is decoded before folding so that non-ASCII letters fold too.
/// Escaped `/`, `%` and `?` stay escaped. Runs that don't decode to UTF-8 are
/// folded as ASCII only. The result still needs [`canonicalize`].
///
/// ```
/// use urldb_store::{canonicalize, fold_case};
/// assert_eq!(canonicalize(&fold_case("/CAF%C3%89/A%2FB")), "/caf%C3%A9/a%2Fb");
/// ```
pub fn fold_case(path: &str) -> String {
    let mut folded = String::with_capacity(path.len());
    let mut rest = path;
    loop {
        let split = find_structural_escape(rest);
        let run = &rest[..split.unwrap_or(rest.len())];
        match percent_decode_str(run).decode_utf8() {
            Ok(decoded) => folded.push_str(&decoded.to_lowercase()),
            Err(_) => folded.push_str(&run.to_ascii_lowercase()),
        }
        let Some(at) = split else {
            return folded;
        };
        folded.push_str(&rest[at..at + 3]);
        rest = &rest[at + 3..];
    }
}

fn find_structural_escape(s: &str) -> Option<usize> {
    s.as_bytes().windows(3).position(|window| {
        window[0] == b'%' && STRUCTURAL_ESCAPES.iter().any(|escape| window[1..].eq_ignore_ascii_case(&escape[..]))
    })
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn push_escaped(out: &mut String, byte: u8) {
    out.push('%');
    out.push(HEX_UPPER[usize::from(byte >> 4)] as char);
    out.push(HEX_UPPER[usize::from(byte & 0x0f)] as char);
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

fn normalize_escapes(input: &str, safe: &[u8]) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'%' {
            let escaped = bytes
                .get(i + 1..i + 3)
                .and_then(|pair| Some((hex_value(pair[0])? << 4) | hex_value(pair[1])?));
            match escaped {
                Some(decoded) if is_unreserved(decoded) => out.push(decoded as char),
                Some(decoded) => push_escaped(&mut out, decoded),
                // A stray `%` is data, not an escape.
                None => {
                    push_escaped(&mut out, b'%');
                    i += 1;
                    continue;
                },
            }
            i += 3;
            continue;
        }
        if is_unreserved(byte) || safe.contains(&byte) {
            out.push(byte as char);
        } else {
            push_escaped(&mut out, byte);
        }
        i += 1;
    }
    out
}

/// Resolve `.` and `..` segments of an absolute path.
fn remove_dot_segments(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    // The first (empty) segment is the root and is never popped.
    let mut output: Vec<&str> = Vec::with_capacity(segments.len());
    for (i, segment) in segments.into_iter().enumerate() {
        match segment {
            "." | ".." => {
                if segment == ".." && output.len() > 1 {
                    output.pop();
                }
                if i == last {
                    output.push("");
                }
            },
            other => output.push(other),
        }
    }
    match output.as_slice() {
        [""] => "/".to_string(),
        _ => output.join("/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/Foo?X=1", "/Foo?X=1")]
    #[case("", "/")]
    #[case("/", "/")]
    #[case("?", "/")]
    #[case("/x?", "/x")]
    #[case("a.json", "/a.json")]
    #[case("/a/./b/../c", "/a/c")]
    #[case("/a/b/.", "/a/b/")]
    #[case("/..", "/")]
    #[case("/../../x", "/x")]
    #[case("/dir/", "/dir/")]
    #[case("/%7efoo", "/~foo")]
    #[case("/%41%2d%5F", "/A-_")]
    #[case("/a%2fb", "/a%2Fb")]
    #[case("/a b", "/a%20b")]
    #[case("/caf%c3%a9", "/caf%C3%A9")]
    #[case("/café", "/caf%C3%A9")]
    #[case("/bad%zz", "/bad%25zz")]
    #[case("/trailing%", "/trailing%25")]
    #[case("/x?q=a%3d&b=%7e", "/x?q=a%3D&b=~")]
    #[case("/x?b=2&a=1", "/x?b=2&a=1")]
    #[case("/x?next=/a/../b", "/x?next=/a/../b")]
    #[case("/x?q=a b", "/x?q=a%20b")]
    fn test_canonicalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonicalize(input), expected);
    }

    #[rstest]
    #[case("/Foo/BAR", "/foo/bar")]
    #[case("/CAF%C3%89", "/caf%C3%A9")]
    #[case("/caf%C3%A9", "/caf%C3%A9")]
    #[case("/%C3%9CBER/%CE%A3", "/%C3%BCber/%CF%83")]
    #[case("/%41BC", "/abc")]
    #[case("/A%2FB", "/a%2Fb")]
    #[case("/A%2fB", "/a%2Fb")]
    #[case("/X%2541", "/x%2541")]
    #[case("/Q%3FX=1", "/q%3Fx=1")]
    #[case("/BAD%FF%FE", "/bad%FF%FE")]
    #[case("/Stray%ZZ", "/stray%25zz")]
    fn test_fold_case(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(canonicalize(&fold_case(path)), expected);
    }

    #[test]
    fn test_idempotent() {
        for input in ["/a/../b%7e?x=%2f", "/caf%c3%a9/", "/q?%zz"] {
            let once = canonicalize(input);
            assert_eq!(canonicalize(&once), once);
        }
    }
}
