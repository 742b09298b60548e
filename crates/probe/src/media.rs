//! Media type handling.

/// Assumed when a response carries no usable `Content-Type` header.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Pairs of media types that servers use interchangeably. A change from one to
/// the other is reported, but isn't a failure.
pub const EQUIVALENT_MEDIA_TYPES: &[(&str, &str)] = &[
    ("application/javascript", "application/x-javascript"),
    ("application/x-zip-compressed", "application/zip"),
];

/// Strip parameters (such as `charset`) from a `Content-Type` header value.
///
/// ```
/// use urldb_probe::media::base_media_type;
/// assert_eq!(base_media_type(Some("Text/HTML; charset=utf-8")), "text/html");
/// assert_eq!(base_media_type(None), "application/octet-stream");
/// ```
pub fn base_media_type(header: Option<&str>) -> String {
    let base = header.and_then(|value| value.split(';').next()).map(str::trim).unwrap_or_default();
    match base.is_empty() {
        true => DEFAULT_MEDIA_TYPE.to_string(),
        false => base.to_ascii_lowercase(),
    }
}

/// Media types compare case-insensitively.
pub fn same_media_type(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Whether `a` and `b` are listed in [`EQUIVALENT_MEDIA_TYPES`], in either order.
pub fn equivalent_media_types(a: &str, b: &str) -> bool {
    EQUIVALENT_MEDIA_TYPES.iter().any(|(x, y)| {
        (same_media_type(a, x) && same_media_type(b, y)) || (same_media_type(a, y) && same_media_type(b, x))
    })
}
