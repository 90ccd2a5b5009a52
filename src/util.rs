/// Joins `segments` under `base` as a data.gouv.fr style path.
///
/// Each segment is percent-encoded and the path always ends with `/`,
/// which the API expects on every dataset/resource endpoint.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> String {
    let mut out = base.trim_end_matches('/').to_string();
    for s in segments {
        out.push('/');
        out.push_str(&urlencoding::encode(s));
    }
    out.push('/');
    out
}

/// `application/json`, `application/problem+json` and friends.
pub(crate) fn is_json_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

pub(crate) fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
