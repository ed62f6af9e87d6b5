//! Combined format: the issuer-signed JWT, its disclosures and an optional
//! holder-binding JWT, joined with `~`.

/// Separator between the parts of the combined format.
pub const SEPARATOR: char = '~';

/// Joins parts with the separator, without any escaping.
///
/// Every part is already base64url or a compact JWS and never contains the
/// separator.
pub fn join<I>(parts: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut combined = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            combined.push(SEPARATOR);
        }
        combined.push_str(part.as_ref());
    }
    combined
}

/// Splits on the separator. The issuer JWT is always the first segment.
pub fn split(combined: &str) -> Vec<&str> {
    combined.split(SEPARATOR).collect()
}

/// Parts of a combined-format token.
#[derive(Debug, PartialEq, Eq)]
pub struct Deserialized<'a> {
    /// Issuer-signed JWT.
    pub jwt: &'a str,

    /// Encoded disclosures, empty segments dropped.
    pub disclosures: Vec<&'a str>,

    /// Holder-binding JWT, the last segment when it is a JWS.
    pub key_binding_jwt: Option<&'a str>,
}

fn is_compact_jws(segment: &str) -> bool {
    segment.split('.').count() == 3
}

/// Splits a combined-format token into its parts.
///
/// Returns `None` if the first segment is not a compact JWS.
pub fn deserialize_string_format(combined: &str) -> Option<Deserialized> {
    let mut segments = split(combined);

    let jwt = segments.first().copied()?;
    if !is_compact_jws(jwt) {
        return None;
    }

    let has_key_binding =
        segments.len() > 1 && segments.last().map_or(false, |last| last.contains('.'));
    let key_binding_jwt = if has_key_binding {
        segments.pop()
    } else {
        None
    };

    let disclosures = segments
        .into_iter()
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .collect();

    Some(Deserialized {
        jwt,
        disclosures,
        key_binding_jwt,
    })
}

/// Assembles a combined-format token.
pub fn serialize_string_format<'a>(
    jwt: &str,
    disclosures: impl IntoIterator<Item = &'a str>,
    key_binding_jwt: Option<&str>,
) -> String {
    join(
        std::iter::once(jwt)
            .chain(disclosures)
            .chain(key_binding_jwt),
    )
}
