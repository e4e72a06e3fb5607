use regex::{Regex, RegexBuilder};

/// DIGEST_REGEXP matches the only digest format accepted by this client.
/// Input is lowercased before matching.
pub const DIGEST_REGEXP: &str = r"^sha256:[a-f0-9]{64}$";

/// LINK_URI_REGEXP captures the bracketed URI of a `Link` header value,
/// e.g. `</v2/_catalog?last=python&n=10>; rel="next"`.
pub const LINK_URI_REGEXP: &str = r"<(?P<uri>.+)>";

/// RANGE_REGEXP matches both `Range` (`bytes=0-1023`) and `Content-Range` (`0-1023`) values.
pub const RANGE_REGEXP: &str = r"(?P<type>bytes=)?(?P<start>\d+)-(?P<offset>\d+)";

pub fn must_compile(r: &str) -> Regex {
    RegexBuilder::new(r)
        .size_limit(10 * (1 << 21))
        .build()
        .unwrap()
}

lazy_static! {
    pub static ref DIGEST: Regex = must_compile(DIGEST_REGEXP);
    pub static ref LINK_URI: Regex = must_compile(LINK_URI_REGEXP);
    pub static ref RANGE: Regex = must_compile(RANGE_REGEXP);
}
