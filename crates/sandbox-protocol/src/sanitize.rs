use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*?>.*?</(script|style)>").expect("script/style regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
static OCTET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%[a-f0-9]{2}").expect("octet regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n\t ]+").expect("ws regex"));

/// Reduces untrusted form input to a single line of plain text.
///
/// Strips markup (dropping script/style bodies), removes percent-encoded
/// octets, folds line breaks and tabs into single spaces and trims.
pub fn sanitize_text_field(raw: &str) -> String {
    let mut text = SCRIPT_OR_STYLE.replace_all(raw, "").into_owned();
    text = TAG.replace_all(&text, "").into_owned();

    // Removing one octet can splice a new one together ("%%4141").
    while OCTET.is_match(&text) {
        text = OCTET.replace_all(&text, "").into_owned();
    }

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
