//! Minimal HTML form extraction for the authorization pages

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

static FORM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<form\b([^>]*)>(.*?)</form>").unwrap());
static INPUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<input\b([^>]*)>").unwrap());
static IMG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<img\b([^>]*)>").unwrap());
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});

/// HTTP method of a form submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

/// What an authorization page asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Captcha,
    Login,
    TwoFactor,
    /// Anything else, e.g. the "allow access" page
    Consent,
}

/// A form with its resolved action and the fields a browser would submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlForm {
    pub action: Url,
    pub method: FormMethod,
    fields: Vec<(String, String)>,
}

impl HtmlForm {
    /// All forms on a page, actions resolved against `page_url`
    pub fn parse_all(html: &str, page_url: &Url) -> Vec<Self> {
        FORM_RE
            .captures_iter(html)
            .filter_map(|caps| {
                let attrs = parse_attrs(&caps[1]);

                let action = match attrs.get("action").map(String::as_str) {
                    None | Some("") => page_url.clone(),
                    Some(action) => page_url.join(action).ok()?,
                };

                let method = match attrs.get("method") {
                    Some(method) if method.eq_ignore_ascii_case("post") => FormMethod::Post,
                    _ => FormMethod::Get,
                };

                Some(Self {
                    action,
                    method,
                    fields: parse_inputs(&caps[2]),
                })
            })
            .collect()
    }

    /// First form on a page
    pub fn first(html: &str, page_url: &Url) -> Option<Self> {
        Self::parse_all(html, page_url).into_iter().next()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Sets a field, replacing an existing value
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn kind(&self) -> FormKind {
        if self.has_field("captcha_sid") {
            FormKind::Captcha
        } else if self.has_field("pass") {
            FormKind::Login
        } else if self.action.as_str().contains("authcheck") || self.has_field("code") {
            FormKind::TwoFactor
        } else {
            FormKind::Consent
        }
    }
}

/// Source of the first image whose URL mentions a captcha
pub fn find_captcha_image(html: &str, page_url: &Url) -> Option<Url> {
    IMG_RE
        .captures_iter(html)
        .filter_map(|caps| parse_attrs(&caps[1]).remove("src"))
        .find(|src| src.contains("captcha"))
        .and_then(|src| page_url.join(&src).ok())
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            (caps[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

fn parse_inputs(inner: &str) -> Vec<(String, String)> {
    INPUT_RE
        .captures_iter(inner)
        .filter_map(|caps| {
            let raw = &caps[1];
            let mut attrs = parse_attrs(raw);
            let kind = attrs.remove("type").unwrap_or_default().to_ascii_lowercase();

            match kind.as_str() {
                "submit" | "button" | "image" | "reset" => return None,
                "checkbox" | "radio" if !is_checked(raw, &attrs) => return None,
                _ => {}
            }

            let name = attrs.remove("name").filter(|name| !name.is_empty())?;
            Some((name, attrs.remove("value").unwrap_or_default()))
        })
        .collect()
}

/// `checked` as a bare boolean attribute or as `checked="..."`
fn is_checked(raw: &str, attrs: &HashMap<String, String>) -> bool {
    if attrs.contains_key("checked") {
        return true;
    }

    ATTR_RE
        .replace_all(raw, " ")
        .split(|c: char| c.is_whitespace() || c == '/')
        .any(|word| word.eq_ignore_ascii_case("checked"))
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
