//! Helpers for HTTP handlers: method gating and JSON response envelopes.
//!
//! Nothing here depends on a particular web framework. A handler checks the
//! request method with a [`MethodGate`] and turns its JSON result into a
//! [`RenderedResponse`] with a [`JsonEnvelope`]; copying status, content type
//! and body into the framework's response type is left to the caller.

use std::fmt::{self, Write};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Request methods a handler accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodGate {
    allowed: Vec<String>,
}

/// Returned by [`MethodGate::check`]; maps to a `405 Method Not Allowed`
/// response with an `Allow` header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Method {method} not allowed, expected {allow}")]
pub struct MethodNotAllowed {
    pub method: String,
    pub allow: String,
}

impl MethodNotAllowed {
    pub const STATUS: u16 = 405;

    /// Value for the `Allow` response header.
    pub fn allow_header(&self) -> &str {
        &self.allow
    }
}

impl MethodGate {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MethodGate {
            allowed: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get() -> Self {
        MethodGate::new(["GET"])
    }

    pub fn post() -> Self {
        MethodGate::new(["POST"])
    }

    pub fn put() -> Self {
        MethodGate::new(["PUT"])
    }

    pub fn post_or_put() -> Self {
        MethodGate::new(["POST", "PUT"])
    }

    pub fn allows(&self, method: &str) -> bool {
        self.allowed.iter().any(|m| m == method)
    }

    pub fn check(&self, method: &str) -> Result<(), MethodNotAllowed> {
        if self.allows(method) {
            Ok(())
        } else {
            Err(MethodNotAllowed {
                method: method.to_string(),
                allow: self.allowed.join(", "),
            })
        }
    }
}

static CALLBACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("Callback pattern should compile")
});

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid JSONP callback name {0:?}")]
    InvalidCallback(String),
    #[error("HTML rendering failed")]
    Html(#[from] fmt::Error),
}

/// The parts of a request that affect how a JSON result is rendered.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestInfo<'a> {
    pub path: &'a str,
    /// The `format` query parameter; `html` selects the debug view.
    pub format: Option<&'a str>,
    /// The `callback` query parameter; selects JSONP.
    pub callback: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

/// Wraps handler results into JSON responses.
///
/// ```
/// use obfid_rs::response::{JsonEnvelope, RequestInfo};
/// use serde_json::json;
///
/// let envelope = JsonEnvelope::new().with("version", 2);
/// let result = json!({"items": [1, 2], "status": 201});
/// let response = envelope
///     .render(result.as_object().cloned(), &RequestInfo::default())
///     .unwrap();
/// assert_eq!(response.status, 201);
/// assert_eq!(response.content_type, "application/json");
/// assert_eq!(response.body, r#"{"items":[1,2],"ok":true,"version":2}"#);
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonEnvelope {
    extra: Map<String, Value>,
}

impl JsonEnvelope {
    pub fn new() -> Self {
        JsonEnvelope::default()
    }

    /// Adds a member to every response. Static members override members of
    /// the same name in the handler result.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Renders a handler result.
    ///
    /// A `status` member that is set (not null, zero, false or empty) is
    /// taken out of the body and used as the HTTP status when it is a valid
    /// code; other values leave the status at 200. Unset `status` members stay
    /// in the body.
    pub fn render(
        &self,
        result: Option<Map<String, Value>>,
        request: &RequestInfo,
    ) -> Result<RenderedResponse, ResponseError> {
        let mut result = result.unwrap_or_default();
        result.entry("ok").or_insert(Value::Bool(true));
        let status = if result.get("status").is_some_and(is_set) {
            result.remove("status")
        } else {
            None
        };
        let status = status
            .and_then(|status| status.as_u64())
            .filter(|status| (100..=599).contains(status))
            .map_or(200, |status| status as u16);
        for (key, value) in &self.extra {
            result.insert(key.clone(), value.clone());
        }
        let result = Value::Object(result);

        if request.format == Some("html") {
            return Ok(RenderedResponse {
                status,
                content_type: "text/html",
                body: render_html(request.path, &result)?,
            });
        }

        let json = serde_json::to_string(&result)?;
        match request.callback {
            None => Ok(RenderedResponse {
                status,
                content_type: "application/json",
                body: json,
            }),
            Some(callback) if CALLBACK_RE.is_match(callback) => Ok(RenderedResponse {
                status,
                content_type: "application/javascript",
                body: format!("{}({});", callback, json),
            }),
            Some(callback) => Err(ResponseError::InvalidCallback(callback.to_string())),
        }
    }
}

const HTML_HEAD: &str = "<!DOCTYPE HTML><html><head><style>
body { line-height: 16px; font-size: 14px; font-family: sans; }
table { border: 1px solid black; background-color: white; }
table tr { vertical-align: top; }
.array table tr:nth-child(odd) { background-color: #dee; }
.array table tr:nth-child(even) { background-color: #eff; }
.object table tr:nth-child(odd) { background-color: #ede; }
.object table tr:nth-child(even) { background-color: #fef; }
.boolean { color: #600; }
.string { color: #060; }
.number { color: #009; }
.null { color: #333; }
th { text-align: left; padding: 2px 10px 2px 2px; font-weight: normal; }
td { padding: 2px; }
.array th { font-style: italic; color: #999 }
</style></head><body>";

/// Whether a JSON value counts as set: not null, false, zero or empty.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(members) => !members.is_empty(),
    }
}

/// A browsable HTML view of a JSON value.
fn render_html(path: &str, value: &Value) -> Result<String, fmt::Error> {
    let mut out = String::from(HTML_HEAD);
    write!(out, "<h1>JSON Result from: {}</h1>", escape(path))?;
    write_value(&mut out, value)?;
    out.push_str("</body></html>");
    Ok(out)
}

fn write_value<W: Write>(out: &mut W, value: &Value) -> fmt::Result {
    match value {
        Value::Null => out.write_str("<div class='null'>null</div>"),
        Value::Bool(b) => write!(out, "<div class='boolean'>{}</div>", b),
        Value::Number(n) => write!(out, "<div class='number'>{}</div>", n),
        Value::String(s) => write!(out, "<div class='string'>\"{}\"</div>", escape(s)),
        Value::Array(items) => {
            out.write_str("<div class='array'>")?;
            if items.is_empty() {
                out.write_str("[]")?;
            } else {
                out.write_str("<table>")?;
                for (i, item) in items.iter().enumerate() {
                    write!(out, "<tr><th>{}</th><td>", i)?;
                    write_value(out, item)?;
                    out.write_str("</td></tr>")?;
                }
                out.write_str("</table>")?;
            }
            out.write_str("</div>")
        }
        Value::Object(members) => {
            out.write_str("<div class='object'>")?;
            if members.is_empty() {
                out.write_str("{}")?;
            } else {
                let mut keys: Vec<&String> = members.keys().collect();
                keys.sort();
                out.write_str("<table>")?;
                for key in keys {
                    write!(out, "<tr><th>{}:</th><td>", escape(key))?;
                    write_value(out, &members[key.as_str()])?;
                    out.write_str("</td></tr>")?;
                }
                out.write_str("</table>")?;
            }
            out.write_str("</div>")
        }
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    #[test]
    fn test_method_gate() {
        assert!(MethodGate::get().check("GET").is_ok());
        assert!(MethodGate::post_or_put().check("PUT").is_ok());
        let err = MethodGate::post_or_put().check("GET").unwrap_err();
        assert_eq!(err.allow_header(), "POST, PUT");
        assert_eq!(err.method, "GET");
        assert_eq!(MethodNotAllowed::STATUS, 405);
        assert!(!MethodGate::post().allows("post"));
        assert!(MethodGate::new(vec!["DELETE".to_string()]).allows("DELETE"));
    }

    #[test]
    fn test_empty_result() {
        let response = JsonEnvelope::new()
            .render(None, &RequestInfo::default())
            .unwrap();
        assert_eq!(
            response,
            RenderedResponse {
                status: 200,
                content_type: "application/json",
                body: r#"{"ok":true}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_explicit_ok_is_kept() {
        let response = JsonEnvelope::new()
            .render(object(json!({"ok": false, "status": 400})), &RequestInfo::default())
            .unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.body, r#"{"ok":false}"#);
    }

    #[test]
    fn test_invalid_status_falls_back() {
        let envelope = JsonEnvelope::new();
        for status in [json!("201"), json!(1000), json!(true)] {
            let response = envelope
                .render(object(json!({"status": status})), &RequestInfo::default())
                .unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(response.body, r#"{"ok":true}"#);
        }
    }

    #[test]
    fn test_unset_status_stays_in_body() {
        let envelope = JsonEnvelope::new();
        for (status, body) in [
            (json!(0), r#"{"ok":true,"status":0}"#),
            (json!(null), r#"{"ok":true,"status":null}"#),
            (json!(""), r#"{"ok":true,"status":""}"#),
            (json!(false), r#"{"ok":true,"status":false}"#),
        ] {
            let response = envelope
                .render(object(json!({"status": status})), &RequestInfo::default())
                .unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(response.body, body);
        }
    }

    #[test]
    fn test_static_data_overrides() {
        let envelope = JsonEnvelope::new().with("api", "v1");
        let response = envelope
            .render(object(json!({"api": "mine", "n": 1})), &RequestInfo::default())
            .unwrap();
        assert_eq!(response.body, r#"{"api":"v1","n":1,"ok":true}"#);
    }

    #[test]
    fn test_jsonp() {
        let request = RequestInfo {
            callback: Some("app.handle"),
            ..Default::default()
        };
        let response = JsonEnvelope::new().render(None, &request).unwrap();
        assert_eq!(response.content_type, "application/javascript");
        assert_eq!(response.body, r#"app.handle({"ok":true});"#);

        let request = RequestInfo {
            callback: Some("alert(1)//"),
            ..Default::default()
        };
        assert!(matches!(
            JsonEnvelope::new().render(None, &request),
            Err(ResponseError::InvalidCallback(_))
        ));
    }

    #[test]
    fn test_html_debug_view() {
        let request = RequestInfo {
            path: "/api/<items>",
            format: Some("html"),
            callback: None,
        };
        let result = json!({"b": [1, "x<y"], "a": {}, "c": null, "d": []});
        let response = JsonEnvelope::new().render(object(result), &request).unwrap();
        assert_eq!(response.content_type, "text/html");
        let body = &response.body;
        assert!(body.starts_with("<!DOCTYPE HTML>"));
        assert!(body.contains("<h1>JSON Result from: /api/&lt;items&gt;</h1>"));
        assert!(body.contains("<tr><th>a:</th><td><div class='object'>{}</div></td></tr>"));
        assert!(body.contains("<tr><th>1</th><td><div class='string'>\"x&lt;y\"</div></td></tr>"));
        assert!(body.contains("<div class='array'>[]</div>"));
        assert!(body.contains("<div class='null'>null</div>"));
        assert!(body.contains("<div class='boolean'>true</div>"));
        let a = body.find("<th>a:</th>").unwrap();
        let b = body.find("<th>b:</th>").unwrap();
        let ok = body.find("<th>ok:</th>").unwrap();
        assert!(a < b && b < ok);
        assert!(body.ends_with("</body></html>"));
    }
}
