//! Response decoding: raw response text → decoded value → body.

use serde_json::Value;

use pushnav_types::error::{NavError, Result};

use crate::config::ResponseFormat;
use crate::state::Body;

/// A pure function from raw response text to a decoded value.
pub type CustomTransform = Box<dyn Fn(&str) -> Result<Body>>;

/// The configured response transform.
pub enum ResponseTransform {
    /// The raw text is the body.
    Identity,
    /// Decode the raw text as JSON.
    Json,
    Custom(CustomTransform),
}

impl ResponseTransform {
    /// Decode a raw response.
    pub fn decode(&self, raw: &str) -> Result<Body> {
        match self {
            ResponseTransform::Identity => Ok(Body::Markup(raw.to_string())),
            ResponseTransform::Json => {
                let value: Value = serde_json::from_str(raw)
                    .map_err(|e| NavError::Transform(format!("invalid JSON: {e}")))?;
                Ok(Body::Data(value))
            },
            ResponseTransform::Custom(f) => f(raw),
        }
    }
}

impl From<ResponseFormat> for ResponseTransform {
    fn from(format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Text => ResponseTransform::Identity,
            ResponseFormat::Json => ResponseTransform::Json,
        }
    }
}

impl std::fmt::Debug for ResponseTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseTransform::Identity => f.write_str("Identity"),
            ResponseTransform::Json => f.write_str("Json"),
            ResponseTransform::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Pull the body out of a decoded value.
///
/// With no key the decoded value is the body. With a key, structured
/// values must be objects holding that key; markup passes through since it
/// has no keys to select from. String members become markup.
pub fn extract_body(decoded: Body, key: Option<&str>) -> Result<Body> {
    let Some(key) = key else {
        return Ok(decoded);
    };
    match decoded {
        Body::Markup(_) => Ok(decoded),
        Body::Data(Value::Object(mut map)) => match map.remove(key) {
            Some(Value::String(s)) => Ok(Body::Markup(s)),
            Some(v) => Ok(Body::Data(v)),
            None => Err(NavError::Transform(format!("response has no \"{key}\" member"))),
        },
        Body::Data(other) => Err(NavError::Transform(format!(
            "cannot select \"{key}\" from non-object response {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_keeps_raw_text() {
        let body = ResponseTransform::Identity.decode("<p>x</p>").unwrap();
        assert_eq!(body, Body::from("<p>x</p>"));
    }

    #[test]
    fn json_decodes() {
        let body = ResponseTransform::Json.decode(r#"{"body":"<p>about</p>"}"#).unwrap();
        assert_eq!(body, Body::Data(json!({"body": "<p>about</p>"})));
    }

    #[test]
    fn invalid_json_is_transform_error() {
        let err = ResponseTransform::Json.decode("<html>").unwrap_err();
        assert!(matches!(err, NavError::Transform(_)));
    }

    #[test]
    fn custom_transform_runs() {
        let t = ResponseTransform::Custom(Box::new(|raw: &str| -> Result<Body> {
            Ok(Body::from(raw.to_uppercase()))
        }));
        assert_eq!(t.decode("abc").unwrap(), Body::from("ABC"));
    }

    #[test]
    fn extract_with_key() {
        let decoded = Body::Data(json!({"body": "<p>about</p>", "title": "About"}));
        assert_eq!(
            extract_body(decoded, Some("body")).unwrap(),
            Body::from("<p>about</p>")
        );
    }

    #[test]
    fn extract_structured_member() {
        let decoded = Body::Data(json!({"data": {"n": 1}}));
        assert_eq!(
            extract_body(decoded, Some("data")).unwrap(),
            Body::Data(json!({"n": 1}))
        );
    }

    #[test]
    fn extract_without_key_is_whole_value() {
        let decoded = Body::Data(json!([1, 2]));
        assert_eq!(extract_body(decoded.clone(), None).unwrap(), decoded);
    }

    #[test]
    fn missing_key_is_transform_error() {
        let decoded = Body::Data(json!({"html": "x"}));
        assert!(extract_body(decoded, Some("body")).is_err());
        assert!(extract_body(Body::Data(json!(3)), Some("body")).is_err());
    }

    #[test]
    fn markup_ignores_key() {
        let body = extract_body(Body::from("<p/>"), Some("body")).unwrap();
        assert_eq!(body, Body::from("<p/>"));
    }
}
