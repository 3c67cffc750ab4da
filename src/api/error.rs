use serde_json::Value;

/// Places providers put a human-readable error message. OpenAI nests it under
/// `error.message`; Ollama and some proxies use a bare `error` string.
const SUMMARY_POINTERS: &[&str] = &["/error/message", "/error", "/message", "/detail"];

fn extract_error_summary(value: &Value) -> Option<String> {
    SUMMARY_POINTERS
        .iter()
        .filter_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())
}

fn fenced(language: &str, body: &str) -> String {
    format!("```{language}\n{body}\n```")
}

/// Format an error response body for the transcript: a one-line summary when
/// one can be found, then the body in a code fence.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return format!("API Error:\n{}", fenced("", "<empty>"));
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| trimmed.to_string());
        return match extract_error_summary(&value) {
            Some(summary) => format!("API Error: {summary}\n{}", fenced("json", &pretty)),
            None => format!("API Error:\n{}", fenced("json", &pretty)),
        };
    }

    let language = if trimmed.starts_with('<') && trimmed.ends_with('>') {
        "xml"
    } else {
        ""
    };
    format!("API Error:\n{}", fenced(language, trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prettifies_json_with_summary() {
        let raw = r#"{"error":{"message":"Incorrect API key   provided","type":"invalid_request_error"}}"#;
        let formatted = format_api_error(raw);

        let expected = r#"API Error: Incorrect API key provided
```json
{
  "error": {
    "message": "Incorrect API key   provided",
    "type": "invalid_request_error"
  }
}
```"#;
        assert_eq!(formatted, expected);
    }

    #[test]
    fn string_error_field_is_used_as_summary() {
        let formatted = format_api_error(r#"{"error":"model 'qwen' not found"}"#);
        assert!(formatted.starts_with("API Error: model 'qwen' not found\n```json"));
    }

    #[test]
    fn json_without_message_has_no_summary() {
        assert_eq!(
            format_api_error(r#"{"code":500}"#),
            "API Error:\n```json\n{\n  \"code\": 500\n}\n```"
        );
    }

    #[test]
    fn handles_xml_plaintext_and_empty() {
        assert_eq!(
            format_api_error("<error>bad</error>"),
            "API Error:\n```xml\n<error>bad</error>\n```"
        );
        assert_eq!(
            format_api_error("bad gateway"),
            "API Error:\n```\nbad gateway\n```"
        );
        assert_eq!(format_api_error("  "), "API Error:\n```\n<empty>\n```");
    }
}
