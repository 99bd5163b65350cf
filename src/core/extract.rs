/// Coercion of language-model output into a candidate storyline document.
///
/// Generated text is untrusted: it may be wrapped in markdown fences, carry
/// `//` comments copied from the prompt template, surround the object with
/// prose, omit the identifier, or use `actionType` instead of `action_type`.
/// Nothing here decides validity; the result always goes through the parser.
use serde_json::Value;
use uuid::Uuid;

/// Extract the outermost JSON object from generated text.
///
/// Removes code fences and `//` line comments found outside string literals,
/// then keeps everything from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<String> {
    let cleaned = strip_line_comments(&text.replace("```json", "").replace("```", ""));
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    Some(cleaned[start..=end].to_string())
}

/// Turn generated text into bytes for the storyline parser.
///
/// When the extracted object decodes, a missing `action_type` is taken from
/// `actionType`, and a missing or malformed `id` is replaced with a fresh v4
/// UUID. Otherwise the best available text is returned untouched.
pub fn coerce_generated(text: &str) -> Vec<u8> {
    let Some(candidate) = extract_json(text) else {
        tracing::debug!("no JSON object found in generated text");
        return text.as_bytes().to_vec();
    };

    let mut document: Value = match serde_json::from_str(&candidate) {
        Ok(document) => document,
        Err(_) => return candidate.into_bytes(),
    };
    let Some(object) = document.as_object_mut() else {
        return candidate.into_bytes();
    };

    if !object.contains_key("action_type") {
        if let Some(action) = object.remove("actionType") {
            object.insert("action_type".to_string(), action);
        }
    }

    let has_valid_id = object
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| Uuid::parse_str(id).is_ok());
    if !has_valid_id {
        let id = Uuid::new_v4();
        tracing::debug!(%id, "assigned identifier to generated storyline");
        object.insert("id".to_string(), Value::String(id.to_string()));
    }

    serde_json::to_vec(&document).unwrap_or_else(|_| candidate.into_bytes())
}

fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if c == '\n' {
            // JSON strings never span lines; a stray quote in prose must not
            // leak into the next line.
            in_string = false;
            escaped = false;
            out.push(c);
            continue;
        }

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Drop the rest of the line, keep the line break.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}
