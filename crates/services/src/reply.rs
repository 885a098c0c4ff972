//! Decoding structured replies out of free-form completion text.

use serde::de::DeserializeOwned;

use gym_core::model::{CoachingNote, Debrief, GradeReport};

use crate::error::ReplyError;

/// Pull the JSON object out of a reply.
///
/// Accepts a bare object, an object wrapped in ``` / ```json fences, or an
/// object embedded in surrounding prose.
pub(crate) fn extract_json(reply: &str) -> Option<&str> {
    let trimmed = reply.trim();
    if let Some(body) = fenced_object(trimmed) {
        return Some(body);
    }
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    let start = trimmed.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in trimmed[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&trimmed[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The object inside the first fenced block, up to its closing fence.
fn fenced_object(reply: &str) -> Option<&str> {
    let start = reply.find("```")? + 3;
    let after = &reply[start..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let end = after.find("```")?;
    let body = after[..end].trim();
    (body.starts_with('{') && body.ends_with('}')).then_some(body)
}

fn decode<T: DeserializeOwned>(reply: &str) -> Result<T, ReplyError> {
    let body = extract_json(reply).ok_or(ReplyError::NoJson)?;
    Ok(serde_json::from_str(body)?)
}

/// # Errors
///
/// Returns `ReplyError` if the reply is not a valid grade with a 1-5 rating.
pub fn parse_grade(reply: &str) -> Result<GradeReport, ReplyError> {
    Ok(decode::<GradeReport>(reply)?.validate()?)
}

/// # Errors
///
/// Returns `ReplyError` if the reply is not a valid coaching note.
pub fn parse_coaching_note(reply: &str) -> Result<CoachingNote, ReplyError> {
    decode(reply)
}

/// # Errors
///
/// Returns `ReplyError` if the reply is not a valid debrief with a 1-5 rating.
pub fn parse_debrief(reply: &str) -> Result<Debrief, ReplyError> {
    Ok(decode::<Debrief>(reply)?.validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = r#"{"principle_used": ["Liking"], "effectiveness": "Warm opener.", "tip": "Ask a question."}"#;

    #[test]
    fn strips_json_fences() {
        let fenced = format!("```json\n{NOTE}\n```");
        assert_eq!(extract_json(&fenced), Some(NOTE));
        let bare_fence = format!("```\n{NOTE}\n```");
        assert_eq!(extract_json(&bare_fence), Some(NOTE));
    }

    #[test]
    fn text_after_the_closing_fence_is_ignored() {
        let reply = format!("```json\n{NOTE}\n```\nHope this helps!");
        assert_eq!(extract_json(&reply), Some(NOTE));
        let note = parse_coaching_note(&reply).unwrap();
        assert_eq!(note.tip, "Ask a question.");

        let prefaced = format!("Here you go:\n```json\n{NOTE}\n```");
        assert_eq!(extract_json(&prefaced), Some(NOTE));
    }

    #[test]
    fn fence_without_an_object_falls_back_to_brace_scan() {
        let reply = format!("```\nno json in here\n```\nAfter all: {NOTE}");
        assert_eq!(extract_json(&reply), Some(NOTE));
    }

    #[test]
    fn finds_object_inside_prose() {
        let reply = format!("Here is my feedback:\n{NOTE}\nGood luck!");
        let note = parse_coaching_note(&reply).unwrap();
        assert_eq!(note.principle_used, vec!["Liking".to_string()]);
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_object() {
        let reply = r#"Sure. {"principle_used": [], "effectiveness": "use {curly} words", "tip": "a \"quote\" }"} trailing"#;
        let note = parse_coaching_note(reply).unwrap();
        assert_eq!(note.effectiveness, "use {curly} words");
    }

    #[test]
    fn rejects_prose_without_json() {
        assert!(matches!(
            parse_coaching_note("I could not analyse that."),
            Err(ReplyError::NoJson)
        ));
    }

    #[test]
    fn debrief_rating_must_be_in_range() {
        let reply = r#"{"overall_rating": 0, "principles_used": [], "best_moment": "b", "missed_opportunity": "m", "key_takeaway": "k"}"#;
        assert!(matches!(parse_debrief(reply), Err(ReplyError::Invalid(_))));
    }

    #[test]
    fn grade_missing_fields_is_a_decode_error() {
        assert!(matches!(
            parse_grade(r#"{"rating": 3}"#),
            Err(ReplyError::Decode(_))
        ));
    }
}
