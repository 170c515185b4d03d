use tracing::warn;

use super::client::ChatClient;
use super::prompts;

/// Expand a short context line into a full email body (greeting + body +
/// closing) with a second chat call. This step never fails: on provider
/// error it returns an explanatory string so the caller always has
/// something to forward. Callers must not treat the result as validated
/// content.
pub async fn draft_body(chat: &ChatClient, recipient: &str, context: &str) -> String {
    let style = prompts::draft_style(&greeting_for(recipient));

    match chat.chat(&style, context).await {
        Ok(body) => body.trim().to_string(),
        Err(err) => {
            warn!(kind = err.kind(), "email drafting failed, forwarding placeholder");
            format!("Error: Could not generate email due to {err}")
        }
    }
}

/// Greeting derived from the recipient's local part; addresses without an
/// `@` get a generic salutation.
pub fn greeting_for(recipient: &str) -> String {
    match recipient.split_once('@') {
        Some((local, _)) if !local.is_empty() => format!("Dear {},", title_case(local)),
        _ => "Hello,".to_string(),
    }
}

fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;

    for ch in input.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets_by_local_part() {
        assert_eq!(greeting_for("john@example.com"), "Dear John,");
        assert_eq!(greeting_for("jane.doe@example.com"), "Dear Jane.Doe,");
    }

    #[test]
    fn falls_back_to_generic_greeting() {
        assert_eq!(greeting_for("not-an-address"), "Hello,");
        assert_eq!(greeting_for("@example.com"), "Hello,");
    }

    #[test]
    fn title_cases_mixed_input() {
        assert_eq!(title_case("jOHN"), "John");
        assert_eq!(title_case("mary-ann"), "Mary-Ann");
    }
}
