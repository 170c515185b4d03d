//! Fixed instruction prompts for the extraction, drafting, and summarize
//! calls. Each target schema gets exactly one prompt; the schema of the
//! expected JSON is spelled out in the prompt itself.

pub const EMAIL_EXTRACT: &str = "\
You are an AI that extracts email details from a given text.
Extract the recipient email, subject, and body.
Ensure the output is strictly in JSON format with no surrounding prose.

Example Output:
{
    \"recipient\": \"john@example.com\",
    \"subject\": \"Meeting Update\",
    \"body\": \"Please join the meeting at 3 PM today.\"
}

If a detail is missing, use null for that key.";

pub const MEETING_EXTRACT: &str = "\
You are an AI that extracts meeting details from text.
Return a JSON object with keys:
- title (string)
- date (YYYY-MM-DD)
- start_time (HH:MM)
- end_time (HH:MM)
- attendees (list of emails)

If any detail is missing, return null for that key.
Always extract correct dates and times in UTC format.";

pub const SUMMARIZE: &str = "Summarize the following email thread in 3-4 sentences:";

/// Style instruction for the body-drafting call. The greeting is fixed by
/// the caller from the recipient address; the subject line is excluded by
/// construction because it travels separately.
pub fn draft_style(greeting: &str) -> String {
    format!(
        "\
You are an expert in drafting professional emails. Based on the provided context,
generate a well-structured email excluding the subject (it is already specified separately).

The email should include:
- Greeting: {greeting}
- Body: Clearly convey the purpose in a professional manner.
- Closing: A polite closing statement, such as 'Best regards, [Your Name]'.

Do not include the subject line in the generated email."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_style_embeds_greeting() {
        let prompt = draft_style("Dear John,");
        assert!(prompt.contains("Greeting: Dear John,"));
        assert!(prompt.contains("excluding the subject"));
    }
}
