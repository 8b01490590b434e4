//! The fixed tutoring preamble wrapped around every user prompt.
//!
//! The template is compiled in and not user-editable. The prompt is
//! substituted verbatim; JSON string encoding of the request body is the
//! only escaping applied.

const USER_INPUT_VAR: &str = "{{user_input}}";

pub const TUTOR_TEMPLATE: &str = "You are a Japanese language tutor. \
Teach the user Japanese with explanations and examples.\n\
Make sure to explain grammar, vocabulary, and provide example sentences.\n\
User input: \"{{user_input}}\"";

/// Render the tutoring template around `prompt`.
pub fn render(prompt: &str) -> String {
    // Single substitution so placeholders inside `prompt` stay literal.
    match TUTOR_TEMPLATE.split_once(USER_INPUT_VAR) {
        Some((head, tail)) => {
            let mut out = String::with_capacity(TUTOR_TEMPLATE.len() + prompt.len());
            out.push_str(head);
            out.push_str(prompt);
            out.push_str(tail);
            out
        }
        None => format!("{TUTOR_TEMPLATE}\n{prompt}"),
    }
}
