/// Reference line prepended to pull request descriptions.
pub fn reference_line(story_url: &str) -> String {
    format!("Pivotal: {}\r\n\r\n", story_url)
}

/// Prepends the story reference to `body`. Returns `None` when the body
/// already starts with it, so a redelivered event leaves it alone.
pub fn with_story_reference(body: Option<&str>, story_url: &str) -> Option<String> {
    let body = body.unwrap_or("");
    let reference = reference_line(story_url);
    if body.starts_with(&reference) {
        return None;
    }
    Some(format!("{}{}", reference, body))
}
