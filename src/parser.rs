use regex::{Captures, Regex};
use std::sync::LazyLock;

static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!(\w+)\s*").expect("priority marker pattern"));
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

#[derive(Debug, PartialEq)]
pub struct ParsedTask {
    pub title: String,
    pub priority: Option<String>,
}

/// Pulls `!label` priority markers out of a quick-add title. Labels match the
/// configured priorities case-insensitively; the first valid one wins. A
/// `!word` that names no priority stays in the title as typed.
pub fn parse_task_input(input: &str, priorities: &[String]) -> ParsedTask {
    let mut priority = None;

    let title = PRIORITY_RE.replace_all(input, |caps: &Captures| {
        let found = priorities
            .iter()
            .find(|p| p.eq_ignore_ascii_case(&caps[1]));
        match found {
            Some(p) => {
                if priority.is_none() {
                    priority = Some(p.clone());
                }
                String::new()
            }
            None => caps[0].to_string(),
        }
    });
    let title = SPACES_RE.replace_all(&title, " ").trim().to_string();

    ParsedTask { title, priority }
}
