//! Natural-language summary sentences for alternative pages.

use crate::models::ToolPayload;
use crate::ranking::CategoryCount;

/// Join items into an English list: `"a"`, `"a and b"`, `"a, b and c"`.
///
/// `last_word` is the conjunction placed before the final item.
///
/// ```
/// use openalt_core::summary::join_as_sentence;
///
/// assert_eq!(join_as_sentence(&["GIMP", "Krita", "Inkscape"], "and"), "GIMP, Krita and Inkscape");
/// assert_eq!(join_as_sentence(&["a", "b"], "or"), "a or b");
/// ```
pub fn join_as_sentence<S: AsRef<str>>(items: &[S], last_word: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{} {} {}", head.join(", "), last_word, last.as_ref())
        }
    }
}

/// Sentences describing the tools that replace an alternative.
///
/// `tools` is expected in ranking order and `categories` already ranked
/// (see [`rank_categories`](crate::ranking::rank_categories)). Returns no
/// sentences when there are no tools.
pub fn alternative_summary(
    alternative: &str,
    tools: &[ToolPayload],
    categories: &[CategoryCount],
) -> Vec<String> {
    let mut sentences = Vec::new();

    let Some((best, others)) = tools.split_first() else {
        return sentences;
    };

    sentences.push(format!(
        "The best open source alternative to {} is {}.",
        alternative, best.tool.name
    ));

    if !others.is_empty() {
        let names: Vec<&str> = others.iter().map(|p| p.tool.name.as_str()).collect();
        sentences.push(format!(
            "Other interesting open source alternatives to {} are: {}.",
            alternative,
            join_as_sentence(&names, "and")
        ));
    }

    if let Some((main, rest)) = categories.split_first() {
        let main_label = main.category.display_label();
        if rest.is_empty() {
            sentences.push(format!(
                "{} alternatives are mainly {}.",
                alternative, main_label
            ));
        } else {
            let labels: Vec<&str> = rest
                .iter()
                .take(3)
                .map(|c| c.category.display_label())
                .collect();
            sentences.push(format!(
                "{} alternatives are mainly {} but may also be {}.",
                alternative,
                main_label,
                join_as_sentence(&labels, "or")
            ));
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Tool};

    fn payload(name: &str) -> ToolPayload {
        ToolPayload {
            tool: Tool {
                id: name.to_lowercase(),
                name: name.to_string(),
                slug: name.to_lowercase(),
                description: None,
                website: "https://example.com".into(),
                repository: None,
                score: 0,
                stars: 0,
                published_at: Some(0),
                last_commit_at: None,
                created_at: 0,
                updated_at: 0,
            },
            categories: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    fn count(label: &str, count: usize) -> CategoryCount {
        CategoryCount {
            category: Category {
                id: label.to_lowercase(),
                name: label.to_string(),
                slug: label.to_lowercase(),
                label: Some(format!("{} Tools", label)),
                created_at: 0,
                updated_at: 0,
            },
            count,
        }
    }

    #[test]
    fn test_join_as_sentence() {
        let empty: [&str; 0] = [];
        assert_eq!(join_as_sentence(&empty, "and"), "");
        assert_eq!(join_as_sentence(&["a"], "and"), "a");
        assert_eq!(join_as_sentence(&["a", "b", "c", "d"], "and"), "a, b, c and d");
    }

    #[test]
    fn test_summary_empty_tools() {
        assert!(alternative_summary("Slack", &[], &[]).is_empty());
    }

    #[test]
    fn test_summary_single_tool() {
        let sentences = alternative_summary("Slack", &[payload("Mattermost")], &[]);
        assert_eq!(
            sentences,
            vec!["The best open source alternative to Slack is Mattermost."]
        );
    }

    #[test]
    fn test_summary_full() {
        let tools = vec![payload("Mattermost"), payload("Zulip"), payload("Rocket.Chat")];
        let cats = vec![count("Chat", 3), count("Video", 1), count("Forum", 1)];
        let sentences = alternative_summary("Slack", &tools, &cats);
        assert_eq!(sentences.len(), 3);
        assert_eq!(
            sentences[1],
            "Other interesting open source alternatives to Slack are: Zulip and Rocket.Chat."
        );
        assert_eq!(
            sentences[2],
            "Slack alternatives are mainly Chat Tools but may also be Video Tools or Forum Tools."
        );
    }
}
