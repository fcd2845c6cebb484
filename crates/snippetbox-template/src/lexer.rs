//! Template lexer (tokenizer).
//!
//! Converts raw template source text into a stream of [`Token`]s representing
//! text literals, variable references (`{{ }}`), block tags (`{% %}`), and
//! comments (`{# #}`).

use crate::error::TemplateError;

/// A token produced by the template lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A literal text segment.
    Text(String),
    /// A variable expression: `{{ expression }}`.
    Variable(String),
    /// A block tag: `{% tag arg1 arg2 %}`. Contains the tag name and its arguments.
    Block(String, Vec<String>),
    /// A comment: `{# comment text #}`.
    Comment(String),
}

#[derive(Debug, Clone, Copy)]
enum TagType {
    Variable,
    Block,
    Comment,
}

impl TagType {
    const fn closer(self) -> &'static str {
        match self {
            Self::Variable => "}}",
            Self::Block => "%}",
            Self::Comment => "#}",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Block => "block",
            Self::Comment => "comment",
        }
    }
}

/// Tokenizes a template source string into a sequence of [`Token`]s.
///
/// # Errors
///
/// Returns [`TemplateError::Syntax`] if a tag, variable or comment is opened
/// but never closed. The message carries the 1-based line of the opener.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut remaining = source;
    let mut consumed = 0;

    while let Some((pos, tag_type)) = find_next_open(remaining) {
        if pos > 0 {
            tokens.push(Token::Text(remaining[..pos].to_string()));
        }

        let after_open = &remaining[pos + 2..];
        let Some(end) = after_open.find(tag_type.closer()) else {
            let line = source[..consumed + pos].matches('\n').count() + 1;
            return Err(TemplateError::syntax(format!(
                "Unclosed {} tag at line {line}: expected '{}'",
                tag_type.label(),
                tag_type.closer()
            )));
        };

        let content = after_open[..end].trim();
        tokens.push(match tag_type {
            TagType::Variable => Token::Variable(content.to_string()),
            TagType::Block => parse_block_content(content),
            TagType::Comment => Token::Comment(content.to_string()),
        });

        let advance = pos + 2 + end + 2;
        consumed += advance;
        remaining = &remaining[advance..];
    }

    if !remaining.is_empty() {
        tokens.push(Token::Text(remaining.to_string()));
    }

    Ok(tokens)
}

/// Finds the next template tag opening in the source.
fn find_next_open(s: &str) -> Option<(usize, TagType)> {
    [
        ("{{", TagType::Variable),
        ("{%", TagType::Block),
        ("{#", TagType::Comment),
    ]
    .into_iter()
    .filter_map(|(opener, tag_type)| s.find(opener).map(|pos| (pos, tag_type)))
    .min_by_key(|(pos, _)| *pos)
}

/// Parses the content inside `{% ... %}` into a `Token::Block`.
fn parse_block_content(content: &str) -> Token {
    let mut parts = split_block_args(content).into_iter();
    let tag = parts.next().unwrap_or_default();
    Token::Block(tag, parts.collect())
}

/// Splits block tag content on whitespace, keeping quoted strings whole.
fn split_block_args(content: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for ch in content.chars() {
        match ch {
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                current.push(ch);
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let tokens = tokenize("Hello world").unwrap();
        assert_eq!(tokens, vec![Token::Text("Hello world".to_string())]);
    }

    #[test]
    fn test_variable_with_filter() {
        let tokens = tokenize("{{ snippet.title|upper }}").unwrap();
        assert_eq!(tokens, vec![Token::Variable("snippet.title|upper".to_string())]);
    }

    #[test]
    fn test_mixed_content() {
        let tokens = tokenize("Hi {{ name }}! {% if flash %}x{% endif %}{# note #}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("Hi ".to_string()),
                Token::Variable("name".to_string()),
                Token::Text("! ".to_string()),
                Token::Block("if".to_string(), vec!["flash".to_string()]),
                Token::Text("x".to_string()),
                Token::Block("endif".to_string(), vec![]),
                Token::Comment("note".to_string()),
            ]
        );
    }

    #[test]
    fn test_unclosed_tags_report_line() {
        let err = tokenize("line one\nline two {{ name ").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Syntax("Unclosed variable tag at line 2: expected '}}'".into())
        );
        assert!(tokenize("{% if ").is_err());
        assert!(tokenize("{# comment ").is_err());
    }

    #[test]
    fn test_block_with_quoted_string() {
        let tokens = tokenize(r#"{% include "nav html.html" %}"#).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Block(
                "include".to_string(),
                vec!["\"nav html.html\"".to_string()]
            )]
        );
    }

    #[test]
    fn test_empty_template() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_adjacent_tags() {
        let tokens = tokenize("{{ a }}{{ b }}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Variable("a".to_string()),
                Token::Variable("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_multiline_block_args() {
        let tokens = tokenize("{% for s in\n  snippets %}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Block(
                "for".to_string(),
                vec!["s".to_string(), "in".to_string(), "snippets".to_string()]
            )]
        );
    }

    #[test]
    fn test_text_with_braces() {
        let tokens = tokenize("a { b } c").unwrap();
        assert_eq!(tokens, vec![Token::Text("a { b } c".to_string())]);
    }
}
