//! Leaf-name extraction from Newick trees.
//!
//! Only leaf names are needed to decide which genomes take part in a split, so
//! branch lengths, internal node labels and comments are skipped.

use crate::parsing::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Comma,
    Colon,
    Label(String),
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            ',' => tokens.push(Token::Comma),
            ':' => tokens.push(Token::Colon),
            ';' => break,
            '[' => {
                // Comment
                if !chars.by_ref().any(|c| c == ']') {
                    return Err(ParseError::InvalidFormat(
                        "unterminated comment in Newick tree".to_string(),
                    ));
                }
            }
            '\'' => {
                let mut label = String::new();
                loop {
                    match chars.next() {
                        // '' is an escaped quote
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            label.push('\'');
                        }
                        Some('\'') => break,
                        Some(c) => label.push(c),
                        None => {
                            return Err(ParseError::InvalidFormat(
                                "unterminated quoted label in Newick tree".to_string(),
                            ))
                        }
                    }
                }
                tokens.push(Token::Label(label));
            }
            c if c.is_whitespace() => {}
            c => {
                let mut label = String::from(c);
                while let Some(&next) = chars.peek() {
                    if matches!(next, '(' | ')' | ',' | ':' | ';' | '[') || next.is_whitespace() {
                        break;
                    }
                    label.push(next);
                    chars.next();
                }
                tokens.push(Token::Label(label));
            }
        }
    }

    Ok(tokens)
}

/// Extract leaf names from a Newick tree, in the order they appear.
///
/// A label is a leaf when it directly follows `(`, `,` or the start of the tree;
/// labels after `)` name internal nodes and labels after `:` are branch lengths.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if parentheses are unbalanced, a quote or
/// comment is unterminated, or the tree has no leaves.
pub fn leaf_names(text: &str) -> Result<Vec<String>, ParseError> {
    let tokens = tokenize(text)?;
    let mut leaves = Vec::new();
    let mut depth: usize = 0;
    let mut previous: Option<&Token> = None;

    for token in &tokens {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ParseError::InvalidFormat("unbalanced ')' in Newick tree".to_string())
                })?;
            }
            Token::Label(label) => {
                if matches!(previous, None | Some(Token::Open | Token::Comma)) {
                    leaves.push(label.clone());
                }
            }
            Token::Comma | Token::Colon => {}
        }
        previous = Some(token);
    }

    if depth != 0 {
        return Err(ParseError::InvalidFormat(
            "unbalanced '(' in Newick tree".to_string(),
        ));
    }
    if leaves.is_empty() {
        return Err(ParseError::InvalidFormat(
            "Newick tree has no leaves".to_string(),
        ));
    }

    Ok(leaves)
}
