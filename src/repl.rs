use nu_ansi_term::{Color, Style};
use reedline::{
    Highlighter, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    StyledText, ValidationResult, Validator,
};
use std::borrow::Cow;

use crate::tokenizer::{Lexer, Token, TokenKind};

#[derive(Clone)]
pub struct ReplPrompt;

impl Prompt for ReplPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed("monkey")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("» ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("  ... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

/// Keeps the editor reading while a string literal or any `({[` delimiter
/// is still open, so multi-line input works without a continuation marker.
pub struct ReplValidator;

impl Validator for ReplValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        if line.trim_end().is_empty() {
            return ValidationResult::Complete;
        }

        let mut delimiters = Vec::new();
        let mut in_string = false;

        // Strings have no escape sequences, so a bare quote always toggles.
        for c in line.chars() {
            match c {
                '"' => in_string = !in_string,
                _ if in_string => {}

                '{' | '(' | '[' => delimiters.push(c),
                '}' => {
                    if delimiters.pop() != Some('{') {
                        return ValidationResult::Complete;
                    }
                }
                ')' => {
                    if delimiters.pop() != Some('(') {
                        return ValidationResult::Complete;
                    }
                }
                ']' => {
                    if delimiters.pop() != Some('[') {
                        return ValidationResult::Complete;
                    }
                }

                _ => {}
            }
        }

        if in_string || !delimiters.is_empty() {
            ValidationResult::Incomplete
        } else {
            ValidationResult::Complete
        }
    }
}

pub static KEYWORD_COLOR: Color = Color::LightBlue;
pub static LITERAL_COLOR: Color = Color::Yellow;
pub static DEFAULT_COLOR: Color = Color::White;
pub static OPERATOR_COLOR: Color = Color::DarkGray;

pub struct SyntaxHighlighter;

impl Highlighter for SyntaxHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();
        let mut remaining = line;

        for token in Lexer::new(line) {
            let token_str = match token.kind {
                // The lexeme in the source still carries its quotes.
                TokenKind::String => format!("\"{}\"", token.literal),
                _ => token.literal.clone(),
            };

            if let Some(pos) = remaining.find(&token_str) {
                if pos > 0 {
                    styled_text
                        .push((Style::new().fg(DEFAULT_COLOR), remaining[..pos].to_string()));
                }

                styled_text.push((Style::new().fg(color_for(&token)), token_str.clone()));
                remaining = &remaining[pos + token_str.len()..];
            }
        }

        if !remaining.is_empty() {
            styled_text.push((Style::new().fg(DEFAULT_COLOR), remaining.to_string()));
        }

        styled_text
    }
}

fn color_for(token: &Token) -> Color {
    match token.kind {
        TokenKind::Let
        | TokenKind::Function
        | TokenKind::If
        | TokenKind::Else
        | TokenKind::Return
        | TokenKind::True
        | TokenKind::False => KEYWORD_COLOR,

        TokenKind::Int | TokenKind::String => LITERAL_COLOR,

        TokenKind::Assign
        | TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Bang
        | TokenKind::Asterisk
        | TokenKind::Slash
        | TokenKind::Lt
        | TokenKind::Gt
        | TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Comma
        | TokenKind::Semicolon
        | TokenKind::Colon
        | TokenKind::LParen
        | TokenKind::RParen
        | TokenKind::LBrace
        | TokenKind::RBrace
        | TokenKind::LBracket
        | TokenKind::RBracket => OPERATOR_COLOR,

        _ => DEFAULT_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_balanced_input_is_complete() {
        let validator = ReplValidator;
        assert!(matches!(
            validator.validate("let x = [1, 2];"),
            ValidationResult::Complete
        ));
    }

    #[test]
    fn test_validator_open_delimiters_are_incomplete() {
        let validator = ReplValidator;
        for line in ["let add = fn(x, y) {", "[1, 2,", "add(1,"] {
            assert!(
                matches!(validator.validate(line), ValidationResult::Incomplete),
                "line: {:?}",
                line
            );
        }
    }

    #[test]
    fn test_validator_open_string_is_incomplete() {
        let validator = ReplValidator;
        assert!(matches!(
            validator.validate("let s = \"hello"),
            ValidationResult::Incomplete
        ));
    }

    #[test]
    fn test_validator_brackets_inside_string_are_ignored() {
        let validator = ReplValidator;
        assert!(matches!(
            validator.validate("let s = \"({[\";"),
            ValidationResult::Complete
        ));
    }
}
