//! Recursive descent selector parser.
//!
//! Parses selector text into a [`SelectorList`]. Uses the logos-based
//! tokenizer from [`crate::css::tokenizer`] with byte spans kept so that
//! descendant combinators (whitespace) can be told apart from compound
//! continuation.

use logos::Logos;

use crate::css::model::*;
use crate::css::tokenizer::Token;

/// Errors from selector parsing. The native engine rejects the selector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid character at byte {position}")]
    InvalidCharacter { position: usize },
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("unsupported pseudo-class ':{0}'")]
    UnsupportedPseudoClass(String),
    #[error("invalid an+b expression '{0}'")]
    InvalidNth(String),
}

/// A positioned token with byte-level span information for whitespace detection.
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    /// Index in the token stream (for error reporting).
    pos: usize,
    /// Byte offset where this token starts in the source.
    byte_start: usize,
    /// Byte offset where this token ends in the source.
    byte_end: usize,
}

/// Tokenize input using logos with span information preserved.
fn tokenize_with_spans(input: &str) -> Result<Vec<PToken>, SelectorError> {
    let lexer = Token::lexer(input);
    let mut tokens = Vec::new();

    for (idx, (result, span)) in lexer.spanned().enumerate() {
        let token = result.map_err(|_| SelectorError::InvalidCharacter {
            position: span.start,
        })?;
        tokens.push(PToken {
            text: input[span.clone()].to_string(),
            token,
            pos: idx,
            byte_start: span.start,
            byte_end: span.end,
        });
    }

    Ok(tokens)
}

/// Parse a selector string into a [`SelectorList`].
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorError> {
    let tokens = tokenize_with_spans(input)?;
    if tokens.is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut parser = Parser {
        source: input,
        tokens,
        cursor: 0,
    };
    let list = parser.parse_list()?;

    if let Some(tok) = parser.peek() {
        return Err(SelectorError::UnexpectedToken {
            position: tok.pos,
            message: format!("expected ',' or end of selector, got '{}'", tok.text),
        });
    }

    Ok(list)
}

/// Recursive descent parser state.
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn current_pos(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.tokens.len())
    }

    /// Returns `true` if the current token is immediately adjacent (no whitespace)
    /// to the previous token.
    fn is_adjacent(&self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = &self.tokens[self.cursor - 1];
        match self.peek() {
            Some(curr) => curr.byte_start == prev.byte_end,
            None => false,
        }
    }

    fn unexpected(tok: &PToken, expected: &str) -> SelectorError {
        SelectorError::UnexpectedToken {
            position: tok.pos,
            message: format!("expected {expected}, got {:?} '{}'", tok.token, tok.text),
        }
    }

    /// Parse a comma-separated list of selectors.
    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = vec![self.parse_selector()?];

        while self.peek().is_some_and(|t| t.token == Token::Comma) {
            self.advance(); // consume comma
            selectors.push(self.parse_selector()?);
        }

        Ok(SelectorList { selectors })
    }

    /// Parse a single selector: a sequence of compound selectors with combinators.
    ///
    /// A selector like `ul > li.item` becomes parts:
    /// - SelectorPart::Compound([Type("ul")])
    /// - SelectorPart::Combinator(Child)
    /// - SelectorPart::Compound([Type("li"), Class("item")])
    fn parse_selector(&mut self) -> Result<Selector, SelectorError> {
        let mut parts = vec![SelectorPart::Compound(self.parse_compound_selector()?)];

        loop {
            let combinator = match self.peek().map(|t| &t.token) {
                Some(Token::GreaterThan) => Combinator::Child,
                Some(Token::Plus) => Combinator::NextSibling,
                Some(Token::Tilde) => Combinator::SubsequentSibling,
                // A selector-starting token that was not absorbed by the
                // compound selector must be separated by whitespace.
                Some(
                    Token::Ident
                    | Token::Hash
                    | Token::Dot
                    | Token::Star
                    | Token::PseudoClass
                    | Token::BracketOpen,
                ) => {
                    parts.push(SelectorPart::Combinator(Combinator::Descendant));
                    parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
                    continue;
                }
                _ => break,
            };
            self.advance();
            parts.push(SelectorPart::Combinator(combinator));
            parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
        }

        Ok(Selector { parts })
    }

    /// Parse a compound selector: a type/universal selector and/or subclass
    /// selectors with no whitespace between them, e.g. `li.item:first-child`.
    fn parse_compound_selector(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut compound = CompoundSelector::new();

        match self.peek() {
            Some(t) if t.token == Token::Ident => {
                let name = t.text.to_ascii_lowercase();
                self.advance();
                compound.push(SelectorComponent::Type(name));
            }
            Some(t) if t.token == Token::Star => {
                self.advance();
                compound.push(SelectorComponent::Universal);
            }
            Some(_) => match self.parse_subclass()? {
                Some(component) => compound.push(component),
                None => {
                    return Err(SelectorError::UnexpectedToken {
                        position: self.current_pos(),
                        message: "expected selector part".into(),
                    });
                }
            },
            None => {
                return Err(SelectorError::UnexpectedEof("expected selector part".into()));
            }
        }

        // Continue appending to this compound only while the next token is
        // adjacent (no whitespace gap).
        while self.is_adjacent() {
            match self.parse_subclass()? {
                Some(component) => compound.push(component),
                None => break,
            }
        }

        Ok(compound)
    }

    /// Parse one `.class`, `#id`, `[attr]` or `:pseudo` component. Returns
    /// `None` without consuming anything if the next token starts none of them.
    fn parse_subclass(&mut self) -> Result<Option<SelectorComponent>, SelectorError> {
        let Some(tok) = self.peek().cloned() else {
            return Ok(None);
        };
        let component = match tok.token {
            Token::Dot => {
                self.advance();
                SelectorComponent::Class(self.expect_adjacent_ident("class name after '.'")?)
            }
            Token::Hash => {
                self.advance();
                SelectorComponent::Id(self.expect_adjacent_ident("id after '#'")?)
            }
            Token::BracketOpen => {
                self.advance();
                SelectorComponent::Attribute(self.parse_attribute()?)
            }
            Token::PseudoClass => {
                self.advance();
                SelectorComponent::PseudoClass(self.parse_pseudo_class(&tok)?)
            }
            Token::DoubleColon | Token::Colon => return Err(Self::unexpected(&tok, "pseudo-class name")),
            _ => return Ok(None),
        };
        Ok(Some(component))
    }

    fn expect_adjacent_ident(&mut self, what: &str) -> Result<String, SelectorError> {
        if !self.is_adjacent() {
            return match self.peek() {
                Some(tok) => Err(Self::unexpected(tok, what)),
                None => Err(SelectorError::UnexpectedEof(format!("expected {what}"))),
            };
        }
        match self.advance() {
            Some(tok) if tok.token == Token::Ident => Ok(tok.text),
            Some(tok) => Err(Self::unexpected(&tok, what)),
            None => Err(SelectorError::UnexpectedEof(format!("expected {what}"))),
        }
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed.
    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let name = match self.advance() {
            Some(tok) if tok.token == Token::Ident => tok.text.to_ascii_lowercase(),
            Some(tok) => return Err(Self::unexpected(&tok, "attribute name")),
            None => return Err(SelectorError::UnexpectedEof("expected attribute name".into())),
        };

        let op = match self.advance() {
            Some(tok) => match tok.token {
                Token::BracketClose => return Ok(AttributeSelector { name, condition: None }),
                Token::Equals => AttributeOp::Equals,
                Token::Includes => AttributeOp::Includes,
                Token::DashMatch => AttributeOp::DashMatch,
                Token::PrefixMatch => AttributeOp::Prefix,
                Token::SuffixMatch => AttributeOp::Suffix,
                Token::SubstringMatch => AttributeOp::Substring,
                _ => return Err(Self::unexpected(&tok, "attribute operator or ']'")),
            },
            None => return Err(SelectorError::UnexpectedEof("expected ']'".into())),
        };

        let value = match self.advance() {
            Some(tok) => match tok.token {
                Token::Ident | Token::Number => tok.text,
                Token::StringLiteral | Token::StringLiteralSingle => {
                    tok.text[1..tok.text.len() - 1].to_string()
                }
                _ => return Err(Self::unexpected(&tok, "attribute value")),
            },
            None => return Err(SelectorError::UnexpectedEof("expected attribute value".into())),
        };

        match self.advance() {
            Some(tok) if tok.token == Token::BracketClose => Ok(AttributeSelector {
                name,
                condition: Some((op, value)),
            }),
            Some(tok) => Err(Self::unexpected(&tok, "']'")),
            None => Err(SelectorError::UnexpectedEof("expected ']'".into())),
        }
    }

    /// Map a pseudo-class token (already consumed) to a [`PseudoClass`],
    /// consuming a parenthesized argument when one follows immediately.
    fn parse_pseudo_class(&mut self, tok: &PToken) -> Result<PseudoClass, SelectorError> {
        let name = tok.text[1..].to_ascii_lowercase();
        let argument = if self.is_adjacent() && self.peek().is_some_and(|t| t.token == Token::ParenOpen) {
            Some(self.take_parenthesized()?)
        } else {
            None
        };

        let pseudo = match (name.as_str(), argument) {
            ("first-child", None) => PseudoClass::FirstChild,
            ("last-child", None) => PseudoClass::LastChild,
            ("only-child", None) => PseudoClass::OnlyChild,
            ("first-of-type", None) => PseudoClass::FirstOfType,
            ("last-of-type", None) => PseudoClass::LastOfType,
            ("empty", None) => PseudoClass::Empty,
            ("root", None) => PseudoClass::Root,
            ("checked", None) => PseudoClass::Checked,
            ("disabled", None) => PseudoClass::Disabled,
            ("enabled", None) => PseudoClass::Enabled,
            ("nth-child", Some(arg)) => PseudoClass::NthChild(parse_nth(&arg)?),
            ("nth-last-child", Some(arg)) => PseudoClass::NthLastChild(parse_nth(&arg)?),
            ("not", Some(arg)) => PseudoClass::Not(parse_selector_list(&arg)?),
            _ => return Err(SelectorError::UnsupportedPseudoClass(name)),
        };
        Ok(pseudo)
    }

    /// Consume `( ... )` with balanced nesting and return the raw source
    /// between the parentheses.
    fn take_parenthesized(&mut self) -> Result<String, SelectorError> {
        let open = match self.advance() {
            Some(tok) => tok,
            None => return Err(SelectorError::UnexpectedEof("expected '('".into())),
        };
        let mut depth = 1usize;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::ParenOpen => depth += 1,
                Token::ParenClose => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.source[open.byte_end..tok.byte_start].trim().to_string());
                    }
                }
                _ => {}
            }
        }
        Err(SelectorError::UnexpectedEof("expected ')'".into()))
    }
}

/// Parse an `an+b` expression, `odd`, `even` or a plain integer.
fn parse_nth(input: &str) -> Result<Nth, SelectorError> {
    let invalid = || SelectorError::InvalidNth(input.to_string());
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.to_ascii_lowercase();

    match compact.as_str() {
        "" => return Err(invalid()),
        "odd" => return Ok(Nth { step: 2, offset: 1 }),
        "even" => return Ok(Nth { step: 2, offset: 0 }),
        _ => {}
    }

    let Some(n_at) = compact.find('n') else {
        let offset = compact.parse::<i32>().map_err(|_| invalid())?;
        return Ok(Nth { step: 0, offset });
    };

    let step = match &compact[..n_at] {
        "" | "+" => 1,
        "-" => -1,
        digits => digits.parse::<i32>().map_err(|_| invalid())?,
    };
    let rest = &compact[n_at + 1..];
    let offset = if rest.is_empty() {
        0
    } else {
        if !rest.starts_with(['+', '-']) {
            return Err(invalid());
        }
        rest.parse::<i32>().map_err(|_| invalid())?
    };

    Ok(Nth { step, offset })
}
