//! SQL scanner.
//!
//! Turns the up section of a migration into one token list per statement.
//! Comments are dropped and whitespace is only a separator, which gives the
//! statement parser a minified view of the input. String literals,
//! quoted identifiers and dollar-quoted bodies are kept whole, so a `;` or
//! `--` inside them never splits a statement.

/// A lexical unit of SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word: keyword, identifier or number.
    Word(String),
    /// Double-quoted identifier, without the quotes.
    Quoted(String),
    /// Single-quoted or dollar-quoted literal, without the quotes.
    Str(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// Any other punctuation.
    Symbol(char),
}

impl Token {
    /// Returns `true` if this is the given keyword, ignoring case.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Returns the identifier text of a bare or quoted word.
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        match self {
            Self::Word(w) | Self::Quoted(w) => Some(w),
            _ => None,
        }
    }
}

/// A character scanner over SQL text.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    /// Scans a quoted run; a doubled quote inside is an escaped quote.
    fn scan_quoted(&mut self, quote: char) -> String {
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.advance() {
            if c == quote {
                if self.peek() == Some(quote) {
                    self.advance();
                    text.push(quote);
                    continue;
                }
                break;
            }
            text.push(c);
        }
        text
    }

    /// Scans `$tag$ ... $tag$`. Returns `None` (without consuming) if the
    /// `$` does not open a dollar quote.
    fn scan_dollar_quoted(&mut self) -> Option<String> {
        let rest = &self.input[self.pos + 1..];
        let tag_len = rest.find('$')?;
        let tag = &rest[..tag_len];
        if !tag.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        let delimiter = format!("${tag}$");
        let body_start = self.pos + delimiter.len();
        let body_len = self.input[body_start..].find(&delimiter)?;
        let body = self.input[body_start..body_start + body_len].to_string();
        self.pos = body_start + body_len + delimiter.len();
        Some(body)
    }

    fn scan_word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$')
        {
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        let c = self.peek()?;

        let token = match c {
            '\'' => Token::Str(self.scan_quoted('\'')),
            '"' => Token::Quoted(self.scan_quoted('"')),
            '$' => match self.scan_dollar_quoted() {
                Some(body) => Token::Str(body),
                None => {
                    self.advance();
                    Token::Symbol('$')
                }
            },
            '(' | ')' | ',' | ';' => {
                self.advance();
                match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    _ => Token::Semicolon,
                }
            }
            c if c.is_alphanumeric() || c == '_' => Token::Word(self.scan_word()),
            _ => {
                self.advance();
                Token::Symbol(c)
            }
        };
        Some(token)
    }
}

/// Splits SQL text into statements, one token list each.
///
/// Empty statements (stray `;`) are dropped.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<Vec<Token>> {
    let mut scanner = Scanner::new(sql);
    let mut statements = Vec::new();
    let mut current = Vec::new();

    while let Some(token) = scanner.next_token() {
        if token == Token::Semicolon {
            if !current.is_empty() {
                statements.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        statements.push(current);
    }
    statements
}

/// Splits a token list on commas at parenthesis depth zero.
#[must_use]
pub fn split_top_level_commas(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts.retain(|part| !part.is_empty());
    parts
}

/// Renders tokens back to SQL text with normalized spacing.
///
/// `DECIMAL ( 10 , 2 )` becomes `DECIMAL(10, 2)`; `'a' :: text` becomes
/// `'a'::text`.
#[must_use]
pub fn render(tokens: &[Token]) -> String {
    render_tokens(tokens, true)
}

/// Like [`render`], but quoted identifiers lose their quotes. Used for
/// type names, which are compared case-insensitively anyway.
#[must_use]
pub fn render_type(tokens: &[Token]) -> String {
    render_tokens(tokens, false)
}

fn render_tokens(tokens: &[Token], keep_quotes: bool) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;

    for token in tokens {
        let glue = match (prev, token) {
            (None, _)
            | (Some(Token::LParen | Token::Symbol(_)), _)
            | (_, Token::RParen | Token::Comma | Token::Symbol(_)) => false,
            (Some(Token::Word(_) | Token::Quoted(_)), Token::LParen) => false,
            _ => true,
        };
        if glue {
            out.push(' ');
        }
        match token {
            Token::Word(w) => out.push_str(w),
            Token::Quoted(q) if keep_quotes => {
                out.push('"');
                out.push_str(&q.replace('"', "\"\""));
                out.push('"');
            }
            Token::Quoted(q) => out.push_str(q),
            Token::Str(s) => {
                out.push('\'');
                out.push_str(&s.replace('\'', "''"));
                out.push('\'');
            }
            Token::LParen => out.push('('),
            Token::RParen => out.push(')'),
            Token::Comma => out.push(','),
            Token::Semicolon => out.push(';'),
            Token::Symbol(c) => out.push(*c),
        }
        prev = Some(token);
    }
    out
}
