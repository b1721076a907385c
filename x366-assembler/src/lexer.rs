use crate::error::{AsmErrorKind, AssembleError};

/// One lexical token. Commas count as whitespace — operand boundaries
/// are recovered by the grammar, so `MOV AX, BX` and `MOV AX BX` lex
/// identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Mnemonic, register name, label reference, `DUP`, syscall name.
    Ident(String),
    /// `name:` — a label definition.
    Label(String),
    /// Decimal, hex (`0x`), binary (`0b`) or character literal.
    Num(i64),
    /// `<n>K` — only meaningful after `.MEMORY`.
    KiloNum(u16),
    /// Double-quoted string with escapes applied.
    Str(Vec<u8>),
    /// Dot-prefixed directive name, without the dot.
    Directive(String),
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `?` — zero inside `DUP(...)`.
    Question,
}

/// The tokens of one source line, with its 1-based number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: u32,
    pub tokens: Vec<Token>,
}

/// Tokenize the whole source, line by line. Blank and comment-only lines
/// are dropped.
pub fn tokenize(source: &str) -> Result<Vec<Line>, AssembleError> {
    let mut lines = Vec::new();

    for (idx, text) in source.lines().enumerate() {
        let number = idx as u32 + 1;
        let tokens =
            tokenize_line(text).map_err(|kind| AssembleError::new(number, kind))?;
        if !tokens.is_empty() {
            lines.push(Line { number, tokens });
        }
    }

    Ok(lines)
}

fn tokenize_line(text: &str) -> Result<Vec<Token>, AsmErrorKind> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ';' => break,
            c if c.is_whitespace() || c == ',' => {
                chars.next();
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '?' => {
                chars.next();
                tokens.push(Token::Question);
            }
            '\'' => {
                chars.next();
                tokens.push(Token::Num(char_literal(&mut chars)? as i64));
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(string_literal(&mut chars)?));
            }
            '.' => {
                chars.next();
                let word = word(&mut chars);
                if word.is_empty() {
                    return Err(AsmErrorKind::MalformedLine(".".into()));
                }
                tokens.push(Token::Directive(word));
            }
            c if c.is_ascii_digit() => {
                let word = word(&mut chars);
                tokens.push(numeric(&word)?);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = word(&mut chars);
                if chars.peek() == Some(&':') {
                    chars.next();
                    tokens.push(Token::Label(word));
                } else {
                    tokens.push(Token::Ident(word));
                }
            }
            other => return Err(AsmErrorKind::MalformedLine(other.to_string())),
        }
    }

    Ok(tokens)
}

/// Maximal run of identifier/number characters.
fn word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

fn numeric(word: &str) -> Result<Token, AsmErrorKind> {
    let bad = || AsmErrorKind::BadNumericLiteral(word.to_string());

    if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map(Token::Num).map_err(|_| bad());
    }
    if let Some(bin) = word.strip_prefix("0b").or_else(|| word.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).map(Token::Num).map_err(|_| bad());
    }
    if let Some(kilo) = word.strip_suffix('K').or_else(|| word.strip_suffix('k')) {
        return kilo.parse::<u16>().map(Token::KiloNum).map_err(|_| bad());
    }

    word.parse::<i64>().map(Token::Num).map_err(|_| bad())
}

fn char_literal(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<u8, AsmErrorKind> {
    let c = chars.next().ok_or(AsmErrorKind::BadCharLiteral)?;
    let value = if c == '\\' {
        let esc = chars.next().ok_or(AsmErrorKind::BadCharLiteral)?;
        escape(esc).ok_or(AsmErrorKind::BadCharLiteral)?
    } else if c.is_ascii() && c != '\'' {
        c as u8
    } else {
        return Err(AsmErrorKind::BadCharLiteral);
    };

    match chars.next() {
        Some('\'') => Ok(value),
        _ => Err(AsmErrorKind::BadCharLiteral),
    }
}

fn string_literal(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Vec<u8>, AsmErrorKind> {
    let mut out = Vec::new();

    loop {
        match chars.next() {
            None => return Err(AsmErrorKind::BadStringLiteral),
            Some('"') => return Ok(out),
            Some('\\') => {
                let esc = chars.next().ok_or(AsmErrorKind::BadStringLiteral)?;
                let value = match esc {
                    '"' => b'"',
                    other => escape(other).ok_or(AsmErrorKind::BadStringLiteral)?,
                };
                out.push(value);
            }
            Some(c) if c.is_ascii() => out.push(c as u8),
            Some(_) => return Err(AsmErrorKind::BadStringLiteral),
        }
    }
}

fn escape(c: char) -> Option<u8> {
    match c {
        'n' => Some(b'\n'),
        't' => Some(b'\t'),
        'r' => Some(b'\r'),
        '0' => Some(0),
        '\\' => Some(b'\\'),
        '\'' => Some(b'\''),
        _ => None,
    }
}
