//! Formula parser
//!
//! A recursive descent parser for spreadsheet formulas with operator precedence. Reference
//! nodes record the byte span of their token in the text handed to [`parse_formula`], so
//! callers can rewrite references in place.

use crate::ast::{
    BinaryOperator, CellReference, FormulaExpr, RangeReference, SheetQualifier, Span,
    UnaryOperator,
};
use crate::error::{FormulaError, FormulaResult};
use cellbind_core::{CellError, Reference, Sheet};

/// Parse a formula string into an AST. The leading `=` is optional.
///
/// # Example
/// ```rust
/// use cellbind_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let body = formula.trim_start();
    let mut start = formula.len() - body.len();
    if body.starts_with('=') {
        start += 1;
    }

    let mut parser = FormulaParser::new(formula, start);
    if matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse("Empty formula".into()));
    }
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected characters after expression: '{}'",
            &parser.input[parser.span.start..]
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    Identifier(String),        // Function name or named range
    CellRef(String),           // Cell reference like A1, $A$1
    SheetRef(SheetQualifier),  // Sheet prefix like Sheet1!, 'My Sheet'! or 2!

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    /// Character that starts no token
    Unknown(char),

    // End of input
    Eof,
}

fn single_char_token(c: char) -> Option<Token> {
    let token = match c {
        '+' => Token::Plus,
        '-' => Token::Minus,
        '*' => Token::Star,
        '/' => Token::Slash,
        '^' => Token::Caret,
        '%' => Token::Percent,
        '&' => Token::Ampersand,
        ':' => Token::Colon,
        ',' => Token::Comma,
        ';' => Token::Semicolon,
        '(' => Token::LeftParen,
        ')' => Token::RightParen,
        '{' => Token::LeftBrace,
        '}' => Token::RightBrace,
        '=' => Token::Equal,
        _ => return None,
    };
    Some(token)
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    /// Span of the current token
    span: Span,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, start: usize) -> Self {
        let mut parser = Self {
            input,
            pos: start,
            current_token: Token::Eof,
            span: Span::new(start, start),
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
        let start = self.pos;
        self.current_token = self.scan_token();
        self.span = Span::new(start, self.pos);
    }

    fn scan_token(&mut self) -> Token {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        if let Some(token) = single_char_token(c) {
            self.advance();
            return token;
        }

        match c {
            '<' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::GreaterEqual;
                }
                Token::GreaterThan
            }
            '"' => self.scan_string(),
            '\'' => self.scan_quoted_sheet(),
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                self.scan_number()
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '#' => {
                self.scan_identifier_or_ref()
            }
            other => {
                self.advance();
                Token::Unknown(other)
            }
        }
    }

    /// Scan a `"..."` literal where `""` stands for one quote
    fn scan_string(&mut self) -> Token {
        Token::String(self.scan_quoted('"'))
    }

    /// Scan `'Sheet name'!`; a quoted name not followed by `!` is kept as an identifier
    fn scan_quoted_sheet(&mut self) -> Token {
        let name = self.scan_quoted('\'');
        if self.peek_char() == Some('!') {
            self.advance();
            return Token::SheetRef(SheetQualifier::Name(name));
        }
        Token::Identifier(name)
    }

    fn scan_quoted(&mut self, quote: char) -> String {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            self.advance();
            if c != quote {
                s.push(c);
            } else if self.peek_char() == Some(quote) {
                s.push(quote);
                self.advance();
            } else {
                return s;
            }
        }
        s
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        self.skip_digits();

        // A bare integer followed by `!` is a sheet id
        if self.peek_char() == Some('!') {
            let digits = &self.input[start..self.pos];
            if let Some(sheet) = digits.parse().ok().and_then(|id| Sheet::from_id(id).ok()) {
                self.advance();
                return Token::SheetRef(SheetQualifier::Id(sheet));
            }
        }

        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.skip_digits();
        }

        let num_str = &self.input[start..self.pos];
        Token::Number(num_str.parse().unwrap_or(0.0))
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;

        // Error values (#VALUE!, #REF!, etc.)
        if self.peek_char() == Some('#') {
            self.advance();
            while self.peek_char().map_or(false, |c| {
                c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?'
            }) {
                self.advance();
            }
            let error_str = &self.input[start..self.pos];
            return match CellError::from_str(error_str) {
                Some(err) => Token::Error(err),
                None => Token::Identifier(error_str.to_string()),
            };
        }

        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        if self.peek_char() == Some('!') {
            self.advance();
            return Token::SheetRef(SheetQualifier::Name(text.to_string()));
        }

        // A following '(' makes it a function call (TRUE(), LOG10(100), ...)
        let is_call = self.peek_char() == Some('(');
        if !is_call {
            if text.eq_ignore_ascii_case("TRUE") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Token::Boolean(false);
            }
            if is_cell_reference(text) {
                return Token::CellRef(text.to_string());
            }
        }

        Token::Identifier(text.to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> Token {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing ===
    // Left-associative binary levels, loosest first. Below them sit `^` (right associative),
    // unary `-`/`+`, postfix `%`, the `:` range operator, then primaries.

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_binary(0)
    }

    fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_binary(&mut self, level: usize) -> FormulaResult<FormulaExpr> {
        if level == BINARY_LEVELS {
            return self.parse_exponent();
        }

        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = binary_operator(self.current_token(), level) {
            self.consume();
            let right = self.parse_binary(level + 1)?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_unary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            let right = self.parse_exponent()?; // Right associative
            return Ok(Self::binary(BinaryOperator::Power, left, right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token() {
            Token::Minus => {
                self.consume();
                let operand = self.parse_unary()?;
                return Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                });
            }
            Token::Plus => {
                self.consume();
                return self.parse_unary();
            }
            _ => {}
        }

        let mut expr = self.parse_range()?;

        while matches!(self.current_token(), Token::Percent) {
            self.consume();
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }
        self.consume();
        let right = self.parse_primary()?;

        match (left, right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                if let (Some(a), Some(b)) = (&start.sheet, &end.sheet) {
                    if a != b {
                        return Err(FormulaError::Parse(format!(
                            "Range references must be on the same sheet: {}{}:{}{}",
                            a,
                            start.address(),
                            b,
                            end.address()
                        )));
                    }
                }
                let span = Span::new(start.span.start, end.span.end);
                Ok(FormulaExpr::RangeRef(RangeReference { start, end, span }))
            }
            (left, right) => Ok(Self::binary(BinaryOperator::Range, left, right)),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        let start = self.span.start;
        match self.consume() {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),
            Token::String(s) => Ok(FormulaExpr::String(s)),
            Token::Boolean(b) => Ok(FormulaExpr::Boolean(b)),
            Token::Error(e) => Ok(FormulaExpr::Error(e)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::LeftBrace => self.parse_array(),

            Token::SheetRef(sheet) => {
                let end = self.span.end;
                match self.consume() {
                    Token::CellRef(text) => self.cell_reference(Some(sheet), &text, start, end),
                    other => Err(FormulaError::Parse(format!(
                        "Expected cell reference after sheet {}, got {:?}",
                        sheet, other
                    ))),
                }
            }

            Token::CellRef(text) => {
                let end = start + text.len();
                self.cell_reference(None, &text, start, end)
            }

            Token::Identifier(name) => {
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name))
                }
            }

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_array(&mut self) -> FormulaResult<FormulaExpr> {
        let mut rows = Vec::new();
        let mut current_row = Vec::new();

        if !matches!(self.current_token(), Token::RightBrace) {
            current_row.push(self.parse_expression()?);

            loop {
                match self.current_token() {
                    Token::Comma => {
                        self.consume();
                        current_row.push(self.parse_expression()?);
                    }
                    Token::Semicolon => {
                        self.consume();
                        rows.push(std::mem::take(&mut current_row));
                        current_row.push(self.parse_expression()?);
                    }
                    Token::RightBrace => break,
                    _ => {
                        return Err(FormulaError::Parse(
                            "Expected ',' ';' or '}' in array".into(),
                        ))
                    }
                }
            }
        }

        if !current_row.is_empty() {
            rows.push(current_row);
        }

        self.expect(&Token::RightBrace)?;
        Ok(FormulaExpr::Array(rows))
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }

    fn cell_reference(
        &self,
        sheet: Option<SheetQualifier>,
        text: &str,
        start: usize,
        end: usize,
    ) -> FormulaResult<FormulaExpr> {
        let parsed = Reference::parse_a1(Sheet::first(), text).map_err(|e| {
            FormulaError::Parse(format!("Invalid cell reference '{}': {}", text, e))
        })?;

        Ok(FormulaExpr::CellRef(CellReference {
            sheet,
            column: parsed.column(),
            row: parsed.row(),
            span: Span::new(start, end),
        }))
    }
}

/// `[$]letters[$]digits`, nothing else
fn is_cell_reference(text: &str) -> bool {
    let rest = text.strip_prefix('$').unwrap_or(text);
    let letters = rest.chars().take_while(char::is_ascii_alphabetic).count();
    if letters == 0 {
        return false;
    }
    let rest = &rest[letters..];
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

const BINARY_LEVELS: usize = 4;

fn binary_operator(token: &Token, level: usize) -> Option<BinaryOperator> {
    let op = match (level, token) {
        (0, Token::Equal) => BinaryOperator::Equal,
        (0, Token::NotEqual) => BinaryOperator::NotEqual,
        (0, Token::LessThan) => BinaryOperator::LessThan,
        (0, Token::LessEqual) => BinaryOperator::LessEqual,
        (0, Token::GreaterThan) => BinaryOperator::GreaterThan,
        (0, Token::GreaterEqual) => BinaryOperator::GreaterEqual,
        (1, Token::Ampersand) => BinaryOperator::Concat,
        (2, Token::Plus) => BinaryOperator::Add,
        (2, Token::Minus) => BinaryOperator::Subtract,
        (3, Token::Star) => BinaryOperator::Multiply,
        (3, Token::Slash) => BinaryOperator::Divide,
        _ => return None,
    };
    Some(op)
}
