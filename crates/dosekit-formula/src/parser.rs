//! Formula parser
//!
//! A recursive descent parser for dosing formulas with proper operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator, VariableRef};
use crate::error::{FormulaError, FormulaResult};

/// Parse a formula string into an AST
///
/// A leading `=` is accepted and ignored.
///
/// # Example
/// ```rust
/// use dosekit_formula::parse_formula;
///
/// let ast = parse_formula("1+2").unwrap();
/// let ast = parse_formula("weight * 15 / 1000").unwrap();
/// let ast = parse_formula("min(patient.weight * 10, 500)").unwrap();
/// assert!(parse_formula("x = 1").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();
    let formula = formula.strip_prefix('=').unwrap_or(formula);

    let mut parser = FormulaParser::new(formula);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {} after expression",
            parser.current_token().describe()
        )));
    }

    Ok(expr)
}

/// Reserved identifiers that evaluate to constants
fn reserved_constant(name: &str) -> Option<f64> {
    match name {
        "PI" => Some(std::f64::consts::PI),
        "E" => Some(std::f64::consts::E),
        "Infinity" => Some(f64::INFINITY),
        "NaN" | "undefined" => Some(f64::NAN),
        "true" => Some(1.0),
        "false" | "null" => Some(0.0),
        _ => None,
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),

    // Identifiers and variable paths
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // Anything outside the grammar
    Invalid(char),

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Caret => "'^'".into(),
            Token::Comma => "','".into(),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
            Token::Invalid(c) => format!("character '{}'", c),
            Token::Eof => "end of formula".into(),
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Formula parser
/// Deepest nesting of parentheses, calls, signs and exponents accepted
pub(crate) const MAX_NESTING_DEPTH: usize = 128;

struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            depth: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // '*' or '**'
        if c == '*' {
            self.advance();
            if self.peek_char() == Some('*') {
                self.advance();
                return Token::Caret;
            }
            return Token::Star;
        }

        // String literal
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier or variable path
        if is_identifier_start(c) {
            return self.scan_identifier();
        }

        // Unknown character
        self.advance();
        Token::Invalid(c)
    }

    fn scan_string(&mut self, quote: char) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == quote {
                break;
            }
            s.push(c);
            self.advance();
        }

        // Unterminated string
        if self.peek_char() != Some(quote) {
            return Token::Invalid(quote);
        }
        self.advance();

        Token::String(s)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only if digits follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let mantissa_end = self.pos;
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            let digits_start = self.pos;
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
            if self.pos == digits_start {
                self.pos = mantissa_end;
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(num) => Token::Number(num),
            Err(_) => Token::Invalid(num_str.chars().next().unwrap_or('.')),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        self.scan_name();

        // Path continuation: .name or [index] / ["key"]
        loop {
            match self.peek_char() {
                Some('.') if self.peek_char_at(1).map_or(false, is_identifier_start) => {
                    self.advance();
                    self.scan_name();
                }
                Some('[') => {
                    if !self.scan_index() {
                        self.advance();
                        return Token::Invalid('[');
                    }
                }
                _ => break,
            }
        }

        Token::Identifier(self.input[start..self.pos].to_string())
    }

    fn scan_name(&mut self) {
        while self.peek_char().map_or(false, is_identifier_char) {
            self.advance();
        }
    }

    /// Scan `[n]`, `[-n]` or `["key"]`. Leaves the position unchanged on failure.
    fn scan_index(&mut self) -> bool {
        let save = self.pos;
        self.advance(); // '['

        match self.peek_char() {
            Some(quote) if quote == '"' || quote == '\'' => {
                self.advance();
                while self.peek_char().map_or(false, |c| c != quote) {
                    self.advance();
                }
                if self.peek_char() != Some(quote) {
                    self.pos = save;
                    return false;
                }
                self.advance();
            }
            _ => {
                if self.peek_char() == Some('-') {
                    self.advance();
                }
                let digits_start = self.pos;
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
                if self.pos == digits_start {
                    self.pos = save;
                    return false;
                }
            }
        }

        if self.peek_char() != Some(']') {
            self.pos = save;
            return false;
        }
        self.advance();
        true
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
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {}, got {}",
                expected.describe(),
                self.current_token().describe()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Exponentiation: ^ (right associative, binds tighter than unary minus)
    // 5. Primary: literals, variables, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> FormulaResult<T>,
    ) -> FormulaResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(FormulaError::Parse("Formula nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        // Prefix unary minus
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.nested(Self::parse_unary);
        }

        self.parse_exponent()
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            // Right associative; the exponent may carry its own sign (2^-1)
            let right = self.nested(Self::parse_unary)?;
            return Ok(FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(FormulaExpr::Number(n))
            }

            Token::String(s) => {
                self.consume();
                Ok(FormulaExpr::String(s))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.nested(Self::parse_expression)?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Identifier(name) => {
                self.consume();
                // Check if it's a function call
                if matches!(self.current_token(), Token::LeftParen) {
                    self.nested(|parser| parser.parse_function_call(name))
                } else if let Some(value) = reserved_constant(&name) {
                    Ok(FormulaExpr::Number(value))
                } else {
                    Ok(FormulaExpr::Variable(VariableRef::new(name)))
                }
            }

            token => Err(FormulaError::Parse(format!(
                "Unexpected {}",
                token.describe()
            ))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_lowercase(),
            args,
        })
    }
}
