//! Formula parser
//!
//! A recursive descent parser for the formula dialect used by the rows:
//! numbers, `+ - * / ^`, parentheses, single-letter cell references,
//! identifiers and function calls.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use timeline_calc_core::CellAddress;

/// Parse a formula string into an AST
///
/// A single leading `=` is optional.
///
/// # Example
/// ```rust
/// use timeline_calc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=B12*D12/60").unwrap();
/// let ast = parse_formula("CEILING(B3/B4, 1)").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();
    let formula = formula.strip_prefix('=').unwrap_or(formula);

    let mut parser = FormulaParser::new(formula);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),

    // Identifiers and references
    Identifier(String), // Function name or constant
    CellRef(CellAddress),

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

    /// Anything outside the dialect
    Invalid(String),

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
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
            '*' => Some(Token::Star),
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

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier or cell reference
        if c.is_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier_or_ref();
        }

        self.advance();
        Token::Invalid(c.to_string())
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

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Invalid(num_str.to_string()),
        }
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // A cell reference followed by '(' is a function call instead
        if self.peek_char() != Some('(') {
            if let Ok(address) = CellAddress::parse(text) {
                return Token::CellRef(address);
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
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Exponentiation: ^ (right associative)
    // 5. Primary: numbers, references, function calls, parentheses

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
            left = FormulaExpr::binary(op, left, right);
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
            left = FormulaExpr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.parse_unary();
        }

        self.parse_exponent()
    }

    // `-2^2` is `-(2^2)`
    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            // Right associative; the exponent may carry its own sign (10^-6)
            let right = self.parse_unary()?;
            return Ok(FormulaExpr::binary(BinaryOperator::Power, left, right));
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(FormulaExpr::Number(n))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::CellRef(address) => {
                self.consume();
                Ok(FormulaExpr::CellRef(address))
            }

            Token::Identifier(name) => {
                self.consume();
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name))
                }
            }

            _ => Err(FormulaError::Parse(format!(
                "Unexpected token: {:?}",
                self.current_token()
            ))),
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), FormulaExpr::Number(42.0));
        assert_eq!(parse_formula("=3.14").unwrap(), FormulaExpr::Number(3.14));
        assert_eq!(parse_formula("=1e10").unwrap(), FormulaExpr::Number(1e10));
        assert_eq!(parse_formula("=.5").unwrap(), FormulaExpr::Number(0.5));
    }

    #[test]
    fn test_leading_equals_is_optional() {
        assert_eq!(parse_formula("1+2").unwrap(), parse_formula("=1+2").unwrap());
        assert_eq!(parse_formula("  =7 ").unwrap(), FormulaExpr::Number(7.0));
    }

    #[test]
    fn test_parse_arithmetic() {
        let ast = parse_formula("=1+2*3").unwrap();
        // Should parse as 1+(2*3) due to precedence
        if let FormulaExpr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Add);
            assert_eq!(*left, FormulaExpr::Number(1.0));
            assert!(matches!(
                *right,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_negative_exponent() {
        let ast = parse_formula("=10^-6").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::binary(
                BinaryOperator::Power,
                FormulaExpr::Number(10.0),
                FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(FormulaExpr::Number(6.0)),
                }
            )
        );
    }

    #[test]
    fn test_parse_negated_power() {
        let ast = parse_formula("=-B2^2").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(FormulaExpr::binary(
                    BinaryOperator::Power,
                    FormulaExpr::CellRef(CellAddress::new('B', 2)),
                    FormulaExpr::Number(2.0),
                )),
            }
        );
    }

    #[test]
    fn test_parse_cell_reference() {
        let ast = parse_formula("=B12").unwrap();
        assert_eq!(ast, FormulaExpr::CellRef(CellAddress::new('B', 12)));

        let ast = parse_formula("=$D$7").unwrap();
        if let FormulaExpr::CellRef(address) = ast {
            assert_eq!(address.key(), "D7");
            assert!(address.column_absolute);
        } else {
            panic!("Expected CellRef");
        }
    }

    #[test]
    fn test_non_reference_identifiers() {
        // Multi-letter columns and long row numbers are plain names
        assert_eq!(
            parse_formula("=AB12").unwrap(),
            FormulaExpr::NameRef("AB12".into())
        );
        assert_eq!(
            parse_formula("=B1234").unwrap(),
            FormulaExpr::NameRef("B1234".into())
        );
        assert_eq!(parse_formula("=pi").unwrap(), FormulaExpr::NameRef("pi".into()));
        assert_eq!(parse_formula("=π").unwrap(), FormulaExpr::NameRef("π".into()));
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_formula("=ceiling(B3/B4, 1)").unwrap();
        if let FormulaExpr::Function { name, args } = ast {
            assert_eq!(name, "CEILING");
            assert_eq!(args.len(), 2);
        } else {
            panic!("Expected Function");
        }

        let ast = parse_formula("=PI()").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::Function {
                name: "PI".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_parse_parentheses() {
        let ast = parse_formula("=(1+2)*3").unwrap();
        if let FormulaExpr::BinaryOp { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Multiply);
            assert!(matches!(
                *left,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::Add,
                    ..
                }
            ));
            assert_eq!(*right, FormulaExpr::Number(3.0));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_formula("=").is_err());
        assert!(parse_formula("=1+").is_err());
        assert!(parse_formula("=(1+2").is_err());
        assert!(parse_formula("=1 2").is_err());
        assert!(parse_formula("=SUM(B1:B3)").is_err());
        assert!(parse_formula("=50%").is_err());
        assert!(parse_formula("=1e").is_err());
    }

    #[test]
    fn test_render_round_trip() {
        for src in [
            "=(B2+B3)*D2/60",
            "=CEILING(B5/B6, 1)*B7",
            "=B2^-2",
            "=-B2^2",
            "=2^3^2",
            "=B2-(B3-B4)",
            "=PI()*(B9/2)^2",
        ] {
            let ast = parse_formula(src).unwrap();
            let again = parse_formula(&ast.to_string()).unwrap();
            assert_eq!(again, ast, "{}", src);
        }
    }
}
