//! Expression compiler: user text → a numeric function of one variable.
//!
//! Pipeline: lex (`winnow`) → implicit-variable insertion → recursive
//! descent → [`Expr`] tree, evaluated directly. Users may omit the variable
//! and write only the operation: `+5` means `x + 5`, `(*2)` means `(x * 2)`.
//!
//! Grammar after preprocessing:
//!
//! ```text
//! sum     = product (("+" | "-") product)*
//! product = unary (("*" | "/") unary)*
//! unary   = "-" unary | power
//! power   = atom ("^" unary)?
//! atom    = number | "x" | "(" sum ")"
//! ```

use crate::error::ExpressionError;
use std::fmt;
use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::one_of;

// ─── Tokens ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Pow => '^',
        }
    }

    /// Operators that imply a left operand when none is written.
    fn implies_operand(self) -> bool {
        !matches!(self, BinaryOp::Sub)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Num(f64),
    Op(BinaryOp),
    LParen,
    RParen,
    Var,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{n:.2}"),
            Token::Op(op) => write!(f, "{}", op.symbol()),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Var => f.write_str("x"),
        }
    }
}

// ─── Lexer ───────────────────────────────────────────────────────────────

fn number(input: &mut &str) -> ModalResult<f64> {
    let text = alt(((digit1, opt(('.', digit0))).take(), ('.', digit1).take())).parse_next(input)?;
    text.parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

fn token(input: &mut &str) -> ModalResult<Token> {
    alt((
        number.map(Token::Num),
        one_of(['x', 'X']).value(Token::Var),
        '('.value(Token::LParen),
        ')'.value(Token::RParen),
        '+'.value(Token::Op(BinaryOp::Add)),
        '-'.value(Token::Op(BinaryOp::Sub)),
        '*'.value(Token::Op(BinaryOp::Mul)),
        '/'.value(Token::Op(BinaryOp::Div)),
        '^'.value(Token::Op(BinaryOp::Pow)),
    ))
    .parse_next(input)
}

/// Split `src` into tokens. Whitespace is skipped; anything else that is
/// not a number, operator, parenthesis or `x` is rejected.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut input = src;
    let mut tokens = Vec::new();
    loop {
        input = input.trim_start();
        if input.is_empty() {
            return Ok(tokens);
        }
        let offset = src.len() - input.len();
        match token.parse_next(&mut input) {
            Ok(tok) => tokens.push(tok),
            Err(_) => {
                let ch = input.chars().next().unwrap_or_default();
                return Err(ExpressionError::UnexpectedChar { ch, offset });
            }
        }
    }
}

// ─── Implicit variable ───────────────────────────────────────────────────

/// Number literals keep two decimal places.
fn round2(n: f64) -> f64 {
    format!("{n:.2}").parse().unwrap_or(n)
}

/// Place the variable the user left out.
///
/// If `x` already appears nothing is placed. A leading `-<number>` is
/// taken as the current value and replaced by `x`. Otherwise the first
/// number becomes `x`, unless an operator in `+ * / ^` comes first, in
/// which case `x` is inserted before that operator.
fn place_variable(mut tokens: Vec<Token>) -> Vec<Token> {
    if tokens.contains(&Token::Var) {
        return tokens;
    }
    if let [Token::Op(BinaryOp::Sub), Token::Num(_), ..] = tokens.as_slice() {
        tokens.splice(0..2, [Token::Var]);
        return tokens;
    }
    for i in 0..tokens.len() {
        match tokens[i] {
            Token::Num(_) => {
                tokens[i] = Token::Var;
                break;
            }
            Token::Op(op) if op.implies_operand() => {
                tokens.insert(i, Token::Var);
                break;
            }
            _ => {}
        }
    }
    tokens
}

/// Round literals and fill in an `x` before every operator in `+ * / ^`
/// that follows another operator or an opening parenthesis, so `(+5)`
/// reads as `(x + 5)`.
fn reassemble(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len() + 2);
    for tok in tokens {
        let tok = match tok {
            Token::Num(n) => Token::Num(round2(n)),
            other => other,
        };
        if let Token::Op(op) = tok {
            if op.implies_operand() && matches!(out.last(), Some(Token::Op(_) | Token::LParen)) {
                out.push(Token::Var);
            }
        }
        out.push(tok);
    }
    out
}

// ─── Tree ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable,
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Variable => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Binary { op, left, right } => {
                let (l, r) = (left.eval(x), right.eval(x));
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Pow => l.powf(r),
                }
            }
        }
    }
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    fn consume_op(&mut self, op: BinaryOp) -> bool {
        if self.peek() == Some(Token::Op(op)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, ExpressionError> {
        let mut e = self.parse_product()?;
        loop {
            let op = if self.consume_op(BinaryOp::Add) {
                BinaryOp::Add
            } else if self.consume_op(BinaryOp::Sub) {
                BinaryOp::Sub
            } else {
                break;
            };
            let r = self.parse_product()?;
            e = Self::binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_product(&mut self) -> Result<Expr, ExpressionError> {
        let mut e = self.parse_unary()?;
        loop {
            let op = if self.consume_op(BinaryOp::Mul) {
                BinaryOp::Mul
            } else if self.consume_op(BinaryOp::Div) {
                BinaryOp::Div
            } else {
                break;
            };
            let r = self.parse_unary()?;
            e = Self::binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.consume_op(BinaryOp::Sub) {
            let e = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(e)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.parse_atom()?;
        if self.consume_op(BinaryOp::Pow) {
            let exponent = self.parse_unary()?;
            return Ok(Self::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, ExpressionError> {
        let position = self.pos;
        match self.bump() {
            Some(Token::Num(n)) => Ok(Expr::Number(n)),
            Some(Token::Var) => Ok(Expr::Variable),
            Some(Token::LParen) => {
                let inner = self.parse_sum()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExpressionError::UnbalancedParens),
                }
            }
            Some(Token::RParen) => Err(ExpressionError::UnbalancedParens),
            Some(other) => Err(ExpressionError::unexpected(other.to_string(), position)),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

// ─── Compiled expression ─────────────────────────────────────────────────

/// A compiled user expression: a function of the current value `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    tree: Expr,
}

impl Expression {
    /// Compile user input such as `"+5"`, `"x*2"` or `"(+5)"`.
    pub fn compile(src: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(src)?;
        if tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let tokens = reassemble(place_variable(tokens));
        let text = tokens
            .iter()
            .map(Token::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        let mut parser = ExprParser { tokens, pos: 0 };
        let tree = parser.parse_sum()?;
        match parser.peek() {
            None => {}
            Some(Token::RParen) => return Err(ExpressionError::UnbalancedParens),
            Some(tok) => return Err(ExpressionError::unexpected(tok.to_string(), parser.pos)),
        }
        log::trace!("compiled {src:?} as `{text}`");
        Ok(Self { text, tree })
    }

    /// The identity function `x`.
    pub fn identity() -> Self {
        Self {
            text: "x".into(),
            tree: Expr::Variable,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.tree.eval(x)
    }

    /// Normalised form, e.g. `x + 5.00`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Whether a form value is an edit to compile rather than a plain value:
/// it starts with `+ * ^ /`, or is not a number once `°` and `%` are
/// stripped.
pub fn is_operation(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.starts_with(['+', '*', '^', '/']) {
        return true;
    }
    let bare: String = trimmed.chars().filter(|c| !matches!(c, '°' | '%')).collect();
    let bare = bare.trim();
    !bare.is_empty() && bare.parse::<f64>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(src: &str) -> String {
        Expression::compile(src).unwrap().text().to_string()
    }

    #[test]
    fn leading_operator_implies_the_variable() {
        assert_eq!(text("+5"), "x + 5.00");
        assert_eq!(text("*2"), "x * 2.00");
        assert_eq!(text("^2"), "x ^ 2.00");
    }

    #[test]
    fn first_number_becomes_the_variable() {
        assert_eq!(text("10 + 5"), "x + 5.00");
        assert_eq!(text("-3 + 1"), "x + 1.00");
    }

    #[test]
    fn explicit_variable_is_kept() {
        assert_eq!(text("x*2"), "x * 2.00");
        assert_eq!(text("2*X"), "2.00 * x");
    }

    #[test]
    fn operator_after_paren_gets_a_variable() {
        assert_eq!(text("(+5)"), "( x + 5.00 )");
        assert_eq!(text("x*(/2)"), "x * ( x / 2.00 )");
    }

    #[test]
    fn literals_are_rounded_to_two_places() {
        assert_eq!(text("x+1.234"), "x + 1.23");
        let e = Expression::compile("x*2.499").unwrap();
        assert_eq!(e.text(), "x * 2.50");
        assert_eq!(e.eval(4.0), 10.0);
    }

    #[test]
    fn evaluation() {
        assert_eq!(Expression::compile("+5").unwrap().eval(10.0), 15.0);
        assert_eq!(Expression::compile("x*2").unwrap().eval(21.0), 42.0);
        assert_eq!(Expression::compile("x-2*3").unwrap().eval(10.0), 4.0);
        assert_eq!(Expression::compile("x^2^3").unwrap().eval(2.0), 256.0);
        assert_eq!(Expression::compile("-x^2").unwrap().eval(3.0), -9.0);
        assert_eq!(Expression::compile("x^-1").unwrap().eval(4.0), 0.25);
        assert_eq!(Expression::compile("x/0").unwrap().eval(1.0), f64::INFINITY);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!(Expression::compile(""), Err(ExpressionError::Empty));
        assert_eq!(Expression::compile("   "), Err(ExpressionError::Empty));
        assert_eq!(
            Expression::compile("x + alert(1)"),
            Err(ExpressionError::UnexpectedChar { ch: 'a', offset: 4 })
        );
        assert_eq!(
            Expression::compile("(x+5"),
            Err(ExpressionError::UnbalancedParens)
        );
        assert_eq!(
            Expression::compile("x+5)"),
            Err(ExpressionError::UnbalancedParens)
        );
        assert_eq!(Expression::compile("x+"), Err(ExpressionError::UnexpectedEnd));
        assert!(Expression::compile("x 5").is_err());
    }

    #[test]
    fn operation_detection() {
        assert!(is_operation("+5"));
        assert!(is_operation(" *2"));
        assert!(is_operation("x-3"));
        assert!(!is_operation("12"));
        assert!(!is_operation("-12"));
        assert!(!is_operation("45°"));
        assert!(!is_operation("50%"));
        assert!(!is_operation(""));
    }
}
