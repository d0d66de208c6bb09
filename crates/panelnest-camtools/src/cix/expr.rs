//! Arithmetic evaluator for CIX parameter values
//!
//! Programs written by CAD post-processors carry values such as `(50)+(0)`
//! or `600/2-32`. Only numeric literals, `+ - * /`, parentheses and
//! whitespace are accepted: there are no names, functions or other
//! operators, so evaluating a value can never reach outside the expression.

/// Nesting limit for parentheses and unary signs.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Open,
    Close,
}

/// True when `text` only uses characters an arithmetic value may contain.
pub fn is_arithmetic(text: &str) -> bool {
    !text.trim().is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || "+-*/().".contains(c))
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::Open,
            ')' => Token::Close,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Number(text[start..end].parse().ok()?)
            }
            _ => return None,
        };
        tokens.push(token);
    }
    Some(tokens)
}

/// Recursive-descent parser over the token stream.
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := ('+' | '-') factor | number | '(' expr ')'
/// ```
struct Evaluator {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Evaluator {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == Token::Star {
                value * rhs
            } else if rhs == 0.0 {
                return None;
            } else {
                value / rhs
            };
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<f64> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return None;
        }
        let value = match self.next()? {
            Token::Number(n) => n,
            Token::Plus => self.factor()?,
            Token::Minus => -self.factor()?,
            Token::Open => {
                let inner = self.expr()?;
                if self.next()? != Token::Close {
                    return None;
                }
                inner
            }
            _ => return None,
        };
        self.depth -= 1;
        Some(value)
    }
}

/// Evaluate an arithmetic value; `None` for anything that is not one.
pub fn evaluate(text: &str) -> Option<f64> {
    if !is_arithmetic(text) {
        return None;
    }
    let tokens = tokenize(text)?;
    let mut evaluator = Evaluator {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = evaluator.expr()?;
    if evaluator.pos != evaluator.tokens.len() || !value.is_finite() {
        return None;
    }
    Some(value)
}
