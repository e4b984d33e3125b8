//! Challenge modifier formulas: `<stat> <op><operand>`.
//!
//! The operand is a small integer expression over literals, `level`, `wis`,
//! parentheses and `+ - * /`. Parsing is separate from evaluation so a
//! compendium can be checked before any character exists.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("modifier `{0}` is missing an operator and operand")]
    MissingOperand(String),
    #[error("unknown modifier target `{0}`")]
    UnknownTarget(String),
    #[error("unknown modifier operator `{0}`")]
    UnknownOperator(char),
    #[error("unexpected `{found}` at offset {offset} in `{expression}`")]
    UnexpectedToken {
        expression: String,
        found: String,
        offset: usize,
    },
    #[error("unexpected end of expression `{0}`")]
    UnexpectedEnd(String),
    #[error("unknown variable `{0}` (expected level or wis)")]
    UnknownVariable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
}

/// The combat number a modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatTarget {
    ArmorClass,
    AttackBonus,
    DamagePerRound,
    HitPoints,
}

impl StatTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArmorClass => "armorClass",
            Self::AttackBonus => "attackBonus",
            Self::DamagePerRound => "damagePerRound",
            Self::HitPoints => "hitPoints",
        }
    }
}

impl fmt::Display for StatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatTarget {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "armorClass" => Ok(Self::ArmorClass),
            "attackBonus" => Ok(Self::AttackBonus),
            "damagePerRound" => Ok(Self::DamagePerRound),
            "hitPoints" => Ok(Self::HitPoints),
            other => Err(FormulaError::UnknownTarget(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Override,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Override => '=',
        }
    }

    fn from_symbol(symbol: char) -> Result<Self, FormulaError> {
        match symbol {
            '+' => Ok(Self::Add),
            '-' => Ok(Self::Subtract),
            '*' => Ok(Self::Multiply),
            '/' => Ok(Self::Divide),
            '=' => Ok(Self::Override),
            other => Err(FormulaError::UnknownOperator(other)),
        }
    }
}

/// Values substituted for the formula variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormulaContext {
    pub level: i32,
    pub wis: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Literal(i32),
    Level,
    Wis,
    Negate(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Expr {
    fn eval(&self, ctx: &FormulaContext) -> Result<i32, FormulaError> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Level => Ok(ctx.level),
            Expr::Wis => Ok(ctx.wis),
            Expr::Negate(inner) => inner.eval(ctx)?.checked_neg().ok_or(FormulaError::Overflow),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval(ctx)?;
                let rhs = rhs.eval(ctx)?;
                let value = match op {
                    BinaryOp::Add => lhs.checked_add(rhs),
                    BinaryOp::Sub => lhs.checked_sub(rhs),
                    BinaryOp::Mul => lhs.checked_mul(rhs),
                    BinaryOp::Div => {
                        if rhs == 0 {
                            return Err(FormulaError::DivisionByZero);
                        }
                        lhs.checked_div(rhs)
                    }
                };
                value.ok_or(FormulaError::Overflow)
            }
        }
    }
}

/// Recursive-descent parser: expr := term (('+'|'-') term)*, term := unary (('*'|'/') unary)*.
struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.skip_whitespace();
        self.chars.peek().copied()
    }

    fn unexpected(&self, offset: usize, found: char) -> FormulaError {
        FormulaError::UnexpectedToken {
            expression: self.source.to_string(),
            found: found.to_string(),
            offset,
        }
    }

    fn parse(mut self) -> Result<Expr, FormulaError> {
        let expr = self.expression()?;
        match self.peek() {
            None => Ok(expr),
            Some((offset, c)) => Err(self.unexpected(offset, c)),
        }
    }

    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some((_, c)) = self.peek() {
            let op = match c {
                '+' => BinaryOp::Add,
                '-' => BinaryOp::Sub,
                _ => break,
            };
            self.chars.next();
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some((_, c)) = self.peek() {
            let op = match c {
                '*' => BinaryOp::Mul,
                '/' => BinaryOp::Div,
                _ => break,
            };
            self.chars.next();
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some((_, '-')) => {
                self.chars.next();
                Ok(Expr::Negate(Box::new(self.unary()?)))
            }
            Some((_, '+')) => {
                self.chars.next();
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let Some((offset, c)) = self.peek() else {
            return Err(FormulaError::UnexpectedEnd(self.source.to_string()));
        };
        if c == '(' {
            self.chars.next();
            let inner = self.expression()?;
            return match self.peek() {
                Some((_, ')')) => {
                    self.chars.next();
                    Ok(inner)
                }
                Some((offset, c)) => Err(self.unexpected(offset, c)),
                None => Err(FormulaError::UnexpectedEnd(self.source.to_string())),
            };
        }
        if c.is_ascii_digit() {
            let mut end = offset;
            while let Some(&(i, d)) = self.chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                end = i + d.len_utf8();
                self.chars.next();
            }
            return self.source[offset..end]
                .parse()
                .map(Expr::Literal)
                .map_err(|_| FormulaError::Overflow);
        }
        if c.is_ascii_alphabetic() {
            let mut end = offset;
            while let Some(&(i, d)) = self.chars.peek() {
                if !d.is_ascii_alphanumeric() {
                    break;
                }
                end = i + d.len_utf8();
                self.chars.next();
            }
            return match &self.source[offset..end] {
                "level" => Ok(Expr::Level),
                "wis" => Ok(Expr::Wis),
                other => Err(FormulaError::UnknownVariable(other.to_string())),
            };
        }
        Err(self.unexpected(offset, c))
    }
}

/// A parsed, not yet evaluated, modifier description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierFormula {
    pub target: StatTarget,
    pub operation: Operation,
    operand: Expr,
}

impl ModifierFormula {
    pub fn parse(description: &str) -> Result<Self, FormulaError> {
        let trimmed = description.trim();
        let (target, rest) = trimmed
            .split_once(char::is_whitespace)
            .ok_or_else(|| FormulaError::MissingOperand(trimmed.to_string()))?;
        let target: StatTarget = target.parse()?;
        let rest = rest.trim_start();
        let mut chars = rest.chars();
        let symbol = chars
            .next()
            .ok_or_else(|| FormulaError::MissingOperand(trimmed.to_string()))?;
        let operation = Operation::from_symbol(symbol)?;
        let operand = Parser::new(chars.as_str()).parse()?;
        Ok(Self {
            target,
            operation,
            operand,
        })
    }

    pub fn resolve(&self, ctx: &FormulaContext) -> Result<ChallengeModifier, FormulaError> {
        let value = self.operand.eval(ctx)?;
        if self.operation == Operation::Divide && value == 0 {
            return Err(FormulaError::DivisionByZero);
        }
        Ok(ChallengeModifier {
            target: self.target,
            operation: self.operation,
            value,
        })
    }
}

/// An operation and a resolved integer aimed at one combat number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeModifier {
    pub target: StatTarget,
    pub operation: Operation,
    pub value: i32,
}

impl ChallengeModifier {
    pub fn new(target: StatTarget, operation: Operation, value: i32) -> Self {
        Self {
            target,
            operation,
            value,
        }
    }

    /// Parses and evaluates a description in one step.
    pub fn parse(description: &str, ctx: &FormulaContext) -> Result<Self, FormulaError> {
        ModifierFormula::parse(description)?.resolve(ctx)
    }
}

/// Evaluates a bare operand expression, e.g. `level/2 + wis`.
pub fn evaluate(expression: &str, ctx: &FormulaContext) -> Result<i32, FormulaError> {
    Parser::new(expression).parse()?.eval(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(level: i32, wis: i32) -> FormulaContext {
        FormulaContext { level, wis }
    }

    #[test]
    fn literal_operand() {
        let modifier = ChallengeModifier::parse("armorClass +2", &ctx(1, 0)).unwrap();
        assert_eq!(
            modifier,
            ChallengeModifier::new(StatTarget::ArmorClass, Operation::Add, 2)
        );
    }

    #[test]
    fn variables_and_precedence() {
        assert_eq!(evaluate("level*2+wis", &ctx(5, 3)), Ok(13));
        assert_eq!(evaluate("2 + level * 3", &ctx(4, 0)), Ok(14));
        assert_eq!(evaluate("(2 + level) * 3", &ctx(4, 0)), Ok(18));
        assert_eq!(evaluate("level / 2", &ctx(7, 0)), Ok(3));
        assert_eq!(evaluate("-wis", &ctx(1, 2)), Ok(-2));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(evaluate("-7 / 2", &ctx(1, 0)), Ok(-3));
        assert_eq!(evaluate("wis / 2", &ctx(1, -3)), Ok(-1));
    }

    #[test]
    fn override_with_expression() {
        let modifier = ChallengeModifier::parse("hitPoints =level*10", &ctx(3, 0)).unwrap();
        assert_eq!(modifier.operation, Operation::Override);
        assert_eq!(modifier.value, 30);
    }

    #[test]
    fn malformed_descriptions_fail_explicitly() {
        assert!(matches!(
            ModifierFormula::parse("speed +2"),
            Err(FormulaError::UnknownTarget(_))
        ));
        assert!(matches!(
            ModifierFormula::parse("armorClass %2"),
            Err(FormulaError::UnknownOperator('%'))
        ));
        assert!(matches!(
            ModifierFormula::parse("armorClass"),
            Err(FormulaError::MissingOperand(_))
        ));
        assert!(matches!(
            ModifierFormula::parse("attackBonus +str"),
            Err(FormulaError::UnknownVariable(_))
        ));
        assert!(matches!(
            ModifierFormula::parse("attackBonus +(level"),
            Err(FormulaError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            ModifierFormula::parse("attackBonus +2 3"),
            Err(FormulaError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            ChallengeModifier::parse("damagePerRound /wis", &ctx(1, 0)),
            Err(FormulaError::DivisionByZero)
        );
    }
}
