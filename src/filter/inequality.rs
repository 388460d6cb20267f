//! Numeric comparisons such as `>=30`.

use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::multispace0,
    combinator::{all_consuming, value, verify},
    number::complete::double,
    IResult, Parser,
};

use crate::error::Error;

/// Comparison operator of an [`Inequality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, parse_display::Display)]
pub enum InequalityOp {
    #[display(">")]
    Greater,
    #[display(">=")]
    GreaterOrEqual,
    #[display("<")]
    Less,
    #[display("<=")]
    LessOrEqual,
    #[display("=")]
    Equal,
    #[display("!=")]
    NotEqual,
}

impl InequalityOp {
    fn parse(input: &str) -> IResult<&str, Self> {
        // Two-character operators first.
        alt((
            value(InequalityOp::GreaterOrEqual, tag(">=")),
            value(InequalityOp::LessOrEqual, tag("<=")),
            value(InequalityOp::NotEqual, tag("!=")),
            value(InequalityOp::Greater, tag(">")),
            value(InequalityOp::Less, tag("<")),
            value(InequalityOp::Equal, tag("=")),
        ))
        .parse(input)
    }
}

/// A finite threshold; `nan` and `inf` are rejected.
fn threshold(input: &str) -> IResult<&str, f64> {
    verify(double, |value: &f64| value.is_finite()).parse(input)
}

/// A comparison `value <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Inequality {
    pub op: InequalityOp,
    pub threshold: f64,
}

impl Inequality {
    pub fn new(op: InequalityOp, threshold: f64) -> Self {
        Self { op, threshold }
    }

    pub fn parse(input: &str) -> IResult<&str, Self> {
        let (rest, (_, op, _, threshold, _)) =
            (multispace0, InequalityOp::parse, multispace0, threshold, multispace0).parse(input)?;
        Ok((rest, Self { op, threshold }))
    }

    /// Whether `value` satisfies the comparison.
    pub fn is_satisfied(&self, value: f64) -> bool {
        match self.op {
            InequalityOp::Greater => value > self.threshold,
            InequalityOp::GreaterOrEqual => value >= self.threshold,
            InequalityOp::Less => value < self.threshold,
            InequalityOp::LessOrEqual => value <= self.threshold,
            InequalityOp::Equal => value == self.threshold,
            InequalityOp::NotEqual => value != self.threshold,
        }
    }
}

impl std::fmt::Display for Inequality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.op, self.threshold)
    }
}

impl FromStr for Inequality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(Inequality::parse)
            .parse(s)
            .map(|(_, inequality)| inequality)
            .map_err(|e| Error::InvalidFilter(format!("invalid inequation {:?}: {}", s, e)))
    }
}

impl TryFrom<String> for Inequality {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Inequality> for String {
    fn from(value: Inequality) -> Self {
        value.to_string()
    }
}
