//! Branch condition expressions: parser and evaluator.
//!
//! Grammar:
//! ```text
//! Expr     ::= Operand Operator Literal | 'true' | 'false' | 'value'
//! Operand  ::= 'value' | Literal
//! Operator ::= '>=' | '<=' | '>' | '<' | '==' | '!=' | 'contains'
//! Literal  ::= QuotedString | Number | Boolean | BareWord
//! ```
//!
//! The operator is located by scanning the expression for each token in the
//! order listed above; the first token found wins. `==`/`!=` compare
//! loosely: both sides are coerced to numbers when possible, otherwise to
//! strings. Parsing never fails — anything unintelligible evaluates to
//! `false`.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Parsed forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
    Ne,
    Contains,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// The literal token `value`, bound to the resolved input at evaluation.
    ValueRef,
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BranchExpr {
    Compare {
        lhs: Operand,
        op: CmpOp,
        rhs: Literal,
    },
    /// Bare `true`/`false`.
    Const(bool),
    /// Bare `value`: truthiness of the resolved input.
    Truthiness,
    /// Anything unparseable.
    AlwaysFalse,
}

// Scan order matters: two-character operators and `contains` must win over
// their single-character prefixes.
const OPERATORS: [(&str, CmpOp); 7] = [
    (">=", CmpOp::Ge),
    ("<=", CmpOp::Le),
    (">", CmpOp::Gt),
    ("<", CmpOp::Lt),
    ("==", CmpOp::Eq),
    ("!=", CmpOp::Ne),
    ("contains", CmpOp::Contains),
];

/// Parse an expression. Never fails.
pub fn parse(input: &str) -> BranchExpr {
    let trimmed = input.trim();

    for (token, op) in OPERATORS {
        if let Some(pos) = trimmed.find(token) {
            let lhs_raw = trimmed[..pos].trim();
            let rhs_raw = trimmed[pos + token.len()..].trim();
            let lhs = if lhs_raw == "value" {
                Operand::ValueRef
            } else {
                Operand::Literal(parse_literal(lhs_raw))
            };
            return BranchExpr::Compare {
                lhs,
                op,
                rhs: parse_literal(rhs_raw),
            };
        }
    }

    match trimmed {
        "true" => BranchExpr::Const(true),
        "false" => BranchExpr::Const(false),
        "value" => BranchExpr::Truthiness,
        _ => BranchExpr::AlwaysFalse,
    }
}

fn parse_literal(raw: &str) -> Literal {
    if raw.len() >= 2 {
        let bytes = raw.as_bytes();
        if (bytes[0] == b'"' && bytes[raw.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[raw.len() - 1] == b'\'')
        {
            return Literal::Str(raw[1..raw.len() - 1].to_string());
        }
    }
    if let Ok(n) = raw.parse::<f64>() {
        return Literal::Num(n);
    }
    match raw {
        "true" => Literal::Bool(true),
        "false" => Literal::Bool(false),
        _ => Literal::Str(raw.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate a parsed expression against the resolved input value.
pub fn evaluate(expr: &BranchExpr, value: &Value) -> bool {
    match expr {
        BranchExpr::Const(b) => *b,
        BranchExpr::Truthiness => truthy(value),
        BranchExpr::AlwaysFalse => false,
        BranchExpr::Compare { lhs, op, rhs } => {
            let lhs = Side::from_operand(lhs, value);
            let rhs = Side::from_literal(rhs);
            match op {
                CmpOp::Ge => numeric(&lhs, &rhs).map(|(a, b)| a >= b).unwrap_or(false),
                CmpOp::Le => numeric(&lhs, &rhs).map(|(a, b)| a <= b).unwrap_or(false),
                CmpOp::Gt => numeric(&lhs, &rhs).map(|(a, b)| a > b).unwrap_or(false),
                CmpOp::Lt => numeric(&lhs, &rhs).map(|(a, b)| a < b).unwrap_or(false),
                CmpOp::Eq => loose_eq(&lhs, &rhs),
                CmpOp::Ne => !loose_eq(&lhs, &rhs),
                CmpOp::Contains => lhs.as_string().contains(&rhs.as_string()),
            }
        }
    }
}

/// One side of a comparison, normalized from either a literal or the
/// resolved value.
enum Side<'a> {
    Json(&'a Value),
    Lit(&'a Literal),
}

impl<'a> Side<'a> {
    fn from_operand(operand: &'a Operand, value: &'a Value) -> Self {
        match operand {
            Operand::ValueRef => Side::Json(value),
            Operand::Literal(lit) => Side::Lit(lit),
        }
    }

    fn from_literal(lit: &'a Literal) -> Self {
        Side::Lit(lit)
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Side::Json(Value::Number(n)) => n.as_f64(),
            Side::Json(Value::String(s)) => s.trim().parse().ok(),
            Side::Json(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            Side::Json(_) => None,
            Side::Lit(Literal::Num(n)) => Some(*n),
            Side::Lit(Literal::Str(s)) => s.trim().parse().ok(),
            Side::Lit(Literal::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }

    fn as_string(&self) -> String {
        match self {
            Side::Json(Value::String(s)) => s.clone(),
            Side::Json(Value::Bool(b)) => b.to_string(),
            Side::Json(Value::Number(n)) => n.to_string(),
            Side::Json(Value::Null) => "null".to_string(),
            Side::Json(other) => other.to_string(),
            Side::Lit(Literal::Str(s)) => s.clone(),
            Side::Lit(Literal::Num(n)) => format_number(*n),
            Side::Lit(Literal::Bool(b)) => b.to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn numeric(lhs: &Side<'_>, rhs: &Side<'_>) -> Option<(f64, f64)> {
    Some((lhs.as_number()?, rhs.as_number()?))
}

fn loose_eq(lhs: &Side<'_>, rhs: &Side<'_>) -> bool {
    if let Some((a, b)) = numeric(lhs, rhs) {
        return a == b;
    }
    lhs.as_string() == rhs.as_string()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expr: &str, value: Value) -> bool {
        evaluate(&parse(expr), &value)
    }

    #[test]
    fn numeric_comparisons() {
        assert!(eval("value>=10", json!(12)));
        assert!(eval("value>=10", json!(10)));
        assert!(!eval("value>=10", json!(9)));
        assert!(eval("value<=3", json!(3)));
        assert!(eval("value>2.5", json!(2.6)));
        assert!(eval("value<0", json!(-1)));
    }

    #[test]
    fn numeric_strings_coerce() {
        assert!(eval("value>=10", json!("12")));
        assert!(!eval("value>=10", json!("banana")));
    }

    #[test]
    fn loose_equality() {
        assert!(eval("value==\"A\"", json!("A")));
        assert!(!eval("value==\"A\"", json!("B")));
        assert!(eval("value==12", json!("12")));
        assert!(eval("value==1", json!(true)));
        assert!(eval("value==true", json!(true)));
        assert!(eval("value!=5", json!(4)));
        assert!(!eval("value!=5", json!("5")));
    }

    #[test]
    fn contains_operator() {
        assert!(eval("value contains ell", json!("hello")));
        assert!(eval("value contains 'lo'", json!("hello")));
        assert!(!eval("value contains xyz", json!("hello")));
        // Numbers stringify before the substring test.
        assert!(eval("value contains 23", json!(1234)));
    }

    #[test]
    fn operator_priority_ge_before_gt() {
        // ">=" must not be read as ">" followed by "=5".
        assert_eq!(
            parse("value>=5"),
            BranchExpr::Compare {
                lhs: Operand::ValueRef,
                op: CmpOp::Ge,
                rhs: Literal::Num(5.0),
            }
        );
        // "==" is scanned before "!=".
        assert_eq!(
            parse("value!=5"),
            BranchExpr::Compare {
                lhs: Operand::ValueRef,
                op: CmpOp::Ne,
                rhs: Literal::Num(5.0),
            }
        );
    }

    #[test]
    fn literal_lhs_comparisons() {
        assert!(eval("5>3", json!(null)));
        assert!(!eval("'a'=='b'", json!(null)));
        assert!(eval("\"ab\" contains a", json!(null)));
    }

    #[test]
    fn bare_keyword_fallbacks() {
        assert!(eval("true", json!(null)));
        assert!(!eval("false", json!(null)));
        assert!(eval("value", json!("nonempty")));
        assert!(eval("value", json!(1)));
        assert!(!eval("value", json!("")));
        assert!(!eval("value", json!(0)));
        assert!(!eval("value", json!(null)));
        assert!(eval("value", json!({"k": 1})));
    }

    #[test]
    fn unparseable_is_false() {
        assert!(!eval("banana", json!(42)));
        assert!(!eval("", json!(42)));
        assert!(!eval("   ", json!(true)));
    }

    #[test]
    fn quoted_literals_strip_quotes() {
        assert_eq!(parse_literal("\"hi\""), Literal::Str("hi".into()));
        assert_eq!(parse_literal("'hi'"), Literal::Str("hi".into()));
        assert_eq!(parse_literal("hi"), Literal::Str("hi".into()));
        assert_eq!(parse_literal("4.5"), Literal::Num(4.5));
        assert_eq!(parse_literal("true"), Literal::Bool(true));
    }

    #[test]
    fn comparing_incomparable_types_is_false() {
        assert!(!eval("value>=10", json!({"an": "object"})));
        assert!(!eval("value<10", json!(null)));
    }

    #[test]
    fn idempotent_evaluation() {
        let expr = parse("value>=10");
        let v = json!(12);
        assert_eq!(evaluate(&expr, &v), evaluate(&expr, &v));
    }
}
