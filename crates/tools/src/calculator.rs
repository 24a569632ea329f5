//! Calculator tool: evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, parentheses, unary negation, and decimal
//! numbers. Precedence climbing over a flat token list; no dependencies
//! beyond std.

use async_trait::async_trait;

use baton_core::{
    ParamType, Tool, ToolCallContext, ToolDefinition, ToolError, ToolParameter, ToolResult,
};

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "calculator",
            "Evaluate an arithmetic expression. Supports +, -, *, /, parentheses, and decimal numbers.",
        )
        .with_parameter(ToolParameter::required(
            "expression",
            ParamType::String,
            "The expression to evaluate, e.g. '(2 + 3) * 4'",
        ))
    }

    async fn execute(
        &self,
        _ctx: &ToolCallContext,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let expression = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'expression'".into()))?;

        match evaluate(expression) {
            Ok(value) => Ok(ToolResult::ok(serde_json::json!({
                "expression": expression,
                "value": value,
            }))),
            Err(reason) => Ok(ToolResult::failed(format!(
                "cannot evaluate '{expression}': {reason}"
            ))),
        }
    }
}

// ── Expression evaluator ──────────────────────────────────────────────────

/// Evaluate an arithmetic expression string.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    let mut cursor = Cursor { tokens, pos: 0 };
    let value = cursor.expression(0)?;
    match cursor.peek() {
        None => Ok(value),
        Some(token) => Err(format!("unexpected trailing {token:?}")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Operator(char),
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Operator(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let number = literal
                    .parse()
                    .map_err(|_| format!("invalid number '{literal}'"))?;
                tokens.push(Token::Number(number));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Fold in operators whose binding power is at least `min_power`; the
    /// right side always climbs one power higher, keeping `-` and `/`
    /// left-associative.
    fn expression(&mut self, min_power: u8) -> Result<f64, String> {
        let mut left = self.operand()?;
        while let Some(Token::Operator(op)) = self.peek() {
            let power = binding_power(op);
            if power < min_power {
                break;
            }
            self.advance();
            let right = self.expression(power + 1)?;
            left = apply(op, left, right)?;
        }
        Ok(left)
    }

    fn operand(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Operator('-')) => Ok(-self.operand()?),
            Some(Token::Open) => {
                let value = self.expression(0)?;
                match self.advance() {
                    Some(Token::Close) => Ok(value),
                    _ => Err("expected closing parenthesis".into()),
                }
            }
            Some(token) => Err(format!("unexpected {token:?}")),
            None => Err("unexpected end of expression".into()),
        }
    }
}

fn binding_power(op: char) -> u8 {
    match op {
        '+' | '-' => 1,
        _ => 2,
    }
}

fn apply(op: char, left: f64, right: f64) -> Result<f64, String> {
    match op {
        '+' => Ok(left + right),
        '-' => Ok(left - right),
        '*' => Ok(left * right),
        '/' if right == 0.0 => Err("division by zero".into()),
        '/' => Ok(left / right),
        _ => Err(format!("unknown operator '{op}'")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_addition() {
        assert_eq!(evaluate("2 + 3").unwrap(), 5.0);
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
    }

    #[test]
    fn left_associativity() {
        assert_eq!(evaluate("10 - 3 - 2").unwrap(), 5.0);
        assert_eq!(evaluate("24 / 4 / 2").unwrap(), 3.0);
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn unary_negation() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("-(2 + 3)").unwrap(), -5.0);
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("3.14 * 2").unwrap(), 6.28);
        assert_eq!(evaluate(".5 + .5").unwrap(), 1.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(evaluate("1 / 0").unwrap_err().contains("division by zero"));
    }

    #[test]
    fn malformed_expressions_are_errors() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("(2 + 3").is_err());
        assert!(evaluate("2 3").is_err());
        assert!(evaluate("1.2.3").is_err());
        assert!(evaluate("2 $ 3").is_err());
    }

    #[tokio::test]
    async fn execute_returns_a_structured_payload() {
        let ctx = ToolCallContext::new(baton_core::TaskId::new(), "tester");
        let result = CalculatorTool
            .execute(&ctx, serde_json::json!({"expression": "2 + 3"}))
            .await
            .unwrap();

        assert!(result.success);
        let payload = result.result.unwrap();
        assert_eq!(payload["expression"], "2 + 3");
        assert_eq!(payload["value"].as_f64(), Some(5.0));
    }

    #[tokio::test]
    async fn execute_reports_evaluation_failures_as_failed_results() {
        let ctx = ToolCallContext::new(baton_core::TaskId::new(), "tester");
        let result = CalculatorTool
            .execute(&ctx, serde_json::json!({"expression": "1 / 0"}))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("division by zero"));
    }

    #[tokio::test]
    async fn execute_without_an_expression_is_invalid() {
        let ctx = ToolCallContext::new(baton_core::TaskId::new(), "tester");
        let err = CalculatorTool
            .execute(&ctx, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn definition_declares_the_required_parameter() {
        let definition = CalculatorTool.definition();
        assert_eq!(definition.name, "calculator");
        assert_eq!(definition.parameters.len(), 1);
        assert!(definition.parameters[0].required);
    }
}
