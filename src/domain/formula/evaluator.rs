use super::ast::{BinaryOperator, Expr, Function, UnaryOperator};
use super::{FormulaError, FormulaResult};

pub(super) fn evaluate(expr: &Expr, x: f64) -> FormulaResult<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::X => Ok(x),
        Expr::UnaryOp { op, operand } => {
            let value = evaluate(operand, x)?;
            Ok(match op {
                UnaryOperator::Negate => -value,
                UnaryOperator::Plus => value,
            })
        }
        Expr::BinaryOp { op, left, right } => {
            let left = evaluate(left, x)?;
            let right = evaluate(right, x)?;
            apply_binary(*op, left, right)
        }
        Expr::Call { function, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, x))
                .collect::<FormulaResult<Vec<f64>>>()?;
            call_function(*function, &values)
        }
    }
}

fn apply_binary(op: BinaryOperator, left: f64, right: f64) -> FormulaResult<f64> {
    match op {
        BinaryOperator::Add => Ok(left + right),
        BinaryOperator::Subtract => Ok(left - right),
        BinaryOperator::Multiply => Ok(left * right),
        BinaryOperator::Divide => {
            if right == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            Ok(left / right)
        }
        BinaryOperator::Power => power(left, right),
    }
}

fn power(base: f64, exponent: f64) -> FormulaResult<f64> {
    if base == 0.0 && exponent < 0.0 {
        return Err(FormulaError::DivisionByZero);
    }
    // A real result does not exist.
    if base < 0.0 && exponent.is_finite() && exponent.fract() != 0.0 {
        return Err(FormulaError::Domain(format!(
            "{} raised to non-integer power {}",
            base, exponent
        )));
    }
    let value = base.powf(exponent);
    if value.is_infinite() && base.is_finite() && exponent.is_finite() {
        return Err(FormulaError::Overflow(format!("{} ** {}", base, exponent)));
    }
    Ok(value)
}

fn call_function(function: Function, args: &[f64]) -> FormulaResult<f64> {
    match (function, args) {
        (Function::Exp, [value]) => {
            let result = value.exp();
            if result.is_infinite() && value.is_finite() {
                return Err(FormulaError::Overflow(format!("exp({})", value)));
            }
            Ok(result)
        }
        (Function::Sqrt, [value]) => {
            if *value < 0.0 {
                return Err(FormulaError::Domain(format!("sqrt({})", value)));
            }
            Ok(value.sqrt())
        }
        (Function::Log, [value]) => ln(*value),
        (Function::Log, [value, base]) => {
            let numerator = ln(*value)?;
            let denominator = ln(*base)?;
            if denominator == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            Ok(numerator / denominator)
        }
        (Function::Log, _) => Err(FormulaError::ArgumentCount {
            function: function.name(),
            expected: "1 or 2",
            actual: args.len(),
        }),
        (Function::Exp | Function::Sqrt, _) => Err(FormulaError::ArgumentCount {
            function: function.name(),
            expected: "1",
            actual: args.len(),
        }),
    }
}

fn ln(value: f64) -> FormulaResult<f64> {
    if value <= 0.0 {
        return Err(FormulaError::Domain(format!("log({})", value)));
    }
    Ok(value.ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::formula::Formula;

    fn eval(expression: &str, x: f64) -> FormulaResult<f64> {
        Formula::parse_expression(expression)?.eval(x)
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0), Ok(7.0));
        assert_eq!(eval("(1 + 2) * 3", 0.0), Ok(9.0));
        assert_eq!(eval("10 - 4 - 3", 0.0), Ok(3.0));
        assert_eq!(eval("12 / 3 / 2", 0.0), Ok(2.0));
    }

    #[test]
    fn test_power_semantics() {
        assert_eq!(eval("2^3^2", 0.0), Ok(512.0));
        assert_eq!(eval("-x^2", 3.0), Ok(-9.0));
        assert_eq!(eval("2^-1", 0.0), Ok(0.5));
        assert_eq!(eval("(-2)^3", 0.0), Ok(-8.0));
        assert_eq!(eval("x**0", 0.0), Ok(1.0));
    }

    #[test]
    fn test_power_failures() {
        assert_eq!(eval("0^-1", 0.0), Err(FormulaError::DivisionByZero));
        assert!(matches!(eval("(-8)^(1/3)", 0.0), Err(FormulaError::Domain(_))));
        assert!(matches!(eval("10^400", 0.0), Err(FormulaError::Overflow(_))));
    }

    #[test]
    fn test_large_products_are_not_errors() {
        // Plain multiplication saturates rather than failing.
        assert_eq!(eval("1e308 * 10", 0.0), Ok(f64::INFINITY));
    }

    #[test]
    fn test_log_domain() {
        assert!(matches!(eval("log(0)", 0.0), Err(FormulaError::Domain(_))));
        assert!(matches!(eval("log(x)", -2.0), Err(FormulaError::Domain(_))));
        assert_eq!(eval("log(8, 1)", 0.0), Err(FormulaError::DivisionByZero));
        assert!(matches!(eval("log(8, -2)", 0.0), Err(FormulaError::Domain(_))));
    }

    #[test]
    fn test_argument_counts() {
        assert!(matches!(
            eval("sqrt(1, 2)", 0.0),
            Err(FormulaError::ArgumentCount { actual: 2, .. })
        ));
        assert!(matches!(
            eval("log()", 0.0),
            Err(FormulaError::ArgumentCount { actual: 0, .. })
        ));
        assert!(matches!(
            eval("exp(1, 2, 3)", 0.0),
            Err(FormulaError::ArgumentCount { actual: 3, .. })
        ));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("x / (x - 2)", 2.0), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("x / (x - 2)", 4.0), Ok(2.0));
    }
}
