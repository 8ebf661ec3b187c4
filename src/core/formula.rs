use thiserror::Error;

/// Markup/script-like tokens that are never allowed inside a formula,
/// matched case-insensitively.
const FORBIDDEN_TOKENS: &[&str] = &["<script>", "<iframe>", "javascript:", "vbscript:"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("the formula is empty")]
    Empty,
    #[error("the formula contains a forbidden token: {0}")]
    ForbiddenToken(&'static str),
    #[error("unbalanced parentheses in the formula")]
    UnbalancedParens,
}

/// Prefix the formula with `=` when the user left it off.
pub fn normalize(formula: &str) -> String {
    let formula = formula.trim();
    if formula.starts_with('=') {
        formula.to_string()
    } else {
        format!("={formula}")
    }
}

/// Heuristic sanity check, not a parser: the formula must be non-empty,
/// free of forbidden tokens, and have matching `(` / `)` counts. Function
/// names, arity and range syntax are left to the spreadsheet. Returns the
/// `=`-normalized formula on success.
pub fn validate(formula: &str) -> Result<String, FormulaError> {
    if formula.trim().is_empty() {
        return Err(FormulaError::Empty);
    }

    let normalized = normalize(formula);
    let lowered = normalized.to_lowercase();
    for token in FORBIDDEN_TOKENS {
        if lowered.contains(token) {
            return Err(FormulaError::ForbiddenToken(token));
        }
    }

    let open = normalized.matches('(').count();
    let close = normalized.matches(')').count();
    if open != close {
        return Err(FormulaError::UnbalancedParens);
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn leading_equals_is_normalized() {
        assert_eq!(validate("SUM(A1:A10)"), Ok("=SUM(A1:A10)".to_string()));
        assert_eq!(validate("=SUM(A1:A10)"), Ok("=SUM(A1:A10)".to_string()));
    }

    #[test]
    fn empty_formula_is_rejected() {
        assert_eq!(validate(""), Err(FormulaError::Empty));
        assert_eq!(validate("   "), Err(FormulaError::Empty));
    }

    #[test]
    fn unbalanced_parens_are_rejected() {
        assert_eq!(validate("SUM(A1:A10"), Err(FormulaError::UnbalancedParens));
        assert_eq!(validate("SUM A1:A10)"), Err(FormulaError::UnbalancedParens));
    }

    #[test]
    fn forbidden_tokens_are_rejected_regardless_of_balance() {
        assert_eq!(
            validate("IF(A1,\"javascript:alert()\",B1)"),
            Err(FormulaError::ForbiddenToken("javascript:"))
        );
        assert_eq!(
            validate("CONCAT(\"<SCRIPT>\",A1)"),
            Err(FormulaError::ForbiddenToken("<script>"))
        );
    }
}
