/// A parsing error with source location.
///
/// `line` and `col` are 1-based and point at the furthest position any
/// grammar alternative reached before failing. `expected` lists what would
/// have been accepted there, sorted and de-duplicated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{col}: expected {}, found {found}", format_expected(.expected))]
pub struct ParseError {
    pub line: usize,
    pub col: usize,
    pub expected: Vec<String>,
    pub found: String,
}

fn format_expected(expected: &[String]) -> String {
    match expected {
        [] => "valid input".to_string(),
        [one] => one.clone(),
        [init @ .., last] => format!("one of {} or {}", init.join(", "), last),
    }
}
