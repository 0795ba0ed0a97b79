/// A fault while executing compiled code.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("runtime error at {ip:04}: {message}")]
    Fault { ip: usize, message: String },

    /// The code failed verification before running.
    #[error("runtime error: rejected code: {0}")]
    Verify(String),

    #[error("runtime error: {0}")]
    Limit(String),

    #[error("runtime error: cannot write output: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn fault(ip: usize, message: impl Into<String>) -> Self {
        RuntimeError::Fault {
            ip,
            message: message.into(),
        }
    }

    pub fn stack_underflow(ip: usize) -> Self {
        Self::fault(ip, "stack underflow")
    }

    pub fn division_by_zero(ip: usize) -> Self {
        Self::fault(ip, "division by zero")
    }

    pub fn type_error(ip: usize, expected: &str, got: &str) -> Self {
        Self::fault(ip, format!("type error: expected {}, got {}", expected, got))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_display() {
        let err = RuntimeError::division_by_zero(7);
        assert_eq!(err.to_string(), "runtime error at 0007: division by zero");
    }

    #[test]
    fn test_type_error_display() {
        let err = RuntimeError::type_error(0, "int", "string");
        assert_eq!(
            err.to_string(),
            "runtime error at 0000: type error: expected int, got string"
        );
    }
}
