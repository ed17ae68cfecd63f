use crate::data::ReportError;

/// Binary-level error: a message for the user plus the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        let exit_code = match err {
            ReportError::QueryConstruction(_) => 2,
            ReportError::Api { .. } | ReportError::Transport(_) => 4,
            ReportError::Authorization(_) => 5,
        };
        Self::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_errors_map_to_distinct_exit_codes() {
        let construction: AppError = ReportError::QueryConstruction("bad id".to_string()).into();
        let api: AppError = ReportError::Api {
            status: 500,
            reason: "backendError".to_string(),
        }
        .into();
        let auth: AppError = ReportError::Authorization("authError".to_string()).into();

        assert_eq!(construction.exit_code(), 2);
        assert_eq!(api.exit_code(), 4);
        assert_eq!(auth.exit_code(), 5);
        assert_eq!(api.to_string(), "Arg, there was an API error : 500 : backendError");
    }
}
