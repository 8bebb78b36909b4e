//! Process exit codes and the reason codes written to `summary.json`.
//! Both are part of the public contract.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_TEST_FAILURE: i32 = 1; // at least one question failed
pub const EXIT_CONFIG_ERROR: i32 = 2; // config, dataset or credentials unusable
pub const EXIT_RUN_ABORTED: i32 = 3; // login failed or the session died

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    /// One or more questions failed validation.
    ETestFailed,
    EAuthFailed,
    ESessionTerminated,
    ECfgParse,
    EDatasetInvalid,
    EMissingCredentials,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::ETestFailed => "E_TEST_FAILED",
            ReasonCode::EAuthFailed => "E_AUTH_FAILED",
            ReasonCode::ESessionTerminated => "E_SESSION_TERMINATED",
            ReasonCode::ECfgParse => "E_CFG_PARSE",
            ReasonCode::EDatasetInvalid => "E_DATASET_INVALID",
            ReasonCode::EMissingCredentials => "E_MISSING_CREDENTIALS",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            ReasonCode::ETestFailed => EXIT_TEST_FAILURE,
            ReasonCode::EAuthFailed | ReasonCode::ESessionTerminated => EXIT_RUN_ABORTED,
            ReasonCode::ECfgParse
            | ReasonCode::EDatasetInvalid
            | ReasonCode::EMissingCredentials => EXIT_CONFIG_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_reasons_map_to_exit_3() {
        assert_eq!(ReasonCode::EAuthFailed.exit_code(), 3);
        assert_eq!(ReasonCode::ESessionTerminated.exit_code(), 3);
        assert_eq!(ReasonCode::ETestFailed.exit_code(), 1);
        assert_eq!(ReasonCode::EDatasetInvalid.exit_code(), 2);
    }
}
