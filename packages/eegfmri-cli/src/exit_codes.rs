//! Process exit codes.

use eegfmri_clean::{BatchOutcome, CleanError};

/// Every file completed every selected step
pub const SUCCESS: i32 = 0;
/// Every file failed, or the run could not proceed
pub const EXECUTION_ERROR: i32 = 1;
/// Bad arguments, configuration, or no matching files
pub const INPUT_ERROR: i32 = 2;
/// Some files failed while others succeeded
pub const PARTIAL_FAILURE: i32 = 3;

pub fn for_error(err: &CleanError) -> i32 {
    if err.is_input_error() {
        INPUT_ERROR
    } else {
        EXECUTION_ERROR
    }
}

pub fn for_outcome(outcome: BatchOutcome) -> i32 {
    match outcome {
        BatchOutcome::Success => SUCCESS,
        BatchOutcome::PartialFailure => PARTIAL_FAILURE,
        BatchOutcome::Failure => EXECUTION_ERROR,
    }
}
