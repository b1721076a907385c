//! Tunable machine parameters.

use crate::consts::{PRINT_STRING_CAP, STEP_BACK_LIMIT};

/// Host-tunable knobs, with the defaults every standard host uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmParams {
    /// How many executed steps the undo journal retains.
    pub step_back_limit: usize,
    /// Safety cap on PRINT_STRING walks.
    pub print_string_cap: usize,
}

impl Default for VmParams {
    fn default() -> Self {
        Self {
            step_back_limit: STEP_BACK_LIMIT,
            print_string_cap: PRINT_STRING_CAP,
        }
    }
}
