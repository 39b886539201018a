//! Response validation.
//!
//! Checks run in a fixed order and the first failure rejects the whole
//! batch:
//! 1. trailing marker equals [`MAGIC`]
//! 2. every method id belongs to the catalog
//! 3. every schedulable flag is 0 or 1
//! 4. all flags agree (when [`ValidationRules::require_consistent_verdicts`])

use super::wire_format::MAGIC;
use crate::error::{BenchError, Result};
use crate::model::{DecodedResponse, MethodCatalog};

/// Session-level validation switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Treat disagreeing verdicts across methods as a corrupted exchange.
    pub require_consistent_verdicts: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            require_consistent_verdicts: true,
        }
    }
}

/// Validate a decoded response against the session catalog.
pub fn validate(
    response: &DecodedResponse,
    catalog: &MethodCatalog,
    rules: &ValidationRules,
) -> Result<()> {
    if response.magic != MAGIC {
        return Err(BenchError::BadMagic {
            found: response.magic,
        });
    }

    if let Some(record) = response.records.iter().find(|r| !catalog.contains(r.method_id)) {
        return Err(BenchError::InvalidMethodId {
            id: record.method_id,
        });
    }

    if let Some(record) = response
        .records
        .iter()
        .find(|r| r.schedulable != 0 && r.schedulable != 1)
    {
        return Err(BenchError::InvalidFlag {
            method_id: record.method_id,
            flag: record.schedulable,
        });
    }

    if rules.require_consistent_verdicts {
        if let Some(first) = response.records.first() {
            if response
                .records
                .iter()
                .any(|r| r.schedulable != first.schedulable)
            {
                return Err(BenchError::InconsistentSchedulability {
                    verdicts: response
                        .records
                        .iter()
                        .map(|r| (r.method_id, r.schedulable))
                        .collect(),
                });
            }
        }
    }

    Ok(())
}
