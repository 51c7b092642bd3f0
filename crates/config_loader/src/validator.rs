//! Config validation
//!
//! Rules:
//! - handler fields pass `HandlerConfig::validate`
//! - baud_rate > 0
//! - query width is a valid averaging width
//! - query directions are unique
//! - interval_ms > 0

use std::collections::HashSet;

use contracts::{ContractError, HandlerBlueprint};

/// Validate a `HandlerBlueprint`
///
/// Returns the first error encountered.
pub fn validate(blueprint: &HandlerBlueprint) -> Result<(), ContractError> {
    blueprint.handler.validate()?;
    validate_baud_rate(blueprint)?;
    validate_query_width(blueprint)?;
    validate_query_directions(blueprint)?;
    validate_query_interval(blueprint)?;
    Ok(())
}

fn validate_baud_rate(blueprint: &HandlerBlueprint) -> Result<(), ContractError> {
    if blueprint.handler.baud_rate == 0 {
        return Err(ContractError::config_validation(
            "handler.baud_rate",
            "baud rate must be > 0",
        ));
    }
    Ok(())
}

fn validate_query_width(blueprint: &HandlerBlueprint) -> Result<(), ContractError> {
    averaging::validate_width(blueprint.query.width)
        .map_err(|e| ContractError::config_validation("query.width", e.to_string()))
}

fn validate_query_directions(blueprint: &HandlerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for direction in &blueprint.query.directions {
        if !seen.insert(direction) {
            return Err(ContractError::config_validation(
                format!("query.directions[{direction}]"),
                "duplicate direction",
            ));
        }
    }
    Ok(())
}

fn validate_query_interval(blueprint: &HandlerBlueprint) -> Result<(), ContractError> {
    if blueprint.query.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "query.interval_ms",
            "interval_ms must be > 0",
        ));
    }
    Ok(())
}
