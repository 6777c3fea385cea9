#![forbid(unsafe_code)]

use crate::error::BoardError;

pub const MIN_NAME_LEN: usize = 2;

/// Checks the user-editable fields shared by create and edit.
/// Every failing rule is reported, in field order.
pub fn validate_item_input(
    name: &str,
    quantity: f64,
    unit: &str,
    supplier: &str,
) -> Result<(), BoardError> {
    let mut errors = Vec::new();
    if name.trim().chars().count() < MIN_NAME_LEN {
        errors.push(format!(
            "Item name must be at least {MIN_NAME_LEN} characters"
        ));
    }
    if !quantity.is_finite() || quantity <= 0.0 {
        errors.push("Quantity must be greater than 0".to_string());
    }
    if unit.trim().is_empty() {
        errors.push("Unit is required".to_string());
    }
    if supplier.trim().is_empty() {
        errors.push("Supplier is required".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BoardError::Validation(errors))
    }
}

/// Blank names and the `Unknown…` stand-ins written by older clients.
pub fn is_placeholder_name(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.starts_with("Unknown")
}

/// Picks the name to keep when `incoming` would replace `current`.
/// A placeholder never displaces a real name.
pub fn choose_name<'a>(current: &'a str, incoming: &'a str) -> &'a str {
    if is_placeholder_name(incoming) && !is_placeholder_name(current) {
        current
    } else {
        incoming
    }
}
