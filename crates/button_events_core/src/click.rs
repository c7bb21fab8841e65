/// Click-state codes as stored in the warehouse. DOUBLE is treated the same
/// as SINGLE.
pub fn click_code(click_type: &str) -> Option<i32> {
    match click_type {
        "SINGLE" => Some(1),
        "DOUBLE" => Some(1),
        "LONG" => Some(3),
        _ => None,
    }
}
