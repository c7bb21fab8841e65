use crate::contract::ParsedRow;

/// Render one row as the warehouse value tuple:
/// `('<id>', '<dateTime>', '<serialNumber>', <click-code>)`.
pub fn render_row(row: &ParsedRow) -> String {
    format!(
        "('{}', '{}', '{}', {})",
        row.id, row.date_time, row.serial_number, row.click_code
    )
}

/// Build the single bulk-insert statement for one batch of rows.
pub fn build_insert_statement(table_name: &str, rows: &[ParsedRow]) -> String {
    let values = rows.iter().map(render_row).collect::<Vec<_>>().join(", ");
    format!("INSERT INTO {table_name} VALUES {values};")
}
