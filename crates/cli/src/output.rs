use crate::error::CliError;
use model::{
    core::value::Value,
    pagination::{fetch_result::FetchResult, order::OrderSpec, token::CursorToken},
};
use serde_json::json;

/// Prints the rows of `result` as JSON lines, followed by the next cursor
/// token when there is another page.
pub fn print_page(result: &FetchResult, order: &OrderSpec) -> Result<(), CliError> {
    for row in &result.rows {
        println!("{}", serde_json::to_string(&row.to_json())?);
    }

    if let Some(cursor) = &result.next_cursor {
        let token = CursorToken::encode(cursor, order)?;
        println!("{}", json!({ "next_cursor": token }));
    }
    Ok(())
}

pub fn print_page_summary(number: usize, result: &FetchResult) {
    println!(
        "page {number:>4}: {:>4} rows in {} ms{}",
        result.row_count,
        result.took_ms,
        if result.reached_end { " (last)" } else { "" }
    );
}

pub fn print_sql(sql: &str, params: &[Value]) -> Result<(), CliError> {
    println!("{sql}");
    let params: Vec<_> = params.iter().map(Value::to_json).collect();
    println!("{}", serde_json::to_string(&params)?);
    Ok(())
}
