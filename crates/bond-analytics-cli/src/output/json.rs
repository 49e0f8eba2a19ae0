use serde_json::Value;

/// Print the full computation envelope (result, assumptions, warnings,
/// metadata) as pretty JSON.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("failed to render output as JSON: {e}"),
    }
}
