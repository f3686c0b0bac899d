use anyhow::Result;
use sandbox_protocol::{SandboxField, StatusResponse, format_expiry};

pub fn print_status(status: &StatusResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }
    let Some(record) = &status.sandbox else {
        println!("no sandbox");
        return Ok(());
    };
    for field in SandboxField::ALL {
        println!("{:<14} {}", field.key(), record.connection.get(field));
    }
    println!("{:<14} {}", "expires", format_expiry(record.expires));
    Ok(())
}
