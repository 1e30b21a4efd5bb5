use log::info;
use serde::Serialize;
use std::path::Path;

/// Write `body` to `output`, or to stdout when no path is given.
pub fn write_output(body: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, body)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", body),
    }
    Ok(())
}

pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    write_output(&body, output)
}
