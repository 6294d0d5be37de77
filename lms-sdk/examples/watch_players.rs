//! Print every state change from a server as JSON lines
//!
//! ```text
//! LMS_HOST=192.168.1.10 LMS_LOG_MODE=development cargo run --example watch_players
//! ```

use std::time::Duration;

use lms_sdk::{logging, LmsSystem, SdkError, StateChange};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging_from_env()?;

    let system = LmsSystem::from_env()?;
    match system.wait_ready(Duration::from_secs(15)) {
        Ok(()) => {}
        Err(SdkError::Timeout(waited)) => {
            eprintln!("bootstrap still incomplete after {:?}, continuing", waited);
        }
        Err(e) => return Err(e.into()),
    }

    println!("{}", serde_json::to_string_pretty(&system.snapshots())?);
    println!("{}", serde_json::to_string_pretty(&system.groups())?);

    for change in system.iter() {
        if change.is_diagnostic() {
            continue;
        }
        println!("{}", serde_json::to_string(&change)?);
        if matches!(change, StateChange::ConnectionClosed { .. }) {
            break;
        }
    }

    Ok(())
}
