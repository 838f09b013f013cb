//! The custom-comms send loop.

use crate::Cmdline;
use std::time::{Duration, Instant};
use tracing::warn;
use vlink_sdk::prelude::*;

/// Repeatedly sends a JSON payload to the skill and prints the decoded reply.
///
/// A failed exchange is logged and the loop keeps going: the session itself
/// is still valid. Rate-limited to one message per second when looping.
pub fn run(client: &mut Client, cmdline: &Cmdline) -> anyhow::Result<()> {
    let started = Instant::now();
    loop {
        let elapsed = started.elapsed().as_secs();
        let mut request = serde_json::json!({
            "title": cmdline.title,
            "detail": elapsed,
        });
        if let Some(forward) = cmdline.forward {
            request["forward"] = forward.into();
        }
        println!("custom comms request: {request}");

        // Arbitrary payload format; the sample skill speaks JSON.
        match client.send_custom_comms(&cmdline.skill_key, request.to_string().as_bytes(), false) {
            Ok(Some(reply)) => print_reply(&reply),
            Ok(None) => println!("custom comms response: (none)"),
            Err(err) => warn!("comms error: {err}"),
        }

        if cmdline.image {
            let filename = format!("image_{elapsed}.png");
            if let Err(err) = crate::camera::save_image(client, &filename) {
                warn!("image capture failed: {err}");
            }
        }

        if cmdline.repeat {
            std::thread::sleep(Duration::from_secs(1));
        } else {
            break;
        }
    }
    Ok(())
}

fn print_reply(reply: &CommsReply) {
    let meta = serde_json::Value::Object(reply.meta.clone());
    match &reply.data {
        Some(data) => println!(
            "custom comms response: {} {meta}",
            String::from_utf8_lossy(data)
        ),
        None => println!("custom comms response: {meta}"),
    }
}
