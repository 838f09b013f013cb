//! Experimental raw image capture.

use anyhow::{Context, anyhow};
use std::time::Instant;
use tracing::debug;
use vlink_sdk::{
    frame::{self, PixelFormat},
    prelude::*,
};

/// Fetches the latest color frame from the vehicle and saves it as a PNG.
///
/// Not a high-speed image API: the pixel data crosses HTTP uncompressed.
pub fn save_image(client: &mut Client, filename: &str) -> anyhow::Result<()> {
    let fetched = Instant::now();
    let data = client.request_json::<()>("channel/SUBJECT_CAMERA_RIG_NATIVE", None)?;
    debug!("got frame metadata in {:?}", fetched.elapsed());

    let Some(meta) = data["json"]["images"].get(0) else {
        return Ok(());
    };
    let path = meta["data"]
        .as_str()
        .context("frame metadata has no shared-memory path")?;
    let width = meta["width"].as_u64().context("frame metadata has no width")? as u32;
    let height = meta["height"]
        .as_u64()
        .context("frame metadata has no height")? as u32;
    let code = meta["pixelformat"]
        .as_u64()
        .context("frame metadata has no pixelformat")? as u32;
    let format =
        PixelFormat::from_code(code).ok_or_else(|| anyhow!("unsupported pixelformat {code}"))?;

    let downloaded = Instant::now();
    let bytes = client.fetch_shm(path)?;
    debug!("got {} pixel bytes in {:?}", bytes.len(), downloaded.elapsed());

    let image = frame::decode_frame(&bytes, width, height, format)?;
    image.save(filename)?;
    println!("saved {filename}");
    Ok(())
}
