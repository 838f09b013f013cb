//! # vlink CLI

mod camera;
mod comms;
mod logging;

use clap::Parser;
use console::style;
use std::{path::PathBuf, time::Duration};
use vlink_sdk::prelude::*;

/// Example command-line interface for driving a vehicle skill.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cmdline {
    /// URL of the vehicle
    #[arg(long, value_name = "URL", default_value = "http://192.168.10.1")]
    baseurl: String,

    /// Skill to communicate with
    #[arg(long, value_name = "KEY", default_value = "samples.com_link.ComLink")]
    skill_key: String,

    /// Path to the auth token for your simulator
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Become the pilot device (instead of using a phone)
    #[arg(long)]
    pilot: bool,

    /// Send a takeoff command (must be pilot)
    #[arg(long)]
    takeoff: bool,

    /// Send a land command (must be pilot)
    #[arg(long)]
    land: bool,

    /// Title to show on the phone
    #[arg(long, default_value = "Hello World")]
    title: String,

    /// Move forward X meters
    #[arg(long, value_name = "X")]
    forward: Option<f64>,

    /// Keep sending messages
    #[arg(long = "loop")]
    repeat: bool,

    /// Save an image from the vehicle (experimental)
    #[arg(long)]
    image: bool,

    /// Give up on takeoff/land polling after this many seconds
    #[arg(long, value_name = "SECS")]
    poll_deadline: Option<u64>,

    /// Enable verbose console output
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let cmdline = Cmdline::parse();
    logging::Builder::new().verbose(cmdline.verbose).init();
    if let Err(e) = run(cmdline) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cmdline: Cmdline) -> anyhow::Result<()> {
    let mut options = ConnectOptions::default().pilot(cmdline.pilot);
    if let Some(path) = &cmdline.token_file {
        options = options.token_file(path);
    }
    let mut client = Client::connect(&cmdline.baseurl, options)?;

    let mut policy = PollPolicy::default();
    if let Some(secs) = cmdline.poll_deadline {
        policy = policy.with_deadline(Duration::from_secs(secs));
    }
    let cancel = CancelToken::new();

    if cmdline.takeoff {
        client.takeoff(&policy, &cancel)?;
    }
    if cmdline.pilot {
        // The skill must have already been sent to the vehicle via a phone.
        client.set_skill(&cmdline.skill_key)?;
    }

    comms::run(&mut client, &cmdline)?;

    if cmdline.land {
        client.land(&policy, &cancel)?;
    }
    Ok(())
}
