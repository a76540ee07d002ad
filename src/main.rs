use std::fs::OpenOptions;
use std::time::Duration;

use anyhow::Context;
use tokio::net::UdpSocket;

use crate::config::StripConfig;
use crate::pipeline::Pipeline;
use crate::render::StrandRenderer;
use crate::sounds::{Player, Silent, SoundCues};
use crate::strand::{PulseCancel, Strand};
use crate::translator::Translator;

mod config;
mod directive;
mod error;
mod pipeline;
mod render;
mod sounds;
mod strand;
mod translator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let device = args
        .get(1)
        .expect("Expected strip device path as first argument.");
    let bind_addr = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "0.0.0.0:5005".to_string());
    let config = match args.get(3) {
        Some(path) => StripConfig::load_json_file(path)?,
        None => StripConfig::default(),
    };

    let sink = OpenOptions::new()
        .write(true)
        .open(device)
        .with_context(|| format!("open strip device {device}"))?;

    let mut strand = Strand::new(config.led_count, sink);
    if config.coarse_pulse_cancel {
        strand = strand.with_pulse_cancel(PulseCancel::EndOfCycle);
    }

    // short wheel sweep so a powered strip is visibly alive on boot
    for _ in 0..64 {
        strand.wheel()?;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    strand.fill(0, 0, 0)?;

    let sounds_dir = std::env::var("SOUNDS_DIR").ok();
    let play_sound = sounds_dir.is_some();
    let sounds: Box<dyn SoundCues + Send> = match sounds_dir {
        Some(dir) => Box::new(Player::new(dir)),
        None => Box::new(Silent),
    };

    let renderer = StrandRenderer::new(strand.clone());
    let pipelines: Vec<_> = config
        .pipelines
        .iter()
        .cloned()
        .map(|pipeline| Pipeline::new(pipeline, renderer.clone()))
        .collect();
    let mut translator = Translator::new(pipelines, sounds);

    // dim idle breathe until the first build event lands
    strand.pulsate(0, 0, 40);

    tokio::spawn(async move {
        (async {
            let socket = UdpSocket::bind(&bind_addr)
                .await
                .with_context(|| format!("bind {bind_addr}"))?;
            log::info!("listening for build events on {bind_addr}");

            let mut buf = [0u8; 1024];
            loop {
                let (len, peer) = socket.recv_from(&mut buf).await?;
                let message = String::from_utf8_lossy(&buf[..len]);
                log::debug!("{peer}: {message}");

                match directive::parse(&message) {
                    Ok(directive) => {
                        if let Err(err) = translator.issue_directive(&directive, play_sound) {
                            log::warn!("directive dropped: {err}");
                        }
                    }
                    Err(err) => log::warn!("message dropped: {err}"),
                }
            }

            // Need to annotate Result type here or this won't compile
            #[allow(unreachable_code)]
            Ok::<(), anyhow::Error>(())
        })
        .await
        .map_err(|err| log::error!("serve loop stopped: {err}"))
        .ok();
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            log::info!("ctrl-c received, blanking the strip");
            strand.fill(0, 0, 0)?;
        }
        Err(err) => {
            log::error!("unable to listen for shutdown signal: {err}");
        }
    }

    Ok(())
}
