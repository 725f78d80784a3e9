//! Plays a scripted track and prints the playhead of every snapshot.
//!
//! A background task stands in for the host's audio element: it loads
//! metadata, reports "canplay" and then advances the playhead every 250ms.
//! The controller is stopped after a fixed number of ticks, which tears the
//! session down and ends the stream.
//!
//! Run with: cargo run -p mediaflow --example scripted_playback --features test-support
//! Set RUST_LOG=mediaflow=debug to see session setup and teardown.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use mediaflow::prelude::*;
use mediaflow::ScriptedResource;
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(250);
const TICKS_BEFORE_STOP: u32 = 8;

/// Drive the resource the way a browser audio element would
async fn simulate_host(resource: Arc<ScriptedResource>, controller: Arc<AudioController>) {
    resource.emit(MediaEvent::LoadStart);
    resource.set_duration(Some(30.0));
    resource.emit(MediaEvent::DurationChange);
    resource.emit(MediaEvent::LoadedMetadata);
    resource.emit(MediaEvent::CanPlay);

    // autoplay called play() on "canplay"
    if !resource.paused() {
        resource.emit(MediaEvent::Play);
        resource.emit(MediaEvent::Playing);
    }

    for tick in 1..=TICKS_BEFORE_STOP {
        tokio::time::sleep(TICK).await;
        resource.set_buffered_end(f64::from(tick) * 2.0);
        resource.tick(f64::from(tick) * TICK.as_secs_f64());
    }

    let cancelled = controller.stop();
    println!("stop() cancelled {} session(s)", cancelled);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let resource = Arc::new(ScriptedResource::new());
    let controller = Arc::new(AudioController::new(resource.clone()));

    let mut stream = controller.play("demo/track.mp3").subscribe()?;
    println!("Subscribed as {}", stream.session_id());

    let host = tokio::spawn(simulate_host(resource.clone(), Arc::clone(&controller)));

    while let Some(item) = stream.next().await {
        let snapshot = item?;
        println!(
            "t={:>5.2}s  playing={:<5}  buffered={:>4.1}s  remaining={:?}",
            snapshot.current_time,
            snapshot.playing,
            snapshot.buffered,
            snapshot.remaining()
        );
    }

    host.await?;
    println!(
        "Stream ended ({}), {} listener(s) left on the resource",
        stream
            .termination()
            .map(|reason| reason.to_string())
            .unwrap_or_else(|| "still open".to_string()),
        resource.listener_count()
    );

    Ok(())
}
