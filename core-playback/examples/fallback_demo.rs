//! # Playback Fallback Demo
//!
//! Feeds a file through the fallback chain as if the native surface had
//! refused it, then writes whatever the chain installed next to the input.
//!
//! Run with: `cargo run --example fallback_demo --package core-playback -- path/to/audio`

use bridge_traits::{BridgeError, LogLevel, PlaybackSurface, ResourceUrl};
use bytes::Bytes;
use core_playback::{FallbackConfig, PlaybackFallback, PlaybackState, SourceAsset, SymphoniaDecoder};
use core_runtime::logging::{init_logging, strip_path, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Console Surface (for demonstration)
// ============================================================================

/// Keeps resources in memory and prints every call.
#[derive(Default)]
struct ConsoleSurface {
    resources: Mutex<HashMap<String, Bytes>>,
    next_id: Mutex<u32>,
}

impl ConsoleSurface {
    fn bytes(&self, url: &ResourceUrl) -> Option<Bytes> {
        self.resources.lock().get(url.as_str()).cloned()
    }
}

impl PlaybackSurface for ConsoleSurface {
    fn create_resource(&self, data: Bytes, media_type: &str) -> Result<ResourceUrl, BridgeError> {
        let mut id = self.next_id.lock();
        *id += 1;
        let url = format!("mem://resource/{}", *id);
        println!("  + {} ({} bytes, {:?})", url, data.len(), media_type);
        self.resources.lock().insert(url.clone(), data);
        Ok(ResourceUrl::new(url))
    }

    fn release_resource(&self, url: &ResourceUrl) {
        println!("  - {}", url);
        self.resources.lock().remove(url.as_str());
    }

    fn load(&self, url: &ResourceUrl) -> Result<(), BridgeError> {
        println!("  > load {}", url);
        Ok(())
    }

    fn stop(&self) {
        println!("  # stop");
    }
}

fn guess_media_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        _ => "",
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let Some(input) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: fallback_demo <audio file>");
        std::process::exit(2);
    };

    println!("=== Playback Fallback Demo ===\n");

    let data = std::fs::read(&input)?;
    tracing::info!(
        file = strip_path(&input.to_string_lossy()),
        len = data.len(),
        "Loaded source file"
    );
    let asset = SourceAsset::new(data, guess_media_type(&input));

    let surface = Arc::new(ConsoleSurface::default());
    let fallback = PlaybackFallback::new(
        surface.clone(),
        Arc::new(SymphoniaDecoder::new()),
        FallbackConfig::default(),
    )?;

    println!("1. Assigning {}", input.display());
    let generation = fallback.assign(asset)?;

    println!("\n2. Simulating a native playback error");
    let state = fallback.on_playback_error(generation).await;
    println!("   -> {}", state);

    match state {
        PlaybackState::Ready => {
            let recovered = fallback
                .current_url()
                .and_then(|url| surface.bytes(&url))
                .ok_or("ready without an installed resource")?;
            let output = input.with_extension("recovered.wav");
            std::fs::write(&output, &recovered)?;
            println!("\n3. Wrote {} bytes to {}", recovered.len(), output.display());
        }
        PlaybackState::Failed => {
            println!(
                "\n3. {}",
                fallback.error_message().unwrap_or_default()
            );
        }
        other => println!("\n3. Unexpected state {}", other),
    }

    println!("\n4. Tearing down");
    fallback.teardown();

    Ok(())
}
