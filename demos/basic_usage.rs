// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic geomark-sync usage example.
//!
//! Demonstrates:
//! 1. Wiring a session over in-memory stores (pre-seeded with one marker)
//! 2. Startup bulk fetch
//! 3. Dropping a photo on Copenhagen
//! 4. A rejected submission and a cancelled pick
//! 5. Displaying metrics
//! 6. Clean shutdown
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::sync::Arc;

use geomark_sync::storage::memory::{InMemoryMediaStore, InMemoryMetadataStore};
use geomark_sync::{
    MarkerId, MarkerRecord, MediaRef, PickOutcome, SyncSession, SyncSessionConfig,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           geomark-sync: Basic Usage Example                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Stores and session
    // ─────────────────────────────────────────────────────────────────────────
    let media = Arc::new(InMemoryMediaStore::new("mapapp"));
    let metadata = Arc::new(InMemoryMetadataStore::new());
    metadata.seed(MarkerRecord {
        id: MarkerId::from("little-mermaid"),
        latitude: 55.6929,
        longitude: 12.5993,
        media: MediaRef::from_store("https://example.invalid/images/mermaid.jpg"),
        created_at: 1_700_000_000_000,
    });

    let session = SyncSession::new(SyncSessionConfig::default(), media, metadata);
    println!("📦 State: {}", session.state());
    println!("   Map centre: {}", session.initial_region());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Startup bulk fetch
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🚀 Starting session...");
    session.start().await?;
    println!("   State: {} ({} markers)", session.state(), session.len());

    // ─────────────────────────────────────────────────────────────────────────
    // 3. New marker
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📍 Dropping a photo on Copenhagen...");
    let photo = b"\xFF\xD8\xFF\xE0 not really a jpeg".to_vec();
    let marker = session.submit_named((55.6761, 12.5683), photo, "IMG_0042.JPG").await?;
    println!("   └─ {} at {}", marker.id, marker.coordinate);
    println!("   └─ media: {}", marker.media);

    if let Some(bytes) = session.media_bytes(&marker.id).await? {
        println!("   └─ fetched {} bytes back", bytes.len());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Things that must not change the map
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🚫 Submitting an out-of-range coordinate...");
    match session.submit((200.0, 12.5683), b"photo".to_vec()).await {
        Ok(m) => println!("   └─ unexpected success: {}", m.id),
        Err(e) => println!("   └─ rejected ({}): {}", e.stage(), e),
    }

    println!("\n🙈 Cancelled pick...");
    let outcome = session.submit_picked((1.0, 1.0), PickOutcome::Cancelled).await?;
    println!("   └─ submitted: {}", outcome.is_some());

    println!("\n🗺️  Markers on the map:");
    for m in session.snapshot().iter() {
        println!("   └─ {:<34} {}", m.id.as_str(), m.coordinate);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics:");
    dump_metrics(&snapshotter);

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Clean shutdown
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🛑 Shutting down...");
    session.shutdown().await;
    println!("   ✅ Shutdown complete! State: {}", session.state());

    Ok(())
}

/// Dump all captured metrics
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut counters: Vec<_> = vec![];
    let mut gauges: Vec<_> = vec![];
    let mut histograms: Vec<_> = vec![];

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let name = key.name().to_string();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels.join(","))
        };

        match value {
            DebugValue::Counter(v) => counters.push((name, label_str, v)),
            DebugValue::Gauge(v) => gauges.push((name, label_str, v.into_inner())),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, label_str, count, sum));
            }
        }
    }

    counters.sort_by(|a, b| a.0.cmp(&b.0));
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, labels, value) in &counters {
        println!("   │  counter   {}{} = {}", name, labels, value);
    }
    for (name, labels, value) in &gauges {
        println!("   │  gauge     {}{} = {:.2}", name, labels, value);
    }
    for (name, labels, count, sum) in &histograms {
        println!("   │  histogram {}{} count={} sum={:.4}", name, labels, count, sum);
    }

    if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
}
