//! Session demo against a local stand-in for the rate provider.
//!
//! Run with: cargo run -p converter-app --example session_demo

use std::net::SocketAddr;

use axum::{Json, Router, routing::get};
use converter_app::{Config, bootstrap, init_tracing};
use converter_types::CurrencyCode;
use tokio::net::TcpListener;

async fn latest() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "result": "success",
        "base_code": "USD",
        "conversion_rates": { "USD": 1.0, "EUR": 0.9123, "GBP": 0.79, "INR": 83.2, "JPY": 151.37 }
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Serve fixed rates on an ephemeral port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let router = Router::new().route("/{key}/latest/{base}", get(latest));
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("rate server stopped: {e}");
        }
    });

    let config = Config::from_lookup(|name| match name {
        "EXCHANGE_API_KEY" => Some("demo".to_string()),
        "EXCHANGE_API_URL" => Some(format!("http://{addr}")),
        "STORE_URL" => Some("memory://".to_string()),
        _ => None,
    })?;
    init_tracing(config.log_format);

    println!("🚀 Starting session against http://{addr}...");
    let converter = bootstrap(&config).await?;
    converter.settle().await;

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: conversions
    // ─────────────────────────────────────────────────────────────────────────

    let usd: CurrencyCode = "USD".parse()?;
    let eur: CurrencyCode = "EUR".parse()?;
    let jpy: CurrencyCode = "JPY".parse()?;

    println!("\n💱 Converting...");
    for (amount, from, to) in [("100", &usd, &eur), ("250", &eur, &jpy), ("1e3", &usd, &jpy)] {
        let outcome = converter.request_conversion(amount, from, to).await?;
        let result = outcome.result();
        println!(
            "   {} {} = {} {}  (1 {} = {} {})",
            amount, from, result.result, to, from, result.unit_rate, to
        );
    }

    match converter.request_conversion("abc", &usd, &eur).await {
        Ok(_) => println!("   unexpected success"),
        Err(e) => println!("   ✗ {e}"),
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: favorites
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n⭐ Favorites...");
    let favorite = converter.add_favorite(eur.clone(), jpy.clone()).await.value;
    converter.add_favorite(usd.clone(), eur.clone()).await;
    for f in converter.favorites() {
        println!("   {}  {} -> {}", f.id, f.from, f.to);
    }
    converter.select_favorite(&favorite.id)?;
    let session = converter.swap();
    println!(
        "   Selected and swapped: {} -> {}",
        session.from_currency, session.to_currency
    );

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: history
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n📜 History (newest first)...");
    for entry in converter.get_history() {
        println!(
            "   {}  {} {} = {} {}",
            entry.timestamp, entry.amount, entry.from, entry.result, entry.to
        );
    }

    converter.settle().await;
    println!("\n✅ Done");
    Ok(())
}
