//! Barcode reading example

use std::time::Duration;

use gm60::{Scanner, StreamTransport};

#[tokio::main]
async fn main() -> gm60::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    
    let addr = std::env::var("SCANNER_ADDR").unwrap_or_else(|_| "192.168.1.50:4001".to_string());
    
    let transport = StreamTransport::connect_tcp(&addr, Duration::from_secs(5)).await?;
    let mut scanner = Scanner::new(transport).with_scan_timeout(Duration::from_secs(30));
    
    println!("Waiting for barcodes on {}...", scanner.describe());
    
    loop {
        match scanner.read_barcode().await {
            Ok(barcode) => println!("Scanned: {}", barcode),
            Err(e) if e.is_timeout() => println!("Nothing scanned yet"),
            Err(e) => return Err(e),
        }
    }
}
