//! Scanner configuration example

use std::time::Duration;

use gm60::{Scanner, StreamTransport};

#[tokio::main]
async fn main() -> gm60::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    
    let addr = std::env::var("SCANNER_ADDR").unwrap_or_else(|_| "192.168.1.50:4001".to_string());
    
    let transport = StreamTransport::connect_tcp(&addr, Duration::from_secs(5)).await?;
    let mut scanner = Scanner::new(transport);
    
    println!("Connected to {}", scanner.describe());
    
    let info = scanner.get_version().await?;
    println!("Hardware: {}", info.hardware);
    println!("Software: {} ({})", info.software, info.software_date_iso());
    
    println!("Resetting to factory defaults...");
    scanner.reset_to_factory_defaults().await?;
    
    let settings = scanner.get_register_settings(0x0000).await?;
    let (hex, bin) = settings.to_strings();
    println!("Scan mode register: {:?} {:?}", hex, bin);
    
    // LED always on
    scanner.set_register_settings(0x0000, 0b1000_1110).await?;
    
    // LED at maximum brightness
    scanner.set_register_settings(0x0015, 0x63).await?;
    
    let mode = scanner.get_scan_mode().await?;
    println!("Scan mode now: {:?}", mode);
    
    scanner.save_to_flash().await?;
    println!("Done!");
    
    Ok(())
}
