//! Print the current trending GIFs and a sample search
//!
//! To run this example:
//! ```sh
//! cd crates/gifhost
//! cargo run --example trending -- cats
//! ```

use gifhost::{Client, Order, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let query = std::env::args().nth(1).unwrap_or_else(|| "cats".to_string());

    let client = Client::with_defaults()?;
    if let Err(e) = client.login().await {
        eprintln!("Error: {}", e);
        eprintln!("\nCould not obtain a temporary token from the API.");
        return Err(e);
    }

    println!("=== Trending ===");
    for gif in client.trending_gifs().await?.iter().take(10) {
        println!(
            "  {} by {} ({} views)",
            gif.web_url(),
            gif.username.as_deref().unwrap_or("unknown"),
            gif.views.unwrap_or(0)
        );
    }

    println!("\n=== Search: {} ===", query);
    let results = client.search(&query, 1, 10, Order::Top).await?;
    println!("  {} results over {} pages", results.total, results.pages);
    for gif in &results.gifs {
        println!("  {} [{}]", gif.web_url(), gif.tags.join(", "));
    }

    Ok(())
}
