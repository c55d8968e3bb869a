use gazelle_dupe::{label_releases, GazelleClient, TrackerSite};

/// List a label's releases on the site.
pub async fn handle_label(
    client: &GazelleClient,
    label: &str,
    year: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    match year {
        Some(year) => println!("🏷️  {label} releases from {year} on {}:", client.site_code()),
        None => println!("🏷️  {label} releases on {}:", client.site_code()),
    }

    let releases = label_releases(client, label, year).await?;
    if releases.is_empty() {
        println!("  No releases found.");
        return Ok(());
    }

    for release in &releases {
        let year = release
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        let quality = match (release.lossless, release.lossless_web) {
            (true, true) => "lossless, WEB",
            (true, false) => "lossless",
            _ => "lossy only",
        };
        println!(
            "  {year} {} - {} [{}] ({quality})",
            release.artist, release.album, release.release_type
        );
        println!("      {}", release.url);
    }
    println!("\n📊 {} releases", releases.len());
    Ok(())
}
