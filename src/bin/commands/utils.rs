use gazelle_dupe::{ClientEvent, Config, GazelleClient};

/// Build a client for `site_code` and log its rate-limit events.
pub fn build_client(
    config: &Config,
    site_code: &str,
) -> Result<GazelleClient, Box<dyn std::error::Error>> {
    let site = config.site(site_code)?;
    log::debug!("Using {} at {}", site_code.to_uppercase(), site.base_url);

    let http_client = http_client::native::NativeClient::new();
    let client = GazelleClient::new(
        Box::new(http_client),
        site_code.to_uppercase(),
        site,
        config.client.clone(),
    )
    .with_various_artist_word(config.dupe_check.various_artist_word.clone());

    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ClientEvent::RateLimited {
                    delay_seconds,
                    rate_limit_type,
                    ..
                } => {
                    log::info!("⏳ Rate limited ({rate_limit_type:?}), waiting {delay_seconds}s");
                }
                ClientEvent::RequestCompleted {
                    request,
                    status_code,
                    duration_ms,
                } => {
                    log::debug!(
                        "{} -> {status_code} in {duration_ms}ms",
                        request.short_description()
                    );
                }
                _ => {}
            }
        }
    });

    Ok(client)
}
