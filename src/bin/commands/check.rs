use super::terminal::TerminalPresenter;
use super::ReleaseArgs;
use gazelle_dupe::{
    Config, DupeChecker, DupeDecision, DupeError, GazelleClient, StringNormalizer, TrackerSite,
};

/// Print the search strings for a release without contacting any site.
pub fn handle_searchstrs(config: &Config, release: &ReleaseArgs) {
    let normalizer = StringNormalizer::from_config(&config.dupe_check);
    let queries = normalizer.build_search_strings(
        &release.artist_entries(),
        Some(&release.title),
        release.catno.as_deref(),
    );

    if queries.is_empty() {
        println!("⚠️  Nothing searchable in this title");
        return;
    }
    for query in queries.iter() {
        println!("{query}");
    }
}

/// Run the full dupe check and report the decision.
pub async fn handle_check(
    client: &GazelleClient,
    config: &Config,
    release: &ReleaseArgs,
    offer_deletion: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let checker = DupeChecker::new(client, config.dupe_check.clone());
    let queries = checker.search_strings(
        &release.artist_entries(),
        Some(&release.title),
        release.catno.as_deref(),
    );
    log::info!("Searching {} for: {queries}", client.site_code());

    let mut presenter = TerminalPresenter::new();
    let decision = checker
        .check_existing_group(&mut presenter, &queries, offer_deletion)
        .await?;

    match decision {
        DupeDecision::ExistingGroup(group_id) => {
            println!("✅ Upload into {}", client.group_url(group_id));
        }
        DupeDecision::NewGroup => println!("✅ Upload as a new group"),
        DupeDecision::Aborted => {
            println!("❌ Upload aborted");
            return Ok(());
        }
        DupeDecision::DeleteAndAbort => {
            println!("🗑️  Upload aborted; deletion of the music folder was requested");
            println!("   (nothing has been deleted, remove the folder yourself)");
            return Ok(());
        }
    }

    if config.dupe_check.last_minute_dupe_check {
        report_last_minute(&checker, &mut presenter, &queries).await?;
    }
    Ok(())
}

/// Compare a release against the site log only.
pub async fn handle_recent(
    client: &GazelleClient,
    config: &Config,
    release: &ReleaseArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let checker = DupeChecker::new(client, config.dupe_check.clone());
    let queries = checker.search_strings(
        &release.artist_entries(),
        Some(&release.title),
        release.catno.as_deref(),
    );
    let mut presenter = TerminalPresenter::new();
    report_last_minute(&checker, &mut presenter, &queries).await
}

async fn report_last_minute(
    checker: &DupeChecker<'_>,
    presenter: &mut TerminalPresenter,
    queries: &gazelle_dupe::SearchQueries,
) -> Result<(), Box<dyn std::error::Error>> {
    match checker.last_minute_check(presenter, queries).await {
        Ok(()) => {
            println!("✅ Clear to upload");
            Ok(())
        }
        Err(DupeError::Aborted) => {
            println!("❌ Upload aborted");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
