mod common;

use common::{group, record, FakeSite, BASE_URL};
use gazelle_dupe::{
    ArtistEntry, Candidate, CandidateSource, DupeCheckConfig, DupeChecker, DupeDecision,
    DupeError, SearchQueries, ScriptedPresenter,
};

fn queries(strings: &[&str]) -> SearchQueries {
    SearchQueries::new(strings.iter().map(|s| s.to_string()))
}

fn untrue() -> SearchQueries {
    queries(&["burial untrue"])
}

fn site_with_results() -> FakeSite {
    FakeSite::new()
        .with_search(
            "burial untrue",
            vec![record(11, "Burial", "Untrue"), record(12, "Burial", "Untrue (Remastered)")],
        )
        .with_group(group(11, "Burial", "Untrue"))
        .with_group(group(12, "Burial", "Untrue (Remastered)"))
}

async fn run(site: &FakeSite, presenter: &mut ScriptedPresenter, offer_deletion: bool) -> DupeDecision {
    let checker = DupeChecker::new(site, DupeCheckConfig::default());
    checker
        .check_existing_group(presenter, &untrue(), offer_deletion)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_empty_queries_skip_the_network() {
    let site = FakeSite::new();
    let checker = DupeChecker::new(&site, DupeCheckConfig::default());
    let mut presenter = ScriptedPresenter::new();

    let decision = checker
        .check_existing_group(&mut presenter, &SearchQueries::default(), true)
        .await
        .unwrap();

    assert_eq!(decision, DupeDecision::NewGroup);
    assert!(!site.was_contacted());
    assert!(presenter.listings().is_empty());
}

#[tokio::test]
async fn test_terminal_answers_end_on_first_prompt() {
    for (answer, expected) in [
        ("a", DupeDecision::Aborted),
        ("abort", DupeDecision::Aborted),
        ("n", DupeDecision::NewGroup),
        ("", DupeDecision::NewGroup),
        ("d", DupeDecision::DeleteAndAbort),
    ] {
        let site = site_with_results();
        let mut presenter = ScriptedPresenter::new().with_answers([answer]);
        assert_eq!(run(&site, &mut presenter, true).await, expected, "answer {answer:?}");
        assert_eq!(presenter.prompts().len(), 1, "answer {answer:?}");
        assert!(presenter.groups().is_empty());
    }
}

#[tokio::test]
async fn test_results_are_listed_in_order() {
    let site = site_with_results();
    let mut presenter = ScriptedPresenter::new().with_answers(["n"]);
    run(&site, &mut presenter, false).await;

    let listing = &presenter.listings()[0];
    assert_eq!(listing.source, CandidateSource::Search);
    assert_eq!(listing.queries, "burial untrue");
    assert!(!listing.offer_deletion);
    let ids: Vec<u64> = listing
        .candidates
        .iter()
        .map(|c| match c {
            Candidate::Group(r) => r.group_id,
            Candidate::RecentUpload(_) => panic!("unexpected log candidate"),
        })
        .collect();
    assert_eq!(ids, vec![11, 12]);
    assert_eq!(*site.search_calls.borrow(), vec!["burial untrue".to_string()]);
}

#[tokio::test]
async fn test_index_choice_is_confirmed() {
    let site = site_with_results();
    let mut presenter = ScriptedPresenter::new().with_answers(["2", ""]);
    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::ExistingGroup(12)
    );
    assert_eq!(*site.group_calls.borrow(), vec![12]);
    assert_eq!(presenter.groups()[0].name, "Untrue (Remastered)");
}

#[tokio::test]
async fn test_zero_picks_first_candidate() {
    let site = site_with_results();
    let mut presenter = ScriptedPresenter::new().with_answers(["0", "y"]);
    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::ExistingGroup(11)
    );
}

#[tokio::test]
async fn test_confirmation_answers() {
    let site = site_with_results();
    let mut presenter = ScriptedPresenter::new().with_answers(["1", "n"]);
    assert_eq!(run(&site, &mut presenter, true).await, DupeDecision::NewGroup);

    let mut presenter = ScriptedPresenter::new().with_answers(["1", "a"]);
    assert_eq!(run(&site, &mut presenter, true).await, DupeDecision::Aborted);

    let mut presenter = ScriptedPresenter::new().with_answers(["1", "d"]);
    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::DeleteAndAbort
    );
}

#[tokio::test]
async fn test_delete_ignored_when_not_offered() {
    let site = site_with_results();
    let mut presenter = ScriptedPresenter::new().with_answers(["d", "1", "d", "y"]);
    assert_eq!(
        run(&site, &mut presenter, false).await,
        DupeDecision::ExistingGroup(11)
    );
    assert_eq!(presenter.remaining_answers(), 0);
    assert!(!presenter.prompts()[2].contains("[d]elete"));
}

#[tokio::test]
async fn test_out_of_range_number_is_a_group_id() {
    let site = site_with_results().with_group(group(72189681, "Burial", "Street Halo"));
    let mut presenter = ScriptedPresenter::new().with_answers(["72189681", "y"]);
    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::ExistingGroup(72189681)
    );
    assert!(presenter
        .notices()
        .contains(&"Interpreting 72189681 as a group ID".to_string()));
}

#[tokio::test]
async fn test_unknown_group_is_a_hard_error() {
    let site = site_with_results();
    let checker = DupeChecker::new(&site, DupeCheckConfig::default());
    let mut presenter = ScriptedPresenter::new().with_answers(["999"]);

    let result = checker
        .check_existing_group(&mut presenter, &untrue(), true)
        .await;

    assert!(matches!(result, Err(DupeError::GroupNotFound { group_id: 999 })));
    assert!(presenter.notices().contains(&"999 does not exist.".to_string()));
}

#[tokio::test]
async fn test_urls_resolve_to_groups() {
    let site = site_with_results().with_torrent(120, 12);

    let mut presenter = ScriptedPresenter::new()
        .with_answers([format!("{BASE_URL}/torrents.php?id=11"), "y".to_string()]);
    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::ExistingGroup(11)
    );

    let mut presenter = ScriptedPresenter::new()
        .with_answers([format!("{BASE_URL}/torrents.php?torrentid=120"), "y".to_string()]);
    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::ExistingGroup(12)
    );
    assert_eq!(*site.resolve_calls.borrow(), vec![120]);
}

#[tokio::test]
async fn test_bad_input_reprompts() {
    let site = site_with_results();
    let mut presenter = ScriptedPresenter::new().with_answers([
        "what".to_string(),
        format!("{BASE_URL}/torrents.php?action=browse"),
        format!("{BASE_URL}/torrents.php?torrentid=404"),
        "n".to_string(),
    ]);
    assert_eq!(run(&site, &mut presenter, true).await, DupeDecision::NewGroup);
    assert_eq!(presenter.prompts().len(), 4);
    assert!(presenter
        .notices()
        .contains(&"Could not find a group ID in that URL.".to_string()));
    assert!(presenter
        .notices()
        .contains(&"Could not get group ID from torrent ID.".to_string()));
}

#[tokio::test]
async fn test_exhausted_script_terminates() {
    let site = site_with_results();
    let mut presenter = ScriptedPresenter::new().with_answers(["??", "!!"]);
    assert_eq!(run(&site, &mut presenter, true).await, DupeDecision::Aborted);
}

#[test_log::test(tokio::test)]
async fn test_declined_retry_aborts_before_choices() {
    let site = site_with_results().with_failing_searches(1);
    let mut presenter = ScriptedPresenter::new().with_confirmations([false]);

    assert_eq!(run(&site, &mut presenter, true).await, DupeDecision::Aborted);
    assert!(presenter.listings().is_empty());
    assert!(site.log_calls.borrow().is_empty());
    assert_eq!(
        presenter.prompts(),
        ["Would you like to retry the search?".to_string()]
    );
}

#[test_log::test(tokio::test)]
async fn test_accepted_retry_searches_again() {
    let site = site_with_results().with_failing_searches(1);
    let mut presenter = ScriptedPresenter::new()
        .with_confirmations([true])
        .with_answers(["1", "y"]);

    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::ExistingGroup(11)
    );
    assert_eq!(site.search_calls.borrow().len(), 2);
}

#[tokio::test]
async fn test_identical_records_from_different_queries_collapse() {
    let site = FakeSite::new()
        .with_search("burial", vec![record(11, "Burial", "Untrue")])
        .with_search("burial untrue", vec![record(11, "Burial", "Untrue")]);
    let checker = DupeChecker::new(&site, DupeCheckConfig::default());
    let mut presenter = ScriptedPresenter::new().with_answers(["n"]);

    checker
        .check_existing_group(&mut presenter, &queries(&["burial untrue", "burial"]), true)
        .await
        .unwrap();

    assert_eq!(presenter.listings()[0].candidates.len(), 1);
    assert_eq!(site.search_calls.borrow().len(), 2);
}

#[tokio::test]
async fn test_log_fallback_skips_confirmation() {
    let site = FakeSite::new()
        .with_log_page(&[(1001, "Burial - Untrue"), (1002, "Someone Else - Elsewhere")])
        .with_torrent(1001, 55);
    let mut presenter = ScriptedPresenter::new().with_answers(["1"]);

    assert_eq!(
        run(&site, &mut presenter, true).await,
        DupeDecision::ExistingGroup(55)
    );

    let listing = &presenter.listings()[0];
    assert_eq!(listing.source, CandidateSource::RecentUploads);
    assert_eq!(listing.candidates.len(), 1);
    assert_eq!(
        listing.link(&listing.candidates[0]),
        format!("{BASE_URL}/torrents.php?torrentid=1001")
    );
    let mut pages = site.log_calls.borrow().clone();
    pages.sort_unstable();
    assert_eq!(pages, (1..=10).collect::<Vec<u32>>());
    assert!(site.group_calls.borrow().is_empty());
    assert!(presenter.groups().is_empty());
}

#[tokio::test]
async fn test_log_fallback_unresolvable_torrent_reprompts() {
    let site = FakeSite::new().with_log_page(&[(1001, "Burial - Untrue")]);
    let mut presenter = ScriptedPresenter::new().with_answers(["1", "n"]);

    assert_eq!(run(&site, &mut presenter, true).await, DupeDecision::NewGroup);
    assert!(presenter
        .notices()
        .contains(&"Could not get group ID from torrent ID.".to_string()));
}

#[tokio::test]
async fn test_log_fallback_shows_at_most_the_display_limit() {
    let uploads: Vec<(u64, String)> = (1..=7)
        .map(|n| (1000 + n, format!("Burial - Untrue {n}")))
        .collect();
    let uploads: Vec<(u64, &str)> = uploads.iter().map(|(id, r)| (*id, r.as_str())).collect();
    let site = FakeSite::new().with_log_page(&uploads);
    let mut presenter = ScriptedPresenter::new().with_answers(["n"]);

    run(&site, &mut presenter, true).await;

    let listing = &presenter.listings()[0];
    assert_eq!(listing.candidates.len(), 5);
    assert_eq!(
        listing.candidates[0],
        Candidate::RecentUpload(gazelle_dupe::LogEntry::new("1001", "Burial", "Untrue 1"))
    );
}

#[tokio::test]
async fn test_disabled_log_check_presents_empty_list() {
    let site = FakeSite::new().with_log_page(&[(1001, "Burial - Untrue")]);
    let config = DupeCheckConfig {
        check_recent_uploads: false,
        ..DupeCheckConfig::default()
    };
    let checker = DupeChecker::new(&site, config);
    let mut presenter = ScriptedPresenter::new().with_answers(["n"]);

    let decision = checker
        .check_existing_group(&mut presenter, &untrue(), true)
        .await
        .unwrap();

    assert_eq!(decision, DupeDecision::NewGroup);
    assert!(site.log_calls.borrow().is_empty());
    let listing = &presenter.listings()[0];
    assert_eq!(listing.source, CandidateSource::Search);
    assert!(listing.candidates.is_empty());
}

#[tokio::test]
async fn test_declined_log_retry_aborts() {
    let site = FakeSite::new().with_failing_log_fetches(1);
    let mut presenter = ScriptedPresenter::new().with_confirmations([false]);

    assert_eq!(run(&site, &mut presenter, true).await, DupeDecision::Aborted);
    assert!(presenter.listings().is_empty());
    assert!(presenter
        .prompts()
        .contains(&"Would you like to retry the log check?".to_string()));
}

#[tokio::test]
async fn test_recheck_is_a_noop_for_unchanged_metadata() {
    let site = site_with_results();
    let checker = DupeChecker::new(&site, DupeCheckConfig::default());
    let artists = [ArtistEntry::main("Burial")];
    let previous = checker.search_strings(&artists, Some("Untrue"), None);
    let mut presenter = ScriptedPresenter::new();

    let result = checker
        .recheck_dupe(&mut presenter, &previous, &artists, Some("Untrue"), None)
        .await
        .unwrap();

    assert_eq!(result, None);
    assert!(!site.was_contacted());
}

#[tokio::test]
async fn test_recheck_runs_again_after_edits() {
    let site = FakeSite::new()
        .with_search("burial street halo", vec![record(21, "Burial", "Street Halo")])
        .with_group(group(21, "Burial", "Street Halo"));
    let checker = DupeChecker::new(&site, DupeCheckConfig::default());
    let artists = [ArtistEntry::main("Burial")];
    let previous = checker.search_strings(&artists, Some("Untrue"), None);

    let mut presenter = ScriptedPresenter::new().with_answers(["1", "y"]);
    let result = checker
        .recheck_dupe(&mut presenter, &previous, &artists, Some("Street Halo"), None)
        .await
        .unwrap();
    assert_eq!(result, Some(21));
    assert_eq!(
        presenter.notices()[0],
        "Rechecking for dupes on RED due to metadata changes..."
    );
    assert!(presenter.listings()[0].offer_deletion);

    let mut presenter = ScriptedPresenter::new().with_answers(["a"]);
    let result = checker
        .recheck_dupe(&mut presenter, &previous, &artists, Some("Street Halo"), None)
        .await;
    assert!(matches!(result, Err(DupeError::Aborted)));
}

#[tokio::test]
async fn test_last_minute_check_with_nothing_found() {
    let site = FakeSite::new().with_log_page(&[(1, "Someone Else - Elsewhere")]);
    let checker = DupeChecker::new(&site, DupeCheckConfig::default());
    let mut presenter = ScriptedPresenter::new();

    checker
        .last_minute_check(&mut presenter, &untrue())
        .await
        .unwrap();

    assert!(site.search_calls.borrow().is_empty());
    assert!(presenter
        .notices()
        .contains(&"Nothing found on RED".to_string()));
}

#[tokio::test]
async fn test_last_minute_check_asks_before_continuing() {
    let site = FakeSite::new().with_log_page(&[(1001, "Burial - Untrue")]);
    let checker = DupeChecker::new(&site, DupeCheckConfig::default());

    let mut declines = ScriptedPresenter::new();
    let result = checker.last_minute_check(&mut declines, &untrue()).await;
    assert!(matches!(result, Err(DupeError::Aborted)));
    assert_eq!(
        declines.prompts(),
        ["Would you still like to upload?".to_string()]
    );
    assert_eq!(declines.listings()[0].candidates.len(), 1);

    let mut accepts = ScriptedPresenter::new().with_confirmations([true]);
    checker
        .last_minute_check(&mut accepts, &untrue())
        .await
        .unwrap();

    assert!(site.search_calls.borrow().is_empty());
    assert!(site.resolve_calls.borrow().is_empty());
}
