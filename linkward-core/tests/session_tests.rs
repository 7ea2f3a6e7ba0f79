// End-to-end scan tests against mock servers

use linkward_core::rank::{ExternalView, Group, NO_LINKS_FOUND, NO_LINKS_MATCH_FILTERS};
use linkward_core::settings::{LinkTypes, StatusFilters};
use linkward_core::{PageSource, ScanOptions, Session, Settings, execute_locate, execute_scan};
use linkward_scanner::{RuleSet, Status, Strategy, Verifier, VerifierConfig};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const PAGE_URL: &str = "https://contoso.sharepoint.com/sites/hr/SitePages/Home.aspx";

fn verifier(timeout: Duration) -> Verifier {
    Verifier::with_config(VerifierConfig {
        timeout,
        ..VerifierConfig::default()
    })
    .unwrap()
}

fn page_with(links: &str) -> PageSource {
    PageSource::new(
        format!(
            "<html><head><title>Home</title></head><body>{}</body></html>",
            links
        ),
        PAGE_URL,
    )
}

// ============================================================================
// Classification + Verification Scenarios
// ============================================================================

#[tokio::test]
async fn test_mixed_page_scan() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = page_with(&format!(
        r#"<a href="https://contoso.sharepoint.com/teams/X">Team site</a>
           <a href="{}/page">Random</a>
           <footer><a href="mailto:a@b.com">Contact</a></footer>"#,
        server.uri()
    ));

    let mut session = Session::new(source, verifier(Duration::from_secs(5)));
    let report = session
        .run_scan(&Settings::default(), &RuleSet::default(), None)
        .await
        .unwrap();

    assert_eq!(report.team.as_ref().map(Vec::len), Some(1));
    assert_eq!(report.onedrive.as_ref().map(Vec::len), Some(0));
    assert_eq!(report.email.as_ref().map(Vec::len), Some(1));
    assert_eq!(report.total, 3);

    let external = report.external.as_ref().unwrap();
    assert_eq!(external.raw_count(), 1);
    let groups = external.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group, Group::ClientErrors);
    assert_eq!(groups[0].group.name(), "Client Errors (4xx)");
    assert_eq!(groups[0].members[0].status(), Status::Http(404));
    assert_eq!(groups[0].members[0].status_text(), "404 Not Found");

    assert!(report.has_broken_links());
    assert_eq!(report.site.page_title, "Home");
}

#[tokio::test]
async fn test_timeout_scan() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source = page_with(&format!(r#"<a href="{}/slow">Slow</a>"#, server.uri()));
    let mut session = Session::new(source, verifier(Duration::from_millis(300)));
    let report = session
        .run_scan(&Settings::default(), &RuleSet::default(), None)
        .await
        .unwrap();

    let groups = report.external.as_ref().unwrap().groups().to_vec();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group, Group::NetworkUnknown);
    assert_eq!(groups[0].group.name(), "Network/Unknown Errors");
    let link = &groups[0].members[0];
    assert_eq!(link.status(), Status::Timeout);
    assert_eq!(link.severity(), 1);
    assert_eq!(link.status_text(), "Request Timeout");
}

#[tokio::test]
async fn test_filters_hide_every_group() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let settings = Settings {
        external_status_codes: StatusFilters::only(&["2xx"]),
        ..Settings::default()
    };

    let source = page_with(&format!(r#"<a href="{}/gone">Gone</a>"#, server.uri()));
    let mut session = Session::new(source, verifier(Duration::from_secs(5)));
    let report = session
        .run_scan(&settings, &RuleSet::default(), None)
        .await
        .unwrap();

    let external = report.external.unwrap();
    assert_eq!(external, ExternalView::NoneMatchFilters { raw_count: 1 });
    assert_eq!(external.displayed(), 0);
    assert_eq!(external.message(), Some(NO_LINKS_MATCH_FILTERS));
}

#[tokio::test]
async fn test_hidden_externals_are_not_verified() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = Settings {
        link_types: LinkTypes {
            external: false,
            ..LinkTypes::default()
        },
        ..Settings::default()
    };

    let source = page_with(&format!(r#"<a href="{}/x">X</a>"#, server.uri()));
    let mut session = Session::new(source, verifier(Duration::from_secs(5)));
    let report = session
        .run_scan(&settings, &RuleSet::default(), None)
        .await
        .unwrap();

    assert!(report.external.is_none());
    assert_eq!(report.total, 1);
}

#[tokio::test]
async fn test_empty_page() {
    let mut session = Session::new(page_with(""), verifier(Duration::from_secs(1)));
    let report = session
        .run_scan(&Settings::default(), &RuleSet::default(), None)
        .await
        .unwrap();

    assert_eq!(report.message(), Some(NO_LINKS_FOUND));
    assert_eq!(report.external, Some(ExternalView::NoLinksFound));
    assert!(!report.has_broken_links());
}

#[tokio::test]
async fn test_groups_sorted_by_severity() {
    let server = MockServer::start().await;
    for (p, code) in [("/ok", 200), ("/moved", 301), ("/err", 503), ("/missing", 404)] {
        Mock::given(method("HEAD"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(code))
            .mount(&server)
            .await;
    }

    let links: String = ["/ok", "/moved", "/err", "/missing"]
        .iter()
        .map(|p| format!(r#"<a href="{}{}">{}</a>"#, server.uri(), p, p))
        .collect();

    let verifier = Verifier::with_config(VerifierConfig {
        timeout: Duration::from_secs(5),
        follow_redirects: false,
        ..VerifierConfig::default()
    })
    .unwrap();
    let mut session = Session::new(page_with(&links), verifier);
    let report = session
        .run_scan(&Settings::default(), &RuleSet::default(), None)
        .await
        .unwrap();

    let names: Vec<&str> = report
        .external
        .as_ref()
        .unwrap()
        .groups()
        .iter()
        .map(|g| g.group.name())
        .collect();
    assert_eq!(
        names,
        vec![
            "Server Errors (5xx)",
            "Client Errors (4xx)",
            "Redirects (3xx)",
            "Success (2xx)"
        ]
    );
}

#[tokio::test]
async fn test_progress_reports_every_link() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let links: String = (0..5)
        .map(|i| format!(r#"<a href="{}/{}">{}</a>"#, server.uri(), i, i))
        .collect();

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let callback: linkward_core::session::ProgressCallback = Arc::new(move |_done, total| {
        assert_eq!(total, 5);
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let mut session = Session::new(page_with(&links), verifier(Duration::from_secs(5)));
    session
        .run_scan(&Settings::default(), &RuleSet::default(), Some(callback))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

// ============================================================================
// Highlighting
// ============================================================================

#[tokio::test]
async fn test_highlight_after_query_change() {
    let source = page_with(r#"<a href="https://example.com/docs/page?version=2">Docs</a>"#);
    let mut session = Session::new(source, verifier(Duration::from_secs(1)));

    let located = session
        .highlight("https://example.com/docs/page?version=1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(located.strategy, Strategy::HostAndPath);

    session.remove_highlight().await.unwrap();
    session.remove_highlight().await.unwrap();
}

#[tokio::test]
async fn test_reload_replaces_document() {
    let mut session = Session::new(
        page_with(r#"<a href="https://random.com/">Old</a>"#),
        verifier(Duration::from_secs(1)),
    );
    assert!(session.highlight("https://random.com/").await.unwrap().is_some());

    session
        .reload(page_with(r#"<a href="https://fresh.example/">New</a>"#))
        .await
        .unwrap();

    assert!(session.highlight("https://random.com/").await.unwrap().is_none());
    assert!(session.highlight("https://fresh.example/").await.unwrap().is_some());
}

#[tokio::test]
async fn test_execute_locate_not_found() {
    let located = execute_locate(page_with(""), "https://nowhere.example/").await.unwrap();
    assert!(located.is_none());
}

#[tokio::test]
async fn test_execute_scan_without_progress() {
    let report = execute_scan(ScanOptions {
        source: page_with(r#"<a href="mailto:a@b.com">Mail</a>"#),
        settings: Settings::default(),
        rules: RuleSet::default(),
        verifier: VerifierConfig::default(),
        show_progress: false,
    })
    .await
    .unwrap();

    assert_eq!(report.email.map(|e| e.len()), Some(1));
}
