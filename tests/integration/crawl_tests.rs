//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the catalog site and tempfile for
//! the output, and run the full crawl cycle end-to-end.

use bundle_scraper::config::{Config, CrawlerConfig, SiteConfig};
use bundle_scraper::crawler::{run_crawl, CatalogSelector, CrawlRequest};
use bundle_scraper::output::{ConflictPolicy, NoPrompt, ResumableSink};
use bundle_scraper::{CatalogId, Credential, Record, ScrapeError, SessionClient};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            user_agent: "TestBot/1.0.0".to_string(),
        },
        crawler: CrawlerConfig {
            max_concurrent_rows: 4,
            page_timeout: 5,
            request_timeout: 5,
        },
        ..Config::default()
    }
}

fn create_session(config: &Config) -> Arc<SessionClient> {
    Arc::new(
        SessionClient::new(&config.site, &config.crawler, Credential::new("itchio=abc"))
            .expect("Failed to create session"),
    )
}

fn request(catalog: CatalogSelector, output: &Path, policy: ConflictPolicy) -> CrawlRequest {
    CrawlRequest {
        catalog,
        output_path: output.to_path_buf(),
        policy,
        fetch_details: true,
    }
}

fn by_name(name: &str) -> CatalogSelector {
    CatalogSelector::Name(name.to_string())
}

/// "My bundles" listing with the given (name, id) entries
fn listing_page(bundles: &[(&str, &str)]) -> String {
    let items: String = bundles
        .iter()
        .map(|(name, id)| format!(r#"<li><a href="/bundle/download/{}">{}</a></li>"#, id, name))
        .collect();
    format!(
        r#"<html><body><section class="bundle_keys"><ul>{}</ul></section></body></html>"#,
        items
    )
}

/// One catalog page whose rows link to `{base}/{slug}/download/KEY`
fn bundle_page(base_url: &str, page: u32, total: Option<u32>, slugs: &[&str]) -> String {
    let pager = total
        .map(|total| {
            format!(
                r#"<div class="pager"><span class="pager_label">Page {} of <a href="?page={}">{}</a></span></div>"#,
                page, total, total
            )
        })
        .unwrap_or_default();
    let rows: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<div class="game_row">
                     <h2 class="game_title"><a href="{}/{}/download/KEY_{}">Game {}</a></h2>
                     <div class="meta_row game_short_text">About {}</div>
                     <div class="meta_row file_count">2 files</div>
                     <div class="meta_row"><span title="Available for Linux"></span></div>
                   </div>"#,
                base_url, slug, slug, slug, slug
            )
        })
        .collect();
    format!("<html><body>{}{}</body></html>", pager, rows)
}

fn detail_page(author: &str) -> String {
    format!(
        r#"<html><body>
           <div class="page_widget"><div class="formatted_description"><p>Fun</p></div></div>
           <div class="game_info_panel_widget"><table>
             <tr><td>Status</td><td><a href="/s">Released</a></td></tr>
             <tr><td>Author</td><td><a href="https://{0}.example">{0}</a></td></tr>
           </table></div>
           </body></html>"#,
        author
    )
}

async fn mount_listing(server: &MockServer, bundles: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/my-purchases/bundles"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(bundles)))
        .mount(server)
        .await;
}

async fn mount_bundle_page(server: &MockServer, id: &str, page: u32, body: String, expect: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/bundle/download/{}", id)))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expect)
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, slug: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(slug)))
        .mount(server)
        .await;
}

/// Writes an output file that already holds the given pages
fn seed_output(output: &Path, pages: &[u32]) {
    let mut sink = ResumableSink::open(output, ConflictPolicy::Overwrite, &mut NoPrompt)
        .expect("Failed to create output");
    for page in pages {
        let record = Record {
            title: Some(format!("Earlier {}", page)),
            ..Record::default()
        };
        sink.append_page(*page, &[record]).expect("Failed to seed page");
    }
}

fn read_rows(output: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(output).expect("Failed to open output");
    reader
        .records()
        .map(|row| row.expect("Bad row").iter().map(String::from).collect())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_writes_every_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_listing(&mock_server, &[("Bundle for Testing", "abc")]).await;
    mount_bundle_page(&mock_server, "abc", 1, bundle_page(&base_url, 1, Some(2), &["one", "two"]), 1).await;
    mount_bundle_page(&mock_server, "abc", 2, bundle_page(&base_url, 2, Some(2), &["three"]), 1).await;
    for slug in ["one", "two", "three"] {
        mount_detail(&mock_server, slug).await;
    }

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    let config = create_test_config(&base_url);
    let session = create_session(&config);

    let report = run_crawl(
        Arc::clone(&session),
        &config,
        request(by_name("Testing"), &output, ConflictPolicy::Prompt),
        &mut NoPrompt,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.catalog, CatalogId::new("abc"));
    assert_eq!(report.page_count, 2);
    assert_eq!(report.first_page, 1);
    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.records_written, 3);

    // Listing, two pages, three detail pages; page 1 only once
    assert_eq!(session.network_fetches(), 6);

    let header = Record::header();
    let rows = read_rows(&output);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Game one");
    assert_eq!(rows[0][1], "About one");
    assert_eq!(rows[0][2], format!("{}/one", base_url));
    assert_eq!(rows[0][3], "Linux");
    assert_eq!(rows[0][4], "2");
    assert_eq!(rows[0][5], "<p>Fun</p>");
    assert_eq!(rows[0][8], "Released");
    assert_eq!(rows[0][12], "one");
    assert_eq!(rows[0][13], "https://one.example");
    assert_eq!(rows[2][0], "Game three");
    assert_eq!(rows[1].last().map(String::as_str), Some("1"));
    assert_eq!(rows[2].last().map(String::as_str), Some("2"));
    assert!(rows.iter().all(|row| row.len() == header.len()));
}

#[tokio::test]
async fn test_continue_crawls_only_missing_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_listing(&mock_server, &[("Bundle for Testing", "abc")]).await;
    mount_bundle_page(&mock_server, "abc", 1, bundle_page(&base_url, 1, Some(3), &["one"]), 1).await;
    mount_bundle_page(&mock_server, "abc", 2, bundle_page(&base_url, 2, Some(3), &["two"]), 0).await;
    mount_bundle_page(&mock_server, "abc", 3, bundle_page(&base_url, 3, Some(3), &["three"]), 1).await;
    mount_detail(&mock_server, "three").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    seed_output(&output, &[1, 2]);

    let config = create_test_config(&base_url);
    let report = run_crawl(
        create_session(&config),
        &config,
        request(by_name("Testing"), &output, ConflictPolicy::Continue),
        &mut NoPrompt,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.first_page, 3);
    assert_eq!(report.pages_crawled, 1);

    let rows = read_rows(&output);
    let titles: Vec<&str> = rows.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(titles, vec!["Earlier 1", "Earlier 2", "Game three"]);
    assert_eq!(rows[2].last().map(String::as_str), Some("3"));
}

#[tokio::test]
async fn test_complete_output_crawls_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_bundle_page(&mock_server, "abc", 1, bundle_page(&base_url, 1, Some(2), &["one"]), 1).await;
    mount_bundle_page(&mock_server, "abc", 2, bundle_page(&base_url, 2, Some(2), &["two"]), 0).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    seed_output(&output, &[1, 2]);
    let before = fs::read_to_string(&output).unwrap();

    let config = create_test_config(&base_url);
    let session = create_session(&config);
    let report = run_crawl(
        Arc::clone(&session),
        &config,
        request(
            CatalogSelector::Id(CatalogId::new("abc")),
            &output,
            ConflictPolicy::Continue,
        ),
        &mut NoPrompt,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.pages_crawled, 0);
    assert_eq!(report.first_page, 3);
    // Only the page count lookup
    assert_eq!(session.network_fetches(), 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), before);
}

#[tokio::test]
async fn test_unknown_catalog_leaves_continued_file_untouched() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, &[("Bundle for Testing", "abc")]).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    seed_output(&output, &[1]);
    let before = fs::read_to_string(&output).unwrap();

    let config = create_test_config(&mock_server.uri());
    let result = run_crawl(
        create_session(&config),
        &config,
        request(by_name("Nonexistent"), &output, ConflictPolicy::Continue),
        &mut NoPrompt,
    )
    .await;

    match result {
        Err(e @ ScrapeError::CatalogNotFound { .. }) => assert_eq!(e.exit_code(), 2),
        other => panic!("expected CatalogNotFound, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&output).unwrap(), before);
}

#[tokio::test]
async fn test_unknown_catalog_with_overwrite_leaves_header_only() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, &[("Bundle for Testing", "abc")]).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    seed_output(&output, &[1, 2]);

    let config = create_test_config(&mock_server.uri());
    let result = run_crawl(
        create_session(&config),
        &config,
        request(by_name("Nonexistent"), &output, ConflictPolicy::Overwrite),
        &mut NoPrompt,
    )
    .await;

    assert!(matches!(result, Err(ScrapeError::CatalogNotFound { .. })));
    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(read_rows(&output).is_empty());
}

#[tokio::test]
async fn test_ambiguous_catalog_name() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        &[("Bundle for Testing", "abc"), ("Bundle for Tests", "def")],
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    let config = create_test_config(&mock_server.uri());
    let result = run_crawl(
        create_session(&config),
        &config,
        request(by_name("Bundle for Test"), &output, ConflictPolicy::Overwrite),
        &mut NoPrompt,
    )
    .await;

    match result {
        Err(e @ ScrapeError::CatalogAmbiguous { .. }) => {
            assert_eq!(e.exit_code(), 3);
            assert!(e.to_string().contains("Bundle for Testing, Bundle for Tests"));
        }
        other => panic!("expected CatalogAmbiguous, got {:?}", other),
    }
}

#[tokio::test]
async fn test_single_page_catalog_without_pager() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_bundle_page(&mock_server, "solo", 1, bundle_page(&base_url, 1, None, &["one", "two"]), 1).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    let config = create_test_config(&base_url);
    let mut crawl = request(
        CatalogSelector::Id(CatalogId::new("solo")),
        &output,
        ConflictPolicy::Overwrite,
    );
    crawl.fetch_details = false;

    let report = run_crawl(create_session(&config), &config, crawl, &mut NoPrompt)
        .await
        .expect("Crawl failed");

    assert_eq!(report.page_count, 1);
    assert_eq!(report.records_written, 2);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);
    // Detail columns stay empty without the detail fetch
    assert_eq!(rows[0][5], "");
    assert_eq!(rows[0][8], "");
}

#[tokio::test]
async fn test_detail_failure_degrades_to_empty_details() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_bundle_page(&mock_server, "abc", 1, bundle_page(&base_url, 1, Some(1), &["gone", "here"]), 1).await;
    mount_detail(&mock_server, "here").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    let config = create_test_config(&base_url);
    run_crawl(
        create_session(&config),
        &config,
        request(
            CatalogSelector::Id(CatalogId::new("abc")),
            &output,
            ConflictPolicy::Overwrite,
        ),
        &mut NoPrompt,
    )
    .await
    .expect("Crawl failed");

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "Game gone");
    assert_eq!(rows[0][8], "");
    assert_eq!(rows[1][8], "Released");
}

#[tokio::test]
async fn test_page_timeout_keeps_completed_pages_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_bundle_page(&mock_server, "abc", 1, bundle_page(&base_url, 1, Some(2), &["fast"]), 1).await;
    mount_bundle_page(&mock_server, "abc", 2, bundle_page(&base_url, 2, Some(2), &["slow", "fine"]), 1).await;
    mount_detail(&mock_server, "fast").await;
    mount_detail(&mock_server, "fine").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("slow"))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    let mut config = create_test_config(&base_url);
    config.crawler.page_timeout = 1;

    let result = run_crawl(
        create_session(&config),
        &config,
        request(
            CatalogSelector::Id(CatalogId::new("abc")),
            &output,
            ConflictPolicy::Overwrite,
        ),
        &mut NoPrompt,
    )
    .await;

    assert!(matches!(
        result,
        Err(ScrapeError::PageTimeout { page: 2, .. })
    ));

    // Page 1 survives whole, nothing of page 2 was written
    let rows = read_rows(&output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Game fast");

    // A later run resumes at the page that timed out
    let sink = ResumableSink::open(&output, ConflictPolicy::Continue, &mut NoPrompt).unwrap();
    assert_eq!(sink.resume_point(), 2);
}
