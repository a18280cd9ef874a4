//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use catalog_spider::config::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use catalog_spider::crawler::{Coordinator, CrawlReport};
use catalog_spider::output::{export_records, output_encoding};
use catalog_spider::Outcome;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server's catalog root
fn create_test_config(base_url: &str, try_limit: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: format!("{}/catalog/", base_url),
            thread_count: 4,
            try_limit,
            dedupe_targets: true,
            request_timeout: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: "./out".to_string(),
            delimiter: ';',
            encoding: "utf-8".to_string(),
            log_directory: None,
        },
        site: SiteConfig::default(),
    }
}

async fn mount_page(server: &MockServer, page_path: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.into())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn crawl(config: Config) -> CrawlReport {
    Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed")
}

fn catalog_root(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<li><a href="{}">Section</a></li>"#, l))
        .collect();
    format!(
        r#"<html><body><div class="page-content"><ul>{}</ul></div></body></html>"#,
        anchors
    )
}

fn listing(subcategories: &[&str], items: &[&str], next: Option<&str>) -> String {
    let subs: String = subcategories
        .iter()
        .map(|l| format!(r#"<li><a href="{}">Sub</a></li>"#, l))
        .collect();
    let items: String = items
        .iter()
        .map(|l| {
            format!(
                r#"<figure class="catalog-item"><img src="/x.png"><a class="name" href="{}">Item</a></figure>"#,
                l
            )
        })
        .collect();
    let pager = match next {
        Some(href) => format!(
            r#"<div class="pages"><span>1</span><a href="{}">Следующая</a></div>"#,
            href
        ),
        None => r#"<div class="pages"><span>1</span></div>"#.to_string(),
    };

    format!(
        r#"<html><body><ul class="catalog-parts">{}</ul>{}{}</body></html>"#,
        subs, items, pager
    )
}

fn item(name: &str, price: &str) -> String {
    format!(
        r#"<html><body>
        <h1>{}</h1>
        <div class="product-information">
          <p class="product-available green">В наличии</p>
          <div class="item_current_price">{} руб.</div>
          <table class="prop-list">
            <tr><td>Артикул</td><td>{}-SKU.</td></tr>
            <tr><td>Производитель</td><td>Acme</td></tr>
          </table>
          <a id="pos-big-photo" href="/upload/{}.jpg"><img src="/upload/small.jpg"></a>
          <div id="detail-text-content">About {}</div>
        </div>
        </body></html>"#,
        name, price, name, name, name
    )
}

#[tokio::test]
async fn test_full_three_stage_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/a/", "/list/b/"])).await;
    mount_page(
        &mock_server,
        "/list/a/",
        listing(&["/list/a/sub/"], &["/item/1/"], Some("/list/a/page-2/")),
    )
    .await;
    mount_page(&mock_server, "/list/a/page-2/", listing(&[], &["/item/2/"], None)).await;
    // Links back to an item already found: fetched once
    mount_page(&mock_server, "/list/a/sub/", listing(&[], &["/item/1/"], None)).await;
    mount_page(&mock_server, "/list/b/", listing(&[], &["/item/3/"], None)).await;
    mount_page(&mock_server, "/item/1/", item("one", "1 500,25")).await;
    mount_page(&mock_server, "/item/2/", item("two", "99")).await;
    mount_page(&mock_server, "/item/3/", item("three", "0")).await;

    let report = crawl(create_test_config(&base_url, 3)).await;

    assert_eq!(report.records.len(), 3);
    assert_eq!(report.branches_completed, 3);
    // catalog + 4 listings + 3 items
    assert_eq!(report.count(Outcome::Ok), 8);
    assert_eq!(report.tasks_completed(), 8);

    let mut records = report.records;
    records.sort_by(|a, b| a.name.cmp(&b.name));

    let one = &records[0];
    assert_eq!(one.name, "one");
    assert_eq!(one.price, "1500.25");
    assert_eq!(one.sku, "one-SKU");
    assert_eq!(one.manufacturer, "Acme");
    assert_eq!(
        one.photo_url.as_ref().map(|u| u.to_string()),
        Some(format!("{}/upload/one.jpg", base_url))
    );
    assert_eq!(one.properties.get("Описание").map(String::as_str), Some("About one"));

    let three = &records[1];
    assert_eq!(three.name, "three");
    assert_eq!(three.price, "-1");

    assert_eq!(records[2].name, "two");
}

#[tokio::test]
async fn test_server_error_retried_until_try_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/a/"])).await;

    Mock::given(method("GET"))
        .and(path("/list/a/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let report = crawl(create_test_config(&base_url, 3)).await;

    assert_eq!(report.count(Outcome::Ok), 1);
    assert_eq!(report.count(Outcome::Retry), 2);
    assert_eq!(report.count(Outcome::Fatal), 1);
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_not_found_is_fatal_without_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/a/"])).await;
    mount_page(&mock_server, "/list/a/", listing(&[], &["/item/gone/"], None)).await;

    Mock::given(method("GET"))
        .and(path("/item/gone/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = crawl(create_test_config(&base_url, 5)).await;

    assert_eq!(report.count(Outcome::Fatal), 1);
    assert_eq!(report.count(Outcome::Retry), 0);
    // The item branch still ended
    assert_eq!(report.branches_completed, 1);
}

#[tokio::test]
async fn test_empty_body_and_error_marker_are_transient() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/empty/", "/list/busy/"])).await;

    Mock::given(method("GET"))
        .and(path("/list/empty/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/list/busy/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Сервер перегружен</p></body></html>"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, 2);
    config.site.error_markers = vec!["Сервер перегружен".to_string()];

    let report = crawl(config).await;

    assert_eq!(report.count(Outcome::Retry), 2);
    assert_eq!(report.count(Outcome::Fatal), 2);
}

#[tokio::test]
async fn test_item_validation_skips_and_parse_errors() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/a/"])).await;
    mount_page(
        &mock_server,
        "/list/a/",
        listing(&[], &["/item/ok/", "/item/no-price/", "/item/no-name/"], None),
    )
    .await;
    mount_page(&mock_server, "/item/ok/", item("ok", "10")).await;
    mount_page(&mock_server, "/item/no-price/", item("no-price", "по запросу")).await;
    mount_page(
        &mock_server,
        "/item/no-name/",
        item("no-name", "10").replace("<h1>no-name</h1>", ""),
    )
    .await;

    let report = crawl(create_test_config(&base_url, 3)).await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].name, "ok");
    assert_eq!(report.count(Outcome::Skipped), 1);
    assert_eq!(report.count(Outcome::ParseError), 1);
    assert_eq!(report.branches_completed, 3);
}

#[tokio::test]
async fn test_pagination_chain_ends() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/p1/"])).await;
    mount_page(&mock_server, "/list/p1/", listing(&[], &[], Some("/list/p2/"))).await;
    mount_page(&mock_server, "/list/p2/", listing(&[], &[], Some("/list/p3/"))).await;
    mount_page(&mock_server, "/list/p3/", listing(&[], &[], None)).await;

    let report = crawl(create_test_config(&base_url, 1)).await;

    assert_eq!(report.count(Outcome::Ok), 4);
    assert_eq!(report.tasks_completed(), 4);
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_crawl_then_export_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/a/"])).await;
    mount_page(&mock_server, "/list/a/", listing(&[], &["/item/1/", "/item/2/"], None)).await;
    mount_page(&mock_server, "/item/1/", item("first", "12,50")).await;
    mount_page(&mock_server, "/item/2/", item("second", "7")).await;

    let report = crawl(create_test_config(&base_url, 1)).await;

    let temp = TempDir::new().expect("Failed to create temp dir");
    let encoding = output_encoding("utf-8").expect("Unknown encoding");
    let file = export_records(temp.path(), &report.records, ';', encoding).expect("Export failed");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(&file)
        .expect("Failed to open export");

    let headers = reader.headers().expect("Missing header").clone();
    assert_eq!(headers.get(0), Some("name"));
    assert_eq!(headers.get(8), Some("properties"));

    let mut rows: Vec<_> = reader.records().map(|r| r.expect("Bad row")).collect();
    rows.sort_by(|a, b| a.get(0).cmp(&b.get(0)));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(0), Some("first"));
    assert_eq!(rows[0].get(1), Some("-1"));
    assert_eq!(rows[0].get(4), Some("12.50"));
    assert_eq!(rows[0].get(8), Some(r#"{"Описание":"About first"}"#));
}

#[tokio::test]
async fn test_relative_links_resolve_under_their_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["tools/"])).await;
    mount_page(
        &mock_server,
        "/catalog/tools/",
        listing(&[], &["drill/"], Some("page-2/")),
    )
    .await;
    mount_page(&mock_server, "/catalog/tools/page-2/", listing(&[], &["../saw/"], None)).await;
    mount_page(&mock_server, "/catalog/tools/drill/", item("drill", "10")).await;
    mount_page(&mock_server, "/catalog/tools/saw/", item("saw", "20")).await;

    let report = crawl(create_test_config(&base_url, 1)).await;

    assert_eq!(report.count(Outcome::Fatal), 0);
    assert_eq!(report.count(Outcome::Ok), 5);

    let mut names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["drill", "saw"]);
}

#[tokio::test]
async fn test_export_in_configured_encoding() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/catalog/", catalog_root(&["/list/a/"])).await;
    mount_page(&mock_server, "/list/a/", listing(&[], &["/item/1/"], None)).await;
    mount_page(&mock_server, "/item/1/", item("Дрель", "1 200")).await;

    let report = crawl(create_test_config(&base_url, 1)).await;

    let temp = TempDir::new().expect("Failed to create temp dir");
    let encoding = output_encoding("windows-1251").expect("Unknown encoding");
    let file = export_records(temp.path(), &report.records, ';', encoding).expect("Export failed");

    let bytes = std::fs::read(&file).expect("Failed to read export");
    assert!(std::str::from_utf8(&bytes).is_err());

    let (text, _, had_errors) = encoding.decode(&bytes);
    assert!(!had_errors);
    assert!(text.contains("Дрель;-1;0;ед.;1200;"));
}
