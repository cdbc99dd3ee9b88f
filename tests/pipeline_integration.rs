//! Integration tests for the full scraping pipeline against a scripted source.

mod support;

use std::fs;
use std::sync::Arc;

use radioscraper::{InternetRadioScraper, ScrapeError, ScraperConfig, StorageService};
use support::{FakeTransport, category_page, directory_page, station_row};
use tempfile::TempDir;

const BASE: &str = "https://radio.test";

fn config(dir: &TempDir) -> ScraperConfig {
    ScraperConfig {
        base_url: BASE.to_string(),
        base_directory: Some(dir.path().join("data")),
        ..ScraperConfig::default()
    }
}

/// One "rock" category with three rows: two complete, one missing its bitrate.
fn rock_source() -> Arc<FakeTransport> {
    let transport = FakeTransport::new();
    transport.page(
        &format!("{BASE}/stations/"),
        &directory_page(&[("rock", "/stations/rock/")]),
    );
    transport.page(
        &format!("{BASE}/stations/rock/"),
        &category_page(
            "The finest rock stations.",
            "",
            &[
                station_row(
                    "Alpha Rock",
                    "https://alpha.example.com",
                    "rock pop",
                    "128 Kbps",
                    "/servers/tools/playlistgenerator?pl=1",
                ),
                station_row(
                    "Beta Rock",
                    "",
                    "rock",
                    "96 Kbps",
                    "/servers/tools/playlistgenerator?pl=2",
                ),
                station_row(
                    "No Bitrate FM",
                    "https://nobitrate.example.com",
                    "rock",
                    "mono",
                    "/servers/tools/playlistgenerator?pl=3",
                ),
            ],
        ),
    );
    transport.binary(
        &format!("{BASE}/servers/tools/playlistgenerator?pl=1"),
        b"#EXTM3U\nhttp://alpha.example.com:8000/listen\n",
    );
    transport.binary(
        &format!("{BASE}/servers/tools/playlistgenerator?pl=2"),
        b"#EXTM3U\nhttp://beta.example.com:8000/listen\n",
    );
    transport.binary(
        &format!("{BASE}/servers/tools/playlistgenerator?pl=3"),
        b"#EXTM3U\nhttp://nobitrate.example.com:8000/listen\n",
    );
    Arc::new(transport)
}

#[tokio::test]
async fn test_end_to_end_incomplete_rows_are_dropped() {
    let dir = TempDir::new().unwrap();
    let scraper = InternetRadioScraper::with_transport(config(&dir), rock_source());

    let catalog = scraper.fetch_all(false).await.unwrap();

    assert_eq!(catalog.len(), 1);
    let category = &catalog[0];
    assert_eq!(category.name, "rock");
    assert_eq!(category.description, "The finest rock stations.");
    assert_eq!(category.stations.len(), 2, "incomplete row must be dropped");

    let alpha = &category.stations[0];
    assert_eq!(alpha.name, "Alpha Rock");
    assert_eq!(alpha.url.as_deref(), Some("https://alpha.example.com"));
    assert_eq!(alpha.genres, vec!["rock".to_string(), "pop".to_string()]);
    assert_eq!(alpha.kbps, 128);
    assert!(alpha.playlist_file.exists());

    let beta = &category.stations[1];
    assert_eq!(beta.name, "Beta Rock");
    assert!(beta.url.is_none());
    assert_eq!(beta.kbps, 96);

    // Playlists live in canonical storage.
    let playlist_dir = dir.path().join("data").join("m3u");
    assert!(alpha.playlist_file.starts_with(&playlist_dir));
    assert!(beta.playlist_file.starts_with(&playlist_dir));
}

#[tokio::test]
async fn test_no_in_flight_downloads_remain_after_run() {
    let dir = TempDir::new().unwrap();
    let download_dir = dir.path().join("in-flight");
    let scraper = InternetRadioScraper::with_transport(
        ScraperConfig {
            download_dir: Some(download_dir.clone()),
            ..config(&dir)
        },
        rock_source(),
    );

    let catalog = scraper.fetch_all(false).await.unwrap();
    assert_eq!(catalog[0].stations.len(), 2);

    // Complete rows were materialized into m3u/, the incomplete row's download
    // was discarded again; nothing stays in flight.
    let leftover = fs::read_dir(&download_dir).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_read_reproduces_persisted_catalog() {
    let dir = TempDir::new().unwrap();
    let scraper = InternetRadioScraper::with_transport(config(&dir), rock_source());

    let fetched = scraper.fetch_all(false).await.unwrap();
    let reloaded = scraper.read().unwrap();

    assert_eq!(reloaded, fetched);
}

#[tokio::test]
async fn test_second_run_skips_persisted_categories() {
    let dir = TempDir::new().unwrap();
    let scraper = InternetRadioScraper::with_transport(config(&dir), rock_source());
    let first = scraper.fetch_all(false).await.unwrap();

    // Fresh transport: only the directory page is registered, so any category
    // or playlist fetch would fail loudly.
    let transport = Arc::new(FakeTransport::new());
    transport.page(
        &format!("{BASE}/stations/"),
        &directory_page(&[("rock", "/stations/rock/")]),
    );
    let resumed = InternetRadioScraper::with_transport(config(&dir), transport.clone());

    let second = resumed.fetch_all(false).await.unwrap();

    assert_eq!(second.len(), first.len(), "no duplicate categories");
    assert_eq!(
        transport.requests(),
        vec![format!("{BASE}/stations/")],
        "resumed run must touch nothing beyond the directory"
    );
}

#[tokio::test]
async fn test_duplicate_playlist_content_is_deduplicated() {
    let dir = TempDir::new().unwrap();
    let transport = FakeTransport::new();
    transport.page(
        &format!("{BASE}/stations/"),
        &directory_page(&[("rock", "/stations/rock/")]),
    );
    transport.page(
        &format!("{BASE}/stations/rock/"),
        &category_page(
            "Rock.",
            "",
            &[
                station_row("A", "", "rock", "128 Kbps", "/servers/tools/playlistgenerator?pl=1"),
                station_row("B", "", "rock", "64 Kbps", "/servers/tools/playlistgenerator?pl=2"),
            ],
        ),
    );
    // Byte-identical playlists behind different URLs.
    transport.binary(
        &format!("{BASE}/servers/tools/playlistgenerator?pl=1"),
        b"#EXTM3U\nhttp://same.example.com/listen\n",
    );
    transport.binary(
        &format!("{BASE}/servers/tools/playlistgenerator?pl=2"),
        b"#EXTM3U\nhttp://same.example.com/listen\n",
    );

    let scraper = InternetRadioScraper::with_transport(config(&dir), Arc::new(transport));
    let catalog = scraper.fetch_all(false).await.unwrap();

    let stations = &catalog[0].stations;
    assert_eq!(stations[0].playlist_file, stations[1].playlist_file);
    let files = fs::read_dir(dir.path().join("data").join("m3u")).unwrap().count();
    assert_eq!(files, 1, "identical content must be stored once");
}

#[tokio::test]
async fn test_pagination_concatenates_pages_in_order() {
    let dir = TempDir::new().unwrap();
    let transport = FakeTransport::new();
    transport.page(
        &format!("{BASE}/stations/"),
        &directory_page(&[("rock", "/stations/rock/")]),
    );
    let pagination = r#"<ul class="pagination">
        <li class="active"><span>1</span></li>
        <li><a href="/stations/rock/page-2.html">2</a></li>
    </ul>"#;
    transport.page(
        &format!("{BASE}/stations/rock/"),
        &category_page(
            "Rock.",
            pagination,
            &[station_row("First Page FM", "", "rock", "128 Kbps", "/servers/tools/playlistgenerator?pl=1")],
        ),
    );
    transport.page(
        &format!("{BASE}/stations/rock/page-2.html"),
        &category_page(
            "Rock.",
            pagination,
            &[station_row("Second Page FM", "", "rock", "128 Kbps", "/servers/tools/playlistgenerator?pl=2")],
        ),
    );
    transport.binary(&format!("{BASE}/servers/tools/playlistgenerator?pl=1"), b"#EXTM3U\n1\n");
    transport.binary(&format!("{BASE}/servers/tools/playlistgenerator?pl=2"), b"#EXTM3U\n2\n");

    let scraper = InternetRadioScraper::with_transport(config(&dir), Arc::new(transport));
    let catalog = scraper.fetch_all(false).await.unwrap();

    let names: Vec<_> = catalog[0].stations.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["First Page FM", "Second Page FM"]);
}

#[tokio::test]
async fn test_redownload_clears_previous_state() {
    let dir = TempDir::new().unwrap();
    let scraper = InternetRadioScraper::with_transport(config(&dir), rock_source());
    scraper.fetch_all(false).await.unwrap();

    // Plant a category that only exists in the saved document.
    let storage = StorageService::new(dir.path().join("data"));
    let mut planted = storage.load().unwrap();
    planted.push(radioscraper::RadioCategory {
        name: "stale".to_string(),
        description: "left over".to_string(),
        stations: Vec::new(),
    });
    storage.save(&planted).unwrap();

    let scraper = InternetRadioScraper::with_transport(config(&dir), rock_source());
    let catalog = scraper.fetch_all(true).await.unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].name, "rock");
}

#[tokio::test]
async fn test_missing_description_is_fatal_but_prior_categories_persist() {
    let dir = TempDir::new().unwrap();
    let transport = FakeTransport::new();
    transport.page(
        &format!("{BASE}/stations/"),
        &directory_page(&[("rock", "/stations/rock/"), ("jazz", "/stations/jazz/")]),
    );
    transport.page(
        &format!("{BASE}/stations/rock/"),
        &category_page(
            "Rock.",
            "",
            &[station_row("A", "", "rock", "128 Kbps", "/servers/tools/playlistgenerator?pl=1")],
        ),
    );
    transport.binary(&format!("{BASE}/servers/tools/playlistgenerator?pl=1"), b"#EXTM3U\n");
    // The jazz page has no About panel at all.
    transport.page(
        &format!("{BASE}/stations/jazz/"),
        "<html><body><p>nothing here</p></body></html>",
    );

    let scraper = InternetRadioScraper::with_transport(config(&dir), Arc::new(transport));
    let error = scraper.fetch_all(false).await.unwrap_err();
    assert!(matches!(error, ScrapeError::Extraction(_)));

    // The rock category survived the abort.
    let persisted = scraper.read().unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].name, "rock");
}

#[tokio::test]
async fn test_run_without_persistence() {
    let scraper = InternetRadioScraper::with_transport(
        ScraperConfig {
            base_url: BASE.to_string(),
            ..ScraperConfig::default()
        },
        rock_source(),
    );

    let catalog = scraper.fetch_all(false).await.unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].stations.len(), 2);

    // Nothing was materialized; playlists stay in temp storage.
    for station in &catalog[0].stations {
        assert!(station.playlist_file.exists());
        fs::remove_file(&station.playlist_file).unwrap();
    }
}
