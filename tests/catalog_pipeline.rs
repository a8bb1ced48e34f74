mod common;

use std::io::Write;

use m3u_catalog::config::Config;
use m3u_catalog::generator::OutputWriter;
use m3u_catalog::models::{CatchupTemplate, CodecHint};
use m3u_catalog::services::CatalogBuilder;
use m3u_catalog::utils::validate_m3u;

fn pipeline_config(addr: std::net::SocketAddr, local_list: &str, output_dir: &str) -> Config {
    let toml = format!(
        r#"
[performance]
timeout = "2s"
threads = 3

[[sources]]
name = "main"
url = "http://{addr}/lists/main.m3u"
priority = 10

[[sources]]
name = "local overrides"
url = "{local_list}"
format = "text"
priority = 90

[[sources]]
name = "gone"
url = "http://{addr}/lists/missing.m3u"

[filters]
min_duration = 10
allowed_extensions = [".ts", ".m3u8", ".mp4"]

[catchup]
enable = true
days = 7
template = "playseek={{utc}}-{{utcend}}"

[detection]
enable = true
timeout = "2s"
template_timeout = "2s"
workers = 2

[output]
directory = "{output_dir}"
epg_url = "http://epg.example/guide.xml"
"#
    );
    let config = Config::from_toml_str(&toml).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_build_merges_detects_and_writes_outputs() {
    let addr = common::spawn_server().await;

    let mut local = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(
        local,
        "News,#genre#\nCNN,#http://{addr}/live/backup.ts\nbroken line without delimiter\n"
    )
    .unwrap();
    let output = tempfile::tempdir().unwrap();

    let config = pipeline_config(
        addr,
        local.path().to_str().unwrap(),
        output.path().to_str().unwrap(),
    );
    let builder = CatalogBuilder::from_config(config).unwrap();
    let summary = builder.build().await;

    assert_eq!(summary.sources.succeeded, 2);
    assert_eq!(summary.sources.failed, 1);
    assert_eq!(summary.sources.parse_skips, 1);

    let records: Vec<_> = summary.catalog.records().cloned().collect();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["CNN", "BBC"]);

    // Higher priority local entry replaced the playlist entry in place
    assert_eq!(
        records[0].url,
        format!("http://{addr}/live/backup.ts?playseek={{utc}}-{{utcend}}")
    );
    assert_eq!(records[0].priority, 90);
    assert_eq!(
        records[1].url,
        format!("http://{addr}/hls/index.m3u8?playseek={{utc}}-{{utcend}}")
    );

    let stats = summary.merge_stats();
    assert_eq!(stats.replaced, 1);
    assert_eq!(stats.filtered_duration, 1);
    assert_eq!(stats.filtered_extension, 1);

    let cnn = records[0].catchup.as_ref().unwrap();
    assert!(cnn.supported);
    assert_eq!(cnn.max_days, 7);
    assert_eq!(cnn.recommended_template, Some(CatchupTemplate::UtcRange));
    assert_eq!(cnn.codec_hint, CodecHint::MpegTs);

    let bbc = records[1].catchup.as_ref().unwrap();
    assert!(!bbc.supported);
    assert_eq!(bbc.codec_hint, CodecHint::Hls);

    let reports = summary.reports.as_ref().unwrap();
    assert_eq!(reports.len(), 2);

    let config = builder.config();
    let writer = OutputWriter::new(&config.output, config.catchup.is_active());
    writer.write_playlists(&records).await.unwrap();
    writer.write_catchup_report(reports).await.unwrap();

    let full = std::fs::read_to_string(output.path().join("full.m3u")).unwrap();
    assert!(full.starts_with("#EXTM3U x-tvg-url=\"http://epg.example/guide.xml\"\n"));
    assert!(full.contains("# Catchup: Enabled"));
    assert!(validate_m3u(&full).is_empty());

    let restricted = std::fs::read_to_string(output.path().join("tvbox.m3u")).unwrap();
    assert!(restricted.starts_with("#EXTM3U\n"));
    assert!(validate_m3u(&restricted).is_empty());

    let text = std::fs::read_to_string(output.path().join("simple.txt")).unwrap();
    assert_eq!(text.lines().count(), 2);

    let report_json = std::fs::read_to_string(output.path().join("catchup.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report_json).unwrap();
    assert_eq!(
        json[format!("http://{addr}/live/backup.ts")]["recommended_template"],
        "playseek={utc}-{utcend}"
    );
}

#[tokio::test]
async fn test_build_without_detection_is_deterministic() {
    let addr = common::spawn_server().await;
    let output = tempfile::tempdir().unwrap();
    let local = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();

    let mut config = pipeline_config(
        addr,
        local.path().to_str().unwrap(),
        output.path().to_str().unwrap(),
    );
    config.detection.enable = false;
    config.catchup.enable = false;

    let builder = CatalogBuilder::from_config(config).unwrap();
    let first = builder.build().await;
    let second = builder.build().await;

    assert!(first.reports.is_none());
    // Empty local file is skipped, not failed
    assert_eq!(first.sources.skipped, 1);

    let first_urls: Vec<String> = first.catalog.records().map(|r| r.url.clone()).collect();
    let second_urls: Vec<String> = second.catalog.records().map(|r| r.url.clone()).collect();
    assert_eq!(first_urls, second_urls);
    assert_eq!(
        first_urls,
        vec![
            format!("http://{addr}/live/stream.ts"),
            format!("http://{addr}/hls/index.m3u8"),
        ]
    );
    assert!(first.catalog.records().all(|r| r.catchup.is_none()));
}
