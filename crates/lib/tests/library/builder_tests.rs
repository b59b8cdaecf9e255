//! Manifest build from a content tree to a written agent.

use std::fs;
use std::path::Path;

use tempfile::{TempDir, tempdir};

use reqwest::Url;

use swcache_lib::engine::{AssetIndex, RequestClass};
use swcache_lib::{AssetPath, BuildConfig, BuildError, BuildOptions, build};

fn write(root: &Path, rel: &str) {
  let path = root.join(rel);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, rel).unwrap();
}

fn paths(items: &[&str]) -> Vec<AssetPath> {
  items.iter().map(|s| AssetPath::parse(s).unwrap()).collect()
}

fn names<'a>(set: impl IntoIterator<Item = &'a AssetPath>) -> Vec<&'a str> {
  set.into_iter().map(AssetPath::as_str).collect()
}

/// `{index.html, js/main.js, img/a.png, img/a.png.map}` with a two-entry shell.
fn game() -> (TempDir, BuildConfig) {
  let temp = tempdir().unwrap();
  for rel in ["index.html", "js/main.js", "img/a.png", "img/a.png.map"] {
    write(temp.path(), rel);
  }
  let config = BuildConfig {
    root: temp.path().to_path_buf(),
    output: temp.path().join("sw.js"),
    shell: paths(&["/index.html", "/js/main.js"]),
    ..BuildConfig::default()
  };
  (temp, config)
}

#[test]
fn builds_manifest_and_writes_agent() {
  let (_temp, config) = game();

  let summary = build(&config, BuildOptions::default()).unwrap();

  assert_eq!(names(summary.manifest.shell()), vec!["/index.html", "/js/main.js"]);
  assert_eq!(names(summary.manifest.dynamic()), vec!["/img/a.png"]);
  assert!(summary.written);
  assert_eq!(summary.asset_count(), 3);
  assert!(summary.cache_name.starts_with("pwa-cache-"));

  let agent = fs::read_to_string(&config.output).unwrap();
  assert!(agent.contains(&summary.cache_name));
  assert!(agent.contains("\"/img/a.png\""));
  assert!(!agent.contains("a.png.map"));
  assert!(!agent.contains("{{"));
}

#[test]
fn rebuild_ignores_its_own_output() {
  let (_temp, config) = game();
  let first = build(&config, BuildOptions::default()).unwrap();

  let second = build(&config, BuildOptions::default()).unwrap();

  assert!(!second.manifest.contains(&AssetPath::parse("/sw.js").unwrap()));
  assert_eq!(first.manifest.shell(), second.manifest.shell());
  assert_eq!(first.manifest.dynamic(), second.manifest.dynamic());
  assert_ne!(first.generation_id, second.generation_id);
}

#[test]
fn every_included_file_appears_once() {
  let (temp, config) = game();
  write(temp.path(), "audio/bgm/Theme.ogg");
  write(temp.path(), "img/Thumbs.db");
  write(temp.path(), "test/fixture.json");
  write(temp.path(), "data/Map001.json");

  let summary = build(&config, BuildOptions { dry_run: true }).unwrap();
  let manifest = &summary.manifest;

  assert!(manifest.shell().is_disjoint(manifest.dynamic()));
  assert_eq!(
    names(manifest.dynamic()),
    vec!["/audio/bgm/Theme.ogg", "/data/Map001.json", "/img/a.png"]
  );
}

#[test]
fn dry_run_writes_nothing() {
  let (_temp, config) = game();

  let summary = build(&config, BuildOptions { dry_run: true }).unwrap();

  assert!(!summary.written);
  assert!(!config.output.exists());
}

#[test]
fn missing_shell_entry_fails_without_output() {
  let (_temp, mut config) = game();
  config.shell.push(AssetPath::parse("/css/game.css").unwrap());

  let err = build(&config, BuildOptions::default()).unwrap_err();

  assert!(matches!(err, BuildError::MissingShellEntry(ref p) if p.as_str() == "/css/game.css"));
  assert!(!config.output.exists());
}

#[test]
fn missing_shell_entry_can_be_allowed() {
  let (_temp, mut config) = game();
  config.shell.push(AssetPath::parse("/css/game.css").unwrap());
  config.allow_missing_shell = true;

  let summary = build(&config, BuildOptions::default()).unwrap();

  assert_eq!(names(&summary.missing_shell), vec!["/css/game.css"]);
  assert!(summary.manifest.shell().contains(&AssetPath::parse("/css/game.css").unwrap()));
  assert!(config.output.exists());
}

#[test]
fn unreadable_root_fails_without_output() {
  let temp = tempdir().unwrap();
  let config = BuildConfig {
    root: temp.path().join("missing"),
    output: temp.path().join("sw.js"),
    ..BuildConfig::default()
  };

  let err = build(&config, BuildOptions::default()).unwrap_err();

  assert!(matches!(err, BuildError::ReadRoot { .. }));
  assert!(!config.output.exists());
}

#[test]
fn invalid_exclude_pattern_is_reported() {
  let (_temp, mut config) = game();
  config.exclude.push(swcache_lib::ExcludeRule::regex("(unclosed"));

  let err = build(&config, BuildOptions::default()).unwrap_err();

  assert!(matches!(err, BuildError::ExcludePattern { .. }));
}

#[test]
fn file_names_with_url_delimiters_are_cached_under_their_request_path() {
  let temp = tempdir().unwrap();
  for rel in ["index.html", "audio/se/hit#1.ogg", "100%.png"] {
    write(temp.path(), rel);
  }
  let config = BuildConfig {
    root: temp.path().to_path_buf(),
    output: temp.path().join("sw.js"),
    shell: paths(&["/index.html"]),
    ..BuildConfig::default()
  };

  let summary = build(&config, BuildOptions::default()).unwrap();

  assert_eq!(
    names(summary.manifest.dynamic()),
    vec!["/100%25.png", "/audio/se/hit%231.ogg"]
  );
  let agent = fs::read_to_string(&config.output).unwrap();
  assert!(agent.contains("\"/audio/se/hit%231.ogg\""));

  let origin = Url::parse("https://game.example").unwrap();
  let index = AssetIndex::new(&origin, summary.manifest.shell(), summary.manifest.dynamic());
  for requested in [
    "https://game.example/audio/se/hit%231.ogg",
    "https://game.example/100%25.png",
  ] {
    assert_eq!(index.classify(&Url::parse(requested).unwrap()), RequestClass::Asset, "{requested}");
  }
}
