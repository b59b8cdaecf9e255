//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Every file the default shell expects.
pub const DEFAULT_SHELL_FILES: &[&str] = &[
  "index.html",
  "js/main.js",
  "js/plugins.js",
  "js/rpg_core.js",
  "js/rpg_managers.js",
  "js/rpg_objects.js",
  "js/rpg_scenes.js",
  "js/rpg_sprites.js",
  "js/rpg_windows.js",
  "css/style.css",
];

/// Isolated content tree in a temporary directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// A small game: the default shell plus a few assets and some junk that
  /// the default excludes drop.
  pub fn game() -> Self {
    let env = Self::empty();
    for file in DEFAULT_SHELL_FILES {
      env.write_file(file, file);
    }
    env.write_file("img/system/Empty.png", "png");
    env.write_file("img/pictures/Title.png", "png");
    env.write_file("audio/bgm/Theme.ogg", "ogg");
    env.write_file("data/Map001.json", "{}");
    env.write_file("js/main.js.map", "{}");
    env.write_file("img/.DS_Store", "");
    env
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn join(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.join(relative_path)).unwrap()
  }

  /// The swcache binary running inside the temp directory with no
  /// environment overrides.
  pub fn swcache_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("swcache");
    cmd.current_dir(self.path());
    cmd.env_remove("SWCACHE_ROOT");
    cmd.env_remove("SWCACHE_OUTPUT");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
