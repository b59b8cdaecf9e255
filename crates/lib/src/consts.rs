/// Default cache store name prefix; the generation id is appended.
pub const DEFAULT_CACHE_PREFIX: &str = "pwa-cache-";

/// Number of random bytes in a generation id (hex encoded, so twice as many chars).
pub const GENERATION_ID_BYTES: usize = 8;

pub const DEFAULT_OUTPUT: &str = "./sw.js";

/// Files the application needs to boot offline.
pub const DEFAULT_SHELL: &[&str] = &[
  "/",
  "/index.html",
  "/js/main.js",
  "/js/plugins.js",
  "/js/rpg_core.js",
  "/js/rpg_managers.js",
  "/js/rpg_objects.js",
  "/js/rpg_scenes.js",
  "/js/rpg_sprites.js",
  "/js/rpg_windows.js",
  "/css/style.css",
];

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/img/system/Empty.png";

pub const DEFAULT_VOLATILE_PREFIX: &str = "/data/";

pub const DEFAULT_REFRESH_ACTION: &str = "UPDATE_CACHE";

/// Extensions answered with the placeholder image when offline.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Extensions answered with an empty 200 response when offline.
pub const AUDIO_EXTENSIONS: &[&str] = &["ogg", "mp3", "wav", "m4a"];

pub const OFFLINE_BODY: &str = "Offline";

pub const ENV_ROOT: &str = "SWCACHE_ROOT";
pub const ENV_OUTPUT: &str = "SWCACHE_OUTPUT";
