//! Static knowledge shipped with the binary.
//!
//! These tables are seeds, not authority: a registry sync that learns a
//! different mapping for the same key overwrites them.

/// Source names (as written by the exporting app) to the domain they serve.
pub const STATIC_ALIASES: &[(&str, &str)] = &[
    ("MANGADEX", "mangadex.org"),
    ("MANGANATO", "manganato.com"),
    ("MANGAKAKALOT", "mangakakalot.com"),
    ("MANGAKAKALOTTV", "mangakakalot.com"),
    ("BATO", "bato.to"),
    ("BATO_TO", "bato.to"),
    ("NHENTAI", "nhentai.net"),
    ("VIZ", "viz.com"),
    ("WEBTOONS", "webtoons.com"),
    ("TAPAS", "tapas.io"),
    ("BILIBILI", "bilibilicomics.com"),
    ("MANGASEE", "mangasee123.com"),
    ("MANGA_SEE", "mangasee123.com"),
    ("MANGALIFE", "manga4life.com"),
    ("MANGAPARK", "mangapark.net"),
    ("ASURA", "asuracomic.net"),
    ("ASURA_SCANS", "asuracomic.net"),
    ("FLAME", "flamecomics.com"),
    ("FLAME_COMICS", "flamecomics.com"),
    ("REAPER", "reaperscans.com"),
    ("REAPER_SCANS", "reaperscans.com"),
    ("LUMINOUS", "luminousscans.com"),
    ("LEVIATAN", "leviatanscans.com"),
    ("DRAKE", "drakescans.com"),
    ("RESET", "reset-scans.com"),
    ("XCALIBR", "xcalibrscans.com"),
    ("OZUL", "ozulscans.com"),
    ("TCB", "tcbscans.com"),
    ("TCB_SCANS", "tcbscans.com"),
    ("VOID", "void-scans.com"),
    ("COSMIC", "cosmicscans.com"),
    ("SURYA", "suryascans.com"),
];

/// Retired domains to the domain the same source moved to.
pub const DEAD_DOMAINS: &[(&str, &str)] = &[
    ("asuratoon.com", "asuracomic.net"),
    ("asurascans.com", "asuracomic.net"),
    ("asura.gg", "asuracomic.net"),
    ("flamescans.org", "flamecomics.com"),
];

/// Known target-side records: raw registry id, display name, domain.
pub const STATIC_RECORDS: &[(&str, &str, &str)] = &[
    ("2499283573021220255", "MangaDex", "mangadex.org"),
    ("2973143899120668045", "MangaSee", "mangasee123.com"),
    ("8985172093557431221", "Bato.to", "bato.to"),
    ("1024627298672457456", "Manganato", "manganato.com"),
    ("6335003343669033128", "Asura Scans", "asuracomic.net"),
];
