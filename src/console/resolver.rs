use lazy_static::lazy_static;
use regex::Regex;

/// Short mode codes accepted as mutation targets, in the order they
/// are listed to users.
pub const ACCEPTED_ALIASES: &[&str] = &[
    "casual",
    "competitive",
    "wingman",
    "armsrace",
    "demolition",
    "deathmatch",
];

/// Active-duty map pool accepted as mutation targets.
pub const MAP_POOL: &[&str] = &[
    "de_ancient",
    "de_anubis",
    "de_dust2",
    "de_inferno",
    "de_mirage",
    "de_nuke",
    "de_overpass",
    "de_train",
    "de_vertigo",
];

lazy_static! {
    static ref ALIAS_PATTERN: Regex =
        Regex::new(r"game_type\s*[=:]\s*(\d+)\D+game_mode\s*[=:]\s*(\d+)")
            .expect("Failed to compile ALIAS_PATTERN regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Mode,
    Map,
}

impl TargetKind {
    /// Console command issuing a change of this kind.
    pub fn command(&self) -> &'static str {
        match self {
            TargetKind::Mode => "game_alias",
            TargetKind::Map => "map",
        }
    }
}

/// Classify a requested identifier as a mode alias, a pool map, or
/// neither.
pub fn classify(name: &str) -> Option<TargetKind> {
    if ACCEPTED_ALIASES.contains(&name) {
        Some(TargetKind::Mode)
    } else if MAP_POOL.contains(&name) {
        Some(TargetKind::Map)
    } else {
        None
    }
}

/// Pull the numeric game_type/game_mode pair out of the console's raw
/// `game_alias` echo.
pub fn parse_alias(raw: &str) -> Option<(u8, u8)> {
    let caps = ALIAS_PATTERN.captures(raw)?;
    let game_type = caps.get(1)?.as_str().parse().ok()?;
    let game_mode = caps.get(2)?.as_str().parse().ok()?;
    Some((game_type, game_mode))
}

/// Canonical alias for a (game_type, game_mode) pair; the table is
/// fixed by the game, unknown pairs resolve to nothing.
pub fn alias_for(game_type: u8, game_mode: u8) -> Option<&'static str> {
    match (game_type, game_mode) {
        (0, 0) => Some("casual"),
        (0, 1) => Some("competitive"),
        (0, 2) => Some("wingman"),
        (1, 0) => Some("armsrace"),
        (1, 1) => Some("demolition"),
        (1, 2) => Some("deathmatch"),
        _ => None,
    }
}

/// One-step resolution from raw console output to a canonical alias.
pub fn resolve_raw_alias(raw: &str) -> Option<&'static str> {
    let (game_type, game_mode) = parse_alias(raw)?;
    alias_for(game_type, game_mode)
}
