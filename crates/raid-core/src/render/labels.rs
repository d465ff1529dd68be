//! Fixed labels of the rendered format
//!
//! Changing any of the first four breaks recovery of already-posted raids.

pub const BOSS_LABEL: &str = "**Boss:**";
pub const LOCATION_LABEL: &str = "**Místo:**";
pub const TIME_LABEL: &str = "**Čas:**";
pub const DATE_LABEL: &str = "**Datum:**";

pub const GOING_LABEL: &str = "Hráči";
pub const REMOTE_LABEL: &str = "Na dálku";
pub const INVITED_LABEL: &str = "Pozvaní";
pub const EXTRA_LABEL: &str = "Další";
pub const NO_TEAM_LABEL: &str = "Bez týmu";

pub const CAPACITY_WARNING_TITLE: &str = "⚠️ Příliš mnoho hráčů na dálku a pozvaných! ⚠️";

// Field names of the legacy layout
pub const LEGACY_BOSS_FIELD: &str = "Boss";
pub const LEGACY_LOCATION_FIELD: &str = "Místo";
pub const LEGACY_TIME_FIELD: &str = "Čas";
pub const LEGACY_DATE_FIELD: &str = "Datum";
