//! Rendering a raid into message content

use std::collections::BTreeMap;

use super::labels::{
    BOSS_LABEL, CAPACITY_WARNING_TITLE, DATE_LABEL, EXTRA_LABEL, GOING_LABEL, INVITED_LABEL,
    LOCATION_LABEL, NO_TEAM_LABEL, REMOTE_LABEL, TIME_LABEL,
};
use super::RenderedRaid;
use crate::entities::{PlayerInfo, RaidCategory, RaidPolicy, RaidRecord};
use crate::time::TimeService;
use crate::value_objects::{RosterKind, Snowflake, Team};

/// Render a raid as of the time service's "now"
pub fn render(record: &RaidRecord, time: &TimeService, policy: &RaidPolicy) -> RenderedRaid {
    let now = time.now();
    let rosters = record.rosters();

    let mut lines = vec![
        format!("{BOSS_LABEL} {}", record.boss_name()),
        format!("{LOCATION_LABEL} {}", record.location()),
        match record.category() {
            RaidCategory::Immediate => {
                format!("{TIME_LABEL} {}", time.format_time(record.event_time()))
            }
            RaidCategory::Scheduled => {
                format!("{DATE_LABEL} {}", time.format_date_time(record.event_time()))
            }
        },
    ];

    let going = rosters.roster(RosterKind::Going);
    if !going.is_empty() {
        let header = section_header(GOING_LABEL, going.len());
        if going.len() >= policy.team_grouping_threshold {
            lines.push(header);
            lines.extend(team_groups(going));
        } else {
            lines.push(format!("{header} {}", joined_names(going.values())));
        }
    }

    for (kind, label) in [
        (RosterKind::Remote, REMOTE_LABEL),
        (RosterKind::Invited, INVITED_LABEL),
    ] {
        let roster = rosters.roster(kind);
        if !roster.is_empty() {
            lines.push(format!(
                "{} {}",
                section_header(label, roster.len()),
                joined_names(roster.values())
            ));
        }
    }

    let headcounts: Vec<String> = rosters
        .extras()
        .map(|(_, headcount)| headcount.to_string())
        .collect();
    if !headcounts.is_empty() {
        lines.push(format!(
            "{} {}",
            section_header(EXTRA_LABEL, rosters.extra_total() as usize),
            headcounts.join(" + ")
        ));
    }

    let title = if record.over_capacity(policy) {
        CAPACITY_WARNING_TITLE.to_string()
    } else {
        format!("Raid: {}", record.boss_name())
    };

    RenderedRaid {
        title,
        description: lines.join("\n"),
        color: record.color(now, policy),
        fields: Vec::new(),
    }
}

fn section_header(label: &str, count: usize) -> String {
    format!("**{label} ({count}):**")
}

/// Names sorted case-insensitively, comma separated
fn joined_names<'a>(players: impl Iterator<Item = &'a PlayerInfo>) -> String {
    let mut names: Vec<&str> = players.map(|p| p.display_name.as_str()).collect();
    names.sort_by_key(|name| name.to_lowercase());
    names.join(", ")
}

/// One line per team in fixed team order, players without a team last
fn team_groups(going: &BTreeMap<Snowflake, PlayerInfo>) -> Vec<String> {
    let mut by_team: BTreeMap<Option<Team>, Vec<&PlayerInfo>> = BTreeMap::new();
    for player in going.values() {
        by_team.entry(player.team).or_default().push(player);
    }

    let order = Team::ALL.into_iter().map(Some).chain([None]);
    order
        .filter_map(|team| {
            let players = by_team.remove(&team)?;
            let name = team.map_or(NO_TEAM_LABEL, Team::name);
            Some(format!(
                "{name} ({}) - {}",
                players.len(),
                joined_names(players.into_iter())
            ))
        })
        .collect()
}
