//! Engine integration tests
//!
//! Each test drives a [`TestHarness`]: a real engine wired to the in-memory
//! platform, a fixed player directory and a manual clock.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use integration_tests::*;
use rand::seq::SliceRandom;
use rand::Rng;
use raid_common::RaidSettings;
use raid_core::render::{DATE_LABEL, TIME_LABEL};
use raid_core::{
    render, DomainError, Headcount, PlayerInfo, RaidCategory, RaidColor, RaidEvent, RaidRecord,
    ReactionSymbol, ReactionUser, RosterKind, Rosters, Snowflake, Team,
};
use raid_engine::{RaidRequest, RaidRuntime, RaidTarget};

const GOING: &str = "👍";
const REMOTE: &str = "🏠";
const INVITED: &str = "🤝";

fn keycap(count: u8) -> &'static str {
    let headcount = Headcount::new(count).unwrap();
    ReactionSymbol::Extra(headcount).emoji()
}

// ============================================================================
// End-to-end flows
// ============================================================================

#[tokio::test]
async fn test_going_reaction_shows_and_hides_section() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Tyranitar", "Parking lot", 15)
        .await
        .unwrap();

    let initial = h.rendered(msg);
    assert_eq!(initial.title, "Raid: Tyranitar");
    assert!(initial.description.contains("**Boss:** Tyranitar"));
    assert!(initial.description.contains("**Místo:** Parking lot"));
    assert!(initial.description.contains(&format!("{TIME_LABEL} 10:15")));
    assert!(!initial.has_section("Hráči"));

    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    assert_eq!(h.rendered(msg).section("Hráči"), Some("**Hráči (1):** Ash"));

    h.unreact(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    assert!(!h.rendered(msg).has_section("Hráči"));
    assert!(h.rosters(RAID_SUB_ID, msg).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scheduled_raid_survives_daily_sweeps_until_its_date() {
    let h = TestHarness::new();
    let msg = h
        .create_scheduled(SCHEDULED_SUB_ID, "Mewtwo", "Náměstí", 3)
        .await
        .unwrap();
    h.react(SCHEDULED_SUB_ID, msg, GOING, misty().user_id).await;
    let before = h.rosters(SCHEDULED_SUB_ID, msg).await.unwrap();

    for _ in 0..3 {
        h.clock.advance(Duration::days(1));
        let report = h.engine.sweep().await;
        assert_eq!(report.refreshed, 1);
        assert!(report.expired.is_empty());

        let rendered = h.rendered(msg);
        assert_eq!(rendered.color, RaidColor::Green);
        assert!(rendered.description.contains(DATE_LABEL));
        assert_eq!(h.rosters(SCHEDULED_SUB_ID, msg).await.unwrap(), before);
    }

    h.clock.advance(Duration::days(1));
    let report = h.engine.sweep().await;
    assert_eq!(report.refreshed, 0);
    assert_eq!(report.expired.len(), 1);
    assert_eq!(report.expired[0].message_id, msg);
    assert!(h.store().is_empty());
    assert_eq!(h.rendered(msg).color, RaidColor::Red);
}

#[tokio::test]
async fn test_restart_rebuilds_rosters_from_live_reactions() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Tyranitar", "Parking lot", 30)
        .await
        .unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    h.react(RAID_SUB_ID, msg, GOING, misty().user_id).await;

    let restarted = h.restart();
    assert!(restarted.store().is_empty());

    let report = restarted.engine.on_available(SPACE_ID).await;
    assert_eq!(report.recovered, 1);
    assert_eq!(report.failed_channels, 0);

    let rosters = restarted.rosters(RAID_SUB_ID, msg).await.unwrap();
    let going = rosters.roster(RosterKind::Going);
    assert_eq!(going.len(), 2);
    assert_eq!(going[&ash().user_id], ash());
    assert_eq!(going[&misty().user_id].team, Some(Team::Mystic));
    assert_eq!(going[&misty().user_id].level, Some(38));
    assert_eq!(rosters.count(RosterKind::Remote), 0);

    let record = restarted
        .store()
        .get(raid_engine::RaidKey::new(SPACE_ID, RAID_SUB_ID, msg))
        .unwrap();
    let record = record.lock().await;
    assert_eq!(record.category(), RaidCategory::Immediate);
    assert_eq!(record.boss_name(), "Tyranitar");
    assert_eq!(record.event_time(), base_time() + Duration::minutes(30));
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_duplicate_reaction_is_idempotent() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Raikou", "Park", 20)
        .await
        .unwrap();

    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    let once = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;

    assert_eq!(h.rosters(RAID_SUB_ID, msg).await.unwrap(), once);
    assert_eq!(h.rendered(msg).section("Hráči"), Some("**Hráči (1):** Ash"));
}

#[tokio::test]
async fn test_roster_reaction_evicts_sibling_and_strips_its_icon() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Raikou", "Park", 20)
        .await
        .unwrap();
    let user = ash().user_id;

    h.react(RAID_SUB_ID, msg, GOING, user).await;
    h.react(RAID_SUB_ID, msg, REMOTE, user).await;

    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(user), Some(RosterKind::Remote));
    assert!(!rosters.contains(RosterKind::Going, user));
    assert!(h
        .transport
        .deleted_reactions()
        .contains(&(msg, GOING.to_string(), user)));
    assert!(!h.transport.holders(msg, GOING).contains(&user));

    let rendered = h.rendered(msg);
    assert!(!rendered.has_section("Hráči"));
    assert_eq!(rendered.section("Na dálku"), Some("**Na dálku (1):** Ash"));

    // The platform echoes the strip back; it must not disturb the remote entry
    h.unreact(RAID_SUB_ID, msg, GOING, user).await;
    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(user), Some(RosterKind::Remote));
}

#[tokio::test]
async fn test_unrecognized_reaction_is_stripped() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Raikou", "Park", 20)
        .await
        .unwrap();
    let edits = h.transport.edit_count(msg);

    h.react(RAID_SUB_ID, msg, "🐉", brock().user_id).await;

    assert!(h
        .transport
        .deleted_reactions()
        .contains(&(msg, "🐉".to_string(), brock().user_id)));
    assert!(h.transport.holders(msg, "🐉").is_empty());
    assert!(h.rosters(RAID_SUB_ID, msg).await.unwrap().is_empty());
    assert_eq!(h.transport.edit_count(msg), edits);
}

#[tokio::test]
async fn test_extra_headcounts_are_summed() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Entei", "Nádraží", 45)
        .await
        .unwrap();

    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    h.react(RAID_SUB_ID, msg, keycap(2), ash().user_id).await;
    h.react(RAID_SUB_ID, msg, keycap(3), ash().user_id).await;
    assert_eq!(h.rendered(msg).section("Další"), Some("**Další (5):** 2 + 3"));

    h.unreact(RAID_SUB_ID, msg, keycap(2), ash().user_id).await;
    assert_eq!(h.rendered(msg).section("Další"), Some("**Další (3):** 3"));

    // Extras are independent of the going roster
    h.unreact(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(ash().user_id), None);
    assert_eq!(rosters.extra_total(), 3);
}

#[tokio::test]
async fn test_tenth_headcount_symbol_is_rejected() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Entei", "Nádraží", 45)
        .await
        .unwrap();
    let user = ash().user_id;

    for count in 1..=9 {
        h.react(RAID_SUB_ID, msg, keycap(count), user).await;
    }
    let edits = h.transport.edit_count(msg);

    h.react(RAID_SUB_ID, msg, "🔟", user).await;

    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.extras_of(user).count(), 9);
    assert_eq!(rosters.extra_total(), 45);
    assert!(h
        .transport
        .deleted_reactions()
        .contains(&(msg, "🔟".to_string(), user)));
    assert!(h.transport.holders(msg, "🔟").is_empty());
    assert_eq!(h.transport.edit_count(msg), edits);
}

#[tokio::test]
async fn test_unknown_player_gets_placeholder_name() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Entei", "Nádraží", 45)
        .await
        .unwrap();
    let stranger = unique_user();

    h.react(RAID_SUB_ID, msg, INVITED, stranger).await;

    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(
        rosters.roster(RosterKind::Invited)[&stranger],
        PlayerInfo::unknown(stranger)
    );
}

#[tokio::test]
async fn test_own_reactions_are_ignored() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Entei", "Nádraží", 45)
        .await
        .unwrap();

    h.react(RAID_SUB_ID, msg, GOING, BOT_ID).await;

    assert!(h.rosters(RAID_SUB_ID, msg).await.unwrap().is_empty());
    assert_eq!(h.directory.lookups(), 0);
}

#[tokio::test]
async fn test_deleted_message_drops_raid() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Entei", "Nádraží", 45)
        .await
        .unwrap();

    h.engine.on_message_deleted(SPACE_ID, RAID_SUB_ID, msg);
    assert!(h.store().is_empty());

    let edits = h.transport.total_edits();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    assert_eq!(h.transport.total_edits(), edits);
}

#[tokio::test]
async fn test_reactions_on_expired_raid_are_ignored() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Entei", "Nádraží", 45)
        .await
        .unwrap();

    h.clock.advance(Duration::hours(3) + Duration::minutes(1));
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;

    assert!(h.rosters(RAID_SUB_ID, msg).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_large_going_roster_is_grouped_by_team() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Groudon", "Kostel", 30)
        .await
        .unwrap();

    let teams = [Team::Valor, Team::Mystic, Team::Instinct];
    for i in 0..12_usize {
        let id = unique_user();
        let mut player = PlayerInfo::new(id, format!("Trainer{i:02}"));
        if i < 9 {
            player.team = Some(teams[i % 3]);
        }
        h.directory.insert(player);
        h.react(RAID_SUB_ID, msg, GOING, id).await;
    }

    let description = h.rendered(msg).description;
    assert!(description.contains("**Hráči (12):**\n"));
    assert!(description.contains("Bez týmu (3) - Trainer09, Trainer10, Trainer11"));
    assert_eq!(description.matches(" (3) - ").count(), 4);
}

#[tokio::test]
async fn test_too_many_remote_players_switch_title() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Groudon", "Kostel", 30)
        .await
        .unwrap();

    for i in 0..11 {
        let symbol = if i % 2 == 0 { REMOTE } else { INVITED };
        h.react(RAID_SUB_ID, msg, symbol, unique_user()).await;
    }

    assert_eq!(
        h.rendered(msg).title,
        raid_core::render::CAPACITY_WARNING_TITLE
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Step {
    Add(&'static str),
    Remove(&'static str),
}

fn random_steps(rng: &mut impl Rng, len: usize) -> Vec<Step> {
    let symbols = [GOING, REMOTE, INVITED, keycap(1), keycap(2), keycap(5)];
    (0..len)
        .map(|_| {
            let symbol = *symbols.choose(&mut *rng).unwrap();
            if rng.gen_bool(0.6) {
                Step::Add(symbol)
            } else {
                Step::Remove(symbol)
            }
        })
        .collect()
}

/// What one user's steps do to the rosters when applied one by one
fn apply_serially(rosters: &mut Rosters, user_id: Snowflake, steps: &[Step]) {
    for step in steps {
        match *step {
            Step::Add(symbol) => match ReactionSymbol::parse(symbol).unwrap() {
                ReactionSymbol::Roster(kind) => {
                    rosters.join(kind, PlayerInfo::unknown(user_id));
                }
                ReactionSymbol::Extra(headcount) => {
                    rosters.add_extra(user_id, headcount);
                }
            },
            Step::Remove(symbol) => match ReactionSymbol::parse(symbol).unwrap() {
                ReactionSymbol::Roster(kind) => {
                    rosters.leave(kind, user_id);
                }
                ReactionSymbol::Extra(headcount) => {
                    rosters.remove_extra(user_id, headcount);
                }
            },
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reactions_match_serial_outcome() {
    let h = Arc::new(TestHarness::new());
    let msg = h
        .create_immediate(RAID_SUB_ID, "Zapdos", "Most", 60)
        .await
        .unwrap();

    let plans: Vec<(Snowflake, Vec<Step>)> = {
        let mut rng = rand::thread_rng();
        let mut plans: Vec<_> = (0..24)
            .map(|_| (unique_user(), random_steps(&mut rng, 20)))
            .collect();
        plans.shuffle(&mut rng);
        plans
    };

    let mut expected = Rosters::new();
    for (user_id, steps) in &plans {
        apply_serially(&mut expected, *user_id, steps);
    }

    let tasks: Vec<_> = plans
        .into_iter()
        .map(|(user_id, steps)| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                for step in steps {
                    match step {
                        Step::Add(symbol) => h.react(RAID_SUB_ID, msg, symbol, user_id).await,
                        Step::Remove(symbol) => {
                            h.unreact(RAID_SUB_ID, msg, symbol, user_id).await;
                        }
                    }
                }
            })
        })
        .collect();
    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    assert_eq!(h.rosters(RAID_SUB_ID, msg).await.unwrap(), expected);

    // The last write reflects the final state
    let record = h
        .store()
        .get(raid_engine::RaidKey::new(SPACE_ID, RAID_SUB_ID, msg))
        .unwrap();
    let record = record.lock().await;
    let rendered = render(&record, h.time(), h.engine.policy());
    assert_eq!(h.rendered(msg).description, rendered.description);
}

// ============================================================================
// Sweep
// ============================================================================

#[tokio::test]
async fn test_sweep_failure_does_not_stop_other_raids() {
    let h = TestHarness::new();
    let broken = h
        .create_immediate(RAID_SUB_ID, "Lugia", "Mlýn", 20)
        .await
        .unwrap();
    let healthy = h
        .create_immediate(RAID_SUB_ID, "Ho-Oh", "Mlýn", 40)
        .await
        .unwrap();
    h.transport.fail_edits_for(broken);

    h.clock.advance(Duration::minutes(10));
    let report = h.engine.sweep().await;
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0.message_id, broken);
    assert!(!report.is_clean());
    assert_eq!(h.rendered(healthy).color, RaidColor::Green);
    assert_eq!(h.store().len(), 2);

    // Past the lifetime both go, failing push or not
    h.clock.advance(Duration::hours(3));
    let report = h.engine.sweep().await;
    assert_eq!(report.expired.len(), 2);
    assert!(h.store().is_empty());
}

#[tokio::test]
async fn test_sweep_turns_raid_orange_then_red() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Lugia", "Mlýn", 30)
        .await
        .unwrap();
    assert_eq!(h.rendered(msg).color, RaidColor::Green);

    h.clock.advance(Duration::minutes(20));
    h.engine.sweep().await;
    assert_eq!(h.rendered(msg).color, RaidColor::Orange);

    h.clock.advance(Duration::minutes(15));
    let report = h.engine.sweep().await;
    assert_eq!(h.rendered(msg).color, RaidColor::Red);
    assert_eq!(report.refreshed, 1);
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_create_raid_seeds_legend() {
    let h = TestHarness::new();
    let request = RaidRequest::new("Kyogre", "Přístav", "10:30").with_announcement("@raiders");
    let msg = h
        .engine
        .create_raid(SPACE_ID, RAID_SUB_ID, request)
        .await
        .unwrap();

    assert_eq!(h.transport.message(msg).unwrap().text, "@raiders");
    for symbol in ReactionSymbol::all() {
        assert_eq!(h.transport.holders(msg, symbol.emoji()), vec![BOT_ID]);
    }
    assert_eq!(h.store().len(), 1);
}

#[tokio::test]
async fn test_create_raid_rejections() {
    let h = TestHarness::new();

    let err = h
        .engine
        .create_raid(SPACE_ID, RAID_SUB_ID, RaidRequest::new("Kyogre", "Přístav", "09:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::TimeInPast));

    let err = h
        .engine
        .create_raid(SPACE_ID, CHAT_SUB_ID, RaidRequest::new("Kyogre", "Přístav", "11:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ChannelNotBound(id) if id == CHAT_SUB_ID));

    let err = h
        .engine
        .create_raid(
            SPACE_ID,
            RAID_SUB_ID,
            RaidRequest::new("Kyogre", "Přístav", "12.03.2026 11:00"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ScheduledNotAllowed));

    let err = h
        .create_scheduled(SCHEDULED_SUB_ID, "Kyogre", "Přístav", 20)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DomainError>(),
        Some(DomainError::BeyondHorizon { days: 14 })
    ));

    let err = h
        .engine
        .create_raid(SPACE_ID, RAID_SUB_ID, RaidRequest::new("  ", "Přístav", "11:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EmptyField(_)));

    let err = h
        .engine
        .create_raid(SPACE_ID, RAID_SUB_ID, RaidRequest::new("Kyogre", "Přístav", "25:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTime(_)));

    assert!(h.store().is_empty());
    assert_eq!(h.transport.total_edits(), 0);
}

#[tokio::test]
async fn test_adjust_time_notifies_everyone_signed_up() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Tyranitar", "Parking lot", 15)
        .await
        .unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    h.react(RAID_SUB_ID, msg, REMOTE, misty().user_id).await;
    h.react(RAID_SUB_ID, msg, keycap(2), brock().user_id).await;

    let adjustment = h
        .engine
        .adjust_time(SPACE_ID, RAID_SUB_ID, RaidTarget::Recent(0), "10:45")
        .await
        .unwrap();
    assert_eq!(adjustment.message_id, msg);
    assert_eq!(adjustment.notified, 3);
    assert_eq!(adjustment.failed, 0);

    assert!(h
        .rendered(msg)
        .description
        .contains(&format!("{TIME_LABEL} 10:45")));
    let notifications = h.transport.notifications();
    assert_eq!(notifications.len(), 3);
    assert!(notifications
        .iter()
        .all(|(_, text)| text == "Raid Tyranitar (Parking lot) byl přesunut na 10:45."));
}

#[tokio::test]
async fn test_notification_failure_is_isolated() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Tyranitar", "Parking lot", 15)
        .await
        .unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    h.react(RAID_SUB_ID, msg, GOING, misty().user_id).await;
    h.transport.fail_notifications_for(ash().user_id);

    let adjustment = h
        .engine
        .adjust_boss(SPACE_ID, RAID_SUB_ID, RaidTarget::Id(msg), "Mewtwo")
        .await
        .unwrap();
    assert_eq!(adjustment.notified, 1);
    assert_eq!(adjustment.failed, 1);

    assert_eq!(
        h.transport.notifications(),
        vec![(
            misty().user_id,
            "Boss raidu v Parking lot (10:15) se změnil z Tyranitar na Mewtwo.".to_string()
        )]
    );
    assert_eq!(h.rendered(msg).title, "Raid: Mewtwo");
}

#[tokio::test]
async fn test_adjust_targets_and_rejections() {
    let h = TestHarness::new();
    let older = h
        .create_immediate(RAID_SUB_ID, "Lugia", "Mlýn", 20)
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(1));
    let newer = h
        .create_immediate(RAID_SUB_ID, "Ho-Oh", "Mlýn", 20)
        .await
        .unwrap();

    let adjustment = h
        .engine
        .adjust_boss(SPACE_ID, RAID_SUB_ID, RaidTarget::Recent(1), "Suicune")
        .await
        .unwrap();
    assert_eq!(adjustment.message_id, older);
    let adjustment = h
        .engine
        .adjust_boss(SPACE_ID, RAID_SUB_ID, RaidTarget::Recent(0), "Raikou")
        .await
        .unwrap();
    assert_eq!(adjustment.message_id, newer);

    let err = h
        .engine
        .adjust_time(SPACE_ID, RAID_SUB_ID, RaidTarget::Recent(5), "11:00")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PositionOutOfRange(5)));

    let missing = Snowflake::new(999);
    let err = h
        .engine
        .adjust_time(SPACE_ID, RAID_SUB_ID, RaidTarget::Id(missing), "11:00")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RaidNotFound(id) if id == missing));

    let err = h
        .engine
        .adjust_time(SPACE_ID, RAID_SUB_ID, RaidTarget::Id(newer), "11.03.2026 11:00")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotToday));

    let err = h
        .engine
        .adjust_time(SPACE_ID, RAID_SUB_ID, RaidTarget::Id(newer), "08:00")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::TimeInPast));

    h.clock.advance(Duration::hours(4));
    let err = h
        .engine
        .adjust_time(SPACE_ID, RAID_SUB_ID, RaidTarget::Id(newer), "23:00")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RaidExpired));
}

#[tokio::test]
async fn test_adjust_scheduled_time_keeps_date_for_bare_time() {
    let h = TestHarness::new();
    let msg = h
        .create_scheduled(SCHEDULED_SUB_ID, "Mewtwo", "Náměstí", 2)
        .await
        .unwrap();

    h.engine
        .adjust_time(SPACE_ID, SCHEDULED_SUB_ID, RaidTarget::Id(msg), "18:30")
        .await
        .unwrap();

    assert!(h
        .rendered(msg)
        .description
        .contains(&format!("{DATE_LABEL} 12.03.2026 18:30")));
}

// ============================================================================
// Recovery
// ============================================================================

fn rendered_raid(
    h: &TestHarness,
    category: RaidCategory,
    event_time: chrono::DateTime<chrono::Utc>,
    created_at: chrono::DateTime<chrono::Utc>,
) -> raid_core::RenderedRaid {
    let record = RaidRecord::new(category, "Dialga", "Hřbitov", event_time, created_at).unwrap();
    render(&record, h.time(), h.engine.policy())
}

#[tokio::test]
async fn test_recovery_skips_foreign_stale_and_expired_messages() {
    let h = TestHarness::new();

    let foreign = h.transport.seed_message(
        RAID_SUB_ID,
        ash().user_id,
        at("2026-03-10T08:30:00Z"),
        rendered_raid(
            &h,
            RaidCategory::Immediate,
            at("2026-03-10T09:30:00Z"),
            at("2026-03-10T08:30:00Z"),
        ),
    );
    let yesterday = h.transport.seed_message(
        RAID_SUB_ID,
        BOT_ID,
        at("2026-03-09T20:00:00Z"),
        rendered_raid(
            &h,
            RaidCategory::Immediate,
            at("2026-03-09T20:30:00Z"),
            at("2026-03-09T20:00:00Z"),
        ),
    );
    let expired = h.transport.seed_message(
        RAID_SUB_ID,
        BOT_ID,
        at("2026-03-10T05:30:00Z"),
        rendered_raid(
            &h,
            RaidCategory::Immediate,
            at("2026-03-10T06:00:00Z"),
            at("2026-03-10T05:30:00Z"),
        ),
    );
    let live = h.transport.seed_message(
        SCHEDULED_SUB_ID,
        BOT_ID,
        at("2026-03-08T12:00:00Z"),
        rendered_raid(
            &h,
            RaidCategory::Scheduled,
            at("2026-03-11T16:00:00Z"),
            at("2026-03-08T12:00:00Z"),
        ),
    );

    let report = h.engine.on_available(SPACE_ID).await;
    assert_eq!(report.recovered, 1);
    assert_eq!(report.expired, 1);

    assert!(h.rosters(RAID_SUB_ID, foreign).await.is_none());
    assert!(h.rosters(RAID_SUB_ID, yesterday).await.is_none());
    assert!(h.rosters(RAID_SUB_ID, expired).await.is_none());
    assert!(h.rosters(SCHEDULED_SUB_ID, live).await.is_some());
    assert_eq!(h.store().len(), 1);
}

#[tokio::test]
async fn test_recovery_cleans_up_reactions() {
    let h = TestHarness::new();
    let msg = h.transport.seed_message(
        RAID_SUB_ID,
        BOT_ID,
        at("2026-03-10T08:50:00Z"),
        rendered_raid(
            &h,
            RaidCategory::Immediate,
            at("2026-03-10T09:30:00Z"),
            at("2026-03-10T08:50:00Z"),
        ),
    );
    let user = brock().user_id;
    h.transport.seed_reaction(msg, GOING, ReactionUser::bot(BOT_ID));
    h.transport.seed_reaction(msg, GOING, ReactionUser::human(user));
    h.transport.seed_reaction(msg, INVITED, ReactionUser::human(user));
    h.transport.seed_reaction(msg, keycap(4), ReactionUser::human(user));
    h.transport
        .seed_reaction(msg, "🐉", ReactionUser::human(misty().user_id));

    h.engine.on_available(SPACE_ID).await;

    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(user), Some(RosterKind::Invited));
    assert_eq!(rosters.extra_total(), 4);
    assert!(!rosters.members().contains(&misty().user_id));
    assert!(!rosters.members().contains(&BOT_ID));

    assert!(h
        .transport
        .deleted_reactions()
        .contains(&(msg, GOING.to_string(), user)));
    assert!(h
        .transport
        .cleared_reactions()
        .contains(&(msg, "🐉".to_string())));
    assert_eq!(
        h.rendered(msg).section("Pozvaní"),
        Some("**Pozvaní (1):** Brock")
    );
}

#[tokio::test]
async fn test_recovery_resyncs_a_raid_already_in_memory() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Palkia", "Škola", 25)
        .await
        .unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;

    // A withdrawal missed while disconnected
    h.transport.unseed_reaction(msg, GOING, ash().user_id);
    h.transport
        .seed_reaction(msg, REMOTE, ReactionUser::human(misty().user_id));

    let slot_before = h
        .store()
        .get(raid_engine::RaidKey::new(SPACE_ID, RAID_SUB_ID, msg))
        .unwrap();
    h.engine.on_available(SPACE_ID).await;

    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(ash().user_id), None);
    assert_eq!(rosters.kind_of(misty().user_id), Some(RosterKind::Remote));

    let slot_after = h
        .store()
        .get(raid_engine::RaidKey::new(SPACE_ID, RAID_SUB_ID, msg))
        .unwrap();
    assert!(Arc::ptr_eq(&slot_before, &slot_after));
    assert_eq!(h.store().len(), 1);
}

#[tokio::test]
async fn test_failed_holder_fetch_keeps_rosters_in_memory() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Palkia", "Škola", 25)
        .await
        .unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;
    h.react(RAID_SUB_ID, msg, GOING, misty().user_id).await;
    let before = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    let edits = h.transport.edit_count(msg);
    let rendered = h.rendered(msg);

    h.transport.fail_holder_fetch_for(msg, GOING);
    let report = h.engine.on_available(SPACE_ID).await;

    assert_eq!(report.incomplete, 1);
    assert_eq!(report.recovered, 0);
    assert_eq!(h.rosters(RAID_SUB_ID, msg).await.unwrap(), before);
    assert_eq!(before.count(RosterKind::Going), 2);
    assert_eq!(h.transport.edit_count(msg), edits);
    assert_eq!(h.rendered(msg), rendered);
}

#[tokio::test]
async fn test_failed_holder_fetch_after_restart_leaves_raid_for_next_pass() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Palkia", "Škola", 25)
        .await
        .unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;

    let restarted = h.restart();
    restarted.transport.fail_holder_fetch_for(msg, REMOTE);
    let report = restarted.engine.on_available(SPACE_ID).await;
    assert_eq!(report.incomplete, 1);
    assert!(restarted.store().is_empty());
    assert_eq!(h.rendered(msg).section("Hráči"), Some("**Hráči (1):** Ash"));

    restarted.transport.restore_holder_fetches();
    let report = restarted.engine.on_available(SPACE_ID).await;
    assert_eq!(report.recovered, 1);
    let rosters = restarted.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(ash().user_id), Some(RosterKind::Going));
}

#[tokio::test]
async fn test_recovery_counts_unreachable_channels() {
    let h = TestHarness::new();
    h.transport.set_disconnected(true);

    let report = h.engine.on_available(SPACE_ID).await;
    assert_eq!(report.failed_channels, 2);
    assert_eq!(report.recovered, 0);
}

// ============================================================================
// Runtime
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_runtime_dispatches_events_in_order() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Rayquaza", "Věž", 30)
        .await
        .unwrap();
    let runtime =
        RaidRuntime::start_engine(Arc::clone(&h.engine), &RaidSettings::default()).unwrap();
    let events = runtime.events();

    let user = ash().user_id;
    for symbol in [GOING, REMOTE, INVITED] {
        events
            .send(RaidEvent::reaction_added(SPACE_ID, RAID_SUB_ID, msg, symbol, user))
            .await
            .unwrap();
    }
    events
        .send(RaidEvent::reaction_added(
            SPACE_ID,
            RAID_SUB_ID,
            msg,
            GOING,
            misty().user_id,
        ))
        .await
        .unwrap();
    events
        .send(RaidEvent::reaction_removed(
            SPACE_ID,
            RAID_SUB_ID,
            msg,
            GOING,
            misty().user_id,
        ))
        .await
        .unwrap();
    drop(events);

    runtime.shutdown().await.unwrap();

    let rosters = h.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(user), Some(RosterKind::Invited));
    assert_eq!(rosters.kind_of(misty().user_id), None);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_sweeps_only_while_connected() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Rayquaza", "Věž", 30)
        .await
        .unwrap();
    let runtime =
        RaidRuntime::start_engine(Arc::clone(&h.engine), &RaidSettings::default()).unwrap();
    let events = runtime.events();

    tokio::time::sleep(StdDuration::from_secs(180)).await;
    assert_eq!(h.transport.edit_count(msg), 0);

    events.send(RaidEvent::Connected).await.unwrap();
    tokio::time::sleep(StdDuration::from_secs(61)).await;
    let swept = h.transport.edit_count(msg);
    assert!(swept >= 1);

    events.send(RaidEvent::Disconnected).await.unwrap();
    tokio::time::sleep(StdDuration::from_secs(1)).await;
    let paused_at = h.transport.edit_count(msg);
    tokio::time::sleep(StdDuration::from_secs(300)).await;
    assert_eq!(h.transport.edit_count(msg), paused_at);

    runtime
        .shutdown_timeout(StdDuration::from_secs(5))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_runtime_recovers_on_space_available() {
    let h = TestHarness::new();
    let msg = h
        .create_immediate(RAID_SUB_ID, "Rayquaza", "Věž", 30)
        .await
        .unwrap();
    h.react(RAID_SUB_ID, msg, GOING, ash().user_id).await;

    let restarted = h.restart();
    let runtime =
        RaidRuntime::start_engine(Arc::clone(&restarted.engine), &RaidSettings::default()).unwrap();
    runtime
        .events()
        .send(RaidEvent::space_available(SPACE_ID))
        .await
        .unwrap();
    runtime.shutdown().await.unwrap();

    let rosters = restarted.rosters(RAID_SUB_ID, msg).await.unwrap();
    assert_eq!(rosters.kind_of(ash().user_id), Some(RosterKind::Going));
}
