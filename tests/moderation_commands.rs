//! Integration tests for chat commands: trust gating, participant actions,
//! target resolution, topic, modes and the trust list.

mod common;
use common::TestMeeting;
use meetwarden::replay::Action;
use meetwarden::security::AdmissionDecision;
use meetwarden::state::{Participant, Role, TrustLevel};

const TRUST: &str = "Carol Cohost+\nAnna Admin^\n";

#[tokio::test]
async fn test_expel_blocks_rejoin() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(2, "Jane Doe").await;

    t.say_private(1, "/expel Jane Doe").await;

    assert!(t.commands().contains(&Action::Expel(2)));
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Successfully expelled Jane Doe")
    );

    let rejoin = Participant::waiting(3, "Jane Doe", t.now());
    assert!(t.engine.is_bad_user(&rejoin).await);
    assert!(matches!(
        t.engine.admission_for(&rejoin).await,
        AdmissionDecision::Block(_)
    ));

    t.join_waiting(3, "Jane Doe").await;
    t.advance(120);
    t.tick().await;
    assert!(!t.admitted().contains(&3));
}

#[tokio::test]
async fn test_untrusted_sender_is_refused() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(4, "Random Person").await;
    t.join_meeting(2, "Jane Doe").await;

    t.say_private(4, "/expel Jane Doe").await;
    assert_eq!(
        t.last_reply_to(4).as_deref(),
        Some("Sorry, you are not authorized to run that command.")
    );
    assert!(!t.commands().contains(&Action::Expel(2)));

    // the topic query stays public
    t.say_private(4, "/topic").await;
    assert_eq!(
        t.last_reply_to(4).as_deref(),
        Some("The topic has not been set")
    );
}

#[tokio::test]
async fn test_commands_sent_to_everyone_are_ignored() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(2, "Jane Doe").await;

    t.say_public(1, "UsherBot /mute Jane Doe").await;
    assert!(!t.commands().contains(&Action::Mute(2)));
}

#[tokio::test]
async fn test_target_resolution() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(5, "Sam Lee").await;
    t.join_meeting(6, "Sam Lee").await;

    t.say_private(1, "/mute Sam Lee").await;
    let reply = t.last_reply_to(1).unwrap_or_default();
    assert!(reply.contains("More than one participant"), "{reply}");

    t.say_private(1, "/mute #6").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Successfully muted Sam Lee"));
    assert!(t.commands().contains(&Action::Mute(6)));

    t.say_private(1, "/mute Nobody").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("I don't see anyone named Nobody. Remember, case matters!")
    );

    t.say_private(1, "/mute #99").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("I don't see anyone with id #99")
    );

    t.say_private(1, "/mute UsherBot").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Sorry, I can't do that to myself")
    );
}

#[tokio::test]
async fn test_promote_and_demote() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(2, "Jane Doe").await;

    t.say_private(1, "/cohost Jane Doe").await;
    assert!(t.commands().contains(&Action::Promote(2, Role::CoHost)));
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Successfully promoted Jane Doe to co-host")
    );

    t.say_private(1, "/promote Jane Doe").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Jane Doe is already host or co-host")
    );

    t.say_private(1, "/demote Jane Doe").await;
    assert!(t.commands().contains(&Action::Demote(2)));
    assert!(t.engine.is_bad_user(&Participant::attending(2, "Jane Doe")).await);
}

#[tokio::test]
async fn test_failed_action_is_reported() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(2, "Jane Doe").await;
    t.meeting.fail("mute");

    t.say_private(1, "/mute me").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Failed to mute Carol Cohost")
    );
}

#[tokio::test]
async fn test_waiting_room_alias() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(2, "Jane Doe").await;

    t.say_private(1, "/putwr Jane Doe").await;
    assert!(t.commands().contains(&Action::PutInWaitingRoom(2)));
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Successfully moved Jane Doe to the waiting room")
    );
    assert!(t.meeting.get(2).is_some_and(|p| p.is_waiting()));

    // manual admit still works for someone the sweep leaves alone
    t.say_private(1, "/admit Jane Doe").await;
    assert!(t.commands().contains(&Action::Admit(2)));
}

#[tokio::test]
async fn test_rename() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(7, "iPad User").await;

    t.say_private(1, "/rename iPad User to John Doe").await;
    assert!(t.commands().contains(&Action::Rename(7, "John Doe".to_string())));

    t.say_private(1, "/rename Carol Cohost to Carol").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Why don't you just rename yourself?")
    );

    t.say_private(1, "/rename John Doe").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Please use the format: /rename Old Name to New Name")
    );
}

#[tokio::test]
async fn test_topic_lifecycle() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;

    t.say_private(1, "/topic Step Three").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Topic set to: Step Three"));
    assert!(t.to_everyone().iter().any(|m| m.ends_with("topic: Step Three")));

    t.say_private(1, "/topic Step Four").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Topic is already set; Use /topic force to change it")
    );

    t.say_private(1, "/topic force Step Four").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Topic forced to: Step Four"));
    assert_eq!(t.engine.topic().await.as_deref(), Some("Step Four"));

    // a newcomer gets the topic privately, once
    t.join_meeting(8, "Late Comer").await;
    t.tick().await;
    let late = t.replies_to(8);
    assert_eq!(late.len(), 1);
    assert!(late[0].ends_with("topic: Step Four"));

    t.say_private(1, "/topic clear").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Topic cleared"));
    t.say_private(1, "/topic off").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("The topic has not been set; There is nothing to clear")
    );
}

#[tokio::test]
async fn test_mode_commands() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;

    t.say_private(1, "/citadel on").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Citadel mode has been changed to on")
    );
    assert!(t.commands().contains(&Action::Lock(true)));

    t.say_private(1, "/citadel on").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Citadel mode is already on"));

    t.say_private(1, "/lockdown maybe").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Sorry, the lockdown command requires either on or off as a parameter")
    );

    // strangers wait forever in citadel mode
    t.join_waiting(9, "Stranger").await;
    t.advance(600);
    t.tick().await;
    assert!(!t.admitted().contains(&9));

    t.say_private(1, "/citadel off").await;
    t.tick().await;
    assert!(t.admitted().contains(&9));
}

#[tokio::test]
async fn test_remember_needs_admin() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(10, "Anna Admin").await;

    t.say_private(1, "/remember Bob Smith").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Sorry, you are not authorized to run that command.")
    );

    t.say_private(10, "/remember cohost Bob Smith").await;
    assert_eq!(
        t.last_reply_to(10).as_deref(),
        Some("Remembered Bob Smith as co-host")
    );
    assert_eq!(t.engine.trust().get("bob smith"), TrustLevel::CoHost);
    let file = std::fs::read_to_string(t.trust_list_path()).unwrap();
    assert!(file.lines().any(|l| l == "bob smith+"));

    t.say_private(10, "/forget Bob Smith").await;
    assert_eq!(t.last_reply_to(10).as_deref(), Some("Forgot Bob Smith"));
    assert_eq!(t.engine.trust().get("Bob Smith"), TrustLevel::Unknown);
}

#[tokio::test]
async fn test_unknown_command() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;

    t.say_private(1, "/dance").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Sorry, I don't know the command dance")
    );
}

#[tokio::test]
async fn test_listing_and_tracking() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(2, "Jane Doe").await;
    t.join_waiting(3, "Wes Waiting").await;

    t.say_private(1, "/who").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Attending (2): Carol Cohost, Jane Doe\nWaiting (1): Wes Waiting")
    );

    t.say_private(1, "/ids on").await;
    t.say_private(1, "/who").await;
    assert!(t.last_reply_to(1).unwrap_or_default().contains("Jane Doe#2"));

    t.say_private(1, "/track hands").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Tracking of Raised Hands enabled")
    );
    t.send(meetwarden::engine::MeetingEvent::RaisedHandsChanged {
        participants: vec!["Jane Doe".to_string()],
    })
    .await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Raised Hands: Jane Doe")
    );

    t.say_private(1, "/list hands").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Raised Hands: Jane Doe")
    );

    t.say_private(1, "/track chat").await;
    t.say_private(2, "psst").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Chat: Jane Doe: psst"));

    t.say_private(1, "/track off").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Tracking disabled"));
}

#[tokio::test]
async fn test_case_only_twin_is_ambiguous() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.join_meeting(2, "Jane Doe").await;
    t.join_meeting(3, "jane doe").await;

    t.say_private(1, "/expel Jane Doe").await;
    let reply = t.last_reply_to(1).unwrap_or_default();
    assert!(reply.contains("More than one participant"), "{reply}");
    assert!(!t.commands().iter().any(|a| matches!(a, Action::Expel(_))));
    assert!(!t.engine.is_bad_user(&Participant::attending(3, "jane doe")).await);

    // the id form still reaches exactly one of them
    t.say_private(1, "/expel #2").await;
    assert!(t.commands().contains(&Action::Expel(2)));
}

#[tokio::test]
async fn test_failed_lock_keeps_mode() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;
    t.meeting.fail("lock");

    t.say_private(1, "/citadel on").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Citadel mode has been changed to on")
    );
    assert!(t.commands().contains(&Action::Lock(true)));
    assert!(t.engine.modes().await.flags.is_citadel());

    t.join_waiting(9, "Stranger").await;
    t.advance(600);
    t.tick().await;
    assert!(!t.admitted().contains(&9));
}

#[tokio::test]
async fn test_lock_alias() {
    let t = TestMeeting::new(TRUST).await;
    t.join_meeting(1, "Carol Cohost").await;

    t.say_private(1, "/lock on").await;
    assert_eq!(
        t.last_reply_to(1).as_deref(),
        Some("Lockdown mode has been changed to on")
    );
    assert!(t.engine.modes().await.flags.is_lockdown());

    t.say_private(1, "/lockdown on").await;
    assert_eq!(t.last_reply_to(1).as_deref(), Some("Lockdown mode is already on"));
}
