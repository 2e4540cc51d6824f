mod common;

use common::TestApp;
use server::entity::Role;
use server::error::AppError;
use server::models::MembershipAction;
use server::visibility::EntityFilter;

#[tokio::test]
async fn anonymous_listing_matches_public_scope() {
    let app = TestApp::spawn().await;
    let creator = app.seed_user("creator", Role::User).await;
    let project = app.seed_project(&creator, "Garden", true).await;
    app.seed_activity(&creator, "Open day", true, Some(&project), None)
        .await;
    app.seed_activity(&creator, "Budget review", false, Some(&project), None)
        .await;

    for requested in [None, Some("admin"), Some("assigned"), Some("gibberish")] {
        let listed = app
            .state
            .projects
            .list(None, requested, EntityFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        let titles: Vec<&str> = listed[0]
            .activities
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Open day"], "requested scope {requested:?}");
    }
}

#[tokio::test]
async fn follower_sees_private_activities_only_once_assigned() {
    let app = TestApp::spawn().await;
    let creator = app.seed_user("creator", Role::User).await;
    let follower = app.seed_user("follower", Role::User).await;
    let project = app.seed_project(&creator, "Garden", true).await;
    app.seed_activity(&creator, "Open day", true, Some(&project), None)
        .await;
    app.seed_activity(&creator, "Budget review", false, Some(&project), None)
        .await;

    app.state
        .projects
        .mutate_membership(Some(&follower), project.id, MembershipAction::Follow, None)
        .await
        .unwrap();

    let followed = app
        .state
        .projects
        .list(Some(&follower), Some("followed"), EntityFilter::default())
        .await
        .unwrap();
    assert_eq!(followed.len(), 1);
    let titles: Vec<&str> = followed[0]
        .activities
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Open day"]);

    // The creator assigns the follower; the same query now exposes the
    // private activity too.
    app.state
        .projects
        .mutate_membership(
            Some(&creator),
            project.id,
            MembershipAction::Assign,
            Some(follower.id),
        )
        .await
        .unwrap();

    let followed = app
        .state
        .projects
        .list(Some(&follower), Some("followed"), EntityFilter::default())
        .await
        .unwrap();
    let titles: Vec<&str> = followed[0]
        .activities
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Open day", "Budget review"]);
}

#[tokio::test]
async fn admin_scope_downgrades_for_non_admins() {
    let app = TestApp::spawn().await;
    let creator = app.seed_user("creator", Role::User).await;
    let plain = app.seed_user("plain", Role::User).await;
    let admin = app.seed_user("admin", Role::Admin).await;
    let project = app.seed_project(&creator, "Garden", true).await;
    app.seed_activity(&creator, "Budget review", false, Some(&project), None)
        .await;

    let as_plain_admin = app
        .state
        .projects
        .list(Some(&plain), Some("admin"), EntityFilter::by_id(project.id))
        .await
        .unwrap();
    let as_plain_public = app
        .state
        .projects
        .list(Some(&plain), Some("public"), EntityFilter::by_id(project.id))
        .await
        .unwrap();
    assert_eq!(as_plain_admin, as_plain_public);
    assert!(as_plain_admin[0].activities.is_empty());

    // A real admin sees the unfiltered collection.
    let as_admin = app
        .state
        .projects
        .list(Some(&admin), Some("admin"), EntityFilter::by_id(project.id))
        .await
        .unwrap();
    assert_eq!(as_admin[0].activities.len(), 1);
}

#[tokio::test]
async fn owned_scope_selects_by_creator_only() {
    let app = TestApp::spawn().await;
    let alice = app.seed_user("alice", Role::User).await;
    let bob = app.seed_user("bob", Role::User).await;
    app.seed_project(&alice, "Alice's", true).await;
    let bobs = app.seed_project(&bob, "Bob's", true).await;

    let owned = app
        .state
        .projects
        .list(Some(&bob), Some("owned"), EntityFilter::default())
        .await
        .unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].id, bobs.id);
}

#[tokio::test]
async fn followed_scope_is_the_explicit_relation_only() {
    let app = TestApp::spawn().await;
    let creator = app.seed_user("creator", Role::User).await;
    app.seed_project(&creator, "Own project", true).await;

    // Creating a project does not imply following it.
    let followed = app
        .state
        .projects
        .list(Some(&creator), Some("followed"), EntityFilter::default())
        .await
        .unwrap();
    assert!(followed.is_empty());
}

#[tokio::test]
async fn detail_fetch_raises_not_found() {
    let app = TestApp::spawn().await;
    let viewer = app.seed_user("viewer", Role::User).await;

    let result = app.state.projects.get(Some(&viewer), None, 999).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn organizations_are_enumerable_but_activities_filtered() {
    let app = TestApp::spawn().await;
    let creator = app.seed_user("creator", Role::User).await;
    let viewer = app.seed_user("viewer", Role::User).await;
    let org = app.seed_organization(&creator, "Greenworks").await;
    app.seed_activity(&creator, "Newsletter", true, None, Some(&org))
        .await;
    app.seed_activity(&creator, "Board minutes", false, None, Some(&org))
        .await;

    let listed = app
        .state
        .organizations
        .list(Some(&viewer), None, EntityFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    let titles: Vec<&str> = listed[0]
        .activities
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Newsletter"]);

    // Members see everything.
    let as_creator = app
        .state
        .organizations
        .list(Some(&creator), Some("owned"), EntityFilter::default())
        .await
        .unwrap();
    assert_eq!(as_creator[0].activities.len(), 2);
}

#[tokio::test]
async fn activity_listing_respects_scopes() {
    let app = TestApp::spawn().await;
    let creator = app.seed_user("creator", Role::User).await;
    let member = app.seed_user("member", Role::User).await;
    let project = app.seed_project(&creator, "Garden", true).await;
    let public = app
        .seed_activity(&creator, "Open day", true, Some(&project), None)
        .await;
    let private = app
        .seed_activity(&creator, "Budget review", false, Some(&project), None)
        .await;

    let anonymous = app
        .state
        .activities
        .list(None, None, EntityFilter::default())
        .await
        .unwrap();
    assert_eq!(anonymous.iter().map(|a| a.id).collect::<Vec<_>>(), vec![
        public.id
    ]);

    app.state
        .projects
        .mutate_membership(
            Some(&creator),
            project.id,
            MembershipAction::Assign,
            Some(member.id),
        )
        .await
        .unwrap();

    let assigned = app
        .state
        .activities
        .list(Some(&member), Some("assigned"), EntityFilter::default())
        .await
        .unwrap();
    let ids: Vec<i32> = assigned.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![public.id, private.id]);
}
