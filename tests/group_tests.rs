#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use ride_sharing_api::{
    dto::{NewGroupDto, UpdateGroupDto},
    errors::ApiError,
    models::{JoinStatus, User},
    AppState,
};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{bearer, seed_user, test_db, test_state};

async fn seed_group(state: &AppState, owner: &User) -> Uuid {
    state
        .groups
        .create(
            owner,
            NewGroupDto {
                name: "Commuters".to_string(),
                description: Some("Amsterdam to Utrecht".to_string()),
            },
        )
        .await
        .unwrap()
        .group_id
}

#[actix_web::test]
async fn owner_is_a_member_of_a_new_group() {
    let db = test_db().await;
    let state = test_state(&db);
    let (owner, _) = seed_user(&state, "owner-1", "owner@example.com").await;

    let group_id = seed_group(&state, &owner).await;
    let group = state.groups.get_by_id(group_id).await.unwrap();
    assert_eq!(group.name, "Commuters");
    assert_eq!(group.created_by, "owner-1");
    assert_eq!(group.members.len(), 1);
    assert_eq!(group.members[0].user_id, "owner-1");
    assert_eq!(group.members[0].join_status, JoinStatus::Member);
}

#[actix_web::test]
async fn join_needs_approval_and_ban_blocks_leaving() {
    let db = test_db().await;
    let state = test_state(&db);
    let (owner, _) = seed_user(&state, "owner-1", "owner@example.com").await;
    let (rider, _) = seed_user(&state, "rider-1", "rider@example.com").await;
    let group_id = seed_group(&state, &owner).await;

    state.groups.join(&rider, group_id).await.unwrap();
    let err = state.groups.join(&rider, group_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    let status_of = |group: &ride_sharing_api::dto::GroupData| {
        group.members.iter().find(|member| member.user_id == "rider-1").map(|member| member.join_status)
    };
    assert_eq!(status_of(&state.groups.get_by_id(group_id).await.unwrap()), Some(JoinStatus::Pending));

    // approving twice is not a valid move
    state.groups.set_member_status(&owner, group_id, "rider-1", JoinStatus::Member).await.unwrap();
    let err = state
        .groups
        .set_member_status(&owner, group_id, "rider-1", JoinStatus::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    state.groups.set_member_status(&owner, group_id, "rider-1", JoinStatus::Banned).await.unwrap();
    let err = state.groups.leave(&rider, group_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    let err = state.groups.join(&rider, group_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(status_of(&state.groups.get_by_id(group_id).await.unwrap()), Some(JoinStatus::Banned));

    state.groups.set_member_status(&owner, group_id, "rider-1", JoinStatus::Member).await.unwrap();
    state.groups.leave(&rider, group_id).await.unwrap();
    assert_eq!(status_of(&state.groups.get_by_id(group_id).await.unwrap()), None);

    let err = state.groups.leave(&rider, group_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[actix_web::test]
async fn only_the_owner_manages_members() {
    let db = test_db().await;
    let state = test_state(&db);
    let (owner, _) = seed_user(&state, "owner-1", "owner@example.com").await;
    let (rider, _) = seed_user(&state, "rider-1", "rider@example.com").await;
    let (other, _) = seed_user(&state, "rider-2", "other@example.com").await;
    let group_id = seed_group(&state, &owner).await;
    state.groups.join(&rider, group_id).await.unwrap();

    let err = state
        .groups
        .set_member_status(&other, group_id, "rider-1", JoinStatus::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = state
        .groups
        .set_member_status(&owner, group_id, "owner-1", JoinStatus::Banned)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = state
        .groups
        .set_member_status(&owner, group_id, "rider-2", JoinStatus::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = state.groups.leave(&owner, group_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = state.groups.join(&rider, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[actix_web::test]
async fn update_keeps_omitted_fields() {
    let db = test_db().await;
    let state = test_state(&db);
    let (owner, _) = seed_user(&state, "owner-1", "owner@example.com").await;
    let (stranger, _) = seed_user(&state, "stranger-1", "stranger@example.com").await;
    let group_id = seed_group(&state, &owner).await;

    let rename = UpdateGroupDto {
        group_id,
        name: Some("Night shift".to_string()),
        description: None,
    };
    let err = state.groups.update(&stranger, rename.clone()).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    state.groups.update(&owner, rename).await.unwrap();
    let group = state.groups.get_by_id(group_id).await.unwrap();
    assert_eq!(group.name, "Night shift");
    assert_eq!(group.description.as_deref(), Some("Amsterdam to Utrecht"));

    state
        .groups
        .update(
            &owner,
            UpdateGroupDto {
                group_id,
                name: None,
                description: Some(String::new()),
            },
        )
        .await
        .unwrap();
    let group = state.groups.get_by_id(group_id).await.unwrap();
    assert_eq!(group.name, "Night shift");
    assert_eq!(group.description, None);
}

#[actix_web::test]
async fn groups_over_http() {
    let db = test_db().await;
    let (state, app) = init_app!(&db);
    let (_, owner) = seed_user(&state, "owner-1", "owner@example.com").await;
    let (_, rider) = seed_user(&state, "rider-1", "rider@example.com").await;

    let req = test::TestRequest::get().uri("/groups/many").insert_header(bearer(&owner)).to_request();
    assert_eq!(test::read_body(test::call_service(&app, req).await).await, "[]");

    let req = test::TestRequest::post()
        .uri("/groups")
        .insert_header(bearer(&owner))
        .set_json(json!({ "name": "Commuters" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let group: Value = test::read_body_json(resp).await;
    let group_id = group["groupId"].as_str().unwrap().to_string();
    assert_eq!(group["members"][0]["joinStatus"], "member");

    let join = format!("/groups/by-id/{group_id}/members/join");
    let req = test::TestRequest::post().uri(&join).insert_header(bearer(&rider)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::post().uri(&join).insert_header(bearer(&rider)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["title"], "Already a member of this group.");

    let approve = format!("/groups/by-id/{group_id}/members/approve");
    let req = test::TestRequest::post()
        .uri(&approve)
        .insert_header(bearer(&rider))
        .set_json(json!({ "userId": "rider-1" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    let req = test::TestRequest::post()
        .uri(&approve)
        .insert_header(bearer(&owner))
        .set_json(json!({ "userId": "rider-1" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/groups/by-id/{group_id}"))
        .insert_header(bearer(&rider))
        .to_request();
    let shown: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(shown["members"][1]["userId"], "rider-1");
    assert_eq!(shown["members"][1]["joinStatus"], "member");
    assert_eq!(shown["members"][1]["email"], "rider@example.com");

    let req = test::TestRequest::post()
        .uri(&format!("/groups/by-id/{group_id}/members/ban"))
        .insert_header(bearer(&owner))
        .set_json(json!({ "userId": "rider-1" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::post()
        .uri(&format!("/groups/by-id/{group_id}/members/leave"))
        .insert_header(bearer(&rider))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/groups/update")
        .insert_header(bearer(&owner))
        .set_json(json!({ "groupId": group_id, "description": "Weekday mornings" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/groups/many").insert_header(bearer(&rider)).to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["description"], "Weekday mornings");

    for uri in [format!("/groups/by-id/{}", Uuid::new_v4()), "/groups/by-id/not-a-uuid".to_string()] {
        let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&owner)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
