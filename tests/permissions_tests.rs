mod test_data;

use buttress::permissions::PermissionManager;
use buttress::{prepare_schema_result, AppRole, ButtressError, Token};
use serde_json::json;
use test_data::schema_test_data::create_contact_schema;

fn contact_row(id: &str, owner: &str) -> serde_json::Value {
    json!({
        "_id": {"$oid": id},
        "_app": "crm",
        "name": "Ann",
        "email": "ann@example.com",
        "phone": {"mobile": "555"},
        "ownerId": owner,
        "createdAt": {"$date": "2024-01-01T00:00:00.000Z"}
    })
}

#[test]
fn test_viewer_keeps_only_allowed_field() {
    let token = Token::new("u1").with_role("viewer");
    let projected = prepare_schema_result(
        contact_row("5f1d7a3b9c0e4a0012345678", "u1"),
        &[],
        Some(&create_contact_schema()),
        Some(&token),
    )
    .unwrap();
    assert_eq!(projected, json!({"name": "Ann"}));
}

#[test]
fn test_member_rows_are_filtered_by_owner() {
    let token = Token::new("u1").with_role("member");
    let rows = json!([
        contact_row("5f1d7a3b9c0e4a0012345678", "u1"),
        contact_row("5f1d7a3b9c0e4a0012345679", "u2"),
        {"name": "no owner"}
    ]);
    let projected = prepare_schema_result(rows, &[], Some(&create_contact_schema()), Some(&token)).unwrap();

    let rows = projected.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!({"$oid": "5f1d7a3b9c0e4a0012345678"}));
    assert_eq!(rows[0]["appId"], json!("crm"));
    assert_eq!(rows[0]["phone"], json!({"mobile": "555"}));
    assert_eq!(rows[0]["createdAt"], json!({"$date": "2024-01-01T00:00:00.000Z"}));
    assert!(rows[0].get("_id").is_none());
}

#[test]
fn test_single_filtered_row_is_null() {
    let token = Token::new("u1").with_role("member");
    let projected = prepare_schema_result(
        contact_row("5f1d7a3b9c0e4a0012345679", "u2"),
        &[],
        Some(&create_contact_schema()),
        Some(&token),
    )
    .unwrap();
    assert!(projected.is_null());
}

#[test]
fn test_app_role_opens_unknown_roles() {
    let token = Token::new("u1").with_role("admin");
    let schema = create_contact_schema();

    let closed = prepare_schema_result(contact_row("5f1d7a3b9c0e4a0012345678", "u2"), &[], Some(&schema), Some(&token))
        .unwrap();
    assert_eq!(closed, json!({}));

    let roles = vec![AppRole::new("admin").allow_all()];
    let open = prepare_schema_result(
        contact_row("5f1d7a3b9c0e4a0012345678", "u2"),
        &roles,
        Some(&schema),
        Some(&token),
    )
    .unwrap();
    assert_eq!(open["email"], json!("ann@example.com"));
    assert_eq!(open["ownerId"], json!("u2"));
}

#[test]
fn test_manager_reports_filters_and_overrides() {
    let schema = create_contact_schema();
    let viewer = PermissionManager::for_token(&[], &schema, &Token::new("u1").with_role("viewer")).unwrap();
    assert!(viewer.has_read_permission("name"));
    assert!(!viewer.has_read_permission("email"));
    assert!(viewer.filters().is_empty());

    let member = PermissionManager::for_token(&[], &schema, &Token::new("u1").with_role("member")).unwrap();
    assert_eq!(member.filters(), ["ownerId".to_string()]);
}

#[test]
fn test_projection_without_token_is_a_precondition_failure() {
    let err = prepare_schema_result(json!([]), &[], Some(&create_contact_schema()), None).unwrap_err();
    assert!(matches!(err, ButtressError::ProjectionPrecondition(_)));
}

#[test]
fn test_oid_user_token_matches_oid_owner() {
    let token: Token = serde_json::from_value(json!({
        "role": "member",
        "_user": {"$oid": "5f1d7a3b9c0e4a00123456aa"}
    }))
    .unwrap();
    let rows = json!([
        {"name": "mine", "ownerId": {"$oid": "5f1d7a3b9c0e4a00123456aa"}},
        {"name": "theirs", "ownerId": {"$oid": "5f1d7a3b9c0e4a00123456bb"}}
    ]);
    let projected = prepare_schema_result(rows, &[], Some(&create_contact_schema()), Some(&token)).unwrap();
    assert_eq!(
        projected,
        json!([{"name": "mine", "ownerId": {"$oid": "5f1d7a3b9c0e4a00123456aa"}}])
    );
}
