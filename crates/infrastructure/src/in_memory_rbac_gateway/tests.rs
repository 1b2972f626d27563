use keystone_application::{AuthGateway, IdentitySource, RbacGateway};
use keystone_core::{AppError, NonEmptyString};
use keystone_domain::{CreateRoleInput, LoginCredentials, RoleId, RoleMetadataUpdate};

use super::InMemoryRbacGateway;

fn create_input(name: &str, group: Option<&str>) -> CreateRoleInput {
    CreateRoleInput {
        name: NonEmptyString::new(name).unwrap_or_else(|_| unreachable!()),
        description: None,
        exclusive_group: group.map(str::to_owned),
        priority: 0,
    }
}

fn credentials(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials::new(email, password).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn login_resolves_identity_with_role_permissions() {
    let gateway = InMemoryRbacGateway::with_defaults();
    let added = gateway
        .add_user("admin@example.com", "secret", Some("Admin"), &["admin"])
        .await;
    assert!(added.is_ok());

    assert!(matches!(
        gateway.fetch_current_identity().await,
        Err(AppError::Unauthorized(_))
    ));

    let login = gateway
        .login(&credentials("ADMIN@example.com", "secret"))
        .await;
    assert!(login.is_ok());

    let Ok(identity) = gateway.fetch_current_identity().await else {
        panic!("identity should resolve after login");
    };
    assert_eq!(identity.email, "admin@example.com");
    assert!(identity.permissions.contains("rbac:write"));
    assert!(identity.permissions.contains("users:read"));

    assert!(gateway.logout().await.is_ok());
    assert!(gateway.fetch_current_identity().await.is_err());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let gateway = InMemoryRbacGateway::with_defaults();
    let added = gateway.add_user("a@example.com", "secret", None, &[]).await;
    assert!(added.is_ok());

    let login = gateway.login(&credentials("a@example.com", "guess")).await;

    assert!(matches!(login, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn duplicate_role_name_conflicts() {
    let gateway = InMemoryRbacGateway::with_defaults();

    let created = gateway.create_role(create_input("viewer", None)).await;
    assert!(created.is_ok());
    let duplicate = gateway.create_role(create_input("viewer", None)).await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn system_roles_reject_metadata_updates_and_deletion() {
    let gateway = InMemoryRbacGateway::with_defaults();
    let admin_id = RoleId::new(1);

    let update = gateway
        .update_role_metadata(
            admin_id,
            RoleMetadataUpdate {
                exclusive_group: Some("account".to_owned()),
                priority: 1,
            },
        )
        .await;
    assert!(matches!(update, Err(AppError::Validation(_))));
    assert!(matches!(
        gateway.delete_role(admin_id).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn deleting_role_unassigns_it_from_users() {
    let gateway = InMemoryRbacGateway::with_defaults();
    let Ok(role) = gateway.create_role(create_input("auditor", None)).await else {
        panic!("role should be created");
    };
    let added = gateway
        .add_user("a@example.com", "secret", None, &["auditor", "user"])
        .await;
    assert!(added.is_ok());

    assert!(gateway.delete_role(role.id).await.is_ok());

    let users = gateway.list_users().await.unwrap_or_default();
    assert_eq!(users[0].role_names(), vec!["user"]);
}

#[tokio::test]
async fn role_permissions_are_replaced_and_validated() {
    let gateway = InMemoryRbacGateway::with_defaults();
    let Ok(role) = gateway.create_role(create_input("viewer", None)).await else {
        panic!("role should be created");
    };

    let updated = gateway
        .set_role_permissions(
            role.id,
            vec!["users:read".to_owned(), "users:read".to_owned()],
        )
        .await;
    assert_eq!(
        updated.map(|role| role.permission_codes()).ok(),
        Some(vec!["users:read".to_owned()])
    );

    let unknown = gateway
        .set_role_permissions(role.id, vec!["billing:read".to_owned()])
        .await;
    assert!(matches!(unknown, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn user_roles_enforce_exclusive_groups() {
    let gateway = InMemoryRbacGateway::with_defaults();
    for name in ["editor", "viewer"] {
        let created = gateway
            .create_role(create_input(name, Some("account")))
            .await;
        assert!(created.is_ok());
    }
    let Ok(user_id) = gateway.add_user("a@example.com", "secret", None, &[]).await else {
        panic!("user should be added");
    };

    let conflicting = gateway
        .set_user_roles(user_id, vec!["editor".to_owned(), "viewer".to_owned()])
        .await;
    assert!(matches!(conflicting, Err(AppError::Validation(_))));

    let saved = gateway
        .set_user_roles(user_id, vec!["viewer".to_owned(), "user".to_owned()])
        .await;
    assert_eq!(
        saved.map(|user| user.role_names()).ok(),
        Some(vec!["viewer".to_owned(), "user".to_owned()])
    );
}
