mod common;

use airport_models::{
    AirportError, RefreshRequest, RegisterRequest, TokenRequest, UserPatch, VerifyRequest,
};
use common::services;

fn register(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn credentials(email: &str, password: &str) -> TokenRequest {
    TokenRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn register_then_obtain_and_refresh_tokens() {
    let s = services();
    let user = s.accounts.register(register("test@test.com", "testpass123")).await.unwrap();
    assert_eq!(user.email, "test@test.com");
    assert!(!user.is_staff);

    let pair = s
        .accounts
        .obtain_token(credentials("test@test.com", "testpass123"))
        .await
        .unwrap();
    let authenticated = s.accounts.authenticate(&pair.access).await.unwrap();
    assert_eq!(authenticated.id, user.id);

    // A refresh token is not an access token.
    assert!(s.accounts.authenticate(&pair.refresh).await.is_err());

    let refreshed = s
        .accounts
        .refresh_token(RefreshRequest {
            refresh: pair.refresh.clone(),
        })
        .await
        .unwrap();
    assert!(s.accounts.authenticate(&refreshed.access).await.is_ok());

    assert!(s
        .accounts
        .verify_token(VerifyRequest { token: pair.refresh })
        .await
        .is_ok());
    assert!(matches!(
        s.accounts
            .verify_token(VerifyRequest {
                token: "garbage".into()
            })
            .await,
        Err(AirportError::InvalidToken { .. })
    ));
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let s = services();
    s.accounts.register(register("test@test.com", "testpass123")).await.unwrap();

    let err = s
        .accounts
        .obtain_token(credentials("test@test.com", "wrong-pass"))
        .await
        .unwrap_err();
    assert!(matches!(err, AirportError::InvalidCredentials));
    assert_eq!(err.http_status(), 401);

    let err = s
        .accounts
        .obtain_token(credentials("nobody@test.com", "testpass123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AirportError::InvalidCredentials));
}

#[tokio::test]
async fn registration_validates_email_and_password() {
    let s = services();
    let err = s.accounts.register(register("not-an-email", "abc")).await.unwrap_err();
    match err {
        AirportError::Validation(errors) => {
            assert_eq!(errors["email"], vec!["Enter a valid email address."]);
            assert_eq!(
                errors["password"],
                vec!["Ensure this field has at least 5 characters."]
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_addresses_are_rejected() {
    let s = services();
    for email in ["a@b..c", "a b@test.com", "a@@test.com", "user@test", "@test.com", "user@.com"] {
        let err = s
            .accounts
            .register(register(email, "testpass123"))
            .await
            .unwrap_err();
        match err {
            AirportError::Validation(errors) => {
                assert_eq!(errors["email"], vec!["Enter a valid email address."], "{email}");
            }
            other => panic!("expected validation error for {email}, got {other:?}"),
        }
    }

    let user = s
        .accounts
        .register(register("first.last+tag@mail.example.com", "testpass123"))
        .await
        .unwrap();
    assert_eq!(user.email, "first.last+tag@mail.example.com");
}

#[tokio::test]
async fn emails_are_unique_ignoring_case() {
    let s = services();
    s.accounts.register(register("test@test.com", "testpass123")).await.unwrap();

    let err = s
        .accounts
        .register(register("TEST@Test.com", "testpass123"))
        .await
        .unwrap_err();
    match err {
        AirportError::Validation(errors) => {
            assert_eq!(errors["email"], vec!["user with this email already exists."])
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn superuser_is_staff_and_can_change_password() {
    let s = services();
    let admin = s
        .accounts
        .create_superuser("admin@test.com", "testpass123")
        .await
        .unwrap();
    assert!(admin.is_staff);

    let pair = s
        .accounts
        .obtain_token(credentials("admin@test.com", "testpass123"))
        .await
        .unwrap();
    let user = s.accounts.authenticate(&pair.access).await.unwrap();

    let view = s
        .accounts
        .update_me(
            &user,
            UserPatch {
                email: None,
                password: Some("newpass456".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(view.is_staff);

    assert!(s
        .accounts
        .obtain_token(credentials("admin@test.com", "newpass456"))
        .await
        .is_ok());
    assert!(s
        .accounts
        .obtain_token(credentials("admin@test.com", "testpass123"))
        .await
        .is_err());
}
