use std::env;
use uuid::Uuid;

use campus_records::{
    auth::jwt::{self, Claims, TokenType},
    entities::user::UserRole,
};

// Set up JWT_SECRET for tests
fn setup_jwt_secret() {
    env::set_var("JWT_SECRET", "test_secret_for_jwt_tests");
}

#[test]
fn test_create_and_validate_access_token() {
    setup_jwt_secret();

    let user_id = Uuid::new_v4();
    let token = jwt::create_token(user_id, "jdoe", UserRole::Teacher, TokenType::Access)
        .expect("Failed to create token");

    let claims = jwt::validate_token(&token, TokenType::Access).expect("Failed to validate token");

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.user_id(), Some(user_id));
    assert_eq!(claims.username, "jdoe");
    assert_eq!(claims.role, "TEACHER");
    assert_eq!(claims.token_type, TokenType::Access);
    assert!(claims.iat > 0);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_refresh_token_outlives_access_token() {
    setup_jwt_secret();

    let pair = jwt::create_token_pair(Uuid::new_v4(), "jdoe", UserRole::Student).unwrap();
    let access = jwt::validate_token(&pair.access, TokenType::Access).unwrap();
    let refresh = jwt::validate_token(&pair.refresh, TokenType::Refresh).unwrap();

    assert!(refresh.exp > access.exp);
}

#[test]
fn test_token_type_is_enforced() {
    setup_jwt_secret();

    let pair = jwt::create_token_pair(Uuid::new_v4(), "jdoe", UserRole::Admin).unwrap();

    assert!(jwt::validate_token(&pair.refresh, TokenType::Access).is_err());
    assert!(jwt::validate_token(&pair.access, TokenType::Refresh).is_err());
}

#[test]
fn test_token_expiration() {
    setup_jwt_secret();

    use jsonwebtoken::{encode, EncodingKey, Header};

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "test_secret".to_string());

    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        username: "expired".to_string(),
        role: UserRole::Teacher.to_string(),
        token_type: TokenType::Access,
        iat: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp(),
        exp: (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp(), // Expired 1 hour ago
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .unwrap();

    assert!(jwt::validate_token(&token, TokenType::Access).is_err());
}

#[test]
fn test_invalid_token_format() {
    setup_jwt_secret();

    let result = jwt::validate_token("invalid.token.format", TokenType::Access);

    assert!(result.is_err());
}

#[test]
fn test_token_with_different_roles() {
    setup_jwt_secret();

    let roles = [UserRole::Admin, UserRole::Teacher, UserRole::Student];

    for role in roles {
        let token = jwt::create_token(Uuid::new_v4(), "someone", role, TokenType::Access).unwrap();
        let claims = jwt::validate_token(&token, TokenType::Access).unwrap();
        assert_eq!(claims.role, role.to_string());
        assert_eq!(claims.role.parse::<UserRole>(), Ok(role));
    }
}
