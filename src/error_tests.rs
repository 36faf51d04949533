use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AuthError::invalid_credentials().http_status(), 401);
    assert_eq!(AuthError::user_already_exists().http_status(), 409);
    assert_eq!(AuthError::unauthorized().http_status(), 401);
    assert_eq!(AuthError::rejected("Forbidden", "no").http_status(), 403);
    assert_eq!(AuthError::renewal("refresh failed").http_status(), 401);
    assert_eq!(AuthError::user_input("empty email").http_status(), 400);
    assert_eq!(AuthError::storage("disk").http_status(), 500);
    assert_eq!(AuthError::transport("down").http_status(), 503);
}

#[test]
fn payload_carries_message_and_name() {
    let p = AuthError::invalid_credentials().payload();
    assert_eq!(p.message, "Invalid credentials");
    assert_eq!(p.name, "Invalid email or password");

    let p = AuthError::user_already_exists().payload();
    assert_eq!(p.message, "Register error");
    assert_eq!(p.name, "User already exists");
}

#[test]
fn display_joins_name_and_message() {
    assert_eq!(AuthError::unauthorized().to_string(), "Unauthorized: Check failed");
}

#[test]
fn serializes_with_type_tag() {
    let v = serde_json::to_value(AuthError::renewal("boom")).unwrap();
    assert_eq!(v["type"], "renewal_failed");
    assert_eq!(v["message"], "boom");
    assert_eq!(v["name"], "RenewalFailed");
}
