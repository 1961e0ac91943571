//! Cookie carriage across several simulated browser requests.

use std::time::Duration;

use latchkey_protocol::{CipherKey, KeyPurpose, XChaChaCipher};
use latchkey_transport::{CookieAttributes, CookieTransport, HeaderExchange, RequestContext};

fn transport() -> CookieTransport<XChaChaCipher> {
    let key = CipherKey::derive(b"transport-test-secret", KeyPurpose::Cookie).unwrap();
    CookieTransport::new(
        "latchkey_auth",
        key,
        XChaChaCipher,
        CookieAttributes::default(),
        Duration::from_secs(1200),
    )
}

#[test]
fn test_token_survives_round_trip_through_browser() {
    let t = transport();

    let mut first = HeaderExchange::new(Some("theme=dark"), true);
    {
        let mut ctx = RequestContext::new(&mut first);
        assert_eq!(t.cookie_token(&mut ctx), "");
        t.set_token(&mut ctx, "00ff00ff", 2_000).unwrap();
    }
    let header = &first.set_cookie_headers()[0];
    assert!(header.starts_with("latchkey_auth="));
    assert!(header.contains("; Expires="));
    assert!(header.ends_with("; Path=/; Secure; HttpOnly"));

    let mut second = first.next_request("latchkey_auth");
    let mut ctx = RequestContext::new(&mut second);
    assert_eq!(t.cookie_token(&mut ctx), "00ff00ff");
}

#[test]
fn test_same_token_encrypts_to_different_values() {
    let t = transport();
    let a = t.encode("abcd").unwrap();
    let b = t.encode("abcd").unwrap();
    assert_ne!(a, b);
    assert_eq!(t.decode(Some(&a)), t.decode(Some(&b)));
}

#[test]
fn test_clear_makes_next_request_anonymous() {
    let t = transport();
    let value = t.encode("abcd").unwrap();

    let mut ex = HeaderExchange::with_cookie("latchkey_auth", &value, true);
    {
        let mut ctx = RequestContext::new(&mut ex);
        assert_eq!(t.cookie_token(&mut ctx), "abcd");
        t.clear(&mut ctx, 5_000);
    }
    assert_eq!(ex.set_cookies()[0].expires_at, 1_400);

    let mut next = ex.next_request("latchkey_auth");
    let mut ctx = RequestContext::new(&mut next);
    assert_eq!(t.cookie_token(&mut ctx), "");
}

#[test]
fn test_session_key_cannot_open_cookie() {
    let cookie_side = transport();
    let session_key =
        CipherKey::derive(b"transport-test-secret", KeyPurpose::SessionRecord).unwrap();
    let wrong = CookieTransport::new(
        "latchkey_auth",
        session_key,
        XChaChaCipher,
        CookieAttributes::default(),
        Duration::from_secs(1200),
    );

    let value = cookie_side.encode("abcd").unwrap();
    assert_eq!(wrong.decode(Some(&value)), "");
}
