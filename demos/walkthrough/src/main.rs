use latchkey::prelude::*;
use secrecy::SecretString;

const COOKIE: &str = "latchkey_auth";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn describe(label: &str, ok: bool, ex: &HeaderExchange) {
    let verdict = if ok { "authenticated" } else { "rejected" };
    tracing::info!(step = label, verdict, "request handled");
    for header in ex.set_cookie_headers() {
        tracing::info!(step = label, set_cookie = %header, "response cookie");
    }
}

async fn visit(
    gate: &AuthenticationGate,
    carried: &HeaderExchange,
) -> Result<(bool, HeaderExchange), GateError> {
    let mut ex = carried.next_request(COOKIE);
    let mut ctx = RequestContext::new(&mut ex);
    let ok = gate.is_authenticated(&mut ctx).await?;
    Ok((ok, ex))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    latchkey::telemetry::init();

    let dir = tempfile::tempdir()?;
    let config = GateConfig {
        token_length_bytes: 16,
        token_ttl_seconds: 3600,
        secret_key: SecretString::from("walkthrough-secret".to_string()),
        session_storage_location: dir.path().join("session.dat"),
        admin_email: "admin@x.com".into(),
        admin_password_hash: SecretString::from(Argon2Verifier::hash_password("secret")?),
        ..GateConfig::default()
    };
    let gate = AuthenticationGate::from_config(config)?;
    tracing::info!(
        location = %gate.store().location().display(),
        slot = %gate.slot(),
        "session store ready"
    );

    // Plain HTTP login is refused outright.
    let mut insecure = HeaderExchange::new(None, false);
    let mut ctx = RequestContext::new(&mut insecure);
    if let Err(e) = gate.authenticate(&mut ctx, "admin@x.com", "secret").await {
        tracing::warn!(error = %e, "insecure login refused");
    }

    let mut wrong = HeaderExchange::new(None, true);
    let mut ctx = RequestContext::new(&mut wrong);
    let ok = gate.authenticate(&mut ctx, "admin@x.com", "guess").await?;
    describe("wrong password", ok, &wrong);

    let mut login = HeaderExchange::new(None, true);
    let mut ctx = RequestContext::new(&mut login);
    let ok = gate.authenticate(&mut ctx, "admin@x.com", "secret").await?;
    describe("login", ok, &login);
    if let Some(record) = gate.current_record().await {
        tracing::info!(
            token_len = record.token.len(),
            expires_at = record.expires_at,
            "stored session"
        );
    }

    let (ok, first_visit) = visit(&gate, &login).await?;
    describe("first visit", ok, &first_visit);

    // Replaying the login cookie: it was consumed by the first visit.
    let (ok, replay) = visit(&gate, &login).await?;
    describe("replayed login cookie", ok, &replay);

    let (ok, second_visit) = visit(&gate, &first_visit).await?;
    describe("second visit", ok, &second_visit);

    let mut logout = second_visit.next_request(COOKIE);
    let mut ctx = RequestContext::new(&mut logout);
    gate.logout(&mut ctx).await?;
    describe("logout", false, &logout);

    let (ok, after) = visit(&gate, &logout).await?;
    describe("after logout", ok, &after);

    Ok(())
}
