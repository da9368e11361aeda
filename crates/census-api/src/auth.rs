//! Demo bearer-token issuer and the `Authenticated` extractor.
//!
//! A fresh Ed25519 key pair is generated every time the process starts and
//! every issued token is remembered in memory. Validation accepts only tokens
//! this process issued, so restarting the server invalidates all of them.

use std::{
  collections::HashMap,
  sync::{PoisonError, RwLock},
};

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use census_core::{audit::SYSTEM_ACTOR, entity::EntityId};
use chrono::Utc;
use ed25519_dalek::SigningKey;
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const AUDIENCE: &str = "localhost";
pub const ISSUER: &str = "127.0.0.1";
pub const SUBJECT: &str = "test-jwt";
pub const TOKEN_LIFETIME_SECS: i64 = 1800;

/// DER prefix that wraps a raw 32-byte Ed25519 seed into a PKCS#8 document.
const PKCS8_ED25519_PREFIX: [u8; 16] = [
  0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04,
  0x22, 0x04, 0x20,
];

/// The claim set carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub jti: String,
  pub exp: i64,
  pub aud: String,
  pub iat: i64,
  pub nbf: i64,
  pub iss: String,
  pub sub: String,
}

/// Why a token was refused. Never sent to the client.
#[derive(Debug, Error)]
pub enum TokenError {
  #[error("no Authorization header")]
  MissingHeader,

  #[error("malformed Authorization header")]
  MalformedHeader,

  #[error("jwt: {0}")]
  Jwt(#[from] jsonwebtoken::errors::Error),

  #[error("token {0} was not issued by this process")]
  NotIssued(String),

  #[error("claims of token {0} differ from the issued ones")]
  ClaimsMismatch(String),
}

/// A token this process handed out, kept for the life of the process.
#[derive(Debug, Clone)]
pub struct IssuedToken {
  pub claims: Claims,
  pub token:  String,
}

/// Issues and validates short-lived EdDSA tokens.
pub struct TokenFactory {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  public_key: String,
  issued:     RwLock<HashMap<String, IssuedToken>>,
}

impl TokenFactory {
  pub fn new() -> Result<Self, TokenError> {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key =
      URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes());

    let mut pkcs8 = PKCS8_ED25519_PREFIX.to_vec();
    pkcs8.extend_from_slice(&signing_key.to_bytes());

    let encoding = EncodingKey::from_ed_der(&pkcs8);
    let decoding = DecodingKey::from_ed_components(&public_key)?;

    tracing::warn!(
      "token factory is for demonstration only; keys live in memory and are \
       regenerated on every start"
    );
    tracing::debug!(%public_key, "generated token signing key");

    Ok(Self {
      encoding,
      decoding,
      public_key,
      issued: RwLock::new(HashMap::new()),
    })
  }

  /// Base64url-encoded public key.
  pub fn public_key(&self) -> &str { &self.public_key }

  /// Sign a fresh claim set and remember it.
  pub fn make_token(&self) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      jti: Uuid::new_v4().simple().to_string(),
      exp: now + TOKEN_LIFETIME_SECS,
      aud: AUDIENCE.to_string(),
      iat: now,
      nbf: now,
      iss: ISSUER.to_string(),
      sub: SUBJECT.to_string(),
    };
    let token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding)?;

    self
      .issued
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(claims.jti.clone(), IssuedToken { claims, token: token.clone() });
    Ok(token)
  }

  /// Verify signature, expiry, not-before and audience, then require the
  /// claims to match a token this factory issued.
  pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[AUDIENCE]);
    validation.set_required_spec_claims(&["exp", "nbf", "aud"]);
    validation.validate_nbf = true;

    let decoded = decode::<Claims>(token, &self.decoding, &validation)?.claims;

    let issued = self.issued.read().unwrap_or_else(PoisonError::into_inner);
    match issued.get(&decoded.jti) {
      Some(known) if known.claims == decoded => Ok(decoded),
      Some(_) => Err(TokenError::ClaimsMismatch(decoded.jti)),
      None => Err(TokenError::NotIssued(decoded.jti)),
    }
  }

  /// The record for `jti`, if this process issued it.
  pub fn issued(&self, jti: &str) -> Option<IssuedToken> {
    self
      .issued
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(jti)
      .cloned()
  }

  /// Number of tokens issued since start-up.
  pub fn issued_count(&self) -> usize {
    self.issued.read().unwrap_or_else(PoisonError::into_inner).len()
  }
}

/// Extract the token from `Authorization: <token>` or
/// `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .ok_or(TokenError::MissingHeader)?
    .to_str()
    .map_err(|_| TokenError::MalformedHeader)?
    .trim();
  let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
  if token.is_empty() {
    return Err(TokenError::MalformedHeader);
  }
  Ok(token)
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// Present in a handler's arguments means the request carried a valid token.
#[derive(Debug, Clone)]
pub struct Authenticated {
  pub claims: Claims,
}

impl Authenticated {
  /// The person recorded as actor on writes.
  ///
  /// Tokens are not tied to users yet, so this is always the System person.
  pub fn actor(&self) -> EntityId { SYSTEM_ACTOR }
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    tracing::debug!("validating token");
    let claims = bearer_token(&parts.headers)
      .and_then(|token| state.tokens.validate(token))
      .map_err(|e| {
        tracing::debug!(cause = %e, "token rejected");
        ApiError::Unauthorized
      })?;
    Ok(Authenticated { claims })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn issued_token_validates() {
    let factory = TokenFactory::new().unwrap();
    let token = factory.make_token().unwrap();
    let claims = factory.validate(&token).unwrap();
    assert_eq!(claims.aud, AUDIENCE);
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.sub, SUBJECT);
    assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
    assert_eq!(factory.issued_count(), 1);
    let record = factory.issued(&claims.jti).unwrap();
    assert_eq!(record.token, token);
    assert_eq!(record.claims, claims);
  }

  #[test]
  fn garbage_is_rejected() {
    let factory = TokenFactory::new().unwrap();
    assert!(matches!(factory.validate("not-a-jwt"), Err(TokenError::Jwt(_))));
  }

  #[test]
  fn token_from_another_factory_is_rejected() {
    let other = TokenFactory::new().unwrap();
    let factory = TokenFactory::new().unwrap();
    let token = other.make_token().unwrap();
    assert!(matches!(factory.validate(&token), Err(TokenError::Jwt(_))));
  }

  #[test]
  fn correctly_signed_but_unissued_claims_are_rejected() {
    let factory = TokenFactory::new().unwrap();
    let now = Utc::now().timestamp();
    let claims = Claims {
      jti: "forged".into(),
      exp: now + 60,
      aud: AUDIENCE.into(),
      iat: now,
      nbf: now,
      iss: ISSUER.into(),
      sub: SUBJECT.into(),
    };
    let token =
      encode(&Header::new(Algorithm::EdDSA), &claims, &factory.encoding)
        .unwrap();
    assert!(matches!(
      factory.validate(&token),
      Err(TokenError::NotIssued(jti)) if jti == "forged"
    ));
  }

  #[test]
  fn altered_claims_under_a_known_jti_are_rejected() {
    let factory = TokenFactory::new().unwrap();
    let issued = factory.validate(&factory.make_token().unwrap()).unwrap();
    let altered = Claims { sub: "someone-else".into(), ..issued };
    let token =
      encode(&Header::new(Algorithm::EdDSA), &altered, &factory.encoding)
        .unwrap();
    assert!(matches!(
      factory.validate(&token),
      Err(TokenError::ClaimsMismatch(_))
    ));
  }

  /// Sign `claims` with the factory's key and record them as issued, so only
  /// the time checks can reject the token.
  fn sign_and_record(factory: &TokenFactory, claims: Claims) -> String {
    let token =
      encode(&Header::new(Algorithm::EdDSA), &claims, &factory.encoding)
        .unwrap();
    factory.issued.write().unwrap().insert(
      claims.jti.clone(),
      IssuedToken { claims, token: token.clone() },
    );
    token
  }

  fn claims_at(jti: &str, nbf: i64, exp: i64) -> Claims {
    Claims {
      jti: jti.into(),
      exp,
      aud: AUDIENCE.into(),
      iat: nbf,
      nbf,
      iss: ISSUER.into(),
      sub: SUBJECT.into(),
    }
  }

  #[test]
  fn expired_token_is_rejected() {
    let factory = TokenFactory::new().unwrap();
    let now = Utc::now().timestamp();
    let token =
      sign_and_record(&factory, claims_at("expired", now - 7200, now - 3600));
    assert!(factory.issued("expired").is_some());
    assert!(matches!(factory.validate(&token), Err(TokenError::Jwt(_))));
  }

  #[test]
  fn token_before_its_not_before_time_is_rejected() {
    let factory = TokenFactory::new().unwrap();
    let now = Utc::now().timestamp();
    let token =
      sign_and_record(&factory, claims_at("early", now + 3600, now + 7200));
    assert!(factory.issued("early").is_some());
    assert!(matches!(factory.validate(&token), Err(TokenError::Jwt(_))));
  }

  #[test]
  fn recorded_token_inside_its_window_is_accepted() {
    let factory = TokenFactory::new().unwrap();
    let now = Utc::now().timestamp();
    let token = sign_and_record(&factory, claims_at("fresh", now, now + 60));
    assert_eq!(factory.validate(&token).unwrap().jti, "fresh");
  }

  #[test]
  fn wrong_audience_is_rejected() {
    let factory = TokenFactory::new().unwrap();
    let now = Utc::now().timestamp();
    let claims = Claims {
      jti: "x".into(),
      exp: now + 60,
      aud: "elsewhere".into(),
      iat: now,
      nbf: now,
      iss: ISSUER.into(),
      sub: SUBJECT.into(),
    };
    let token =
      encode(&Header::new(Algorithm::EdDSA), &claims, &factory.encoding)
        .unwrap();
    assert!(matches!(factory.validate(&token), Err(TokenError::Jwt(_))));
  }

  #[test]
  fn bearer_prefix_is_optional() {
    let mut headers = HeaderMap::new();
    assert!(matches!(bearer_token(&headers), Err(TokenError::MissingHeader)));

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
    assert_eq!(bearer_token(&headers).unwrap(), "abc.def");

    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_static("Bearer abc.def"),
    );
    assert_eq!(bearer_token(&headers).unwrap(), "abc.def");

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert!(matches!(
      bearer_token(&headers),
      Err(TokenError::MalformedHeader)
    ));
  }
}
