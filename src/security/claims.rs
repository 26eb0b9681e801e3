use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};

/// Standard alphabet, tolerant of missing padding and stray trailing bits.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Role carried by a session token.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    /// Any role string the portal does not know, or no role at all.
    #[default]
    #[serde(other)]
    Unknown,
}

/// The part of a token payload the gate reads. Every other claim is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub role: Role,
}

/// Decode the payload segment of a compact token without checking its signature.
pub fn decode_claims(token: &str) -> Result<SessionClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenError::MissingPayload)?;

    let standard = payload.replace('-', "+").replace('_', "/");
    let bytes = LENIENT_STANDARD.decode(standard)?;

    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    if !value.is_object() {
        return Err(TokenError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}

/// How a token's claims are obtained.
pub enum TokenVerifier {
    /// Trust the payload at face value.
    Unverified,
    /// Check an HS256 signature against a shared secret first.
    Hs256 {
        key: DecodingKey,
        validation: Box<Validation>,
    },
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unverified => f.write_str("Unverified"),
            Self::Hs256 { .. } => f.write_str("Hs256"),
        }
    }
}

impl TokenVerifier {
    /// Verifier for tokens signed with HS256 and `secret`.
    pub fn hs256(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The issuer only guarantees `role`; `exp` is still checked when present.
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        Self::Hs256 {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Box::new(validation),
        }
    }

    /// Claims of `token`, after signature checks when configured.
    pub fn claims(&self, token: &str) -> Result<SessionClaims> {
        match self {
            Self::Unverified => decode_claims(token),
            Self::Hs256 { key, validation } => {
                // Run the same payload checks first so both modes reject the same shapes.
                decode_claims(token)?;
                let data = decode::<SessionClaims>(token, key, validation)?;
                Ok(data.claims)
            }
        }
    }
}

/// The gate's view of whoever sent a request.
///
/// Inserted into request extensions for requests the gate lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// No session cookie.
    Anonymous,
    /// A session cookie whose token yields no recognised role.
    Unresolved,
    /// A session cookie carrying `User` or `Admin`.
    Authenticated(Role),
}

impl Viewer {
    /// `Unknown` roles become `Unresolved`.
    pub fn from_claims(claims: &SessionClaims) -> Self {
        match claims.role {
            Role::Unknown => Self::Unresolved,
            role => Self::Authenticated(role),
        }
    }

    /// Role of an authenticated viewer.
    pub fn role(self) -> Option<Role> {
        match self {
            Self::Authenticated(role) => Some(role),
            Self::Anonymous | Self::Unresolved => None,
        }
    }
}
