use std::time::SystemTime;

use chrono::{DateTime, Utc};
use sequoia_openpgp::cert::CertParser;
use sequoia_openpgp::cert::prelude::*;
use sequoia_openpgp::packet::key::PublicParts;
use sequoia_openpgp::parse::Parse;
use sequoia_openpgp::policy::{Policy, StandardPolicy};
use sequoia_openpgp::types::RevocationStatus;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{Entity, Subkey};

/// Parses an armored (or binary) OpenPGP keyring into an [`Entity`].
///
/// Only the first key of the keyring is used. Any further keys are
/// discarded with a warning.
pub fn parse_entity(bytes: &[u8]) -> Result<Entity> {
    parse_entity_with_policy(bytes, &StandardPolicy::new(), SystemTime::now())
}

pub fn parse_entity_with_policy(
    bytes: &[u8],
    policy: &dyn Policy,
    time: SystemTime,
) -> Result<Entity> {
    let mut certs = CertParser::from_bytes(bytes)?;
    let cert = match certs.next() {
        Some(cert) => cert?,
        None => return Err(Error::EmptyKeyring),
    };

    let discarded = certs.count();
    if discarded > 0 {
        warn!(
            fingerprint = %cert.fingerprint(),
            discarded,
            "keyring holds more than one key, using the first"
        );
    }

    let subkeys = cert
        .keys()
        .subkeys()
        .map(|ka| subkey_from_amalgamation(ka, policy, time))
        .collect();

    Ok(Entity {
        fingerprint: cert.fingerprint().to_hex(),
        subkeys,
    })
}

fn subkey_from_amalgamation<'a>(
    ka: SubordinateKeyAmalgamation<'a, PublicParts>,
    policy: &'a dyn Policy,
    time: SystemTime,
) -> Subkey {
    let creation_time = ka.key().creation_time();
    let algorithm_can_encrypt = ka.key().pk_algo().for_encryption();
    let created = DateTime::<Utc>::from(creation_time);

    let valid = match ka.with_policy(policy, time) {
        Ok(valid) => valid,
        Err(err) => {
            debug!(error = %err, "subkey has no valid binding signature");
            return unusable_subkey(created, algorithm_can_encrypt);
        }
    };

    // A revocation replaces the binding signature, so its flags no longer apply.
    if let RevocationStatus::Revoked(_) = valid.revocation_status() {
        debug!(fingerprint = %valid.key().fingerprint(), "subkey is revoked");
        return unusable_subkey(created, algorithm_can_encrypt);
    }

    let sig = valid.binding_signature();
    let flags = sig.key_flags();
    // A zero validity period means the key does not expire.
    let expires = sig
        .key_validity_period()
        .filter(|period| !period.is_zero())
        .and_then(|period| creation_time.checked_add(period))
        .map(DateTime::<Utc>::from);

    Subkey {
        created,
        expires,
        flags_valid: flags.is_some(),
        encrypts_communications: flags.is_some_and(|f| f.for_transport_encryption()),
        algorithm_can_encrypt,
    }
}

fn unusable_subkey(created: DateTime<Utc>, algorithm_can_encrypt: bool) -> Subkey {
    Subkey {
        created,
        expires: None,
        flags_valid: false,
        encrypts_communications: false,
        algorithm_can_encrypt,
    }
}
