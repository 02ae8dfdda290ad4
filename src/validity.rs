use chrono::{DateTime, Utc};

use crate::types::{Entity, Subkey, ValidityCounts, Window};

/// Counts the encryption subkeys of `entity` that are valid at `at`.
///
/// A subkey counts when its binding signature carries well-formed flags
/// declaring communication encryption, its algorithm can encrypt, it is not
/// expired at `at`, and its creation time is strictly after the newest
/// creation time among the subkeys counted before it.
///
/// The last condition is a running maximum over the subkeys in key block
/// order, not a global "newest subkey" selection. When subkeys are not
/// listed in creation order the result depends on that order: an older
/// subkey listed after a newer one is skipped, while every subkey that
/// raises the maximum is counted.
pub fn count_valid_subkeys(entity: &Entity, at: DateTime<Utc>) -> u64 {
    let mut newest: Option<DateTime<Utc>> = None;
    let mut count = 0;

    for subkey in &entity.subkeys {
        if !usable_for_encryption(subkey, at) {
            continue;
        }
        if newest.is_none_or(|newest| subkey.created > newest) {
            count += 1;
            newest = Some(subkey.created);
        }
    }

    count
}

/// Evaluates `entity` for every [`Window`].
///
/// Each window reads the clock on its own, so the three reference instants
/// may drift apart by the time the evaluation takes.
pub fn evaluate(entity: &Entity) -> ValidityCounts {
    let count = |window: Window| {
        let at = window.reference_instant(Utc::now());
        count_valid_subkeys(entity, at)
    };

    ValidityCounts {
        current: count(Window::Current),
        one_week: count(Window::OneWeek),
        two_weeks: count(Window::TwoWeeks),
    }
}

fn usable_for_encryption(subkey: &Subkey, at: DateTime<Utc>) -> bool {
    subkey.flags_valid
        && subkey.encrypts_communications
        && subkey.algorithm_can_encrypt
        && !subkey.is_expired(at)
}
