//! Pairing engine
//!
//! Turns a member list into a single gift-giving cycle: shuffle, then each
//! member gives to the next one in shuffled order, the last giving to the
//! first. Every member is santa once and recipient once, and a cycle of
//! length >= 2 has no fixed points.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

use crate::error::DrawError;

/// Smallest group that can be drawn
pub const MIN_MEMBERS: usize = 2;

/// One directed giver -> recipient edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Pairing<T> {
    pub santa: T,
    pub recipient: T,
}

/// Draw a fresh assignment for `members`.
///
/// Pure apart from the injected `rng`; callers that need reproducible draws
/// pass a seeded generator.
pub fn draw_assignment<T, R>(members: &[T], rng: &mut R) -> Result<Vec<Pairing<T>>, DrawError>
where
    T: Clone + Eq + Hash,
    R: Rng + ?Sized,
{
    if members.len() < MIN_MEMBERS {
        return Err(DrawError::InsufficientMembers {
            found: members.len(),
        });
    }

    let mut seen = HashSet::with_capacity(members.len());
    if !members.iter().all(|m| seen.insert(m)) {
        return Err(DrawError::DuplicateMember);
    }

    // Fisher-Yates: i from len-1 down to 1, j uniform in [0, i]
    let mut order = members.to_vec();
    order.shuffle(rng);

    let n = order.len();
    Ok((0..n)
        .map(|k| Pairing {
            santa: order[k].clone(),
            recipient: order[(k + 1) % n].clone(),
        })
        .collect())
}

/// Check that `assignment` is a fixed-point-free permutation of its santas.
pub fn check_assignment<T>(assignment: &[Pairing<T>]) -> Result<(), DrawError>
where
    T: Eq + Hash,
{
    if assignment.len() < MIN_MEMBERS {
        return Err(DrawError::InsufficientMembers {
            found: assignment.len(),
        });
    }

    let mut santas = HashSet::with_capacity(assignment.len());
    let mut recipients = HashSet::with_capacity(assignment.len());
    for pair in assignment {
        if pair.santa == pair.recipient {
            return Err(DrawError::InvalidAssignment(
                "member assigned to themselves".to_string(),
            ));
        }
        if !santas.insert(&pair.santa) {
            return Err(DrawError::InvalidAssignment("santa listed twice".to_string()));
        }
        if !recipients.insert(&pair.recipient) {
            return Err(DrawError::InvalidAssignment(
                "recipient listed twice".to_string(),
            ));
        }
    }

    if santas != recipients {
        return Err(DrawError::InvalidAssignment(
            "santas and recipients differ".to_string(),
        ));
    }

    Ok(())
}
