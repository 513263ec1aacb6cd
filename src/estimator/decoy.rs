use crate::letters::{Alphabet, Letter};
use crate::random::{choose, RandomSource};

/// Catalog distance used when a letter has no similarity group.
pub const NEARBY_RADIUS: usize = 3;

/// Pick the letter reported on an incorrect outcome. Never returns `target`.
///
/// Preference order: the target's own similarity group, then a group the
/// target belongs to (its owner plus the other members), then catalog
/// neighbours within [`NEARBY_RADIUS`], then anything else in the catalog.
pub fn pick_decoy(alphabet: &Alphabet, target: &Letter, rng: &mut dyn RandomSource) -> Letter {
    let own_group: Vec<&Letter> = alphabet
        .profile(target)
        .similar
        .iter()
        .filter(|l| *l != target)
        .collect();
    if let Some(letter) = choose(rng, &own_group) {
        return (*letter).clone();
    }

    if let Some((owner, group)) = alphabet.profiles.group_containing(target) {
        let options: Vec<&Letter> = std::iter::once(owner)
            .chain(group.iter())
            .filter(|l| *l != target)
            .collect();
        if let Some(letter) = choose(rng, &options) {
            return (*letter).clone();
        }
    }

    let nearby = alphabet.catalog.neighbours(target, NEARBY_RADIUS);
    if let Some(letter) = choose(rng, &nearby) {
        return (*letter).clone();
    }

    let rest: Vec<&Letter> = alphabet
        .catalog
        .letters()
        .iter()
        .filter(|l| *l != target)
        .collect();
    choose(rng, &rest)
        .map(|l| (*l).clone())
        // A one-letter catalog leaves nothing else to report.
        .unwrap_or_else(|| target.clone())
}
