//! Short unique cell identifiers.
//!
//! Ids are `c-` followed by six hex characters drawn from a v4-style uuid
//! generated off the engine RNG, so seeded runs mint reproducible ids.

use rand::Rng;
use syncytium_data::CellId;
use uuid::Uuid;

const SHORT_LEN: usize = 6;

/// Mints one candidate id. Collisions are possible; use [`fresh_id`] when a
/// registry is at hand.
pub fn short_id<R: Rng>(rng: &mut R) -> CellId {
    let id = Uuid::from_u128(rng.gen::<u128>());
    let hex = id.simple().to_string();
    CellId::new(format!("c-{}", &hex[..SHORT_LEN]))
}

/// Mints an id not present in `taken`, retrying on collision.
pub fn fresh_id<R, F>(rng: &mut R, mut taken: F) -> CellId
where
    R: Rng,
    F: FnMut(&CellId) -> bool,
{
    loop {
        let id = short_id(rng);
        if !taken(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn ids_are_short_and_prefixed() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let id = short_id(&mut rng);
        assert!(id.as_str().starts_with("c-"));
        assert_eq!(id.as_str().len(), 2 + SHORT_LEN);
    }

    #[test]
    fn seeded_ids_are_reproducible() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(short_id(&mut a), short_id(&mut b));
    }

    #[test]
    fn fresh_id_skips_taken() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let first = short_id(&mut rng);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let second = fresh_id(&mut rng, |id| *id == first);
        assert_ne!(first, second);
    }
}
