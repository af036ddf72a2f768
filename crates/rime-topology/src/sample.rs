//! Without-replacement neighbor sampling.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{NodeAddress, TopologyError};

/// Draw `sample_size` distinct peers uniformly at random from `neighbors`,
/// never including `requester` itself.
///
/// Fails with [`TopologyError::SampleTooLarge`] when the eligible peer set
/// is smaller than the requested sample; callers are expected to have
/// checked their neighbor count against the configured sample size at
/// startup, so hitting this at runtime indicates a configuration bug.
pub fn sample_peers<R: Rng + ?Sized>(
    rng: &mut R,
    requester: NodeAddress,
    neighbors: &[NodeAddress],
    sample_size: usize,
) -> Result<Vec<NodeAddress>, TopologyError> {
    let pool: Vec<NodeAddress> = neighbors
        .iter()
        .copied()
        .filter(|&peer| peer != requester)
        .collect();

    if sample_size > pool.len() {
        return Err(TopologyError::SampleTooLarge {
            requested: sample_size,
            available: pool.len(),
        });
    }

    Ok(pool.choose_multiple(rng, sample_size).copied().collect())
}
