//! Evaluation order for a network's links.

use super::core::LayerId;
use super::link::Link;

/// Computes an order in which every link runs only after all links feeding
/// its source layer.
///
/// The order is stable: among the links that are ready at any point, the one
/// added first runs first, so an already valid insertion order is returned
/// unchanged. On failure returns the layers still waiting for input, which
/// covers every layer on a cycle.
pub(crate) fn link_order(
    layer_count: usize,
    links: &[Link],
) -> std::result::Result<Vec<usize>, Vec<LayerId>> {
    let mut pending = vec![0usize; layer_count];
    for link in links {
        pending[link.target()] += 1;
    }

    let mut scheduled = vec![false; links.len()];
    let mut order = Vec::with_capacity(links.len());

    while order.len() < links.len() {
        let ready = links
            .iter()
            .enumerate()
            .find(|(idx, link)| !scheduled[*idx] && pending[link.source()] == 0);

        let Some((idx, link)) = ready else {
            let stuck = pending
                .iter()
                .enumerate()
                .filter(|(_, count)| **count > 0)
                .map(|(layer, _)| layer)
                .collect();
            return Err(stuck);
        };

        scheduled[idx] = true;
        pending[link.target()] -= 1;
        order.push(idx);
    }

    Ok(order)
}
