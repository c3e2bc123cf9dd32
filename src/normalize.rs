//! Turn an arbitrary entity list into a sorted, properly nested one.

use itertools::Itertools;

use crate::entity::Entity;
use crate::error::Error;
use crate::utf16;

/// Sort `entities` and drop the ones that cannot be rendered.
///
/// Zero-length entities are removed, the rest are sorted by offset with longer
/// spans first on ties, and any entity that crosses the boundary of an
/// enclosing one is dropped. Properly nested spans are kept. Applying this
/// twice gives the same result as applying it once.
///
/// Fails with [`Error::DepthExceeded`] if more than `max_depth` entities are
/// open at the same position.
pub fn normalize(entities: Vec<Entity>, max_depth: usize) -> Result<Vec<Entity>, Error> {
    let sorted = entities
        .into_iter()
        .filter(|entity| entity.length > 0)
        .sorted_by(|a, b| a.offset.cmp(&b.offset).then(b.length.cmp(&a.length)));

    // End offsets of the entities enclosing the current position, innermost last.
    let mut open_ends: Vec<u64> = Vec::new();
    let mut kept = Vec::new();
    kept.try_reserve(sorted.len())?;

    for entity in sorted {
        let start = u64::from(entity.offset);
        let end = start + u64::from(entity.length);

        while open_ends.last().is_some_and(|&open_end| open_end <= start) {
            open_ends.pop();
        }

        match open_ends.last() {
            Some(&outer_end) if end > outer_end => {
                tracing::trace!(?entity, outer_end, "dropping crossing entity");
                continue;
            }
            _ => {}
        }

        if open_ends.len() >= max_depth {
            return Err(Error::DepthExceeded { limit: max_depth });
        }
        open_ends.push(end);
        kept.push(entity);
    }

    Ok(kept)
}

/// [`normalize`], additionally dropping entities that do not fit inside `text`.
pub fn normalize_for_text(
    text: &str,
    entities: Vec<Entity>,
    max_depth: usize,
) -> Result<Vec<Entity>, Error> {
    let text_len = utf16::len(text);
    let in_bounds = entities
        .into_iter()
        .filter(|entity| entity.end().is_some_and(|end| end <= text_len))
        .collect();
    normalize(in_bounds, max_depth)
}
