//! Event-based rendering of entities back into markup.
//!
//! Every entity becomes one open and one close event. Events are sorted so
//! that output nests correctly regardless of the order entities arrive in,
//! then written while walking the plain text one `char` at a time.

use std::cmp::Ordering;
use std::fmt::Write;

use crate::entity::Entity;
use crate::error::Error;
use crate::utf16;

/// Link target that mentions a user by id, followed by the id.
pub(crate) const USER_LINK_PREFIX: &str = "tg://user?id=";

/// A markup language the event renderer can write.
///
/// Implementations receive the output buffer through [`Write`], the same way
/// every writer in this crate does, and decide how each entity and each
/// literal character is spelled.
pub(crate) trait Markup: Write {
    /// Write the opening syntax of `entity`.
    fn open(&mut self, entity: &Entity) -> std::fmt::Result;

    /// Write the closing syntax of `entity`.
    fn close(&mut self, entity: &Entity) -> std::fmt::Result;

    /// Write one character of plain text, escaped as needed.
    fn text(&mut self, c: char) -> std::fmt::Result;

    /// Consume the markup writer and return what it wrote.
    fn into_buffer(self) -> String;
}

/// What an event does, in the order events at one position are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    /// Close a span that covered text before this position.
    Close,
    Open,
    /// Close an empty span right after it was opened.
    CloseEmpty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Event {
    position: u64,
    phase: Phase,
    /// Index of the entity in the caller's list.
    index: usize,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then(self.phase.cmp(&other.phase))
            .then_with(|| match self.phase {
                // Earlier entities open first and become the outer tag.
                Phase::Open => self.index.cmp(&other.index),
                // Later entities close first.
                Phase::Close | Phase::CloseEmpty => other.index.cmp(&self.index),
            })
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn events(entities: &[Entity]) -> Result<Vec<Event>, Error> {
    let mut events = Vec::new();
    events.try_reserve(entities.len() * 2)?;
    for (index, entity) in entities.iter().enumerate() {
        let start = u64::from(entity.offset);
        events.push(Event {
            position: start,
            phase: Phase::Open,
            index,
        });
        events.push(Event {
            position: start + u64::from(entity.length),
            phase: if entity.length == 0 {
                Phase::CloseEmpty
            } else {
                Phase::Close
            },
            index,
        });
    }
    events.sort_unstable();
    Ok(events)
}

/// Render `text` with `entities` using `markup`.
///
/// At each position, spans ending there are closed before spans starting
/// there are opened. Ties go by position in `entities`: earlier entities open
/// first and close last. That nests correctly for normalized input; crossing
/// or unsorted entities are written as given, so callers wanting guaranteed
/// well-formed output should normalize first.
pub(crate) fn render<M: Markup>(
    text: &str,
    entities: &[Entity],
    mut markup: M,
) -> Result<String, Error> {
    let events = events(entities)?;
    tracing::trace!(events = events.len(), "render");

    let mut opened = vec![false; entities.len()];
    let mut pending = events.iter().peekable();
    let mut position = 0u64;

    // `<=` so an offset pointing into a surrogate pair is written at the next char.
    let mut write_due = |markup: &mut M, position: u64| -> std::fmt::Result {
        while let Some(event) = pending.next_if(|event| event.position <= position) {
            let entity = &entities[event.index];
            if event.phase == Phase::Open {
                opened[event.index] = true;
                markup.open(entity)?;
            } else if opened[event.index] {
                markup.close(entity)?;
            }
        }
        Ok(())
    };

    for c in text.chars() {
        write_due(&mut markup, position)?;
        markup.text(c)?;
        position += u64::from(utf16::units(c));
    }
    write_due(&mut markup, position)?;

    // Anything left starts or ends past the text. Only close what was opened.
    for event in pending {
        if event.phase != Phase::Open && opened[event.index] {
            markup.close(&entities[event.index])?;
        }
    }

    Ok(markup.into_buffer())
}
