//! Music library: tracks, their tags and the navigation queue.
//!
//! - `track`: Track identity plus cached display metadata
//! - `tags`: Tag read/write service (lofty-backed, plus a mock)
//! - `queue`: Ordered queue with sequential and shuffled advance

mod error;
mod queue;
mod tags;
mod track;

pub use error::{LibraryError, TagError};
pub use queue::{Direction, Queue, AUDIO_EXTENSIONS};
pub use tags::{LoftyTagService, MockTagService, TagService};
pub use track::{Track, TrackTags};
