// Domain models - containers, streams and their display labels

mod container;
mod label;
mod stream;
mod subtitle;

pub use container::{default_output_name, Container, PlannedAction};
pub use label::{ContainerLabel, StreamLabel};
pub use stream::{SlotCounter, Stream, StreamKind, StreamPlan};
pub use subtitle::{guess_encoding, SubtitleFile};
