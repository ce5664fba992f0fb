// Engine - timing, weighted sampling, scheduling, and the session driver

pub mod inputs;
pub mod scheduler;
pub mod session;
pub mod timing;
pub mod weights;

pub use inputs::{TickInputs, split};
pub use scheduler::NoteScheduler;
pub use session::{Session, Voice};
pub use timing::{TICKS_PER_BEAT, Tempo, TimeSignature};
pub use weights::{WeightError, WeightTable};
