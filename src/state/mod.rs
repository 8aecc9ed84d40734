//! Interaction state: draw gesture, edit controller, box manipulation and
//! the session that ties them to one region collection.

mod drawing;
mod edit;
pub mod manipulation;
mod session;

pub use drawing::{DrawOutcome, DrawingState, PointerTarget};
pub use edit::{EditBuffer, EditController, EditState};
pub use manipulation::ResizeHandle;
pub use session::EditorSession;
