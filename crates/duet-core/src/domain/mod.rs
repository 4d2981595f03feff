//! Domain model (IDs, workspace record, todo item, timer).

pub mod events;
pub mod ids;
pub mod state;
pub mod timer;
pub mod todo;
pub mod workspace;

pub use self::events::DomainEvent;
pub use self::ids::{Id, IdMarker, TodoId, UserId, WorkspaceId};
pub use self::state::TimerState;
pub use self::timer::{Timer, TimerEdit, TimerFields, format_clock};
pub use self::todo::TodoItem;
pub use self::workspace::{DEFAULT_TIMER_SECS, WorkspaceLookup, WorkspacePatch, WorkspaceRecord};
