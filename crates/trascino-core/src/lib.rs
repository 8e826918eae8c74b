pub mod channel;
pub mod command;
pub mod error;
pub mod gesture;
pub mod log;
pub mod modifiers;
pub mod rect;
pub mod resize;
pub mod settings;
pub mod zone;

pub use channel::{ChannelStats, CommandReceiver, CommandSender, command_channel};
pub use command::{CommandFlags, Placement, WindowCommand};
pub use error::ExitSignal;
pub use gesture::{Desktop, Effect, EventDisposition, GestureEngine, GestureMode};
pub use modifiers::ModifierSnapshot;
pub use rect::{Point, Rect};
pub use resize::{LearnedMin, ResizeGrip, resize_rect};
pub use settings::{Settings, SharedSettings};
pub use zone::Zone;

/// How many `WindowCommand` slots the hook→worker queue holds.
///
/// Plenty for lag spikes; if the worker is frozen long enough to fill
/// this, further commands are dropped and counted rather than blocking
/// the input pipeline.
pub const COMMAND_QUEUE_CAPACITY: usize = 2048;
