mod command;
mod definition;
mod quality;
mod scale;
mod value;

pub use command::WriteCommand;
pub use definition::{
    ChannelBinding, DEFAULT_REG_SCALE, TagDefinition, WriteMode, WriteSemantics,
};
pub use quality::TagQuality;
pub use scale::LinearScale;
pub use value::{Snapshot, TagValue};
