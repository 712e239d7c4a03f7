pub mod realtime_channel;

pub use realtime_channel::{
    ChannelHandle, ChannelSignal, InboundEvent, OutboundEvent, PresenceStatus, RealtimeChannel,
    WriterCommand,
};
