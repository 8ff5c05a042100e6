//! Client-side stream handling: frame decoding and local conversation state.

mod frames;
mod reducer;

pub use frames::{FrameError, stream_events};
pub use reducer::{
    ConversationStateReducer, LocalConversation, LocalMessage, MessageStatus, ReducerError,
};
