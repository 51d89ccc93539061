//! Reply payloads and the paginator that keeps long replies under the
//! platform's message ceiling.

pub mod outbound;
pub mod paginate;

pub use outbound::{display_value, Embed, EmbedField, MessageContent, BLANK_FIELD, EMBED_COLOR};
pub use paginate::{
    paginate, paginate_code_block, paginate_plain, strip_fence, CODE_BLOCK_CHUNK,
    CODE_BLOCK_FENCE, DISCORD_MESSAGE_LIMIT, PLAIN_CHUNK,
};
