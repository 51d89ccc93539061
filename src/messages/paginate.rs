//! Splits long reply text into chunks that fit a single chat message.
//!
//! Each chunk is a window of at most `limit` characters of the source text,
//! wrapped independently in a fence (for example a Discord code block). The
//! window boundaries depend only on the text and the limit, so the same input
//! always produces the same chunks.

/// Hard ceiling Discord applies to message content, in characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Markdown code block delimiter.
pub const CODE_BLOCK_FENCE: &str = "```";

/// Window size for code-block replies: leaves room for both fences.
pub const CODE_BLOCK_CHUNK: usize = DISCORD_MESSAGE_LIMIT - 2 * CODE_BLOCK_FENCE.len();

/// Window size for unfenced replies.
pub const PLAIN_CHUNK: usize = DISCORD_MESSAGE_LIMIT;

/// Split `text` into fenced chunks of at most `limit` characters each.
///
/// Windows are counted in `char`s so a multi-byte code point is never cut in
/// half. An empty input produces no chunks; a `limit` of zero is treated as 1.
pub fn paginate(text: &str, limit: usize, fence: &str) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut taken = 0;

    for (idx, _) in text.char_indices() {
        if taken == limit {
            chunks.push(wrap(&text[start..idx], fence));
            start = idx;
            taken = 0;
        }
        taken += 1;
    }
    if start < text.len() {
        chunks.push(wrap(&text[start..], fence));
    }

    chunks
}

/// Code-block pagination used for log-style replies.
pub fn paginate_code_block(text: &str) -> Vec<String> {
    paginate(text, CODE_BLOCK_CHUNK, CODE_BLOCK_FENCE)
}

/// Plain pagination used for bare lists.
pub fn paginate_plain(text: &str) -> Vec<String> {
    paginate(text, PLAIN_CHUNK, "")
}

/// Recover the inner slice of a chunk produced by [`paginate`].
pub fn strip_fence<'a>(chunk: &'a str, fence: &str) -> &'a str {
    chunk
        .strip_prefix(fence)
        .and_then(|inner| inner.strip_suffix(fence))
        .unwrap_or(chunk)
}

fn wrap(slice: &str, fence: &str) -> String {
    let mut out = String::with_capacity(slice.len() + 2 * fence.len());
    out.push_str(fence);
    out.push_str(slice);
    out.push_str(fence);
    out
}
