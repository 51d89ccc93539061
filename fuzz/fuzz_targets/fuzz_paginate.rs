#![no_main]

use libfuzzer_sys::fuzz_target;

use clanbot::commands::parse_command_line;
use clanbot::messages::{paginate, strip_fence, CODE_BLOCK_FENCE, DISCORD_MESSAGE_LIMIT};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Small first byte picks a window size so short inputs still split.
    let limit = data.first().map(|b| (*b as usize % 64) + 1).unwrap_or(1);
    for fence in ["", CODE_BLOCK_FENCE] {
        let chunks = paginate(text, limit, fence);
        let rejoined: String = chunks.iter().map(|c| strip_fence(c, fence)).collect();
        assert_eq!(rejoined, text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= limit + 2 * fence.chars().count());
        }
    }

    for chunk in clanbot::messages::paginate_code_block(text) {
        assert!(chunk.chars().count() <= DISCORD_MESSAGE_LIMIT);
    }

    if let Some(line) = parse_command_line("??", text) {
        assert!(!line.name.is_empty());
        assert!(!line.args.is_empty());
    }
});
