const MARKDOWN_V2_RESERVED: &str = r"\_*[]()~`>#+-=|{}.!";
const MARKDOWN_RESERVED: &str = r"_*`[";

/// Escapes every character Telegram's MarkdownV2 treats as markup.
pub fn escape_markdown_v2(text: &str) -> String {
    escape_with(text, MARKDOWN_V2_RESERVED)
}

/// Escapes the legacy Markdown entity characters.
pub fn escape_markdown(text: &str) -> String {
    escape_with(text, MARKDOWN_RESERVED)
}

fn escape_with(text: &str, reserved: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if reserved.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
