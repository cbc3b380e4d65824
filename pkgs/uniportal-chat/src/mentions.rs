//! `@Name` mentions and the last-seen cursor
//!
//! Message lists are always in store order (oldest first). The cursor is
//! the id of the newest message the viewer has acknowledged; anything at or
//! before it is considered seen.

use uniportal_auth::UserProfile;
use uniportal_store::ChatMessage;

pub fn mention_token(name: &str) -> String {
    format!("@{}", name)
}

/// Index of the first message after the cursor, `None` if the cursor is
/// unset or no longer in the list
fn after_cursor(messages: &[ChatMessage], last_seen: Option<&str>) -> Option<usize> {
    let last_seen = last_seen?;
    messages
        .iter()
        .position(|message| message.id == last_seen)
        .map(|index| index + 1)
}

/// The mention the viewer has not seen yet
///
/// With a known cursor this is the first matching message after it. A
/// cursor pointing at a message that is gone falls back to the latest
/// matching message. Without a cursor no mention is reported. The viewer's
/// own messages never count.
pub fn find_unseen_mention<'a>(
    messages: &'a [ChatMessage],
    viewer: &UserProfile,
    last_seen: Option<&str>,
) -> Option<&'a ChatMessage> {
    let last_seen = last_seen?;
    if viewer.name.trim().is_empty() {
        return None;
    }

    let token = mention_token(&viewer.name);
    let is_mention =
        |message: &&ChatMessage| message.sender_id != viewer.uid && message.text.contains(&token);

    match after_cursor(messages, Some(last_seen)) {
        Some(start) => messages[start..].iter().find(is_mention),
        None => messages.iter().rev().find(is_mention),
    }
}

/// Messages from others after the cursor; everything from others when the
/// cursor is unset or unknown
pub fn unread_count(messages: &[ChatMessage], viewer_uid: &str, last_seen: Option<&str>) -> usize {
    let start = after_cursor(messages, last_seen).unwrap_or(0);
    messages[start..]
        .iter()
        .filter(|message| message.sender_id != viewer_uid)
        .count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte range of the `@word` fragment ending at `caret`
fn fragment_at(draft: &str, caret: usize) -> Option<(usize, &str)> {
    let before = draft.get(..caret)?;
    let at = before.rfind('@')?;
    let word = &before[at + 1..];
    word.chars().all(is_word_char).then_some((at, word))
}

/// The partial name being typed right before the caret, lower-cased
///
/// `caret` is a byte offset into `draft`.
pub fn mention_query(draft: &str, caret: usize) -> Option<String> {
    fragment_at(draft, caret).map(|(_, word)| word.to_lowercase())
}

/// Users whose name contains `query`, excluding the viewer
pub fn suggest<'a>(
    query: &str,
    users: &'a [UserProfile],
    viewer_uid: &str,
) -> Vec<&'a UserProfile> {
    let query = query.to_lowercase();
    users
        .iter()
        .filter(|user| user.uid != viewer_uid && user.name.to_lowercase().contains(&query))
        .collect()
}

/// Replace the fragment before the caret with `@<name> `
///
/// Returns the new draft and the caret just past the inserted space. A
/// draft with no fragment at the caret is returned unchanged.
pub fn complete(draft: &str, caret: usize, name: &str) -> (String, usize) {
    let Some((at, _)) = fragment_at(draft, caret) else {
        return (draft.to_string(), caret);
    };

    let inserted = format!("{} ", mention_token(name));
    let completed = format!("{}{}{}", &draft[..at], inserted, &draft[caret..]);
    (completed, at + inserted.len())
}
