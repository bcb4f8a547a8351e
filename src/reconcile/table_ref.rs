//! Post table resolution
//!
//! The timeline's `posts` field is a `Table` whose object id has been seen
//! rendered in several shapes depending on node version and display
//! options. Each shape gets its own extraction strategy; they are tried in
//! a fixed order and the first hit wins.

use serde_json::Value;

/// Extracts a table id from the `posts` value, if it has the expected shape
pub type TableRefStrategy = fn(&Value) -> Option<String>;

/// Named strategies in priority order
pub const TABLE_REF_STRATEGIES: &[(&str, TableRefStrategy)] = &[
    ("fields.id.id", nested_uid),
    ("fields.id", fields_id),
    ("id", direct_id),
    ("objectId", object_id),
];

/// Resolve the post table id from a timeline's struct fields
///
/// A timeline without a `posts` field resolves to `None` like any other
/// unrecognised shape; the caller reports it rather than showing an empty
/// feed for a record that is not a real timeline.
pub fn resolve_table_ref(timeline_fields: &Value) -> Option<String> {
    let posts = timeline_fields.get("posts")?;

    TABLE_REF_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            strategy(posts).map(|id| {
                tracing::trace!(strategy = name, table_id = %id, "Resolved post table");
                id
            })
        })
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `posts.fields.id.id`
fn nested_uid(posts: &Value) -> Option<String> {
    non_empty(posts.pointer("/fields/id/id"))
}

/// `posts.fields.id` as a bare string
fn fields_id(posts: &Value) -> Option<String> {
    non_empty(posts.pointer("/fields/id"))
}

/// `posts.id`, either a bare string or a `{ id }` UID
fn direct_id(posts: &Value) -> Option<String> {
    non_empty(posts.get("id")).or_else(|| non_empty(posts.pointer("/id/id")))
}

/// `posts.objectId`
fn object_id(posts: &Value) -> Option<String> {
    non_empty(posts.get("objectId"))
}
