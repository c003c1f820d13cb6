use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Question text arrives from an external generator (PDF extraction) and is
/// rendered by the browser client, so it goes through a whitelist sanitizer
/// before it is stored. Safe inline tags survive; scripts and event handlers
/// are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
