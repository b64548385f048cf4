// ABOUTME: Identifier helpers shared by SQL builders and log output
// ABOUTME: Quoting, server-side length truncation, and display sanitizing

/// Longest identifier PostgreSQL stores (NAMEDATALEN - 1), in bytes
pub const MAX_IDENTIFIER_BYTES: usize = 63;

/// Wrap an identifier in double quotes, doubling any embedded quote
///
/// Unlike `pg_escape::quote_identifier`, this always quotes, which keeps the
/// case of the identifier exactly as given.
///
/// # Examples
///
/// ```
/// # use dlt_replica_identity::utils::quote_always;
/// assert_eq!(quote_always("my_schema"), "\"my_schema\"");
/// assert_eq!(quote_always("we\"ird"), "\"we\"\"ird\"");
/// ```
pub fn quote_always(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Truncate an identifier to the length PostgreSQL keeps
///
/// The server silently cuts longer names to 63 bytes, backing off to a
/// character boundary. Doing the same client-side keeps catalog lookups in
/// agreement with what was actually created.
///
/// # Examples
///
/// ```
/// # use dlt_replica_identity::utils::truncate_identifier;
/// assert_eq!(truncate_identifier("short"), "short");
/// assert_eq!(truncate_identifier(&"a".repeat(80)).len(), 63);
/// ```
pub fn truncate_identifier(identifier: &str) -> &str {
    if identifier.len() <= MAX_IDENTIFIER_BYTES {
        return identifier;
    }

    let mut end = MAX_IDENTIFIER_BYTES;
    while !identifier.is_char_boundary(end) {
        end -= 1;
    }
    &identifier[..end]
}

/// Sanitize an identifier (table name, schema name, etc.) for display
///
/// Removes control characters and limits length to prevent log injection.
/// This is for display purposes only; SQL text goes through the quoting
/// helpers.
///
/// # Examples
///
/// ```
/// # use dlt_replica_identity::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
