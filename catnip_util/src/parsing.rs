/// Parse a comma-separated id list, as found in URL query params like
/// `?breed=beng,abys`. Whitespace around ids is dropped, as are empty segments.
pub fn parse_id_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
