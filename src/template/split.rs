// Quote-aware splitting used for tag components, filter chains and arguments

use super::scanner::StringScanner;

/// Split `input` on `separator`, keeping `'...'` and `"..."` runs intact.
///
/// Quote characters stay in the output. Consecutive separators produce empty
/// components; an unterminated quote swallows the rest of the input.
pub fn split_respecting_quotes(input: &str, separator: char) -> Vec<String> {
    let mut buf = [0u8; 4];
    let separator: &str = separator.encode_utf8(&mut buf);

    let mut components = Vec::new();
    let mut word = String::new();
    let mut scanner = StringScanner::new(input);

    while !scanner.is_at_end() {
        let (matched, skipped) = scanner.scan_until_any(&[separator, "'", "\""]);
        word.push_str(skipped);

        match matched {
            Some(quote @ ("'" | "\"")) if quote != separator => {
                // opening quote, then everything up to and including the closing one
                word.push_str(scanner.scan_until(quote, true));
                word.push_str(scanner.scan_until(quote, true));
                if scanner.is_at_end() {
                    components.push(std::mem::take(&mut word));
                }
            }
            Some(_) => {
                components.push(std::mem::take(&mut word));
                scanner.scan_until(separator, true);
            }
            None => components.push(std::mem::take(&mut word)),
        }
    }

    components
}

/// [`split_respecting_quotes`] with leading/trailing spaces removed from each part.
pub fn split_and_trim(input: &str, separator: char) -> Vec<String> {
    split_respecting_quotes(input, separator)
        .into_iter()
        .map(|component| component.trim_matches(' ').to_string())
        .collect()
}
