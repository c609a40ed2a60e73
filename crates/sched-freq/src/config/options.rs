//! Config value parsing.

use std::collections::HashMap;

/// Parses config value string, which consists of two parts - name and options.
/// Example: `Margin[margin=1280]` parts are name `Margin` and options string `margin=1280`.
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.trim().split_once('[') {
        Some((l, r)) => (l.to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
///
/// # Examples
///
/// ```rust
/// use sched_freq::config::options::parse_options;
///
/// let options = parse_options("margin=1280,mode=fast");
/// assert_eq!(options.get("margin").unwrap(), "1280");
/// assert_eq!(options.get("mode").unwrap(), "fast");
/// assert_eq!(options.get("other"), None);
/// ```
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_value() {
        assert_eq!(
            parse_config_value("Margin[margin=1280]"),
            ("Margin".to_string(), Some("margin=1280".to_string()))
        );
        assert_eq!(parse_config_value(" TargetLoad "), ("TargetLoad".to_string(), None));
    }
}
