//! Volume creation options.
//!
//! `template:<file>=<body>` registers a template; a body starting with `/` or
//! `./` is read from that path. Everything else is a plain config key.

use std::fs;

use crate::domain::errors::{VolumeError, VolumeResult};
use crate::domain::models::template::TEMPLATE_KEY_PREFIX;
use crate::domain::ports::KeyValueMap;

/// Option key prefix that carries template content.
pub const TEMPLATE_OPTION_PREFIX: &str = "template:";

/// Convert create options into storage-relative key/value pairs.
pub fn parse_create_options<I, K, V>(options: I) -> VolumeResult<KeyValueMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = KeyValueMap::new();

    for (key, value) in options {
        let (key, value) = (key.as_ref(), value.as_ref());

        if let Some(file) = key.strip_prefix(TEMPLATE_OPTION_PREFIX) {
            let body = if value.starts_with('/') || value.starts_with("./") {
                fs::read(value)?
            } else {
                value.as_bytes().to_vec()
            };
            out.insert(format!("{TEMPLATE_KEY_PREFIX}{file}"), body);
        } else if key.starts_with(TEMPLATE_KEY_PREFIX) {
            return Err(VolumeError::ReservedKeyPrefix(key.to_string()));
        } else {
            out.insert(key.to_string(), value.as_bytes().to_vec());
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_inline_template_and_keys() {
        let out = parse_create_options([
            ("template:app.json", r#"{"h": "${host}"}"#),
            ("host", "db1"),
        ])
        .unwrap();

        assert_eq!(out["templates/app.json"], br#"{"h": "${host}"}"#);
        assert_eq!(out["host"], b"db1");
    }

    #[test]
    fn test_template_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "port=${{port}}").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let out = parse_create_options([("template:p.conf", path.as_str())]).unwrap();
        assert_eq!(out["templates/p.conf"], b"port=${port}");
    }

    #[test]
    fn test_missing_template_file_is_io_error() {
        let result = parse_create_options([("template:x", "/definitely/not/here.conf")]);
        assert!(matches!(result, Err(VolumeError::Io(_))));
    }

    #[test]
    fn test_reserved_prefix_rejected() {
        let result = parse_create_options([("templates/x", "body")]);
        assert!(matches!(result, Err(VolumeError::ReservedKeyPrefix(_))));
    }
}
