use std::collections::BTreeMap;

/// Resolves `$VARIABLE` references in release naming templates
#[derive(Debug, Clone, Default)]
pub struct Tpl {
    variables: BTreeMap<String, String>,
}

impl Tpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable with its value
    pub fn register<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.variables.insert(key.into(), value.into());
    }

    /// Substitute every registered `$KEY` in `input`.
    ///
    /// Input is scanned once, left to right, so substituted values are never
    /// re-expanded (a version label containing `$NAME` stays literal).
    /// When several keys match at the same position the longest wins.
    /// Unknown references are kept as-is.
    pub fn parse(&self, input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('$') {
            result.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];

            let matched = self
                .variables
                .iter()
                .filter(|(key, _)| !key.is_empty() && tail.starts_with(key.as_str()))
                .max_by_key(|(key, _)| key.len());

            match matched {
                Some((key, value)) => {
                    result.push_str(value);
                    rest = &tail[key.len()..];
                }
                None => {
                    result.push('$');
                    rest = tail;
                }
            }
        }

        result.push_str(rest);
        result
    }
}
