use std::fmt;

/// Ordered collection of template headers.
///
/// Keys are case-sensitive as written in the template. The insertion
/// order is kept since it drives the order of the serialized message
/// headers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header.
    ///
    /// If the key already exists, its value is replaced in place and
    /// its original position is kept.
    pub fn insert(&mut self, key: impl ToString, val: impl ToString) {
        let key = key.to_string();
        let val = val.to_string();

        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = val,
            None => self.0.push((key, val)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Return the value of the given header if it is present and not
    /// blank.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|val| !val.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (key, val) in iter {
            headers.insert(key, val);
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, val) in self.iter() {
            writeln!(f, "{key}: {val}")?;
        }
        Ok(())
    }
}
