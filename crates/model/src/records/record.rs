/// A single `(hash_key, sort_key) -> value` entry as returned by a scanner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KvRecord {
    pub hash_key: Vec<u8>,
    pub sort_key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KvRecord {
    pub fn new(
        hash_key: impl Into<Vec<u8>>,
        sort_key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            hash_key: hash_key.into(),
            sort_key: sort_key.into(),
            value: value.into(),
        }
    }

    pub fn hash_key_size(&self) -> u64 {
        self.hash_key.len() as u64
    }

    pub fn sort_key_size(&self) -> u64 {
        self.sort_key.len() as u64
    }

    pub fn value_size(&self) -> u64 {
        self.value.len() as u64
    }

    /// Hash key, sort key and value sizes added together.
    pub fn row_size(&self) -> u64 {
        self.hash_key_size() + self.sort_key_size() + self.value_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_size_sums_all_parts() {
        let record = KvRecord::new("user:1", "profile", vec![0u8; 10]);
        assert_eq!(record.hash_key_size(), 6);
        assert_eq!(record.sort_key_size(), 7);
        assert_eq!(record.value_size(), 10);
        assert_eq!(record.row_size(), 23);
    }
}
