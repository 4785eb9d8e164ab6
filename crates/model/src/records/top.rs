use serde::Serialize;

/// One of the largest rows seen by a count scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopRow {
    #[serde(serialize_with = "lossy_utf8")]
    pub hash_key: Vec<u8>,
    #[serde(serialize_with = "lossy_utf8")]
    pub sort_key: Vec<u8>,
    pub row_size: u64,
}

impl TopRow {
    pub fn new(hash_key: Vec<u8>, sort_key: Vec<u8>, row_size: u64) -> Self {
        Self {
            hash_key,
            sort_key,
            row_size,
        }
    }
}

fn lossy_utf8<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_keys_as_text() {
        let row = TopRow::new(b"user:1".to_vec(), b"avatar".to_vec(), 4096);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["hash_key"], "user:1");
        assert_eq!(json["sort_key"], "avatar");
        assert_eq!(json["row_size"], 4096);
    }
}
