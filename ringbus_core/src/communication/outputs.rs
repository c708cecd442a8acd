use bytemuck::Pod;
use std::collections::btree_map::{self, BTreeMap};

/// Messages produced by one component tick, keyed by topic.
///
/// At most one payload per topic per tick; inserting the same topic twice keeps
/// the later payload. Topics are published in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs {
    messages: BTreeMap<String, Vec<u8>>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `payload` for `topic`, returning the payload it replaced
    pub fn insert(
        &mut self,
        topic: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Option<Vec<u8>> {
        self.messages.insert(topic.into(), payload.into())
    }

    /// Queue the in-memory bytes of a plain-old-data value
    pub fn insert_pod<T: Pod>(
        &mut self,
        topic: impl Into<String>,
        value: &T,
    ) -> Option<Vec<u8>> {
        self.insert(topic, bytemuck::bytes_of(value).to_vec())
    }

    pub fn get(&self, topic: &str) -> Option<&[u8]> {
        self.messages.get(topic).map(Vec::as_slice)
    }

    pub fn remove(&mut self, topic: &str) -> Option<Vec<u8>> {
        self.messages.remove(topic)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.messages.iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl IntoIterator for Outputs {
    type Item = (String, Vec<u8>);
    type IntoIter = btree_map::IntoIter<String, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for Outputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            messages: iter
                .into_iter()
                .map(|(topic, payload)| (topic.into(), payload.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_insert_replaces_payload() {
        let mut outputs = Outputs::new();
        assert!(outputs.insert("/a", vec![1]).is_none());
        assert_eq!(outputs.insert("/a", vec![2]), Some(vec![1]));
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.get("/a"), Some(&[2u8][..]));
    }

    #[test]
    fn test_iterates_in_topic_order() {
        let outputs: Outputs = [("/b", vec![2u8]), ("/a", vec![1u8])].into_iter().collect();
        let topics: Vec<&str> = outputs.iter().map(|(t, _)| t).collect();
        assert_eq!(topics, vec!["/a", "/b"]);
    }

    #[test]
    fn test_insert_pod_uses_native_bytes() {
        let mut outputs = Outputs::new();
        outputs.insert_pod("/count", &258u16);
        assert_eq!(outputs.get("/count"), Some(&258u16.to_ne_bytes()[..]));
    }
}
